/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Wire-protocol codec for secure-element command frames: per-opcode
    size selection, frame CRC, response classification, and the device
    session handle the authentication engine talks through.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

mod crc;
mod device;
mod exectime;
mod opcode;
mod packet;
mod response;

pub use crc::{crc16, verify_frame_crc};
pub use device::{Device, SeTransport};
pub use exectime::{DeviceFamily, ExecTimes};
pub use opcode::Opcode;
pub use packet::{mode, CommandBuilder, Packet, ZoneFlags};
pub use response::{classify_response, WAKE_TOKEN_FRAME};

/// Minimal command frame: count + opcode + param1 + param2 + CRC.
pub const CMD_SIZE_MIN: usize = 7;
/// Largest frame the builder emits (Verify, external mode).
pub const CMD_SIZE_MAX: usize = 135;

/// Minimal response frame: count + status byte + CRC.
pub const RSP_SIZE_MIN: usize = 4;
/// Response carrying a 4-byte value.
pub const RSP_SIZE_VAL: usize = 7;
/// Response carrying a 32-byte value.
pub const RSP_SIZE_32: usize = 35;
/// Response carrying a 64-byte value.
pub const RSP_SIZE_64: usize = 67;
/// Largest response any command produces.
pub const RSP_SIZE_MAX: usize = 75;

/// Frame CRC width.
pub const CRC_SIZE: usize = 2;
