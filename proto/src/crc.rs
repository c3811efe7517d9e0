/*++

Licensed under the Apache-2.0 license.

File Name:

    crc.rs

Abstract:

    File contains implementation of the 16-bit frame checksum.

--*/

use crate::CRC_SIZE;
use cryptoauth_error::{SeError, SeResult};

const CRC_POLYNOM: u16 = 0x8005;

/// Compute the frame checksum over `data`.
///
/// Bit-serial, least-significant bit of each byte first, polynomial
/// 0x8005. The element computes the same checksum on every frame it
/// receives and emits; the two bytes go on the wire low byte first.
pub fn crc16(data: &[u8]) -> [u8; CRC_SIZE] {
    let mut crc_register: u16 = 0;
    for byte in data {
        let mut shift_register: u8 = 0x01;
        while shift_register != 0 {
            let data_bit = (byte & shift_register) != 0;
            let crc_bit = (crc_register >> 15) != 0;
            crc_register <<= 1;
            if data_bit != crc_bit {
                crc_register ^= CRC_POLYNOM;
            }
            shift_register = shift_register.wrapping_shl(1);
        }
    }
    [crc_register as u8, (crc_register >> 8) as u8]
}

/// Check the trailing CRC of a received frame.
///
/// `frame[0]` is the count byte covering the whole frame including the
/// CRC itself.
pub fn verify_frame_crc(frame: &[u8]) -> SeResult<()> {
    let count = frame.first().copied().ok_or(SeError::PROTO_INVALID_SIZE)? as usize;
    if count < crate::RSP_SIZE_MIN || count > frame.len() {
        return Err(SeError::PROTO_INVALID_SIZE);
    }
    let crc = crc16(&frame[..count - CRC_SIZE]);
    if crc != frame[count - CRC_SIZE..count] {
        return Err(SeError::PROTO_BAD_CRC);
    }
    Ok(())
}
