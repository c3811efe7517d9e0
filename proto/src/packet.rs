/*++

Licensed under the Apache-2.0 license.

File Name:

    packet.rs

Abstract:

    File contains the command frame builder. The builder wraps a logical
    operation with the exact packet size the element expects and stamps
    the frame CRC; it does not execute the command.

--*/

use crate::crc::crc16;
use crate::{DeviceFamily, Opcode, CMD_SIZE_MAX, CMD_SIZE_MIN, CRC_SIZE};
use crate::{RSP_SIZE_32, RSP_SIZE_64, RSP_SIZE_MIN, RSP_SIZE_VAL};
use bitflags::bitflags;
use cryptoauth_error::{SeError, SeResult};

/// Mode-byte values for the mode-dependent opcodes.
pub mod mode {
    pub mod nonce {
        pub const MASK: u8 = 0x03;
        pub const SEED_UPDATE: u8 = 0x00;
        pub const NO_SEED_UPDATE: u8 = 0x01;
        pub const PASSTHROUGH: u8 = 0x03;
        /// Input size in seed-update modes.
        pub const NUM_IN_SIZE: usize = 20;
        /// Input size in passthrough mode.
        pub const PASSTHROUGH_SIZE: usize = 32;
    }

    pub mod sha {
        pub const START: u8 = 0x00;
        pub const UPDATE: u8 = 0x01;
        pub const END: u8 = 0x02;
        pub const BLOCK_SIZE: usize = 64;
    }

    pub mod verify {
        pub const STORED: u8 = 0x00;
        pub const VALIDATE_EXTERNAL: u8 = 0x01;
        pub const EXTERNAL: u8 = 0x02;
        pub const VALIDATE: u8 = 0x03;
        pub const INVALIDATE: u8 = 0x07;
        /// Param2 value selecting the P-256 key type.
        pub const KEY_P256: u16 = 0x0004;
    }

    pub mod genkey {
        /// Recompute and return the public key for a stored private key.
        pub const PUBLIC: u8 = 0x00;
    }

    pub mod gendig {
        /// Mode byte requesting the shared-nonce variant.
        pub const SHARED_NONCE: u8 = 0x03;
    }

    pub mod sign {
        /// Sign an externally supplied message (TempKey).
        pub const EXTERNAL: u8 = 0x80;
    }
}

bitflags! {
    /// Zone-encoding bits shared by Read and Write mode bytes.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct ZoneFlags: u8 {
        /// 32-byte access (4-byte when clear).
        const READWRITE_32 = 0x80;
        /// Write is MAC-authenticated (encrypted).
        const WITH_MAC = 0x40;
    }
}

/// 4-byte zone access size.
const ZONE_ACCESS_4: usize = 4;
/// 32-byte zone access size.
const ZONE_ACCESS_32: usize = 32;

/// CheckMac input: challenge + response + other data.
const CHECKMAC_DATA_SIZE: usize = 77;
/// ECDH input: peer public key.
const ECDH_DATA_SIZE: usize = 64;
/// DeriveKey optional MAC size.
const DERIVE_KEY_MAC_SIZE: usize = 32;
/// GenDig "other data" suffix size.
const GENDIG_OTHER_DATA_SIZE: usize = 4;
/// GenKey "other data" size for the public-key variant.
const GENKEY_OTHER_DATA_SIZE: usize = 3;
/// MAC challenge size when the mode requires one.
const MAC_CHALLENGE_SIZE: usize = 32;
/// PrivWrite input: encrypted value + MAC.
const PRIVWRITE_DATA_SIZE: usize = 68;
/// Verify signature component size.
const VERIFY_SIG_SIZE: usize = 64;
/// Verify public key component size (external mode).
const VERIFY_KEY_SIZE: usize = 64;
/// Verify "other data" size (validate/invalidate modes).
const VERIFY_OTHER_DATA_SIZE: usize = 19;

/// A fully rendered command frame.
///
/// Layout: `[count][opcode][param1][param2_lo][param2_hi][data...][crc_lo][crc_hi]`
/// where `count` covers the whole frame including itself and the CRC.
/// Constructed fresh per operation and handed straight to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    buf: [u8; CMD_SIZE_MAX],
    tx_size: u8,
    rx_size: u8,
}

impl Packet {
    /// Bytes to put on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.tx_size as usize]
    }

    /// Total frame length, count and CRC included.
    pub fn tx_size(&self) -> usize {
        self.tx_size as usize
    }

    /// Expected response frame length.
    pub fn rx_size(&self) -> usize {
        self.rx_size as usize
    }

    pub fn opcode(&self) -> u8 {
        self.buf[1]
    }

    pub fn param1(&self) -> u8 {
        self.buf[2]
    }

    pub fn param2(&self) -> u16 {
        u16::from_le_bytes([self.buf[3], self.buf[4]])
    }
}

/// Per-opcode frame sizing rules for one device family.
#[derive(Debug, Copy, Clone)]
pub struct CommandBuilder {
    family: DeviceFamily,
}

impl CommandBuilder {
    pub fn new(family: DeviceFamily) -> Self {
        Self { family }
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// Build the frame for a logical operation.
    ///
    /// `tx_size`/`rx_size` are derived from `(opcode, param1, data.len())`;
    /// a payload length that does not match the opcode/mode rule is a
    /// caller bug and fails with `PROTO_BAD_PARAM`.
    pub fn build(
        &self,
        opcode: Opcode,
        param1: u8,
        param2: u16,
        data: &[u8],
    ) -> SeResult<Packet> {
        let (data_size, rx_size) = self.frame_sizes(opcode, param1, param2, data.len())?;
        if data.len() != data_size {
            return Err(SeError::PROTO_BAD_PARAM);
        }

        let tx_size = CMD_SIZE_MIN + data_size;
        let mut packet = Packet {
            buf: [0; CMD_SIZE_MAX],
            tx_size: tx_size as u8,
            rx_size: rx_size as u8,
        };
        packet.buf[0] = tx_size as u8;
        packet.buf[1] = opcode.code();
        packet.buf[2] = param1;
        packet.buf[3..5].copy_from_slice(&param2.to_le_bytes());
        packet.buf[5..5 + data_size].copy_from_slice(data);

        let crc = crc16(&packet.buf[..tx_size - CRC_SIZE]);
        packet.buf[tx_size - CRC_SIZE..tx_size].copy_from_slice(&crc);
        Ok(packet)
    }

    /// Payload and response sizes for `(opcode, param1)`.
    ///
    /// `data_len` only participates for the opcodes whose input size is
    /// not implied by the mode bits (DeriveKey, GenDig, GenKey, SHA-end).
    fn frame_sizes(
        &self,
        opcode: Opcode,
        param1: u8,
        param2: u16,
        data_len: usize,
    ) -> SeResult<(usize, usize)> {
        let sizes = match opcode {
            Opcode::CheckMac => (CHECKMAC_DATA_SIZE, RSP_SIZE_MIN),
            Opcode::Counter => {
                if self.family != DeviceFamily::FullCrypto {
                    return Err(SeError::PROTO_BAD_OPCODE);
                }
                (0, RSP_SIZE_VAL)
            }
            Opcode::DeriveKey => {
                // The mac is optional and the frame carries no other hint,
                // so the payload length decides.
                match data_len {
                    0 => (0, RSP_SIZE_MIN),
                    _ => (DERIVE_KEY_MAC_SIZE, RSP_SIZE_MIN),
                }
            }
            Opcode::Ecdh => (ECDH_DATA_SIZE, RSP_SIZE_32),
            Opcode::GenDig => {
                if param1 == mode::gendig::SHARED_NONCE {
                    (GENDIG_OTHER_DATA_SIZE, RSP_SIZE_MIN)
                } else if data_len != 0 {
                    // A MAC key slot needs its other data.
                    (GENDIG_OTHER_DATA_SIZE, RSP_SIZE_MIN)
                } else {
                    (0, RSP_SIZE_MIN)
                }
            }
            Opcode::GenKey => {
                if data_len != 0 {
                    // Public-key digest variant carries other data.
                    (GENKEY_OTHER_DATA_SIZE, RSP_SIZE_64)
                } else {
                    (0, RSP_SIZE_64)
                }
            }
            Opcode::Hmac => (0, RSP_SIZE_32),
            Opcode::Info => (0, RSP_SIZE_VAL),
            Opcode::Lock => (0, RSP_SIZE_MIN),
            Opcode::Mac => {
                // Mode 0 sources the challenge from the input buffer.
                if param1 == 0 {
                    (MAC_CHALLENGE_SIZE, RSP_SIZE_32)
                } else {
                    (0, RSP_SIZE_32)
                }
            }
            Opcode::Nonce => match param1 & mode::nonce::MASK {
                mode::nonce::SEED_UPDATE | mode::nonce::NO_SEED_UPDATE => {
                    (mode::nonce::NUM_IN_SIZE, RSP_SIZE_32)
                }
                mode::nonce::PASSTHROUGH => (mode::nonce::PASSTHROUGH_SIZE, RSP_SIZE_MIN),
                _ => return Err(SeError::PROTO_BAD_PARAM),
            },
            Opcode::Pause => (0, RSP_SIZE_MIN),
            Opcode::PrivWrite => (PRIVWRITE_DATA_SIZE, RSP_SIZE_MIN),
            Opcode::Random => (0, RSP_SIZE_32),
            Opcode::Read => {
                let rx = if param1 & ZoneFlags::READWRITE_32.bits() == 0 {
                    RSP_SIZE_VAL
                } else {
                    RSP_SIZE_32
                };
                (0, rx)
            }
            Opcode::Sha => {
                if param2 as usize > mode::sha::BLOCK_SIZE {
                    return Err(SeError::PROTO_BAD_PARAM);
                }
                match param1 {
                    mode::sha::START => (0, RSP_SIZE_MIN),
                    mode::sha::UPDATE => {
                        // Updates always consume exactly one block.
                        if param2 as usize != mode::sha::BLOCK_SIZE {
                            return Err(SeError::PROTO_BAD_PARAM);
                        }
                        (mode::sha::BLOCK_SIZE, RSP_SIZE_MIN)
                    }
                    mode::sha::END => {
                        // End consumes the 0..=63 byte remainder named in param2.
                        if param2 as usize > mode::sha::BLOCK_SIZE - 1 {
                            return Err(SeError::PROTO_BAD_PARAM);
                        }
                        (param2 as usize, RSP_SIZE_32)
                    }
                    _ => return Err(SeError::PROTO_BAD_PARAM),
                }
            }
            Opcode::Sign => (0, RSP_SIZE_64),
            Opcode::UpdateExtra => (0, RSP_SIZE_MIN),
            Opcode::Verify => {
                let data_size = match param1 {
                    mode::verify::STORED => VERIFY_SIG_SIZE,
                    mode::verify::VALIDATE_EXTERNAL | mode::verify::EXTERNAL => {
                        VERIFY_SIG_SIZE + VERIFY_KEY_SIZE
                    }
                    mode::verify::VALIDATE | mode::verify::INVALIDATE => {
                        VERIFY_SIG_SIZE + VERIFY_OTHER_DATA_SIZE
                    }
                    _ => return Err(SeError::PROTO_BAD_PARAM),
                };
                (data_size, RSP_SIZE_MIN)
            }
            Opcode::Write => {
                let flags = ZoneFlags::from_bits_truncate(param1);
                let value_size = if flags.contains(ZoneFlags::READWRITE_32) {
                    ZONE_ACCESS_32
                } else {
                    ZONE_ACCESS_4
                };
                let mac_size = if flags.contains(ZoneFlags::WITH_MAC) {
                    ZONE_ACCESS_32
                } else {
                    0
                };
                (value_size + mac_size, RSP_SIZE_MIN)
            }
        };
        Ok(sizes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify_frame_crc;

    fn builder() -> CommandBuilder {
        CommandBuilder::new(DeviceFamily::FullCrypto)
    }

    #[test]
    fn test_frame_layout() {
        let packet = builder()
            .build(Opcode::Nonce, mode::nonce::PASSTHROUGH, 0x1234, &[0xAB; 32])
            .unwrap();
        let bytes = packet.as_bytes();
        assert_eq!(bytes.len(), 39);
        assert_eq!(bytes[0], 39);
        assert_eq!(bytes[1], 0x16);
        assert_eq!(bytes[2], 0x03);
        assert_eq!(&bytes[3..5], &[0x34, 0x12]);
        assert_eq!(&bytes[5..37], &[0xAB; 32]);
        // The CRC at the tail covers everything before it.
        assert_eq!(&bytes[37..39], &crc16(&bytes[..37]));
    }

    #[test]
    fn test_nonce_sizing() {
        let b = builder();
        let passthrough = b
            .build(Opcode::Nonce, mode::nonce::PASSTHROUGH, 0, &[0u8; 32])
            .unwrap();
        assert_eq!(passthrough.tx_size(), 39);
        assert_eq!(passthrough.rx_size(), RSP_SIZE_MIN);

        let seed_update = b
            .build(Opcode::Nonce, mode::nonce::SEED_UPDATE, 0, &[0u8; 20])
            .unwrap();
        assert_eq!(seed_update.tx_size(), 27);
        assert_eq!(seed_update.rx_size(), RSP_SIZE_32);

        assert_eq!(
            b.build(Opcode::Nonce, 0x02, 0, &[0u8; 32]),
            Err(SeError::PROTO_BAD_PARAM)
        );
        // Mode/payload mismatch is a caller bug.
        assert_eq!(
            b.build(Opcode::Nonce, mode::nonce::PASSTHROUGH, 0, &[0u8; 20]),
            Err(SeError::PROTO_BAD_PARAM)
        );
    }

    #[test]
    fn test_mac_count_by_mode() {
        let b = builder();
        let long = b.build(Opcode::Mac, 0, 1, &[0u8; 32]).unwrap();
        assert_eq!(long.tx_size(), 39);
        let short = b.build(Opcode::Mac, 0x01, 1, &[]).unwrap();
        assert_eq!(short.tx_size(), 7);
        assert_eq!(short.rx_size(), RSP_SIZE_32);
    }

    #[test]
    fn test_sha_modes() {
        let b = builder();
        let start = b.build(Opcode::Sha, mode::sha::START, 0, &[]).unwrap();
        assert_eq!(start.tx_size(), 7);

        let update = b
            .build(Opcode::Sha, mode::sha::UPDATE, 64, &[0u8; 64])
            .unwrap();
        assert_eq!(update.tx_size(), 71);

        let end = b.build(Opcode::Sha, mode::sha::END, 5, &[0u8; 5]).unwrap();
        assert_eq!(end.tx_size(), 12);
        assert_eq!(end.rx_size(), RSP_SIZE_32);

        // Update must carry exactly one block.
        assert_eq!(
            b.build(Opcode::Sha, mode::sha::UPDATE, 63, &[0u8; 63]),
            Err(SeError::PROTO_BAD_PARAM)
        );
        // End takes at most block-1 bytes.
        assert_eq!(
            b.build(Opcode::Sha, mode::sha::END, 64, &[0u8; 64]),
            Err(SeError::PROTO_BAD_PARAM)
        );
        assert_eq!(
            b.build(Opcode::Sha, 0x05, 0, &[]),
            Err(SeError::PROTO_BAD_PARAM)
        );
    }

    #[test]
    fn test_verify_modes() {
        let b = builder();
        let stored = b
            .build(Opcode::Verify, mode::verify::STORED, 0, &[0u8; 64])
            .unwrap();
        assert_eq!(stored.tx_size(), 71);

        let external = b
            .build(
                Opcode::Verify,
                mode::verify::EXTERNAL,
                mode::verify::KEY_P256,
                &[0u8; 128],
            )
            .unwrap();
        assert_eq!(external.tx_size(), 135);
        assert_eq!(external.tx_size(), CMD_SIZE_MAX);

        let validate = b
            .build(Opcode::Verify, mode::verify::VALIDATE, 0, &[0u8; 83])
            .unwrap();
        assert_eq!(validate.tx_size(), 90);

        assert_eq!(
            b.build(Opcode::Verify, 0x05, 0, &[0u8; 64]),
            Err(SeError::PROTO_BAD_PARAM)
        );
    }

    #[test]
    fn test_write_cross_product() {
        let b = builder();
        let cases = [
            (ZoneFlags::empty().bits(), 4, 11),
            (ZoneFlags::READWRITE_32.bits(), 32, 39),
            (ZoneFlags::WITH_MAC.bits(), 36, 43),
            (
                (ZoneFlags::READWRITE_32 | ZoneFlags::WITH_MAC).bits(),
                64,
                71,
            ),
        ];
        for (param1, data_len, tx) in cases {
            let packet = b
                .build(Opcode::Write, param1, 0, &vec![0u8; data_len])
                .unwrap();
            assert_eq!(packet.tx_size(), tx, "param1 {param1:#04x}");
        }
    }

    #[test]
    fn test_read_rsp_size() {
        let b = builder();
        assert_eq!(b.build(Opcode::Read, 0x02, 0, &[]).unwrap().rx_size(), RSP_SIZE_VAL);
        assert_eq!(b.build(Opcode::Read, 0x82, 0, &[]).unwrap().rx_size(), RSP_SIZE_32);
    }

    #[test]
    fn test_counter_family_gate() {
        let hash_only = CommandBuilder::new(DeviceFamily::HashOnly);
        assert_eq!(
            hash_only.build(Opcode::Counter, 0, 0, &[]),
            Err(SeError::PROTO_BAD_OPCODE)
        );
        assert!(builder().build(Opcode::Counter, 0, 0, &[]).is_ok());
    }

    #[test]
    fn test_fixed_size_commands() {
        let b = builder();
        let cases: [(Opcode, usize, usize, usize); 6] = [
            (Opcode::CheckMac, 77, 84, RSP_SIZE_MIN),
            (Opcode::Ecdh, 64, 71, RSP_SIZE_32),
            (Opcode::PrivWrite, 68, 75, RSP_SIZE_MIN),
            (Opcode::Random, 0, 7, RSP_SIZE_32),
            (Opcode::Sign, 0, 7, RSP_SIZE_64),
            (Opcode::Hmac, 0, 7, RSP_SIZE_32),
        ];
        for (opcode, data_len, tx, rx) in cases {
            let packet = b.build(opcode, 0, 0, &vec![0u8; data_len]).unwrap();
            assert_eq!(packet.tx_size(), tx, "{opcode:?}");
            assert_eq!(packet.rx_size(), rx, "{opcode:?}");
        }
    }

    #[test]
    fn test_built_frames_selfcheck() {
        // Every built frame must pass the receive-side CRC check.
        let b = builder();
        for packet in [
            b.build(Opcode::Random, 0, 0, &[]).unwrap(),
            b.build(Opcode::Sign, mode::sign::EXTERNAL, 0, &[]).unwrap(),
            b.build(Opcode::GenDig, mode::gendig::SHARED_NONCE, 0, &[0u8; 4])
                .unwrap(),
            b.build(Opcode::GenKey, mode::genkey::PUBLIC, 2, &[]).unwrap(),
        ] {
            assert_eq!(verify_frame_crc(packet.as_bytes()), Ok(()));
        }
    }
}
