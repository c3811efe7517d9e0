/*++

Licensed under the Apache-2.0 license.

File Name:

    device.rs

Abstract:

    File contains the device session handle. It owns the frame builder
    and a transport, and exposes the logical operations the
    authentication engine needs as typed calls.

--*/

use crate::packet::{mode, ZoneFlags};
use crate::response::{classify_response, WAKE_TOKEN_FRAME};
use crate::{CommandBuilder, DeviceFamily, Opcode, RSP_SIZE_MAX};
use cryptoauth_error::{SeError, SeResult};
use cryptoauth_types::{
    DevZone, OtpConfig, SeDigest, SePubKey, SeSerialNum, SeSignature, OTP_ZONE_BYTE_SIZE,
};

/// Physical channel to the element.
///
/// Implementations cover the bus specifics (I2C/SWI addressing,
/// retries); framing and CRC handling stay on this side.
pub trait SeTransport {
    /// Send a command frame, wait out `exec_time_ms`, and read the
    /// response frame into `response`. Returns the received length.
    fn exchange(
        &mut self,
        command: &[u8],
        exec_time_ms: u32,
        response: &mut [u8],
    ) -> SeResult<usize>;

    /// Issue the wake pulse and read the 4-byte token frame.
    fn wake(&mut self, wake_delay_ms: u32, token: &mut [u8; 4]) -> SeResult<()>;
}

/// Response payload, count and CRC already stripped.
#[derive(Clone)]
pub struct Response {
    buf: [u8; RSP_SIZE_MAX],
    len: u8,
}

impl Response {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    fn copy_exact<const N: usize>(&self) -> SeResult<[u8; N]> {
        self.as_bytes()
            .try_into()
            .map_err(|_| SeError::PROTO_INVALID_SIZE)
    }
}

/// An awake element on a transport.
pub struct Device<T: SeTransport> {
    transport: T,
    builder: CommandBuilder,
}

impl<T: SeTransport> Device<T> {
    /// Wake the element and open a session.
    pub fn open(mut transport: T, family: DeviceFamily) -> SeResult<Self> {
        let mut token = [0u8; 4];
        transport.wake(family.exec_times().wake_ms(), &mut token)?;
        if token != WAKE_TOKEN_FRAME {
            return Err(SeError::DEVICE_COMM_ERROR);
        }
        Ok(Self {
            transport,
            builder: CommandBuilder::new(family),
        })
    }

    pub fn family(&self) -> DeviceFamily {
        self.builder.family()
    }

    /// Run one command round trip and return its payload.
    pub fn execute(
        &mut self,
        opcode: Opcode,
        param1: u8,
        param2: u16,
        data: &[u8],
    ) -> SeResult<Response> {
        let packet = self.builder.build(opcode, param1, param2, data)?;
        let exec_time = self.builder.family().exec_times().time_ms(opcode)?;
        let mut rx = [0u8; RSP_SIZE_MAX];
        let received =
            self.transport
                .exchange(packet.as_bytes(), exec_time, &mut rx[..packet.rx_size()])?;
        let payload = classify_response(&rx[..received])?;
        let mut response = Response {
            buf: [0; RSP_SIZE_MAX],
            len: payload.len() as u8,
        };
        response.buf[..payload.len()].copy_from_slice(payload);
        Ok(response)
    }

    /// Read 32 bytes from the on-chip RNG.
    pub fn random(&mut self) -> SeResult<[u8; 32]> {
        self.execute(Opcode::Random, 0, 0, &[])?.copy_exact()
    }

    /// Sign `digest` with the private key in `key_id`.
    ///
    /// The digest is loaded through a passthrough nonce so the
    /// signature covers exactly the caller's message hash.
    pub fn sign_digest(&mut self, key_id: u16, digest: &SeDigest) -> SeResult<SeSignature> {
        self.execute(Opcode::Nonce, mode::nonce::PASSTHROUGH, 0, digest)?;
        self.execute(Opcode::Sign, mode::sign::EXTERNAL, key_id, &[])?
            .copy_exact()
    }

    /// Verify a P-256 signature over `digest` against an external key.
    pub fn verify_extern(
        &mut self,
        digest: &SeDigest,
        pub_key: &SePubKey,
        signature: &SeSignature,
    ) -> SeResult<()> {
        self.execute(Opcode::Nonce, mode::nonce::PASSTHROUGH, 0, digest)?;
        let mut data = [0u8; 128];
        data[..64].copy_from_slice(signature);
        data[64..].copy_from_slice(pub_key);
        self.execute(
            Opcode::Verify,
            mode::verify::EXTERNAL,
            mode::verify::KEY_P256,
            &data,
        )?;
        Ok(())
    }

    /// MAC a caller challenge with the symmetric key in `key_id`.
    pub fn mac(&mut self, key_id: u16, challenge: &[u8; 32]) -> SeResult<[u8; 32]> {
        self.execute(Opcode::Mac, 0, key_id, challenge)?.copy_exact()
    }

    /// Recompute the public key for the private key in `key_id`.
    pub fn gen_pub_key(&mut self, key_id: u16) -> SeResult<SePubKey> {
        self.execute(Opcode::GenKey, mode::genkey::PUBLIC, key_id, &[])?
            .copy_exact()
    }

    /// Read a 32-byte block out of a zone.
    pub fn read_block(&mut self, zone: DevZone, slot: u16, block: u16) -> SeResult<[u8; 32]> {
        let param1 = zone_code(zone) | ZoneFlags::READWRITE_32.bits();
        self.execute(Opcode::Read, param1, zone_addr(zone, slot, block, 0), &[])?
            .copy_exact()
    }

    /// Read one 4-byte word out of a zone.
    pub fn read_word(
        &mut self,
        zone: DevZone,
        slot: u16,
        block: u16,
        offset: u16,
    ) -> SeResult<[u8; 4]> {
        self.execute(
            Opcode::Read,
            zone_code(zone),
            zone_addr(zone, slot, block, offset),
            &[],
        )?
        .copy_exact()
    }

    /// Provisioning info from the OTP zone.
    pub fn read_otp_config(&mut self) -> SeResult<OtpConfig> {
        let mut otp = [0u8; OTP_ZONE_BYTE_SIZE];
        for block in 0..2u16 {
            let data = self.read_block(DevZone::Otp, 0, block)?;
            otp[block as usize * 32..][..32].copy_from_slice(&data);
        }
        OtpConfig::read_from(&otp)
    }

    /// Assemble the 9-byte device serial from the first config block.
    pub fn serial_number(&mut self) -> SeResult<SeSerialNum> {
        let config = self.read_block(DevZone::Config, 0, 0)?;
        let mut sn = [0u8; 9];
        sn[..4].copy_from_slice(&config[..4]);
        sn[4..].copy_from_slice(&config[8..13]);
        Ok(sn)
    }
}

fn zone_code(zone: DevZone) -> u8 {
    match zone {
        DevZone::Config => 0x00,
        DevZone::Otp => 0x01,
        DevZone::Data => 0x02,
    }
}

/// Word address for `(zone, slot, block, offset)`.
fn zone_addr(zone: DevZone, slot: u16, block: u16, offset: u16) -> u16 {
    let offset = offset & 0x07;
    match zone {
        DevZone::Config | DevZone::Otp => (block << 3) | offset,
        DevZone::Data => (slot << 3) | offset | (block << 8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::crc16;

    /// Replays canned response frames and records every command frame.
    struct MockTransport {
        sent: Vec<Vec<u8>>,
        responses: Vec<Vec<u8>>,
    }

    impl MockTransport {
        fn new(mut responses: Vec<Vec<u8>>) -> Self {
            responses.reverse();
            Self {
                sent: Vec::new(),
                responses,
            }
        }
    }

    impl SeTransport for MockTransport {
        fn exchange(
            &mut self,
            command: &[u8],
            _exec_time_ms: u32,
            response: &mut [u8],
        ) -> SeResult<usize> {
            self.sent.push(command.to_vec());
            let frame = self.responses.pop().expect("unexpected command");
            response[..frame.len()].copy_from_slice(&frame);
            Ok(frame.len())
        }

        fn wake(&mut self, _wake_delay_ms: u32, token: &mut [u8; 4]) -> SeResult<()> {
            *token = WAKE_TOKEN_FRAME;
            Ok(())
        }
    }

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut f = vec![(payload.len() + 3) as u8];
        f.extend_from_slice(payload);
        let crc = crc16(&f);
        f.extend_from_slice(&crc);
        f
    }

    fn ok_status() -> Vec<u8> {
        frame(&[0x00])
    }

    fn open(responses: Vec<Vec<u8>>) -> Device<MockTransport> {
        Device::open(MockTransport::new(responses), DeviceFamily::FullCrypto).unwrap()
    }

    #[test]
    fn test_random() {
        let mut device = open(vec![frame(&[0x5A; 32])]);
        assert_eq!(device.random().unwrap(), [0x5A; 32]);
        let sent = &device.transport.sent[0];
        assert_eq!(sent[1], Opcode::Random.code());
        assert_eq!(sent.len(), 7);
    }

    #[test]
    fn test_sign_digest_sequence() {
        let mut device = open(vec![ok_status(), frame(&[0xC3; 64])]);
        let sig = device.sign_digest(0x03, &[0x11; 32]).unwrap();
        assert_eq!(sig, [0xC3; 64]);

        // Digest goes in through a passthrough nonce first.
        let nonce = &device.transport.sent[0];
        assert_eq!(nonce[1], Opcode::Nonce.code());
        assert_eq!(nonce[2], mode::nonce::PASSTHROUGH);
        assert_eq!(&nonce[5..37], &[0x11; 32]);

        let sign = &device.transport.sent[1];
        assert_eq!(sign[1], Opcode::Sign.code());
        assert_eq!(sign[2], mode::sign::EXTERNAL);
        assert_eq!(&sign[3..5], &[0x03, 0x00]);
    }

    #[test]
    fn test_verify_extern_payload_order() {
        let mut device = open(vec![ok_status(), ok_status()]);
        device
            .verify_extern(&[0x22; 32], &[0xBB; 64], &[0xAA; 64])
            .unwrap();
        let verify = &device.transport.sent[1];
        assert_eq!(verify[1], Opcode::Verify.code());
        assert_eq!(verify[2], mode::verify::EXTERNAL);
        assert_eq!(&verify[3..5], &mode::verify::KEY_P256.to_le_bytes());
        // Signature precedes the key in the input buffer.
        assert_eq!(&verify[5..69], &[0xAA; 64]);
        assert_eq!(&verify[69..133], &[0xBB; 64]);
    }

    #[test]
    fn test_verify_extern_mismatch() {
        let mut device = open(vec![ok_status(), frame(&[0x01])]);
        assert_eq!(
            device.verify_extern(&[0x22; 32], &[0xBB; 64], &[0xAA; 64]),
            Err(SeError::DEVICE_CHECKMAC_VERIFY_FAILED)
        );
    }

    #[test]
    fn test_serial_number_assembly() {
        let mut config = [0u8; 32];
        config[0..4].copy_from_slice(&[0x01, 0x23, 0x6F, 0x81]);
        config[8..13].copy_from_slice(&[0x0A, 0x0B, 0x0C, 0x0D, 0xEE]);
        let mut device = open(vec![frame(&config)]);
        assert_eq!(
            device.serial_number().unwrap(),
            [0x01, 0x23, 0x6F, 0x81, 0x0A, 0x0B, 0x0C, 0x0D, 0xEE]
        );
        // 32-byte config read of block 0.
        let read = &device.transport.sent[0];
        assert_eq!(read[1], Opcode::Read.code());
        assert_eq!(read[2], 0x80);
        assert_eq!(&read[3..5], &[0x00, 0x00]);
    }

    #[test]
    fn test_data_zone_addressing() {
        let mut device = open(vec![frame(&[0u8; 32])]);
        device.read_block(DevZone::Data, 0x0A, 1).unwrap();
        let read = &device.transport.sent[0];
        assert_eq!(read[2], 0x82);
        assert_eq!(u16::from_le_bytes([read[3], read[4]]), (0x0A << 3) | (1 << 8));
    }

    #[test]
    fn test_read_otp_config() {
        let mut otp = [0u8; 64];
        otp[0] = 1;
        otp[16..21].copy_from_slice(b"ASTEK");
        let mut device = open(vec![frame(&otp[..32]), frame(&otp[32..])]);
        let config = device.read_otp_config().unwrap();
        assert_eq!(config.otp_format, 1);
        assert_eq!(&config.vendor, b"ASTEK");
        // Both OTP blocks read from zone 1.
        for sent in &device.transport.sent {
            assert_eq!(sent[2] & 0x03, 0x01);
        }
    }

    #[test]
    fn test_parse_error_status() {
        let mut device = open(vec![frame(&[0x03])]);
        assert_eq!(device.random(), Err(SeError::DEVICE_PARSE_ERROR));
    }
}
