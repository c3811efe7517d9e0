/*++

Licensed under the Apache-2.0 license.

File Name:

    device_env.rs

Abstract:

    File contains the hardware-backed environment: one or two element
    sessions behind the AuthEnv trait. Software hashing stays here so
    protocol digests never depend on the element under test.

--*/

use crate::env::{AuthEnv, DeviceSelect};
use cryptoauth_error::{SeError, SeResult};
use cryptoauth_proto::{Device, SeTransport};
use cryptoauth_types::{
    DevZone, DeviceLoc, SeChallenge, SeDigest, SePubKey, SeSerialNum, SeSignature,
    BLOCK_BYTE_SIZE, PUB_KEY_BYTE_SIZE,
};
use sha2::{Digest, Sha256};

/// `AuthEnv` over real element sessions.
///
/// Single-element protocols run against `host`; the hardware-assisted
/// chain needs a `paired` environment with a distinct client.
pub struct DeviceEnv<T: SeTransport> {
    host: Device<T>,
    client: Option<Device<T>>,
    active: DeviceSelect,
}

impl<T: SeTransport> DeviceEnv<T> {
    pub fn single(device: Device<T>) -> Self {
        Self {
            host: device,
            client: None,
            active: DeviceSelect::Host,
        }
    }

    pub fn paired(host: Device<T>, client: Device<T>) -> Self {
        Self {
            host,
            client: Some(client),
            active: DeviceSelect::Host,
        }
    }

    fn active_device(&mut self) -> &mut Device<T> {
        match (self.active, self.client.as_mut()) {
            (DeviceSelect::Client, Some(client)) => client,
            _ => &mut self.host,
        }
    }
}

impl<T: SeTransport> AuthEnv for DeviceEnv<T> {
    fn select_device(&mut self, device: DeviceSelect) -> SeResult<()> {
        if device == DeviceSelect::Client && self.client.is_none() {
            return Err(SeError::AUTH_BAD_PARAM);
        }
        self.active = device;
        Ok(())
    }

    fn random(&mut self) -> SeResult<SeChallenge> {
        self.active_device().random()
    }

    fn sign(&mut self, key_id: u16, digest: &SeDigest) -> SeResult<SeSignature> {
        self.active_device().sign_digest(key_id, digest)
    }

    fn verify(
        &mut self,
        digest: &SeDigest,
        pub_key: &SePubKey,
        signature: &SeSignature,
    ) -> SeResult<()> {
        self.active_device().verify_extern(digest, pub_key, signature)
    }

    fn mac(&mut self, key_id: u16, challenge: &SeChallenge) -> SeResult<SeDigest> {
        self.active_device().mac(key_id, challenge)
    }

    /// Slot layout for stored public keys: 4 pad bytes before each
    /// 32-byte coordinate.
    fn read_pub_key(&mut self, key_id: u16) -> SeResult<SePubKey> {
        let mut raw = [0u8; 3 * BLOCK_BYTE_SIZE];
        for block in 0..3u16 {
            let data = self.active_device().read_block(DevZone::Data, key_id, block)?;
            raw[block as usize * BLOCK_BYTE_SIZE..][..BLOCK_BYTE_SIZE].copy_from_slice(&data);
        }
        let mut key = [0u8; PUB_KEY_BYTE_SIZE];
        key[..32].copy_from_slice(&raw[4..36]);
        key[32..].copy_from_slice(&raw[40..72]);
        Ok(key)
    }

    fn read_loc(&mut self, loc: &DeviceLoc, out: &mut [u8]) -> SeResult<usize> {
        let count = loc.count as usize;
        if count > out.len() {
            return Err(SeError::AUTH_BAD_PARAM);
        }
        if loc.is_genkey {
            if count != PUB_KEY_BYTE_SIZE {
                return Err(SeError::AUTH_BAD_PARAM);
            }
            let key = self.active_device().gen_pub_key(loc.slot)?;
            out[..PUB_KEY_BYTE_SIZE].copy_from_slice(&key);
            return Ok(PUB_KEY_BYTE_SIZE);
        }

        let mut copied = 0;
        let mut offset = loc.offset as usize;
        while copied < count {
            let block = (offset / BLOCK_BYTE_SIZE) as u16;
            let within = offset % BLOCK_BYTE_SIZE;
            let data = self.active_device().read_block(loc.zone, loc.slot, block)?;
            let take = (BLOCK_BYTE_SIZE - within).min(count - copied);
            out[copied..copied + take].copy_from_slice(&data[within..within + take]);
            copied += take;
            offset += take;
        }
        Ok(count)
    }

    fn serial_number(&mut self) -> SeResult<SeSerialNum> {
        self.active_device().serial_number()
    }

    fn sha256(&mut self, data: &[u8]) -> SeResult<SeDigest> {
        Ok(Sha256::digest(data).into())
    }
}
