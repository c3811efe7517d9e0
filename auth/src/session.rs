/*++

Licensed under the Apache-2.0 license.

File Name:

    session.rs

Abstract:

    File contains the working state of one protocol run. Owned by a
    single in-flight call; two runs never share a session.

--*/

use cryptoauth_types::{
    SeChallenge, SePubKey, SeSignature, DEVICE_CERT_BYTE_SIZE, SIGNER_CERT_BYTE_SIZE,
};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Challenge, response, and reconstructed certificate material for one
/// authentication run. Wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct AuthSession {
    pub(crate) challenge: SeChallenge,
    pub(crate) response: SeSignature,
    pub(crate) signer_cert: [u8; SIGNER_CERT_BYTE_SIZE],
    pub(crate) signer_cert_len: usize,
    pub(crate) device_cert: [u8; DEVICE_CERT_BYTE_SIZE],
    pub(crate) device_cert_len: usize,
    pub(crate) signer_pub_key: SePubKey,
    pub(crate) device_pub_key: SePubKey,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self {
            challenge: [0; 32],
            response: [0; 64],
            signer_cert: [0; SIGNER_CERT_BYTE_SIZE],
            signer_cert_len: 0,
            device_cert: [0; DEVICE_CERT_BYTE_SIZE],
            device_cert_len: 0,
            signer_pub_key: [0; 64],
            device_pub_key: [0; 64],
        }
    }
}

impl AuthSession {
    pub(crate) fn signer_cert(&self) -> &[u8] {
        &self.signer_cert[..self.signer_cert_len]
    }

    pub(crate) fn device_cert(&self) -> &[u8] {
        &self.device_cert[..self.device_cert_len]
    }
}
