/*++

Licensed under the Apache-2.0 license.

File Name:

    env.rs

Abstract:

    File contains the environment traits the engine runs against: the
    secure-element operations and the certificate-template engine.

--*/

use cryptoauth_error::{SeError, SeResult};
use cryptoauth_types::{
    CertKind, DeviceLoc, SeChallenge, SeDigest, SePubKey, SeSerialNum, SeSignature,
    MAX_SLOT_BYTE_SIZE,
};

/// Which physical element a multi-chip step addresses.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DeviceSelect {
    Host,
    Client,
}

/// Secure-element operations the protocols consume.
///
/// One implementation wraps real hardware sessions; tests substitute a
/// software environment. Only one element is addressable at a time, so
/// every call after `select_device` lands on the selected element.
pub trait AuthEnv {
    /// Make `device` the active element for subsequent calls.
    fn select_device(&mut self, device: DeviceSelect) -> SeResult<()>;

    /// 32 random bytes from the active element's RNG.
    fn random(&mut self) -> SeResult<SeChallenge>;

    /// ECDSA-sign `digest` with the private key in `key_id`.
    fn sign(&mut self, key_id: u16, digest: &SeDigest) -> SeResult<SeSignature>;

    /// Check a P-256 signature over `digest` against `pub_key`.
    fn verify(
        &mut self,
        digest: &SeDigest,
        pub_key: &SePubKey,
        signature: &SeSignature,
    ) -> SeResult<()>;

    /// Element-internal MAC of the challenge with the key in `key_id`.
    fn mac(&mut self, key_id: u16, challenge: &SeChallenge) -> SeResult<SeDigest>;

    /// Public key stored in data slot `key_id`.
    fn read_pub_key(&mut self, key_id: u16) -> SeResult<SePubKey>;

    /// Contents of one dynamic certificate field.
    fn read_loc(&mut self, loc: &DeviceLoc, out: &mut [u8]) -> SeResult<usize>;

    /// 9-byte serial of the active element.
    fn serial_number(&mut self) -> SeResult<SeSerialNum>;

    /// Software SHA-256, no element round trip.
    fn sha256(&mut self, data: &[u8]) -> SeResult<SeDigest>;
}

/// Certificate-template engine operations.
///
/// The template engine owns the certificate definitions; the protocols
/// only move bytes between it and the element.
pub trait CertEngine {
    /// Storage fields that must be read to rebuild a `kind` certificate.
    fn dynamic_fields(&self, kind: CertKind) -> &[DeviceLoc];

    /// Assemble the certificate from the issuer key and the field data
    /// read off the element. Returns the certificate length.
    fn build_cert(
        &self,
        kind: CertKind,
        issuer_pub_key: &SePubKey,
        fields: &CertFieldData,
        cert: &mut [u8],
    ) -> SeResult<usize>;

    /// Subject public key carried in an assembled certificate.
    fn subject_pub_key(&self, kind: CertKind, cert: &[u8]) -> SeResult<SePubKey>;

    /// Digest of the to-be-signed portion.
    fn tbs_digest(&self, kind: CertKind, cert: &[u8]) -> SeResult<SeDigest>;

    /// Issuer signature carried in an assembled certificate.
    fn signature(&self, kind: CertKind, cert: &[u8]) -> SeResult<SeSignature>;
}

/// Upper bound on dynamic fields per certificate definition.
pub const MAX_CERT_FIELDS: usize = 8;

/// Field data read off the element for one certificate rebuild.
pub struct CertFieldData {
    bufs: [[u8; MAX_SLOT_BYTE_SIZE]; MAX_CERT_FIELDS],
    lens: [usize; MAX_CERT_FIELDS],
    count: usize,
}

impl Default for CertFieldData {
    fn default() -> Self {
        Self {
            bufs: [[0; MAX_SLOT_BYTE_SIZE]; MAX_CERT_FIELDS],
            lens: [0; MAX_CERT_FIELDS],
            count: 0,
        }
    }
}

impl CertFieldData {
    pub fn push(&mut self, data: &[u8]) -> SeResult<()> {
        if self.count == MAX_CERT_FIELDS || data.len() > MAX_SLOT_BYTE_SIZE {
            return Err(SeError::AUTH_BAD_PARAM);
        }
        self.bufs[self.count][..data.len()].copy_from_slice(data);
        self.lens[self.count] = data.len();
        self.count += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        if index < self.count {
            Some(&self.bufs[index][..self.lens[index]])
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        (0..self.count).map(move |i| &self.bufs[i][..self.lens[i]])
    }
}
