/*++

Licensed under the Apache-2.0 license.

File Name:

    engine.rs

Abstract:

    File contains the authentication protocols. Each protocol is a
    linear pipeline that aborts at the first failing stage and returns
    that stage's status unchanged; no partial trust is ever granted.

--*/

use crate::env::{AuthEnv, CertEngine, CertFieldData, DeviceSelect};
use crate::session::AuthSession;
use crate::slots;
use cryptoauth_error::{SeError, SeResult};
use cryptoauth_proto::Opcode;
use cryptoauth_types::{
    AttestationRecord, CertKind, SeDigest, SePubKey, DEVICE_CERT_BYTE_SIZE, MAX_SLOT_BYTE_SIZE,
    SIGNER_CERT_BYTE_SIZE,
};
use subtle::ConstantTimeEq;
use zerocopy::little_endian::U32;
use zeroize::Zeroize;

/// MAC command message size inside the element.
const MAC_MESSAGE_SIZE: usize = 88;

/// Firmware-pinned trust material. Baked in at build time; every
/// protocol run re-derives the rest from the connected element.
pub struct TrustAnchors {
    /// Root authority public key the certificate chain must anchor to.
    pub root_pub_key: SePubKey,
    /// The one key boot images must be signed with.
    pub image_signing_pub_key: SePubKey,
    /// Seed the shared symmetric key is derived from.
    pub symmetric_key_seed: &'static [u8],
}

/// One authentication protocol and its payload.
#[derive(Debug, Copy, Clone)]
pub enum AuthRequest<'a> {
    /// Symmetric MAC check against the shared key.
    Symmetric,
    /// Key-possession check against a caller-held public key.
    PkiDevice { pub_key: &'a SePubKey },
    /// Two-level chain, verified in software.
    PkiChain,
    /// Two-level chain, verified on a host element.
    PkiChainHw,
}

/// Runs the authentication protocols over an element environment and a
/// certificate-template engine.
pub struct AuthEngine<Env: AuthEnv, Certs: CertEngine> {
    env: Env,
    certs: Certs,
    anchors: TrustAnchors,
}

impl<Env: AuthEnv, Certs: CertEngine> AuthEngine<Env, Certs> {
    pub fn new(env: Env, certs: Certs, anchors: TrustAnchors) -> Self {
        Self {
            env,
            certs,
            anchors,
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Run the protocol selected by `request`.
    pub fn authenticate(&mut self, request: AuthRequest) -> SeResult<()> {
        match request {
            AuthRequest::Symmetric => self.auth_symmetric(),
            AuthRequest::PkiDevice { pub_key } => self.auth_device(pub_key),
            AuthRequest::PkiChain => self.auth_chain_sw(),
            AuthRequest::PkiChainHw => self.auth_chain_hw(),
        }
    }

    /// Key-possession check: the element must prove it holds the
    /// private key paired to `pub_key`. No certificate is walked.
    pub fn auth_device(&mut self, pub_key: &SePubKey) -> SeResult<()> {
        let mut session = AuthSession::default();
        session.challenge = self.env.random()?;
        session.response = self.env.sign(slots::DEVICE_PRIVKEY_ID, &session.challenge)?;
        self.env
            .verify(&session.challenge, pub_key, &session.response)
    }

    /// Two-level chain anchored at the firmware root key, verified in
    /// software, finished with a challenge-response against the leaf.
    pub fn auth_chain_sw(&mut self) -> SeResult<()> {
        let mut session = AuthSession::default();
        let root = self.anchors.root_pub_key;
        self.rebuild_certs(&root, &mut session)?;
        self.verify_chain(&root, &session)?;
        session.challenge = self.env.random()?;
        session.response = self.env.sign(slots::DEVICE_PRIVKEY_ID, &session.challenge)?;
        self.env
            .verify(&session.challenge, &session.device_pub_key, &session.response)
    }

    /// Two-level chain where a host element performs the verification
    /// and challenge steps while a client element carries the certs.
    ///
    /// The host's on-chip root key is pinned against the firmware
    /// constant before any chain step runs.
    pub fn auth_chain_hw(&mut self) -> SeResult<()> {
        let mut session = AuthSession::default();

        self.env.select_device(DeviceSelect::Host)?;
        let root = self.env.read_pub_key(slots::ROOT_PUBKEY_ID)?;
        if root != self.anchors.root_pub_key {
            return Err(SeError::AUTH_ROOT_KEY_MISMATCH);
        }

        self.env.select_device(DeviceSelect::Client)?;
        self.rebuild_certs(&root, &mut session)?;

        self.env.select_device(DeviceSelect::Host)?;
        self.verify_chain(&root, &session)?;

        // Re-select so the client cannot have generated the challenge.
        self.env.select_device(DeviceSelect::Host)?;
        session.challenge = self.env.random()?;

        self.env.select_device(DeviceSelect::Client)?;
        session.response = self.env.sign(slots::DEVICE_PRIVKEY_ID, &session.challenge)?;

        self.env.select_device(DeviceSelect::Host)?;
        self.env
            .verify(&session.challenge, &session.device_pub_key, &session.response)
    }

    /// Symmetric MAC check against the shared key slot.
    ///
    /// The element MACs a fresh challenge with its stored key; the same
    /// message is recomputed here from the firmware-derived key and
    /// compared in constant time.
    pub fn auth_symmetric(&mut self) -> SeResult<()> {
        let challenge = self.env.random()?;
        let device_mac = self.env.mac(slots::SYMMETRIC_KEY_ID, &challenge)?;

        let mut key = self.env.sha256(self.anchors.symmetric_key_seed)?;
        let sn = self.env.serial_number()?;

        // Mirror of the element's internal MAC message, byte for byte.
        let mut message = [0u8; MAC_MESSAGE_SIZE];
        message[..32].copy_from_slice(&key);
        message[32..64].copy_from_slice(&challenge);
        message[64] = Opcode::Mac.code();
        message[65] = 0x00;
        message[66..68].copy_from_slice(&slots::SYMMETRIC_KEY_ID.to_le_bytes());
        // 68..76 and 76..79 stay zero (unused OTP words).
        message[79] = sn[8];
        // 80..84 stay zero.
        message[84] = sn[0];
        message[85] = sn[1];
        // 86..88 stay zero.

        let expected = self.env.sha256(&message)?;
        message.zeroize();
        key.zeroize();

        if bool::from(device_mac[..].ct_eq(&expected[..])) {
            Ok(())
        } else {
            Err(SeError::DEVICE_CHECKMAC_VERIFY_FAILED)
        }
    }

    /// Build a portable attestation record covering `digest`.
    ///
    /// `msg_size` is the length of the data `digest` was computed over;
    /// verifiers re-hash exactly that many bytes.
    pub fn attest_generate(
        &mut self,
        digest: &SeDigest,
        msg_size: u32,
    ) -> SeResult<AttestationRecord> {
        let mut session = AuthSession::default();

        let root = self.env.read_pub_key(slots::ROOT_PUBKEY_ID)?;
        if root != self.anchors.root_pub_key {
            return Err(SeError::AUTH_ROOT_KEY_MISMATCH);
        }

        self.rebuild_certs(&root, &mut session)?;
        if session.signer_cert_len != SIGNER_CERT_BYTE_SIZE
            || session.device_cert_len != DEVICE_CERT_BYTE_SIZE
        {
            return Err(SeError::AUTH_CERT_ELEM_SIZE);
        }

        let mut record = AttestationRecord::default();
        record.msg_signature = self.env.sign(slots::DEVICE_PRIVKEY_ID, digest)?;
        record.msg_size = U32::new(msg_size);
        record.root_pub_key = root;
        record.signer_cert = session.signer_cert;
        record.device_cert = session.device_cert;
        Ok(record)
    }

    /// Check a record against a caller-computed digest with no round
    /// trip to the prover.
    pub fn attest_verify(
        &mut self,
        record: &AttestationRecord,
        digest: &SeDigest,
    ) -> SeResult<()> {
        let device_pub_key = self.verify_record_chain(record)?;
        self.env
            .verify(digest, &device_pub_key, &record.msg_signature)
    }

    /// Boot-stage image check.
    ///
    /// The record's chain must terminate at the firmware-pinned image
    /// signing key; a valid chain ending anywhere else is rejected.
    pub fn verify_boot_image(
        &mut self,
        record: &AttestationRecord,
        image: &[u8],
    ) -> SeResult<()> {
        let device_pub_key = self.verify_record_chain(record)?;
        if device_pub_key != self.anchors.image_signing_pub_key {
            return Err(SeError::AUTH_SECUREBOOT_KEY_MISMATCH);
        }

        let msg_size = record.msg_size.get() as usize;
        if msg_size > image.len() {
            return Err(SeError::AUTH_BAD_PARAM);
        }
        let digest = self.env.sha256(&image[..msg_size])?;
        self.env.verify(
            &digest,
            &self.anchors.image_signing_pub_key,
            &record.msg_signature,
        )
    }

    /// Rebuild both certificates off the element and extract their
    /// subject keys. Keys extracted here are only trusted after
    /// `verify_chain` passes.
    fn rebuild_certs(&mut self, root: &SePubKey, session: &mut AuthSession) -> SeResult<()> {
        session.signer_cert_len =
            self.rebuild_cert(CertKind::Signer, root, &mut session.signer_cert)?;
        let signer_key = self
            .certs
            .subject_pub_key(CertKind::Signer, session.signer_cert())?;
        session.signer_pub_key = signer_key;

        session.device_cert_len =
            self.rebuild_cert(CertKind::Device, &signer_key, &mut session.device_cert)?;
        let device_key = self
            .certs
            .subject_pub_key(CertKind::Device, session.device_cert())?;
        session.device_pub_key = device_key;
        Ok(())
    }

    fn rebuild_cert(
        &mut self,
        kind: CertKind,
        issuer_pub_key: &SePubKey,
        cert: &mut [u8],
    ) -> SeResult<usize> {
        let mut fields = CertFieldData::default();
        for loc in self.certs.dynamic_fields(kind) {
            let mut buf = [0u8; MAX_SLOT_BYTE_SIZE];
            let len = self.env.read_loc(loc, &mut buf)?;
            fields.push(&buf[..len])?;
        }
        self.certs.build_cert(kind, issuer_pub_key, &fields, cert)
    }

    fn verify_chain(&mut self, root: &SePubKey, session: &AuthSession) -> SeResult<()> {
        self.verify_cert(CertKind::Signer, session.signer_cert(), root)?;
        self.verify_cert(CertKind::Device, session.device_cert(), &session.signer_pub_key)
    }

    fn verify_cert(&mut self, kind: CertKind, cert: &[u8], issuer: &SePubKey) -> SeResult<()> {
        let digest = self.certs.tbs_digest(kind, cert)?;
        let signature = self.certs.signature(kind, cert)?;
        self.env.verify(&digest, issuer, &signature)
    }

    /// Pin the record's root key, then walk the chain inside the
    /// record. Returns the verified leaf key.
    fn verify_record_chain(&mut self, record: &AttestationRecord) -> SeResult<SePubKey> {
        if record.root_pub_key != self.anchors.root_pub_key {
            return Err(SeError::AUTH_ROOT_KEY_MISMATCH);
        }
        self.verify_cert(CertKind::Signer, &record.signer_cert, &record.root_pub_key)?;
        let signer_key = self
            .certs
            .subject_pub_key(CertKind::Signer, &record.signer_cert)?;
        self.verify_cert(CertKind::Device, &record.device_cert, &signer_key)?;
        self.certs
            .subject_pub_key(CertKind::Device, &record.device_cert)
    }
}
