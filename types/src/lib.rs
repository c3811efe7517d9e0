/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains data structures shared by the packet codec and the
    certificate-chain authentication engine.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

use cryptoauth_error::{SeError, SeResult};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout, Unaligned};

/// P-256 public key size (X || Y, raw coordinates).
pub const PUB_KEY_BYTE_SIZE: usize = 64;
/// ECDSA P-256 signature size (R || S, raw scalars).
pub const SIGNATURE_BYTE_SIZE: usize = 64;
/// SHA-256 digest size.
pub const DIGEST_BYTE_SIZE: usize = 32;
/// Challenge size used by every challenge/response protocol.
pub const CHALLENGE_BYTE_SIZE: usize = 32;
/// Symmetric key size held in a key slot.
pub const KEY_BYTE_SIZE: usize = 32;
/// Data zone block size.
pub const BLOCK_BYTE_SIZE: usize = 32;
/// Largest data slot size; certificate rebuild reads at most this much per location.
pub const MAX_SLOT_BYTE_SIZE: usize = 72;
/// Rebuilt signer certificate size for the provisioned template.
pub const SIGNER_CERT_BYTE_SIZE: usize = 506;
/// Rebuilt device certificate size for the provisioned template.
pub const DEVICE_CERT_BYTE_SIZE: usize = 428;
/// OTP provisioning-info zone size.
pub const OTP_ZONE_BYTE_SIZE: usize = 64;
/// Device serial number size.
pub const SERIAL_NUM_BYTE_SIZE: usize = 9;

pub type SePubKey = [u8; PUB_KEY_BYTE_SIZE];
pub type SeSignature = [u8; SIGNATURE_BYTE_SIZE];
pub type SeDigest = [u8; DIGEST_BYTE_SIZE];
pub type SeChallenge = [u8; CHALLENGE_BYTE_SIZE];
pub type SeSerialNum = [u8; SERIAL_NUM_BYTE_SIZE];

/// Which certificate of the two-level chain an operation refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CertKind {
    /// Intermediate certificate, signed by the root key.
    Signer,
    /// Leaf certificate, signed by the signer key.
    Device,
}

/// Element storage zone a dynamic certificate field lives in.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DevZone {
    Config,
    Otp,
    Data,
}

/// Location of one dynamic certificate field in element storage.
///
/// `is_genkey` locations are public keys recomputed by the element rather
/// than read from a slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DeviceLoc {
    pub zone: DevZone,
    pub slot: u16,
    pub is_genkey: bool,
    pub offset: u16,
    pub count: u16,
}

/// Portable attestation record.
///
/// Self-contained bundle a prover builds once and a verifier checks with
/// no further round trip to the prover. Byte layout is stable; the record
/// crosses transport and flash boundaries as-is.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Copy, Debug, PartialEq)]
pub struct AttestationRecord {
    /// Signature over the attested digest, by the device identity key.
    pub msg_signature: SeSignature,
    /// Size in bytes of the data the attested digest was computed over.
    pub msg_size: U32,
    /// Root public key the prover's chain is anchored to.
    pub root_pub_key: SePubKey,
    /// Rebuilt signer certificate.
    pub signer_cert: [u8; SIGNER_CERT_BYTE_SIZE],
    /// Rebuilt device certificate.
    pub device_cert: [u8; DEVICE_CERT_BYTE_SIZE],
}

impl Default for AttestationRecord {
    fn default() -> Self {
        Self::new_zeroed()
    }
}

/// Provisioning info kept in the element's OTP zone.
///
/// Typed view over the 64-byte OTP read; ASCII fields are not
/// NUL-terminated.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Copy, Debug, Eq, PartialEq)]
pub struct OtpConfig {
    /// Format/version of the OTP zone layout.
    pub otp_format: u8,
    /// Configuration type.
    pub config_type: [u8; 2],
    /// Major revision.
    pub rev_maj: u8,
    /// Minor revision.
    pub rev_min: u8,
    pub reserved: [u8; 11],
    /// Vendor tag, ASCII.
    pub vendor: [u8; 5],
    /// Provisioning year, ASCII.
    pub prov_year: [u8; 2],
    /// Provisioning month, ASCII.
    pub prov_month: [u8; 2],
    /// Provisioning day, ASCII.
    pub prov_day: [u8; 2],
    pub reserved2: [u8; 5],
    /// Free-form description.
    pub description: [u8; 32],
}

impl OtpConfig {
    /// Parse a raw OTP zone read.
    pub fn read_from(otp: &[u8]) -> SeResult<Self> {
        let (config, _) =
            Self::read_from_prefix(otp).map_err(|_| SeError::PROTO_INVALID_SIZE)?;
        Ok(config)
    }
}

const _: () = assert!(core::mem::size_of::<OtpConfig>() == OTP_ZONE_BYTE_SIZE);
