/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Certificate-chain authentication engine. Runs the five trust
    protocols against a secure element: device-only key possession,
    two-level software chain, two-level hardware-assisted chain,
    portable attestation records, symmetric MAC check, and boot-image
    verification.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

mod device_env;
mod engine;
mod env;
mod session;
pub mod slots;

/// Library revision reported to hosts.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use device_env::DeviceEnv;
pub use engine::{AuthEngine, AuthRequest, TrustAnchors};
pub use env::{AuthEnv, CertEngine, CertFieldData, DeviceSelect, MAX_CERT_FIELDS};
pub use session::AuthSession;
