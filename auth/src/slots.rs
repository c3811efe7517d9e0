/*++

Licensed under the Apache-2.0 license.

File Name:

    slots.rs

Abstract:

    File contains the provisioned key-slot map the protocols assume.

--*/

/// Data slot holding the root authority public key.
pub const ROOT_PUBKEY_ID: u16 = 0xD;
/// Data slot holding the signer private key.
pub const SIGNER_PRIVKEY_ID: u16 = 0x3;
/// Data slot holding the shared symmetric key.
pub const SYMMETRIC_KEY_ID: u16 = 0x1;
/// Data slot holding the device private key; also signs product tags.
pub const DEVICE_PRIVKEY_ID: u16 = 0x0;
