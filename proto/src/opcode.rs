/*++

Licensed under the Apache-2.0 license.

File Name:

    opcode.rs

Abstract:

    File contains the secure-element command opcodes.

--*/

/// Secure-element command opcode.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Opcode {
    Pause = 0x01,
    Read = 0x02,
    Mac = 0x08,
    Hmac = 0x11,
    Write = 0x12,
    GenDig = 0x15,
    Nonce = 0x16,
    Lock = 0x17,
    Random = 0x1B,
    DeriveKey = 0x1C,
    UpdateExtra = 0x20,
    Counter = 0x24,
    CheckMac = 0x28,
    Info = 0x30,
    GenKey = 0x40,
    Sign = 0x41,
    Ecdh = 0x43,
    Verify = 0x45,
    PrivWrite = 0x46,
    Sha = 0x47,
}

impl Opcode {
    /// Wire value of the opcode byte.
    pub const fn code(self) -> u8 {
        self as u8
    }
}
