/*++

Licensed under the Apache-2.0 license.

File Name:

    exectime.rs

Abstract:

    File contains typical command execution times per device family.
    The transport polls for the response only after the command's
    typical time has elapsed.

--*/

use crate::Opcode;
use cryptoauth_error::{SeError, SeResult};

/// Secure-element family the session is bound to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DeviceFamily {
    /// ECC P-256 parts with the full command set.
    FullCrypto,
    /// SHA-only parts; ECC opcodes are unsupported.
    HashOnly,
}

impl DeviceFamily {
    pub fn exec_times(self) -> &'static ExecTimes {
        match self {
            DeviceFamily::FullCrypto => &FULL_CRYPTO_EXEC_TIMES,
            DeviceFamily::HashOnly => &HASH_ONLY_EXEC_TIMES,
        }
    }
}

/// Typical execution times in milliseconds. A zero entry marks an
/// opcode the family does not implement.
pub struct ExecTimes {
    wake_ms: u32,
    checkmac_ms: u32,
    counter_ms: u32,
    derive_key_ms: u32,
    ecdh_ms: u32,
    gendig_ms: u32,
    genkey_ms: u32,
    hmac_ms: u32,
    info_ms: u32,
    lock_ms: u32,
    mac_ms: u32,
    nonce_ms: u32,
    pause_ms: u32,
    priv_write_ms: u32,
    random_ms: u32,
    read_ms: u32,
    sha_ms: u32,
    sign_ms: u32,
    update_extra_ms: u32,
    verify_ms: u32,
    write_ms: u32,
}

static FULL_CRYPTO_EXEC_TIMES: ExecTimes = ExecTimes {
    wake_ms: 1,
    checkmac_ms: 13,
    counter_ms: 20,
    derive_key_ms: 50,
    ecdh_ms: 58,
    gendig_ms: 11,
    genkey_ms: 115,
    hmac_ms: 23,
    info_ms: 2,
    lock_ms: 32,
    mac_ms: 14,
    nonce_ms: 29,
    pause_ms: 3,
    priv_write_ms: 48,
    random_ms: 23,
    read_ms: 1,
    sha_ms: 9,
    sign_ms: 60,
    update_extra_ms: 10,
    verify_ms: 72,
    write_ms: 26,
};

static HASH_ONLY_EXEC_TIMES: ExecTimes = ExecTimes {
    wake_ms: 3,
    checkmac_ms: 38,
    counter_ms: 0,
    derive_key_ms: 62,
    ecdh_ms: 0,
    gendig_ms: 43,
    genkey_ms: 0,
    hmac_ms: 69,
    info_ms: 2,
    lock_ms: 24,
    mac_ms: 35,
    nonce_ms: 60,
    pause_ms: 2,
    priv_write_ms: 0,
    random_ms: 50,
    read_ms: 4,
    sha_ms: 22,
    sign_ms: 0,
    update_extra_ms: 12,
    verify_ms: 0,
    write_ms: 42,
};

impl ExecTimes {
    /// Delay between wake pulse and the wake token becoming readable.
    pub fn wake_ms(&self) -> u32 {
        self.wake_ms
    }

    /// Typical execution time for `opcode` on this family.
    pub fn time_ms(&self, opcode: Opcode) -> SeResult<u32> {
        let ms = match opcode {
            Opcode::CheckMac => self.checkmac_ms,
            Opcode::Counter => self.counter_ms,
            Opcode::DeriveKey => self.derive_key_ms,
            Opcode::Ecdh => self.ecdh_ms,
            Opcode::GenDig => self.gendig_ms,
            Opcode::GenKey => self.genkey_ms,
            Opcode::Hmac => self.hmac_ms,
            Opcode::Info => self.info_ms,
            Opcode::Lock => self.lock_ms,
            Opcode::Mac => self.mac_ms,
            Opcode::Nonce => self.nonce_ms,
            Opcode::Pause => self.pause_ms,
            Opcode::PrivWrite => self.priv_write_ms,
            Opcode::Random => self.random_ms,
            Opcode::Read => self.read_ms,
            Opcode::Sha => self.sha_ms,
            Opcode::Sign => self.sign_ms,
            Opcode::UpdateExtra => self.update_extra_ms,
            Opcode::Verify => self.verify_ms,
            Opcode::Write => self.write_ms,
        };
        if ms == 0 {
            return Err(SeError::PROTO_BAD_OPCODE);
        }
        Ok(ms)
    }
}
