/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains API and macros used by the library for error handling

--*/
#![cfg_attr(not(feature = "std"), no_std)]
use core::convert::From;
use core::num::{NonZeroU32, TryFromIntError};

/// Secure element library error type.
///
/// Codes are partitioned by component: `0x0001_xxxx` packet protocol,
/// `0x0002_xxxx` device status, `0x0003_xxxx` date codec, `0x0004_xxxx`
/// authentication engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SeError(pub NonZeroU32);

/// Failure class an error code belongs to. Callers branch on this when
/// they need to tell a misconfigured trust anchor apart from a signature
/// that did not verify.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// Malformed frame, bad CRC, bad opcode/mode combination.
    Protocol,
    /// The element itself reported a semantic failure.
    DeviceStatus,
    /// Caller passed an invalid or mismatched argument.
    Param,
    /// A cryptographic check did not pass.
    Verification,
    /// Timestamp outside the target format's range.
    DateRange,
    /// Formatted date bytes do not parse.
    DateFormat,
}

/// Macro to define error constants ensuring uniqueness
///
/// This macro takes a list of (name, value, doc) tuples and generates
/// constant definitions for each error code.
#[macro_export]
macro_rules! define_error_constants {
    ($(($name:ident, $value:expr, $doc:expr)),* $(,)?) => {
        $(
            #[doc = $doc]
            pub const $name: SeError = SeError::new_const($value);
        )*

        #[cfg(test)]
        /// Returns a vector of all defined error constants for testing uniqueness
        pub fn all_constants() -> Vec<(&'static str, u32)> {
            vec![
                $(
                    (stringify!($name), $value),
                )*
            ]
        }
    };
}

impl SeError {
    /// Create an error constant; intended to only be used from const contexts,
    /// as we don't want runtime panics if val is zero. The preferred way to get
    /// an SeError from a u32 is `SeError::try_from()`.
    const fn new_const(val: u32) -> Self {
        match NonZeroU32::new(val) {
            Some(val) => Self(val),
            None => panic!("SeError cannot be 0"),
        }
    }

    define_error_constants![
        // Packet protocol codec
        (
            PROTO_BAD_PARAM,
            0x0001_0001,
            "Invalid opcode/mode/size combination for a command frame"
        ),
        (
            PROTO_BAD_OPCODE,
            0x0001_0002,
            "Opcode is not supported by the selected device family"
        ),
        (PROTO_BAD_CRC, 0x0001_0003, "Received frame failed CRC check"),
        (
            PROTO_INVALID_SIZE,
            0x0001_0004,
            "Frame or buffer size is out of range"
        ),
        // Device-reported status
        (
            DEVICE_CHECKMAC_VERIFY_FAILED,
            0x0002_0001,
            "Element reported CheckMac or Verify failure (status byte 0x01)"
        ),
        (
            DEVICE_PARSE_ERROR,
            0x0002_0002,
            "Element could not parse length, opcode or parameter (status byte 0x03)"
        ),
        (
            DEVICE_EXECUTION_ERROR,
            0x0002_0003,
            "Element was in a state where it could not execute the command (status byte 0x0F)"
        ),
        (
            DEVICE_WAKE_TOKEN,
            0x0002_0004,
            "Element reported a successful wake (status byte 0x11)"
        ),
        (
            DEVICE_COMM_ERROR,
            0x0002_0005,
            "Element detected a CRC or other communication error (status byte 0xFF)"
        ),
        (
            DEVICE_STATUS_UNKNOWN,
            0x0002_0006,
            "Element returned an unrecognized status byte"
        ),
        // Certificate date codec
        (
            DATE_INVALID,
            0x0003_0001,
            "Timestamp is outside the representable range of the target format"
        ),
        (
            DATE_DECODING_ERROR,
            0x0003_0002,
            "Formatted date bytes have an invalid format"
        ),
        (
            DATE_BAD_PARAM,
            0x0003_0003,
            "Invalid argument passed to the date codec"
        ),
        // Authentication engine
        (
            AUTH_VERIFY_FAILED,
            0x0004_0001,
            "Certificate or challenge/response verification failed"
        ),
        (
            AUTH_ROOT_KEY_MISMATCH,
            0x0004_0002,
            "Root public key read from the element does not match the firmware trust anchor"
        ),
        (
            AUTH_SECUREBOOT_KEY_MISMATCH,
            0x0004_0003,
            "Certificate chain does not terminate at the firmware image-signing key"
        ),
        (
            AUTH_BAD_PARAM,
            0x0004_0004,
            "Invalid argument passed to an authentication entry point"
        ),
        (
            AUTH_CERT_ELEM_SIZE,
            0x0004_0005,
            "A rebuilt certificate element size was not what was expected"
        ),
    ];

    /// Failure class for this error code.
    pub fn kind(&self) -> ErrorKind {
        if *self == Self::AUTH_VERIFY_FAILED
            || *self == Self::AUTH_SECUREBOOT_KEY_MISMATCH
            || *self == Self::DEVICE_CHECKMAC_VERIFY_FAILED
        {
            return ErrorKind::Verification;
        }
        if *self == Self::DATE_INVALID {
            return ErrorKind::DateRange;
        }
        if *self == Self::DATE_DECODING_ERROR {
            return ErrorKind::DateFormat;
        }
        match u32::from(*self) & 0xffff_0000 {
            0x0002_0000 => ErrorKind::DeviceStatus,
            0x0003_0000 => ErrorKind::Param,
            0x0004_0000 => ErrorKind::Param,
            _ => ErrorKind::Protocol,
        }
    }
}

impl From<core::num::NonZeroU32> for SeError {
    fn from(val: core::num::NonZeroU32) -> Self {
        SeError(val)
    }
}

impl From<SeError> for core::num::NonZeroU32 {
    fn from(val: SeError) -> Self {
        val.0
    }
}

impl From<SeError> for u32 {
    fn from(val: SeError) -> Self {
        core::num::NonZeroU32::from(val).get()
    }
}

impl TryFrom<u32> for SeError {
    type Error = TryFromIntError;
    fn try_from(val: u32) -> Result<Self, TryFromIntError> {
        match NonZeroU32::try_from(val) {
            Ok(val) => Ok(SeError(val)),
            Err(err) => Err(err),
        }
    }
}

pub type SeResult<T> = Result<T, SeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_try_from() {
        assert!(SeError::try_from(0).is_err());
        assert_eq!(
            Ok(SeError::DEVICE_CHECKMAC_VERIFY_FAILED),
            SeError::try_from(0x0002_0001)
        );
    }

    #[test]
    fn test_error_constants_uniqueness() {
        let constants = SeError::all_constants();
        let mut error_values = HashSet::new();
        let mut duplicates = Vec::new();

        for (name, value) in constants {
            if !error_values.insert(value) {
                duplicates.push((name, value));
            }
        }

        assert!(
            duplicates.is_empty(),
            "Found duplicate error codes: {:?}",
            duplicates
        );
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(SeError::PROTO_BAD_CRC.kind(), ErrorKind::Protocol);
        assert_eq!(
            SeError::DEVICE_EXECUTION_ERROR.kind(),
            ErrorKind::DeviceStatus
        );
        assert_eq!(SeError::AUTH_ROOT_KEY_MISMATCH.kind(), ErrorKind::Param);
        assert_eq!(SeError::AUTH_VERIFY_FAILED.kind(), ErrorKind::Verification);
        assert_eq!(
            SeError::AUTH_SECUREBOOT_KEY_MISMATCH.kind(),
            ErrorKind::Verification
        );
        assert_eq!(SeError::DATE_INVALID.kind(), ErrorKind::DateRange);
        assert_eq!(SeError::DATE_DECODING_ERROR.kind(), ErrorKind::DateFormat);
    }
}
