/*++

Licensed under the Apache-2.0 license.

File Name:

    response.rs

Abstract:

    File contains receive-side classification of element response
    frames. A 4-byte frame is a status report; anything longer is data.

--*/

use crate::crc::verify_frame_crc;
use crate::RSP_SIZE_MIN;
use cryptoauth_error::{SeError, SeResult};

/// Status byte reporting success on informational commands.
pub const STATUS_SUCCESS: u8 = 0x00;
/// Status byte reporting a CheckMac or Verify comparison miss.
pub const STATUS_CHECKMAC_VERIFY_FAILED: u8 = 0x01;
/// Status byte reporting a command the element could not parse.
pub const STATUS_PARSE_ERROR: u8 = 0x03;
/// Status byte reporting an execution fault (bad slot config, ecc fault).
pub const STATUS_EXECUTION_ERROR: u8 = 0x0F;
/// Status byte the element emits once after wake.
pub const STATUS_AFTER_WAKE: u8 = 0x11;
/// Status byte reporting an I/O CRC or framing problem on receive.
pub const STATUS_COMM_ERROR: u8 = 0xFF;

/// The complete frame the element emits after a wake pulse.
pub const WAKE_TOKEN_FRAME: [u8; 4] = [0x04, 0x11, 0x33, 0x43];

/// Check a received frame and extract its payload.
///
/// Frames longer than 4 bytes carry command output and the payload
/// slice (without count and CRC) is returned. Exactly 4 bytes is a
/// status frame; only `STATUS_SUCCESS` maps to an empty `Ok` payload,
/// every other status byte maps to its error constant.
pub fn classify_response(frame: &[u8]) -> SeResult<&[u8]> {
    verify_frame_crc(frame)?;
    let count = frame[0] as usize;
    if count > RSP_SIZE_MIN {
        return Ok(&frame[1..count - 2]);
    }
    match frame[1] {
        STATUS_SUCCESS => Ok(&[]),
        STATUS_CHECKMAC_VERIFY_FAILED => Err(SeError::DEVICE_CHECKMAC_VERIFY_FAILED),
        STATUS_PARSE_ERROR => Err(SeError::DEVICE_PARSE_ERROR),
        STATUS_EXECUTION_ERROR => Err(SeError::DEVICE_EXECUTION_ERROR),
        STATUS_AFTER_WAKE => Err(SeError::DEVICE_WAKE_TOKEN),
        STATUS_COMM_ERROR => Err(SeError::DEVICE_COMM_ERROR),
        _ => Err(SeError::DEVICE_STATUS_UNKNOWN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::crc16;

    fn status_frame(status: u8) -> [u8; 4] {
        let mut frame = [0x04, status, 0, 0];
        let crc = crc16(&frame[..2]);
        frame[2..].copy_from_slice(&crc);
        frame
    }

    fn data_frame(payload: &[u8]) -> Vec<u8> {
        let count = payload.len() + 3;
        let mut frame = Vec::with_capacity(count);
        frame.push(count as u8);
        frame.extend_from_slice(payload);
        let crc = crc16(&frame);
        frame.extend_from_slice(&crc);
        frame
    }

    #[test]
    fn test_status_frames() {
        assert_eq!(classify_response(&status_frame(STATUS_SUCCESS)), Ok(&[][..]));
        let cases = [
            (STATUS_CHECKMAC_VERIFY_FAILED, SeError::DEVICE_CHECKMAC_VERIFY_FAILED),
            (STATUS_PARSE_ERROR, SeError::DEVICE_PARSE_ERROR),
            (STATUS_EXECUTION_ERROR, SeError::DEVICE_EXECUTION_ERROR),
            (STATUS_AFTER_WAKE, SeError::DEVICE_WAKE_TOKEN),
            (STATUS_COMM_ERROR, SeError::DEVICE_COMM_ERROR),
            (0x42, SeError::DEVICE_STATUS_UNKNOWN),
        ];
        for (status, err) in cases {
            assert_eq!(classify_response(&status_frame(status)), Err(err));
        }
    }

    #[test]
    fn test_wake_token() {
        // The wake frame is a well-formed status frame in its own right.
        assert_eq!(
            classify_response(&WAKE_TOKEN_FRAME),
            Err(SeError::DEVICE_WAKE_TOKEN)
        );
        assert_eq!(status_frame(STATUS_AFTER_WAKE), WAKE_TOKEN_FRAME);
    }

    #[test]
    fn test_data_frame_payload() {
        let frame = data_frame(&[0xAA; 32]);
        assert_eq!(classify_response(&frame), Ok(&[0xAA; 32][..]));
    }

    #[test]
    fn test_bad_crc_wins_over_status() {
        let mut frame = status_frame(STATUS_SUCCESS);
        frame[2] ^= 0x01;
        assert_eq!(classify_response(&frame), Err(SeError::PROTO_BAD_CRC));
    }

    #[test]
    fn test_short_frame() {
        assert_eq!(
            classify_response(&[0x02, 0x00]),
            Err(SeError::PROTO_INVALID_SIZE)
        );
    }
}
