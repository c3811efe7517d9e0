/*++

Licensed under the Apache-2.0 license.

File Name:

    compact.rs

Abstract:

    File contains the 3-byte compact validity encoding stored in a
    certificate definition: issue date packed to hour resolution plus an
    expiry expressed in whole years.

--*/

use crate::{DateFormat, Timestamp};
use cryptoauth_error::{SeError, SeResult};

/// Encoded size of a compact date.
pub const COMPACT_DATE_SIZE: usize = 3;

const ISSUE_YEAR_BASE: u16 = 2000;
const ISSUE_YEAR_MAX: u16 = 2031;
const EXPIRE_YEARS_MAX: u8 = 31;

/// Issue date at hour resolution plus an expiry term in years.
///
/// `expire_years == 0` means the certificate never expires; the expiry
/// then saturates to the target format's latest representable date.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CompactDate {
    pub issue: Timestamp,
    pub expire_years: u8,
}

impl CompactDate {
    /// Pack into the 3-byte form.
    ///
    /// Bit layout, MSB first:
    /// `enc[0]` = issue year offset (5) | month high (3);
    /// `enc[1]` = month low (1) | day (5) | hour high (2);
    /// `enc[2]` = hour low (3) | expire years (5).
    pub fn encode(&self) -> SeResult<[u8; COMPACT_DATE_SIZE]> {
        self.issue.check_fields()?;
        if !(ISSUE_YEAR_BASE..=ISSUE_YEAR_MAX).contains(&self.issue.year)
            || self.expire_years > EXPIRE_YEARS_MAX
        {
            return Err(SeError::DATE_INVALID);
        }
        let year = (self.issue.year - ISSUE_YEAR_BASE) as u8;
        let month = self.issue.month;
        let day = self.issue.day;
        let hour = self.issue.hour;
        Ok([
            (year << 3) | ((month & 0x0F) >> 1),
            ((month & 0x01) << 7) | (day << 2) | (hour >> 3),
            ((hour & 0x07) << 5) | (self.expire_years & 0x1F),
        ])
    }

    /// Unpack from the 3-byte form. Minutes and seconds decode as zero.
    pub fn decode(enc: &[u8; COMPACT_DATE_SIZE]) -> SeResult<Self> {
        let issue = Timestamp {
            year: ISSUE_YEAR_BASE + (enc[0] >> 3) as u16,
            month: ((enc[0] & 0x07) << 1) | (enc[1] >> 7),
            day: (enc[1] >> 2) & 0x1F,
            hour: ((enc[1] & 0x03) << 3) | (enc[2] >> 5),
            minute: 0,
            second: 0,
        };
        issue.check_fields()?;
        Ok(Self {
            issue,
            expire_years: enc[2] & 0x1F,
        })
    }

    /// Expiry date for a certificate whose not-after uses `format`.
    pub fn expiry(&self, format: DateFormat) -> Timestamp {
        if self.expire_years == 0 {
            return format.max_date();
        }
        Timestamp {
            year: self.issue.year + self.expire_years as u16,
            ..self.issue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUE: Timestamp = Timestamp {
        year: 2021,
        month: 3,
        day: 7,
        hour: 10,
        minute: 0,
        second: 0,
    };

    #[test]
    fn test_known_encoding() {
        let date = CompactDate {
            issue: ISSUE,
            expire_years: 10,
        };
        assert_eq!(date.encode(), Ok([0xA9, 0x9D, 0x4A]));
        assert_eq!(CompactDate::decode(&[0xA9, 0x9D, 0x4A]), Ok(date));
    }

    #[test]
    fn test_round_trip_field_extremes() {
        for (issue, expire_years) in [
            (
                Timestamp {
                    year: 2000,
                    month: 1,
                    day: 1,
                    hour: 0,
                    minute: 0,
                    second: 0,
                },
                0,
            ),
            (
                Timestamp {
                    year: 2031,
                    month: 12,
                    day: 31,
                    hour: 23,
                    minute: 0,
                    second: 0,
                },
                31,
            ),
        ] {
            let date = CompactDate {
                issue,
                expire_years,
            };
            let enc = date.encode().unwrap();
            assert_eq!(CompactDate::decode(&enc), Ok(date));
        }
    }

    #[test]
    fn test_minutes_drop_in_encoding() {
        let precise = CompactDate {
            issue: Timestamp {
                minute: 42,
                second: 7,
                ..ISSUE
            },
            expire_years: 1,
        };
        let truncated = CompactDate {
            issue: ISSUE,
            expire_years: 1,
        };
        assert_eq!(precise.encode(), truncated.encode());
    }

    #[test]
    fn test_range_rejections() {
        let late = CompactDate {
            issue: Timestamp { year: 2032, ..ISSUE },
            expire_years: 1,
        };
        assert_eq!(late.encode(), Err(SeError::DATE_INVALID));

        let long = CompactDate {
            issue: ISSUE,
            expire_years: 32,
        };
        assert_eq!(long.encode(), Err(SeError::DATE_INVALID));
    }

    #[test]
    fn test_expiry() {
        let date = CompactDate {
            issue: ISSUE,
            expire_years: 10,
        };
        assert_eq!(
            date.expiry(DateFormat::Rfc5280Gen),
            Timestamp { year: 2031, ..ISSUE }
        );

        let never = CompactDate {
            issue: ISSUE,
            expire_years: 0,
        };
        assert_eq!(
            never.expiry(DateFormat::Rfc5280Utc),
            DateFormat::Rfc5280Utc.max_date()
        );
        assert_eq!(
            never.expiry(DateFormat::PosixU32Be),
            DateFormat::PosixU32Be.max_date()
        );
    }

    #[test]
    fn test_decode_rejects_zero_day() {
        // Day bits of zero decode to an invalid calendar date.
        assert_eq!(
            CompactDate::decode(&[0xA9, 0x80, 0x4A]),
            Err(SeError::DATE_INVALID)
        );
    }
}
