/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Certificate validity date codec: the four wire formats certificates
    carry dates in, plus the 3-byte compact form stored alongside a
    certificate definition.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

mod compact;

pub use compact::{CompactDate, COMPACT_DATE_SIZE};

use cryptoauth_error::{SeError, SeResult};

/// Size of the largest encoded form (ISO 8601).
pub const DATE_MAX_ENC_SIZE: usize = 20;

/// Wire encoding of a validity date.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DateFormat {
    /// `YYYY-MM-DDThh:mm:ssZ`, 20 bytes.
    Iso8601Sep,
    /// RFC 5280 UTCTime `YYMMDDhhmmssZ`, 13 bytes, years 1950-2049.
    Rfc5280Utc,
    /// RFC 5280 GeneralizedTime `YYYYMMDDhhmmssZ`, 15 bytes.
    Rfc5280Gen,
    /// Big-endian POSIX seconds, 4 bytes.
    PosixU32Be,
    /// Little-endian POSIX seconds, 4 bytes.
    PosixU32Le,
}

impl DateFormat {
    pub const fn encoded_size(self) -> usize {
        match self {
            DateFormat::Iso8601Sep => 20,
            DateFormat::Rfc5280Utc => 13,
            DateFormat::Rfc5280Gen => 15,
            DateFormat::PosixU32Be | DateFormat::PosixU32Le => 4,
        }
    }

    /// Latest date the format can represent.
    ///
    /// For the POSIX formats this is the final second a `u32` can hold,
    /// one past the last value `encode` accepts.
    pub const fn max_date(self) -> Timestamp {
        match self {
            DateFormat::Iso8601Sep | DateFormat::Rfc5280Gen => Timestamp {
                year: 9999,
                month: 12,
                day: 31,
                hour: 23,
                minute: 59,
                second: 59,
            },
            DateFormat::Rfc5280Utc => Timestamp {
                year: 2049,
                month: 12,
                day: 31,
                hour: 23,
                minute: 59,
                second: 59,
            },
            DateFormat::PosixU32Be | DateFormat::PosixU32Le => Timestamp {
                year: 2106,
                month: 2,
                day: 7,
                hour: 6,
                minute: 28,
                second: 15,
            },
        }
    }
}

/// A calendar timestamp, always UTC. `month` and `day` are 1-based.
#[derive(Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Timestamp {
    /// Encode into `buf`, returning the encoded length.
    pub fn encode(&self, format: DateFormat, buf: &mut [u8]) -> SeResult<usize> {
        let size = format.encoded_size();
        if buf.len() < size {
            return Err(SeError::DATE_BAD_PARAM);
        }
        self.check_fields()?;
        let buf = &mut buf[..size];
        match format {
            DateFormat::Iso8601Sep => {
                write_decimal(&mut buf[0..4], self.year as u32);
                buf[4] = b'-';
                write_decimal(&mut buf[5..7], self.month as u32);
                buf[7] = b'-';
                write_decimal(&mut buf[8..10], self.day as u32);
                buf[10] = b'T';
                write_decimal(&mut buf[11..13], self.hour as u32);
                buf[13] = b':';
                write_decimal(&mut buf[14..16], self.minute as u32);
                buf[16] = b':';
                write_decimal(&mut buf[17..19], self.second as u32);
                buf[19] = b'Z';
            }
            DateFormat::Rfc5280Utc => {
                // The two-digit year folds 2000-2049 under 1950-1999.
                let year = match self.year {
                    1950..=1999 => self.year - 1900,
                    2000..=2049 => self.year - 2000,
                    _ => return Err(SeError::DATE_INVALID),
                };
                write_decimal(&mut buf[0..2], year as u32);
                write_decimal(&mut buf[2..4], self.month as u32);
                write_decimal(&mut buf[4..6], self.day as u32);
                write_decimal(&mut buf[6..8], self.hour as u32);
                write_decimal(&mut buf[8..10], self.minute as u32);
                write_decimal(&mut buf[10..12], self.second as u32);
                buf[12] = b'Z';
            }
            DateFormat::Rfc5280Gen => {
                write_decimal(&mut buf[0..4], self.year as u32);
                write_decimal(&mut buf[4..6], self.month as u32);
                write_decimal(&mut buf[6..8], self.day as u32);
                write_decimal(&mut buf[8..10], self.hour as u32);
                write_decimal(&mut buf[10..12], self.minute as u32);
                write_decimal(&mut buf[12..14], self.second as u32);
                buf[14] = b'Z';
            }
            DateFormat::PosixU32Be => {
                buf.copy_from_slice(&self.to_posix()?.to_be_bytes());
            }
            DateFormat::PosixU32Le => {
                buf.copy_from_slice(&self.to_posix()?.to_le_bytes());
            }
        }
        Ok(size)
    }

    /// Decode from an exact-size encoded buffer.
    pub fn decode(format: DateFormat, enc: &[u8]) -> SeResult<Self> {
        if enc.len() != format.encoded_size() {
            return Err(SeError::DATE_BAD_PARAM);
        }
        let ts = match format {
            DateFormat::Iso8601Sep => {
                expect_bytes(enc, &[(4, b'-'), (7, b'-'), (10, b'T')])?;
                expect_bytes(enc, &[(13, b':'), (16, b':'), (19, b'Z')])?;
                Timestamp {
                    year: parse_decimal(&enc[0..4])? as u16,
                    month: parse_decimal(&enc[5..7])? as u8,
                    day: parse_decimal(&enc[8..10])? as u8,
                    hour: parse_decimal(&enc[11..13])? as u8,
                    minute: parse_decimal(&enc[14..16])? as u8,
                    second: parse_decimal(&enc[17..19])? as u8,
                }
            }
            DateFormat::Rfc5280Utc => {
                expect_bytes(enc, &[(12, b'Z')])?;
                let yy = parse_decimal(&enc[0..2])? as u16;
                Timestamp {
                    year: if yy < 50 { 2000 + yy } else { 1900 + yy },
                    month: parse_decimal(&enc[2..4])? as u8,
                    day: parse_decimal(&enc[4..6])? as u8,
                    hour: parse_decimal(&enc[6..8])? as u8,
                    minute: parse_decimal(&enc[8..10])? as u8,
                    second: parse_decimal(&enc[10..12])? as u8,
                }
            }
            DateFormat::Rfc5280Gen => {
                expect_bytes(enc, &[(14, b'Z')])?;
                Timestamp {
                    year: parse_decimal(&enc[0..4])? as u16,
                    month: parse_decimal(&enc[4..6])? as u8,
                    day: parse_decimal(&enc[6..8])? as u8,
                    hour: parse_decimal(&enc[8..10])? as u8,
                    minute: parse_decimal(&enc[10..12])? as u8,
                    second: parse_decimal(&enc[12..14])? as u8,
                }
            }
            DateFormat::PosixU32Be => {
                let raw = enc.try_into().map_err(|_| SeError::DATE_BAD_PARAM)?;
                Self::from_posix(u32::from_be_bytes(raw))
            }
            DateFormat::PosixU32Le => {
                let raw = enc.try_into().map_err(|_| SeError::DATE_BAD_PARAM)?;
                Self::from_posix(u32::from_le_bytes(raw))
            }
        };
        ts.check_fields()?;
        Ok(ts)
    }

    fn check_fields(&self) -> SeResult<()> {
        if self.year > 9999
            || !(1..=12).contains(&self.month)
            || !(1..=31).contains(&self.day)
            || self.hour > 23
            || self.minute > 59
            || self.second > 59
        {
            return Err(SeError::DATE_INVALID);
        }
        Ok(())
    }

    /// Seconds since the POSIX epoch.
    ///
    /// The final representable second (`u32::MAX`) is reserved as the
    /// "never expires" marker and is rejected here.
    fn to_posix(&self) -> SeResult<u32> {
        if self.year < 1970 {
            return Err(SeError::DATE_INVALID);
        }
        let days = days_from_epoch(self.year, self.month, self.day);
        let secs = days * 86400
            + self.hour as u64 * 3600
            + self.minute as u64 * 60
            + self.second as u64;
        if secs >= u32::MAX as u64 {
            return Err(SeError::DATE_INVALID);
        }
        Ok(secs as u32)
    }

    fn from_posix(secs: u32) -> Self {
        let days = secs / 86400;
        let rem = secs % 86400;
        let (year, month, day) = civil_from_epoch_days(days);
        Timestamp {
            year,
            month,
            day,
            hour: (rem / 3600) as u8,
            minute: (rem / 60 % 60) as u8,
            second: (rem % 60) as u8,
        }
    }
}

fn is_leap_year(year: u16) -> bool {
    year % 400 == 0 || (year % 4 == 0 && year % 100 != 0)
}

const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn days_in_month(year: u16, month: u8) -> u8 {
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS_IN_MONTH[month as usize - 1]
    }
}

/// Whole days between 1970-01-01 and the given civil date.
fn days_from_epoch(year: u16, month: u8, day: u8) -> u64 {
    let mut days: u64 = 0;
    for y in 1970..year {
        days += if is_leap_year(y) { 366 } else { 365 };
    }
    for m in 1..month {
        days += days_in_month(year, m) as u64;
    }
    days + day as u64 - 1
}

fn civil_from_epoch_days(mut days: u32) -> (u16, u8, u8) {
    let mut year: u16 = 1970;
    loop {
        let in_year = if is_leap_year(year) { 366 } else { 365 };
        if days < in_year {
            break;
        }
        days -= in_year;
        year += 1;
    }
    let mut month: u8 = 1;
    loop {
        let in_month = days_in_month(year, month) as u32;
        if days < in_month {
            break;
        }
        days -= in_month;
        month += 1;
    }
    (year, month, days as u8 + 1)
}

/// Fixed-width decimal parse. Every byte must be a digit.
fn parse_decimal(enc: &[u8]) -> SeResult<u32> {
    let mut value: u32 = 0;
    for &b in enc {
        if !b.is_ascii_digit() {
            return Err(SeError::DATE_DECODING_ERROR);
        }
        value = value * 10 + (b - b'0') as u32;
    }
    Ok(value)
}

fn write_decimal(buf: &mut [u8], mut value: u32) {
    for slot in buf.iter_mut().rev() {
        *slot = b'0' + (value % 10) as u8;
        value /= 10;
    }
}

fn expect_bytes(enc: &[u8], expected: &[(usize, u8)]) -> SeResult<()> {
    for &(index, byte) in expected {
        if enc[index] != byte {
            return Err(SeError::DATE_DECODING_ERROR);
        }
    }
    Ok(())
}
