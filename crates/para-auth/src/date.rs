//! Timestamp handling in the AWS basic ISO 8601 format.
//!
//! Signing uses two renderings of the same UTC instant: the full timestamp
//! (`20240101T000000Z`) sent as `X-Amz-Date`, and the date stamp (`20240101`)
//! used in the credential scope.

use chrono::{DateTime, NaiveDateTime, Utc};

const AWS_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const DATE_STAMP_FORMAT: &str = "%Y%m%d";

/// Format an instant as `yyyyMMdd'T'HHmmss'Z'` in UTC.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use para_auth::date::format_aws_date;
///
/// let instant = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// assert_eq!(format_aws_date(instant), "20240101T000000Z");
/// ```
#[must_use]
pub fn format_aws_date(instant: DateTime<Utc>) -> String {
    instant.format(AWS_DATE_FORMAT).to_string()
}

/// Format the date part of an instant as `yyyyMMdd` in UTC.
#[must_use]
pub fn format_date_stamp(instant: DateTime<Utc>) -> String {
    instant.format(DATE_STAMP_FORMAT).to_string()
}

/// Parse a timestamp in the AWS basic format.
///
/// Only the exact 16-character form `yyyyMMdd'T'HHmmss'Z'` is accepted; any
/// other shape (extended ISO 8601, missing `Z`, short fields) yields `None`.
///
/// # Examples
///
/// ```
/// use para_auth::date::parse_aws_date;
///
/// assert!(parse_aws_date("20240101T000000Z").is_some());
/// assert!(parse_aws_date("2024-01-01T00:00:00Z").is_none());
/// ```
#[must_use]
pub fn parse_aws_date(value: &str) -> Option<DateTime<Utc>> {
    let bytes = value.as_bytes();
    if bytes.len() != 16 || bytes[8] != b'T' || bytes[15] != b'Z' {
        return None;
    }
    let digits_ok = bytes[..8]
        .iter()
        .chain(&bytes[9..15])
        .all(u8::is_ascii_digit);
    if !digits_ok {
        return None;
    }

    NaiveDateTime::parse_from_str(value, AWS_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
