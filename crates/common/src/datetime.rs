//! DateTime utilities.

use chrono::{DateTime, SecondsFormat, Utc};

/// Get the current UTC time.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Format a DateTime as an RFC 3339 string with millisecond precision.
///
/// # Examples
///
/// ```
/// use activity_interceptor_common::datetime::format_datetime;
/// use chrono::{TimeZone, Utc};
///
/// let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap();
/// assert_eq!(format_datetime(&dt), "2024-03-01T12:30:45.000Z");
/// ```
pub fn format_datetime(datetime: &DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}
