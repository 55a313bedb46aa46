//! The per-call activity record handed to reporters.

use activity_interceptor_common::datetime::format_datetime;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tonic::Code;

/// Everything captured about one handled unary call.
///
/// A record is created on entry to the interceptor, completed after the
/// handler returns and dropped once the reporter has seen it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Textual IP of the caller's TCP peer, empty when there is none
    pub caller_address: String,
    pub request_time: DateTime<Utc>,
    /// Never earlier than `request_time`
    pub response_time: DateTime<Utc>,
    /// Propagated verbatim from inbound metadata or freshly generated
    pub correlation_id: String,
    /// Fully-qualified method path, e.g. `/pkg.Service/Method`
    pub route_path: String,
    /// Numeric gRPC status code; `0` when the handler succeeded
    pub status_code: i32,
}

impl ActivityRecord {
    /// The recorded status as a gRPC code.
    pub fn code(&self) -> Code {
        Code::from_i32(self.status_code)
    }

    pub fn is_ok(&self) -> bool {
        self.status_code == Code::Ok as i32
    }

    /// Time the call spent between entry and handler return.
    pub fn latency(&self) -> Duration {
        self.response_time - self.request_time
    }
}

impl fmt::Display for ActivityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "caller_address={} correlation_id={} route_path={} status_code={} status={:?} request_time={} response_time={} latency_ms={}",
            if self.caller_address.is_empty() { "-" } else { self.caller_address.as_str() },
            self.correlation_id,
            self.route_path,
            self.status_code,
            self.code(),
            format_datetime(&self.request_time),
            format_datetime(&self.response_time),
            self.latency().num_milliseconds(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> ActivityRecord {
        let request_time = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        ActivityRecord {
            caller_address: "10.0.0.7".to_string(),
            request_time,
            response_time: request_time + Duration::milliseconds(25),
            correlation_id: "op-1".to_string(),
            route_path: "/inventory.v1.Stock/Reserve".to_string(),
            status_code: Code::NotFound as i32,
        }
    }

    #[test]
    fn test_code_and_latency() {
        let record = sample();
        assert_eq!(record.code(), Code::NotFound);
        assert!(!record.is_ok());
        assert_eq!(record.latency(), Duration::milliseconds(25));
    }

    #[test]
    fn test_display() {
        let line = sample().to_string();
        assert!(line.starts_with("caller_address=10.0.0.7 correlation_id=op-1"));
        assert!(line.contains("route_path=/inventory.v1.Stock/Reserve"));
        assert!(line.contains("status_code=5 status=NotFound"));
        assert!(line.contains("request_time=2024-05-06T07:08:09.000Z"));
        assert!(line.ends_with("latency_ms=25"));
    }

    #[test]
    fn test_display_without_peer() {
        let mut record = sample();
        record.caller_address.clear();
        assert!(record.to_string().starts_with("caller_address=- "));
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["route_path"], "/inventory.v1.Stock/Reserve");
        assert_eq!(value["status_code"], 5);
        assert_eq!(value["request_time"], "2024-05-06T07:08:09Z");
    }
}
