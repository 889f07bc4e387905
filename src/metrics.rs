//! Metrics instrumentation for registry-dns.
//!
//! All metrics are prefixed with `registry_dns.`

use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Record a DNS query.
pub fn record_query(record_type: RecordType, result: QueryResult, duration: Duration) {
    counter!(
        "registry_dns.query.count",
        "type" => record_type.to_string(),
        "result" => result.as_str()
    )
    .increment(1);
    histogram!("registry_dns.query.duration.seconds", "type" => record_type.to_string())
        .record(duration.as_secs_f64());
}

/// Query result type for metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryResult {
    /// Answered (possibly with an empty answer section).
    Success,
    /// Name outside our zones or nothing stored at it.
    NxDomain,
    /// Record store failed.
    ServFail,
    /// Zone transfer refused.
    Refused,
    /// Query type has no handling path.
    NotImp,
    /// Request had more than one question.
    FormErr,
}

impl QueryResult {
    fn as_str(self) -> &'static str {
        match self {
            QueryResult::Success => "success",
            QueryResult::NxDomain => "nxdomain",
            QueryResult::ServFail => "servfail",
            QueryResult::Refused => "refused",
            QueryResult::NotImp => "notimp",
            QueryResult::FormErr => "formerr",
        }
    }
}

impl From<ResponseCode> for QueryResult {
    fn from(code: ResponseCode) -> Self {
        match code {
            ResponseCode::NoError => QueryResult::Success,
            ResponseCode::NXDomain => QueryResult::NxDomain,
            ResponseCode::Refused => QueryResult::Refused,
            ResponseCode::NotImp => QueryResult::NotImp,
            ResponseCode::FormErr => QueryResult::FormErr,
            _ => QueryResult::ServFail,
        }
    }
}

/// Record a zone transfer attempt.
pub fn record_axfr(allowed: bool) {
    let result = if allowed { "allowed" } else { "refused" };
    counter!("registry_dns.axfr.count", "result" => result).increment(1);
}

/// Record how many records a zone transfer carried, envelope included.
pub fn record_axfr_records(count: usize) {
    histogram!("registry_dns.axfr.records").record(count as f64);
}

/// Record a stored record that failed to format.
pub fn record_malformed_record(record_type: RecordType) {
    counter!("registry_dns.record.malformed.count", "type" => record_type.to_string())
        .increment(1);
}

/// Record a registration attempt.
pub fn record_registration(result: &'static str) {
    counter!("registry_dns.registration.count", "result" => result).increment(1);
}

/// Helper for timing operations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
