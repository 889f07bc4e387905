//! Record store interface and backends.
//!
//! The query path only reads; `insert` exists for the registration endpoint.
//! Name and zone comparisons are case-insensitive in every backend, and
//! results come back in insertion order so "first row" tie-breaks are stable.

mod memory;
mod sqlite;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use async_trait::async_trait;
use hickory_proto::rr::RecordType;

use crate::error::StoreError;
use crate::record::DnsRecord;

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Which record types a `find_all` call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    /// Every type.
    Any,
    /// Only this type.
    Exactly(RecordType),
    /// Every type except this one.
    Except(RecordType),
}

impl TypeFilter {
    /// Whether a stored type code passes the filter.
    pub fn matches(&self, rtype: u16) -> bool {
        match self {
            TypeFilter::Any => true,
            TypeFilter::Exactly(t) => u16::from(*t) == rtype,
            TypeFilter::Except(t) => u16::from(*t) != rtype,
        }
    }
}

/// Storage backing the authoritative data.
///
/// Implementations must be safe to call concurrently; the dispatcher holds
/// no lock across these calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First record of any type at `name` in `zone`.
    async fn find_one(&self, name: &str, zone: &str) -> Result<Option<DnsRecord>>;

    /// All records at `name` in `zone` passing `filter`.
    async fn find_all(&self, name: &str, zone: &str, filter: TypeFilter)
        -> Result<Vec<DnsRecord>>;

    /// Store a new record.
    async fn insert(&self, record: &DnsRecord) -> Result<()>;
}
