//! In-memory record store.
//!
//! Used by tests and by deployments that load records at startup only.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

use super::{RecordStore, Result, TypeFilter};
use crate::record::DnsRecord;

/// Thread-safe in-memory record store.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Arc<RwLock<Vec<DnsRecord>>>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `records` in the given order.
    pub fn with_records(records: impl IntoIterator<Item = DnsRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records.into_iter().collect())),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

fn at(record: &DnsRecord, name: &str, zone: &str) -> bool {
    record.name.eq_ignore_ascii_case(name) && record.zone.eq_ignore_ascii_case(zone)
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_one(&self, name: &str, zone: &str) -> Result<Option<DnsRecord>> {
        let records = self.records.read();
        Ok(records.iter().find(|r| at(r, name, zone)).cloned())
    }

    async fn find_all(
        &self,
        name: &str,
        zone: &str,
        filter: TypeFilter,
    ) -> Result<Vec<DnsRecord>> {
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|r| at(r, name, zone) && filter.matches(r.rtype))
            .cloned()
            .collect())
    }

    async fn insert(&self, record: &DnsRecord) -> Result<()> {
        debug!(name = %record.name, zone = %record.zone, rtype = record.rtype, "inserting record");
        self.records.write().push(record.clone());
        Ok(())
    }
}
