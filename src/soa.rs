//! SOA record synthesis.
//!
//! The stored SOA row only contributes its TTL; nameserver, mailbox and
//! timers come from configuration and the serial is supplied by the caller.

use hickory_proto::rr::rdata::SOA;
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::config::SoaConfig;
use crate::error::StoreError;
use crate::store::{RecordStore, TypeFilter};
use crate::zone::ZoneMatch;

/// Serial for a freshly synthesized SOA: the current Unix time.
pub fn current_serial() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or_default()
}

/// Builds SOA records for the zones in a `DnsConfig`.
#[derive(Debug, Clone, Copy)]
pub struct SoaSynthesizer<'a> {
    config: &'a SoaConfig,
}

impl<'a> SoaSynthesizer<'a> {
    /// Synthesizer using the given zone policy.
    pub fn new(config: &'a SoaConfig) -> Self {
        Self { config }
    }

    /// SOA for `target` carrying `serial`.
    ///
    /// At most one stored SOA row is consulted: the first one at the name.
    /// Without a stored row the header TTL is 0.
    pub async fn synthesize(
        &self,
        store: &dyn RecordStore,
        target: &ZoneMatch,
        serial: u32,
    ) -> Result<Record, StoreError> {
        let stored = store
            .find_all(&target.relative, &target.zone, TypeFilter::Exactly(RecordType::SOA))
            .await?
            .into_iter()
            .next();
        let ttl = stored.as_ref().map(|r| r.ttl).unwrap_or(0);

        debug!(
            name = %target.relative,
            zone = %target.zone,
            serial,
            ttl,
            stored = stored.is_some(),
            "synthesizing SOA"
        );

        Ok(self.build(target, ttl, serial))
    }

    fn build(&self, target: &ZoneMatch, ttl: u32, serial: u32) -> Record {
        let soa = SOA::new(
            Name::from_ascii(&self.config.nameserver).unwrap_or_else(|_| Name::root()),
            Name::from_ascii(&self.config.admin_email).unwrap_or_else(|_| Name::root()),
            serial,
            self.config.refresh as i32,
            self.config.retry as i32,
            self.config.expire as i32,
            self.config.minimum,
        );

        let owner = Name::from_ascii(target.full_name()).unwrap_or_else(|_| Name::root());
        let mut record = Record::from_rdata(owner, ttl, RData::SOA(soa));
        record.set_dns_class(DNSClass::IN);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DnsRecord;
    use crate::store::MemoryRecordStore;
    use crate::zone::match_zone;

    fn soa_row(name: &str, ttl: u32) -> DnsRecord {
        DnsRecord {
            name: name.to_string(),
            zone: "valid.zone.".to_string(),
            rtype: RecordType::SOA.into(),
            value: String::new(),
            priority: String::new(),
            ttl,
            user: "test".to_string(),
        }
    }

    fn soa_data(record: &Record) -> &SOA {
        match record.data() {
            RData::SOA(soa) => soa,
            other => panic!("expected SOA, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_synthesize_uses_policy_and_stored_ttl() {
        let store = MemoryRecordStore::with_records([soa_row("@", 3600)]);
        let config = SoaConfig {
            nameserver: "ns1.valid.zone.".into(),
            admin_email: "hostmaster.valid.zone.".into(),
            ..SoaConfig::default()
        };
        let target = match_zone("valid.zone.", &["valid.zone."][..]).unwrap();

        let record = SoaSynthesizer::new(&config)
            .synthesize(&store, &target, 1234)
            .await
            .unwrap();

        assert_eq!(record.name(), &Name::from_ascii("valid.zone.").unwrap());
        assert_eq!(record.record_type(), RecordType::SOA);
        assert_eq!(record.ttl(), 3600);

        let soa = soa_data(&record);
        assert_eq!(soa.mname(), &Name::from_ascii("ns1.valid.zone.").unwrap());
        assert_eq!(soa.rname(), &Name::from_ascii("hostmaster.valid.zone.").unwrap());
        assert_eq!(soa.serial(), 1234);
        assert_eq!(soa.refresh(), 86400);
        assert_eq!(soa.retry(), 3600);
        assert_eq!(soa.expire(), 3600000);
        assert_eq!(soa.minimum(), 300);
    }

    #[tokio::test]
    async fn test_missing_soa_row_gives_zero_ttl() {
        let store = MemoryRecordStore::new();
        let config = SoaConfig::default();
        let target = match_zone("test.valid.zone.", &["valid.zone."][..]).unwrap();

        let record = SoaSynthesizer::new(&config)
            .synthesize(&store, &target, 1)
            .await
            .unwrap();

        assert_eq!(record.ttl(), 0);
        assert_eq!(record.name(), &Name::from_ascii("test.valid.zone.").unwrap());
    }

    #[tokio::test]
    async fn test_first_soa_row_wins() {
        let store = MemoryRecordStore::with_records([soa_row("@", 100), soa_row("@", 200)]);
        let config = SoaConfig::default();
        let target = match_zone("valid.zone.", &["valid.zone."][..]).unwrap();

        let record = SoaSynthesizer::new(&config)
            .synthesize(&store, &target, 1)
            .await
            .unwrap();
        assert_eq!(record.ttl(), 100);
    }

    #[test]
    fn test_current_serial_is_unix_time() {
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32;
        let serial = current_serial();
        assert!(serial >= before);
    }
}
