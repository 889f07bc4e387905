//! Conversion of stored records into protocol resource records.
//!
//! Each supported type has one formatter registered against its
//! `RecordType`. Supporting a new type means registering a function here,
//! the dispatcher only asks whether a type is supported.

use hickory_proto::rr::rdata::{A, AAAA, CNAME, MX, NS, PTR, TXT};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::{trace, warn};

use crate::error::FormatError;
use crate::metrics;
use crate::record::DnsRecord;

/// Builds a resource record from a stored record of one type.
pub type Formatter = fn(&DnsRecord) -> Result<Record, FormatError>;

/// Type → formatter table.
#[derive(Clone)]
pub struct FormatterRegistry {
    formatters: HashMap<RecordType, Formatter>,
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<u16> = self.formatters.keys().map(|t| u16::from(*t)).collect();
        types.sort_unstable();
        f.debug_struct("FormatterRegistry").field("types", &types).finish()
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(RecordType::A, format_a);
        registry.register(RecordType::AAAA, format_aaaa);
        registry.register(RecordType::MX, format_mx);
        registry.register(RecordType::CNAME, format_cname);
        registry.register(RecordType::NS, format_ns);
        registry.register(RecordType::PTR, format_ptr);
        registry.register(RecordType::TXT, format_txt);
        registry
    }
}

impl FormatterRegistry {
    /// A registry with no formatters.
    pub fn empty() -> Self {
        Self {
            formatters: HashMap::new(),
        }
    }

    /// Register (or replace) the formatter for `rtype`.
    pub fn register(&mut self, rtype: RecordType, formatter: Formatter) -> &mut Self {
        self.formatters.insert(rtype, formatter);
        self
    }

    /// Whether `rtype` can be answered from stored records.
    pub fn supports(&self, rtype: RecordType) -> bool {
        self.formatters.contains_key(&rtype)
    }

    /// Format one record.
    ///
    /// Returns `None` for unregistered types and for records whose payload
    /// does not parse; the latter are logged and the rest of the response is
    /// unaffected.
    pub fn format(&self, record: &DnsRecord) -> Option<Record> {
        let rtype = record.record_type();
        let formatter = self.formatters.get(&rtype)?;

        trace!(name = %record.name, zone = %record.zone, %rtype, "formatting record");
        match formatter(record) {
            Ok(rr) => Some(rr),
            Err(e) => {
                warn!(
                    name = %record.name,
                    zone = %record.zone,
                    %rtype,
                    error = %e,
                    "dropping malformed record"
                );
                metrics::record_malformed_record(rtype);
                None
            }
        }
    }

    /// Format every record, skipping unsupported and malformed ones.
    pub fn format_all<'a>(&self, records: impl IntoIterator<Item = &'a DnsRecord>) -> Vec<Record> {
        records.into_iter().filter_map(|r| self.format(r)).collect()
    }
}

/// Header for `record`: owner name, class IN, stored TTL.
fn header(record: &DnsRecord, rdata: RData) -> Result<Record, FormatError> {
    let owner = parse_name(&record.full_name())?;
    let mut rr = Record::from_rdata(owner, record.ttl, rdata);
    rr.set_dns_class(DNSClass::IN);
    Ok(rr)
}

fn parse_name(value: &str) -> Result<Name, FormatError> {
    Name::from_ascii(value).map_err(|source| FormatError::InvalidName {
        value: value.to_string(),
        source,
    })
}

fn format_a(record: &DnsRecord) -> Result<Record, FormatError> {
    let ip: Ipv4Addr = record
        .value
        .trim()
        .parse()
        .map_err(|_| FormatError::InvalidAddress {
            rtype: RecordType::A,
            value: record.value.clone(),
        })?;
    header(record, RData::A(A(ip)))
}

fn format_aaaa(record: &DnsRecord) -> Result<Record, FormatError> {
    let ip: Ipv6Addr = record
        .value
        .trim()
        .parse()
        .map_err(|_| FormatError::InvalidAddress {
            rtype: RecordType::AAAA,
            value: record.value.clone(),
        })?;
    header(record, RData::AAAA(AAAA(ip)))
}

fn format_mx(record: &DnsRecord) -> Result<Record, FormatError> {
    let preference = match record.priority.trim().parse::<u16>() {
        Ok(p) => p,
        Err(e) => {
            warn!(
                name = %record.name,
                zone = %record.zone,
                priority = %record.priority,
                error = %e,
                "invalid MX priority, using 0"
            );
            metrics::record_malformed_record(RecordType::MX);
            0
        }
    };
    let exchange = parse_name(&record.value)?;
    header(record, RData::MX(MX::new(preference, exchange)))
}

fn format_cname(record: &DnsRecord) -> Result<Record, FormatError> {
    header(record, RData::CNAME(CNAME(parse_name(&record.value)?)))
}

fn format_ns(record: &DnsRecord) -> Result<Record, FormatError> {
    header(record, RData::NS(NS(parse_name(&record.value)?)))
}

fn format_ptr(record: &DnsRecord) -> Result<Record, FormatError> {
    header(record, RData::PTR(PTR(parse_name(&record.value)?)))
}

fn format_txt(record: &DnsRecord) -> Result<Record, FormatError> {
    header(record, RData::TXT(TXT::new(vec![record.value.clone()])))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(rtype: RecordType, value: &str, priority: &str) -> DnsRecord {
        DnsRecord {
            name: "test".to_string(),
            zone: "valid.zone.".to_string(),
            rtype: rtype.into(),
            value: value.to_string(),
            priority: priority.to_string(),
            ttl: 50,
            user: "test".to_string(),
        }
    }

    #[test]
    fn test_format_a() {
        let registry = FormatterRegistry::default();
        let rr = registry
            .format(&make_record(RecordType::A, "1.2.3.4", ""))
            .unwrap();

        assert_eq!(rr.name(), &Name::from_ascii("test.valid.zone.").unwrap());
        assert_eq!(rr.record_type(), RecordType::A);
        assert_eq!(rr.dns_class(), DNSClass::IN);
        assert_eq!(rr.ttl(), 50);
        assert_eq!(rr.data(), &RData::A(A::new(1, 2, 3, 4)));
    }

    #[test]
    fn test_format_apex_owner() {
        let mut record = make_record(RecordType::AAAA, "2606:700:e:550::1", "");
        record.name = "@".to_string();
        let rr = FormatterRegistry::default().format(&record).unwrap();

        assert_eq!(rr.name(), &Name::from_ascii("valid.zone.").unwrap());
        assert_eq!(
            rr.data(),
            &RData::AAAA(AAAA("2606:700:e:550::1".parse().unwrap()))
        );
    }

    #[test]
    fn test_wrong_address_family_is_dropped() {
        let registry = FormatterRegistry::default();
        assert!(registry
            .format(&make_record(RecordType::A, "::1", ""))
            .is_none());
        assert!(registry
            .format(&make_record(RecordType::AAAA, "1.2.3.4", ""))
            .is_none());
        assert!(registry
            .format(&make_record(RecordType::A, "not-an-ip", ""))
            .is_none());
    }

    #[test]
    fn test_format_mx() {
        let rr = FormatterRegistry::default()
            .format(&make_record(RecordType::MX, "mail.valid.zone.", "10"))
            .unwrap();
        match rr.data() {
            RData::MX(mx) => {
                assert_eq!(mx.preference(), 10);
                assert_eq!(mx.exchange(), &Name::from_ascii("mail.valid.zone.").unwrap());
            }
            other => panic!("expected MX, got {other:?}"),
        }
    }

    #[test]
    fn test_mx_bad_priority_defaults_to_zero() {
        for priority in ["", "high", "70000"] {
            let rr = FormatterRegistry::default()
                .format(&make_record(RecordType::MX, "mail.valid.zone.", priority))
                .unwrap();
            match rr.data() {
                RData::MX(mx) => assert_eq!(mx.preference(), 0),
                other => panic!("expected MX, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_format_cname_and_txt() {
        let registry = FormatterRegistry::default();

        let cname = registry
            .format(&make_record(RecordType::CNAME, "target.valid.zone.", ""))
            .unwrap();
        assert_eq!(
            cname.data(),
            &RData::CNAME(CNAME(Name::from_ascii("target.valid.zone.").unwrap()))
        );

        let txt = registry
            .format(&make_record(RecordType::TXT, "hello world", ""))
            .unwrap();
        assert_eq!(
            txt.data(),
            &RData::TXT(TXT::new(vec!["hello world".to_string()]))
        );
    }

    #[test]
    fn test_unregistered_type() {
        let registry = FormatterRegistry::default();
        assert!(!registry.supports(RecordType::SRV));
        assert!(registry
            .format(&make_record(RecordType::SRV, "x", ""))
            .is_none());
    }

    #[test]
    fn test_register_custom_formatter() {
        let mut registry = FormatterRegistry::empty();
        assert!(!registry.supports(RecordType::A));
        registry.register(RecordType::A, format_a);
        assert!(registry.supports(RecordType::A));
    }

    #[test]
    fn test_format_all_skips_bad_records() {
        let records = vec![
            make_record(RecordType::A, "1.2.3.4", ""),
            make_record(RecordType::A, "garbage", ""),
            make_record(RecordType::SRV, "x", ""),
            make_record(RecordType::A, "5.6.7.8", ""),
        ];
        let out = FormatterRegistry::default().format_all(&records);
        assert_eq!(out.len(), 2);
    }
}
