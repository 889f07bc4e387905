//! Stored DNS records and validation of submitted ones.

use hickory_proto::rr::RecordType;
use serde::{Deserialize, Serialize};

use crate::config::fqdn;
use crate::error::ValidationError;

/// Marker for the zone apex in a relative name.
pub const APEX: &str = "@";

/// One stored resource record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Name relative to `zone`; `@` is the apex.
    pub name: String,
    /// Fully-qualified zone name, trailing-dot terminated.
    pub zone: String,
    /// Numeric record type code.
    #[serde(rename = "type")]
    pub rtype: u16,
    /// Type-dependent payload (address, hostname, text).
    pub value: String,
    /// Preference for MX, string-encoded.
    #[serde(default)]
    pub priority: String,
    /// TTL in seconds.
    pub ttl: u32,
    /// Registrant identity.
    #[serde(default)]
    pub user: String,
}

impl DnsRecord {
    /// Record type as a hickory `RecordType`.
    pub fn record_type(&self) -> RecordType {
        RecordType::from(self.rtype)
    }

    /// Owner name: `name.zone`, or bare `zone` at the apex.
    pub fn full_name(&self) -> String {
        full_name(&self.name, &self.zone)
    }
}

/// Join a relative name and its zone.
pub fn full_name(name: &str, zone: &str) -> String {
    if name == APEX {
        zone.to_string()
    } else if zone == "." {
        format!("{}.", name)
    } else {
        format!("{}.{}", name, zone)
    }
}

fn requires_value(rtype: RecordType) -> bool {
    matches!(
        rtype,
        RecordType::A
            | RecordType::AAAA
            | RecordType::CNAME
            | RecordType::NS
            | RecordType::PTR
            | RecordType::TXT
            | RecordType::MX
    )
}

fn requires_priority(rtype: RecordType) -> bool {
    rtype == RecordType::MX
}

fn requires_trailing_period(rtype: RecordType) -> bool {
    matches!(
        rtype,
        RecordType::CNAME | RecordType::NS | RecordType::PTR | RecordType::MX
    )
}

/// A record as submitted to the registration endpoint, before validation.
///
/// Numeric fields arrive as text so that parse failures can be reported per
/// field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordSubmission {
    /// Registrant identity.
    #[serde(default)]
    pub user: String,
    /// Relative name.
    #[serde(default)]
    pub name: String,
    /// Zone the record belongs to.
    #[serde(default)]
    pub zone: String,
    /// TTL in seconds.
    #[serde(default)]
    pub ttl: String,
    /// Numeric record type code.
    #[serde(default, rename = "type")]
    pub rtype: String,
    /// Payload.
    #[serde(default)]
    pub value: String,
    /// MX preference.
    #[serde(default)]
    pub priority: String,
}

impl RecordSubmission {
    /// Check the submission and turn it into a storable record.
    pub fn validate(self) -> Result<DnsRecord, ValidationError> {
        for (field, value) in [("user", &self.user), ("name", &self.name), ("zone", &self.zone)] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }

        let ttl = parse_nonzero::<u32>("ttl", &self.ttl)?;
        let rtype = parse_nonzero::<u16>("type", &self.rtype)?;
        let record_type = RecordType::from(rtype);

        if requires_value(record_type) && self.value.is_empty() {
            return Err(ValidationError::MissingField("value"));
        }
        if requires_priority(record_type) && self.priority.is_empty() {
            return Err(ValidationError::MissingField("priority"));
        }
        if requires_trailing_period(record_type) && !self.value.ends_with('.') {
            return Err(ValidationError::MissingTrailingPeriod);
        }

        Ok(DnsRecord {
            name: self.name.trim().to_string(),
            zone: fqdn(self.zone.trim()),
            rtype,
            value: self.value,
            priority: self.priority,
            ttl,
            user: self.user,
        })
    }
}

fn parse_nonzero<T>(field: &'static str, raw: &str) -> Result<T, ValidationError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|_| ValidationError::InvalidNumber {
            field,
            value: raw.to_string(),
        })?;
    if value == T::default() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value)
}
