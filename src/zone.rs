//! Matching query names against the configured root zones.

use crate::config::fqdn;
use crate::error::QueryError;
use crate::record::APEX;

/// A query name resolved to one of the configured zones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneMatch {
    /// The matching zone, lower-cased and fully qualified.
    pub zone: String,
    /// The query name with the zone stripped; `@` at the apex.
    pub relative: String,
}

impl ZoneMatch {
    /// Fully qualified owner name for the relative name.
    pub fn full_name(&self) -> String {
        crate::record::full_name(&self.relative, &self.zone)
    }
}

/// Find the first zone in `zones` containing `qname`.
///
/// Comparison is case-insensitive and on label boundaries, so
/// `invalid.zone.` is not inside `valid.zone.`. Zones are tried in the order
/// given and the first match wins.
pub fn match_zone<S: AsRef<str>>(qname: &str, zones: &[S]) -> Result<ZoneMatch, QueryError> {
    let qname = fqdn(qname).to_ascii_lowercase();

    for zone in zones {
        let zone = fqdn(zone.as_ref()).to_ascii_lowercase();
        if let Some(relative) = relative_name(&qname, &zone) {
            return Ok(ZoneMatch { zone, relative });
        }
    }

    Err(QueryError::UnmanagedZone(qname))
}

fn relative_name(qname: &str, zone: &str) -> Option<String> {
    if qname == zone {
        return Some(APEX.to_string());
    }
    if zone == "." {
        return Some(qname.trim_end_matches('.').to_string());
    }

    let prefix = qname.strip_suffix(zone)?.strip_suffix('.')?;
    if prefix.is_empty() {
        return None;
    }
    Some(prefix.to_string())
}
