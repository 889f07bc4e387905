//! Full zone transfers (AXFR, RFC 5936).
//!
//! A transfer is `SOA, records..., SOA` with one serial shared by both
//! envelope records. Requesters must match the configured allow-list.

use hickory_proto::op::{Header, ResponseCode};
use hickory_proto::rr::{Record, RecordType};
use std::net::{IpAddr, SocketAddr};
use tracing::{debug, warn};

use crate::error::{QueryError, StoreError};
use crate::formatter::FormatterRegistry;
use crate::metrics;
use crate::soa::SoaSynthesizer;
use crate::store::{RecordStore, TypeFilter};
use crate::zone::ZoneMatch;

/// Textual forms of `src` that allow-list prefixes are compared against.
///
/// IPv4-mapped IPv6 sources are also offered in their IPv4 form.
fn address_forms(src: &SocketAddr) -> Vec<String> {
    let mut forms = vec![src.ip().to_string(), src.to_string()];
    if let IpAddr::V6(v6) = src.ip() {
        if let Some(v4) = v6.to_ipv4_mapped() {
            forms.push(v4.to_string());
        }
    }
    forms
}

/// Whether `src` matches any prefix in `allow_list`. Blank entries match
/// nothing.
pub fn is_allowed<S: AsRef<str>>(src: &SocketAddr, allow_list: &[S]) -> bool {
    let forms = address_forms(src);
    allow_list
        .iter()
        .map(|prefix| prefix.as_ref().trim())
        .filter(|prefix| !prefix.is_empty())
        .any(|prefix| forms.iter().any(|form| form.starts_with(prefix)))
}

/// Reject transfers from addresses outside the allow-list.
pub fn authorize<S: AsRef<str>>(src: &SocketAddr, allow_list: &[S]) -> Result<(), QueryError> {
    let allowed = is_allowed(src, allow_list);
    metrics::record_axfr(allowed);
    if allowed {
        Ok(())
    } else {
        warn!(%src, "AXFR request denied");
        Err(QueryError::Unauthorized(src.to_string()))
    }
}

/// Response header for an allowed transfer.
///
/// AD and CD are cleared, RD is echoed from the request and RA is off.
pub fn transfer_header(request: &Header) -> Header {
    let mut header = Header::response_from_request(request);
    header.set_authoritative(true);
    header.set_authentic_data(false);
    header.set_checking_disabled(false);
    header.set_recursion_desired(request.recursion_desired());
    header.set_recursion_available(false);
    header.set_response_code(ResponseCode::NoError);
    header
}

/// Assembles the answer section of a zone transfer.
pub struct ZoneTransfer<'a> {
    store: &'a dyn RecordStore,
    formatters: &'a FormatterRegistry,
    soa: SoaSynthesizer<'a>,
}

impl<'a> ZoneTransfer<'a> {
    /// Transfer reading from `store`.
    pub fn new(
        store: &'a dyn RecordStore,
        formatters: &'a FormatterRegistry,
        soa: SoaSynthesizer<'a>,
    ) -> Self {
        Self {
            store,
            formatters,
            soa,
        }
    }

    /// `SOA, non-SOA records at the name, SOA`, both SOAs carrying `serial`.
    ///
    /// Records of types without a formatter are skipped.
    pub async fn records(&self, target: &ZoneMatch, serial: u32) -> Result<Vec<Record>, StoreError> {
        let opening = self.soa.synthesize(self.store, target, serial).await?;

        let stored = self
            .store
            .find_all(&target.relative, &target.zone, TypeFilter::Except(RecordType::SOA))
            .await?;
        let body = self.formatters.format_all(&stored);

        let closing = self.soa.synthesize(self.store, target, serial).await?;

        let mut records = Vec::with_capacity(body.len() + 2);
        records.push(opening);
        records.extend(body);
        records.push(closing);

        debug!(
            name = %target.relative,
            zone = %target.zone,
            serial,
            stored = stored.len(),
            sent = records.len(),
            "zone transfer assembled"
        );
        metrics::record_axfr_records(records.len());
        Ok(records)
    }
}
