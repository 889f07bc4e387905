//! Query dispatch: the single entry point for every DNS request.
//!
//! Resolution order for a question:
//!
//! 1. match the name against the configured root zones
//! 2. check the transfer allow-list (AXFR only)
//! 3. probe the store for any record at the name
//! 4. branch on type: SOA is synthesized, AXFR is assembled, formatter
//!    types are looked up, everything else is NOTIMP
//!
//! Each failure maps to exactly one response code; every response is
//! authoritative and never offers recursion.

use async_trait::async_trait;
use hickory_proto::op::{Header, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, Record, RecordType};
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

use crate::config::DnsConfig;
use crate::error::QueryError;
use crate::formatter::FormatterRegistry;
use crate::metrics::{self, QueryResult, Timer};
use crate::soa::{current_serial, SoaSynthesizer};
use crate::store::{RecordStore, TypeFilter};
use crate::transfer::{self, ZoneTransfer};
use crate::zone::{match_zone, ZoneMatch};

/// The one question of a request, plus what the answer depends on.
#[derive(Debug, Clone)]
pub struct DnsQuery {
    /// Query name as received.
    pub name: Name,
    /// Requested type.
    pub query_type: RecordType,
    /// Requested class. Not checked; every answer is class IN.
    pub query_class: DNSClass,
    /// Request header, echoed into the response.
    pub header: Header,
    /// Requester address, used for the transfer allow-list.
    pub src: SocketAddr,
}

/// Header and answer section of a response.
#[derive(Debug, Clone)]
pub struct DnsResponse {
    /// Response header.
    pub header: Header,
    /// Answer section.
    pub answers: Vec<Record>,
}

impl DnsResponse {
    fn answered(request: &Header, answers: Vec<Record>) -> Self {
        Self {
            header: response_header(request, ResponseCode::NoError),
            answers,
        }
    }

    fn error(request: &Header, code: ResponseCode) -> Self {
        Self {
            header: response_header(request, code),
            answers: Vec::new(),
        }
    }

    /// Response code carried in the header.
    pub fn response_code(&self) -> ResponseCode {
        self.header.response_code()
    }
}

/// Authoritative response header with RA off.
pub fn response_header(request: &Header, code: ResponseCode) -> Header {
    let mut header = Header::response_from_request(request);
    header.set_authoritative(true);
    header.set_recursion_available(false);
    header.set_response_code(code);
    header
}

/// Answers queries for the configured root zones from a record store.
#[derive(Clone)]
pub struct QueryDispatcher {
    config: Arc<DnsConfig>,
    store: Arc<dyn RecordStore>,
    formatters: Arc<FormatterRegistry>,
}

impl QueryDispatcher {
    /// Dispatcher with the default formatter set.
    pub fn new(config: DnsConfig, store: Arc<dyn RecordStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            formatters: Arc::new(FormatterRegistry::default()),
        }
    }

    /// Replace the formatter registry.
    pub fn with_formatters(mut self, formatters: FormatterRegistry) -> Self {
        self.formatters = Arc::new(formatters);
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &DnsConfig {
        &self.config
    }

    /// Answer one question. Never fails: errors become response codes.
    pub async fn handle(&self, query: &DnsQuery) -> DnsResponse {
        let timer = Timer::start();

        let response = match self.resolve(query).await {
            Ok(response) => response,
            Err(e) => {
                match &e {
                    QueryError::StoreFailure(_) => {
                        error!(name = %query.name, rtype = %query.query_type, error = %e, "query failed")
                    }
                    QueryError::Unauthorized(_) => {}
                    _ => debug!(name = %query.name, rtype = %query.query_type, reason = %e, "query not answered"),
                }
                DnsResponse::error(&query.header, e.response_code())
            }
        };

        metrics::record_query(
            query.query_type,
            QueryResult::from(response.response_code()),
            timer.elapsed(),
        );
        response
    }

    async fn resolve(&self, query: &DnsQuery) -> Result<DnsResponse, QueryError> {
        let target = match_zone(&query.name.to_ascii(), self.config.root_zones.as_slice())?;
        trace!(
            name = %query.name,
            zone = %target.zone,
            relative = %target.relative,
            rtype = %query.query_type,
            "matched zone"
        );

        if query.query_type == RecordType::AXFR {
            transfer::authorize(&query.src, self.config.axfr_allow.as_slice())?;
        }

        self.probe(&target).await?;

        match query.query_type {
            RecordType::SOA => {
                let soa = SoaSynthesizer::new(&self.config.soa)
                    .synthesize(self.store.as_ref(), &target, current_serial())
                    .await?;
                Ok(DnsResponse::answered(&query.header, vec![soa]))
            }
            RecordType::AXFR => {
                let records = ZoneTransfer::new(
                    self.store.as_ref(),
                    &self.formatters,
                    SoaSynthesizer::new(&self.config.soa),
                )
                .records(&target, current_serial())
                .await?;
                Ok(DnsResponse {
                    header: transfer::transfer_header(&query.header),
                    answers: records,
                })
            }
            rtype if self.formatters.supports(rtype) => {
                let stored = self
                    .store
                    .find_all(&target.relative, &target.zone, TypeFilter::Exactly(rtype))
                    .await?;
                let answers = self.formatters.format_all(&stored);
                debug!(
                    name = %query.name,
                    %rtype,
                    stored = stored.len(),
                    answers = answers.len(),
                    "answered from store"
                );
                Ok(DnsResponse::answered(&query.header, answers))
            }
            rtype => Err(QueryError::UnsupportedType(rtype)),
        }
    }

    /// NXDOMAIN unless at least one record of any type exists at the name.
    async fn probe(&self, target: &ZoneMatch) -> Result<(), QueryError> {
        match self.store.find_one(&target.relative, &target.zone).await? {
            Some(_) => Ok(()),
            None => Err(QueryError::NotFound {
                name: target.relative.clone(),
                zone: target.zone.clone(),
            }),
        }
    }
}

async fn send<R: ResponseHandler>(
    request: &Request,
    mut response_handle: R,
    header: Header,
    answers: &[Record],
) -> ResponseInfo {
    let message = MessageResponseBuilder::from_message_request(request).build(
        header,
        answers.iter(),
        std::iter::empty(),
        std::iter::empty(),
        std::iter::empty(),
    );
    match response_handle.send_response(message).await {
        Ok(info) => info,
        Err(e) => {
            error!(src = %request.src(), error = %e, "failed to send response");
            ResponseInfo::from(header)
        }
    }
}

async fn reject_malformed<R: ResponseHandler>(request: &Request, response_handle: R) -> ResponseInfo {
    metrics::record_query(RecordType::Unknown(0), QueryResult::FormErr, Default::default());
    let header = response_header(request.header(), ResponseCode::FormErr);
    send(request, response_handle, header, &[]).await
}

#[async_trait]
impl RequestHandler for QueryDispatcher {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> ResponseInfo {
        match request.queries().len() {
            0 => {
                debug!(src = %request.src(), "dropping request without a question");
                return ResponseInfo::from(response_header(request.header(), ResponseCode::FormErr));
            }
            1 => {}
            count => {
                warn!(src = %request.src(), count, "rejecting request with multiple questions");
                return reject_malformed(request, response_handle).await;
            }
        }

        let info = match request.request_info() {
            Ok(info) => info,
            Err(e) => {
                warn!(src = %request.src(), error = %e, "rejecting malformed request");
                return reject_malformed(request, response_handle).await;
            }
        };

        let query = DnsQuery {
            name: Name::from(info.query.name().clone()),
            query_type: info.query.query_type(),
            query_class: info.query.query_class(),
            header: *info.header,
            src: info.src,
        };

        let response = self.handle(&query).await;
        send(request, response_handle, response.header, &response.answers).await
    }
}
