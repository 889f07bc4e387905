//! Shared test infrastructure for dispatcher integration tests.

#![allow(dead_code)]

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::SOA;
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinDecoder, BinEncoder};
use hickory_server::authority::{MessageRequest, MessageResponse};
use hickory_server::proto::rr::Record;
use hickory_server::proto::xfer::Protocol;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};

use registry_dns::config::{DnsConfig, SoaConfig};
use registry_dns::record::DnsRecord;
use registry_dns::store::{MemoryRecordStore, RecordStore};
use registry_dns::QueryDispatcher;

// --- Constants ---

pub const ZONE: &str = "valid.zone.";
pub const TRUSTED_SRC: &str = "127.0.0.1:40000";
pub const UNTRUSTED_SRC: &str = "192.0.2.10:40000";

// --- TestResponseHandler ---

/// Captures the serialized DNS response for inspection in tests.
///
/// The response is serialized via `MessageResponse::destructive_emit()` and
/// stored as raw wire-format bytes, which can then be parsed with
/// `Message::from_vec()`. Nothing is captured when the handler decides not to
/// respond.
#[derive(Clone)]
pub struct TestResponseHandler {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl TestResponseHandler {
    pub fn new() -> Self {
        Self {
            buf: Arc::new(Mutex::new(Vec::with_capacity(512))),
        }
    }

    /// The captured response, if one was sent.
    pub fn message(&self) -> Option<Message> {
        let buf = self.buf.lock().unwrap();
        if buf.is_empty() {
            return None;
        }
        Some(Message::from_vec(&buf).expect("failed to parse captured DNS response"))
    }

    /// The captured response; panics if none was sent.
    pub fn into_message(self) -> Message {
        self.message().expect("no response was captured")
    }
}

#[async_trait]
impl ResponseHandler for TestResponseHandler {
    async fn send_response<'a>(
        &mut self,
        response: MessageResponse<
            '_,
            'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
        >,
    ) -> io::Result<ResponseInfo> {
        let mut buf = self.buf.lock().unwrap();
        buf.clear();
        let mut encoder = BinEncoder::new(&mut *buf);
        encoder.set_max_size(u16::MAX);
        response
            .destructive_emit(&mut encoder)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

// --- Config and store builders ---

pub fn test_dns_config() -> DnsConfig {
    DnsConfig {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        root_zones: vec![ZONE.to_string()],
        axfr_allow: vec!["127.0.0.1".to_string()],
        soa: SoaConfig {
            nameserver: "ns1.valid.zone.".to_string(),
            admin_email: "hostmaster.valid.zone.".to_string(),
            ..SoaConfig::default()
        },
    }
}

pub fn make_record(name: &str, rtype: RecordType, value: &str, ttl: u32) -> DnsRecord {
    DnsRecord {
        name: name.to_string(),
        zone: ZONE.to_string(),
        rtype: rtype.into(),
        value: value.to_string(),
        priority: String::new(),
        ttl,
        user: "test".to_string(),
    }
}

/// Collects records for a memory-backed dispatcher.
pub struct TestStoreBuilder {
    records: Vec<DnsRecord>,
}

impl TestStoreBuilder {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn add(mut self, name: &str, rtype: RecordType, value: &str, ttl: u32) -> Self {
        self.records.push(make_record(name, rtype, value, ttl));
        self
    }

    pub fn add_mx(mut self, name: &str, exchange: &str, priority: &str, ttl: u32) -> Self {
        let mut record = make_record(name, RecordType::MX, exchange, ttl);
        record.priority = priority.to_string();
        self.records.push(record);
        self
    }

    /// The apex SOA row plus the fixture records used across tests.
    pub fn with_fixture_zone() -> Self {
        Self::new()
            .add("@", RecordType::SOA, "", 3600)
            .add("@", RecordType::NS, "ns1.valid.zone.", 3600)
            .add("test", RecordType::A, "1.2.3.4", 50)
            .add("test", RecordType::AAAA, "2606:700:e:550::1", 90)
    }

    pub fn build(self) -> MemoryRecordStore {
        MemoryRecordStore::with_records(self.records)
    }
}

pub fn build_dispatcher(store: impl RecordStore + 'static) -> QueryDispatcher {
    QueryDispatcher::new(test_dns_config(), Arc::new(store))
}

// --- Query/Request construction ---

pub fn make_query(name: &str, record_type: RecordType) -> Query {
    let mut query = Query::new();
    query.set_name(Name::from_ascii(name).unwrap());
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);
    query
}

/// Build wire-format bytes for a message carrying `queries`.
pub fn build_message_bytes(queries: Vec<Query>, id: u16) -> Vec<u8> {
    let mut msg = Message::new();
    msg.set_id(id);
    msg.set_message_type(MessageType::Query);
    msg.set_op_code(OpCode::Query);
    msg.set_recursion_desired(true);
    for query in queries {
        msg.add_query(query);
    }
    msg.to_vec().unwrap()
}

/// Build wire-format bytes for a single-question DNS query.
pub fn build_query_bytes(name: &str, record_type: RecordType, id: u16) -> Vec<u8> {
    build_message_bytes(vec![make_query(name, record_type)], id)
}

/// Parse wire bytes into a MessageRequest.
pub fn parse_message_request(bytes: &[u8]) -> MessageRequest {
    let mut decoder = BinDecoder::new(bytes);
    MessageRequest::read(&mut decoder).expect("failed to parse MessageRequest")
}

/// Run raw request bytes through the dispatcher.
pub async fn execute_bytes(
    dispatcher: &QueryDispatcher,
    bytes: &[u8],
    src: &str,
) -> Option<Message> {
    let request = Request::new(
        parse_message_request(bytes),
        src.parse().unwrap(),
        Protocol::Udp,
    );
    let handler = TestResponseHandler::new();
    dispatcher.handle_request(&request, handler.clone()).await;
    handler.message()
}

/// Execute a query through the dispatcher and return the parsed response.
pub async fn execute_query(
    dispatcher: &QueryDispatcher,
    name: &str,
    record_type: RecordType,
    src: &str,
    id: u16,
) -> Message {
    let bytes = build_query_bytes(name, record_type, id);
    execute_bytes(dispatcher, &bytes, src)
        .await
        .expect("no response was captured")
}

// --- Response helpers ---

pub fn extract_a_ips(msg: &Message) -> Vec<Ipv4Addr> {
    msg.answers()
        .iter()
        .filter_map(|r| match r.data() {
            RData::A(a) => Some(Ipv4Addr::from(*a)),
            _ => None,
        })
        .collect()
}

pub fn extract_aaaa_ips(msg: &Message) -> Vec<Ipv6Addr> {
    msg.answers()
        .iter()
        .filter_map(|r| match r.data() {
            RData::AAAA(aaaa) => Some(Ipv6Addr::from(*aaaa)),
            _ => None,
        })
        .collect()
}

pub fn soa_of(record: &Record) -> &SOA {
    match record.data() {
        RData::SOA(soa) => soa,
        other => panic!("expected SOA, got {other:?}"),
    }
}

/// Assert response code.
pub fn assert_response_code(msg: &Message, expected: ResponseCode) {
    assert_eq!(
        msg.response_code(),
        expected,
        "expected {:?}, got {:?}",
        expected,
        msg.response_code()
    );
}

/// Assert on the flags every response carries.
pub fn assert_authoritative(msg: &Message) {
    assert!(msg.authoritative(), "response is not authoritative");
    assert!(!msg.recursion_available(), "response offers recursion");
    assert_eq!(msg.message_type(), MessageType::Response);
}
