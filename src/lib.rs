//! Registry DNS - an authoritative DNS server for a fixed set of root zones.
//!
//! Records live in a relational store and are registered over HTTP; every
//! query is answered straight from the store, so new records are visible to
//! the next query without any reload.
//!
//! ## Architecture
//!
//! ```text
//!  POST /v1/addDNSRecord          UDP/TCP queries
//!          │                             │
//!          ▼                             ▼
//!  ┌───────────────┐            ┌──────────────────┐
//!  │ registration  │            │ QueryDispatcher  │
//!  └───────┬───────┘            │  zone matcher    │
//!          │ insert             │  formatters      │
//!          ▼                    │  SOA synthesizer │
//!  ┌───────────────┐   lookup   │  AXFR handler    │
//!  │  RecordStore  │◀───────────┴──────────────────┘
//!  └───────────────┘
//! ```
//!
//! ## Resolution
//!
//! ```text
//! test.valid.zone. A
//!   → zone valid.zone., relative name "test"
//!   → any record stored at (test, valid.zone.)?   no → NXDOMAIN
//!   → A records at (test, valid.zone.)            → formatted answers
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use registry_dns::store::SqliteRecordStore;
//! use registry_dns::{Config, DnsServer};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config: Config = load_config();
//!     let store = SqliteRecordStore::open(&config.database).await.unwrap();
//!
//!     let shutdown = CancellationToken::new();
//!     DnsServer::new(config, Arc::new(store))
//!         .run(shutdown)
//!         .await
//!         .unwrap();
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod formatter;
pub mod metrics;
pub mod record;
pub mod registration;
pub mod server;
pub mod soa;
pub mod store;
pub mod telemetry;
pub mod transfer;
pub mod zone;

pub use config::{Config, DnsConfig, SoaConfig, TelemetryConfig};
pub use dispatcher::{DnsQuery, DnsResponse, QueryDispatcher};
pub use error::{DnsError, QueryError, StoreError};
pub use formatter::FormatterRegistry;
pub use record::{DnsRecord, RecordSubmission};
pub use server::DnsServer;
pub use store::RecordStore;
