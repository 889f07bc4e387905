//! Configuration types for registry-dns.

use hickory_proto::rr::Name;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::warn;

use crate::error::DnsError;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// DNS server configuration.
    pub dns: DnsConfig,

    /// Record store configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// HTTP registration endpoint. Disabled when absent.
    #[serde(default)]
    pub registration: Option<RegistrationConfig>,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// DNS server configuration.
///
/// Read-only once loaded; the query path shares it behind an `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Address for DNS server to listen on (UDP and TCP).
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Zones this server is authoritative for, in match order.
    pub root_zones: Vec<String>,

    /// Address prefixes allowed to request zone transfers.
    #[serde(default)]
    pub axfr_allow: Vec<String>,

    /// SOA record configuration.
    #[serde(default)]
    pub soa: SoaConfig,
}

/// SOA (Start of Authority) record configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoaConfig {
    /// Primary nameserver hostname (e.g., "ns1.example.com.").
    #[serde(default = "default_nameserver")]
    pub nameserver: String,

    /// Admin mailbox in DNS format (e.g., "hostmaster.example.com.").
    #[serde(default = "default_admin_email")]
    pub admin_email: String,

    /// Refresh interval in seconds.
    #[serde(default = "default_refresh")]
    pub refresh: u32,

    /// Retry interval in seconds.
    #[serde(default = "default_retry")]
    pub retry: u32,

    /// Expire time in seconds.
    #[serde(default = "default_expire")]
    pub expire: u32,

    /// Minimum TTL in seconds.
    #[serde(default = "default_minimum")]
    pub minimum: u32,
}

/// Record store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL (e.g., "sqlite://registry-dns.db").
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// HTTP registration endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Address for the HTTP listener.
    pub listen_addr: SocketAddr,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter (e.g., "info", "debug", "registry_dns=debug,warn").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus metrics exporter address.
    #[serde(default)]
    pub prometheus_addr: Option<SocketAddr>,

    /// OpenTelemetry configuration.
    #[serde(default)]
    pub opentelemetry: Option<OpenTelemetryConfig>,
}

/// OpenTelemetry exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenTelemetryConfig {
    /// OTLP endpoint (e.g., "http://localhost:4317").
    pub endpoint: String,

    /// Service name for traces.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5353))
}

fn default_nameserver() -> String {
    "ns1.example.com.".to_string()
}

fn default_admin_email() -> String {
    "hostmaster.example.com.".to_string()
}

fn default_refresh() -> u32 {
    86400
}

fn default_retry() -> u32 {
    3600
}

fn default_expire() -> u32 {
    3600000
}

fn default_minimum() -> u32 {
    300
}

fn default_database_url() -> String {
    "sqlite://registry-dns.db".to_string()
}

fn default_max_connections() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "registry-dns".to_string()
}

impl Default for SoaConfig {
    fn default() -> Self {
        Self {
            nameserver: default_nameserver(),
            admin_email: default_admin_email(),
            refresh: default_refresh(),
            retry: default_retry(),
            expire: default_expire(),
            minimum: default_minimum(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            prometheus_addr: None,
            opentelemetry: None,
        }
    }
}

/// Append the root label if missing.
pub(crate) fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

impl DnsConfig {
    /// Fully qualify zones, nameserver and mailbox, and lower-case zones.
    pub fn normalize(&mut self) {
        for zone in &mut self.root_zones {
            *zone = fqdn(zone.trim()).to_ascii_lowercase();
        }
        self.soa.nameserver = fqdn(self.soa.nameserver.trim());
        self.soa.admin_email = fqdn(self.soa.admin_email.trim());
    }

    /// Reject configurations the query path cannot serve.
    ///
    /// Overlapping zones are accepted and resolved by declaration order; they
    /// only produce a warning.
    pub fn validate(&self) -> Result<(), DnsError> {
        if self.root_zones.is_empty() {
            return Err(DnsError::Config("dns.root_zones must not be empty".into()));
        }

        for zone in &self.root_zones {
            Name::from_ascii(zone)
                .map_err(|e| DnsError::Config(format!("invalid root zone {zone:?}: {e}")))?;
        }
        Name::from_ascii(&self.soa.nameserver).map_err(|e| {
            DnsError::Config(format!("invalid nameserver {:?}: {e}", self.soa.nameserver))
        })?;
        Name::from_ascii(&self.soa.admin_email).map_err(|e| {
            DnsError::Config(format!("invalid admin mailbox {:?}: {e}", self.soa.admin_email))
        })?;

        for (outer, inner) in self.overlapping_zones() {
            warn!(
                zone = %inner,
                parent = %outer,
                "root zones overlap; the one declared first wins"
            );
        }

        Ok(())
    }

    /// Pairs of configured zones where the second lies inside the first.
    pub fn overlapping_zones(&self) -> Vec<(&str, &str)> {
        let mut overlaps = Vec::new();
        for (i, a) in self.root_zones.iter().enumerate() {
            for b in self.root_zones.iter().skip(i + 1) {
                if is_within(b, a) {
                    overlaps.push((a.as_str(), b.as_str()));
                } else if is_within(a, b) {
                    overlaps.push((b.as_str(), a.as_str()));
                }
            }
        }
        overlaps
    }
}

fn is_within(name: &str, zone: &str) -> bool {
    let name = name.to_ascii_lowercase();
    let zone = zone.to_ascii_lowercase();
    zone == "." || name == zone || name.ends_with(&format!(".{zone}"))
}
