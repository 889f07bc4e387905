//! Error types for registry-dns.

use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use thiserror::Error;

/// Fatal errors raised while configuring or starting the server.
#[derive(Debug, Error)]
pub enum DnsError {
    /// IO error (network, file, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record store could not be opened or migrated.
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Errors from record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database call failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be decoded into a record.
    #[error("invalid stored data: {0}")]
    InvalidData(String),

    /// The store is unavailable (closed pool, poisoned state).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Why a single query could not be answered normally.
///
/// Every variant is resolved to a response code at the point of detection.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query name is outside every configured root zone.
    #[error("name {0} is not part of a managed zone")]
    UnmanagedZone(String),

    /// The zone matched but nothing is stored at the name.
    #[error("no records at {name} in zone {zone}")]
    NotFound {
        /// Relative name that was probed.
        name: String,
        /// Zone that was probed.
        zone: String,
    },

    /// The record store call errored.
    #[error("record store failure: {0}")]
    StoreFailure(#[from] StoreError),

    /// Zone transfer requested from an address outside the allow-list.
    #[error("zone transfer from {0} is not allowed")]
    Unauthorized(String),

    /// No handling path exists for the query type.
    #[error("unsupported query type {0}")]
    UnsupportedType(RecordType),
}

impl QueryError {
    /// Response code sent to the client for this error.
    pub fn response_code(&self) -> ResponseCode {
        match self {
            QueryError::UnmanagedZone(_) | QueryError::NotFound { .. } => ResponseCode::NXDomain,
            QueryError::StoreFailure(_) => ResponseCode::ServFail,
            QueryError::Unauthorized(_) => ResponseCode::Refused,
            QueryError::UnsupportedType(_) => ResponseCode::NotImp,
        }
    }
}

/// A stored record whose payload does not parse for its type.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The value is not an address of the expected family.
    #[error("{rtype} value {value:?} is not a valid address")]
    InvalidAddress {
        /// Record type being formatted.
        rtype: RecordType,
        /// Offending value.
        value: String,
    },

    /// The value or owner is not a valid domain name.
    #[error("invalid domain name {value:?}: {source}")]
    InvalidName {
        /// Offending value.
        value: String,
        /// Parser error.
        #[source]
        source: hickory_proto::ProtoError,
    },
}

/// Rejections from the registration path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is empty or zero.
    #[error("missing field {0}")]
    MissingField(&'static str),

    /// A numeric field did not parse.
    #[error("field {field} is not a valid number: {value:?}")]
    InvalidNumber {
        /// Field name.
        field: &'static str,
        /// Submitted value.
        value: String,
    },

    /// CNAME, NS, PTR and MX values must be fully qualified.
    #[error("value field must end with a period")]
    MissingTrailingPeriod,
}
