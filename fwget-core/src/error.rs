//! Error types for fwget
//!
//! Every failure carries a classified [`ErrorKind`]. HTTP status codes are
//! classified once, where the response is received, and travel with the
//! error as a number so callers never compare status strings.

use std::path::PathBuf;
use thiserror::Error;

/// Where fresh catalog access tokens are issued
pub const TOKEN_HELP_URL: &str = "http://downloads.linux.hpe.com/SDR/project/fwpp/";

/// Coarse classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    NotFound,
    Unauthorized,
    TransportFailure,
    UnsupportedFormat,
    PartialInventory,
    Config,
    Io,
}

/// All errors surfaced by the fwget core
#[derive(Error, Debug)]
pub enum FwgetError {
    /// A catalog or inventory document is missing required fields or has the wrong shape
    #[error("Malformed {what}: {reason}")]
    MalformedInput { what: String, reason: String },

    /// The remote resource does not exist
    #[error("Not found (HTTP {status}): {url}")]
    NotFound { url: String, status: u16 },

    /// The credentials were rejected
    #[error("Not authorized (HTTP {status}): {url}")]
    Unauthorized { url: String, status: u16 },

    /// Any other network failure, with the HTTP status when one was received
    #[error("{}", transport_message(.url, .status, .reason))]
    TransportFailure {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    /// The requested export format does not exist
    #[error("Unsupported format '{requested}' (supported: {})", .supported.join(", "))]
    UnsupportedFormat {
        requested: String,
        supported: Vec<&'static str>,
    },

    /// A per-item detail fetch failed while building an inventory
    #[error("Inventory incomplete: failed to fetch {member} ({fetched} of {total} items fetched): {source}")]
    PartialInventory {
        member: String,
        fetched: usize,
        total: usize,
        #[source]
        source: Box<FwgetError>,
    },

    /// Configuration file missing, unreadable or invalid
    #[error("Configuration error ({}): {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    /// Local file read or write failed
    #[error("Failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn transport_message(url: &str, status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(code) => format!("Request to {url} failed (HTTP {code}): {reason}"),
        None => format!("Request to {url} failed: {reason}"),
    }
}

pub type Result<T> = std::result::Result<T, FwgetError>;

impl FwgetError {
    /// Classify a non-success HTTP status
    pub fn from_status(url: impl Into<String>, status: u16) -> Self {
        let url = url.into();
        match status {
            404 => FwgetError::NotFound { url, status },
            401 => FwgetError::Unauthorized { url, status },
            _ => FwgetError::TransportFailure {
                url,
                status: Some(status),
                reason: "unexpected status".to_string(),
            },
        }
    }

    pub fn malformed(what: impl Into<String>, reason: impl ToString) -> Self {
        FwgetError::MalformedInput {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FwgetError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FwgetError::MalformedInput { .. } => ErrorKind::MalformedInput,
            FwgetError::NotFound { .. } => ErrorKind::NotFound,
            FwgetError::Unauthorized { .. } => ErrorKind::Unauthorized,
            FwgetError::TransportFailure { .. } => ErrorKind::TransportFailure,
            FwgetError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            FwgetError::PartialInventory { .. } => ErrorKind::PartialInventory,
            FwgetError::Config { .. } => ErrorKind::Config,
            FwgetError::Io { .. } => ErrorKind::Io,
        }
    }

    /// HTTP status that triggered the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FwgetError::NotFound { status, .. } | FwgetError::Unauthorized { status, .. } => {
                Some(*status)
            }
            FwgetError::TransportFailure { status, .. } => *status,
            FwgetError::PartialInventory { source, .. } => source.status(),
            _ => None,
        }
    }
}

#[cfg(any(feature = "catalog", feature = "inventory"))]
impl FwgetError {
    /// Wrap a reqwest error that happened before or while reading a response
    pub(crate) fn transport(url: impl Into<String>, err: reqwest::Error) -> Self {
        FwgetError::TransportFailure {
            url: url.into(),
            status: err.status().map(|s| s.as_u16()),
            reason: err.to_string(),
        }
    }
}
