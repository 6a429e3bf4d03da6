//! Error types for the printer library

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Classification of a failed delivery
///
/// The dispatcher itself only raises `TransportFailure`. The other kinds are
/// for callers that guard a delivery before handing bytes to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryErrorKind {
    /// Spooler rejection, socket connect/write failure or timeout
    TransportFailure,
    /// Printer exists but is disabled
    PrinterInactive,
    /// Printer could not be resolved
    PrinterNotFound,
}

impl fmt::Display for DeliveryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TransportFailure => "transport failure",
            Self::PrinterInactive => "printer inactive",
            Self::PrinterNotFound => "printer not found",
        };
        f.write_str(s)
    }
}

/// Delivery error
///
/// Always typed by `kind` and always carries a human-readable `detail`
/// (platform error code or I/O message) suitable for logging.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {detail}")]
pub struct DeliveryError {
    pub kind: DeliveryErrorKind,
    pub detail: String,
}

impl DeliveryError {
    pub fn new(kind: DeliveryErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Shorthand for a `TransportFailure`
    pub fn transport(detail: impl Into<String>) -> Self {
        Self::new(DeliveryErrorKind::TransportFailure, detail)
    }

    pub fn is_transport_failure(&self) -> bool {
        self.kind == DeliveryErrorKind::TransportFailure
    }
}

/// Spooler submission failure, as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("spooler error {code}: {message}")]
pub struct SpoolError {
    /// OS-level error code (Win32 `GetLastError`, `lp` exit status, ...)
    pub code: u32,
    pub message: String,
}

impl SpoolError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result type for printer operations
pub type DeliveryResult<T> = Result<T, DeliveryError>;
