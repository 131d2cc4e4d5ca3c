//! Error types for fcgi-client
//!
//! Provides a unified error type for codec and connection operations.

use bytes::Bytes;
use thiserror::Error;

use crate::protocol::ProtocolStatus;

/// Result type alias using FcgiError
pub type Result<T> = std::result::Result<T, FcgiError>;

/// Unified error type for fcgi-client operations
#[derive(Debug, Error)]
pub enum FcgiError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    /// Dial, read or write failure on the underlying stream.
    #[error("Connection failure: {0}")]
    ConnectionFailure(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Content that does not fit into a single record.
    #[error("Capacity exceeded: {what} is {size} bytes (max {limit})")]
    CapacityExceeded {
        what: &'static str,
        size: usize,
        limit: usize,
    },

    /// Integer that does not fit into a variable-length field.
    #[error("Variable length overflow: {0} exceeds 0x7FFFFFFF")]
    Overflow(u64),

    #[error("Unexpected end of input: {0}")]
    UnexpectedEnd(String),

    // -------------------------------------------------------------------------
    // Exchange Outcome Errors
    // -------------------------------------------------------------------------
    /// The script wrote to its error stream.
    #[error("Application error: {}", String::from_utf8_lossy(.0))]
    ApplicationError(Bytes),

    #[error("Request rejected by application server: {0:?}")]
    Rejected(ProtocolStatus),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Close Errors
    // -------------------------------------------------------------------------
    /// An exchange failed and closing the connection failed as well.
    #[error("{error}; closing the connection also failed: {close}")]
    Combined {
        error: Box<FcgiError>,
        close: std::io::Error,
    },
}

impl FcgiError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        FcgiError::ProtocolViolation(message.into())
    }

    /// Merge an exchange outcome with the outcome of closing its connection.
    pub fn combine<T>(result: Result<T>, close: std::io::Result<()>) -> Result<T> {
        match (result, close) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(e), Ok(())) => Err(e),
            (Ok(_), Err(close)) => Err(FcgiError::ConnectionFailure(close)),
            (Err(e), Err(close)) => Err(FcgiError::Combined {
                error: Box::new(e),
                close,
            }),
        }
    }

    /// True for the errors raised before anything was written because content
    /// did not fit the wire format limits.
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            FcgiError::CapacityExceeded { .. } | FcgiError::Overflow(_)
        )
    }
}
