//! Error types for the Lectern library.
//!
//! All errors are represented by the [`LecternError`] enum. Client input
//! problems, missing documents, index data faults and transient index
//! outages each get their own variant so callers can map them onto a
//! response status with [`LecternError::status_code`].
//!
//! # Examples
//!
//! ```
//! use lectern::error::{LecternError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(LecternError::invalid_query("unknown sort key: price"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Lectern operations.
#[derive(Error, Debug)]
pub enum LecternError {
    /// A catalog identifier, document key or route path could not be parsed.
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// Search parameters referenced an unknown facet, sort key or search field.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A single-document lookup matched nothing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An exact-key lookup matched more than one document.
    #[error("Ambiguous result: {0}")]
    AmbiguousResult(String),

    /// The search index could not be reached or did not answer in time.
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// The index returned a document that cannot be mapped onto a catalog object.
    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors that are not timeouts or connection failures
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for operations that may fail with LecternError.
pub type Result<T> = std::result::Result<T, LecternError>;

impl LecternError {
    /// Create a new malformed identifier error.
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        LecternError::MalformedIdentifier(msg.into())
    }

    /// Create a new invalid query error.
    pub fn invalid_query<S: Into<String>>(msg: S) -> Self {
        LecternError::InvalidQuery(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        LecternError::NotFound(msg.into())
    }

    /// Create a new ambiguous result error.
    pub fn ambiguous<S: Into<String>>(msg: S) -> Self {
        LecternError::AmbiguousResult(msg.into())
    }

    /// Create a new index unavailable error.
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        LecternError::IndexUnavailable(msg.into())
    }

    /// Create a new timeout error.
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        LecternError::IndexUnavailable(format!("Timeout: {}", msg.into()))
    }

    /// Create a new corrupt document error.
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        LecternError::CorruptDocument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        LecternError::Config(msg.into())
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LecternError::IndexUnavailable(_))
    }

    /// Whether the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LecternError::MalformedIdentifier(_)
                | LecternError::InvalidQuery(_)
                | LecternError::NotFound(_)
        )
    }

    /// HTTP-equivalent status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            LecternError::MalformedIdentifier(_) | LecternError::InvalidQuery(_) => 400,
            LecternError::NotFound(_) => 404,
            LecternError::IndexUnavailable(_) => 503,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = LecternError::malformed("missing edition");
        assert_eq!(error.to_string(), "Malformed identifier: missing edition");

        let error = LecternError::timeout("select after 2000ms");
        assert_eq!(
            error.to_string(),
            "Index unavailable: Timeout: select after 2000ms"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(LecternError::malformed("x").status_code(), 400);
        assert_eq!(LecternError::invalid_query("x").status_code(), 400);
        assert_eq!(LecternError::not_found("x").status_code(), 404);
        assert_eq!(LecternError::ambiguous("x").status_code(), 500);
        assert_eq!(LecternError::unavailable("x").status_code(), 503);
        assert_eq!(LecternError::corrupt("x").status_code(), 500);
    }

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(LecternError::unavailable("down").is_retryable());
        assert!(!LecternError::ambiguous("dup").is_retryable());
        assert!(!LecternError::not_found("gone").is_retryable());
        assert!(LecternError::not_found("gone").is_client_error());
        assert!(!LecternError::ambiguous("dup").is_client_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = LecternError::from(io_error);

        match error {
            LecternError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
