//! Error types for termwalk.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side is
//! the [`TermwalkError`] enum. The variants follow the failure classes of query
//! rewriting and execution:
//!
//! - configuration errors (too many expanded fields or clauses, bad chain config)
//! - indexing mismatches (positional matching on a field without positions)
//! - invariant violations (misuse of the binding protocol)
//!
//! # Examples
//!
//! ```
//! use termwalk::error::{Result, TermwalkError};
//!
//! fn check_threshold(min_frequency: u32) -> Result<u32> {
//!     if min_frequency == 0 {
//!         return Err(TermwalkError::invalid_argument("minimum frequency must be >= 1"));
//!     }
//!     Ok(min_frequency)
//! }
//!
//! assert!(check_threshold(0).is_err());
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for termwalk operations.
#[derive(Error, Debug)]
pub enum TermwalkError {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors, reported to the caller and never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Positional matching was requested on a field indexed without positions.
    #[error("Indexing mismatch: {0}")]
    IndexingMismatch(String),

    /// A caller broke the binding protocol (e.g. stale term statistics).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Query-related errors (invalid patterns, malformed boosts, ...)
    #[error("Query error: {0}")]
    Query(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid operation on a cursor or query
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with TermwalkError.
pub type Result<T> = std::result::Result<T, TermwalkError>;

impl TermwalkError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        TermwalkError::Config(msg.into())
    }

    /// Create a new indexing mismatch error.
    pub fn indexing_mismatch<S: Into<String>>(msg: S) -> Self {
        TermwalkError::IndexingMismatch(msg.into())
    }

    /// Create a new invariant violation error.
    pub fn invariant<S: Into<String>>(msg: S) -> Self {
        TermwalkError::InvariantViolation(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        TermwalkError::Query(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TermwalkError::InvalidArgument(msg.into())
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        TermwalkError::InvalidOperation(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TermwalkError::Other(msg.into())
    }

    /// Whether this error signals a configuration problem on the caller side.
    pub fn is_config(&self) -> bool {
        matches!(self, TermwalkError::Config(_))
    }
}
