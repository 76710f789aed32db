//! Common types and utilities shared across the unblock crates.
//!
//! This crate defines the shared error taxonomy and the observability helpers
//! used by the adapters and the CLI. It stays dependency-light so every crate
//! in the workspace can pull it in.
//!
//! # Overview
//!
//! - [`UnblockError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use unblock_common::UnblockError;
//!
//! let err = UnblockError::Config("missing api key".into());
//! assert!(err.is_fatal());
//! assert_eq!(err.to_string(), "Configuration error: missing api key");
//! ```

pub mod observability;

/// Error types used across the unblock system.
///
/// Only [`UnblockError::Config`] is meant to escape to a caller. The others
/// are produced inside an adapter and folded into its result envelope.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UnblockError {
    /// Credentials or configuration were missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The unlocking API could not be reached or answered with an error status.
    #[error("Error performing search: {0}")]
    Transport(String),

    /// The request succeeded but returned nothing usable.
    #[error("Empty search results")]
    EmptyResult,

    /// A crawl request failed.
    #[error("unlocking API request failed: {0}")]
    Crawl(String),
}

impl UnblockError {
    /// Whether the error should abort startup rather than be reported as data.
    pub fn is_fatal(&self) -> bool {
        matches!(self, UnblockError::Config(_))
    }
}

/// Convenient alias for results that use [`UnblockError`].
pub type Result<T> = std::result::Result<T, UnblockError>;
