//! Error types for spellreview-core.

use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reaching the checking service.
///
/// The review session does not tell these apart: every variant ends the
/// check with [`Notice::ServiceError`](crate::session::Notice::ServiceError).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("checking service unreachable: {0}")]
    Network(String),

    /// The service answered with a non-success HTTP status.
    #[error("checking service returned status {0}")]
    Status(u16),

    /// The response body could not be decoded as a check result.
    #[error("malformed check result: {0}")]
    Malformed(String),
}

/// Result type alias using [`TransportError`].
pub type TransportResult<T> = Result<T, TransportError>;
