//! Error types for the service broker

use thiserror::Error;

/// Result type alias using BrokerError
pub type Result<T> = std::result::Result<T, BrokerError>;

/// Errors surfaced by the broker's lifecycle operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// Resource already exists (instance or binding identifier reused)
    #[error("Resource already exists: {0}")]
    Conflict(String),

    /// Resource is absent on a delete path
    #[error("Resource does not exist: {0}")]
    Gone(String),

    /// The administrative API answered with a status the broker does not handle
    #[error("Unexpected response from administrative API: {0}")]
    Unexpected(String),

    /// Credential generation failed
    #[error("Credential generation failed: {0}")]
    Generation(String),

    /// Request body or header could not be decoded
    #[error("Unable to decode request: {0}")]
    Decode(String),

    /// Authentication header missing or malformed
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Credentials did not match the broker's configured credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// API version is well-formed but not supported
    #[error("Unsupported broker API version: {0}")]
    UnsupportedVersion(String),

    /// Request is well-formed but refers to something the broker does not offer
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Any other administrative API failure
    #[error("Administrative API error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for BrokerError {
    fn from(err: serde_json::Error) -> Self {
        BrokerError::Decode(err.to_string())
    }
}
