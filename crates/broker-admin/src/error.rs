//! Error types for the administrative client

use broker_core::BrokerError;
use thiserror::Error;

/// Result type for administrative operations
pub type Result<T> = std::result::Result<T, AdminError>;

/// Errors raised by administrative calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    /// An existence check found the entity already present
    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    /// The entity does not exist
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// The management API answered with a status outside the success range
    #[error("Unexpected response {status} for {resource}")]
    UnexpectedResponse { resource: String, status: u16 },

    /// Connection, timeout or decoding failure
    #[error("HTTP error: {0}")]
    Transport(String),

    /// Client could not be constructed
    #[error("Invalid client configuration: {0}")]
    Config(String),

    /// Failure injected by the in-memory fake
    #[error("Injected failure: {0}")]
    Injected(String),
}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        AdminError::Transport(err.to_string())
    }
}

impl From<AdminError> for BrokerError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::AlreadyExists(entity) => BrokerError::Conflict(entity),
            AdminError::NotFound(entity) => BrokerError::Gone(entity),
            AdminError::UnexpectedResponse { resource, status } => {
                BrokerError::Unexpected(format!("{} returned {}", resource, status))
            }
            other => BrokerError::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_mapping() {
        assert_eq!(
            BrokerError::from(AdminError::AlreadyExists("vhost abc".into())),
            BrokerError::Conflict("vhost abc".into())
        );
        assert_eq!(
            BrokerError::from(AdminError::NotFound("user m-abc".into())),
            BrokerError::Gone("user m-abc".into())
        );
        assert!(matches!(
            BrokerError::from(AdminError::UnexpectedResponse {
                resource: "vhost abc".into(),
                status: 500,
            }),
            BrokerError::Unexpected(msg) if msg.contains("500")
        ));
        assert!(matches!(
            BrokerError::from(AdminError::Transport("connection refused".into())),
            BrokerError::Backend(msg) if msg.contains("connection refused")
        ));
    }
}
