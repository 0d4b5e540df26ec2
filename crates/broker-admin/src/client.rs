//! The administrative capability consumed by the broker

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::Result;

/// Permission patterns granted to a user on a vhost
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub configure: String,
    pub write: String,
    pub read: String,
}

impl Permissions {
    /// Full access to every resource of the vhost
    pub fn unrestricted() -> Self {
        Self {
            configure: ".*".into(),
            write: ".*".into(),
            read: ".*".into(),
        }
    }
}

/// Operations against the backing system's administrative API
///
/// Creation methods check for existence first and fail with
/// [`AdminError::AlreadyExists`](crate::AdminError::AlreadyExists). The check
/// and the create are separate calls, so two concurrent creations of the same
/// name can both pass the check; the backing system arbitrates.
///
/// Deleting an absent entity fails with
/// [`AdminError::NotFound`](crate::AdminError::NotFound).
#[async_trait]
pub trait AdminClient: Send + Sync + Debug {
    /// Check whether a vhost exists
    async fn vhost_exists(&self, name: &str) -> Result<bool>;

    /// Create a vhost
    async fn create_vhost(&self, name: &str, tracing: bool) -> Result<()>;

    /// Delete a vhost and everything in it
    async fn delete_vhost(&self, name: &str) -> Result<()>;

    /// Check whether a user exists
    async fn user_exists(&self, name: &str) -> Result<bool>;

    /// Create a user tagged `management`
    async fn create_user(&self, name: &str, password: &str) -> Result<()>;

    /// Delete a user
    async fn delete_user(&self, name: &str) -> Result<()>;

    /// Grant [`Permissions::unrestricted`] on `vhost` to `username`
    async fn grant_all_permissions(&self, username: &str, vhost: &str) -> Result<()>;
}
