//! Administrative client for the RabbitMQ management API
//!
//! The broker manipulates three kinds of remote resources, all owned by the
//! backing RabbitMQ server:
//!
//! - **Virtual hosts**: one per provisioned instance
//! - **Users**: one management user per instance, one user per binding
//! - **Permissions**: unrestricted configure/write/read grants on a vhost
//!
//! ## Implementations
//!
//! - [`RabbitAdmin`]: talks to the management HTTP API
//! - [`InMemoryAdmin`]: in-process fake with failure injection, for tests
//!
//! ## Usage
//!
//! ```ignore
//! use broker_admin::{AdminClient, RabbitAdmin};
//!
//! let admin = RabbitAdmin::new("http://127.0.0.1:15672", "guest", "guest", Duration::from_secs(10))?;
//! admin.create_vhost("instance-1", false).await?;
//! admin.create_user("m-instance-1", "secret").await?;
//! admin.grant_all_permissions("m-instance-1", "instance-1").await?;
//! ```

pub mod client;
pub mod error;
pub mod memory;
pub mod rabbit;

pub use client::{AdminClient, Permissions};
pub use error::{AdminError, Result};
pub use memory::{AdminOperation, InMemoryAdmin};
pub use rabbit::RabbitAdmin;
