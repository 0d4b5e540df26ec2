//! # Broker Core
//!
//! Shared building blocks for the RabbitMQ service broker.
//!
//! ## Key Concepts
//!
//! - **Catalog**: The static description of offered services and plans
//! - **Provisioning / Binding requests**: Transient lifecycle requests decoded from the wire
//! - **Secret generation**: Deterministic or random credentials for provisioned users
//! - **Naming**: Deterministic resource names derived from instance and binding identifiers
//! - **Rollback**: Compensating undo actions for multi-step operations
//!
//! The broker keeps no state between requests. Every remote resource it creates is named
//! from the identifiers supplied by the platform, so a later deprovision or unbind can
//! locate exactly those resources again.

pub mod credentials;
pub mod error;
pub mod naming;
pub mod rollback;
pub mod types;
pub mod version;

pub use credentials::{DeterministicGenerator, RandomGenerator, SecretGenerator};
pub use error::{BrokerError, Result};
pub use rollback::Rollback;
pub use types::{Binding, BindingRequest, Catalog, Credentials, Plan, ProvisioningRequest, Service};
pub use version::ApiVersion;
