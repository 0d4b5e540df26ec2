//! Broker service: the lifecycle operations behind the HTTP endpoints

mod rabbit;

pub use rabbit::{RabbitService, RabbitSettings};

use async_trait::async_trait;
use std::sync::Arc;

use broker_core::{Binding, BindingRequest, Catalog, ProvisioningRequest, Result};

/// The internal API used by the broker's HTTP endpoints
#[async_trait]
pub trait BrokerService: Send + Sync {
    /// The catalog of services managed by this broker
    fn catalog(&self) -> Arc<Catalog>;

    /// Create a service instance of the requested service and plan.
    ///
    /// Returns the dashboard URL of the new instance.
    async fn provision(&self, request: &ProvisioningRequest) -> Result<String>;

    /// Remove a service instance
    async fn deprovision(&self, request: &ProvisioningRequest) -> Result<()>;

    /// Bind an application to a service instance.
    ///
    /// Returns the credentials needed to connect to the instance.
    async fn bind(&self, request: &BindingRequest) -> Result<Binding>;

    /// Remove a binding
    async fn unbind(&self, request: &BindingRequest) -> Result<()>;
}
