//! RabbitMQ Service Broker
//!
//! An HTTP control plane that lets a platform provision and bind RabbitMQ on
//! demand. Each service instance is a dedicated virtual host with its own
//! management user; each binding is a separate user with full permissions on
//! that virtual host. The broker keeps no state of its own.
//!
//! ## API Endpoints
//!
//! Every `/v2` request must carry `X-Broker-Api-Version: 2.x` and the broker's
//! Basic-Auth credentials.
//!
//! - `GET /v2/catalog` - Services and plans offered
//! - `PUT /v2/service_instances/{instance_id}` - Provision a vhost
//! - `DELETE /v2/service_instances/{instance_id}` - Deprovision a vhost
//! - `PUT /v2/service_instances/{instance_id}/service_bindings/{binding_id}` - Create a binding user
//! - `DELETE /v2/service_instances/{instance_id}/service_bindings/{binding_id}` - Delete a binding user
//! - `GET /health` - Liveness check (no version or authentication required)

pub mod api;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod pidfile;
pub mod service;

pub use api::create_router;
pub use api::handlers::AppState;
pub use catalog::{default_catalog, load_catalog, CatalogError};
pub use config::{Args, BrokerConfig, BrokerCredentials, ConfigError};
pub use pidfile::PidFile;
pub use service::{BrokerService, RabbitService, RabbitSettings};
