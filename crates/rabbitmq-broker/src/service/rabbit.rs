//! RabbitMQ implementation of the broker service
//!
//! Each provisioned instance is a vhost named after the instance identifier,
//! administered by a management user `m-<vhost>`. Each binding is a separate
//! user with full permissions on the instance's vhost.
//!
//! Multi-step flows register an undo action after every successful step. If a
//! later step fails, the completed steps are reverted in reverse order before
//! the error is returned, so a failed provision or bind leaves no orphaned
//! vhosts or users behind.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

use broker_admin::{AdminClient, AdminError};
use broker_core::naming;
use broker_core::{
    Binding, BindingRequest, BrokerError, Catalog, Credentials, ProvisioningRequest, Result,
    Rollback, SecretGenerator,
};

use super::BrokerService;

/// Where clients reach the RabbitMQ server
#[derive(Debug, Clone)]
pub struct RabbitSettings {
    /// Host of the AMQP listener
    pub host: String,
    /// AMQP port
    pub port: u16,
    /// Scheme of the management UI (`http` or `https`)
    pub management_scheme: String,
    /// Host of the management UI
    pub management_host: String,
    /// Port of the management UI
    pub management_port: u16,
    /// Enable message tracing on created vhosts
    pub vhost_tracing: bool,
}

impl Default for RabbitSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5672,
            management_scheme: "http".into(),
            management_host: "127.0.0.1".into(),
            management_port: 15672,
            vhost_tracing: false,
        }
    }
}

/// Broker service provisioning RabbitMQ vhosts
pub struct RabbitService {
    admin: Arc<dyn AdminClient>,
    secrets: Arc<dyn SecretGenerator>,
    catalog: Arc<Catalog>,
    settings: RabbitSettings,
}

impl RabbitService {
    pub fn new(
        admin: Arc<dyn AdminClient>,
        secrets: Arc<dyn SecretGenerator>,
        catalog: Arc<Catalog>,
        settings: RabbitSettings,
    ) -> Self {
        Self {
            admin,
            secrets,
            catalog,
            settings,
        }
    }

    /// Management UI login link for a user
    fn dashboard_url(&self, username: &str, password: &str) -> String {
        format!(
            "{}://{}:{}/#/login/{}/{}",
            self.settings.management_scheme,
            self.settings.management_host,
            self.settings.management_port,
            urlencoding::encode(username),
            urlencoding::encode(password)
        )
    }

    /// AMQP connection URI for a user on a vhost
    fn amqp_uri(&self, username: &str, password: &str, vhost: &str) -> String {
        format!(
            "amqp://{}:{}@{}:{}/{}",
            urlencoding::encode(username),
            urlencoding::encode(password),
            self.settings.host,
            self.settings.port,
            urlencoding::encode(vhost)
        )
    }

    fn credentials(&self, username: &str, password: &str, vhost: &str) -> Credentials {
        let mut credentials = Credentials::new();
        credentials.insert("uri".into(), self.amqp_uri(username, password, vhost).into());
        credentials.insert("hostname".into(), self.settings.host.clone().into());
        credentials.insert("port".into(), self.settings.port.into());
        credentials.insert("vhost".into(), vhost.into());
        credentials.insert("username".into(), username.into());
        credentials.insert("password".into(), password.into());
        credentials
    }

    /// Steps 3-6 of provisioning; the vhost already exists.
    async fn provision_management_user(
        &self,
        vhost: &str,
        rollback: &mut Rollback<'static, AdminError>,
    ) -> Result<String> {
        let username = naming::management_username(vhost);
        let password = self.secrets.generate(vhost)?;

        self.admin.create_user(&username, &password).await?;
        info!(username = %username, "Management user created");
        rollback.push(
            format!("delete user {}", username),
            delete_user(&self.admin, &username),
        );

        self.admin.grant_all_permissions(&username, vhost).await?;
        info!(username = %username, vhost = %vhost, "All permissions granted to management user");

        let dashboard_url = self.dashboard_url(&username, &password);
        debug!(username = %username, "Dashboard URL generated");
        Ok(dashboard_url)
    }
}

fn delete_vhost(
    admin: &Arc<dyn AdminClient>,
    vhost: &str,
) -> impl Future<Output = std::result::Result<(), AdminError>> + Send + 'static {
    let admin = Arc::clone(admin);
    let vhost = vhost.to_string();
    async move { admin.delete_vhost(&vhost).await }
}

fn delete_user(
    admin: &Arc<dyn AdminClient>,
    username: &str,
) -> impl Future<Output = std::result::Result<(), AdminError>> + Send + 'static {
    let admin = Arc::clone(admin);
    let username = username.to_string();
    async move { admin.delete_user(&username).await }
}

#[async_trait]
impl BrokerService for RabbitService {
    fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    async fn provision(&self, request: &ProvisioningRequest) -> Result<String> {
        self.catalog
            .check_offered(&request.service_id, &request.plan_id)?;

        let vhost = naming::vhost_name(&request.instance_id);
        self.admin
            .create_vhost(&vhost, self.settings.vhost_tracing)
            .await?;
        info!(vhost = %vhost, "Virtual host created");

        let mut rollback = Rollback::new("provision");
        rollback.push(format!("delete vhost {}", vhost), delete_vhost(&self.admin, &vhost));

        let outcome = self.provision_management_user(&vhost, &mut rollback).await;
        rollback.finish(outcome).await
    }

    async fn deprovision(&self, request: &ProvisioningRequest) -> Result<()> {
        let vhost = naming::vhost_name(&request.instance_id);
        let username = naming::management_username(&vhost);

        self.admin.delete_user(&username).await?;
        info!(username = %username, "Management user deleted");

        self.admin.delete_vhost(&vhost).await?;
        info!(vhost = %vhost, "Virtual host deleted");

        Ok(())
    }

    async fn bind(&self, request: &BindingRequest) -> Result<Binding> {
        self.catalog
            .check_offered(&request.service_id, &request.plan_id)?;

        let vhost = naming::vhost_name(&request.instance_id);
        let username = naming::binding_username(&request.instance_id, &request.binding_id);
        let password = self
            .secrets
            .generate(&naming::binding_seed(&request.instance_id, &request.binding_id))?;

        self.admin.create_user(&username, &password).await?;
        info!(
            username = %username,
            binding_id = %request.binding_id,
            "Binding user created"
        );

        let mut rollback = Rollback::new("bind");
        rollback.push(
            format!("delete user {}", username),
            delete_user(&self.admin, &username),
        );

        let granted = self
            .admin
            .grant_all_permissions(&username, &vhost)
            .await
            .map_err(BrokerError::from);
        rollback.finish(granted).await?;
        info!(username = %username, vhost = %vhost, "All permissions granted to binding user");

        Ok(Binding {
            credentials: self.credentials(&username, &password, &vhost),
            syslog_drain_url: None,
        })
    }

    async fn unbind(&self, request: &BindingRequest) -> Result<()> {
        let username = naming::binding_username(&request.instance_id, &request.binding_id);

        // Open connections under this user are closed by RabbitMQ itself once
        // the user no longer exists; the broker does not track them.
        self.admin.delete_user(&username).await?;
        info!(
            username = %username,
            binding_id = %request.binding_id,
            "Binding user deleted"
        );

        Ok(())
    }
}
