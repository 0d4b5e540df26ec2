//! Service broker protocol types
//!
//! Field names follow the service broker API wire format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Credentials handed to an application on a successful bind
///
/// Ordered so that the serialized form is stable.
pub type Credentials = BTreeMap<String, serde_json::Value>;

/// Catalog of services offered by this broker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub services: Vec<Service>,
}

/// A service offered in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub bindable: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    pub plans: Vec<Plan>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// A plan of a catalog service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Catalog {
    /// Find a service by identifier
    pub fn service(&self, service_id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == service_id)
    }

    /// Check that a service/plan pair is offered.
    ///
    /// Empty identifiers are accepted: deprovision and unbind requests
    /// frequently arrive without a body.
    pub fn check_offered(&self, service_id: &str, plan_id: &str) -> crate::Result<()> {
        if service_id.is_empty() {
            return Ok(());
        }

        let service = self.service(service_id).ok_or_else(|| {
            crate::BrokerError::BadRequest(format!("Unknown service: {}", service_id))
        })?;

        if plan_id.is_empty() || service.plans.iter().any(|p| p.id == plan_id) {
            Ok(())
        } else {
            Err(crate::BrokerError::BadRequest(format!(
                "Unknown plan '{}' for service '{}'",
                plan_id, service_id
            )))
        }
    }
}

/// Request to provision (or deprovision) a service instance
///
/// The instance identifier always comes from the route path and is never
/// read from the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProvisioningRequest {
    #[serde(skip)]
    pub instance_id: String,

    pub service_id: String,

    pub plan_id: String,

    #[serde(rename = "organization_guid")]
    pub organization_id: String,

    #[serde(rename = "space_guid")]
    pub space_id: String,
}

impl ProvisioningRequest {
    /// Overlay the path-derived instance identifier
    pub fn for_instance(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = instance_id.into();
        self
    }
}

/// Request to bind (or unbind) an application to a service instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BindingRequest {
    #[serde(skip)]
    pub instance_id: String,

    #[serde(skip)]
    pub binding_id: String,

    pub service_id: String,

    pub plan_id: String,

    #[serde(rename = "app_guid")]
    pub app_id: String,
}

impl BindingRequest {
    /// Overlay the path-derived instance and binding identifiers
    pub fn for_binding(
        mut self,
        instance_id: impl Into<String>,
        binding_id: impl Into<String>,
    ) -> Self {
        self.instance_id = instance_id.into();
        self.binding_id = binding_id.into();
        self
    }
}

/// Result of a successful bind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    pub credentials: Credentials,

    /// Syslog drain URL; this broker never produces one
    pub syslog_drain_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog {
            services: vec![Service {
                id: "rabbitmq".into(),
                name: "RabbitMQ".into(),
                description: "RabbitMQ Message Broker".into(),
                bindable: true,
                tags: vec!["rabbitmq".into()],
                requires: vec![],
                plans: vec![Plan {
                    id: "simple".into(),
                    name: "Simple".into(),
                    description: "Simple plan".into(),
                    metadata: None,
                }],
                metadata: None,
            }],
        }
    }

    #[test]
    fn test_path_identifiers_are_not_read_from_body() {
        let body = r#"{"instance_id":"evil","service_id":"rabbitmq","plan_id":"simple","organization_guid":"org","space_guid":"space"}"#;
        let request: ProvisioningRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.instance_id, "");

        let request = request.for_instance("abc");
        assert_eq!(request.instance_id, "abc");
        assert_eq!(request.organization_id, "org");
        assert_eq!(request.space_id, "space");
    }

    #[test]
    fn test_binding_request_overlay() {
        let body = r#"{"binding_id":"evil","service_id":"rabbitmq","plan_id":"simple","app_guid":"app-1"}"#;
        let request: BindingRequest = serde_json::from_str::<BindingRequest>(body)
            .unwrap()
            .for_binding("abc", "b1");

        assert_eq!(request.instance_id, "abc");
        assert_eq!(request.binding_id, "b1");
        assert_eq!(request.app_id, "app-1");
    }

    #[test]
    fn test_catalog_omits_empty_optional_fields() {
        let json = serde_json::to_value(catalog()).unwrap();
        let service = &json["services"][0];

        assert_eq!(service["tags"], serde_json::json!(["rabbitmq"]));
        assert!(service.get("requires").is_none());
        assert!(service.get("metadata").is_none());
        assert!(service["plans"][0].get("metadata").is_none());
    }

    #[test]
    fn test_check_offered() {
        let catalog = catalog();

        assert!(catalog.check_offered("rabbitmq", "simple").is_ok());
        assert!(catalog.check_offered("", "").is_ok());
        assert!(catalog.check_offered("rabbitmq", "").is_ok());
        assert!(matches!(
            catalog.check_offered("kafka", "simple"),
            Err(crate::BrokerError::BadRequest(_))
        ));
        assert!(matches!(
            catalog.check_offered("rabbitmq", "gold"),
            Err(crate::BrokerError::BadRequest(_))
        ));
    }
}
