//! Catalog loading
//!
//! The catalog is static configuration: either the built-in RabbitMQ offering
//! or a JSON document in the `/v2/catalog` response format.

use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use broker_core::{Catalog, Plan, Service};

/// Error loading a catalog file
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Cannot read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse catalog file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

/// The catalog offered when no catalog file is configured
pub fn default_catalog() -> Catalog {
    Catalog {
        services: vec![Service {
            id: "rabbitmq".into(),
            name: "RabbitMQ".into(),
            description: "RabbitMQ Message Broker".into(),
            bindable: true,
            tags: vec!["rabbitmq".into(), "messaging".into()],
            requires: vec![],
            plans: vec![Plan {
                id: "simple".into(),
                name: "Simple RabbitMQ Plan".into(),
                description: "Simple RabbitMQ plan represented as a unique broker's vhost.".into(),
                metadata: None,
            }],
            metadata: None,
        }],
    }
}

/// Load and validate a catalog file
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let path_name = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path_name.clone(),
        source,
    })?;
    let catalog = parse_catalog(&raw).map_err(|e| match e {
        CatalogError::Parse { source, .. } => CatalogError::Parse {
            path: path_name.clone(),
            source,
        },
        other => other,
    })?;

    info!(
        path = %path_name,
        services = catalog.services.len(),
        "Catalog loaded"
    );
    Ok(catalog)
}

/// Parse and validate a catalog document
pub fn parse_catalog(raw: &str) -> Result<Catalog, CatalogError> {
    let catalog: Catalog = serde_json::from_str(raw).map_err(|source| CatalogError::Parse {
        path: "<inline>".into(),
        source,
    })?;
    validate(&catalog)?;
    Ok(catalog)
}

fn validate(catalog: &Catalog) -> Result<(), CatalogError> {
    if catalog.services.is_empty() {
        return Err(CatalogError::Invalid("no services defined".into()));
    }

    let mut service_ids = HashSet::new();
    for service in &catalog.services {
        if service.id.is_empty() {
            return Err(CatalogError::Invalid("service with empty id".into()));
        }
        if !service_ids.insert(service.id.as_str()) {
            return Err(CatalogError::Invalid(format!(
                "duplicate service id '{}'",
                service.id
            )));
        }
        if service.plans.is_empty() {
            return Err(CatalogError::Invalid(format!(
                "service '{}' has no plans",
                service.id
            )));
        }

        let mut plan_ids = HashSet::new();
        for plan in &service.plans {
            if plan.id.is_empty() || !plan_ids.insert(plan.id.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "service '{}' has an empty or duplicate plan id",
                    service.id
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = default_catalog();
        assert!(validate(&catalog).is_ok());
        assert!(catalog.check_offered("rabbitmq", "simple").is_ok());
    }

    #[test]
    fn test_parse_catalog_with_metadata() {
        let raw = r#"{
            "services": [{
                "id": "rabbitmq",
                "name": "RabbitMQ",
                "description": "RabbitMQ Message Broker",
                "bindable": true,
                "plans": [{
                    "id": "simple",
                    "name": "Simple",
                    "description": "One vhost",
                    "metadata": {"bullets": ["1 vhost"], "costs": [{"unit": "MONTHLY"}]}
                }]
            }]
        }"#;

        let catalog = parse_catalog(raw).unwrap();
        let plan = &catalog.services[0].plans[0];
        assert_eq!(plan.metadata.as_ref().unwrap()["bullets"][0], "1 vhost");
    }

    #[test]
    fn test_rejects_invalid_catalogs() {
        assert!(matches!(
            parse_catalog(r#"{"services": []}"#),
            Err(CatalogError::Invalid(_))
        ));
        assert!(matches!(
            parse_catalog(
                r#"{"services": [{"id": "a", "name": "A", "description": "", "bindable": true, "plans": []}]}"#
            ),
            Err(CatalogError::Invalid(_))
        ));
        assert!(matches!(
            parse_catalog("not json"),
            Err(CatalogError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let raw = serde_json::to_string(&default_catalog()).unwrap();
        file.write_all(raw.as_bytes()).unwrap();

        let catalog = load_catalog(file.path()).unwrap();
        assert_eq!(catalog, default_catalog());
    }

    #[test]
    fn test_missing_file() {
        let result = load_catalog(Path::new("/nonexistent/catalog.json"));
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }
}
