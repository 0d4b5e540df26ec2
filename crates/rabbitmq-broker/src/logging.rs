//! Logging setup
//!
//! `RUST_LOG` takes precedence over the command-line switches when set.

use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::api::REQUEST_TARGET;
use crate::config::LoggingConfig;

/// Target of the management API client's request tracing
const ADMIN_TARGET: &str = "broker_admin";

/// Filter directives derived from the logging switches
pub fn filter_directives(config: &LoggingConfig) -> String {
    let mut directives = vec![if config.debug { "debug" } else { "info" }.to_string()];
    if config.trace_requests {
        directives.push(format!("{}=debug", REQUEST_TARGET));
    }
    if config.trace_admin {
        directives.push(format!("{}=debug", ADMIN_TARGET));
    }
    directives.join(",")
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(config))?,
    };

    let (writer, ansi) = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Arc::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(filter_directives(&LoggingConfig::default()), "info");
    }

    #[test]
    fn test_trace_switches() {
        let config = LoggingConfig {
            debug: true,
            trace_requests: true,
            trace_admin: true,
            ..Default::default()
        };
        assert_eq!(
            filter_directives(&config),
            "debug,broker::requests=debug,broker_admin=debug"
        );
    }
}
