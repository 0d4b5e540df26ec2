//! Configuration for the broker
//!
//! Command-line arguments with environment variable fallbacks, parsed once at
//! startup into an immutable [`BrokerConfig`].

use clap::{ArgAction, Args as ClapArgs, Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use broker_core::{DeterministicGenerator, RandomGenerator, SecretGenerator};

use crate::service::RabbitSettings;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How secrets of provisioned users are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CredentialStrategy {
    /// Digest of the instance/binding identifiers (and salt)
    Deterministic,
    /// Fresh random bytes for every user
    Random,
}

/// RabbitMQ Service Broker
#[derive(Parser, Debug, Clone)]
#[command(name = "rabbitmq-broker")]
#[command(about = "Service broker provisioning RabbitMQ virtual hosts")]
#[command(version, disable_version_flag = true)]
pub struct Args {
    /// Bind to HOST address
    #[arg(long, env = "BROKER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listen on PORT
    #[arg(long, env = "BROKER_PORT", default_value_t = 9999)]
    pub port: u16,

    /// User required to authenticate requests
    #[arg(long, env = "BROKER_USER", default_value = "admin")]
    pub user: String,

    /// Password for the broker user
    #[arg(long, env = "BROKER_PASS", default_value = "secret", hide_env_values = true)]
    pub pass: String,

    /// File to load the broker's catalog from
    #[arg(long, env = "BROKER_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Enable debugging output
    #[arg(short = 'D', long, env = "BROKER_DEBUG")]
    pub debug: bool,

    /// File to redirect log output to
    #[arg(short = 'L', long, env = "BROKER_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Trace the incoming service broker HTTP requests
    #[arg(short = 'V', long, env = "BROKER_TRACE")]
    pub trace_requests: bool,

    /// File to store the broker's PID in
    #[arg(short = 'P', long, env = "BROKER_PID_FILE")]
    pub pid_file: Option<PathBuf>,

    /// Credential generation strategy
    #[arg(long, env = "BROKER_CREDENTIALS", value_enum, default_value_t = CredentialStrategy::Deterministic)]
    pub credential_strategy: CredentialStrategy,

    /// Secret mixed into deterministic credentials
    #[arg(long, env = "BROKER_CREDENTIAL_SALT", default_value = "", hide_env_values = true)]
    pub credential_salt: String,

    /// RabbitMQ configuration
    #[command(flatten)]
    pub rabbit: RabbitArgs,

    /// Show the broker version
    #[arg(long, action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,
}

/// RabbitMQ server arguments
#[derive(ClapArgs, Debug, Clone)]
pub struct RabbitArgs {
    /// Hostname of the RabbitMQ server
    #[arg(long = "rabbit-host", env = "RABBIT_HOST", default_value = "127.0.0.1")]
    pub rabbit_host: String,

    /// Port on which the RabbitMQ server listens for messages
    #[arg(long = "rabbit-port", env = "RABBIT_PORT", default_value_t = 5672)]
    pub rabbit_port: u16,

    /// Scheme of the RabbitMQ management API
    #[arg(long = "rabbit-mgmt-scheme", env = "RABBIT_MGMT_SCHEME", default_value = "http")]
    pub mgmt_scheme: String,

    /// Hostname of the management API (defaults to --rabbit-host)
    #[arg(long = "rabbit-mgmt-host", env = "RABBIT_MGMT_HOST")]
    pub mgmt_host: Option<String>,

    /// Port on which the RabbitMQ server listens for management requests
    #[arg(long = "rabbit-mgmt-port", env = "RABBIT_MGMT_PORT", default_value_t = 15672)]
    pub mgmt_port: u16,

    /// RabbitMQ user with the 'administrator' tag
    #[arg(long = "rabbit-user", env = "RABBIT_USER", default_value = "guest")]
    pub rabbit_user: String,

    /// Password for the RabbitMQ administrator
    #[arg(long = "rabbit-pass", env = "RABBIT_PASS", default_value = "guest", hide_env_values = true)]
    pub rabbit_pass: String,

    /// Trace the outgoing RabbitMQ management requests
    #[arg(short = 'R', long = "trace-admin", env = "RABBIT_TRACE")]
    pub trace_admin: bool,

    /// Enable message tracing on provisioned vhosts
    #[arg(long = "vhost-tracing", env = "RABBIT_VHOST_TRACING")]
    pub vhost_tracing: bool,

    /// Timeout of management API calls, in seconds
    #[arg(long = "admin-timeout-secs", env = "RABBIT_ADMIN_TIMEOUT", default_value_t = 10)]
    pub admin_timeout_secs: u64,
}

/// Username/password the platform must present
#[derive(Clone, PartialEq, Eq)]
pub struct BrokerCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BrokerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Logging settings
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub debug: bool,
    pub log_file: Option<PathBuf>,
    pub trace_requests: bool,
    pub trace_admin: bool,
}

/// RabbitMQ connection settings
#[derive(Clone)]
pub struct RabbitConfig {
    pub host: String,
    pub port: u16,
    pub mgmt_scheme: String,
    pub mgmt_host: String,
    pub mgmt_port: u16,
    pub user: String,
    pub pass: String,
    pub vhost_tracing: bool,
    pub admin_timeout: Duration,
}

impl fmt::Debug for RabbitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RabbitConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("management_url", &self.management_url())
            .field("user", &self.user)
            .field("vhost_tracing", &self.vhost_tracing)
            .field("admin_timeout", &self.admin_timeout)
            .finish()
    }
}

impl RabbitConfig {
    /// Base URL of the management API
    pub fn management_url(&self) -> String {
        format!("{}://{}:{}", self.mgmt_scheme, self.mgmt_host, self.mgmt_port)
    }

    /// Settings used to build URLs handed to clients
    pub fn settings(&self) -> RabbitSettings {
        RabbitSettings {
            host: self.host.clone(),
            port: self.port,
            management_scheme: self.mgmt_scheme.clone(),
            management_host: self.mgmt_host.clone(),
            management_port: self.mgmt_port,
            vhost_tracing: self.vhost_tracing,
        }
    }
}

/// Credential generation settings
#[derive(Clone)]
pub struct CredentialConfig {
    pub strategy: CredentialStrategy,
    pub salt: String,
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("strategy", &self.strategy)
            .field("salted", &!self.salt.is_empty())
            .finish()
    }
}

impl CredentialConfig {
    /// Build the configured secret generator
    pub fn generator(&self) -> Arc<dyn SecretGenerator> {
        match self.strategy {
            CredentialStrategy::Deterministic => {
                Arc::new(DeterministicGenerator::with_salt(&self.salt))
            }
            CredentialStrategy::Random => Arc::new(RandomGenerator::new()),
        }
    }
}

/// Immutable broker configuration
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub auth: BrokerCredentials,
    pub catalog_path: Option<PathBuf>,
    pub pid_file: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub rabbit: RabbitConfig,
    pub credentials: CredentialConfig,
}

impl BrokerConfig {
    /// Address the HTTP server binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Args {
    /// Validate arguments and build the configuration
    pub fn into_config(self) -> Result<BrokerConfig, ConfigError> {
        if self.user.is_empty() || self.pass.is_empty() {
            return Err(ConfigError::Invalid(
                "broker user and password must not be empty".into(),
            ));
        }
        if self.user.contains(':') {
            return Err(ConfigError::Invalid(
                "broker user must not contain ':'".into(),
            ));
        }
        if self.rabbit.admin_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "admin timeout must be at least one second".into(),
            ));
        }
        if !matches!(self.rabbit.mgmt_scheme.as_str(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "unsupported management scheme '{}'",
                self.rabbit.mgmt_scheme
            )));
        }

        let mgmt_host = self
            .rabbit
            .mgmt_host
            .unwrap_or_else(|| self.rabbit.rabbit_host.clone());

        Ok(BrokerConfig {
            host: self.host,
            port: self.port,
            auth: BrokerCredentials {
                username: self.user,
                password: self.pass,
            },
            catalog_path: self.catalog,
            pid_file: self.pid_file,
            logging: LoggingConfig {
                debug: self.debug,
                log_file: self.log_file,
                trace_requests: self.trace_requests,
                trace_admin: self.rabbit.trace_admin,
            },
            rabbit: RabbitConfig {
                host: self.rabbit.rabbit_host,
                port: self.rabbit.rabbit_port,
                mgmt_scheme: self.rabbit.mgmt_scheme,
                mgmt_host,
                mgmt_port: self.rabbit.mgmt_port,
                user: self.rabbit.rabbit_user,
                pass: self.rabbit.rabbit_pass,
                vhost_tracing: self.rabbit.vhost_tracing,
                admin_timeout: Duration::from_secs(self.rabbit.admin_timeout_secs),
            },
            credentials: CredentialConfig {
                strategy: self.credential_strategy,
                salt: self.credential_salt,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<BrokerConfig, ConfigError> {
        let mut argv = vec!["rabbitmq-broker"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap().into_config()
    }

    #[test]
    fn test_short_flags() {
        let config = parse(&["-D", "-V", "-R", "-L", "/tmp/broker.log", "-P", "/tmp/broker.pid"]).unwrap();

        assert!(config.logging.debug);
        assert!(config.logging.trace_requests);
        assert!(config.logging.trace_admin);
        assert_eq!(config.logging.log_file, Some(PathBuf::from("/tmp/broker.log")));
        assert_eq!(config.pid_file, Some(PathBuf::from("/tmp/broker.pid")));
    }

    #[test]
    fn test_broker_and_rabbit_settings_stay_separate() {
        let config = parse(&[
            "--host", "10.0.0.1",
            "--port", "8080",
            "--user", "platform",
            "--pass", "platform-secret",
            "--rabbit-host", "mq.internal",
            "--rabbit-port", "5671",
            "--rabbit-user", "rabbit-admin",
            "--rabbit-pass", "rabbit-secret",
        ])
        .unwrap();

        assert_eq!(config.listen_addr(), "10.0.0.1:8080");
        assert_eq!(config.auth.username, "platform");
        assert_eq!(config.auth.password, "platform-secret");
        assert_eq!(config.rabbit.host, "mq.internal");
        assert_eq!(config.rabbit.port, 5671);
        assert_eq!(config.rabbit.user, "rabbit-admin");
        assert_eq!(config.rabbit.pass, "rabbit-secret");
    }

    #[test]
    fn test_argument_definitions_are_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_management_host_falls_back_to_rabbit_host() {
        let config = parse(&["--rabbit-host", "mq.internal", "--rabbit-mgmt-port", "15671"]).unwrap();
        assert_eq!(config.rabbit.management_url(), "http://mq.internal:15671");

        let config = parse(&[
            "--rabbit-host",
            "mq.internal",
            "--rabbit-mgmt-host",
            "console.internal",
            "--rabbit-mgmt-scheme",
            "https",
        ])
        .unwrap();
        assert_eq!(config.rabbit.management_url(), "https://console.internal:15672");
        assert_eq!(config.rabbit.settings().host, "mq.internal");
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(parse(&["--user", ""]).is_err());
        assert!(parse(&["--user", "a:b"]).is_err());
        assert!(parse(&["--admin-timeout-secs", "0"]).is_err());
        assert!(parse(&["--rabbit-mgmt-scheme", "ftp"]).is_err());
    }

    #[test]
    fn test_credential_strategy() {
        let config = parse(&["--credential-strategy", "random"]).unwrap();
        assert_eq!(config.credentials.strategy, CredentialStrategy::Random);
        assert!(!config.credentials.generator().is_deterministic());

        let config = parse(&["--credential-strategy", "deterministic", "--credential-salt", "pepper"]).unwrap();
        assert!(config.credentials.generator().is_deterministic());
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let config = parse(&["--pass", "hunter2", "--rabbit-pass", "rabbit-secret", "--credential-salt", "pepper"]).unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("rabbit-secret"));
        assert!(!debug.contains("pepper"));
    }
}
