//! Configuration types.
//!
//! Everything is read once at startup into an immutable [`IntakeConfig`];
//! components receive the parts they need at construction.

use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::channels::email::EmailConfig;
use crate::error::ConfigError;
use crate::intake::auth::AuthPolicy;
use crate::llm::LlmConfig;
use crate::pipeline::router::RoutingTable;

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub auth: AuthPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::from([0, 0, 0, 0]),
            port: 5000,
            auth: AuthPolicy::Permissive,
        }
    }
}

/// Background pipeline limits.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum pipeline runs executing at once.
    pub max_concurrent: usize,
    /// Upper bound on a single classification call.
    pub classify_timeout: Duration,
    /// How long shutdown waits for outstanding runs.
    pub shutdown_grace: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 16,
            classify_timeout: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub server: ServerConfig,
    pub email: EmailConfig,
    pub routing: RoutingTable,
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
}

impl IntakeConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_defaults = ServerConfig::default();
        let server = ServerConfig {
            bind: parse_or(&lookup, "INTAKE_BIND", server_defaults.bind)?,
            port: parse_or(&lookup, "PORT", server_defaults.port)?,
            auth: if parse_flag(&lookup, "INTAKE_REQUIRE_BEARER")? {
                AuthPolicy::RequireBearer
            } else {
                AuthPolicy::Permissive
            },
        };

        let pipeline_defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            max_concurrent: parse_or(
                &lookup,
                "MAX_CONCURRENT_PIPELINES",
                pipeline_defaults.max_concurrent,
            )?,
            classify_timeout: Duration::from_secs(parse_or(
                &lookup,
                "CLASSIFY_TIMEOUT_SECS",
                pipeline_defaults.classify_timeout.as_secs(),
            )?),
            shutdown_grace: Duration::from_secs(parse_or(
                &lookup,
                "SHUTDOWN_GRACE_SECS",
                pipeline_defaults.shutdown_grace.as_secs(),
            )?),
        };
        if pipeline.max_concurrent == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_CONCURRENT_PIPELINES".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let email = EmailConfig::from_lookup(&lookup)?;
        let routing = RoutingTable::from_lookup(&lookup, &email.sender_email)?;
        let llm = LlmConfig::from_lookup(&lookup)?;

        Ok(Self {
            server,
            email,
            routing,
            llm,
            pipeline,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw}: {e}"),
        }),
        None => Ok(default),
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool, ConfigError> {
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "" | "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{v}' is not a boolean"),
        }),
    }
}
