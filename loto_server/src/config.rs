//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use loto::{DEFAULT_NOTABLE_PURCHASE, DEFAULT_STARTING_BALANCE, table::TableConfig};
use std::net::SocketAddr;

/// Default HTTP/WebSocket bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Shortest accepted host secret
pub const MIN_HOST_SECRET_LENGTH: usize = 8;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus listener, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// The one table this server hosts
    pub table: TableConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `metrics_bind_override` - Optional metrics address override (from CLI args)
    /// * `seed_override` - Optional RNG seed override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        metrics_bind_override: Option<SocketAddr>,
        seed_override: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_required_or("SERVER_BIND", DEFAULT_BIND)?,
        };

        let metrics_bind = match metrics_bind_override {
            Some(addr) => Some(addr),
            None => parse_env_optional("METRICS_BIND")?,
        };

        // Host secret (REQUIRED)
        let host_secret =
            std::env::var("LOTO_HOST_SECRET").map_err(|_| ConfigError::MissingRequired {
                var: "LOTO_HOST_SECRET".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let rng_seed = match seed_override {
            Some(seed) => Some(seed),
            None => parse_env_optional("LOTO_RNG_SEED")?,
        };

        let defaults = TableConfig::default();
        let table = TableConfig {
            name: std::env::var("LOTO_TABLE_NAME").unwrap_or(defaults.name),
            starting_balance: parse_env_or("LOTO_STARTING_BALANCE", DEFAULT_STARTING_BALANCE),
            host_secret: Some(host_secret),
            notable_purchase: parse_env_or("LOTO_NOTABLE_PURCHASE", DEFAULT_NOTABLE_PURCHASE),
            inbox_capacity: defaults.inbox_capacity,
            subscriber_buffer: defaults.subscriber_buffer,
            rng_seed,
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            table,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secret_length = self
            .table
            .host_secret
            .as_deref()
            .map_or(0, |s| s.chars().count());
        if secret_length < MIN_HOST_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                var: "LOTO_HOST_SECRET".to_string(),
                reason: format!("Must be at least {MIN_HOST_SECRET_LENGTH} characters"),
            });
        }

        if self.table.starting_balance < 0 {
            return Err(ConfigError::Invalid {
                var: "LOTO_STARTING_BALANCE".to_string(),
                reason: "Cannot be negative".to_string(),
            });
        }

        if self.table.notable_purchase < 0 {
            return Err(ConfigError::Invalid {
                var: "LOTO_NOTABLE_PURCHASE".to_string(),
                reason: "Cannot be negative".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server address ({})", self.bind),
            });
        }

        self.table.validate().map_err(|reason| ConfigError::Invalid {
            var: "table".to_string(),
            reason,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse a variable that may be unset but must be well-formed when present
fn parse_env_optional<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Cannot parse '{value}'"),
        }),
        Err(_) => Ok(None),
    }
}

fn parse_env_required_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("Cannot parse '{value}'"),
    })
}
