//! Application configuration loaded from environment variables.

use std::time::Duration;

use fulfillment::{DEFAULT_SYNC_TIMEOUT, SyncMode};
use thiserror::Error;

/// A configuration variable holds a value that cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid value for {name}: {value:?} ({reason})")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
    pub reason: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL`: PostgreSQL URL; unset runs on the in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `SYNC_TIMEOUT_MS`: bound on each downstream sync (default: `10000`)
/// - `SYNC_MODE`: `inline` or `detached` (default: `inline`)
/// - `POS_TAX_RATE_BPS`: terminal sales tax in basis points (default: `0`)
/// - `MARKETING_WEBHOOK_URL`, `ACCOUNTING_WEBHOOK_URL`, `SHIPPING_WEBHOOK_URL`:
///   downstream endpoints; unset targets use a recording client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub sync_timeout: Duration,
    pub sync_mode: SyncMode,
    pub pos_tax_rate_bps: u32,
    pub marketing_webhook_url: Option<String>,
    pub accounting_webhook_url: Option<String>,
    pub shipping_webhook_url: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parse(&var, "PORT")?.unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match var("LOG_FORMAT") {
                None => defaults.log_format,
                Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                Some(v) if v.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
                Some(v) => {
                    return Err(ConfigError {
                        name: "LOG_FORMAT",
                        value: v,
                        reason: "expected pretty or json".to_string(),
                    });
                }
            },
            database_url: var("DATABASE_URL"),
            database_max_connections: parse(&var, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.database_max_connections),
            sync_timeout: parse::<u64>(&var, "SYNC_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.sync_timeout),
            sync_mode: parse(&var, "SYNC_MODE")?.unwrap_or(defaults.sync_mode),
            pos_tax_rate_bps: parse(&var, "POS_TAX_RATE_BPS")?.unwrap_or(defaults.pos_tax_rate_bps),
            marketing_webhook_url: var("MARKETING_WEBHOOK_URL"),
            accounting_webhook_url: var("ACCOUNTING_WEBHOOK_URL"),
            shipping_webhook_url: var("SHIPPING_WEBHOOK_URL"),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(var: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|value| {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError {
                name,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            database_max_connections: 5,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            sync_mode: SyncMode::Inline,
            pos_tax_rate_bps: 0,
            marketing_webhook_url: None,
            accounting_webhook_url: None,
            shipping_webhook_url: None,
        }
    }
}
