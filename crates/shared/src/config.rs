//! Application configuration management.

use serde::Deserialize;

use crate::types::money::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Purchasing engine configuration.
    #[serde(default)]
    pub purchasing: PurchasingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Purchasing engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchasingConfig {
    /// Prefix of generated purchase entry codes.
    #[serde(default = "default_code_prefix")]
    pub code_prefix: String,
    /// Zero-padded width of the numeric part of a code.
    #[serde(default = "default_code_width")]
    pub code_width: usize,
    /// Currency assigned to entries created without one.
    #[serde(default = "default_currency")]
    pub default_currency: Currency,
}

fn default_code_prefix() -> String {
    "PUR".to_string()
}

fn default_code_width() -> usize {
    6
}

fn default_currency() -> Currency {
    Currency::Usd
}

impl Default for PurchasingConfig {
    fn default() -> Self {
        Self {
            code_prefix: default_code_prefix(),
            code_width: default_code_width(),
            default_currency: default_currency(),
        }
    }
}

impl PurchasingConfig {
    /// Formats the human-readable code for the given sequence number.
    #[must_use]
    pub fn format_code(&self, sequence: u64) -> String {
        format!(
            "{}-{:0width$}",
            self.code_prefix,
            sequence,
            width = self.code_width
        )
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PROCURA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
