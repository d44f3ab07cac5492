//! Configuration management module.
//!
//! Supports loading configuration from:
//! - TOML files (config/default.toml, config/{profile}.toml)
//! - Environment variables with `NOID__<SECTION>__<KEY>` pattern
//!
//! [`settings`] turns a loaded configuration into the process-wide settings
//! the rest of the crate reads.

mod minter;
mod repository;
pub mod settings;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use minter::{MinterConfig, StateBackend};
pub use repository::{DIGEST_HEX_LEN, RepositoryConfig, TreeifyConfig};
pub use settings::{Settings, SettingsBuilder};

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Minter template and state location.
    #[serde(default)]
    pub minter: MinterConfig,

    /// Repository host and base path.
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Path bucketing.
    #[serde(default)]
    pub treeify: TreeifyConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from files and environment.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. `config/default.toml`
    /// 2. `config/{NOID_PROFILE}.toml` (if `NOID_PROFILE` is set)
    /// 3. Environment variables with `NOID__` prefix
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let profile = std::env::var("NOID_PROFILE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{profile}")).required(false))
            // NOID__MINTER__TEMPLATE=.sddk -> minter.template = ".sddk"
            .add_source(
                Environment::with_prefix("NOID")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first section that fails validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.minter.validate()?;
        self.repository.validate()?;
        self.treeify.validate()?;

        if !matches!(self.observability.log_format.as_str(), "text" | "json") {
            return Err(ConfigError::Message(format!(
                "observability.log_format must be \"text\" or \"json\", got {:?}",
                self.observability.log_format
            )));
        }

        Ok(())
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}
