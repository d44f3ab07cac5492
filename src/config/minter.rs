//! Minter configuration.

use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;

use crate::domain::Template;

/// State storage backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    /// JSON state file (survives restarts).
    #[default]
    File,
    /// Process memory (lost on exit).
    Memory,
}

impl std::fmt::Display for StateBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Minter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MinterConfig {
    /// NOID template.
    #[serde(default = "default_template")]
    pub template: String,

    /// State file location (file backend).
    #[serde(default = "default_statefile")]
    pub statefile: PathBuf,

    /// State storage backend.
    #[serde(default)]
    pub backend: StateBackend,
}

/// Default template: random order, eight mixed digits, check character.
fn default_template() -> String {
    ".reeddeeddk".to_string()
}

fn default_statefile() -> PathBuf {
    PathBuf::from("/tmp/minter-state")
}

impl MinterConfig {
    /// Validate the minter configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the template does not parse or the state file path
    /// is empty while the file backend is selected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Template::parse(&self.template)
            .map_err(|e| ConfigError::Message(format!("minter.template: {e}")))?;

        if self.backend == StateBackend::File && self.statefile.as_os_str().is_empty() {
            return Err(ConfigError::Message(
                "minter.statefile cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for MinterConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            statefile: default_statefile(),
            backend: StateBackend::File,
        }
    }
}
