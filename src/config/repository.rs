//! Repository location and path bucketing configuration.

use config::ConfigError;
use serde::Deserialize;

/// Where objects live: URIs are `{host}{base_path}/...`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    /// Scheme, host and port, e.g. `http://localhost:8984`.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path prefix under the host, e.g. `/rest/prod`.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

fn default_host() -> String {
    "http://localhost:8984".to_string()
}

fn default_base_path() -> String {
    "/rest".to_string()
}

impl RepositoryConfig {
    /// Validate the repository configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is empty or the base path is not absolute.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Message(
                "repository.host cannot be empty".to_string(),
            ));
        }

        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(ConfigError::Message(
                "repository.base_path must start with '/'".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            base_path: default_base_path(),
        }
    }
}

/// Hash bucketing of identifiers into directory levels.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TreeifyConfig {
    /// Hex characters per path segment (fan-out is `16^segment_width`).
    #[serde(default = "default_segment_width")]
    pub segment_width: usize,

    /// Number of bucket levels above the identifier.
    #[serde(default = "default_depth")]
    pub depth: usize,
}

const fn default_segment_width() -> usize {
    1
}

const fn default_depth() -> usize {
    4
}

/// Hex characters in a SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

impl TreeifyConfig {
    /// Validate the bucketing configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the width is outside 1..=4, the depth is zero, or
    /// the segments need more characters than the digest has.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=4).contains(&self.segment_width) {
            return Err(ConfigError::Message(format!(
                "treeify.segment_width must be 1-4, got {}",
                self.segment_width
            )));
        }

        if self.depth == 0 {
            return Err(ConfigError::Message(
                "treeify.depth cannot be 0".to_string(),
            ));
        }

        if self.segment_width * self.depth > DIGEST_HEX_LEN {
            return Err(ConfigError::Message(format!(
                "treeify.segment_width * treeify.depth cannot exceed {DIGEST_HEX_LEN}"
            )));
        }

        Ok(())
    }
}

impl Default for TreeifyConfig {
    fn default() -> Self {
        Self {
            segment_width: default_segment_width(),
            depth: default_depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_treeify_bounds() {
        assert!(TreeifyConfig::default().validate().is_ok());
        assert!(TreeifyConfig { segment_width: 0, depth: 2 }.validate().is_err());
        assert!(TreeifyConfig { segment_width: 5, depth: 2 }.validate().is_err());
        assert!(TreeifyConfig { segment_width: 2, depth: 0 }.validate().is_err());
        assert!(TreeifyConfig { segment_width: 4, depth: 17 }.validate().is_err());
        assert!(TreeifyConfig { segment_width: 4, depth: 16 }.validate().is_ok());
    }

    #[test]
    fn test_repository_base_path() {
        let mut config = RepositoryConfig::default();
        assert!(config.validate().is_ok());

        config.base_path = String::new();
        assert!(config.validate().is_ok());

        config.base_path = "rest".to_string();
        assert!(config.validate().is_err());
    }
}
