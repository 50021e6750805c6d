/// Configuration for a `Document`
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the path proxy every document creates
pub const PATH_PROXY: &str = "path";

/// Default hard bound on parent-chain traversal in `root()`
const DEFAULT_MAX_PARENT_DEPTH: usize = 4096;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse document config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid document config: {0}")]
    Invalid(String),
}

/// Per-document settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Maximum number of parent hops `root()` follows before failing
    pub max_parent_depth: usize,

    /// Accept undeclared properties at construction as transient display fields
    pub allow_transient_properties: bool,

    /// Additional named path proxies created alongside `"path"`
    pub extra_proxies: Vec<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_parent_depth: DEFAULT_MAX_PARENT_DEPTH,
            allow_transient_properties: true,
            extra_proxies: Vec::new(),
        }
    }
}

impl DocumentConfig {
    /// Parse and validate a JSON config; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parent_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_parent_depth must be greater than 0".to_string(),
            ));
        }

        for (i, name) in self.extra_proxies.iter().enumerate() {
            if name.is_empty() {
                return Err(ConfigError::Invalid(
                    "proxy names cannot be empty".to_string(),
                ));
            }
            if name == PATH_PROXY {
                return Err(ConfigError::Invalid(format!(
                    "'{}' proxy always exists and cannot be listed again",
                    PATH_PROXY
                )));
            }
            if self.extra_proxies[..i].contains(name) {
                return Err(ConfigError::Invalid(format!(
                    "proxy '{}' is listed twice",
                    name
                )));
            }
        }

        Ok(())
    }
}
