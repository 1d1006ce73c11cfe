
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CurrencyError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeConfig,
}

/// Currency bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Reject an empty currency code in symbol lookup as well as in formatting.
    /// Off by default: symbol lookup historically passes it to the native side.
    #[serde(default)]
    pub validate_symbol_code: bool,
    /// Deadline for the async entry points. 0 = no deadline.
    #[serde(default)]
    pub timeout_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            validate_symbol_code: false,
            timeout_ms: 0,
            log_level: default_log_level(),
        }
    }
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, CurrencyError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CurrencyError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}

fn default_log_level() -> String {
    "info".to_string()
}
