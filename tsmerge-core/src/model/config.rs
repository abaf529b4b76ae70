use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, Result};

pub const CONFIG_ENV: &str = "TSMERGE_CONFIG";

fn default_encoding() -> String {
    "UTF-8".to_string()
}

fn default_source_locale() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

/// Adapter settings. Every field has a default so partial JSON is accepted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Encoding label of raw input, or `auto` to detect it.
    #[serde(default = "default_encoding")]
    pub encoding: String,

    #[serde(default = "default_source_locale", alias = "source_lang")]
    pub default_source_locale: String,

    #[serde(default)]
    pub sub_doc_name: String,

    #[serde(default = "default_true")]
    pub allow_empty_targets: bool,

    #[serde(default)]
    pub approved_only: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            encoding: default_encoding(),
            default_source_locale: default_source_locale(),
            sub_doc_name: String::new(),
            allow_empty_targets: true,
            approved_only: false,
        }
    }
}

impl AdapterConfig {
    pub fn load(path: &Path) -> Result<AdapterConfig> {
        if !path.exists() {
            return Ok(AdapterConfig::default());
        }

        let data = fs::read_to_string(path)
            .map_err(|e| AdapterError::io(format!("failed to read {}", path.display()), e))?;

        serde_json::from_str(&data)
            .map_err(|e| AdapterError::Config(format!("invalid {}: {e}", path.display())))
    }

    /// Reads the file named by `TSMERGE_CONFIG`, falling back to defaults.
    pub fn from_env() -> Result<AdapterConfig> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => AdapterConfig::load(Path::new(path.trim())),
            _ => Ok(AdapterConfig::default()),
        }
    }
}
