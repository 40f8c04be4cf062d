use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::diagnostics::Diagnostics;
use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "report-lens.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub insight: InsightConfig,
}

/// Where the test suite leaves its artifacts.
#[derive(Debug, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the Allure `*-result.json` files.
    #[serde(default = "default_results")]
    pub results: PathBuf,
    /// Directory holding the recorded test videos.
    #[serde(default = "default_videos")]
    pub videos: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            results: default_results(),
            videos: default_videos(),
        }
    }
}

/// Settings for the generative-text service.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightConfig {
    /// Model used when the key has access to it; otherwise the first listed
    /// model that supports content generation is used.
    #[serde(default = "default_model")]
    pub preferred_model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout. Unset means no timeout.
    pub timeout_secs: Option<u64>,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            preferred_model: default_model(),
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

fn default_results() -> PathBuf {
    PathBuf::from("reports/allure-results")
}

fn default_videos() -> PathBuf {
    PathBuf::from("videos")
}

fn default_model() -> String {
    "gemini-pro".into()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}

impl Config {
    /// Load `report-lens.toml` from `dir`, falling back to defaults if absent
    /// or invalid. An unreadable or malformed file is reported to `diagnostics`.
    pub fn load(dir: &Path, diagnostics: &Diagnostics) -> Self {
        let path = dir.join(CONFIG_FILE);
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(ConfigError::Read { ref source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Self::default()
            }
            Err(e) => {
                diagnostics.warn(format!("{}; using defaults", e));
                Self::default()
            }
        }
    }

    /// Load an explicitly named config file. Unlike [`Config::load`], a
    /// missing or malformed file is an error.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
