//! API key resolution for the insight client.
//!
//! The environment is consulted first; the git-ignored local file is a
//! development fallback that CI never has. The caller composes the two.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::diagnostics::Diagnostics;
use crate::error::ConfigError;

pub const ENV_VAR: &str = "GOOGLE_API_KEY";
pub const LOCAL_CONFIG_FILE: &str = "report-lens.local.toml";

/// Value shipped in the local config template; treated as unset.
pub const PLACEHOLDER: &str = "YOUR_GEMINI_API_KEY_HERE";

#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw key, rejecting blanks and the template placeholder.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let key = raw.trim();
        if key.is_empty() || key == PLACEHOLDER {
            return None;
        }
        Some(Self(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

// Keep the key out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Deserialize)]
struct LocalConfig {
    google_api_key: Option<String>,
}

/// Look the key up through `lookup`, normally `std::env::var`.
pub fn from_env<F>(lookup: F) -> Option<Credential>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(ENV_VAR).and_then(Credential::new)
}

/// Read `google_api_key` from a local TOML file. A missing file is `Ok(None)`.
pub fn from_local_config(path: &Path) -> Result<Option<Credential>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let local: LocalConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(local.google_api_key.and_then(Credential::new))
}

/// Environment first, then the local file. Problems reading the local file
/// are reported to `diagnostics` and treated as "no credential".
pub fn resolve<F>(lookup: F, local_config: &Path, diagnostics: &Diagnostics) -> Option<Credential>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(credential) = from_env(lookup) {
        return Some(credential);
    }

    match from_local_config(local_config) {
        Ok(Some(credential)) => Some(credential),
        Ok(None) => {
            diagnostics.info(format!(
                "{} not set and {} has no key; expected in CI",
                ENV_VAR,
                local_config.display()
            ));
            None
        }
        Err(e) => {
            diagnostics.warn(e.to_string());
            None
        }
    }
}
