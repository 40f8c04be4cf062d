use std::path::PathBuf;

use thiserror::Error;

/// Why a single result artifact could not be turned into a record.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Display omits `path`; callers prefix it.
    #[error("failed to read file: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid result JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures talking to the generative-text service.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("insight client is disabled")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid service URL: {0}")]
    InvalidUrl(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("no models support generateContent for this key")]
    NoModels,

    #[error("empty response: {0}")]
    EmptyResponse(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
