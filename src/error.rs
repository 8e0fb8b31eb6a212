//! Error taxonomy for the uploader.
//!
//! Config and startup problems are resolved before any upload begins; plan
//! and transport problems are isolated to the single file that caused them.

use std::path::PathBuf;

use thiserror::Error;

/// Problems with the `pantheon2.yml` configuration. Absence of the file is
/// not an error and is modelled as `Ok(None)` by the loader.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid wildcard pattern {pattern:?}: {source}")]
    BadPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("failed to read config file {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config YAML: {0}")]
    Invalid(#[from] serde_yaml::Error),
}

/// Fatal conditions detected before any upload. These abort the whole run.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("server {0} is not reachable")]
    Unreachable(String),

    #[error("repository is not set")]
    MissingRepository,

    #[error("attributes: {0} does not exist")]
    MissingAttributeFile(String),
}

/// Per-file planning failures. The affected file is skipped with a message;
/// the run continues.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("{} lies under a hidden directory and was skipped", .path.display())]
    Structural { path: PathBuf },

    #[error("absolute symlink paths are unsupported: {} -> {target}", .path.display())]
    Resource { path: PathBuf, target: String },
}

/// Network-level failures during a single upload. Mapped to a synthetic
/// outcome and reported like any non-2xx response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport failure: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport failure: {0}")]
    Other(String),
}
