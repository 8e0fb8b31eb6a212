//! `pantheon2.yml` loading.
//!
//! The only place where untrusted YAML is parsed into typed structs. A
//! missing config file is an expected outcome (`Ok(None)`): the run degrades
//! to treating everything as resources, with a warning. Unreadable or
//! unparsable files are [`ConfigError`]s.

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Reserved config file name, looked up in the target directory and never
/// scanned for upload.
pub const CONFIG_FILE: &str = "pantheon2.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: Option<String>,
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub name: String,
    /// Relative path of the attribute file, appended to the resource
    /// patterns before classification.
    pub attributes: Option<String>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
}

/// Loads `pantheon2.yml` from `directory`. Absence is not an error.
pub fn load_config(directory: &Path) -> Result<Option<Config>, ConfigError> {
    let path = directory.join(CONFIG_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(
                "Could not find a valid config file ({CONFIG_FILE}) in this directory; \
                 all files will be treated as resource uploads."
            );
            return Ok(None);
        }
        Err(source) => return Err(ConfigError::Unreadable { path, source }),
    };

    let config: Config = serde_yaml::from_str(&content)?;
    debug!(path = %path.display(), repositories = config.repositories.len(), "parsed config");
    Ok(Some(config))
}
