//! Client configuration loaded from environment variables.
//!
//! - `CAMPEASE_API_URL` - base URL of the REST API (default: http://localhost:5000)
//! - `CAMPEASE_STORAGE_DIR` - directory for the persisted session
//!   (default: `<data dir>/campease`)

use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("could not resolve a data directory; set CAMPEASE_STORAGE_DIR")]
    NoDataDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub storage_dir: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = lookup("CAMPEASE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidEnvVar(
                "CAMPEASE_API_URL".to_string(),
                "must start with http:// or https://".to_string(),
            ));
        }

        let storage_dir = match lookup("CAMPEASE_STORAGE_DIR") {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_storage_dir().ok_or(ConfigError::NoDataDir)?,
        };

        Ok(Self {
            api_base_url,
            storage_dir,
        })
    }
}

fn default_storage_dir() -> Option<PathBuf> {
    let base = dirs::data_dir().or_else(|| {
        dirs::home_dir().map(|mut h| {
            h.push(".local");
            h.push("share");
            h
        })
    })?;
    Some(base.join("campease"))
}
