//! Shell configuration loaded from environment variables.
//!
//! - `CAMPEASE_HOST` (default: 127.0.0.1)
//! - `CAMPEASE_PORT` (default: 8080)
//! - `CAMPEASE_JWT_SECRET` - HS256 secret; falls back to an insecure dev value
//! - `CAMPEASE_POLICY_PATH` - optional JSON route policy; the built-in
//!   CampEase tables are used otherwise

use std::path::PathBuf;

use campease_auth::{PolicyError, RoutePolicy};
use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("failed to read policy file {path}: {source}")]
    PolicyIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid policy file {path}: {source}")]
    Policy {
        path: PathBuf,
        #[source]
        source: PolicyError,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub policy_path: Option<PathBuf>,
}

impl std::fmt::Debug for ShellConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("policy_path", &self.policy_path)
            .finish()
    }
}

impl ShellConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("CAMPEASE_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = match lookup("CAMPEASE_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidEnvVar("CAMPEASE_PORT".to_string(), e.to_string()))?,
            None => 8080,
        };

        let jwt_secret = match lookup("CAMPEASE_JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("CAMPEASE_JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let policy_path = lookup("CAMPEASE_POLICY_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host,
            port,
            jwt_secret,
            policy_path,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured policy file, or the built-in CampEase tables.
    pub fn load_policy(&self) -> Result<RoutePolicy, ConfigError> {
        let Some(path) = &self.policy_path else {
            return Ok(RoutePolicy::campease());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::PolicyIo {
            path: path.clone(),
            source,
        })?;
        RoutePolicy::from_json(&raw).map_err(|source| ConfigError::Policy {
            path: path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = ShellConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(config.policy_path, None);
        assert_eq!(config.load_policy().unwrap(), RoutePolicy::campease());
    }

    #[test]
    fn rejects_bad_port() {
        let err = ShellConfig::from_lookup(|key| (key == "CAMPEASE_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref var, _) if var == "CAMPEASE_PORT"));
    }

    #[test]
    fn secret_is_redacted_in_debug() {
        let config = ShellConfig::from_lookup(|key| {
            (key == "CAMPEASE_JWT_SECRET").then(|| "hunter2".to_string())
        })
        .unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn loads_policy_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), RoutePolicy::campease().to_json().unwrap()).unwrap();

        let config = ShellConfig::from_lookup(|key| {
            (key == "CAMPEASE_POLICY_PATH").then(|| file.path().to_string_lossy().into_owned())
        })
        .unwrap();

        assert_eq!(config.load_policy().unwrap(), RoutePolicy::campease());
    }

    #[test]
    fn missing_policy_file_is_reported() {
        let config = ShellConfig::from_lookup(|key| {
            (key == "CAMPEASE_POLICY_PATH").then(|| "/nonexistent/campease/policy.json".to_string())
        })
        .unwrap();
        assert!(matches!(config.load_policy(), Err(ConfigError::PolicyIo { .. })));
    }
}
