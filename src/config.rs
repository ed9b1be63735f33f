//! Configuration loading.
//!
//! Values resolve in this order, later sources winning: built-in defaults, the YAML
//! config file, environment variables, then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_API_ENDPOINT: &str = "API_ENDPOINT";
pub const ENV_REQUEST_TIMEOUT: &str = "TODO_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("api endpoint must not be empty")]
    EmptyEndpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the todo service, e.g. `http://localhost:8080`.
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Per-request timeout. `None` waits indefinitely.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: Option<u64>,

    /// How long a notification stays on screen.
    #[serde(default = "default_toast_millis")]
    pub toast_millis: u64,

    /// Where the log file goes. Defaults to the platform data directory.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_endpoint: default_api_endpoint(),
            request_timeout_secs: default_request_timeout(),
            toast_millis: default_toast_millis(),
            log_dir: None,
        }
    }
}

fn default_api_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> Option<u64> {
    Some(30)
}

fn default_toast_millis() -> u64 {
    1000
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Default config file location, `<config_dir>/todo-list/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("todo-list").join("config.yaml"))
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit `path` must exist. The default location is optional.
    pub fn resolve(path: Option<&Path>, api_override: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::load(default)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        if let Some(api) = api_override {
            config.api_endpoint = api.to_string();
        }
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment values. `lookup` is injected so tests do not touch the
    /// process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_API_ENDPOINT) {
            self.api_endpoint = endpoint;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_REQUEST_TIMEOUT,
                value: raw.clone(),
            })?;
            // 0 disables the timeout
            self.request_timeout_secs = (secs > 0).then_some(secs);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn toast_lifetime(&self) -> Duration {
        Duration::from_millis(self.toast_millis)
    }

    /// Effective log directory, `<data_local_dir>/todo-list/logs` unless configured.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("todo-list")
                .join("logs")
        })
    }
}
