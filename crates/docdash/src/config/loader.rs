use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::config::{ClientConfig, API_URL_ENV};
use crate::error::ConfigError;

/// Lower bound on the poll interval so a typo cannot hammer the service.
const MIN_POLL_INTERVAL_MS: u64 = 250;

/// On-disk JSON settings. Every key is optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub recent_limit: Option<usize>,
}

impl ClientConfig {
    /// Builds a config from defaults plus the `DOCDASH_API_URL` environment variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(ConfigFile::default(), env_base_url()?)
    }

    /// Loads a config file (if given) and applies the environment override.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => load_config(path)?,
            None => ConfigFile::default(),
        };
        Self::resolve(file, env_base_url()?)
    }

    fn resolve(file: ConfigFile, env_url: Option<String>) -> Result<Self, ConfigError> {
        let defaults = ClientConfig::default();

        let base_url = env_url
            .or(file.base_url)
            .unwrap_or(defaults.base_url);
        let base_url = normalize_base_url(&base_url)?;

        let poll_interval = match file.poll_interval_ms {
            Some(ms) if ms < MIN_POLL_INTERVAL_MS => {
                return Err(ConfigError::Validation {
                    message: format!(
                        "pollIntervalMs must be at least {}, got {}",
                        MIN_POLL_INTERVAL_MS, ms
                    ),
                });
            }
            Some(ms) => Duration::from_millis(ms),
            None => defaults.poll_interval,
        };

        let recent_limit = file.recent_limit.unwrap_or(defaults.recent_limit);

        Ok(Self {
            base_url,
            poll_interval,
            recent_limit,
        })
    }
}

fn env_base_url() -> Result<Option<String>, ConfigError> {
    match std::env::var(API_URL_ENV) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::Validation {
            message: format!("Environment variable '{}' contains invalid UTF-8", API_URL_ENV),
        }),
    }
}

fn normalize_base_url(url: &str) -> Result<String, ConfigError> {
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::Validation {
            message: format!("Base URL must start with http:// or https://, got '{}'", url),
        });
    }
    Ok(url.to_string())
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ConfigFile, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<ConfigFile, ConfigError> {
    let file: ConfigFile = serde_json::from_str(content)?;
    Ok(file)
}
