//! Client settings: API endpoint, credentials and transfer tuning.
//!
//! Read from `<config_dir>/nimbus/config.toml` when present, then overridden by
//! `NIMBUS_API_URL` and `NIMBUS_TOKEN`. The client never writes this file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DeployError, Result};

pub const API_URL_ENV: &str = "NIMBUS_API_URL";
pub const TOKEN_ENV: &str = "NIMBUS_TOKEN";

/// Default number of concurrent transfers inside an upload batch
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
}

fn default_api_url() -> String {
    "https://api.nimbus.dev".to_string()
}

fn default_upload_concurrency() -> usize {
    DEFAULT_UPLOAD_CONCURRENCY
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
        }
    }
}

impl ClientSettings {
    /// Default settings file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("nimbus").join("config.toml"))
    }

    /// Load settings from the default location and the process environment.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        Self::load_from(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Load settings from an explicit file with a custom environment lookup.
    pub fn load_from<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    DeployError::Config(format!("failed to read {}: {}", path.display(), e))
                })?;
                toml::from_str(&content).map_err(|e| {
                    DeployError::Config(format!("invalid settings in {}: {}", path.display(), e))
                })?
            }
            _ => ClientSettings::default(),
        };

        if let Some(url) = env(API_URL_ENV).filter(|v| !v.is_empty()) {
            settings.api_url = url;
        }
        if let Some(token) = env(TOKEN_ENV).filter(|v| !v.is_empty()) {
            settings.token = Some(token);
        }
        if settings.upload_concurrency == 0 {
            settings.upload_concurrency = 1;
        }

        Ok(settings)
    }

    /// The API token, or a configuration error explaining how to provide one.
    pub fn require_token(&self) -> Result<&str> {
        self.token.as_deref().ok_or_else(|| {
            DeployError::Config(format!(
                "no API token configured. Set {} or add `token` to the settings file",
                TOKEN_ENV
            ))
        })
    }
}
