//! Configuration Management
//!
//! Handles persistent configuration storage for sygt.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Backend used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Environment variable overriding the configured backend
pub const API_URL_ENV: &str = "SYGT_API_URL";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Backend base URL
    #[serde(default)]
    pub api_url: Option<String>,
    /// Last viewed route
    #[serde(default)]
    pub last_view: Option<String>,
    /// HTTP request timeout
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sygt").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit path; unreadable or invalid files give defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Get effective API URL (CLI > env > config > default)
    pub fn effective_api_url(&self, cli: Option<&str>) -> String {
        let env = std::env::var(API_URL_ENV).ok();
        self.resolve_api_url(cli, env.as_deref())
    }

    fn resolve_api_url(&self, cli: Option<&str>, env: Option<&str>) -> String {
        [cli, env, self.api_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .to_string()
    }

    /// Get effective request timeout (CLI > config > default)
    pub fn effective_timeout(&self, cli: Option<u64>) -> Duration {
        cli.or(self.request_timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(crate::api::DEFAULT_TIMEOUT)
    }

    /// Set last viewed route and save it to `path`, if any
    pub fn set_last_view(&mut self, view: &str, path: Option<&Path>) -> Result<()> {
        self.last_view = Some(view.to_string());
        match path {
            Some(path) => self.save_to(path),
            None => Ok(()),
        }
    }
}
