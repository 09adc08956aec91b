use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::error::ConfigError;
use crate::language::OutputLanguage;

pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_SUBMIT_PATH: &str = "/brief";
pub const DEFAULT_ARTIFACT_PATH: &str = "/download";

/// Environment variable that overrides `service_url`
pub const SERVICE_URL_ENV: &str = "BRIEFGEN_SERVICE_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub service_url: String,
    pub submit_path: String,
    pub artifact_path: String,
    pub language: OutputLanguage,
    pub download_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    /// Extra attempts for the artifact fetch after the first failure
    pub artifact_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            submit_path: DEFAULT_SUBMIT_PATH.to_string(),
            artifact_path: DEFAULT_ARTIFACT_PATH.to_string(),
            language: OutputLanguage::default(),
            download_dir: None,
            request_timeout_secs: 120,
            artifact_retries: 0,
        }
    }

    /// Load from the user config dir, falling back to defaults when absent,
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn save_language(language: OutputLanguage) -> Result<(), ConfigError> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path).unwrap_or_else(|_| Self::new());
        config.language = language;
        config.save_to(&config_path)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(SERVICE_URL_ENV) {
            if !url.trim().is_empty() {
                self.service_url = url.trim().to_string();
            }
        }
    }

    pub fn submit_url(&self) -> String {
        join_url(&self.service_url, &self.submit_path)
    }

    /// URL for fetching an artifact. The reference becomes one
    /// percent-encoded path segment, so `/`, `?` and `#` stay inside it.
    pub fn artifact_url(&self, reference: &str) -> Result<Url, ConfigError> {
        let base = join_url(&self.service_url, &self.artifact_path);
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: base.clone(),
            reason,
        };

        let mut url = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(reference);
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Where downloaded briefs are written
    pub fn resolve_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("briefgen"))
    }

    fn get_config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
