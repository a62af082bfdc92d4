use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::api::DEFAULT_BACKEND_URL;
use crate::notify::ToastTiming;

pub const BACKEND_URL_ENV: &str = "DOCCHAT_BACKEND_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub backend_url: Option<String>,
    pub stream: Option<bool>,
    pub toast_duration_ms: Option<u64>,
    pub log_filter: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Backend URL by precedence: explicit override, environment, config file, default.
    pub fn backend_url(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(str::to_string)
            .or_else(|| std::env::var(BACKEND_URL_ENV).ok().filter(|v| !v.trim().is_empty()))
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }

    pub fn toast_timing(&self) -> ToastTiming {
        let mut timing = ToastTiming::default();
        if let Some(ms) = self.toast_duration_ms {
            timing.duration = Duration::from_millis(ms);
        }
        timing
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("docchat").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.toast_timing(), ToastTiming::default());
    }

    #[test]
    fn test_load_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            backend_url: Some("http://rag.internal:9000".into()),
            stream: Some(true),
            toast_duration_ms: Some(5000),
            log_filter: Some("docchat=debug".into()),
        };
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.toast_timing().duration, Duration::from_secs(5));
    }

    #[test]
    fn test_cli_override_wins() {
        let config = Config { backend_url: Some("http://from-file".into()), ..Config::default() };
        assert_eq!(config.backend_url(Some("http://from-cli")), "http://from-cli");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
