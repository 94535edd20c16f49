use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub backend_url: Option<String>,
    /// Treat a backend response without a `reply` field as a transport
    /// failure instead of rendering an empty turn.
    pub strict_replies: Option<bool>,
    /// Surface clear failures as an error turn like ordinary sends, instead
    /// of only noting them in the status line.
    pub surface_clear_errors: Option<bool>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            backend_url: None,
            strict_replies: None,
            surface_clear_errors: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Effective backend URL: env override, then config, then default.
    pub fn backend_url(&self) -> String {
        std::env::var("ARCHITECT_BACKEND_URL")
            .ok()
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }

    pub fn strict_replies(&self) -> bool {
        self.strict_replies.unwrap_or(false)
    }

    pub fn surface_clear_errors(&self) -> bool {
        self.surface_clear_errors.unwrap_or(false)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("architect-chat").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert!(!config.strict_replies());
        assert!(!config.surface_clear_errors());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("architect-chat").join("config.json");

        let mut config = Config::new();
        config.backend_url = Some("http://10.0.0.5:9000".to_string());
        config.strict_replies = Some(true);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.backend_url.as_deref(), Some("http://10.0.0.5:9000"));
        assert!(loaded.strict_replies());
        assert!(!loaded.surface_clear_errors());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert!(loaded.backend_url.is_none());
    }
}
