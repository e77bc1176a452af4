//! Application configuration management.
//!
//! Holds the collector identity, offline preference and optional directory
//! overrides. Stored at `<config_dir>/fieldsurvey/config.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "fieldsurvey";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Collector id used when none is configured.
pub const DEFAULT_COLLECTOR: &str = "unassigned";

pub const ENV_COLLECTOR: &str = "FIELDSURVEY_COLLECTOR";
pub const ENV_OFFLINE: &str = "FIELDSURVEY_OFFLINE";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub collector_id: Option<String>,
    #[serde(default)]
    pub offline_mode: bool,
    pub data_dir: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply `FIELDSURVEY_COLLECTOR` / `FIELDSURVEY_OFFLINE` when set.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_COLLECTOR).ok(),
            std::env::var(ENV_OFFLINE).ok(),
        );
    }

    fn apply_overrides(&mut self, collector: Option<String>, offline: Option<String>) {
        if let Some(collector) = collector.filter(|c| !c.trim().is_empty()) {
            self.collector_id = Some(collector.trim().to_string());
        }
        if let Some(offline) = offline {
            self.offline_mode = matches!(
                offline.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
    }

    pub fn collector(&self) -> &str {
        self.collector_id.as_deref().unwrap_or(DEFAULT_COLLECTOR)
    }

    /// Where the persisted mirror lives, one directory per collector.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;

        let mut path = data_dir.join(APP_NAME);
        if let Some(ref collector) = self.collector_id {
            path = path.join(collector);
        }
        Ok(path)
    }

    /// Download surface for exported workbooks.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_collector() {
        let config = Config::default();
        assert_eq!(config.collector(), DEFAULT_COLLECTOR);
        assert!(!config.offline_mode);
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(Some(" team-7 ".to_string()), Some("TRUE".to_string()));
        assert_eq!(config.collector(), "team-7");
        assert!(config.offline_mode);

        config.apply_overrides(Some("  ".to_string()), Some("0".to_string()));
        assert_eq!(config.collector(), "team-7");
        assert!(!config.offline_mode);
    }

    #[test]
    fn test_explicit_directories_win() {
        let config = Config {
            data_dir: Some(PathBuf::from("/tmp/fs-data")),
            export_dir: Some(PathBuf::from("/tmp/fs-out")),
            ..Default::default()
        };
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/fs-data"));
        assert_eq!(config.export_dir(), PathBuf::from("/tmp/fs-out"));
    }

    #[test]
    fn test_config_parses_partial_json() {
        let config: Config = serde_json::from_str(r#"{ "collector_id": "c-1" }"#).unwrap();
        assert_eq!(config.collector(), "c-1");
        assert!(config.data_dir.is_none());
    }
}
