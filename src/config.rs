//! Application configuration
//!
//! Handles loading and managing configuration from config.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Global application config
static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Get the global application config
pub fn get_config() -> &'static AppConfig {
    APP_CONFIG.get_or_init(AppConfig::load)
}

/// Root application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub listing: ListingConfig,
}

/// Directory listing configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ListingConfig {
    /// Deepest subdirectory level visited by recursive listings
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Whether hidden and system entries are printed
    #[serde(default = "default_true")]
    pub show_hidden: bool,
    /// Print directories before files, each group sorted by name
    #[serde(default = "default_true")]
    pub directories_first: bool,
}

fn default_max_depth() -> usize {
    16
}

fn default_true() -> bool {
    true
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            show_hidden: default_true(),
            directories_first: default_true(),
        }
    }
}

impl AppConfig {
    /// Load configuration from config.json
    pub fn load() -> Self {
        // Try to load from current directory first
        if let Ok(config) = Self::load_from_path("config.json") {
            log::info!("Loaded config from ./config.json");
            return config;
        }

        // Try to load from executable directory
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let config_path = exe_dir.join("config.json");
                if let Ok(config) = Self::load_from_path(&config_path) {
                    log::info!("Loaded config from {}", config_path.display());
                    return config;
                }
            }
        }

        log::info!("No config.json found, using defaults");
        Self::default()
    }

    /// Load configuration from a specific file
    pub fn load_from_path(path: impl Into<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.into();
        let content = fs::read_to_string(&path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.listing.max_depth, 16);
        assert!(config.listing.show_hidden);
        assert!(config.listing.directories_first);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "listing": { "show_hidden": false } }"#).unwrap();
        assert!(!config.listing.show_hidden);
        assert_eq!(config.listing.max_depth, 16);
        assert!(config.listing.directories_first);

        let empty: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, AppConfig::default());
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        file.write_all(br#"{ "listing": { "max_depth": 2, "directories_first": false } }"#)
            .unwrap();
        file.flush().unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.listing.max_depth, 2);
        assert!(!config.listing.directories_first);
    }

    #[test]
    fn test_load_from_missing_path() {
        assert!(AppConfig::load_from_path("/nonexistent/config.json").is_err());
    }
}
