//! Application configuration management.
//!
//! Holds the content origin, the offline cache version label and manifest,
//! and the one persisted UI preference (theme), plus the last open section.
//!
//! Configuration is stored at `~/.config/darkkokan/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Section;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "darkkokan";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/";
pub const DEFAULT_CACHE_VERSION: &str = "v1";

pub const ENV_BASE_URL: &str = "DARKKOKAN_BASE_URL";
pub const ENV_CACHE_VERSION: &str = "DARKKOKAN_CACHE_VERSION";

/// Resources pre-fetched into every cache version
pub fn default_manifest() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/css/style.css",
        "/css/sections.css",
        "/js/script.js",
        "/js/navigation.js",
        "/assets/images/logo.png",
        "/data/horror.json",
        "/data/mysterious.json",
        "/data/spotify.json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub cache_version: String,
    pub manifest: Vec<String>,
    pub theme: Theme,
    pub last_section: Option<Section>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            manifest: default_manifest(),
            theme: Theme::default(),
            last_section: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Apply `DARKKOKAN_*` environment variables on top of the file values.
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_BASE_URL) {
            debug!(base_url = %url, "Base URL overridden from environment");
            self.base_url = url;
        }
        if let Some(version) = non_empty(ENV_CACHE_VERSION) {
            debug!(cache_version = %version, "Cache version overridden from environment");
            self.cache_version = version;
        }
    }
}
