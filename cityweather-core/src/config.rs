use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

/// Overrides the API key stored in the config file.
pub const API_KEY_ENV: &str = "CITYWEATHER_API_KEY";
/// Overrides the history file location.
pub const HISTORY_FILE_ENV: &str = "CITYWEATHER_HISTORY_FILE";

pub const DEFAULT_GEO_BASE: &str = "https://geoapi.qweather.com";
pub const DEFAULT_API_BASE: &str = "https://devapi.qweather.com";
pub const DEFAULT_ICON_BASE: &str = "https://a.hecdn.net/img/common/icon/202106d";

/// Base URLs of the three QWeather services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub geo_base: String,
    pub api_base: String,
    pub icon_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geo_base: DEFAULT_GEO_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            icon_base: DEFAULT_ICON_BASE.to_string(),
        }
    }
}

/// Per-request timeouts in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Geocoding, current conditions and forecast calls.
    pub data_secs: u64,
    /// Icon downloads.
    pub icon_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { data_secs: 10, icon_secs: 5 }
    }
}

impl Timeouts {
    pub fn data(&self) -> Duration {
        Duration::from_secs(self.data_secs)
    }

    pub fn icon(&self) -> Duration {
        Duration::from_secs(self.icon_secs)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// lang = "en"
///
/// [endpoints]
/// api_base = "https://api.qweather.com"
///
/// [timeouts]
/// data_secs = 10
/// icon_secs = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Where the search history lives. Defaults to `history.json` in the
    /// platform data directory.
    pub history_file: Option<PathBuf>,

    /// Response language forwarded to the weather service, e.g. "en" or "zh".
    pub lang: Option<String>,

    pub endpoints: Endpoints,
    pub timeouts: Timeouts,
}

impl Config {
    /// Load config from disk (or defaults on first run) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file(&Self::config_file_path()?)?;
        cfg.apply_env(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Load a config file, returning defaults if it doesn't exist yet.
    pub fn load_file(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply `CITYWEATHER_*` overrides. The lookup is injected so tests don't touch the process env.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(path) = var(HISTORY_FILE_ENV).filter(|p| !p.is_empty()) {
            self.history_file = Some(PathBuf::from(path));
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_file(&Self::config_file_path()?)
    }

    pub fn save_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "cityweather", "cityweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Configured history path, falling back to the platform data directory.
    pub fn history_file_path(&self) -> Result<PathBuf> {
        match &self.history_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("history.json")),
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// The API key, or an error telling the user how to set one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `cityweather configure` or set {API_KEY_ENV}."
            )
        })
    }
}
