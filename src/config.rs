//! Configuration loading for agentwire.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::adapters::BUILTIN_ADAPTERS;
use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Get the agentwire home directory (~/.agentwire).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".agentwire"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.agentwire/settings.json
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_settings_path()?)
}

/// Load and validate settings from an explicit path.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;

    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.adapters.enabled.is_empty() {
        return Err(Error::Config("adapters.enabled must name at least one adapter".to_string()));
    }
    for name in &settings.adapters.enabled {
        if !BUILTIN_ADAPTERS.contains(&name.as_str()) {
            return Err(Error::Config(format!(
                "adapters.enabled: unknown adapter '{}'",
                name
            )));
        }
    }
    Ok(())
}

/// Load settings or return default if not found.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings: {}, using defaults", e);
        Settings::default()
    })
}

/// Adapter configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AdapterSettings {
    /// Built-in adapters to register, in priority order.
    #[serde(default = "default_enabled_adapters")]
    pub enabled: Vec<String>,
    /// Reject JSON-looking parameter values that fail to parse.
    #[serde(default)]
    pub strict_parameters: bool,
}

fn default_enabled_adapters() -> Vec<String> {
    BUILTIN_ADAPTERS.iter().map(|s| s.to_string()).collect()
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled_adapters(),
            strict_parameters: false,
        }
    }
}

/// Logging configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LoggingSettings {
    /// Filter directive used when RUST_LOG is unset, e.g. "info".
    pub level: Option<String>,
    /// Log directory; defaults to the platform data directory.
    pub directory: Option<PathBuf>,
}

/// agentwire settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub adapters: AdapterSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}
