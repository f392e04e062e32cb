//! Configuration management for Highway.
//!
//! This module provides configuration loading, validation, and access through a singleton pattern.
//! Settings are read from the "highway" key of a JSON document and merged with defaults.
//! The global configuration seeds the default instance used by the free functions in
//! [`crate::client`].

pub mod schema;

pub use schema::{HighwayConfig, HttpVersion, RequestOptions};

use crate::error::HighwayError;
use log::warn;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::path::Path;
use std::sync::RwLock;

/// Key under which settings are looked up in a JSON document.
pub const SETTINGS_KEY: &str = "highway";

/// Global configuration instance.
///
/// This is lazily initialized on first access and can be updated when settings change.
static CONFIG: Lazy<RwLock<HighwayConfig>> = Lazy::new(|| RwLock::new(HighwayConfig::default()));

/// Loads configuration from a JSON value.
///
/// This function reads the "highway" settings, falls back to defaults if they
/// cannot be deserialized, validates the result, and updates the global configuration.
///
/// # Example
///
/// ```no_run
/// use highway::config::load_config;
/// use serde_json::json;
///
/// let settings = json!({
///     "highway": {
///         "base": "https://snowball.aq/api",
///         "headers": { "Accept": "application/json" }
///     }
/// });
///
/// let config = load_config(Some(settings)).unwrap();
/// assert_eq!(config.base.as_deref(), Some("https://snowball.aq/api"));
/// ```
pub fn load_config(settings_json: Option<Value>) -> Result<HighwayConfig, HighwayError> {
    let mut config = HighwayConfig::default();

    if let Some(settings) = settings_json {
        if let Some(highway_settings) = settings.get(SETTINGS_KEY) {
            match serde_json::from_value::<HighwayConfig>(highway_settings.clone()) {
                Ok(user_config) => config = user_config,
                Err(e) => {
                    warn!(
                        "Failed to parse {} settings: {}. Using defaults.",
                        SETTINGS_KEY, e
                    );
                }
            }
        }
    }

    config.validate().map_err(HighwayError::InvalidConfig)?;

    if let Ok(mut global_config) = CONFIG.write() {
        *global_config = config.clone();
    }

    Ok(config)
}

/// Loads configuration from a JSON settings file.
///
/// The file is expected to hold a JSON object with a "highway" key, like the
/// value accepted by [`load_config`].
pub fn load_config_file(path: impl AsRef<Path>) -> Result<HighwayConfig, HighwayError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        HighwayError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
    })?;
    let settings: Value = serde_json::from_str(&content).map_err(|e| {
        HighwayError::InvalidConfig(format!("cannot parse {}: {}", path.display(), e))
    })?;

    load_config(Some(settings))
}

/// Gets the current global configuration.
///
/// If configuration has not been loaded yet, returns the default configuration.
pub fn get_config() -> HighwayConfig {
    CONFIG
        .read()
        .map(|c| c.clone())
        .unwrap_or_else(|_| HighwayConfig::default())
}

/// Updates the global configuration in place.
///
/// If the update leaves the configuration invalid, it is reverted to defaults.
///
/// # Example
///
/// ```no_run
/// use highway::config::update_config;
///
/// update_config(|config| {
///     config.base = Some("https://snowball.aq".to_string());
/// });
/// ```
pub fn update_config<F>(updater: F)
where
    F: FnOnce(&mut HighwayConfig),
{
    if let Ok(mut config) = CONFIG.write() {
        updater(&mut config);

        if let Err(e) = config.validate() {
            warn!("Configuration validation failed after update: {}", e);
            *config = HighwayConfig::default();
        }
    }
}

/// Resets the configuration to defaults.
pub fn reset_config() {
    if let Ok(mut config) = CONFIG.write() {
        *config = HighwayConfig::default();
    }
}
