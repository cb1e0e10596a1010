// ZaikaBox Settings Engine
// Loads, saves and updates the bookmark layer's settings.
// Settings are stored as a JSON file; missing sections fall back to defaults.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::types::errors::SettingsError;
use crate::types::settings::ZaikaSettings;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV_VAR: &str = "ZAIKABOX_CONFIG";

/// Settings file used when neither an override nor the env var is given.
pub const DEFAULT_CONFIG_FILE: &str = "zaikabox.json";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<ZaikaSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &ZaikaSettings;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: ZaikaSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// Path precedence: `path_override`, then `$ZAIKABOX_CONFIG`, then `zaikabox.json`
    /// in the working directory.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override
            .or_else(|| env::var(CONFIG_ENV_VAR).ok())
            .unwrap_or_else(|| {
                info!("{CONFIG_ENV_VAR} not set, using default: {DEFAULT_CONFIG_FILE}");
                DEFAULT_CONFIG_FILE.to_string()
            });

        Self {
            config_path,
            settings: ZaikaSettings::default(),
        }
    }
}

/// Walks `root` along a dot-separated key and replaces the leaf. The leaf must already exist.
fn replace_at_path(root: &mut Value, key: &str, value: Value) -> Result<(), SettingsError> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };

    let mut node = root;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        node = node
            .get_mut(part)
            .ok_or_else(|| SettingsError::InvalidKey(format!("Key '{}' not found in settings", key)))?;
    }

    // Optional fields serialize as null but still count as present.
    match node.as_object_mut() {
        Some(map) if map.contains_key(leaf) => {
            map.insert(leaf.to_string(), value);
            Ok(())
        }
        Some(_) => Err(SettingsError::InvalidKey(format!("Key '{}' not found in settings", key))),
        None => Err(SettingsError::InvalidKey(format!(
            "Cannot navigate to key '{}': intermediate value is not an object",
            key
        ))),
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// A missing file yields defaults; a malformed one is a serialization error.
    fn load(&mut self) -> Result<ZaikaSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            warn!(path = %self.config_path, "settings file not found, using defaults");
            self.settings = ZaikaSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        self.settings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        info!(path = %self.config_path, "settings loaded");
        Ok(self.settings.clone())
    }

    /// Saves the current settings, creating parent directories as needed.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))
    }

    fn get_settings(&self) -> &ZaikaSettings {
        &self.settings
    }

    /// Updates one setting by dot-notation key and saves.
    ///
    /// # Examples
    /// - `"storage.backend"` → `"local"` switches to the on-device store
    /// - `"bookmarks.cache_ttl_secs"` → `60`
    /// - `"storage.remote.api_key"` → `"..."`
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        if key.is_empty() || key.split('.').any(str::is_empty) {
            return Err(SettingsError::InvalidKey(format!("Malformed key '{}'", key)));
        }

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;
        replace_at_path(&mut json_value, key, value)?;

        // Round-trip through the typed struct to validate the new value.
        self.settings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        info!(key, "setting updated");

        self.save()
    }

    /// Resets all settings to defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = ZaikaSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
