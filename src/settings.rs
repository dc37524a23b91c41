use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::XcordError;

const SETTINGS_FILE: &str = "settings.json";

/// If you switch out of Xcode the timer stops
pub const STRICT_MODE_KEY: &str = "strictMode";

/// The timer never stops except when XCord itself is stopped
pub const FLAUNT_MODE_KEY: &str = "flauntMode";

/// Registered once at start-up; only consulted for keys that were never written
pub const DEFAULT_PREFERENCES: &[(&str, bool)] = &[(STRICT_MODE_KEY, true), (FLAUNT_MODE_KEY, false)];

/// How the elapsed timer reacts to focus and power changes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Strict,
    Flaunt,
}

impl Mode {
    pub fn message(&self) -> &'static str {
        match self {
            Mode::Strict => "Timer will only keep the time you were active on Xcode",
            Mode::Flaunt => "Timer will not stop on Sleep and Wakeup of MacOS",
        }
    }

    pub fn from_preferences(store: &dyn PreferenceStore) -> Self {
        if store.get_bool(STRICT_MODE_KEY) {
            Mode::Strict
        } else {
            Mode::Flaunt
        }
    }

    /// Write both mode flags so they stay mutually exclusive
    pub fn persist(self, store: &mut dyn PreferenceStore) -> Result<(), XcordError> {
        let strict = self == Mode::Strict;
        store.set_bool(STRICT_MODE_KEY, strict)?;
        store.set_bool(FLAUNT_MODE_KEY, !strict)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Strict => f.write_str("Strict"),
            Mode::Flaunt => f.write_str("Flaunt"),
        }
    }
}

/// Boolean key-value preference storage
pub trait PreferenceStore: Send {
    fn get_bool(&self, key: &str) -> bool;

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), XcordError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(flatten)]
    pub values: BTreeMap<String, bool>,
}

/// Preferences persisted as a JSON file
#[derive(Debug)]
pub struct JsonPreferences {
    path: PathBuf,
    settings: AppSettings,
    defaults: BTreeMap<String, bool>,
}

fn get_settings_path() -> Result<PathBuf, XcordError> {
    let config_dir = dirs::config_dir()
        .ok_or(XcordError::MissingDirectory("config"))?
        .join("xcord");

    fs::create_dir_all(&config_dir).map_err(|source| XcordError::SettingsIo {
        path: config_dir.clone(),
        source,
    })?;

    Ok(config_dir.join(SETTINGS_FILE))
}

fn load_settings(path: &Path) -> Result<AppSettings, XcordError> {
    tracing::debug!("Loading settings from {}", path.display());

    if !path.exists() {
        return Ok(AppSettings::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| XcordError::SettingsIo {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(serde_json::from_str(&contents)?)
}

fn save_settings(path: &Path, settings: &AppSettings) -> Result<(), XcordError> {
    tracing::debug!("Saving settings");
    let contents = serde_json::to_string_pretty(settings)?;

    fs::write(path, contents).map_err(|source| XcordError::SettingsIo {
        path: path.to_path_buf(),
        source,
    })
}

impl JsonPreferences {
    pub fn open(path: PathBuf) -> Result<Self, XcordError> {
        let settings = load_settings(&path)?;
        Ok(Self {
            path,
            settings,
            defaults: BTreeMap::new(),
        })
    }

    /// Open the settings file in the user's config directory
    pub fn open_default() -> Result<Self, XcordError> {
        Self::open(get_settings_path()?)
    }

    /// Fallback values for keys that have never been written.
    ///
    /// Defaults are kept in memory only, the settings file records explicit
    /// choices.
    pub fn register_defaults(&mut self, defaults: &[(&str, bool)]) {
        for (key, value) in defaults {
            self.defaults.insert(key.to_string(), *value);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonPreferences {
    fn get_bool(&self, key: &str) -> bool {
        self.settings
            .values
            .get(key)
            .or_else(|| self.defaults.get(key))
            .copied()
            .unwrap_or(false)
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), XcordError> {
        self.settings.values.insert(key.to_string(), value);
        save_settings(&self.path, &self.settings)
    }
}
