use fast_config::Config;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "scope_capture.json5";
pub const DEFAULT_IMAGE_NAME: &str = "screencapture.jpeg";
pub const DEFAULT_INSTRUMENT_ADDR: &str = "USB0::TEMPLATE";

// Screen capture background color, as the scope spells it
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Background {
    Black,
    #[default]
    White,
}

impl Background {
    pub fn as_str(&self) -> &'static str {
        match self {
            Background::Black => "BLACK",
            Background::White => "WHITE",
        }
    }
}

impl std::fmt::Display for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Anything that isn't BLACK goes back to the default
impl From<String> for Background {
    fn from(value: String) -> Self {
        Background::from(value.as_str())
    }
}

impl From<&str> for Background {
    fn from(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("BLACK") {
            Background::Black
        } else {
            Background::White
        }
    }
}

impl From<Background> for String {
    fn from(value: Background) -> Self {
        value.as_str().to_string()
    }
}

// The four keys of the `config` section
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SettingKey {
    Background,
    ImagePath,
    ImageName,
    InstrumentAddr,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::Background,
        SettingKey::ImagePath,
        SettingKey::ImageName,
        SettingKey::InstrumentAddr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::Background => "background",
            SettingKey::ImagePath => "imagepath",
            SettingKey::ImageName => "imagename",
            SettingKey::InstrumentAddr => "instrumentaddr",
        }
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User settings. Missing keys are filled with defaults on load, so all four
/// are present once a file has been read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub background: Background,
    #[serde(default = "default_image_path")]
    pub imagepath: String,
    #[serde(default = "default_image_name")]
    pub imagename: String,
    #[serde(default = "default_instrument_addr")]
    pub instrumentaddr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            background: Background::default(),
            imagepath: default_image_path(),
            imagename: default_image_name(),
            instrumentaddr: default_instrument_addr(),
        }
    }
}

impl Settings {
    pub fn get(&self, key: SettingKey) -> String {
        match key {
            SettingKey::Background => self.background.to_string(),
            SettingKey::ImagePath => self.imagepath.clone(),
            SettingKey::ImageName => self.imagename.clone(),
            SettingKey::InstrumentAddr => self.instrumentaddr.clone(),
        }
    }

    /// Changes one value in place. Nothing is validated and nothing is written
    /// to disk; call [`ConfigStore::save`] afterwards.
    pub fn set(&mut self, key: SettingKey, value: &str) {
        debug!("changing config of {} to {}", key, value);
        match key {
            SettingKey::Background => self.background = Background::from(value),
            SettingKey::ImagePath => self.imagepath = value.to_string(),
            SettingKey::ImageName => self.imagename = value.to_string(),
            SettingKey::InstrumentAddr => self.instrumentaddr = value.to_string(),
        }
    }
}

// On-disk layout: a single `config` section
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(default)]
    pub config: Settings,
}

fn default_image_path() -> String {
    dirs::picture_dir()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string())
}

fn default_image_name() -> String {
    DEFAULT_IMAGE_NAME.to_string()
}

fn default_instrument_addr() -> String {
    DEFAULT_INSTRUMENT_ADDR.to_string()
}

/// Config file next to the executable, falling back to the user config dir.
pub fn default_config_path() -> PathBuf {
    let dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    dir.join(CONFIG_FILE_NAME)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not open config file {path}: {reason}")]
    Open { path: PathBuf, reason: String },
    #[error("could not save config file {path}: {reason}")]
    Save { path: PathBuf, reason: String },
    #[error("could not reset config file {path}: {source}")]
    Reset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct ConfigStore {
    config: Config<ConfigData>,
    path: PathBuf,
}

impl ConfigStore {
    /// Loads settings from `path`. A missing, empty or unreadable file is
    /// replaced by one holding the defaults.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        info!("loading configuration files...");
        debug!("looking for: {}", path.display());

        let text = fs::read_to_string(&path).unwrap_or_default();
        let mut fresh = text.trim().is_empty();
        if fresh {
            debug!("could not find {}; creating it now...", path.display());
            remove_if_present(&path)?;
        }

        let config = match Config::new(&path, ConfigData::default()) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("config file {} is malformed ({}); restoring defaults", path.display(), e);
                remove_if_present(&path)?;
                fresh = true;
                Config::new(&path, ConfigData::default()).map_err(|e| ConfigError::Open {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
            }
        };

        let mut store = Self { config, path };
        if fresh {
            store.save()?;
        } else {
            debug!("found {}...", store.path.display());
            // keys filled in by serde defaults are written back
            if SettingKey::ALL.iter().any(|key| !text.contains(key.as_str())) {
                debug!("adding missing keys to {}", store.path.display());
                store.save()?;
            }
        }
        for key in SettingKey::ALL {
            info!("set {}: {}", key, store.settings().get(key));
        }
        Ok(store)
    }

    pub fn save(&mut self) -> Result<(), ConfigError> {
        info!("saving updated configuration");
        self.config.save().map_err(|e| ConfigError::Save {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.config.data.config
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.config.data.config
    }

    pub fn set(&mut self, key: SettingKey, value: &str) {
        self.settings_mut().set(key, value);
    }
}

fn remove_if_present(path: &Path) -> Result<(), ConfigError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ConfigError::Reset {
            path: path.to_path_buf(),
            source,
        }),
    }
}
