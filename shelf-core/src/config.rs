use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    debounce::DEFAULT_QUIET_PERIOD,
    query::{MatchMode, SortSpec},
};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
    Parse {
        path: PathBuf,
        error: toml::de::Error,
    },
    Serialize(toml::ser::Error),
}
impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, error } => {
                write!(f, "failed to access {}: {error}", path.display())
            }
            ConfigError::Parse { path, error } => {
                write!(f, "failed to parse {}: {error}", path.display())
            }
            ConfigError::Serialize(error) => write!(f, "failed to serialize config: {error}"),
        }
    }
}
impl std::error::Error for ConfigError {}
impl From<toml::ser::Error> for ConfigError {
    fn from(error: toml::ser::Error) -> Self {
        ConfigError::Serialize(error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub images: Images,
    pub search: Search,
    pub view: ViewPreferences,
}
impl Config {
    pub const FILENAME: &str = "shelf.toml";

    /// Loads the config at `path`, falling back to the defaults if it doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).map_err(|error| ConfigError::Parse {
                path: path.to_owned(),
                error,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found at {}, using defaults", path.display());
                Ok(Config::default())
            }
            Err(error) => Err(ConfigError::Io {
                path: path.to_owned(),
                error,
            }),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, toml::to_string(self)?).map_err(|error| ConfigError::Io {
            path: path.to_owned(),
            error,
        })?;
        tracing::info!("saved config to {}", path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Server {
    pub base_url: String,
}
impl Default for Server {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Images {
    /// The route local cover images are served from.
    pub dir: String,
}
impl Default for Images {
    fn default() -> Self {
        Self {
            dir: shelf_state::sa::IMAGES_ROUTE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Search {
    pub debounce_ms: u64,
}
impl Default for Search {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_QUIET_PERIOD.as_millis() as u64,
        }
    }
}
impl Search {
    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }
}

/// How densely the collection is laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewSize {
    Compact,
    #[default]
    Comfortable,
    Large,
}

/// The user's remembered presentation choices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPreferences {
    pub match_mode: MatchMode,
    pub view_size: ViewSize,
    pub dark_mode: bool,
    pub sort: SortSpec,
}

/// Somewhere [`ViewPreferences`] are kept between sessions.
pub trait PreferencesStore {
    fn load_preferences(&self) -> Result<ViewPreferences, ConfigError>;
    fn save_preferences(&mut self, preferences: &ViewPreferences) -> Result<(), ConfigError>;
}

/// Keeps preferences in the `[view]` section of a config file, leaving the
/// other sections untouched.
pub struct ConfigFileStore {
    path: PathBuf,
}
impl ConfigFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}
impl PreferencesStore for ConfigFileStore {
    fn load_preferences(&self) -> Result<ViewPreferences, ConfigError> {
        Ok(Config::load(&self.path)?.view)
    }

    fn save_preferences(&mut self, preferences: &ViewPreferences) -> Result<(), ConfigError> {
        let mut config = Config::load(&self.path)?;
        if config.view == *preferences {
            return Ok(());
        }
        config.view = preferences.clone();
        config.save(&self.path)
    }
}
