//! Editor settings loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the stock behavior.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::interaction::Button;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GEOEDIT_CONFIG";

/// Location of the config file relative to a project directory.
pub const PROJECT_CONFIG: &str = "config/geoedit.toml";

/// Root of the editor configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub cursor: CursorConfig,
    #[serde(default)]
    pub modify: ModifyConfig,
    #[serde(default)]
    pub select: SelectConfig,
    #[serde(default)]
    pub draw: DrawConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EditorConfig {
    /// Loads the configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses the configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the text is not valid.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Finds the configuration: the file named by [`CONFIG_ENV`], else the
    /// project file under the working directory, else the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be read or parsed, or if
    /// the working directory is unavailable.
    pub fn discover() -> Result<Self, ConfigError> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path)),
            None => {
                let cwd = env::current_dir().map_err(|source| ConfigError::Context {
                    message: "working directory unavailable for config lookup".into(),
                    source,
                })?;
                Self::from_project_dir(&cwd)
            }
        }
    }

    /// Loads [`PROJECT_CONFIG`] under `dir`, or the defaults when that file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_project_dir(dir: &Path) -> Result<Self, ConfigError> {
        let candidate = dir.join(PROJECT_CONFIG);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "loading editor config");
            Self::from_file(candidate)
        } else {
            debug!(dir = %dir.display(), "no project config, using defaults");
            Ok(Self::default())
        }
    }
}

/// Snap acceptance thresholds, in world units.
#[derive(Debug, Clone, Deserialize)]
pub struct CursorConfig {
    #[serde(default = "CursorConfig::default_point_snap_distance")]
    pub point_snap_distance: f64,
    #[serde(default = "CursorConfig::default_line_snap_distance")]
    pub line_snap_distance: f64,
}

impl CursorConfig {
    fn default_point_snap_distance() -> f64 {
        0.3
    }

    fn default_line_snap_distance() -> f64 {
        0.1
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            point_snap_distance: Self::default_point_snap_distance(),
            line_snap_distance: Self::default_line_snap_distance(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModifyConfig {
    #[serde(default)]
    pub button: Button,
    /// Maximum distance from the cursor to a vertex for it to be grabbed.
    #[serde(default = "ModifyConfig::default_click_range")]
    pub click_range: f64,
}

impl ModifyConfig {
    fn default_click_range() -> f64 {
        0.5
    }
}

impl Default for ModifyConfig {
    fn default() -> Self {
        Self {
            button: Button::default(),
            click_range: Self::default_click_range(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectConfig {
    #[serde(default)]
    pub button: Button,
    #[serde(default = "SelectConfig::default_highlight")]
    pub highlight: bool,
    /// Pick distance for points and lines in direct ray picking.
    #[serde(default = "SelectConfig::default_pick_threshold")]
    pub pick_threshold: f64,
}

impl SelectConfig {
    fn default_highlight() -> bool {
        true
    }

    fn default_pick_threshold() -> f64 {
        0.3
    }
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            button: Button::default(),
            highlight: Self::default_highlight(),
            pick_threshold: Self::default_pick_threshold(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrawConfig {
    /// Default vertex cap for new Draw interactions; unlimited when absent.
    #[serde(default)]
    pub max_vertices: Option<usize>,
}

/// Verbosity of this crate's log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
}

impl LoggingConfig {
    /// Filter directive applying `level` to the `geoedit` target only,
    /// e.g. `geoedit=debug`.
    #[must_use]
    pub fn directive(&self) -> String {
        format!("geoedit={}", self.level)
    }
}
