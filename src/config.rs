//! # Configuration Module
//!
//! Settings for the recommender and the playback loop, read from an optional
//! JSON file and overridden by command-line flags.
//!
//! ## Location
//!
//! Without `--config`, the file is looked up in the platform config directory:
//! - Linux: `~/.config/segue/config.json`
//! - macOS: `~/Library/Application Support/segue/config.json`
//! - Windows: `%APPDATA%\segue\config.json`
//!
//! A missing file is not an error; every field has a default. Relative
//! `dataset` paths in the file are resolved against the file's directory.
//!
//! ## Example
//!
//! ```json
//! {
//!   "dataset": "/home/user/music/data.csv",
//!   "start_song": "Danny Boy",
//!   "duration_tolerance_ms": 10000,
//!   "neighbors": 10,
//!   "excluded_column": "explicit",
//!   "playback_scale": 20000.0
//! }
//! ```

use crate::index::DEFAULT_NEIGHBORS;
use crate::playback::DEFAULT_PLAYBACK_SCALE;
use crate::recommend::{DEFAULT_DURATION_TOLERANCE_MS, DEFAULT_EXCLUDED_COLUMN};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

/// Everything that used to be hard-coded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// CSV file with one row per song
    pub dataset: PathBuf,
    /// Song to start the loop from; random when unset
    pub start_song: Option<String>,
    pub duration_tolerance_ms: u64,
    /// How many nearest neighbours each recommendation inspects
    pub neighbors: usize,
    /// Numeric column that does not take part in similarity
    pub excluded_column: String,
    /// Divisor from song milliseconds to seconds of simulated playback
    pub playback_scale: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data.csv"),
            start_song: None,
            duration_tolerance_ms: DEFAULT_DURATION_TOLERANCE_MS,
            neighbors: DEFAULT_NEIGHBORS,
            excluded_column: DEFAULT_EXCLUDED_COLUMN.to_string(),
            playback_scale: DEFAULT_PLAYBACK_SCALE,
        }
    }
}

/// Values given on the command line; `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dataset: Option<PathBuf>,
    pub start_song: Option<String>,
    pub duration_tolerance_ms: Option<u64>,
    pub neighbors: Option<usize>,
    pub excluded_column: Option<String>,
    pub playback_scale: Option<f64>,
}

/// Returns the platform-appropriate configuration file path.
///
/// Does not create anything.
///
/// # Errors
///
/// When the platform has no notion of a config directory.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system config directory. Pass --config to choose a file explicitly."
        )
    })?;
    Ok(config_dir.join("segue").join(CONFIG_FILE))
}

impl Settings {
    /// Read settings from `path`, or defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed file, or values that fail [`Settings::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut settings: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        if settings.dataset.is_relative() {
            if let Some(dir) = path.parent() {
                settings.dataset = dir.join(&settings.dataset);
            }
        }

        settings.validate()?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write these settings as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// When `path` exists and `force` is false, or on any I/O failure.
    pub fn save(&self, path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!(
                "Config file {} already exists. Use --force to overwrite it.",
                path.display()
            );
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| {
                format!(
                    "Failed to create config directory at {}. Please check file permissions.",
                    dir.display()
                )
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Apply command-line values on top of these settings.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(dataset) = overrides.dataset {
            self.dataset = dataset;
        }
        if overrides.start_song.is_some() {
            self.start_song = overrides.start_song;
        }
        if let Some(tolerance) = overrides.duration_tolerance_ms {
            self.duration_tolerance_ms = tolerance;
        }
        if let Some(neighbors) = overrides.neighbors {
            self.neighbors = neighbors;
        }
        if let Some(column) = overrides.excluded_column {
            self.excluded_column = column;
        }
        if let Some(scale) = overrides.playback_scale {
            self.playback_scale = scale;
        }
        self
    }

    /// # Errors
    ///
    /// `neighbors` of zero, or a playback scale that is not a positive number.
    pub fn validate(&self) -> Result<()> {
        if self.neighbors == 0 {
            bail!("neighbors must be at least 1");
        }
        if !(self.playback_scale.is_finite() && self.playback_scale > 0.0) {
            bail!(
                "playback_scale must be a positive number, got {}",
                self.playback_scale
            );
        }
        Ok(())
    }

    /// The dataset path made absolute against the working directory.
    ///
    /// # Errors
    ///
    /// When the working directory cannot be determined.
    pub fn dataset_path(&self) -> Result<PathBuf> {
        Ok(self
            .dataset
            .absolutize()
            .with_context(|| format!("Failed to resolve dataset path {}", self.dataset.display()))?
            .into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.duration_tolerance_ms, 10_000);
        assert_eq!(settings.neighbors, 10);
        assert_eq!(settings.excluded_column, "explicit");
        assert_eq!(settings.playback_scale, 20_000.0);
        assert!(settings.start_song.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_and_relative_dataset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "dataset": "songs.csv", "neighbors": 25 }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.neighbors, 25);
        assert_eq!(settings.dataset, dir.path().join("songs.csv"));
        assert_eq!(settings.duration_tolerance_ms, 10_000);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        fs::write(&path, r#"{ "neighbors": 0 }"#).unwrap();
        assert!(Settings::load(&path).is_err());

        fs::write(&path, r#"{ "playback_scale": -1.0 }"#).unwrap();
        assert!(Settings::load(&path).is_err());

        fs::write(&path, r#"{ "neighbours": 3 }"#).unwrap();
        assert!(Settings::load(&path).is_err(), "unknown keys are typos");
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let settings = Settings {
            dataset: dir.path().join("data.csv"),
            start_song: Some("Danny Boy".into()),
            ..Settings::default()
        };

        settings.save(&path, false).unwrap();
        assert!(settings.save(&path, false).is_err(), "refuses to overwrite");
        settings.save(&path, true).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_overrides_win() {
        let settings = Settings::default().with_overrides(Overrides {
            neighbors: Some(3),
            start_song: Some("Paranoid".into()),
            ..Overrides::default()
        });
        assert_eq!(settings.neighbors, 3);
        assert_eq!(settings.start_song.as_deref(), Some("Paranoid"));
        assert_eq!(settings.excluded_column, "explicit");
    }

    #[test]
    fn test_default_config_path_shape() {
        if let Ok(path) = default_config_path() {
            assert!(path.ends_with("segue/config.json"));
        }
    }

    #[test]
    fn test_dataset_path_is_absolute() {
        let settings = Settings::default();
        assert!(settings.dataset_path().unwrap().is_absolute());
    }
}
