use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::pattern::{DEFAULT_PATTERN, DEFAULT_SEPARATOR};

/// Google Geocoding JSON endpoint.
pub const DEFAULT_GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Coordinates are multiplied by this value and floored to build geocode cache keys,
/// i.e. three decimal degrees (roughly 100 m).
pub const DEFAULT_GEOCODE_PRECISION: f64 = 1000.0;

/// Top-level configuration for a photo-mover run.
///
/// Controls the destination pattern, move-or-copy behaviour, per-media-kind path
/// settings, reverse geocoding, and the diagnostic file.
///
/// # Loading
///
/// ```rust,no_run
/// use photo_mover::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.geocoding.api_key = "AIza...".into();
/// config.move_files = true;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Destination pattern, see [`crate::pattern::resolve_pattern`].
    pub pattern: String,
    /// Move files instead of copying them.
    pub move_files: bool,
    /// Separator between file name and location for images.
    pub separator: String,
    /// Path settings applied to video files.
    pub video: VideoConfig,
    /// Reverse geocoding settings.
    pub geocoding: GeocodingConfig,
    /// Diagnostic output.
    pub output: OutputConfig,
}

/// Path settings for videos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Substituted for `{fixedpath}`.
    pub fixed_path: String,
    /// Substituted for `{separator}` when a location is known.
    pub separator: String,
}

/// Reverse geocoding configuration.
///
/// Geocoding is disabled while `api_key` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub api_key: String,
    pub endpoint: String,
    /// Quantization multiplier for cache keys.
    pub precision: f64,
    /// Optional language for returned addresses (e.g. `"nl"`).
    pub language: Option<String>,
}

/// Output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Optional path to an append-only diagnostic file.
    pub debug_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            move_files: false,
            separator: DEFAULT_SEPARATOR.to_string(),
            video: VideoConfig::default(),
            geocoding: GeocodingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fixed_path: "video".to_string(),
            separator: String::new(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_GEOCODE_ENDPOINT.to_string(),
            precision: DEFAULT_GEOCODE_PRECISION,
            language: None,
        }
    }
}

impl GeocodingConfig {
    pub fn enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Config {
    /// Resolve the config file path — same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("photo-mover.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            if path.is_some() {
                log::warn!(
                    "Config file not found at {}. Using defaults.",
                    config_path.display()
                );
            } else {
                log::debug!("No config file at {}", config_path.display());
            }
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {}", config_path.display()))?;
        Ok(config)
    }

    /// Reject values that would make a run misbehave.
    ///
    /// The geocoding precision must be finite and strictly positive; zero, negative or NaN
    /// multipliers collapse every coordinate onto one cache key.
    pub fn validate(&self) -> Result<()> {
        let precision = self.geocoding.precision;
        ensure!(
            precision.is_finite() && precision > 0.0,
            "geocoding.precision must be a positive finite number, got {precision}"
        );
        Ok(())
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}
