use crate::validate_enum;
use anyhow::{Context, Result};
use common::{Bounds, PlaybackOptions, ScaleMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralSettings,

    #[serde(default)]
    pub playback: PlaybackSettings,

    #[serde(default)]
    pub host: HostSettings,
}

/// General settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralSettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// What to play and how
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    /// Default asset when none is given on the command line
    #[serde(default)]
    pub asset: Option<String>,

    #[serde(default = "default_true", rename = "loop")]
    pub looping: bool,

    #[serde(default = "default_true")]
    pub autoplay: bool,

    #[serde(default)]
    pub preview_mode: bool,

    #[serde(default = "default_rate")]
    pub rate: f64,

    #[serde(default = "default_scale")]
    pub scale: String,

    #[serde(default = "default_true")]
    pub muted: bool,

    /// Pre-rendered poster image shown instead of the first frame
    #[serde(default)]
    pub poster: Option<String>,

    #[serde(default = "default_poster_timeout_ms")]
    pub poster_timeout_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            asset: None,
            looping: true,
            autoplay: true,
            preview_mode: false,
            rate: default_rate(),
            scale: default_scale(),
            muted: true,
            poster: None,
            poster_timeout_ms: default_poster_timeout_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_rate() -> f64 {
    1.0
}
fn default_scale() -> String {
    "fill".to_string()
}
fn default_poster_timeout_ms() -> u64 {
    500
}

/// Settings for the bundled host shim
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostSettings {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    33
} // ~30 fps
fn default_width() -> u32 {
    1920
}
fn default_height() -> u32 {
    1080
}

impl HostSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded configuration from {}", path.display());
        config.validate()?;

        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("loopsaver");

        Ok(config_dir.join("config.toml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        self.validate_log_level(&self.general.log_level)?;
        self.validate_scale(&self.playback.scale)?;

        if self.host.tick_interval_ms == 0 {
            anyhow::bail!("Tick interval must be greater than zero");
        }
        if self.host.bounds().is_empty() {
            anyhow::bail!("Surface size must be non-zero: {}", self.host.bounds());
        }

        self.to_options()?.validate()?;
        Ok(())
    }

    fn validate_log_level(&self, level: &str) -> Result<()> {
        validate_enum!(level, "trace", "debug", "info", "warn", "error")
    }

    fn validate_scale(&self, scale: &str) -> Result<()> {
        validate_enum!(scale, "center", "fill", "fit", "stretch", "tile")
    }

    /// Playback options described by the `[playback]` section
    pub fn to_options(&self) -> Result<PlaybackOptions> {
        let playback = &self.playback;
        let scale = ScaleMode::parse(&playback.scale)
            .with_context(|| format!("Invalid scale mode: {}", playback.scale))?;

        Ok(PlaybackOptions {
            looping: playback.looping,
            autoplay: playback.autoplay,
            preview_mode: playback.preview_mode,
            rate: playback.rate,
            scale,
            muted: playback.muted,
            poster_timeout_ms: playback.poster_timeout_ms,
            poster_image: playback
                .poster
                .as_deref()
                .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref())),
        })
    }
}
