//! Common types for loopsaver.
//!
//! This crate defines the data model shared between the playback engine
//! (`saver`) and anything that embeds it: ready-states, playback options,
//! surface geometry, status snapshots and the error taxonomy.
//!
//! Everything here is serializable so a host shim can report status as JSON
//! without knowing engine internals.
//!
//! # Examples
//!
//! ```
//! use common::{PlaybackOptions, ScaleMode};
//!
//! // Options for a low-priority preview thumbnail
//! let options = PlaybackOptions {
//!     preview_mode: true,
//!     scale: ScaleMode::Fit,
//!     ..Default::default()
//! };
//! assert!(options.looping);
//! assert!(options.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by the playback core.
///
/// `AssetUnavailable` and `InvalidOptions` are returned synchronously from
/// `configure`. `DecodeFailure` is never returned across a signal; it is kept
/// as the core's last error and surfaced through [`PlaybackStatus`].
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaverError {
    #[error("Asset unavailable: {reference} ({reason})")]
    AssetUnavailable {
        reference: String,
        reason: UnavailableReason,
    },

    #[error("Invalid playback options: {0}")]
    InvalidOptions(String),

    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    #[error("Poster generation timed out after {timeout_ms}ms")]
    PosterGenerationTimeout { timeout_ms: u64 },
}

impl SaverError {
    pub fn unavailable(reference: impl Into<String>, reason: UnavailableReason) -> Self {
        Self::AssetUnavailable {
            reference: reference.into(),
            reason,
        }
    }
}

/// Why an asset reference could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnavailableReason {
    /// Nothing exists at the resolved path
    NotFound,
    /// The file exists but cannot be opened for reading
    PermissionDenied,
    /// The path names a directory or special file
    NotAFile,
    /// No media backend handles this file type
    UnsupportedFormat,
    /// The reference is empty or not a local path / `file://` URL
    InvalidReference,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::NotAFile => "not a regular file",
            Self::UnsupportedFormat => "unsupported format",
            Self::InvalidReference => "invalid reference",
        };
        f.write_str(text)
    }
}

/// Discrete playback status governing which visual source is presented.
///
/// ```text
/// Unloaded -> Loading -> Ready -> Playing <-> Paused
///     any state -> Failed        configure -> Loading
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReadyState {
    #[default]
    Unloaded,
    Loading,
    Ready,
    Playing,
    Paused,
    Failed,
}

impl ReadyState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Failed => "failed",
        }
    }

    /// Whether the surface is fed by decoded video rather than the poster
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Image scaling/fitting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Center image without scaling
    Center,
    /// Scale to fill entire surface (may crop)
    #[default]
    Fill,
    /// Scale to fit within surface (may have letterboxing)
    Fit,
    /// Stretch to fill surface (may distort)
    Stretch,
    /// Tile the image
    Tile,
}

impl ScaleMode {
    /// Parse scale mode name from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "center" => Some(Self::Center),
            "fill" => Some(Self::Fill),
            "fit" => Some(Self::Fit),
            "stretch" => Some(Self::Stretch),
            "tile" => Some(Self::Tile),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Fill => "fill",
            Self::Fit => "fit",
            Self::Stretch => "stretch",
            Self::Tile => "tile",
        }
    }
}

/// Pixel bounds of the host's drawing target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Options recognized by `configure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackOptions {
    /// Seek back to zero at end of stream instead of pausing
    #[serde(rename = "loop", default = "default_true")]
    pub looping: bool,

    /// Begin playing as soon as the asset is ready
    #[serde(default = "default_true")]
    pub autoplay: bool,

    /// Skip playback entirely and only present the poster frame
    #[serde(default)]
    pub preview_mode: bool,

    /// Playback rate multiplier applied to tick durations
    #[serde(default = "default_rate")]
    pub rate: f64,

    #[serde(default)]
    pub scale: ScaleMode,

    /// Audio is never rendered; kept so hosts can state the policy explicitly
    #[serde(default = "default_true")]
    pub muted: bool,

    /// Upper bound on how long poster generation may block
    #[serde(default = "default_poster_timeout_ms")]
    pub poster_timeout_ms: u64,

    /// Pre-rendered poster image to use instead of decoding the first frame
    #[serde(default)]
    pub poster_image: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}
fn default_rate() -> f64 {
    1.0
}
fn default_poster_timeout_ms() -> u64 {
    500
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            looping: true,
            autoplay: true,
            preview_mode: false,
            rate: default_rate(),
            scale: ScaleMode::default(),
            muted: true,
            poster_timeout_ms: default_poster_timeout_ms(),
            poster_image: None,
        }
    }
}

impl PlaybackOptions {
    pub fn poster_timeout(&self) -> Duration {
        Duration::from_millis(self.poster_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), SaverError> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(SaverError::InvalidOptions(format!(
                "rate must be a positive number, got {}",
                self.rate
            )));
        }
        if self.poster_timeout_ms == 0 {
            return Err(SaverError::InvalidOptions(
                "poster_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Counters describing what the surface has presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PresentationStats {
    pub frames_presented: u64,
    pub loops_completed: u64,
    pub decode_errors: u64,
}

/// Snapshot of a playback core, suitable for logging or JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub version: String,
    pub state: ReadyState,
    pub asset: Option<String>,
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    pub looping: bool,
    pub preview_mode: bool,
    pub bounds: Bounds,
    pub showing: SurfaceSource,
    pub last_error: Option<SaverError>,
    pub stats: PresentationStats,
}

/// Which visual source the presentation surface currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceSource {
    Blank,
    Poster,
    Live,
}
