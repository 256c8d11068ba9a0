//! Media decoding for the playback core
//!
//! Decoding sits behind two traits so the core never depends on a specific
//! media stack:
//!
//! - [`MediaBackend`]: knows which media kinds it handles and opens assets
//! - [`ClipDecoder`]: an opened clip that answers "which frame is visible at
//!   position t"
//!
//! Submodules:
//!
//! - `frames`: the shared [`Frame`] type
//! - `gif`: in-process animated GIF backend (always available)
//! - `pipeline`: GStreamer backend for container video (`video` feature)
//! - `stats`: presentation statistics
//!
//! # Architecture
//!
//! Backends are opened on a loader thread, never on the host's signal thread.
//! The resulting decoder is moved to the owner thread once and then only
//! driven from there, so decoders need `Send` but not `Sync`.

mod frames;
mod gif;
#[cfg(feature = "video")]
mod pipeline;
mod stats;

pub use frames::{Frame, FrameRef};
pub use gif::GifBackend;
#[cfg(feature = "video")]
pub use pipeline::GstBackend;
pub use stats::PlaybackStats;

use crate::asset::{MediaKind, VideoAsset};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while opening or decoding media
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Media contains no frames")]
    Empty,

    #[error("No backend available for {0} media")]
    NoBackend(&'static str),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),
}

impl From<DecodeError> for common::SaverError {
    fn from(e: DecodeError) -> Self {
        Self::DecodeFailure(e.to_string())
    }
}

/// Opens assets of the media kinds it handles
pub trait MediaBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn handles(&self, kind: MediaKind) -> bool;

    fn open(&self, asset: &VideoAsset) -> Result<Box<dyn ClipDecoder>, DecodeError>;
}

/// An opened clip with random access by presentation time
pub trait ClipDecoder: Send {
    /// Total presentation length; positions are taken modulo or clamped to it
    fn duration(&self) -> Duration;

    fn dimensions(&self) -> (u32, u32);

    fn frame_rate(&self) -> Option<f64> {
        None
    }

    /// The frame visible at `position`
    ///
    /// Positions past the end return the final frame.
    fn frame_at(&mut self, position: Duration) -> Result<FrameRef, DecodeError>;

    fn final_frame(&mut self) -> Result<FrameRef, DecodeError> {
        let end = self.duration().saturating_sub(Duration::from_nanos(1));
        self.frame_at(end)
    }
}

/// Ordered set of media backends
///
/// Later registrations take precedence, so a host can override a built-in
/// backend for a media kind without rebuilding the whole set.
#[derive(Clone)]
pub struct Backends {
    backends: Vec<Arc<dyn MediaBackend>>,
}

impl Backends {
    pub fn empty() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    pub fn with(mut self, backend: impl MediaBackend + 'static) -> Self {
        self.register(Arc::new(backend));
        self
    }

    pub fn register(&mut self, backend: Arc<dyn MediaBackend>) {
        log::debug!("Registered media backend: {}", backend.name());
        self.backends.push(backend);
    }

    pub fn find(&self, kind: MediaKind) -> Option<&Arc<dyn MediaBackend>> {
        self.backends.iter().rev().find(|b| b.handles(kind))
    }

    pub fn supports(&self, kind: MediaKind) -> bool {
        self.find(kind).is_some()
    }

    pub fn open(&self, asset: &VideoAsset) -> Result<Box<dyn ClipDecoder>, DecodeError> {
        let backend = self
            .find(asset.kind())
            .ok_or(DecodeError::NoBackend(asset.kind().name()))?;

        log::debug!(
            "Opening {} with {} backend",
            asset.path().display(),
            backend.name()
        );
        backend.open(asset)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }
}

impl Default for Backends {
    #[allow(clippy::let_and_return)]
    fn default() -> Self {
        let backends = Self::empty().with(GifBackend);

        #[cfg(feature = "video")]
        let backends = backends.with(GstBackend::new());

        backends
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
