//! Looping video playback engine for screensaver hosts
//!
//! [`PlaybackCore`] is the entry point: a host constructs one per surface,
//! feeds it [`HostSignals`] from a single thread and draws whatever
//! [`PlaybackCore::draw`] hands back.

pub mod asset;
pub mod config;
pub mod host;
pub mod loader;
mod macros;
pub mod playback;
pub mod session;
pub mod surface;
pub mod video;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use asset::{MediaKind, VideoAsset};
pub use host::HostSignals;
pub use playback::PlaybackCore;
pub use surface::{PresentationSurface, SurfaceContent};
pub use video::{Backends, ClipDecoder, DecodeError, Frame, FrameRef, MediaBackend};
