//! Host-facing signal interface
//!
//! A host runtime (screensaver framework, desktop shell, or the bundled CLI)
//! only ever talks to a core through these calls, always from one thread.

use common::{Bounds, PlaybackOptions, SaverError};
use std::time::Duration;

pub trait HostSignals {
    /// Bind an asset; fails synchronously only when the reference can't be used
    fn configure(&mut self, reference: &str, options: PlaybackOptions) -> Result<(), SaverError>;

    fn start(&mut self);

    fn stop(&mut self);

    /// Wall time elapsed since the previous tick
    fn on_tick(&mut self, elapsed: Duration);

    fn on_resize(&mut self, bounds: Bounds);
}
