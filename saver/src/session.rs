//! Position tracking for an opened clip

use crate::video::{ClipDecoder, DecodeError, FrameRef};
use common::PlaybackOptions;
use std::time::Duration;

/// What a position advance produced
pub enum Advance {
    /// Still inside the clip, `loops` wraps were taken to get here
    Frame { frame: FrameRef, loops: u64 },
    /// Non-looping clip ran past its end
    Ended { frame: FrameRef },
}

/// An opened clip and the playback position within it
pub struct PlaybackSession {
    decoder: Box<dyn ClipDecoder>,
    position: Duration,
    duration: Duration,
    looping: bool,
    rate: f64,
}

impl PlaybackSession {
    pub fn new(decoder: Box<dyn ClipDecoder>, options: &PlaybackOptions) -> Self {
        let duration = decoder.duration();
        Self {
            decoder,
            position: Duration::ZERO,
            duration,
            looping: options.looping,
            rate: options.rate,
        }
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.decoder.dimensions()
    }

    pub fn frame_rate(&self) -> Option<f64> {
        self.decoder.frame_rate()
    }

    pub fn is_at_end(&self) -> bool {
        !self.duration.is_zero() && self.position >= self.duration
    }

    pub fn rewind(&mut self) {
        self.position = Duration::ZERO;
    }

    /// Frame at the current position
    pub fn current_frame(&mut self) -> Result<FrameRef, DecodeError> {
        if self.is_at_end() {
            self.decoder.final_frame()
        } else {
            self.decoder.frame_at(self.position)
        }
    }

    /// Move the position forward by `elapsed` wall time, scaled by the rate
    pub fn advance(&mut self, elapsed: Duration) -> Result<Advance, DecodeError> {
        // Float-to-int `as` saturates, so huge ticks clamp instead of wrapping
        let step = Duration::from_nanos((elapsed.as_nanos() as f64 * self.rate).round() as u64);
        let target = self.position.saturating_add(step);

        if self.duration.is_zero() {
            // Single still frame
            return Ok(Advance::Frame {
                frame: self.decoder.frame_at(Duration::ZERO)?,
                loops: 0,
            });
        }

        if target < self.duration {
            self.position = target;
            return Ok(Advance::Frame {
                frame: self.decoder.frame_at(target)?,
                loops: 0,
            });
        }

        if self.looping {
            let total = self.duration.as_nanos();
            let target_nanos = target.as_nanos();
            let loops = u64::try_from(target_nanos / total).unwrap_or(u64::MAX);
            let wrapped = u64::try_from(target_nanos % total).unwrap_or(0);
            self.position = Duration::from_nanos(wrapped);
            return Ok(Advance::Frame {
                frame: self.decoder.frame_at(self.position)?,
                loops,
            });
        }

        self.position = self.duration;
        Ok(Advance::Ended {
            frame: self.decoder.final_frame()?,
        })
    }
}
