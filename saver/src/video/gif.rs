//! Animated GIF backend
//!
//! GIFs are small enough to decode completely when opened. Every frame is
//! kept as a full-canvas RGBA image together with its start time, so random
//! access by position is a binary search.

use super::{ClipDecoder, DecodeError, Frame, FrameRef, MediaBackend};
use crate::asset::{MediaKind, VideoAsset};
use image::AnimationDecoder;
use image::codecs::gif::GifDecoder;
use std::io::BufReader;
use std::path::Path;
use std::time::{Duration, Instant};

/// Frames faster than this are clamped, matching how browsers treat 0-delay GIFs
const MIN_FRAME_DELAY: Duration = Duration::from_millis(10);

/// Backend for `.gif` assets
#[derive(Debug, Clone, Copy, Default)]
pub struct GifBackend;

impl MediaBackend for GifBackend {
    fn name(&self) -> &'static str {
        "gif"
    }

    fn handles(&self, kind: MediaKind) -> bool {
        kind == MediaKind::AnimatedImage
    }

    fn open(&self, asset: &VideoAsset) -> Result<Box<dyn ClipDecoder>, DecodeError> {
        Ok(Box::new(GifClip::load(asset.path())?))
    }
}

/// A fully decoded GIF animation
pub struct GifClip {
    /// (start time, frame), ordered by start time
    frames: Vec<(Duration, FrameRef)>,
    duration: Duration,
    dimensions: (u32, u32),
}

impl GifClip {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        let load_start = Instant::now();

        let reader = BufReader::new(std::fs::File::open(path)?);
        let decoder = GifDecoder::new(reader)?;

        let mut frames = Vec::new();
        let mut start = Duration::ZERO;

        for (idx, frame_result) in decoder.into_frames().enumerate() {
            let frame = frame_result?;

            let (numer, denom) = frame.delay().numer_denom_ms();
            let delay = if denom == 0 {
                MIN_FRAME_DELAY
            } else {
                Duration::from_micros(u64::from(numer) * 1000 / u64::from(denom))
                    .max(MIN_FRAME_DELAY)
            };

            if idx < 5 && delay.as_secs() > 1 {
                log::debug!("GIF frame {} has delay: {:.1}s", idx, delay.as_secs_f32());
            }

            frames.push((start, Frame::new(frame.into_buffer()).into_shared()));
            start += delay;
        }

        let dimensions = frames
            .first()
            .map(|(_, f)| f.dimensions())
            .ok_or(DecodeError::Empty)?;

        log::info!(
            "Decoded GIF {} ({}x{}, {} frames, {:.2}s) in {:.0}ms",
            path.display(),
            dimensions.0,
            dimensions.1,
            frames.len(),
            start.as_secs_f64(),
            load_start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Self {
            frames,
            duration: start,
            dimensions,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn index_at(&self, position: Duration) -> usize {
        self.frames
            .partition_point(|(start, _)| *start <= position)
            .saturating_sub(1)
    }
}

impl ClipDecoder for GifClip {
    fn duration(&self) -> Duration {
        self.duration
    }

    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn frame_rate(&self) -> Option<f64> {
        let secs = self.duration.as_secs_f64();
        (secs > 0.0).then(|| self.frames.len() as f64 / secs)
    }

    fn frame_at(&mut self, position: Duration) -> Result<FrameRef, DecodeError> {
        let idx = self.index_at(position);
        log::trace!("GIF position {:?} -> frame {}", position, idx);
        self.frames
            .get(idx)
            .map(|(_, frame)| FrameRef::clone(frame))
            .ok_or(DecodeError::Empty)
    }
}
