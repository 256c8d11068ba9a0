//! Fixtures shared by unit and integration tests
//!
//! Compiled for this crate's own tests and, through the `test-support`
//! feature, for the integration tests under `tests/`.

use crate::asset::{MediaKind, VideoAsset};
use crate::playback::PlaybackCore;
use crate::video::{ClipDecoder, DecodeError, GifBackend, MediaBackend};
use common::ReadyState;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Write an 8x8 animated GIF with one solid-color frame per entry
pub fn write_gif(dir: &Path, name: &str, colors: &[Rgba<u8>], delay_ms: u32) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = GifEncoder::new(file);
    encoder.set_repeat(Repeat::Infinite).unwrap();

    for color in colors {
        let buffer = RgbaImage::from_pixel(8, 8, *color);
        encoder
            .encode_frame(image::Frame::from_parts(
                buffer,
                0,
                0,
                Delay::from_numer_denom_ms(delay_ms, 1),
            ))
            .unwrap();
    }

    path
}

/// Write a solid-color PNG to use as a pre-rendered poster
pub fn write_png(dir: &Path, name: &str, color: Rgba<u8>) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(4, 4, color).save(&path).unwrap();
    path
}

pub fn reference(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Pump zero-length ticks until the core leaves `Loading`
pub fn settle(core: &mut PlaybackCore) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while core.state() == ReadyState::Loading {
        assert!(Instant::now() < deadline, "load did not settle");
        std::thread::sleep(Duration::from_millis(5));
        core.on_tick(Duration::ZERO);
    }
}

/// Color of the top-left pixel of whatever the surface shows
pub fn shown_color(core: &PlaybackCore) -> Option<Rgba<u8>> {
    core.surface()
        .content()
        .frame()
        .map(|frame| *frame.image().get_pixel(0, 0))
}

/// GIF backend that takes a fixed time to open
pub struct SlowBackend {
    pub delay: Duration,
}

impl MediaBackend for SlowBackend {
    fn name(&self) -> &'static str {
        "slow-gif"
    }

    fn handles(&self, kind: MediaKind) -> bool {
        kind == MediaKind::AnimatedImage
    }

    fn open(&self, asset: &VideoAsset) -> Result<Box<dyn ClipDecoder>, DecodeError> {
        std::thread::sleep(self.delay);
        GifBackend.open(asset)
    }
}
