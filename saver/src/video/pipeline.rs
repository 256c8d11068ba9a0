//! GStreamer backend for container video
//!
//! Builds a `uridecodebin ! videoconvert ! appsink` pipeline that decodes to
//! RGBA. The appsink runs unsynchronized with a small queue, so decoding is
//! paced by how fast the playback core pulls frames rather than by a clock:
//! the host's ticks are the only clock.
//!
//! Frame lookups never wait on the pipeline. They drain whatever samples are
//! queued and keep showing the last frame when the decoder has fallen behind.
//! Wrapping back to the start sends a flushing seek and returns immediately;
//! frames from the new segment are picked up on later lookups.
//!
//! Audio pads are terminated in a `fakesink`; audio is never rendered.

use super::{ClipDecoder, DecodeError, Frame, FrameRef, MediaBackend};
use crate::asset::{MediaKind, VideoAsset};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

const PREROLL_TIMEOUT: Duration = Duration::from_secs(10);

/// Initialize GStreamer (idempotent, safe to call multiple times)
pub fn initialize_gstreamer() -> Result<(), DecodeError> {
    static GSTREAMER_INITIALIZED: OnceLock<Result<(), String>> = OnceLock::new();

    GSTREAMER_INITIALIZED
        .get_or_init(|| {
            gst::init().map_err(|e| e.to_string())?;
            log::info!("GStreamer initialized");
            Ok(())
        })
        .clone()
        .map_err(DecodeError::Pipeline)
}

fn clock_time(duration: Duration) -> gst::ClockTime {
    gst::ClockTime::from_nseconds(duration.as_nanos().min(u128::from(u64::MAX)) as u64)
}

fn pipeline_error(context: &str, e: impl std::fmt::Display) -> DecodeError {
    DecodeError::Pipeline(format!("{}: {}", context, e))
}

/// Backend for mp4/mov/m4v/webm/mkv assets
#[derive(Debug, Default)]
pub struct GstBackend;

impl GstBackend {
    pub fn new() -> Self {
        Self
    }
}

impl MediaBackend for GstBackend {
    fn name(&self) -> &'static str {
        "gstreamer"
    }

    fn handles(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Movie
    }

    fn open(&self, asset: &VideoAsset) -> Result<Box<dyn ClipDecoder>, DecodeError> {
        Ok(Box::new(GstClip::open(asset.path())?))
    }
}

/// Build the decode pipeline
///
/// Returns (pipeline, app_sink) where app_sink delivers RGBA samples
fn build_pipeline(path: &Path) -> Result<(gst::Pipeline, gst_app::AppSink), DecodeError> {
    log::info!("Creating GStreamer pipeline for: {}", path.display());

    let uri = url::Url::from_file_path(path)
        .map_err(|_| DecodeError::Pipeline(format!("Not an absolute path: {}", path.display())))?;

    let pipeline = gst::Pipeline::new();

    let source = gst::ElementFactory::make("uridecodebin")
        .property("uri", uri.as_str())
        .build()
        .map_err(|e| pipeline_error("Failed to create uridecodebin", e))?;

    let convert = gst::ElementFactory::make("videoconvert")
        .build()
        .map_err(|e| pipeline_error("Failed to create videoconvert", e))?;

    let app_sink = gst_app::AppSink::builder()
        .caps(
            &gst_video::VideoCapsBuilder::new()
                .format(gst_video::VideoFormat::Rgba)
                .build(),
        )
        .sync(false)
        .max_buffers(2)
        .drop(false)
        .build();

    pipeline
        .add_many([&source, &convert, app_sink.upcast_ref()])
        .map_err(|e| pipeline_error("Failed to add elements", e))?;

    convert
        .link(&app_sink)
        .map_err(|e| pipeline_error("Failed to link videoconvert to appsink", e))?;

    let convert_weak = convert.downgrade();
    let pipeline_weak = pipeline.downgrade();
    source.connect_pad_added(move |_src, src_pad| {
        let caps = src_pad
            .current_caps()
            .unwrap_or_else(|| src_pad.query_caps(None));
        let Some(structure) = caps.structure(0) else {
            return;
        };
        let name = structure.name();

        if name.starts_with("video/") {
            let Some(sink_pad) = convert_weak.upgrade().and_then(|c| c.static_pad("sink")) else {
                return;
            };
            if !sink_pad.is_linked() {
                match src_pad.link(&sink_pad) {
                    Ok(_) => log::debug!("Linked video pad: {}", name),
                    Err(e) => log::warn!("Failed to link video pad: {:?}", e),
                }
            }
        } else if name.starts_with("audio/") {
            let Some(pipeline) = pipeline_weak.upgrade() else {
                return;
            };
            let fakesink = match gst::ElementFactory::make("fakesink")
                .property("sync", false)
                .build()
            {
                Ok(sink) => sink,
                Err(e) => {
                    log::warn!("Failed to create fakesink for audio: {}", e);
                    return;
                }
            };
            if pipeline.add(&fakesink).is_err() {
                return;
            }
            let _ = fakesink.sync_state_with_parent();
            if let Some(sink_pad) = fakesink.static_pad("sink")
                && let Err(e) = src_pad.link(&sink_pad)
            {
                log::warn!("Failed to discard audio pad: {:?}", e);
            }
        }
    });

    Ok((pipeline, app_sink))
}

/// Convert an RGBA sample to (presentation time, frame)
fn sample_to_frame(sample: &gst::Sample) -> Result<(Duration, FrameRef), DecodeError> {
    let buffer = sample
        .buffer()
        .ok_or_else(|| DecodeError::Pipeline("Sample without buffer".to_string()))?;
    let caps = sample
        .caps()
        .ok_or_else(|| DecodeError::Pipeline("Sample without caps".to_string()))?;
    let info = gst_video::VideoInfo::from_caps(caps)
        .map_err(|e| pipeline_error("Invalid video caps", e))?;

    let map = buffer
        .map_readable()
        .map_err(|e| pipeline_error("Failed to map buffer", e))?;

    let stride = info.stride().first().copied().unwrap_or(0).max(0) as usize;
    let frame = Frame::from_rgba_rows(info.width(), info.height(), stride, map.as_slice())
        .ok_or_else(|| DecodeError::Pipeline("Frame buffer shorter than its caps".to_string()))?;

    let pts = buffer
        .pts()
        .map(|t| Duration::from_nanos(t.nseconds()))
        .unwrap_or(Duration::ZERO);

    Ok((pts, frame.into_shared()))
}

/// A container video opened through GStreamer
pub struct GstClip {
    pipeline: gst::Pipeline,
    app_sink: gst_app::AppSink,
    duration: Duration,
    dimensions: (u32, u32),
    frame_rate: Option<f64>,

    /// Frame currently on screen and its pts
    current: Option<(Duration, FrameRef)>,

    /// Next decoded frame, held until its pts is reached
    lookahead: Option<(Duration, FrameRef)>,

    /// A seek was sent and no frame of the new segment has arrived yet
    seeking: bool,
}

impl GstClip {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        initialize_gstreamer()?;

        let (pipeline, app_sink) = build_pipeline(path.as_ref())?;

        pipeline
            .set_state(gst::State::Paused)
            .map_err(|e| pipeline_error("Failed to set pipeline to Paused state", e))?;

        let mut clip = Self {
            pipeline,
            app_sink,
            duration: Duration::ZERO,
            dimensions: (0, 0),
            frame_rate: None,
            current: None,
            lookahead: None,
            seeking: false,
        };

        let preroll = clip.app_sink.try_pull_preroll(clock_time(PREROLL_TIMEOUT));
        clip.check_bus()?;
        let sample = preroll.ok_or(DecodeError::Timeout("preroll"))?;

        if let Some(structure) = sample.caps().and_then(|c| c.structure(0))
            && let Ok(framerate) = structure.get::<gst::Fraction>("framerate")
            && framerate.denom() != 0
            && framerate.numer() != 0
        {
            let fps = framerate.numer() as f64 / framerate.denom() as f64;
            log::info!("Detected video FPS: {:.2}", fps);
            clip.frame_rate = Some(fps);
        }

        let (pts, first) = sample_to_frame(&sample)?;
        clip.dimensions = first.dimensions();

        clip.duration = clip
            .pipeline
            .query_duration::<gst::ClockTime>()
            .map(|d| Duration::from_nanos(d.nseconds()))
            .filter(|d| !d.is_zero())
            .ok_or_else(|| DecodeError::Pipeline("Could not determine duration".to_string()))?;

        clip.current = Some((pts, first));

        clip.pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| pipeline_error("Failed to set pipeline to Playing state", e))?;

        log::info!(
            "GStreamer clip ready: {}x{}, duration {:.2}s",
            clip.dimensions.0,
            clip.dimensions.1,
            clip.duration.as_secs_f64()
        );

        Ok(clip)
    }

    /// Surface the first pipeline error posted on the bus, draining the rest
    fn check_bus(&self) -> Result<(), DecodeError> {
        let Some(bus) = self.pipeline.bus() else {
            return Ok(());
        };

        while let Some(msg) = bus.pop() {
            if let gst::MessageView::Error(err) = msg.view() {
                log::error!(
                    "GStreamer error: {} (debug: {:?})",
                    err.error(),
                    err.debug()
                );
                return Err(DecodeError::Pipeline(err.error().to_string()));
            }
        }

        Ok(())
    }

    /// Take the next decoded frame if one is queued
    ///
    /// `None` when the decoder has nothing ready yet or reached the end.
    fn try_pull(&mut self) -> Result<Option<(Duration, FrameRef)>, DecodeError> {
        match self.app_sink.try_pull_sample(gst::ClockTime::ZERO) {
            Some(sample) => sample_to_frame(&sample).map(Some),
            None => Ok(None),
        }
    }

    /// Send a flushing seek without waiting for it to complete
    ///
    /// The flush empties the appsink queue, so every sample pulled
    /// afterwards belongs to the new segment.
    fn begin_seek(&mut self, position: Duration) -> Result<(), DecodeError> {
        log::debug!("Seeking to {:?}", position);

        self.pipeline
            .seek_simple(
                gst::SeekFlags::FLUSH | gst::SeekFlags::ACCURATE,
                clock_time(position),
            )
            .map_err(|e| pipeline_error("Seek failed", e))?;

        self.lookahead = None;
        self.seeking = true;
        Ok(())
    }

    fn held_frame(&self) -> Result<FrameRef, DecodeError> {
        self.current
            .as_ref()
            .map(|(_, frame)| FrameRef::clone(frame))
            .ok_or(DecodeError::Empty)
    }
}

impl ClipDecoder for GstClip {
    fn duration(&self) -> Duration {
        self.duration
    }

    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }

    fn frame_at(&mut self, position: Duration) -> Result<FrameRef, DecodeError> {
        self.check_bus()?;

        if !self.seeking && matches!(&self.current, Some((pts, _)) if position < *pts) {
            self.begin_seek(position)?;
        }

        if self.seeking {
            match self.try_pull()? {
                Some(first) => {
                    self.current = Some(first);
                    self.seeking = false;
                }
                None => return self.held_frame(),
            }
        }

        loop {
            if self.lookahead.is_none() {
                self.lookahead = self.try_pull()?;
            }
            match &self.lookahead {
                Some((pts, _)) if *pts <= position => self.current = self.lookahead.take(),
                _ => break,
            }
        }

        self.held_frame()
    }
}

impl Drop for GstClip {
    fn drop(&mut self) {
        log::debug!("GstClip::drop - Stopping pipeline");

        match self.pipeline.set_state(gst::State::Null) {
            Ok(_) => {
                let (result, current, _pending) =
                    self.pipeline.state(Some(clock_time(Duration::from_secs(2))));
                if let Err(e) = result {
                    log::warn!("Failed to reach Null state (current {:?}): {:?}", current, e);
                }
            }
            Err(e) => log::warn!("Failed to set pipeline state to Null: {}", e),
        }

        if let Some(bus) = self.pipeline.bus() {
            let mut drained = 0;
            while bus.pop().is_some() {
                drained += 1;
            }
            if drained > 0 {
                log::debug!("Drained {} pending messages from bus", drained);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Instant;

    /// Encoder and muxer pairs tried in order when generating a test clip
    const ENCODERS: &[(&str, &str, &str)] = &[
        ("x264enc", "mp4mux", "mp4"),
        ("vp8enc", "webmmux", "webm"),
        ("theoraenc", "matroskamux", "mkv"),
    ];

    /// Encode a 2s, 10fps test pattern; `None` when no encoder is installed
    fn write_clip(dir: &Path) -> Option<PathBuf> {
        initialize_gstreamer().unwrap();

        let (encoder, muxer, ext) = ENCODERS.iter().copied().find(|(encoder, muxer, _)| {
            gst::ElementFactory::find(encoder).is_some() && gst::ElementFactory::find(muxer).is_some()
        })?;
        let path = dir.join(format!("clip.{}", ext));

        let description = format!(
            "videotestsrc num-buffers=20 ! video/x-raw,width=64,height=48,framerate=10/1 \
             ! videoconvert ! {} ! {} ! filesink location={}",
            encoder,
            muxer,
            path.display()
        );
        let pipeline = gst::parse::launch(&description).unwrap();
        pipeline.set_state(gst::State::Playing).unwrap();

        let bus = pipeline.bus().unwrap();
        let msg = bus
            .timed_pop_filtered(
                gst::ClockTime::from_seconds(30),
                &[gst::MessageType::Eos, gst::MessageType::Error],
            )
            .expect("clip encoding timed out");
        pipeline.set_state(gst::State::Null).unwrap();

        match msg.view() {
            gst::MessageView::Eos(_) => Some(path),
            _ => panic!("clip encoding failed: {:?}", msg),
        }
    }

    /// Repeat a lookup until `done` holds for the clip
    fn poll_until(
        clip: &mut GstClip,
        position: Duration,
        done: impl Fn(&GstClip) -> bool,
    ) -> FrameRef {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let frame = clip.frame_at(position).unwrap();
            if done(clip) {
                return frame;
            }
            assert!(Instant::now() < deadline, "decoder never caught up to {:?}", position);
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn current_pts(clip: &GstClip) -> Duration {
        clip.current.as_ref().map(|(pts, _)| *pts).unwrap()
    }

    fn open_test_clip(dir: &tempfile::TempDir) -> Option<GstClip> {
        let Some(path) = write_clip(dir.path()) else {
            eprintln!("no video encoder available, skipping");
            return None;
        };
        Some(GstClip::open(&path).unwrap())
    }

    #[test]
    fn test_open_reports_clip_properties() {
        let dir = tempfile::tempdir().unwrap();
        let Some(mut clip) = open_test_clip(&dir) else {
            return;
        };

        assert_eq!(clip.dimensions(), (64, 48));
        let duration = clip.duration();
        assert!(duration > Duration::from_millis(1500) && duration < Duration::from_millis(2500));
        if let Some(fps) = clip.frame_rate() {
            assert!((fps - 10.0).abs() < 0.5);
        }

        let first = clip.frame_at(Duration::ZERO).unwrap();
        assert_eq!(first.dimensions(), (64, 48));
        assert_eq!(current_pts(&clip), Duration::ZERO);
    }

    #[test]
    fn test_lookahead_advances_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let Some(mut clip) = open_test_clip(&dir) else {
            return;
        };

        let mut last = Duration::ZERO;
        for step in 1..=10 {
            let position = Duration::from_millis(step * 100);
            poll_until(&mut clip, position, |c| {
                current_pts(c) + Duration::from_millis(100) > position
            });

            let pts = current_pts(&clip);
            assert!(pts >= last, "pts went backwards: {:?} -> {:?}", last, pts);
            assert!(pts <= position);
            if let Some((next, _)) = clip.lookahead.as_ref() {
                assert!(*next > position);
            }
            last = pts;
        }
    }

    #[test]
    fn test_wrap_seeks_without_blocking() {
        let dir = tempfile::tempdir().unwrap();
        let Some(mut clip) = open_test_clip(&dir) else {
            return;
        };

        let late = Duration::from_millis(1500);
        let before = poll_until(&mut clip, late, |c| current_pts(c) >= Duration::from_millis(1400));

        let started = Instant::now();
        let held = clip.frame_at(Duration::from_millis(50)).unwrap();
        assert!(started.elapsed() < Duration::from_millis(500));
        if clip.seeking {
            assert!(Arc::ptr_eq(&held, &before));
        }

        poll_until(&mut clip, Duration::from_millis(50), |c| {
            !c.seeking && current_pts(c) <= Duration::from_millis(50)
        });
    }

    #[test]
    fn test_end_of_stream_holds_final_frame() {
        let dir = tempfile::tempdir().unwrap();
        let Some(mut clip) = open_test_clip(&dir) else {
            return;
        };

        let duration = clip.duration();
        poll_until(&mut clip, duration, |c| {
            c.app_sink.is_eos() && c.lookahead.is_none()
        });
        let last = current_pts(&clip);
        assert!(last + Duration::from_millis(200) >= duration);

        // Nothing left to decode; lookups keep returning the last frame
        let final_frame = clip.final_frame().unwrap();
        let again = clip.frame_at(duration).unwrap();
        assert!(Arc::ptr_eq(&final_frame, &again));
        assert_eq!(current_pts(&clip), last);

        // A looping wrap after end of stream restarts decoding
        poll_until(&mut clip, Duration::ZERO, |c| {
            !c.seeking && current_pts(c) < Duration::from_millis(100)
        });
    }

    #[test]
    fn test_backend_handles_movies_only() {
        let backend = GstBackend::new();
        assert!(backend.handles(MediaKind::Movie));
        assert!(!backend.handles(MediaKind::AnimatedImage));
    }
}
