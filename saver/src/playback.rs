//! Playback core
//!
//! Owns one asset, its poster frame and the presentation surface, and keeps
//! the surface in sync with the playback state as host signals arrive.
//! Every signal runs on the owner thread; background loads are only adopted
//! at the start of a signal.

use crate::asset::VideoAsset;
use crate::host::HostSignals;
use crate::loader::{LoadEvent, LoadMode, LoadOutcome, LoadPoll, Loader, PendingLoad};
use crate::session::{Advance, PlaybackSession};
use crate::surface::{PresentationSurface, SurfaceContent};
use crate::video::{Backends, DecodeError, Frame, FrameRef, PlaybackStats};
use common::{
    Bounds, PlaybackOptions, PlaybackStatus, ReadyState, SaverError, UnavailableReason,
};
use image::RgbaImage;
use std::time::{Duration, Instant};

const STATS_LOG_INTERVAL: Duration = Duration::from_secs(10);

struct CachedPoster {
    asset_id: u64,
    frame: FrameRef,
}

pub struct PlaybackCore {
    loader: Loader,
    asset: Option<VideoAsset>,
    options: PlaybackOptions,
    state: ReadyState,
    session: Option<PlaybackSession>,
    poster: Option<CachedPoster>,
    /// Poster generation already failed for the current asset
    poster_failed: bool,
    pending_load: Option<PendingLoad>,
    pending_poster: Option<PendingLoad>,
    play_requested: bool,
    surface: PresentationSurface,
    last_error: Option<SaverError>,
    stats: PlaybackStats,
}

impl PlaybackCore {
    pub fn new(bounds: Bounds) -> Self {
        Self::with_backends(bounds, Backends::default())
    }

    pub fn with_backends(bounds: Bounds, backends: Backends) -> Self {
        log::debug!("Creating playback core at {} with backends {:?}", bounds, backends.names());
        let options = PlaybackOptions::default();
        Self {
            loader: Loader::new(backends),
            surface: PresentationSurface::new(bounds, options.scale),
            asset: None,
            options,
            state: ReadyState::Unloaded,
            session: None,
            poster: None,
            poster_failed: false,
            pending_load: None,
            pending_poster: None,
            play_requested: false,
            last_error: None,
            stats: PlaybackStats::new(),
        }
    }

    /// Bind the core to an asset
    ///
    /// Resolution problems are reported here and leave the core untouched.
    /// Malformed media only shows up once the background load runs, as a
    /// transition to [`ReadyState::Failed`].
    ///
    /// Waits at most the poster timeout for the poster, so the surface has
    /// something to show while the clip keeps opening in the background.
    pub fn configure(&mut self, reference: &str, options: PlaybackOptions) -> Result<(), SaverError> {
        options.validate()?;
        let asset = VideoAsset::resolve(reference)?;

        if !self.loader.backends().supports(asset.kind()) {
            log::warn!(
                "No backend compiled in for {} assets ({})",
                asset.kind().name(),
                asset.path().display()
            );
            return Err(SaverError::unavailable(
                reference,
                UnavailableReason::UnsupportedFormat,
            ));
        }

        if !options.muted {
            log::debug!("Audio output is not supported, playing muted");
        }

        log::info!(
            "Configured {} ({}, loop={}, autoplay={}, preview={}, rate={})",
            asset.path().display(),
            asset.kind().name(),
            options.looping,
            options.autoplay,
            options.preview_mode,
            options.rate
        );

        self.cancel_background();
        self.session = None;
        self.poster = None;
        self.poster_failed = false;
        self.last_error = None;
        self.stats.reset();
        self.surface.set_scale_mode(options.scale);
        self.surface.present(SurfaceContent::Blank);
        self.play_requested = options.autoplay && !options.preview_mode;
        self.asset = Some(asset);
        self.options = options;

        self.begin_load();
        Ok(())
    }

    /// Begin or resume playback
    ///
    /// Shows the poster until the clip is ready, waiting for it within the
    /// poster timeout when it has not been decoded yet.
    pub fn start(&mut self) {
        self.adopt_background();

        match self.state {
            ReadyState::Playing => {}
            ReadyState::Failed => {
                log::debug!("Ignoring start while failed");
            }
            ReadyState::Loading => {
                self.play_requested = !self.options.preview_mode;
                self.await_poster();
                self.show_poster_or_blank();
            }
            ReadyState::Ready => {
                if self.options.preview_mode {
                    self.show_poster_or_blank();
                } else {
                    self.play();
                }
            }
            ReadyState::Paused => {
                if let Some(session) = self.session.as_mut()
                    && session.is_at_end()
                {
                    session.rewind();
                }
                self.play();
            }
            ReadyState::Unloaded => {
                if self.asset.is_none() {
                    log::warn!("Start requested with no asset configured");
                    return;
                }
                self.play_requested = !self.options.preview_mode;
                self.show_poster_or_blank();
                self.begin_load();
            }
        }
    }

    pub fn stop(&mut self) {
        self.cancel_background();
        self.session = None;
        self.play_requested = false;

        if self.state != ReadyState::Failed {
            self.set_state(ReadyState::Unloaded);
        }
        self.show_poster_or_blank();
    }

    pub fn on_tick(&mut self, elapsed: Duration) {
        self.adopt_background();

        if self.state != ReadyState::Playing {
            return;
        }

        let result = match self.session.as_mut() {
            Some(session) => session.advance(elapsed),
            None => return,
        };

        match result {
            Ok(Advance::Frame { frame, loops }) => {
                if loops > 0 {
                    log::debug!("Wrapped around {} time(s)", loops);
                    self.stats.record_loops(loops);
                }
                self.present_live(frame);
            }
            Ok(Advance::Ended { frame }) => {
                self.present_live(frame);
                log::info!("Reached end of clip");
                self.set_state(ReadyState::Paused);
            }
            Err(e) => self.fail(e),
        }

        log::trace!("Tick {:?}, position {:?}", elapsed, self.position());
        self.stats.maybe_log_stats(STATS_LOG_INTERVAL);
    }

    pub fn on_resize(&mut self, bounds: Bounds) {
        if bounds.is_empty() {
            log::warn!("Ignoring resize to empty bounds {}", bounds);
            return;
        }
        self.surface.resize(bounds);
    }

    /// Poster frame for the current asset
    ///
    /// Blocks for at most the configured poster timeout when the frame has
    /// not been decoded yet. Falls back to a placeholder when nothing usable
    /// is available in time.
    pub fn current_poster_frame(&mut self) -> FrameRef {
        self.adopt_background();

        if let Some(frame) = self.cached_poster() {
            return frame;
        }

        let Some(asset) = self.asset.as_ref() else {
            return Frame::placeholder().into_shared();
        };
        if self.poster_failed || self.state == ReadyState::Playing {
            return Frame::placeholder().into_shared();
        }

        if self.pending_load.is_none() && self.pending_poster.is_none() {
            self.pending_poster = Some(self.loader.spawn(
                asset,
                self.options.poster_image.clone(),
                LoadMode::PosterOnly,
            ));
        }

        if let Some(frame) = self.await_poster() {
            return frame;
        }

        if !self.poster_failed {
            log::warn!(
                "{}",
                SaverError::PosterGenerationTimeout {
                    timeout_ms: self.options.poster_timeout_ms
                }
            );
        }
        Frame::placeholder().into_shared()
    }

    /// Stop and forget the asset
    pub fn clear(&mut self) {
        self.stop();
        if self.asset.take().is_some() {
            log::info!("Cleared asset");
        }
        self.poster = None;
        self.poster_failed = false;
        self.last_error = None;
        self.set_state(ReadyState::Unloaded);
        self.surface.present(SurfaceContent::Blank);
    }

    pub fn state(&self) -> ReadyState {
        self.state
    }

    pub fn position(&self) -> Duration {
        self.session
            .as_ref()
            .map(|s| s.position())
            .unwrap_or(Duration::ZERO)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.session.as_ref().map(|s| s.duration())
    }

    pub fn asset(&self) -> Option<&VideoAsset> {
        self.asset.as_ref()
    }

    pub fn last_error(&self) -> Option<&SaverError> {
        self.last_error.as_ref()
    }

    pub fn surface(&self) -> &PresentationSurface {
        &self.surface
    }

    /// Composite the surface content at the surface bounds
    ///
    /// Returns `None` while the surface is blank.
    pub fn draw(&mut self) -> Option<&RgbaImage> {
        match self.surface.composite() {
            Ok(image) => image,
            Err(e) => {
                log::error!("Failed to composite surface: {:#}", e);
                None
            }
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            version: env!("CARGO_PKG_VERSION").to_string(),
            state: self.state,
            asset: self
                .asset
                .as_ref()
                .map(|a| a.path().display().to_string()),
            position_ms: self.position().as_millis() as u64,
            duration_ms: self.duration().map(|d| d.as_millis() as u64),
            looping: self.options.looping,
            preview_mode: self.options.preview_mode,
            bounds: self.surface.bounds(),
            showing: self.surface.source(),
            last_error: self.last_error.clone(),
            stats: self.stats.snapshot(),
        }
    }

    fn set_state(&mut self, state: ReadyState) {
        if self.state != state {
            log::info!("State {} -> {}", self.state, state);
            self.state = state;
        }
    }

    fn begin_load(&mut self) {
        let Some(asset) = self.asset.as_ref() else {
            return;
        };

        if self.options.preview_mode && self.cached_poster().is_some() {
            self.set_state(ReadyState::Ready);
            self.show_poster_or_blank();
            return;
        }

        let mode = if self.options.preview_mode {
            LoadMode::PosterOnly
        } else {
            LoadMode::Full
        };
        self.pending_load = Some(self.loader.spawn(asset, self.options.poster_image.clone(), mode));
        self.set_state(ReadyState::Loading);

        if self.await_poster().is_none() && self.state == ReadyState::Loading {
            log::debug!("Poster not ready yet, surface stays blank while loading");
        }
    }

    fn cancel_background(&mut self) {
        if self.pending_load.is_some() || self.pending_poster.is_some() {
            log::debug!("Cancelling in-flight loads");
        }
        self.pending_load = None;
        self.pending_poster = None;
        self.loader.cancel_all();
    }

    /// Apply whatever background work has reported since the last signal
    fn adopt_background(&mut self) {
        while let Some(poll) = self.pending_load.as_ref().map(PendingLoad::try_take) {
            if matches!(poll, LoadPoll::Pending) {
                break;
            }
            self.handle_load(poll);
        }

        while let Some(poll) = self.pending_poster.as_ref().map(PendingLoad::try_take) {
            if matches!(poll, LoadPoll::Pending) {
                break;
            }
            self.handle_poster(poll);
        }
    }

    /// Wait for background work to produce a poster
    ///
    /// Bounded by the poster timeout. Whatever arrives meanwhile is applied
    /// as it would be on the next signal.
    fn await_poster(&mut self) -> Option<FrameRef> {
        let deadline = Instant::now() + self.options.poster_timeout();

        while self.cached_poster().is_none() && !self.poster_failed {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if let Some(poll) = self.pending_load.as_ref().map(|p| p.wait(remaining)) {
                if matches!(poll, LoadPoll::Pending) {
                    break;
                }
                self.handle_load(poll);
            } else if let Some(poll) = self.pending_poster.as_ref().map(|p| p.wait(remaining)) {
                if matches!(poll, LoadPoll::Pending) {
                    break;
                }
                self.handle_poster(poll);
            } else {
                break;
            }
        }

        self.cached_poster()
    }

    fn is_current(&self, pending: Option<&PendingLoad>) -> bool {
        pending.is_some_and(|p| {
            p.epoch() == self.loader.current_epoch()
                && self.asset.as_ref().map(VideoAsset::id) == Some(p.asset_id())
        })
    }

    fn handle_load(&mut self, poll: LoadPoll) {
        if !self.is_current(self.pending_load.as_ref()) {
            if let Some(stale) = self.pending_load.take() {
                log::debug!("Discarding stale load (epoch {})", stale.epoch());
            }
            return;
        }

        match poll {
            LoadPoll::Pending => {}
            LoadPoll::Event(LoadEvent::Poster(frame)) => self.adopt_poster(frame),
            LoadPoll::Event(LoadEvent::Finished(outcome)) => {
                self.pending_load = None;
                self.apply_load(outcome);
            }
            LoadPoll::Abandoned => {
                self.pending_load = None;
                self.fail(DecodeError::Pipeline("loader exited without a result".into()));
            }
        }
    }

    fn apply_load(&mut self, outcome: LoadOutcome) {
        match outcome {
            Ok(media) => {
                self.cache_poster(media.poster);

                let Some(decoder) = media.decoder else {
                    self.set_state(ReadyState::Ready);
                    self.show_poster_or_blank();
                    return;
                };

                let session = PlaybackSession::new(decoder, &self.options);
                let (width, height) = session.dimensions();
                log::info!(
                    "Loaded {}x{} clip, duration {:.2}s",
                    width,
                    height,
                    session.duration().as_secs_f64()
                );
                self.stats.detected_fps = session.frame_rate();
                self.session = Some(session);
                self.set_state(ReadyState::Ready);

                if std::mem::take(&mut self.play_requested) {
                    self.play();
                } else {
                    self.show_poster_or_blank();
                }
            }
            Err(failure) => {
                if let Some(poster) = failure.poster {
                    self.cache_poster(poster);
                }
                self.fail(failure.error);
            }
        }
    }

    fn handle_poster(&mut self, poll: LoadPoll) {
        if !self.is_current(self.pending_poster.as_ref()) {
            if let Some(stale) = self.pending_poster.take() {
                log::debug!("Discarding stale poster (epoch {})", stale.epoch());
            }
            return;
        }

        match poll {
            LoadPoll::Pending => {}
            LoadPoll::Event(LoadEvent::Poster(frame)) => self.adopt_poster(frame),
            LoadPoll::Event(LoadEvent::Finished(Ok(media))) => {
                self.pending_poster = None;
                self.adopt_poster(media.poster);
            }
            LoadPoll::Event(LoadEvent::Finished(Err(failure))) => {
                self.pending_poster = None;
                log::warn!("Poster generation failed: {}", failure.error);
                self.poster_failed = true;
                self.last_error = Some(failure.error.into());
            }
            LoadPoll::Abandoned => {
                self.pending_poster = None;
                log::warn!("Poster worker exited without a result");
                self.poster_failed = true;
            }
        }
    }

    /// Cache a poster and show it unless live frames are on screen
    fn adopt_poster(&mut self, frame: FrameRef) {
        self.cache_poster(frame);
        if !self.state.is_live() {
            self.show_poster_or_blank();
        }
    }

    fn cache_poster(&mut self, frame: FrameRef) {
        if let Some(asset) = self.asset.as_ref() {
            self.poster = Some(CachedPoster {
                asset_id: asset.id(),
                frame,
            });
        }
    }

    fn cached_poster(&self) -> Option<FrameRef> {
        let asset_id = self.asset.as_ref()?.id();
        self.poster
            .as_ref()
            .filter(|p| p.asset_id == asset_id)
            .map(|p| p.frame.clone())
    }

    fn show_poster_or_blank(&mut self) {
        let content = match self.cached_poster() {
            Some(frame) => SurfaceContent::Poster(frame),
            None => SurfaceContent::Blank,
        };
        self.surface.present(content);
    }

    fn present_live(&mut self, frame: FrameRef) {
        if self.surface.present(SurfaceContent::Live(frame)) {
            self.stats.increment_presented();
        }
    }

    fn play(&mut self) {
        let result = match self.session.as_mut() {
            Some(session) => session.current_frame(),
            None => {
                log::warn!("Play requested without an open session");
                return;
            }
        };

        match result {
            Ok(frame) => {
                self.present_live(frame);
                self.set_state(ReadyState::Playing);
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, error: DecodeError) {
        log::error!("Playback failed: {}", error);
        self.stats.record_decode_error();
        self.session = None;
        self.play_requested = false;
        self.poster_failed = self.cached_poster().is_none();
        self.last_error = Some(error.into());
        self.set_state(ReadyState::Failed);
        self.show_poster_or_blank();
    }
}

impl HostSignals for PlaybackCore {
    fn configure(&mut self, reference: &str, options: PlaybackOptions) -> Result<(), SaverError> {
        PlaybackCore::configure(self, reference, options)
    }

    fn start(&mut self) {
        PlaybackCore::start(self);
    }

    fn stop(&mut self) {
        PlaybackCore::stop(self);
    }

    fn on_tick(&mut self, elapsed: Duration) {
        PlaybackCore::on_tick(self, elapsed);
    }

    fn on_resize(&mut self, bounds: Bounds) {
        PlaybackCore::on_resize(self, bounds);
    }
}

impl Drop for PlaybackCore {
    fn drop(&mut self) {
        self.loader.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        BLUE, GREEN, RED, SlowBackend, settle, shown_color, write_gif, write_png,
    };
    use common::SurfaceSource;

    const BOUNDS: Bounds = Bounds::new(32, 18);

    fn gif(dir: &tempfile::TempDir) -> String {
        write_gif(dir.path(), "rgb.gif", &[RED, GREEN, BLUE], 100)
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_configure_autoplays() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = PlaybackCore::new(BOUNDS);
        core.configure(&gif(&dir), PlaybackOptions::default()).unwrap();
        assert_eq!(core.state(), ReadyState::Loading);
        assert_eq!(core.surface().source(), SurfaceSource::Poster);

        settle(&mut core);
        assert_eq!(core.state(), ReadyState::Playing);
        assert_eq!(core.surface().source(), SurfaceSource::Live);
        assert_eq!(core.duration(), Some(Duration::from_millis(300)));
    }

    #[test]
    fn test_adopting_tick_advances_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = PlaybackCore::new(BOUNDS);
        core.configure(&gif(&dir), PlaybackOptions::default()).unwrap();
        assert_eq!(core.state(), ReadyState::Loading);

        // Let the worker deliver its finished result
        std::thread::sleep(Duration::from_millis(200));
        core.on_tick(Duration::from_millis(150));
        assert_eq!(core.state(), ReadyState::Playing);
        assert_eq!(core.position(), Duration::from_millis(150));
        assert_eq!(shown_color(&core), Some(GREEN));
    }

    #[test]
    fn test_no_autoplay_settles_ready_on_poster() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = PlaybackCore::new(BOUNDS);
        let options = PlaybackOptions {
            autoplay: false,
            ..PlaybackOptions::default()
        };
        core.configure(&gif(&dir), options).unwrap();
        settle(&mut core);

        assert_eq!(core.state(), ReadyState::Ready);
        assert_eq!(core.surface().source(), SurfaceSource::Poster);

        core.start();
        assert_eq!(core.state(), ReadyState::Playing);
    }

    #[test]
    fn test_start_while_loading_plays_on_completion() {
        let dir = tempfile::tempdir().unwrap();
        let backends = Backends::default().with(SlowBackend {
            delay: Duration::from_millis(200),
        });
        let mut core = PlaybackCore::with_backends(BOUNDS, backends);
        let options = PlaybackOptions {
            autoplay: false,
            poster_image: Some(write_png(dir.path(), "preview.png", GREEN)),
            ..PlaybackOptions::default()
        };
        core.configure(&gif(&dir), options).unwrap();
        core.start();
        assert_eq!(core.state(), ReadyState::Loading);
        assert_eq!(shown_color(&core), Some(GREEN));

        settle(&mut core);
        assert_eq!(core.state(), ReadyState::Playing);
    }

    #[test]
    fn test_non_looping_pauses_on_final_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = PlaybackCore::new(BOUNDS);
        let options = PlaybackOptions {
            looping: false,
            ..PlaybackOptions::default()
        };
        core.configure(&gif(&dir), options).unwrap();
        settle(&mut core);

        core.on_tick(Duration::from_secs(1));
        assert_eq!(core.state(), ReadyState::Paused);
        assert_eq!(core.position(), Duration::from_millis(300));
        assert_eq!(shown_color(&core), Some(BLUE));

        // Starting again from the end rewinds
        core.start();
        assert_eq!(core.state(), ReadyState::Playing);
        assert_eq!(core.position(), Duration::ZERO);
    }

    #[test]
    fn test_preview_mode_shows_poster_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = PlaybackCore::new(BOUNDS);
        let options = PlaybackOptions {
            preview_mode: true,
            ..PlaybackOptions::default()
        };
        core.configure(&gif(&dir), options).unwrap();
        settle(&mut core);

        assert_eq!(core.state(), ReadyState::Ready);
        assert_eq!(core.surface().source(), SurfaceSource::Poster);
        assert!(core.duration().is_none());

        core.start();
        core.on_tick(Duration::from_millis(100));
        assert_eq!(core.state(), ReadyState::Ready);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = PlaybackCore::new(BOUNDS);
        let options = PlaybackOptions {
            rate: 0.0,
            ..PlaybackOptions::default()
        };
        assert!(matches!(
            core.configure(&gif(&dir), options),
            Err(SaverError::InvalidOptions(_))
        ));
        assert_eq!(core.state(), ReadyState::Unloaded);
        assert!(core.asset().is_none());
    }

    #[test]
    fn test_failed_configure_keeps_previous_asset() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = PlaybackCore::new(BOUNDS);
        core.configure(&gif(&dir), PlaybackOptions::default()).unwrap();
        settle(&mut core);

        let missing = dir.path().join("missing.gif");
        assert!(core
            .configure(missing.to_str().unwrap(), PlaybackOptions::default())
            .is_err());
        assert_eq!(core.state(), ReadyState::Playing);
        assert_eq!(core.surface().source(), SurfaceSource::Live);
    }

    #[test]
    fn test_resize_keeps_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = PlaybackCore::new(BOUNDS);
        core.configure(&gif(&dir), PlaybackOptions::default()).unwrap();
        settle(&mut core);
        core.on_tick(Duration::from_millis(150));

        core.on_resize(Bounds::new(64, 64));
        assert_eq!(core.position(), Duration::from_millis(150));
        assert_eq!(core.draw().unwrap().dimensions(), (64, 64));

        core.on_resize(Bounds::new(0, 10));
        assert_eq!(core.surface().bounds(), Bounds::new(64, 64));
    }

    #[test]
    fn test_clear_leaves_failed_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.gif");
        std::fs::write(&path, b"not a gif").unwrap();

        let mut core = PlaybackCore::new(BOUNDS);
        core.configure(path.to_str().unwrap(), PlaybackOptions::default())
            .unwrap();
        settle(&mut core);
        assert_eq!(core.state(), ReadyState::Failed);

        core.stop();
        assert_eq!(core.state(), ReadyState::Failed);
        core.start();
        assert_eq!(core.state(), ReadyState::Failed);

        core.clear();
        assert_eq!(core.state(), ReadyState::Unloaded);
        assert!(core.asset().is_none());
        assert!(core.last_error().is_none());
        assert!(core.surface().is_blank());
    }

    #[test]
    fn test_status_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = PlaybackCore::new(BOUNDS);
        core.configure(&gif(&dir), PlaybackOptions::default()).unwrap();
        settle(&mut core);
        core.on_tick(Duration::from_millis(150));
        core.on_tick(Duration::from_millis(200));

        let status = core.status();
        assert_eq!(status.state, ReadyState::Playing);
        assert_eq!(status.position_ms, 50);
        assert_eq!(status.duration_ms, Some(300));
        assert_eq!(status.showing, SurfaceSource::Live);
        assert_eq!(status.stats.loops_completed, 1);
        assert_eq!(status.stats.frames_presented, 3);
        assert!(status.asset.unwrap().ends_with("rgb.gif"));
    }

    #[test]
    fn test_start_without_asset_is_noop() {
        let mut core = PlaybackCore::new(BOUNDS);
        core.start();
        core.on_tick(Duration::from_secs(1));
        assert_eq!(core.state(), ReadyState::Unloaded);
        assert!(core.surface().is_blank());
        assert!(core.current_poster_frame().is_placeholder());
    }
}
