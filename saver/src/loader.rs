//! Background asset loading
//!
//! Opening a clip and decoding its first frame can take long enough to stall
//! a host's animation thread, so both run on short-lived worker threads.
//!
//! Each request is stamped with the loader's epoch. Cancelling advances the
//! epoch; a worker whose epoch is stale skips its work or drops its result,
//! and the owner re-checks the epoch before adopting anything.
//!
//! A full load reports in two stages over one small channel: the poster as
//! soon as it exists, then the finished result. The owner can put the poster
//! on screen while the clip is still opening.

use crate::asset::VideoAsset;
use crate::video::{Backends, ClipDecoder, DecodeError, Frame, FrameRef};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// How much of an asset a request should prepare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Open a decoder and produce the poster frame
    Full,
    /// Produce the poster frame only
    PosterOnly,
}

/// Successful load result
pub struct LoadedMedia {
    pub poster: FrameRef,
    /// Present for [`LoadMode::Full`] requests
    pub decoder: Option<Box<dyn ClipDecoder>>,
}

/// Failed load result
///
/// A poster may still be available when a pre-rendered poster image was
/// configured but the clip itself failed to open.
pub struct LoadFailure {
    pub error: DecodeError,
    pub poster: Option<FrameRef>,
}

pub type LoadOutcome = Result<LoadedMedia, LoadFailure>;

/// Message from a load worker
pub enum LoadEvent {
    /// The poster is ready; a full load keeps opening the clip
    Poster(FrameRef),
    /// Final result, always the last message of a request
    Finished(LoadOutcome),
}

/// Result of checking on a pending load
pub enum LoadPoll {
    Pending,
    Event(LoadEvent),
    /// The worker went away without a result (stale or panicked)
    Abandoned,
}

/// Handle to one in-flight request
pub struct PendingLoad {
    epoch: u64,
    asset_id: u64,
    mode: LoadMode,
    receiver: Receiver<LoadEvent>,
}

impl PendingLoad {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn asset_id(&self) -> u64 {
        self.asset_id
    }

    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    pub fn try_take(&self) -> LoadPoll {
        match self.receiver.try_recv() {
            Ok(event) => LoadPoll::Event(event),
            Err(TryRecvError::Empty) => LoadPoll::Pending,
            Err(TryRecvError::Disconnected) => LoadPoll::Abandoned,
        }
    }

    /// Block for at most `timeout` waiting for the next message
    pub fn wait(&self, timeout: Duration) -> LoadPoll {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => LoadPoll::Event(event),
            Err(RecvTimeoutError::Timeout) => LoadPoll::Pending,
            Err(RecvTimeoutError::Disconnected) => LoadPoll::Abandoned,
        }
    }
}

/// Worker side of a request
struct Reply {
    sender: Sender<LoadEvent>,
    epoch: u64,
    current: Arc<AtomicU64>,
}

impl Reply {
    fn is_stale(&self) -> bool {
        self.current.load(Ordering::Acquire) != self.epoch
    }

    /// Send unless the request was cancelled meanwhile
    fn send(&self, event: LoadEvent) -> bool {
        if self.is_stale() {
            return false;
        }
        self.sender.send(event).is_ok()
    }
}

/// Spawns load workers and tracks the current epoch
pub struct Loader {
    backends: Arc<Backends>,
    epoch: Arc<AtomicU64>,
}

impl Loader {
    pub fn new(backends: Backends) -> Self {
        Self {
            backends: Arc::new(backends),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    pub fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Mark every in-flight request stale
    pub fn cancel_all(&self) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!("Loader epoch advanced to {}", epoch);
        epoch
    }

    pub fn spawn(
        &self,
        asset: &VideoAsset,
        poster_image: Option<PathBuf>,
        mode: LoadMode,
    ) -> PendingLoad {
        let epoch = self.current_epoch();
        // One poster and one result at most, so sends never block
        let (sender, receiver) = bounded(2);

        let pending = PendingLoad {
            epoch,
            asset_id: asset.id(),
            mode,
            receiver,
        };

        let backends = Arc::clone(&self.backends);
        let worker_asset = asset.clone();
        let reply = Reply {
            sender: sender.clone(),
            epoch,
            current: Arc::clone(&self.epoch),
        };

        let spawned = std::thread::Builder::new()
            .name(format!("saver-loader-{}", epoch))
            .spawn(move || {
                if reply.is_stale() {
                    log::debug!("Skipping stale load request (epoch {})", epoch);
                    return;
                }

                let started = Instant::now();
                let outcome =
                    load_media(&backends, &worker_asset, poster_image.as_deref(), mode, &reply);

                log::debug!(
                    "{:?} load of {} finished in {:.0}ms",
                    mode,
                    worker_asset.path().display(),
                    started.elapsed().as_secs_f64() * 1000.0
                );
                if !reply.send(LoadEvent::Finished(outcome)) {
                    log::debug!(
                        "Discarding stale load result for {} (epoch {})",
                        worker_asset.path().display(),
                        epoch
                    );
                }
            });

        if let Err(e) = spawned {
            log::error!("Failed to spawn loader thread: {}", e);
            let _ = sender.send(LoadEvent::Finished(Err(LoadFailure {
                error: DecodeError::Io(e),
                poster: None,
            })));
        }

        pending
    }
}

/// Load an image file to stand in for the first frame
pub fn load_poster_image(path: &Path) -> Result<FrameRef, DecodeError> {
    let image = image::open(path)?.to_rgba8();
    log::debug!(
        "Loaded poster image {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(Frame::new(image).into_shared())
}

/// Produce the poster frame for an asset, synchronously
pub fn decode_poster(
    backends: &Backends,
    asset: &VideoAsset,
    poster_image: Option<&Path>,
) -> Result<FrameRef, DecodeError> {
    if let Some(path) = poster_image {
        match load_poster_image(path) {
            Ok(poster) => return Ok(poster),
            Err(e) => log::warn!(
                "Poster image {} unusable ({}), decoding first frame instead",
                path.display(),
                e
            ),
        }
    }

    backends.open(asset)?.frame_at(Duration::ZERO)
}

fn load_media(
    backends: &Backends,
    asset: &VideoAsset,
    poster_image: Option<&Path>,
    mode: LoadMode,
    reply: &Reply,
) -> LoadOutcome {
    if mode == LoadMode::PosterOnly {
        return decode_poster(backends, asset, poster_image)
            .map(|poster| LoadedMedia {
                poster,
                decoder: None,
            })
            .map_err(|error| LoadFailure {
                error,
                poster: None,
            });
    }

    let supplied = poster_image.and_then(|path| {
        load_poster_image(path)
            .inspect_err(|e| log::warn!("Poster image {} unusable: {}", path.display(), e))
            .ok()
    });
    if let Some(poster) = supplied.as_ref() {
        reply.send(LoadEvent::Poster(FrameRef::clone(poster)));
    }

    let mut decoder = match backends.open(asset) {
        Ok(decoder) => decoder,
        Err(error) => {
            return Err(LoadFailure {
                error,
                poster: supplied,
            });
        }
    };

    let poster = match supplied {
        Some(poster) => poster,
        None => {
            let first = decoder
                .frame_at(Duration::ZERO)
                .map_err(|error| LoadFailure {
                    error,
                    poster: None,
                })?;
            reply.send(LoadEvent::Poster(FrameRef::clone(&first)));
            first
        }
    };

    Ok(LoadedMedia {
        poster,
        decoder: Some(decoder),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BLUE, GREEN, RED, SlowBackend, write_gif};

    /// Skip poster messages and return the finished result
    fn wait_done(pending: &PendingLoad) -> LoadOutcome {
        loop {
            match pending.wait(Duration::from_secs(5)) {
                LoadPoll::Event(LoadEvent::Finished(outcome)) => return outcome,
                LoadPoll::Event(LoadEvent::Poster(_)) => continue,
                LoadPoll::Pending => panic!("load did not finish in time"),
                LoadPoll::Abandoned => panic!("load was abandoned"),
            }
        }
    }

    fn next_poster(pending: &PendingLoad, timeout: Duration) -> FrameRef {
        match pending.wait(timeout) {
            LoadPoll::Event(LoadEvent::Poster(poster)) => poster,
            LoadPoll::Event(LoadEvent::Finished(_)) => panic!("finished before the poster"),
            LoadPoll::Pending => panic!("no poster in time"),
            LoadPoll::Abandoned => panic!("load was abandoned"),
        }
    }

    #[test]
    fn test_full_load_produces_decoder_and_poster() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(dir.path(), "rgb.gif", &[RED, GREEN, BLUE], 100);
        let asset = VideoAsset::resolve(path.to_str().unwrap()).unwrap();

        let loader = Loader::new(Backends::default());
        let pending = loader.spawn(&asset, None, LoadMode::Full);
        assert_eq!(pending.asset_id(), asset.id());
        assert_eq!(pending.mode(), LoadMode::Full);

        let early = next_poster(&pending, Duration::from_secs(5));
        assert_eq!(*early.image().get_pixel(0, 0), RED);

        let media = wait_done(&pending).ok().unwrap();
        assert!(Arc::ptr_eq(&early, &media.poster));
        assert_eq!(*media.poster.image().get_pixel(0, 0), RED);
        let decoder = media.decoder.unwrap();
        assert_eq!(decoder.duration(), Duration::from_millis(300));
    }

    #[test]
    fn test_poster_only_load_has_no_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(dir.path(), "rgb.gif", &[GREEN, BLUE], 100);
        let asset = VideoAsset::resolve(path.to_str().unwrap()).unwrap();

        let loader = Loader::new(Backends::default());
        let media = wait_done(&loader.spawn(&asset, None, LoadMode::PosterOnly))
            .ok()
            .unwrap();
        assert!(media.decoder.is_none());
        assert_eq!(*media.poster.image().get_pixel(0, 0), GREEN);
    }

    #[test]
    fn test_poster_image_overrides_first_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(dir.path(), "rgb.gif", &[RED, GREEN], 100);
        let preview = dir.path().join("preview.png");
        image::RgbaImage::from_pixel(4, 4, BLUE).save(&preview).unwrap();
        let asset = VideoAsset::resolve(path.to_str().unwrap()).unwrap();

        let poster = decode_poster(&Backends::default(), &asset, Some(&preview)).unwrap();
        assert_eq!(poster.dimensions(), (4, 4));
        assert_eq!(*poster.image().get_pixel(0, 0), BLUE);

        // Missing poster image falls back to the first frame
        let missing = dir.path().join("missing.png");
        let poster = decode_poster(&Backends::default(), &asset, Some(&missing)).unwrap();
        assert_eq!(*poster.image().get_pixel(0, 0), RED);
    }

    #[test]
    fn test_poster_image_sent_before_clip_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(dir.path(), "rgb.gif", &[RED, GREEN], 100);
        let preview = dir.path().join("preview.png");
        image::RgbaImage::from_pixel(4, 4, BLUE).save(&preview).unwrap();
        let asset = VideoAsset::resolve(path.to_str().unwrap()).unwrap();

        let loader = Loader::new(Backends::default().with(SlowBackend {
            delay: Duration::from_millis(300),
        }));
        let started = Instant::now();
        let pending = loader.spawn(&asset, Some(preview), LoadMode::Full);

        let poster = next_poster(&pending, Duration::from_millis(250));
        assert!(started.elapsed() < Duration::from_millis(300));
        assert_eq!(*poster.image().get_pixel(0, 0), BLUE);
        assert!(matches!(pending.try_take(), LoadPoll::Pending));

        let media = wait_done(&pending).ok().unwrap();
        assert!(media.decoder.is_some());
    }

    #[test]
    fn test_poster_only_load_sends_result_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(dir.path(), "rgb.gif", &[GREEN], 100);
        let asset = VideoAsset::resolve(path.to_str().unwrap()).unwrap();

        let loader = Loader::new(Backends::default());
        let pending = loader.spawn(&asset, None, LoadMode::PosterOnly);
        assert!(matches!(
            pending.wait(Duration::from_secs(5)),
            LoadPoll::Event(LoadEvent::Finished(Ok(_)))
        ));
    }

    #[test]
    fn test_corrupt_asset_fails_without_poster() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.gif");
        std::fs::write(&path, b"garbage").unwrap();
        let asset = VideoAsset::resolve(path.to_str().unwrap()).unwrap();

        let loader = Loader::new(Backends::default());
        let failure = match wait_done(&loader.spawn(&asset, None, LoadMode::Full)) {
            Err(failure) => failure,
            Ok(_) => panic!("corrupt asset loaded"),
        };
        assert!(failure.poster.is_none());
    }

    #[test]
    fn test_cancelled_load_never_delivers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(dir.path(), "rgb.gif", &[RED], 100);
        let asset = VideoAsset::resolve(path.to_str().unwrap()).unwrap();

        let loader = Loader::new(Backends::default().with(SlowBackend {
            delay: Duration::from_millis(150),
        }));
        let pending = loader.spawn(&asset, None, LoadMode::Full);
        let new_epoch = loader.cancel_all();
        assert_ne!(pending.epoch(), new_epoch);

        assert!(matches!(
            pending.wait(Duration::from_secs(5)),
            LoadPoll::Abandoned
        ));
    }
}
