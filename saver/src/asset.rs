//! Video asset references
//!
//! Resolves what a host hands to `configure` (a path, a `~`-prefixed path or
//! a `file://` URL) into an immutable [`VideoAsset`].

use common::{SaverError, UnavailableReason};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

static NEXT_ASSET_ID: AtomicU64 = AtomicU64::new(1);

/// Broad media family, decided by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Animated GIF, decoded in-process
    AnimatedImage,
    /// Container video (mp4, mov, m4v, webm, mkv)
    Movie,
}

impl MediaKind {
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "gif" => Some(Self::AnimatedImage),
            "mp4" | "mov" | "m4v" | "webm" | "mkv" => Some(Self::Movie),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AnimatedImage => "animated-image",
            Self::Movie => "movie",
        }
    }
}

/// A resolved, readable media file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    id: u64,
    path: PathBuf,
    kind: MediaKind,
}

impl VideoAsset {
    /// Resolve a reference to a readable local file with a known media kind
    ///
    /// The media itself is not inspected; a file with a valid extension but
    /// garbage content resolves fine and fails later during decoding.
    pub fn resolve(reference: &str) -> Result<Self, SaverError> {
        let unavailable = |reason| SaverError::unavailable(reference, reason);

        let path = reference_to_path(reference)
            .ok_or_else(|| unavailable(UnavailableReason::InvalidReference))?;

        let metadata =
            std::fs::metadata(&path).map_err(|e| unavailable(reason_for_io_error(&e)))?;
        if !metadata.is_file() {
            return Err(unavailable(UnavailableReason::NotAFile));
        }

        // Opening is the only reliable permission check
        std::fs::File::open(&path).map_err(|e| unavailable(reason_for_io_error(&e)))?;

        let kind = MediaKind::from_path(&path)
            .ok_or_else(|| unavailable(UnavailableReason::UnsupportedFormat))?;

        let asset = Self {
            id: NEXT_ASSET_ID.fetch_add(1, Ordering::Relaxed),
            path,
            kind,
        };

        log::debug!(
            "Resolved asset #{} ({}): {}",
            asset.id,
            asset.kind.name(),
            asset.path.display()
        );

        Ok(asset)
    }

    /// Unique per resolution; two resolutions of the same file differ
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}

fn reference_to_path(reference: &str) -> Option<PathBuf> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    if reference.contains("://") {
        let url = Url::parse(reference).ok()?;
        if url.scheme() != "file" {
            return None;
        }
        return url.to_file_path().ok();
    }

    let path = PathBuf::from(shellexpand::tilde(reference).as_ref());
    if path.is_absolute() {
        Some(path)
    } else {
        std::env::current_dir().ok().map(|dir| dir.join(path))
    }
}

fn reason_for_io_error(error: &std::io::Error) -> UnavailableReason {
    match error.kind() {
        std::io::ErrorKind::PermissionDenied => UnavailableReason::PermissionDenied,
        _ => UnavailableReason::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(result: Result<VideoAsset, SaverError>) -> UnavailableReason {
        match result {
            Err(SaverError::AssetUnavailable { reason, .. }) => reason,
            other => panic!("expected AssetUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_media_kind_from_path() {
        assert_eq!(
            MediaKind::from_path("loop.gif"),
            Some(MediaKind::AnimatedImage)
        );
        assert_eq!(MediaKind::from_path("clip.MP4"), Some(MediaKind::Movie));
        assert_eq!(MediaKind::from_path("clip.mov"), Some(MediaKind::Movie));
        assert_eq!(MediaKind::from_path("clip.m4v"), Some(MediaKind::Movie));
        assert_eq!(MediaKind::from_path("notes.txt"), None);
        assert_eq!(MediaKind::from_path("no_extension"), None);
    }

    #[test]
    fn test_resolve_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let asset = VideoAsset::resolve(path.to_str().unwrap()).unwrap();
        assert_eq!(asset.path(), path.as_path());
        assert_eq!(asset.kind(), MediaKind::AnimatedImage);
    }

    #[test]
    fn test_resolve_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"not really a movie").unwrap();

        let url = Url::from_file_path(&path).unwrap();
        let asset = VideoAsset::resolve(url.as_str()).unwrap();
        assert_eq!(asset.path(), path.as_path());
        assert_eq!(asset.kind(), MediaKind::Movie);
    }

    #[test]
    fn test_resolve_failures() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.mp4");
        assert_eq!(
            reason(VideoAsset::resolve(missing.to_str().unwrap())),
            UnavailableReason::NotFound
        );

        assert_eq!(
            reason(VideoAsset::resolve(dir.path().to_str().unwrap())),
            UnavailableReason::NotAFile
        );

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"hello").unwrap();
        assert_eq!(
            reason(VideoAsset::resolve(text.to_str().unwrap())),
            UnavailableReason::UnsupportedFormat
        );

        assert_eq!(
            reason(VideoAsset::resolve("   ")),
            UnavailableReason::InvalidReference
        );
        assert_eq!(
            reason(VideoAsset::resolve("https://example.com/loop.mp4")),
            UnavailableReason::InvalidReference
        );
    }

    #[test]
    fn test_resolved_ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let first = VideoAsset::resolve(path.to_str().unwrap()).unwrap();
        let second = VideoAsset::resolve(path.to_str().unwrap()).unwrap();
        assert_ne!(first.id(), second.id());
    }
}
