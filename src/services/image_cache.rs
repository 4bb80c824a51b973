//! Image cache collaborator.
//!
//! The surrounding application keeps scaled/derived images keyed by the
//! source file's path. Renaming a file makes those entries stale, so the
//! executor invalidates them - fire-and-forget, failures are ignored.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

/// Invalidate-by-path seam. Implementations must tolerate being called for
/// paths that were never cached.
pub trait ImageCache: Send + Sync {
    fn invalidate(&self, path: &Path);
}

/// Cache that caches nothing.
#[derive(Debug, Default)]
pub struct NoopImageCache;

impl ImageCache for NoopImageCache {
    fn invalidate(&self, _path: &Path) {}
}

/// On-disk cache of derived images, keyed by a digest of the source path.
#[derive(Debug)]
pub struct HashedImageCache {
    cache_dir: PathBuf,
}

impl HashedImageCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        HashedImageCache {
            cache_dir: cache_dir.into(),
        }
    }

    /// Location of the cached derivative for `path`.
    pub fn cache_file_for(&self, path: &Path) -> PathBuf {
        let digest = Sha256::digest(path.to_string_lossy().as_bytes());
        let mut name = String::with_capacity(digest.len() * 2);
        for byte in digest {
            name.push_str(&format!("{byte:02x}"));
        }
        self.cache_dir.join(format!("{name}.jpg"))
    }
}

impl ImageCache for HashedImageCache {
    fn invalidate(&self, path: &Path) {
        let cached = self.cache_file_for(path);
        if std::fs::remove_file(&cached).is_ok() {
            debug!(source = %path.display(), cached = %cached.display(), "invalidated cached image");
        }
    }
}
