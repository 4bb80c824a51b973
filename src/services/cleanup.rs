//! Orphan detection and guarded cleanup.
//!
//! After a rename, everything that could have existed under the old naming
//! scheme but is not part of the new "needed" set gets deleted - softly,
//! through the backup tree, and never the data source root or a movie
//! folder itself.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::model::{MediaFile, MediaFileKind};
use crate::services::filesystem;

/// Files from `snapshot` that are not present in `kept`.
///
/// Equality is by absolute path only - the kind is informational here, a
/// path claimed by any kept file is not an orphan.
pub fn compute_orphans(snapshot: &[MediaFile], kept: &[MediaFile]) -> Vec<MediaFile> {
    let kept_paths: HashSet<&PathBuf> = kept.iter().map(|f| &f.path).collect();
    snapshot
        .iter()
        .filter(|f| !kept_paths.contains(&f.path))
        .cloned()
        .collect()
}

/// Paths that must never be deleted, re-checked at deletion time.
///
/// A buggy template can resolve a variant name to an empty string, making
/// "folder + filename" collapse to the folder itself - deleting that would
/// take the whole movie with it.
#[derive(Debug, Clone)]
pub struct DeletionGuard {
    data_source: PathBuf,
    old_folder: PathBuf,
    new_folder: PathBuf,
}

impl DeletionGuard {
    pub fn new(data_source: &Path, old_folder: &Path, new_folder: &Path) -> Self {
        DeletionGuard {
            data_source: data_source.to_path_buf(),
            old_folder: old_folder.to_path_buf(),
            new_folder: new_folder.to_path_buf(),
        }
    }

    /// Quiet check, used before incidental operations like empty-directory
    /// removal.
    pub fn is_protected(&self, path: &Path) -> bool {
        path == self.data_source || path == self.old_folder || path == self.new_folder
    }

    pub fn permits(&self, path: &Path) -> bool {
        if self.is_protected(path) {
            warn!(
                path = %path.display(),
                "cleanup tried to remove a protected folder - skipping"
            );
            return false;
        }
        true
    }
}

/// Delete every orphan (best-effort, soft), then drop directories the
/// deletions emptied. Returns the number of files deleted.
pub async fn sweep(orphans: &[MediaFile], guard: &DeletionGuard, data_source: &Path) -> usize {
    let mut deleted = 0;
    for orphan in orphans {
        if !guard.permits(&orphan.path) {
            continue;
        }
        if !orphan.path.exists() {
            continue;
        }
        debug!(path = %orphan.path.display(), kind = ?orphan.kind, "deleting orphaned file");
        match filesystem::delete_with_backup(&orphan.path, data_source).await {
            Ok(()) => deleted += 1,
            Err(e) => {
                warn!(path = %orphan.path.display(), error = %e, "could not delete orphan");
                continue;
            }
        }
        if let Some(parent) = orphan.path.parent() {
            if !guard.is_protected(parent) {
                filesystem::remove_dir_if_empty(parent).await;
            }
        }
    }
    deleted
}

/// Delete stray `.nfo` files in the movie folder that are not among the
/// movie's tracked NFO files (removes leftovers written by other tools).
pub async fn sweep_stray_nfos(
    movie_folder: &Path,
    tracked: &[MediaFile],
    guard: &DeletionGuard,
    data_source: &Path,
) -> usize {
    let tracked_paths: HashSet<&PathBuf> = tracked
        .iter()
        .filter(|f| f.kind == MediaFileKind::Nfo)
        .map(|f| &f.path)
        .collect();

    let mut deleted = 0;
    for entry in WalkDir::new(movie_folder)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_nfo = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("nfo"));
        if !is_nfo || tracked_paths.contains(&path.to_path_buf()) {
            continue;
        }
        if !guard.permits(path) {
            continue;
        }
        debug!(path = %path.display(), "deleting stray nfo");
        match filesystem::delete_with_backup(path, data_source).await {
            Ok(()) => deleted += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "could not delete stray nfo"),
        }
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orphans_are_computed_by_path() {
        let snapshot = vec![
            MediaFile::new("/ds/M/poster.jpg", MediaFileKind::Poster),
            MediaFile::new("/ds/M/movie.mkv", MediaFileKind::Video),
        ];
        // same path, different kind: still kept
        let kept = vec![MediaFile::new("/ds/M/poster.jpg", MediaFileKind::Graphic)];
        let orphans = compute_orphans(&snapshot, &kept);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].path, Path::new("/ds/M/movie.mkv"));
    }

    #[test]
    fn guard_protects_roots_and_folders() {
        let guard = DeletionGuard::new(
            Path::new("/ds"),
            Path::new("/ds/Old"),
            Path::new("/ds/New"),
        );
        assert!(!guard.permits(Path::new("/ds")));
        assert!(!guard.permits(Path::new("/ds/Old")));
        assert!(!guard.permits(Path::new("/ds/New")));
        assert!(guard.permits(Path::new("/ds/New/poster.jpg")));
    }

    #[tokio::test]
    async fn sweep_deletes_only_unguarded_existing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ds = dir.path();
        let folder = ds.join("Movie");
        tokio::fs::create_dir_all(&folder).await.expect("mkdir");
        let stale = folder.join("old-poster.jpg");
        tokio::fs::write(&stale, b"img").await.expect("write");

        let guard = DeletionGuard::new(ds, &folder, &folder);
        let orphans = vec![
            MediaFile::new(&stale, MediaFileKind::Poster),
            // protected: the movie folder itself
            MediaFile::new(&folder, MediaFileKind::Unknown),
            // nonexistent: skipped quietly
            MediaFile::new(folder.join("gone.jpg"), MediaFileKind::Fanart),
        ];

        let deleted = sweep(&orphans, &guard, ds).await;
        assert_eq!(deleted, 1);
        assert!(!stale.exists());
        assert!(folder.exists());
        assert!(ds.join(".backup/Movie/old-poster.jpg").exists());
    }
}
