//! Destructive rename execution.
//!
//! One [`RenamerService::rename_movie`] call is the unit of failure: fatal
//! problems (missing data source, folder move failure, locked video) abort
//! that movie and leave it as close to untouched as possible, while
//! secondary-artifact copy failures keep the original file and continue.
//! Within one movie, videos are always renamed first - every other name is
//! derived from the new video basename.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, error, info, trace, warn};

use crate::config::{MetadataFormat, RenamerSettings};
use crate::error::RenameError;
use crate::model::{
    FanartNaming, MediaFile, MediaFileKind, Movie, NfoNaming, PosterNaming, SubtitleInfo,
};
use crate::services::cleanup::{self, DeletionGuard};
use crate::services::image_cache::ImageCache;
use crate::services::notifications::{MessageLevel, Messenger};
use crate::services::plan::RenamePlanner;
use crate::services::{filesystem, language};

pub use crate::services::filesystem::RetryPolicy;

/// Persistence seam: the embedder saves the movie record and regenerates
/// its metadata file on request.
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn save(&self, movie: &Movie) -> anyhow::Result<()>;
    async fn write_nfo(&self, movie: &Movie) -> anyhow::Result<()>;
}

/// Store for embedders without persistence (previews, tests).
#[derive(Debug, Default)]
pub struct NullStore;

#[async_trait]
impl MovieStore for NullStore {
    async fn save(&self, _movie: &Movie) -> anyhow::Result<()> {
        Ok(())
    }

    async fn write_nfo(&self, _movie: &Movie) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Executes renames against the real filesystem.
pub struct RenamerService {
    settings: RenamerSettings,
    store: Arc<dyn MovieStore>,
    image_cache: Arc<dyn ImageCache>,
    messenger: Arc<dyn Messenger>,
    retry: RetryPolicy,
}

impl RenamerService {
    pub fn new(
        settings: RenamerSettings,
        store: Arc<dyn MovieStore>,
        image_cache: Arc<dyn ImageCache>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        RenamerService {
            settings,
            store,
            image_cache,
            messenger,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the renameability-probe retry behavior (tests use a
    /// zero-delay policy).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Rename a batch of movies. The cancel flag is only honored between
    /// movies so no single movie is ever left half-renamed; per-movie
    /// failures are reported and the batch continues.
    pub async fn rename_all(&self, movies: &mut [Movie], cancel: &AtomicBool) {
        for movie in movies.iter_mut() {
            if cancel.load(Ordering::Relaxed) {
                info!("rename batch cancelled");
                break;
            }
            if let Err(e) = self.rename_movie(movie).await {
                error!(movie = %movie.title, error = %e, "rename failed");
            }
        }
    }

    /// Rename one movie: folder, videos, artwork, subtitles, cleanup.
    pub async fn rename_movie(&self, movie: &mut Movie) -> Result<(), RenameError> {
        if movie.data_source.as_os_str().is_empty() {
            self.fail(&movie.title, "no data source set");
            return Err(RenameError::MissingDataSource);
        }
        if movie.title.is_empty() {
            self.fail(&movie.folder.display().to_string(), "movie has no title");
            return Err(RenameError::TitleUnset);
        }

        info!(movie = %movie.title, folder = %movie.folder.display(), "renaming movie");
        debug!(
            multi_movie_dir = movie.multi_movie_dir,
            disc = movie.is_disc(),
            folder_template = %self.settings.folder_template,
            file_template = %self.settings.file_template,
            "renamer configuration"
        );

        let planner = RenamePlanner::new(movie, &self.settings);
        let old_folder = movie.folder.clone();
        let dest_dir = planner.destination_dir().to_path_buf();

        // everything that could exist under the old naming scheme, captured
        // before any mutation
        let mut snapshot = self.cleanup_snapshot(movie);

        self.move_folder(movie, &planner, &old_folder, &dest_dir, &mut snapshot)
            .await?;

        if !planner.renames_files() {
            warn!(movie = %movie.title, "file name template not usable - keeping current file names");
        }
        trace!(basename = planner.video_basename(), "derived video basename");

        self.probe_video_renameability(movie).await?;

        let mut needed: Vec<MediaFile> = Vec::new();
        let mut poster_rewritten = false;
        let mut fanart_rewritten = false;

        // 1:1 video moves come first; all other names derive from them
        for video in movie.media_files_of(MediaFileKind::Video).into_iter().cloned().collect::<Vec<_>>() {
            let Some(dest) = planner.destinations_for(movie, &video).into_iter().next() else {
                needed.push(video);
                continue;
            };
            match filesystem::move_file(&video.path, &dest.path).await {
                Ok(()) => needed.push(dest),
                Err(e) => {
                    warn!(path = %video.path.display(), error = %e, "could not move video");
                    needed.push(video);
                }
            }
        }

        // 1:N copies of the newest poster/fanart to every configured variant
        for kind in [MediaFileKind::Fanart, MediaFileKind::Poster] {
            let Some(artwork) = movie.newest_file_of(kind).cloned() else {
                continue;
            };
            trace!(kind = ?kind, path = %artwork.path.display(), "propagating newest artwork");
            let rewritten = self
                .copy_to_all(movie, &planner, &artwork, &mut needed)
                .await;
            match kind {
                MediaFileKind::Poster => poster_rewritten |= rewritten,
                _ => fanart_rewritten |= rewritten,
            }
        }

        // 1:N copy of the newest tool-authored NFO; foreign NFOs are kept
        // or swept depending on settings
        let nfos: Vec<MediaFile> = movie
            .media_files_of(MediaFileKind::Nfo)
            .into_iter()
            .cloned()
            .collect();
        let mut newest_authored: Option<MediaFile> = None;
        for nfo in &nfos {
            if is_authored_nfo(&nfo.path).await
                && newest_authored.as_ref().is_none_or(|cur| nfo.modified >= cur.modified)
            {
                newest_authored = Some(nfo.clone());
            }
        }
        if let Some(nfo) = &newest_authored {
            self.copy_to_all(movie, &planner, nfo, &mut needed).await;
        } else {
            trace!("no tool-authored nfo found");
        }
        for nfo in &nfos {
            let authored = newest_authored.as_ref().is_some_and(|n| n.path == nfo.path)
                || is_authored_nfo(&nfo.path).await;
            if !authored && !self.settings.nfo_cleanup {
                needed.push(nfo.clone());
            }
        }

        // every remaining kind: copy to each planned destination
        let skip = [
            MediaFileKind::Video,
            MediaFileKind::Nfo,
            MediaFileKind::Poster,
            MediaFileKind::Fanart,
            MediaFileKind::Subtitle,
        ];
        for other in movie.media_files_except(&skip).into_iter().cloned().collect::<Vec<_>>() {
            self.copy_to_all(movie, &planner, &other, &mut needed).await;
        }

        // subtitles are renamed after the commit (they need the final video
        // names on disk) but must not be treated as orphans
        needed.extend(movie.media_files_of(MediaFileKind::Subtitle).into_iter().cloned());

        // derived images keyed by the old paths are stale now
        for gfx in &movie.media_files {
            if gfx.kind.is_graphic() {
                self.image_cache.invalidate(&gfx.path);
            }
        }

        // commit: the movie's registered state only ever reflects what
        // exists on disk
        let mut seen: HashSet<(PathBuf, MediaFileKind)> = HashSet::new();
        needed.retain(|f| seen.insert(f.identity()));
        movie.media_files = needed;
        movie.folder = dest_dir.clone();
        self.save(movie).await;

        self.rename_subtitles(movie).await;

        // MediaPortal-style metadata embeds artwork references inline
        if self.settings.metadata_format == MetadataFormat::MediaPortal
            && (poster_rewritten || fanart_rewritten)
        {
            if let Err(e) = self.store.write_nfo(movie).await {
                warn!(movie = %movie.title, error = %e, "could not rewrite metadata file");
            }
            self.save(movie).await;
        }

        // cleanup: everything from the snapshot not claimed by the new set
        let orphans = cleanup::compute_orphans(&snapshot, &movie.media_files);
        let guard = DeletionGuard::new(&movie.data_source, &old_folder, &movie.folder);
        let deleted = cleanup::sweep(&orphans, &guard, &movie.data_source).await;
        if self.settings.nfo_cleanup {
            cleanup::sweep_stray_nfos(&movie.folder, &movie.media_files, &guard, &movie.data_source)
                .await;
        }

        info!(movie = %movie.title, deleted, "rename complete");
        Ok(())
    }

    /// Resolve the folder transition and perform the move/creation.
    ///
    /// Four mutually exclusive cases, decided by (current shared-dir state)
    /// x (shared-dir state implied by the new folder template).
    async fn move_folder(
        &self,
        movie: &mut Movie,
        planner: &RenamePlanner,
        old_folder: &Path,
        dest_dir: &Path,
        snapshot: &mut [MediaFile],
    ) -> Result<(), RenameError> {
        if self.settings.folder_template.is_empty() {
            info!("folder template empty - not renaming folder");
            return Ok(());
        }
        if !planner.folder_changes() {
            return Ok(());
        }

        let new_is_shared = planner.multi_movie_dir();
        if !movie.multi_movie_dir && !new_is_shared {
            // own dir -> own dir: move the whole tree, abort on failure
            if let Err(e) = filesystem::move_directory(old_folder, dest_dir, &self.retry).await {
                error!(
                    src = %old_folder.display(),
                    dest = %dest_dir.display(),
                    error = %e,
                    "could not move movie folder - aborting rename"
                );
                self.fail(&movie.title, &format!("could not move folder: {e}"));
                return Err(RenameError::FolderMove {
                    src: old_folder.to_path_buf(),
                    dest: dest_dir.to_path_buf(),
                });
            }
            movie.multi_movie_dir = false;
            movie.rebase_media_files(old_folder, dest_dir);
            for entry in snapshot.iter_mut() {
                *entry = entry.clone().with_parent(old_folder, dest_dir);
            }
            movie.folder = dest_dir.to_path_buf();
            // already moved - record it even though files are still pending
            self.save(movie).await;
        } else if movie.multi_movie_dir && !new_is_shared {
            // shared dir -> own dir (upgrade): claim a fresh directory, the
            // old shared folder stays where it is
            debug!(dest = %dest_dir.display(), "upgrading movie into its own directory");
            if dest_dir.exists() {
                error!(dest = %dest_dir.display(), "upgrade destination already exists - aborting");
                self.fail(&movie.title, "destination directory already exists");
                return Err(RenameError::CreateDir {
                    path: dest_dir.to_path_buf(),
                });
            }
            if let Err(e) = tokio::fs::create_dir_all(dest_dir).await {
                error!(dest = %dest_dir.display(), error = %e, "could not create destination");
                self.fail(&movie.title, &format!("could not create directory: {e}"));
                return Err(RenameError::CreateDir {
                    path: dest_dir.to_path_buf(),
                });
            }
            movie.multi_movie_dir = false;
        } else {
            // destination is (or becomes) a shared dir: create if missing,
            // an existing one is fine
            debug!(dest = %dest_dir.display(), "movie destination is a shared directory");
            if !dest_dir.exists() {
                if let Err(e) = tokio::fs::create_dir_all(dest_dir).await {
                    error!(dest = %dest_dir.display(), error = %e, "could not create destination");
                    self.fail(&movie.title, &format!("could not create directory: {e}"));
                    return Err(RenameError::CreateDir {
                        path: dest_dir.to_path_buf(),
                    });
                }
            }
            movie.multi_movie_dir = true;
        }
        Ok(())
    }

    /// Self-rename probe: a file that cannot be renamed onto itself is
    /// locked by someone (best-effort detection - shared read locks can
    /// slip through). Files that vanished from disk are dropped as stale
    /// references instead of failing the rename.
    async fn probe_video_renameability(&self, movie: &mut Movie) -> Result<(), RenameError> {
        let mut stale: Vec<PathBuf> = Vec::new();
        for video in movie.media_files_of(MediaFileKind::Video) {
            let path = video.path.clone();
            if !path.exists() {
                debug!(path = %path.display(), "video vanished from disk - dropping stale entry");
                stale.push(path);
                continue;
            }
            let mut ok = false;
            for attempt in 1..=self.retry.attempts.max(1) {
                match tokio::fs::rename(&path, &path).await {
                    Ok(()) => {
                        ok = true;
                        break;
                    }
                    Err(e) => {
                        debug!(
                            attempt,
                            path = %path.display(),
                            error = %e,
                            "self-rename probe failed - waiting and trying again"
                        );
                        if attempt < self.retry.attempts {
                            tokio::time::sleep(self.retry.delay).await;
                        }
                    }
                }
            }
            if !ok {
                self.fail(
                    &movie.title,
                    &format!("video file {} is not accessible", path.display()),
                );
                return Err(RenameError::VideoLocked { path });
            }
        }
        movie
            .media_files
            .retain(|f| !(f.kind == MediaFileKind::Video && stale.contains(&f.path)));
        Ok(())
    }

    /// Copy `file` to every planned destination. On any copy failure the
    /// original stays in the needed set - a failed copy must never lose the
    /// file. Returns whether at least one destination was written.
    async fn copy_to_all(
        &self,
        movie: &Movie,
        planner: &RenamePlanner,
        file: &MediaFile,
        needed: &mut Vec<MediaFile>,
    ) -> bool {
        let mut copied = false;
        let mut failed = false;
        for dest in planner.destinations_for(movie, file) {
            match filesystem::copy_file(&file.path, &dest.path).await {
                Ok(()) => {
                    copied = true;
                    needed.push(dest);
                }
                Err(e) => {
                    warn!(
                        src = %file.path.display(),
                        dest = %dest.path.display(),
                        error = %e,
                        "copy failed - keeping original file"
                    );
                    failed = true;
                }
            }
        }
        if failed {
            needed.push(file.clone());
        }
        copied
    }

    /// Rename subtitles against the already-renamed video files, detecting
    /// language and forced markers from metadata or the filename.
    async fn rename_subtitles(&self, movie: &mut Movie) {
        let videos: Vec<MediaFile> = movie
            .media_files_of(MediaFileKind::Video)
            .into_iter()
            .cloned()
            .collect();
        if videos.is_empty() {
            return;
        }
        let subtitles: Vec<MediaFile> = movie
            .media_files_of(MediaFileKind::Subtitle)
            .into_iter()
            .cloned()
            .collect();

        for sub in subtitles {
            let (language, forced) = match sub.subtitles.first() {
                Some(info) => (info.language.clone(), info.forced),
                None => {
                    let (lang, forced) = language::detect_from_basename(
                        &sub.basename(),
                        &movie.video_basename_without_stacking(),
                    );
                    (lang.map(|l| l.iso2.to_string()).unwrap_or_default(), forced)
                }
            };
            let rendered = if language.is_empty() {
                String::new()
            } else {
                language::render(&language, self.settings.language_style)
            };

            // match to the stacked counterpart, or the sole/first video
            let Some(video) = videos
                .iter()
                .find(|v| sub.stacking != 0 && v.stacking == sub.stacking)
                .or_else(|| videos.first())
            else {
                continue;
            };

            let mut name = video.basename();
            if forced {
                name.push_str(".forced");
            }
            if !rendered.is_empty() {
                name.push('.');
                name.push_str(&rendered);
            }
            name.push('.');
            name.push_str(&sub.extension());
            let dest = movie.folder.join(&name);

            match filesystem::move_file(&sub.path, &dest).await {
                Ok(()) => {
                    if sub.extension() == "sub" {
                        // matching .idx rides along, errors ignored
                        let old_idx = sub.path.with_extension("idx");
                        if old_idx.exists() {
                            let _ = filesystem::move_file(&old_idx, &dest.with_extension("idx")).await;
                        }
                    }
                    let mut renamed = MediaFile::new(&dest, MediaFileKind::Subtitle);
                    renamed.container = Some(sub.extension());
                    renamed.modified = sub.modified;
                    renamed.subtitles = vec![SubtitleInfo {
                        language: rendered,
                        forced,
                    }];
                    if let Some(entry) = movie.media_files.iter_mut().find(|f| **f == sub) {
                        *entry = renamed;
                    } else {
                        movie.media_files.push(renamed);
                    }
                }
                Err(e) => {
                    warn!(path = %sub.path.display(), error = %e, "could not move subtitle");
                    self.messenger.push(
                        MessageLevel::Error,
                        &sub.filename(),
                        &format!("could not rename subtitle: {e}"),
                    );
                }
            }
        }
        self.save(movie).await;
    }

    /// All file paths that could have belonged to this movie under the old
    /// naming scheme: every naming variant plus the actual current files.
    fn cleanup_snapshot(&self, movie: &Movie) -> Vec<MediaFile> {
        let base = movie.video_basename_without_stacking();
        let mut snapshot = Vec::new();
        for naming in NfoNaming::all() {
            let name = naming.render(&base, movie.disc_structure);
            if !name.is_empty() {
                snapshot.push(MediaFile::new(movie.folder.join(name), MediaFileKind::Nfo));
            }
        }
        for naming in PosterNaming::all() {
            let name = naming.render(&movie.title, &base);
            if !name.is_empty() {
                snapshot.push(MediaFile::new(movie.folder.join(name), MediaFileKind::Poster));
            }
        }
        for naming in FanartNaming::all() {
            let name = naming.render(&movie.title, &base);
            if !name.is_empty() {
                snapshot.push(MediaFile::new(movie.folder.join(name), MediaFileKind::Fanart));
            }
        }
        snapshot.extend(movie.media_files.iter().cloned());
        snapshot
    }

    async fn save(&self, movie: &Movie) {
        if let Err(e) = self.store.save(movie).await {
            warn!(movie = %movie.title, error = %e, "could not persist movie");
        }
    }

    fn fail(&self, subject: &str, detail: &str) {
        self.messenger.push(MessageLevel::Error, subject, detail);
    }
}

/// Cheap sniff for metadata files this tool wrote: a `<movie>` root element
/// near the top of the file.
async fn is_authored_nfo(path: &Path) -> bool {
    let Ok(bytes) = tokio::fs::read(path).await else {
        return false;
    };
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]).to_lowercase();
    head.contains("<movie")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::image_cache::NoopImageCache;
    use crate::services::notifications::LogMessenger;

    fn service(settings: RenamerSettings) -> RenamerService {
        RenamerService::new(
            settings,
            Arc::new(NullStore),
            Arc::new(NoopImageCache),
            Arc::new(LogMessenger),
        )
        .with_retry_policy(RetryPolicy::immediate())
    }

    #[tokio::test]
    async fn missing_data_source_is_fatal() {
        let mut movie = Movie::new("Test", Some(2001), "", "/nowhere");
        let result = service(RenamerSettings::default()).rename_movie(&mut movie).await;
        assert_matches::assert_matches!(result, Err(RenameError::MissingDataSource));
    }

    #[tokio::test]
    async fn stale_video_references_are_dropped_by_the_probe() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ds = dir.path();
        let folder = ds.join("Test (2001)");
        tokio::fs::create_dir_all(&folder).await.expect("mkdir");

        let mut movie = Movie::new("Test", Some(2001), ds, &folder);
        movie
            .media_files
            .push(MediaFile::new(folder.join("gone.mkv"), MediaFileKind::Video));

        let svc = service(RenamerSettings::default());
        svc.probe_video_renameability(&mut movie).await.expect("probe");
        assert!(movie.media_files.is_empty());
    }

    #[tokio::test]
    async fn upgrade_aborts_when_destination_exists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ds = dir.path();
        let shared = ds.join("shared");
        let taken = ds.join("Test (2001)");
        tokio::fs::create_dir_all(&shared).await.expect("mkdir");
        tokio::fs::create_dir_all(&taken).await.expect("mkdir");
        tokio::fs::write(shared.join("test.mkv"), b"v").await.expect("write");

        let mut movie = Movie::new("Test", Some(2001), ds, &shared);
        movie.multi_movie_dir = true;
        movie
            .media_files
            .push(MediaFile::new(shared.join("test.mkv"), MediaFileKind::Video));

        let result = service(RenamerSettings::default()).rename_movie(&mut movie).await;
        assert_matches::assert_matches!(result, Err(RenameError::CreateDir { .. }));
        // nothing was moved
        assert!(shared.join("test.mkv").exists());
    }
}
