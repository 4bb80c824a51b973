//! Dry-run rename preview.
//!
//! Runs the exact planning logic of the executor without touching the
//! filesystem or the movie, and diffs the current file set against the
//! planned one. Used to build a reviewable change list before anything is
//! mutated.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::RenamerSettings;
use crate::model::{MediaFile, MediaFileKind, Movie};
use crate::services::plan::RenamePlanner;

/// Outcome of a preview run. Immutable snapshot; discard after acting on it.
#[derive(Debug, Clone)]
pub struct RenamePreview {
    pub movie_title: String,
    /// Current folder, relative to the data source.
    pub old_relative_path: PathBuf,
    /// Planned folder, relative to the data source.
    pub new_relative_path: PathBuf,
    /// The complete planned file set (deduplicated, plan order).
    pub new_files: Vec<MediaFile>,
    /// Whether executing the rename would change anything on disk.
    pub needs_rename: bool,
}

/// Compute the change set renaming `movie` would produce. Pure: calling this
/// twice in a row yields identical results.
pub fn preview(movie: &Movie, settings: &RenamerSettings) -> RenamePreview {
    let planner = RenamePlanner::new(movie, settings);

    // videos first - every other name is derived from the video basename
    let mut old_files: Vec<MediaFile> = Vec::with_capacity(movie.media_files.len());
    let mut new_files: Vec<MediaFile> = Vec::new();
    let mut seen: HashSet<(PathBuf, MediaFileKind)> = HashSet::new();

    let videos = movie.media_files_of(MediaFileKind::Video);
    let others = movie.media_files_except(&[MediaFileKind::Video]);
    for file in videos.into_iter().chain(others) {
        old_files.push(file.clone());
        for dest in planner.destinations_for(movie, file) {
            if seen.insert(dest.identity()) {
                new_files.push(dest);
            }
        }
    }

    let mut needs_rename = planner.folder_changes();

    // rebase the old set onto the new folder so an unchanged file compares
    // equal to its planned counterpart
    if needs_rename {
        old_files = old_files
            .into_iter()
            .map(|f| f.with_parent(&movie.folder, planner.destination_dir()))
            .collect();
    }

    // set comparison on (path, kind) - a same-count rename that swaps which
    // files exist still flags
    let old_set: HashSet<(PathBuf, MediaFileKind)> =
        old_files.iter().map(MediaFile::identity).collect();
    needs_rename = needs_rename
        || new_files.iter().any(|f| !old_set.contains(&f.identity()))
        || old_files.iter().any(|f| !seen.contains(&f.identity()));

    RenamePreview {
        movie_title: movie.title.clone(),
        old_relative_path: movie.relative_folder(),
        new_relative_path: planner
            .destination_dir()
            .strip_prefix(&movie.data_source)
            .map(Into::into)
            .unwrap_or_else(|_| planner.destination_dir().to_path_buf()),
        new_files,
        needs_rename,
    }
}
