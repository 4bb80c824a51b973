//! Error taxonomy for the rename engine.
//!
//! Only failures that abort a whole movie's rename are modeled as errors.
//! Secondary-artifact copy failures and cleanup failures are logged and
//! absorbed at the call site - the original file is kept and processing
//! continues.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal per-movie rename failures.
///
/// Each variant aborts processing for the affected movie only; a batch run
/// logs the error, notifies the user and continues with the next movie.
#[derive(Debug, Error)]
pub enum RenameError {
    /// The movie has no data source configured, so no destination can be
    /// resolved at all.
    #[error("movie has no data source set")]
    MissingDataSource,

    /// The movie has no title - templates would expand to nothing useful.
    #[error("movie has no title set")]
    TitleUnset,

    /// The destination directory could not be created.
    #[error("could not create destination directory {}", path.display())]
    CreateDir { path: PathBuf },

    /// Moving the movie folder failed. Nothing has been touched beyond the
    /// failed move itself.
    #[error("could not move folder {} to {}", src.display(), dest.display())]
    FolderMove { src: PathBuf, dest: PathBuf },

    /// A video file did not pass the renameability probe - it is likely
    /// locked by another process (e.g. currently playing).
    #[error("video file {} is not renameable (in use?)", path.display())]
    VideoLocked { path: PathBuf },
}
