//! Movie entity as the rename engine sees it.
//!
//! Metadata fields are read-only for the engine; only the folder path, the
//! multi-movie-directory flag and the media file list are written back, and
//! only after the corresponding filesystem operation succeeded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::media_file::{MediaFile, MediaFileKind};

/// Physical source the movie was ripped/recorded from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaSource {
    Bluray,
    Dvd,
    HdDvd,
    Tv,
    Vhs,
    WebDl,
    Stream,
    #[default]
    Unknown,
}

impl std::fmt::Display for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MediaSource::Bluray => "Bluray",
            MediaSource::Dvd => "DVD",
            MediaSource::HdDvd => "HDDVD",
            MediaSource::Tv => "TV",
            MediaSource::Vhs => "VHS",
            MediaSource::WebDl => "WebDL",
            MediaSource::Stream => "Stream",
            MediaSource::Unknown => "",
        };
        f.write_str(s)
    }
}

/// Disc authoring layout of the movie folder, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscStructure {
    VideoTs,
    Bdmv,
}

/// Membership of a movie in an ordered movie set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSetMembership {
    pub title: String,
    /// Number of movies in the set; set tokens only expand for real sets
    /// (more than one movie) unless configured otherwise.
    pub size: usize,
}

/// A movie with its metadata and registered on-disk files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    pub original_title: String,
    /// Explicit sort title; empty means "derive from title".
    pub sort_title: String,
    /// Release year; `None` (or 0) means unknown.
    pub year: Option<i32>,
    pub imdb_id: String,
    pub spoken_languages: String,
    pub country: String,
    pub certification: String,
    pub director: String,
    pub genres: Vec<String>,
    pub media_source: MediaSource,
    pub video_in_3d: bool,
    pub movie_set: Option<MovieSetMembership>,
    /// Library root this movie belongs to. Every movie path is below it.
    pub data_source: PathBuf,
    /// Current movie folder.
    pub folder: PathBuf,
    /// Whether the folder is shared with other movies. Re-derived from the
    /// folder template's uniqueness on every rename.
    pub multi_movie_dir: bool,
    pub disc_structure: Option<DiscStructure>,
    pub media_files: Vec<MediaFile>,
}

impl Movie {
    /// Minimal constructor for a movie rooted in `data_source`.
    pub fn new(
        title: impl Into<String>,
        year: Option<i32>,
        data_source: impl Into<PathBuf>,
        folder: impl Into<PathBuf>,
    ) -> Self {
        Movie {
            title: title.into(),
            original_title: String::new(),
            sort_title: String::new(),
            year,
            imdb_id: String::new(),
            spoken_languages: String::new(),
            country: String::new(),
            certification: String::new(),
            director: String::new(),
            genres: Vec::new(),
            media_source: MediaSource::Unknown,
            video_in_3d: false,
            movie_set: None,
            data_source: data_source.into(),
            folder: folder.into(),
            multi_movie_dir: false,
            disc_structure: None,
            media_files: Vec::new(),
        }
    }

    pub fn is_disc(&self) -> bool {
        self.disc_structure.is_some()
    }

    /// Year as a template value; unknown years render as empty, never "0".
    pub fn year_string(&self) -> String {
        match self.year {
            Some(y) if y > 0 => y.to_string(),
            _ => String::new(),
        }
    }

    /// Sort title, derived by rotating a leading article when no explicit
    /// one is stored ("The Matrix" -> "Matrix, The").
    pub fn title_sortable(&self) -> String {
        if !self.sort_title.is_empty() {
            return self.sort_title.clone();
        }
        sortable_title(&self.title)
    }

    pub fn media_files_of(&self, kind: MediaFileKind) -> Vec<&MediaFile> {
        self.media_files.iter().filter(|f| f.kind == kind).collect()
    }

    pub fn media_files_except(&self, kinds: &[MediaFileKind]) -> Vec<&MediaFile> {
        self.media_files
            .iter()
            .filter(|f| !kinds.contains(&f.kind))
            .collect()
    }

    /// The primary (first) video file, if any.
    pub fn primary_video_file(&self) -> Option<&MediaFile> {
        self.media_files.iter().find(|f| f.kind == MediaFileKind::Video)
    }

    /// The most recently modified file of `kind`; files without a timestamp
    /// lose against any dated one.
    pub fn newest_file_of(&self, kind: MediaFileKind) -> Option<&MediaFile> {
        self.media_files
            .iter()
            .filter(|f| f.kind == kind)
            .max_by_key(|f| f.modified)
    }

    /// Basename of the primary video file with stacking markers stripped -
    /// the stem every derived file name is built from.
    pub fn video_basename_without_stacking(&self) -> String {
        self.primary_video_file()
            .map(|mf| {
                Path::new(&mf.filename_without_stacking())
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string()
            })
            .unwrap_or_default()
    }

    /// The movie folder relative to its data source.
    pub fn relative_folder(&self) -> PathBuf {
        self.folder
            .strip_prefix(&self.data_source)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.folder.clone())
    }

    /// Rebase all registered media files from `old_dir` to `new_dir` after a
    /// successful folder move.
    pub fn rebase_media_files(&mut self, old_dir: &Path, new_dir: &Path) {
        self.media_files = std::mem::take(&mut self.media_files)
            .into_iter()
            .map(|f| f.with_parent(old_dir, new_dir))
            .collect();
    }
}

/// Rotate a leading article to the back: "The Matrix" -> "Matrix, The".
pub fn sortable_title(title: &str) -> String {
    for article in ["The ", "A ", "An "] {
        if let Some(rest) = title.strip_prefix(article) {
            return format!("{}, {}", rest, article.trim_end());
        }
    }
    title.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sortable_title_rotates_articles() {
        assert_eq!(sortable_title("The Matrix"), "Matrix, The");
        assert_eq!(sortable_title("An American Tail"), "American Tail, An");
        assert_eq!(sortable_title("Inception"), "Inception");
    }

    #[test]
    fn year_string_hides_sentinels() {
        let mut movie = Movie::new("Test", Some(0), "/ds", "/ds/Test");
        assert_eq!(movie.year_string(), "");
        movie.year = None;
        assert_eq!(movie.year_string(), "");
        movie.year = Some(1999);
        assert_eq!(movie.year_string(), "1999");
    }

    #[test]
    fn video_basename_strips_stacking() {
        let mut movie = Movie::new("Test", Some(2001), "/ds", "/ds/Test");
        movie
            .media_files
            .push(MediaFile::new("/ds/Test/test-cd1.avi", MediaFileKind::Video));
        assert_eq!(movie.video_basename_without_stacking(), "test");
    }
}
