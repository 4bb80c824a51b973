//! Media file model.
//!
//! A [`MediaFile`] represents one file on disk that belongs to a movie. The
//! kind is assigned once at classification time and never changes; renaming
//! produces a *new* `MediaFile` bound to the new path which replaces the old
//! entry only after the filesystem operation succeeded.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stacking;

/// Classification of a file associated with a movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaFileKind {
    Video,
    Trailer,
    Sample,
    Subtitle,
    Nfo,
    Poster,
    Fanart,
    Banner,
    Logo,
    ClearLogo,
    ClearArt,
    Disc,
    Thumb,
    ExtraFanart,
    ExtraThumb,
    Audio,
    Graphic,
    SeasonPoster,
    Text,
    VideoExtra,
    Unknown,
}

impl MediaFileKind {
    /// Image-typed kinds, used for cache invalidation and container
    /// sniffing.
    pub fn is_graphic(self) -> bool {
        matches!(
            self,
            Self::Poster
                | Self::Fanart
                | Self::Banner
                | Self::Logo
                | Self::ClearLogo
                | Self::ClearArt
                | Self::Disc
                | Self::Thumb
                | Self::ExtraFanart
                | Self::ExtraThumb
                | Self::Graphic
                | Self::SeasonPoster
        )
    }
}

/// Language and forced-flag metadata of one subtitle stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleInfo {
    pub language: String,
    pub forced: bool,
}

/// Stream properties of a video file, as far as the renamer needs them for
/// template tokens. Values are plain display strings ("1080p", "h264", ...);
/// empty means unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStreamInfo {
    pub resolution: String,
    pub video_codec: String,
    pub video_format: String,
    pub video_3d: String,
    pub audio_codec: String,
    pub audio_channels: String,
}

/// One file on disk belonging to a movie.
///
/// Identity for set comparisons is (path, kind); two entries pointing at the
/// same path with the same kind are the same file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    /// Absolute path of the file.
    pub path: PathBuf,
    pub kind: MediaFileKind,
    /// Detected container format (e.g. "png", "jpeg"), independent of the
    /// file extension. `None` when not sniffed.
    pub container: Option<String>,
    /// Disc/part number within a stacked set; 0 = not stacked.
    pub stacking: u32,
    /// Verbatim stacking marker from the filename, e.g. "CD1".
    pub stacking_marker: String,
    /// Subtitle streams (subtitle files only).
    pub subtitles: Vec<SubtitleInfo>,
    /// Stream info (video files only).
    pub video_info: VideoStreamInfo,
    /// Last modification time, used for newest-wins artwork selection.
    pub modified: Option<DateTime<Utc>>,
}

impl MediaFile {
    /// Create a media file entry for `path`, deriving stacking information
    /// from the filename.
    pub fn new(path: impl Into<PathBuf>, kind: MediaFileKind) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        MediaFile {
            stacking: stacking::number(&filename),
            stacking_marker: stacking::marker(&filename),
            path,
            kind,
            container: None,
            subtitles: Vec::new(),
            video_info: VideoStreamInfo::default(),
            modified: None,
        }
    }

    /// Sniff the container format from the file's magic bytes.
    pub fn with_sniffed_container(mut self) -> Self {
        if let Ok(Some(t)) = infer::get_from_path(&self.path) {
            self.container = Some(t.extension().to_string());
        }
        self
    }

    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Filename without extension.
    pub fn basename(&self) -> String {
        self.path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Lowercased file extension without the dot.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default()
    }

    /// Filename with any stacking marker removed.
    pub fn filename_without_stacking(&self) -> String {
        stacking::strip_markers(&self.filename())
    }

    /// The extension this file should carry as an image: `jpeg` collapses to
    /// `jpg`, and legacy `tbn` files resolve through the sniffed container.
    pub fn effective_image_extension(&self) -> String {
        let ext = self.extension();
        if ext == "tbn" {
            return match self.container.as_deref() {
                Some("png") => "png".to_string(),
                // tbn files are jpegs unless proven otherwise
                _ => "jpg".to_string(),
            };
        }
        if ext == "jpeg" { "jpg".to_string() } else { ext }
    }

    /// Whether this file is part of a disc authoring structure (VIDEO_TS /
    /// BDMV) whose internal names must never be altered.
    pub fn is_disc_file(&self) -> bool {
        let in_disc_dir = self.path.components().any(|c| {
            c.as_os_str()
                .to_str()
                .is_some_and(|s| s.eq_ignore_ascii_case("VIDEO_TS") || s.eq_ignore_ascii_case("BDMV"))
        });
        in_disc_dir || matches!(self.extension().as_str(), "ifo" | "vob" | "bup" | "bdmv" | "mpls")
    }

    /// Rebase this file from `old_dir` onto `new_dir`, preserving any
    /// relative sub-path (disc structures, extrafanart folders). Paths
    /// already below `new_dir` are left untouched.
    pub fn with_parent(mut self, old_dir: &Path, new_dir: &Path) -> Self {
        if self.path.starts_with(new_dir) {
            return self;
        }
        self.path = match self.path.strip_prefix(old_dir) {
            Ok(rel) => new_dir.join(rel),
            Err(_) => new_dir.join(self.filename()),
        };
        self
    }

    /// Replace the file's full path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Identity used for plan deduplication and preview diffing.
    pub fn identity(&self) -> (PathBuf, MediaFileKind) {
        (self.path.clone(), self.kind)
    }
}

impl PartialEq for MediaFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.kind == other.kind
    }
}

impl Eq for MediaFile {}

impl std::hash::Hash for MediaFile {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.kind.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_stacking_from_filename() {
        let mf = MediaFile::new("/ds/Movie/movie-cd2.avi", MediaFileKind::Video);
        assert_eq!(mf.stacking, 2);
        assert_eq!(mf.stacking_marker, "cd2");
        assert_eq!(mf.filename_without_stacking(), "movie.avi");
    }

    #[test]
    fn effective_image_extension_resolves_tbn_by_container() {
        let mut mf = MediaFile::new("/ds/Movie/poster.tbn", MediaFileKind::Poster);
        mf.container = Some("png".to_string());
        assert_eq!(mf.effective_image_extension(), "png");
        mf.container = Some("jpg".to_string());
        assert_eq!(mf.effective_image_extension(), "jpg");
        mf.container = None;
        assert_eq!(mf.effective_image_extension(), "jpg");

        let jpeg = MediaFile::new("/ds/Movie/fanart.jpeg", MediaFileKind::Fanart);
        assert_eq!(jpeg.effective_image_extension(), "jpg");
    }

    #[test]
    fn disc_files_are_recognized() {
        let vob = MediaFile::new("/ds/Movie/VIDEO_TS/VTS_01_1.VOB", MediaFileKind::Video);
        assert!(vob.is_disc_file());
        let plain = MediaFile::new("/ds/Movie/movie.mkv", MediaFileKind::Video);
        assert!(!plain.is_disc_file());
    }

    #[test]
    fn with_parent_rebases_and_keeps_subpaths() {
        let old = Path::new("/ds/Old");
        let new = Path::new("/ds/New");
        let mf = MediaFile::new("/ds/Old/VIDEO_TS/VTS_01_1.VOB", MediaFileKind::Video)
            .with_parent(old, new);
        assert_eq!(mf.path, Path::new("/ds/New/VIDEO_TS/VTS_01_1.VOB"));

        // already at the destination: untouched
        let mf = MediaFile::new("/ds/New/movie.mkv", MediaFileKind::Video).with_parent(old, new);
        assert_eq!(mf.path, Path::new("/ds/New/movie.mkv"));
    }
}
