//! Movie folder scanning and file classification.
//!
//! Builds the [`MediaFile`] list for a movie from what is actually on disk.
//! Classification happens once here; the assigned kind is immutable for the
//! life of the entry.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::debug;
use walkdir::WalkDir;

use crate::model::{DiscStructure, MediaFile, MediaFileKind, SubtitleInfo};
use crate::services::language;

pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "mov", "wmv", "flv", "webm", "m4v", "ts", "m2ts", "mpg", "mpeg", "vob",
    "ifo",
];
pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "sub", "idx", "vtt"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tbn", "gif", "bmp", "webp"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "wav", "aac", "ac3", "dts"];

/// Detect a disc authoring layout in the movie folder.
pub fn detect_disc_structure(folder: &Path) -> Option<DiscStructure> {
    if folder.join("VIDEO_TS").is_dir() || folder.join("VIDEO_TS.IFO").is_file() {
        return Some(DiscStructure::VideoTs);
    }
    if folder.join("BDMV").is_dir() || folder.join("index.bdmv").is_file() {
        return Some(DiscStructure::Bdmv);
    }
    None
}

/// Classify one file by its location and name.
pub fn classify(path: &Path) -> MediaFileKind {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    let parent = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        if parent == "extrafanart" {
            return MediaFileKind::ExtraFanart;
        }
        if parent == "extrathumbs" {
            return MediaFileKind::ExtraThumb;
        }
        return classify_image(&stem);
    }

    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        if stem == "sample" || stem.ends_with("-sample") {
            return MediaFileKind::Sample;
        }
        if stem == "trailer" || stem.ends_with("-trailer") {
            return MediaFileKind::Trailer;
        }
        return MediaFileKind::Video;
    }

    if SUBTITLE_EXTENSIONS.contains(&ext.as_str()) {
        return MediaFileKind::Subtitle;
    }
    if ext == "nfo" {
        return MediaFileKind::Nfo;
    }
    if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        return MediaFileKind::Audio;
    }
    if ext == "txt" {
        return MediaFileKind::Text;
    }
    MediaFileKind::Unknown
}

fn classify_image(stem: &str) -> MediaFileKind {
    if stem == "poster" || stem == "folder" || stem == "movie" || stem == "cover" || stem.ends_with("-poster")
    {
        return MediaFileKind::Poster;
    }
    if stem == "fanart" || stem.ends_with("-fanart") || stem.ends_with(".fanart") {
        return MediaFileKind::Fanart;
    }
    if stem == "banner" || stem.ends_with("-banner") {
        return MediaFileKind::Banner;
    }
    if stem == "clearart" || stem.ends_with("-clearart") {
        return MediaFileKind::ClearArt;
    }
    if stem == "clearlogo" || stem.ends_with("-clearlogo") {
        return MediaFileKind::ClearLogo;
    }
    if stem == "logo" || stem.ends_with("-logo") {
        return MediaFileKind::Logo;
    }
    if stem == "disc" || stem == "cdart" || stem.ends_with("-disc") {
        return MediaFileKind::Disc;
    }
    if stem == "thumb" || stem.ends_with("-thumb") {
        return MediaFileKind::Thumb;
    }
    MediaFileKind::Graphic
}

/// Scan a movie folder into classified media files, videos first.
///
/// Hidden entries (including the backup tree) are skipped. Graphics get
/// their container sniffed; subtitles get language and forced flags
/// pre-detected from their filenames.
pub fn scan_movie_folder(folder: &Path) -> Result<Vec<MediaFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(folder)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e
                    .file_name()
                    .to_str()
                    .is_some_and(|n| n.starts_with('.'))
        })
    {
        let entry = entry.with_context(|| format!("scanning {}", folder.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let kind = classify(entry.path());
        let mut mf = MediaFile::new(entry.path(), kind);
        if let Ok(meta) = entry.metadata() {
            if let Ok(modified) = meta.modified() {
                mf.modified = Some(DateTime::<Utc>::from(modified));
            }
        }
        if kind.is_graphic() {
            mf = mf.with_sniffed_container();
        }
        debug!(path = %entry.path().display(), kind = ?kind, "classified file");
        files.push(mf);
    }

    // videos first: everything else derives its name from them
    files.sort_by_key(|f| f.kind != MediaFileKind::Video);

    // pre-detect subtitle metadata now that the video basename is known
    let video_basename = files
        .iter()
        .find(|f| f.kind == MediaFileKind::Video)
        .map(|f| {
            Path::new(&f.filename_without_stacking())
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string()
        })
        .unwrap_or_default();
    for file in files.iter_mut().filter(|f| f.kind == MediaFileKind::Subtitle) {
        let (lang, forced) = language::detect_from_basename(&file.basename(), &video_basename);
        if lang.is_some() || forced {
            file.subtitles = vec![SubtitleInfo {
                language: lang.map(|l| l.iso2.to_string()).unwrap_or_default(),
                forced,
            }];
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_well_known_names() {
        assert_eq!(classify(Path::new("/m/movie.mkv")), MediaFileKind::Video);
        assert_eq!(classify(Path::new("/m/movie-trailer.mp4")), MediaFileKind::Trailer);
        assert_eq!(classify(Path::new("/m/movie-sample.avi")), MediaFileKind::Sample);
        assert_eq!(classify(Path::new("/m/poster.jpg")), MediaFileKind::Poster);
        assert_eq!(classify(Path::new("/m/movie-poster.png")), MediaFileKind::Poster);
        assert_eq!(classify(Path::new("/m/fanart.jpg")), MediaFileKind::Fanart);
        assert_eq!(classify(Path::new("/m/clearlogo.png")), MediaFileKind::ClearLogo);
        assert_eq!(classify(Path::new("/m/logo.png")), MediaFileKind::Logo);
        assert_eq!(classify(Path::new("/m/movie.nfo")), MediaFileKind::Nfo);
        assert_eq!(classify(Path::new("/m/movie.en.srt")), MediaFileKind::Subtitle);
        assert_eq!(classify(Path::new("/m/extrafanart/fanart1.jpg")), MediaFileKind::ExtraFanart);
        assert_eq!(classify(Path::new("/m/unrelated.jpg")), MediaFileKind::Graphic);
        assert_eq!(classify(Path::new("/m/whatever.xyz")), MediaFileKind::Unknown);
    }

    #[test]
    fn scans_a_folder_with_videos_first_and_detects_subtitle_language() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folder = dir.path();
        std::fs::write(folder.join("poster.jpg"), b"img").expect("write");
        std::fs::write(folder.join("inception.mkv"), b"vid").expect("write");
        std::fs::write(folder.join("inception.en.srt"), b"sub").expect("write");

        let files = scan_movie_folder(folder).expect("scan");
        assert_eq!(files.len(), 3);
        assert_eq!(files[0].kind, MediaFileKind::Video);

        let sub = files
            .iter()
            .find(|f| f.kind == MediaFileKind::Subtitle)
            .expect("subtitle");
        assert_eq!(sub.subtitles.first().map(|s| s.language.as_str()), Some("en"));
    }

    #[test]
    fn detects_disc_structures() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(detect_disc_structure(dir.path()), None);
        std::fs::create_dir(dir.path().join("VIDEO_TS")).expect("mkdir");
        assert_eq!(detect_disc_structure(dir.path()), Some(DiscStructure::VideoTs));
    }
}
