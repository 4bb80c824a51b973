//! Destination planning: which files should exist after a rename.
//!
//! A [`RenamePlanner`] resolves the destination folder and the new video
//! basename once per movie, then maps every existing media file to the zero
//! or more files it becomes. Planning is pure - no filesystem access, no
//! mutation - so the preview and the executor share the exact same logic.

use std::path::{Path, PathBuf};

use crate::config::RenamerSettings;
use crate::model::stacking;
use crate::model::{FanartNaming, MediaFile, MediaFileKind, Movie, NfoNaming, PosterNaming};
use crate::services::{language, template};

/// True when the folder template guarantees a unique folder per movie: at
/// least a title/year combination, or an IMDb id.
pub fn folder_template_is_unique(template: &str) -> bool {
    let t = template.to_uppercase();
    let has_title = t.contains("$T") || t.contains("$E") || t.contains("$O");
    (has_title && t.contains("$Y")) || t.contains("$I")
}

/// True when the file template produces a usable name (contains at least a
/// title token). Empty or title-less templates keep the current file names.
pub fn file_template_is_valid(template: &str) -> bool {
    let t = template.to_uppercase();
    t.contains("$T") || t.contains("$E") || t.contains("$O")
}

/// Per-movie plan context: destination folder, multi-movie-dir decision and
/// the shared video basename all derived names hang off.
#[derive(Debug)]
pub struct RenamePlanner {
    settings: RenamerSettings,
    old_folder: PathBuf,
    dest_dir: PathBuf,
    multi_movie_dir: bool,
    video_basename: String,
    rename_files: bool,
}

impl RenamePlanner {
    pub fn new(movie: &Movie, settings: &RenamerSettings) -> Self {
        let (relative, multi_movie_dir) = if settings.folder_template.is_empty() {
            // no folder template: keep the current folder and MMD state
            (movie.relative_folder(), movie.multi_movie_dir)
        } else {
            // the folder MUST be unique to own a directory; a non-unique
            // template downgrades the movie to a shared directory
            (
                PathBuf::from(template::expand(&settings.folder_template, movie, settings, false)),
                !folder_template_is_unique(&settings.folder_template),
            )
        };
        let dest_dir = movie.data_source.join(relative);

        let rename_files = file_template_is_valid(&settings.file_template);
        let video_basename = if rename_files {
            let name = template::expand(&settings.file_template, movie, settings, true);
            stacking::strip_markers(&name)
        } else {
            movie.video_basename_without_stacking()
        };

        RenamePlanner {
            settings: settings.clone(),
            old_folder: movie.folder.clone(),
            dest_dir,
            multi_movie_dir,
            video_basename,
            rename_files,
        }
    }

    pub fn destination_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub fn multi_movie_dir(&self) -> bool {
        self.multi_movie_dir
    }

    pub fn video_basename(&self) -> &str {
        &self.video_basename
    }

    pub fn renames_files(&self) -> bool {
        self.rename_files
    }

    /// Folder needs to change when the destination differs from the current
    /// folder.
    pub fn folder_changes(&self) -> bool {
        self.dest_dir != self.old_folder
    }

    /// "delimiter + marker" for stacked files, e.g. " CD1" or "_CD1" when
    /// space substitution is active.
    fn stacking_suffix(&self, file: &MediaFile) -> String {
        let delimiter = if self.settings.space_substitution && !self.settings.space_replacement.is_empty()
        {
            self.settings.space_replacement.clone()
        } else {
            " ".to_string()
        };
        if !file.stacking_marker.is_empty() {
            format!("{delimiter}{}", file.stacking_marker)
        } else if file.stacking != 0 {
            format!("{delimiter}CD{}", file.stacking)
        } else {
            String::new()
        }
    }

    fn reparented(&self, file: &MediaFile) -> MediaFile {
        file.clone().with_parent(&self.old_folder, &self.dest_dir)
    }

    fn named(&self, file: &MediaFile, filename: String) -> MediaFile {
        file.clone().with_path(self.dest_dir.join(filename))
    }

    /// Compute the destination files for one existing media file. An empty
    /// result means the file is not carried forward (cleanup candidate).
    pub fn destinations_for(&self, movie: &Movie, file: &MediaFile) -> Vec<MediaFile> {
        // without a usable file template nothing is renamed, but a folder
        // template still moves everything along (disc layouts always keep
        // their internal names)
        if !self.rename_files && !movie.is_disc() {
            return vec![self.reparented(file)];
        }

        let base = &self.video_basename;
        match file.kind {
            MediaFileKind::Video => {
                if movie.is_disc() || file.is_disc_file() {
                    // never touch disc authoring structure internals
                    vec![self.reparented(file)]
                } else {
                    let name = format!("{base}{}.{}", self.stacking_suffix(file), file.extension());
                    vec![self.named(file, name)]
                }
            }

            MediaFileKind::Trailer => {
                vec![self.named(file, format!("{base}-trailer.{}", file.extension()))]
            }

            MediaFileKind::Sample => {
                vec![self.named(file, format!("{base}-sample.{}", file.extension()))]
            }

            MediaFileKind::Subtitle => {
                let mut name = format!("{base}{}", self.stacking_suffix(file));
                let (language, forced) = match file.subtitles.first() {
                    Some(info) => (info.language.clone(), info.forced),
                    None => {
                        let (lang, forced) = language::detect_from_basename(
                            &file.basename(),
                            &movie.video_basename_without_stacking(),
                        );
                        (lang.map(|l| l.iso2.to_string()).unwrap_or_default(), forced)
                    }
                };
                if forced {
                    name.push_str(".forced");
                }
                if !language.is_empty() {
                    name.push('.');
                    name.push_str(&language::render(&language, self.settings.language_style));
                }
                name.push('.');
                name.push_str(&file.extension());
                vec![self.named(file, name)]
            }

            MediaFileKind::Nfo => {
                let namings: Vec<NfoNaming> = if self.multi_movie_dir {
                    // a shared dir cannot hold movie-agnostic names
                    vec![NfoNaming::Filename]
                } else {
                    self.settings.nfo_filenames.clone()
                };
                namings
                    .into_iter()
                    .filter_map(|naming| {
                        let name = naming.render(base, movie.disc_structure);
                        (!name.is_empty()).then(|| self.named(file, name))
                    })
                    .collect()
            }

            MediaFileKind::Poster => {
                let namings: Vec<PosterNaming> = if self.multi_movie_dir {
                    PosterNaming::multi_movie_dir().to_vec()
                } else {
                    self.settings.poster_filenames.clone()
                };
                let source_ext = file.effective_image_extension();
                namings
                    .into_iter()
                    .filter(|naming| naming.extension() == source_ext)
                    .filter_map(|naming| {
                        let name = naming.render(&movie.title, base);
                        (!name.is_empty()).then(|| self.named(file, name))
                    })
                    .collect()
            }

            MediaFileKind::Fanart => {
                let namings: Vec<FanartNaming> = if self.multi_movie_dir {
                    FanartNaming::multi_movie_dir().to_vec()
                } else {
                    self.settings.fanart_filenames.clone()
                };
                let source_ext = file.effective_image_extension();
                namings
                    .into_iter()
                    .filter(|naming| naming.extension() == source_ext)
                    .filter_map(|naming| {
                        let name = naming.render(&movie.title, base);
                        (!name.is_empty()).then(|| self.named(file, name))
                    })
                    .collect()
            }

            MediaFileKind::Banner => self.fixed_name_artwork(file, "banner", self.settings.artwork.banner),
            MediaFileKind::ClearArt => {
                self.fixed_name_artwork(file, "clearart", self.settings.artwork.clearart)
            }
            MediaFileKind::Disc => self.fixed_name_artwork(file, "disc", self.settings.artwork.discart),
            MediaFileKind::Logo => self.fixed_name_artwork(file, "logo", self.settings.artwork.logo),
            MediaFileKind::ClearLogo => {
                self.fixed_name_artwork(file, "clearlogo", self.settings.artwork.logo)
            }
            MediaFileKind::Thumb => self.fixed_name_artwork(file, "thumb", self.settings.artwork.thumb),

            MediaFileKind::ExtraFanart => {
                if self.settings.artwork.extrafanart && !self.multi_movie_dir {
                    vec![self.reparented(file)]
                } else {
                    vec![]
                }
            }
            MediaFileKind::ExtraThumb => {
                if self.settings.artwork.extrathumb && !self.multi_movie_dir {
                    vec![self.reparented(file)]
                } else {
                    vec![]
                }
            }

            // everything else moves along untouched
            MediaFileKind::Audio
            | MediaFileKind::Graphic
            | MediaFileKind::SeasonPoster
            | MediaFileKind::Text
            | MediaFileKind::VideoExtra
            | MediaFileKind::Unknown => vec![self.reparented(file)],
        }
    }

    /// Artwork kinds with one well-known name: `<kind>.<ext>` in an owned
    /// directory, `<basename>-<kind>.<ext>` in a shared one. Disabled kinds
    /// are dropped from the plan.
    fn fixed_name_artwork(&self, file: &MediaFile, suffix: &str, enabled: bool) -> Vec<MediaFile> {
        if !enabled {
            return vec![];
        }
        let ext = file.effective_image_extension();
        let name = if self.multi_movie_dir {
            format!("{}-{suffix}.{ext}", self.video_basename)
        } else {
            format!("{suffix}.{ext}")
        };
        vec![self.named(file, name)]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::SubtitleInfo;

    fn movie_with_video() -> Movie {
        let mut movie = Movie::new("Inception", Some(2010), "/ds", "/ds/Inception (2010)");
        movie.media_files.push(MediaFile::new(
            "/ds/Inception (2010)/inception.mkv",
            MediaFileKind::Video,
        ));
        movie
    }

    #[test]
    fn unique_folder_templates() {
        assert!(folder_template_is_unique("$T ($Y)"));
        assert!(folder_template_is_unique("$E ($Y)"));
        assert!(folder_template_is_unique("$I"));
        assert!(!folder_template_is_unique("$S"));
        assert!(!folder_template_is_unique("$T"));
        assert!(!folder_template_is_unique("$Y"));
    }

    #[test]
    fn video_gets_template_name() {
        let movie = movie_with_video();
        let planner = RenamePlanner::new(&movie, &RenamerSettings::default());
        let video = movie.primary_video_file().expect("video");
        let dests = planner.destinations_for(&movie, video);
        assert_eq!(dests.len(), 1);
        assert_eq!(
            dests[0].path,
            Path::new("/ds/Inception (2010)/Inception (2010).mkv")
        );
    }

    #[test]
    fn stacked_videos_keep_their_marker() {
        let mut movie = movie_with_video();
        movie.media_files.clear();
        movie.media_files.push(MediaFile::new(
            "/ds/Inception (2010)/inception-cd1.avi",
            MediaFileKind::Video,
        ));
        let planner = RenamePlanner::new(&movie, &RenamerSettings::default());
        let video = movie.primary_video_file().expect("video");
        let dests = planner.destinations_for(&movie, video);
        assert_eq!(
            dests[0].path,
            Path::new("/ds/Inception (2010)/Inception (2010) cd1.avi")
        );
    }

    #[test]
    fn poster_produces_one_file_per_variant_with_matching_extension() {
        let mut movie = movie_with_video();
        let poster = MediaFile::new("/ds/Inception (2010)/folder.jpg", MediaFileKind::Poster);
        movie.media_files.push(poster.clone());

        let mut settings = RenamerSettings::default();
        settings.poster_filenames = vec![
            PosterNaming::PosterJpg,
            PosterNaming::PosterPng,
            PosterNaming::MovienameJpg,
        ];
        let planner = RenamePlanner::new(&movie, &settings);
        let dests = planner.destinations_for(&movie, &poster);
        let names: Vec<String> = dests.iter().map(MediaFile::filename).collect();
        // png variant is filtered out because the source is a jpg
        assert_eq!(names, vec!["poster.jpg", "Inception.jpg"]);
    }

    #[test]
    fn multi_movie_dir_forces_filename_based_artwork() {
        let mut movie = movie_with_video();
        let poster = MediaFile::new("/ds/Inception (2010)/poster.jpg", MediaFileKind::Poster);
        movie.media_files.push(poster.clone());

        let mut settings = RenamerSettings::default();
        settings.folder_template = "$T".to_string(); // not unique -> shared dir
        let planner = RenamePlanner::new(&movie, &settings);
        assert!(planner.multi_movie_dir());

        let dests = planner.destinations_for(&movie, &poster);
        let names: Vec<String> = dests.iter().map(MediaFile::filename).collect();
        assert_eq!(names, vec!["Inception (2010)-poster.jpg"]);
    }

    #[test]
    fn disc_video_keeps_internal_name() {
        let mut movie = movie_with_video();
        movie.media_files.clear();
        movie.disc_structure = Some(crate::model::DiscStructure::VideoTs);
        let vob = MediaFile::new(
            "/ds/Inception (2010)/VIDEO_TS/VTS_01_1.VOB",
            MediaFileKind::Video,
        );
        movie.media_files.push(vob.clone());

        let mut settings = RenamerSettings::default();
        settings.folder_template = "$T - $Y".to_string();
        let planner = RenamePlanner::new(&movie, &settings);
        let dests = planner.destinations_for(&movie, &vob);
        assert_eq!(
            dests[0].path,
            Path::new("/ds/Inception - 2010/VIDEO_TS/VTS_01_1.VOB")
        );
    }

    #[test]
    fn subtitle_name_carries_forced_and_language() {
        let mut movie = movie_with_video();
        let mut sub = MediaFile::new("/ds/Inception (2010)/inception.srt", MediaFileKind::Subtitle);
        sub.subtitles.push(SubtitleInfo {
            language: "de".to_string(),
            forced: true,
        });
        movie.media_files.push(sub.clone());

        let planner = RenamePlanner::new(&movie, &RenamerSettings::default());
        let dests = planner.destinations_for(&movie, &sub);
        assert_eq!(
            dests[0].filename(),
            "Inception (2010).forced.deu.srt"
        );
    }

    #[test]
    fn disabled_artwork_kinds_are_dropped_from_the_plan() {
        let mut movie = movie_with_video();
        let banner = MediaFile::new("/ds/Inception (2010)/banner.jpg", MediaFileKind::Banner);
        movie.media_files.push(banner.clone());

        let mut settings = RenamerSettings::default();
        settings.artwork.banner = false;
        let planner = RenamePlanner::new(&movie, &settings);
        assert!(planner.destinations_for(&movie, &banner).is_empty());

        settings.artwork.banner = true;
        let planner = RenamePlanner::new(&movie, &settings);
        let dests = planner.destinations_for(&movie, &banner);
        assert_eq!(dests[0].filename(), "banner.jpg");
    }

    #[test]
    fn empty_file_template_reparents_only() {
        let mut movie = movie_with_video();
        movie.folder = PathBuf::from("/ds/old");
        movie.media_files[0].path = PathBuf::from("/ds/old/inception.mkv");

        let mut settings = RenamerSettings::default();
        settings.file_template = String::new();
        let planner = RenamePlanner::new(&movie, &settings);
        let dests = planner.destinations_for(&movie, &movie.media_files[0]);
        assert_eq!(
            dests[0].path,
            Path::new("/ds/Inception (2010)/inception.mkv")
        );
    }
}
