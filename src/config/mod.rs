//! Renamer configuration.
//!
//! The engine never reads ambient/global state: callers take a
//! [`RenamerSettings`] snapshot and pass it into every service, so two runs
//! with different settings are fully independent and unit tests can vary the
//! configuration per case.

use serde::{Deserialize, Serialize};

use crate::model::{FanartNaming, NfoNaming, PosterNaming};

/// How detected subtitle languages are written into filenames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageStyle {
    /// Two-letter code ("en")
    Iso2,
    /// Three-letter code ("eng")
    #[default]
    Iso3,
    /// English display name ("English")
    EnglishName,
}

/// Flavor of the metadata file the surrounding application writes.
///
/// [`MetadataFormat::MediaPortal`] embeds poster/fanart references inline,
/// so a rename that rewrote either triggers a metadata-file regeneration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataFormat {
    #[default]
    Kodi,
    MediaPortal,
}

/// Per-artwork-kind enable flags. Disabled kinds are dropped from the plan
/// and thus cleaned up on the next rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtworkFlags {
    pub banner: bool,
    pub clearart: bool,
    pub discart: bool,
    pub logo: bool,
    pub thumb: bool,
    pub extrafanart: bool,
    pub extrathumb: bool,
}

impl Default for ArtworkFlags {
    fn default() -> Self {
        ArtworkFlags {
            banner: true,
            clearart: true,
            discart: true,
            logo: true,
            thumb: true,
            extrafanart: true,
            extrathumb: true,
        }
    }
}

/// Snapshot of every setting the rename engine consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamerSettings {
    /// Folder name template; empty keeps the current folder.
    pub folder_template: String,
    /// File name template; empty (or title-less) keeps current file names.
    pub file_template: String,
    /// NFO filename variants to produce, in order.
    pub nfo_filenames: Vec<NfoNaming>,
    /// Poster filename variants to produce, in order.
    pub poster_filenames: Vec<PosterNaming>,
    /// Fanart filename variants to produce, in order.
    pub fanart_filenames: Vec<FanartNaming>,
    /// Replace spaces in expanded names with `space_replacement`.
    pub space_substitution: bool,
    pub space_replacement: String,
    /// Transliterate expanded names to ASCII.
    pub ascii_replacement: bool,
    pub language_style: LanguageStyle,
    /// Delete stray `.nfo` files not produced by this tool.
    pub nfo_cleanup: bool,
    pub metadata_format: MetadataFormat,
    /// Expand movie-set tokens even for sets with a single movie.
    pub movieset_for_single_movie: bool,
    pub artwork: ArtworkFlags,
}

impl Default for RenamerSettings {
    fn default() -> Self {
        RenamerSettings {
            folder_template: "$T ($Y)".to_string(),
            file_template: "$T ($Y)".to_string(),
            nfo_filenames: vec![NfoNaming::Filename],
            poster_filenames: vec![PosterNaming::PosterJpg, PosterNaming::PosterPng],
            fanart_filenames: vec![FanartNaming::FanartJpg, FanartNaming::FanartPng],
            space_substitution: false,
            space_replacement: "_".to_string(),
            ascii_replacement: false,
            language_style: LanguageStyle::default(),
            nfo_cleanup: false,
            metadata_format: MetadataFormat::default(),
            movieset_for_single_movie: false,
            artwork: ArtworkFlags::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_through_serde() {
        let mut settings = RenamerSettings::default();
        settings.space_substitution = true;
        settings.space_replacement = ".".to_string();
        settings.language_style = LanguageStyle::Iso2;

        let json = serde_json::to_string(&settings).expect("serialize");
        let back: RenamerSettings = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.space_replacement, ".");
        assert_eq!(back.language_style, LanguageStyle::Iso2);
        assert_eq!(back.folder_template, settings.folder_template);
    }
}
