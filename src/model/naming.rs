//! Naming variants for metadata and artwork files.
//!
//! A movie can legitimately keep the same artwork under several filenames at
//! once (e.g. `poster.jpg` for one player, `<moviename>.jpg` for another),
//! so settings carry *ordered lists* of these variants. Rendering is a pure
//! function of (variant, movie title, video basename).

use serde::{Deserialize, Serialize};

use super::movie::DiscStructure;

/// Strip characters that are illegal in filenames; colons turn into dashes.
pub fn clean_for_filename(source: &str) -> String {
    let mut out = source.replace(": ", " - ").replace(':', "-");
    out.retain(|c| !matches!(c, '"' | '\\' | '<' | '>' | '|' | '/' | '?' | '*'));
    out
}

/// Filename variants for the movie metadata file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NfoNaming {
    /// `<video basename>.nfo`; fixed well-known names inside disc layouts.
    Filename,
    /// `movie.nfo`
    Movie,
    /// NFO next to the disc index: `VIDEO_TS/VIDEO_TS.nfo` / `BDMV/index.nfo`.
    DiscParent,
}

impl NfoNaming {
    pub fn all() -> &'static [NfoNaming] {
        &[NfoNaming::Filename, NfoNaming::Movie, NfoNaming::DiscParent]
    }

    /// Render the NFO filename relative to the movie folder. Empty when the
    /// variant does not apply (e.g. disc variants for plain file layouts).
    pub fn render(self, base: &str, disc: Option<DiscStructure>) -> String {
        match self {
            NfoNaming::Filename => match disc {
                Some(DiscStructure::VideoTs) => "VIDEO_TS.nfo".to_string(),
                Some(DiscStructure::Bdmv) => "index.nfo".to_string(),
                None if base.is_empty() => String::new(),
                None => format!("{base}.nfo"),
            },
            NfoNaming::Movie => "movie.nfo".to_string(),
            NfoNaming::DiscParent => match disc {
                Some(DiscStructure::VideoTs) => "VIDEO_TS/VIDEO_TS.nfo".to_string(),
                Some(DiscStructure::Bdmv) => "BDMV/index.nfo".to_string(),
                None => String::new(),
            },
        }
    }
}

/// Filename variants for the movie poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PosterNaming {
    PosterJpg,
    PosterPng,
    FolderJpg,
    FolderPng,
    MovieJpg,
    MoviePng,
    /// `<video basename>-poster.<ext>` - the only form that is safe in a
    /// directory shared by several movies.
    FilenamePosterJpg,
    FilenamePosterPng,
    /// `<movie title>.<ext>`
    MovienameJpg,
    MovienamePng,
}

impl PosterNaming {
    pub fn all() -> &'static [PosterNaming] {
        use PosterNaming::*;
        &[
            PosterJpg,
            PosterPng,
            FolderJpg,
            FolderPng,
            MovieJpg,
            MoviePng,
            FilenamePosterJpg,
            FilenamePosterPng,
            MovienameJpg,
            MovienamePng,
        ]
    }

    /// Variants forced when the movie shares its directory with others.
    pub fn multi_movie_dir() -> &'static [PosterNaming] {
        &[PosterNaming::FilenamePosterJpg, PosterNaming::FilenamePosterPng]
    }

    /// Target extension of this variant.
    pub fn extension(self) -> &'static str {
        use PosterNaming::*;
        match self {
            PosterJpg | FolderJpg | MovieJpg | FilenamePosterJpg | MovienameJpg => "jpg",
            PosterPng | FolderPng | MoviePng | FilenamePosterPng | MovienamePng => "png",
        }
    }

    /// Render the poster filename; empty when the variant needs a video
    /// basename which is not available.
    pub fn render(self, title: &str, base: &str) -> String {
        use PosterNaming::*;
        let stem = match self {
            PosterJpg | PosterPng => "poster".to_string(),
            FolderJpg | FolderPng => "folder".to_string(),
            MovieJpg | MoviePng => "movie".to_string(),
            FilenamePosterJpg | FilenamePosterPng => {
                if base.is_empty() {
                    return String::new();
                }
                format!("{base}-poster")
            }
            MovienameJpg | MovienamePng => clean_for_filename(title),
        };
        if stem.is_empty() {
            return String::new();
        }
        format!("{stem}.{}", self.extension())
    }
}

/// Filename variants for the movie fanart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FanartNaming {
    FanartJpg,
    FanartPng,
    /// `<video basename>-fanart.<ext>`
    FilenameFanartJpg,
    FilenameFanartPng,
    /// `<movie title>-fanart.<ext>`
    MovienameFanartJpg,
    MovienameFanartPng,
}

impl FanartNaming {
    pub fn all() -> &'static [FanartNaming] {
        use FanartNaming::*;
        &[
            FanartJpg,
            FanartPng,
            FilenameFanartJpg,
            FilenameFanartPng,
            MovienameFanartJpg,
            MovienameFanartPng,
        ]
    }

    /// Variants forced when the movie shares its directory with others.
    pub fn multi_movie_dir() -> &'static [FanartNaming] {
        &[FanartNaming::FilenameFanartJpg, FanartNaming::FilenameFanartPng]
    }

    pub fn extension(self) -> &'static str {
        use FanartNaming::*;
        match self {
            FanartJpg | FilenameFanartJpg | MovienameFanartJpg => "jpg",
            FanartPng | FilenameFanartPng | MovienameFanartPng => "png",
        }
    }

    pub fn render(self, title: &str, base: &str) -> String {
        use FanartNaming::*;
        let stem = match self {
            FanartJpg | FanartPng => "fanart".to_string(),
            FilenameFanartJpg | FilenameFanartPng => {
                if base.is_empty() {
                    return String::new();
                }
                format!("{base}-fanart")
            }
            MovienameFanartJpg | MovienameFanartPng => {
                let title = clean_for_filename(title);
                if title.is_empty() {
                    return String::new();
                }
                format!("{title}-fanart")
            }
        };
        if stem.is_empty() {
            return String::new();
        }
        format!("{stem}.{}", self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_poster_variants() {
        assert_eq!(PosterNaming::PosterJpg.render("Inception", "inception"), "poster.jpg");
        assert_eq!(
            PosterNaming::FilenamePosterPng.render("Inception", "inception"),
            "inception-poster.png"
        );
        assert_eq!(PosterNaming::MovienameJpg.render("Inception", ""), "Inception.jpg");
        // filename-based variant without a basename renders nothing
        assert_eq!(PosterNaming::FilenamePosterJpg.render("Inception", ""), "");
    }

    #[test]
    fn renders_nfo_variants_for_disc_layouts() {
        assert_eq!(NfoNaming::Filename.render("movie", None), "movie.nfo");
        assert_eq!(
            NfoNaming::Filename.render("movie", Some(DiscStructure::VideoTs)),
            "VIDEO_TS.nfo"
        );
        assert_eq!(
            NfoNaming::DiscParent.render("movie", Some(DiscStructure::Bdmv)),
            "BDMV/index.nfo"
        );
        assert_eq!(NfoNaming::DiscParent.render("movie", None), "");
    }

    #[test]
    fn movie_title_is_cleaned_in_filenames() {
        assert_eq!(
            PosterNaming::MovienameJpg.render("Alien: Covenant", ""),
            "Alien - Covenant.jpg"
        );
    }
}
