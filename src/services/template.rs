//! Token template expander.
//!
//! Templates are small strings of literal text, `$x` tokens and optional
//! `{...}` groups, e.g. `"$T {($Y)}/$T"`. Expansion is a pure function of
//! (template, movie, settings) - same inputs always produce the same name.
//!
//! Supported tokens:
//!
//! | token | value                              |
//! |-------|------------------------------------|
//! | `$T`  | title                              |
//! | `$E`  | sortable title                     |
//! | `$O`  | original title                     |
//! | `$1`  | first alphanumeric of title        |
//! | `$2`  | first alphanumeric of sort title   |
//! | `$Y`  | year (unknown -> empty)            |
//! | `$I`  | IMDb id                            |
//! | `$N`  | movie set title                    |
//! | `$M`  | movie set title, sortable          |
//! | `$L`  | spoken languages                   |
//! | `$C`  | certification                      |
//! | `$G`  | first genre                        |
//! | `$D`  | director                           |
//! | `$R`  | video resolution                   |
//! | `$3`  | 3D marker                          |
//! | `$A`  | audio codec-channels               |
//! | `$V`  | video codec-format                 |
//! | `$F`  | video format                       |
//! | `$S`  | media source                       |

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config::RenamerSettings;
use crate::model::movie::sortable_title;
use crate::model::naming::clean_for_filename;
use crate::model::{MediaSource, Movie};

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$[A-Za-z0-9]").expect("valid regex"));
static OPTIONAL_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(.*?)\}").expect("valid regex"));
static FIRST_ALPHANUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z0-9]").expect("valid regex"));
static MULTI_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"/{2,}").expect("valid regex"));
static SPACE_BEFORE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+/").expect("valid regex"));
static SPACE_AFTER_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\s+").expect("valid regex"));
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("valid regex"));

/// Expand `template` against `movie`.
///
/// With `for_filename` set, any path separator surviving expansion is turned
/// into a space - a file name must not introduce directory structure,
/// whereas a folder template legitimately may ("$1/$T ($Y)").
pub fn expand(template: &str, movie: &Movie, settings: &RenamerSettings, for_filename: bool) -> String {
    // optional groups are resolved against the raw template first; a group
    // whose token expands empty disappears entirely
    let resolved = OPTIONAL_GROUP.replace_all(template, |caps: &regex::Captures<'_>| {
        expand_optional_group(&caps[1], movie, settings, for_filename)
    });
    apply(&resolved, movie, settings, for_filename)
}

/// Resolve one `{...}` group: the literal text is kept (with the token
/// substituted) only when the token's expansion is non-empty.
fn expand_optional_group(
    group: &str,
    movie: &Movie,
    settings: &RenamerSettings,
    for_filename: bool,
) -> String {
    let Some(token) = TOKEN.find(group) else {
        return String::new();
    };
    let replacement = apply(token.as_str(), movie, settings, for_filename);
    if replacement.is_empty() {
        return String::new();
    }
    group.replace(token.as_str(), &replacement)
}

/// Token substitution plus the sanitize pipeline.
fn apply(template: &str, movie: &Movie, settings: &RenamerSettings, for_filename: bool) -> String {
    let mut out = template.to_string();

    for token in TOKEN.find_iter(template) {
        let value = token_value(movie, settings, token.as_str());
        let cleaned = if value.is_empty() {
            String::new()
        } else {
            clean_for_filename(&value)
        };
        out = out.replace(token.as_str(), &cleaned);
    }

    // brackets left empty by dropped values
    out = out.replace("()", "").replace("[]", "").replace("{}", "");

    // normalize path separators
    if !for_filename {
        out = SPACE_BEFORE_SEPARATOR.replace_all(&out, "/").to_string();
        out = SPACE_AFTER_SEPARATOR.replace_all(&out, "/").to_string();
    }
    out = MULTI_SEPARATOR.replace_all(&out, "/").to_string();
    out = out.trim_start_matches('/').to_string();
    if for_filename {
        out = out.replace(['/', '\\'], " ");
    }

    out = MULTI_SPACE.replace_all(&out, " ").trim().to_string();

    if settings.space_substitution && !settings.space_replacement.is_empty() {
        out = out.replace(' ', &settings.space_replacement);
        // collapse runs of the replacement so "A - B" does not become "A---B"
        let run = Regex::new(&format!("(?:{}){{2,}}", regex::escape(&settings.space_replacement)))
            .expect("valid escaped regex");
        out = run.replace_all(&out, settings.space_replacement.as_str()).to_string();
    }

    if settings.ascii_replacement {
        out = to_ascii(&out);
    }

    // Windows rejects trailing dots and spaces
    out.trim_end_matches([' ', '.']).to_string()
}

/// Raw (uncleaned) value of a single `$x` token.
pub fn token_value(movie: &Movie, settings: &RenamerSettings, token: &str) -> String {
    let video = movie.primary_video_file();
    let info = video.map(|mf| &mf.video_info);
    match token.to_ascii_uppercase().as_str() {
        "$T" => movie.title.clone(),
        "$E" => movie.title_sortable(),
        "$O" => movie.original_title.clone(),
        "$1" => first_alphanum(&movie.title),
        "$2" => first_alphanum(&movie.title_sortable()),
        "$Y" => movie.year_string(),
        "$I" => movie.imdb_id.clone(),
        "$N" => movie_set_title(movie, settings, false),
        "$M" => movie_set_title(movie, settings, true),
        "$L" => movie.spoken_languages.clone(),
        "$C" => movie.certification.clone(),
        "$G" => movie.genres.first().cloned().unwrap_or_default(),
        "$D" => movie.director.clone(),
        "$R" => info.map(|i| i.resolution.clone()).unwrap_or_default(),
        "$3" => {
            let from_stream = info.map(|i| i.video_3d.clone()).unwrap_or_default();
            if !from_stream.is_empty() {
                from_stream
            } else if movie.video_in_3d {
                "3D".to_string()
            } else {
                String::new()
            }
        }
        "$A" => info
            .map(|i| join_nonempty(&i.audio_codec, &i.audio_channels))
            .unwrap_or_default(),
        "$V" => info
            .map(|i| join_nonempty(&i.video_codec, &i.video_format))
            .unwrap_or_default(),
        "$F" => info.map(|i| i.video_format.clone()).unwrap_or_default(),
        "$S" => {
            if movie.media_source == MediaSource::Unknown {
                String::new()
            } else {
                movie.media_source.to_string()
            }
        }
        _ => String::new(),
    }
}

fn movie_set_title(movie: &Movie, settings: &RenamerSettings, sortable: bool) -> String {
    match &movie.movie_set {
        Some(set) if set.size > 1 || settings.movieset_for_single_movie => {
            if sortable {
                sortable_title(&set.title)
            } else {
                set.title.clone()
            }
        }
        _ => String::new(),
    }
}

fn join_nonempty(a: &str, b: &str) -> String {
    if a.is_empty() {
        b.to_string()
    } else {
        format!("{a}-{b}")
    }
}

fn first_alphanum(text: &str) -> String {
    FIRST_ALPHANUM
        .find(text)
        .map(|m| m.as_str().to_ascii_uppercase())
        .unwrap_or_default()
}

/// Best-effort ASCII transliteration: decompose, drop combining marks and
/// anything else outside ASCII.
fn to_ascii(s: &str) -> String {
    s.replace('ß', "ss").nfkd().filter(char::is_ascii).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::media_file::{MediaFile, VideoStreamInfo};
    use crate::model::{MediaFileKind, MovieSetMembership};

    fn movie() -> Movie {
        let mut movie = Movie::new("Inception", Some(2010), "/ds", "/ds/Inception (2010)");
        movie.imdb_id = "tt1375666".to_string();
        movie
    }

    #[test]
    fn expands_title_and_year() {
        let settings = RenamerSettings::default();
        assert_eq!(expand("$T ($Y)", &movie(), &settings, false), "Inception (2010)");
        assert_eq!(expand("$1/$T ($Y)", &movie(), &settings, false), "I/Inception (2010)");
    }

    #[test]
    fn unknown_year_expands_empty_and_collapses_brackets() {
        let settings = RenamerSettings::default();
        let mut m = movie();
        m.year = None;
        assert_eq!(expand("$T ($Y)", &m, &settings, false), "Inception");
        m.year = Some(0);
        assert_eq!(expand("$T ($Y)", &m, &settings, false), "Inception");
    }

    #[test]
    fn optional_groups_drop_with_their_literals() {
        let settings = RenamerSettings::default();
        let mut m = movie();
        assert_eq!(expand("{Year $Y}", &m, &settings, false), "Year 2010");
        m.year = None;
        assert_eq!(expand("{Year $Y}", &m, &settings, false), "");
        assert_eq!(expand("$T{ - $Y}", &m, &settings, false), "Inception");
    }

    #[test]
    fn illegal_characters_are_replaced() {
        let settings = RenamerSettings::default();
        let mut m = movie();
        m.title = "Alien: Covenant?".to_string();
        let result = expand("$T", &m, &settings, true);
        assert_eq!(result, "Alien - Covenant");
        for illegal in ['"', '\\', ':', '<', '>', '|', '/', '?', '*'] {
            assert!(!result.contains(illegal), "found {illegal:?} in {result}");
        }
    }

    #[test]
    fn filename_mode_flattens_separators() {
        let settings = RenamerSettings::default();
        assert_eq!(expand("$1/$T", &movie(), &settings, true), "I Inception");
    }

    #[test]
    fn space_substitution_dedupes_replacement_runs() {
        let mut settings = RenamerSettings::default();
        settings.space_substitution = true;
        settings.space_replacement = "-".to_string();
        let mut m = movie();
        m.title = "Abraham Lincoln - Vampire Hunter".to_string();
        assert_eq!(
            expand("$T", &m, &settings, true),
            "Abraham-Lincoln-Vampire-Hunter"
        );
    }

    #[test]
    fn ascii_replacement_transliterates() {
        let mut settings = RenamerSettings::default();
        settings.ascii_replacement = true;
        let mut m = movie();
        m.title = "Das weiße Band – Am Zähler".to_string();
        let result = expand("$T", &m, &settings, true);
        assert!(result.is_ascii(), "not ascii: {result}");
        assert!(result.contains("weisse"));
        assert!(result.contains("Zahler"));
    }

    #[test]
    fn set_tokens_only_expand_for_real_sets() {
        let settings = RenamerSettings::default();
        let mut m = movie();
        m.movie_set = Some(MovieSetMembership {
            title: "The Dream Collection".to_string(),
            size: 1,
        });
        assert_eq!(expand("$N", &m, &settings, false), "");

        m.movie_set.as_mut().expect("set").size = 2;
        assert_eq!(expand("$N", &m, &settings, false), "The Dream Collection");
        assert_eq!(expand("$M", &m, &settings, false), "Dream Collection, The");

        let mut settings = settings;
        settings.movieset_for_single_movie = true;
        m.movie_set.as_mut().expect("set").size = 1;
        assert_eq!(expand("$N", &m, &settings, false), "The Dream Collection");
    }

    #[test]
    fn stream_tokens_come_from_the_primary_video() {
        let settings = RenamerSettings::default();
        let mut m = movie();
        let mut video = MediaFile::new("/ds/Inception (2010)/inception.mkv", MediaFileKind::Video);
        video.video_info = VideoStreamInfo {
            resolution: "1080p".to_string(),
            video_codec: "h264".to_string(),
            video_format: "1080p".to_string(),
            video_3d: String::new(),
            audio_codec: "DTS".to_string(),
            audio_channels: "6ch".to_string(),
        };
        m.media_files.push(video);
        assert_eq!(expand("$T $R $A", &m, &settings, true), "Inception 1080p DTS-6ch");
        assert_eq!(expand("$V", &m, &settings, true), "h264-1080p");
        // no 3D info anywhere -> token collapses
        assert_eq!(expand("$T{ $3}", &m, &settings, true), "Inception");
    }

    #[test]
    fn trailing_dots_and_spaces_are_stripped() {
        let settings = RenamerSettings::default();
        let mut m = movie();
        m.title = "Akira Jr.".to_string();
        assert_eq!(expand("$T", &m, &settings, true), "Akira Jr");
    }

    #[test]
    fn expansion_is_deterministic() {
        let settings = RenamerSettings::default();
        let m = movie();
        let a = expand("$T ($Y) [$I]", &m, &settings, false);
        let b = expand("$T ($Y) [$I]", &m, &settings, false);
        assert_eq!(a, b);
        assert_eq!(a, "Inception (2010) [tt1375666]");
    }
}
