//! Subtitle language detection and rendering.
//!
//! Subtitle files commonly carry their language as a trailing token of the
//! basename (`movie.en.srt`, `movie.german.srt`, `movie.eng.forced.srt`).
//! Detection matches that token against a table of two-letter codes,
//! three-letter codes and English names; rendering picks the configured
//! [`LanguageStyle`].

use crate::config::LanguageStyle;

/// One known language: ISO 639-1 code, ISO 639-2 code, English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageEntry {
    pub iso2: &'static str,
    pub iso3: &'static str,
    pub name: &'static str,
}

pub const LANGUAGES: &[LanguageEntry] = &[
    LanguageEntry { iso2: "ar", iso3: "ara", name: "Arabic" },
    LanguageEntry { iso2: "bg", iso3: "bul", name: "Bulgarian" },
    LanguageEntry { iso2: "bs", iso3: "bos", name: "Bosnian" },
    LanguageEntry { iso2: "ca", iso3: "cat", name: "Catalan" },
    LanguageEntry { iso2: "cs", iso3: "ces", name: "Czech" },
    LanguageEntry { iso2: "da", iso3: "dan", name: "Danish" },
    LanguageEntry { iso2: "de", iso3: "deu", name: "German" },
    LanguageEntry { iso2: "el", iso3: "ell", name: "Greek" },
    LanguageEntry { iso2: "en", iso3: "eng", name: "English" },
    LanguageEntry { iso2: "es", iso3: "spa", name: "Spanish" },
    LanguageEntry { iso2: "et", iso3: "est", name: "Estonian" },
    LanguageEntry { iso2: "fa", iso3: "fas", name: "Persian" },
    LanguageEntry { iso2: "fi", iso3: "fin", name: "Finnish" },
    LanguageEntry { iso2: "fr", iso3: "fra", name: "French" },
    LanguageEntry { iso2: "he", iso3: "heb", name: "Hebrew" },
    LanguageEntry { iso2: "hi", iso3: "hin", name: "Hindi" },
    LanguageEntry { iso2: "hr", iso3: "hrv", name: "Croatian" },
    LanguageEntry { iso2: "hu", iso3: "hun", name: "Hungarian" },
    LanguageEntry { iso2: "id", iso3: "ind", name: "Indonesian" },
    LanguageEntry { iso2: "is", iso3: "isl", name: "Icelandic" },
    LanguageEntry { iso2: "it", iso3: "ita", name: "Italian" },
    LanguageEntry { iso2: "ja", iso3: "jpn", name: "Japanese" },
    LanguageEntry { iso2: "ko", iso3: "kor", name: "Korean" },
    LanguageEntry { iso2: "lt", iso3: "lit", name: "Lithuanian" },
    LanguageEntry { iso2: "lv", iso3: "lav", name: "Latvian" },
    LanguageEntry { iso2: "mk", iso3: "mkd", name: "Macedonian" },
    LanguageEntry { iso2: "ms", iso3: "msa", name: "Malay" },
    LanguageEntry { iso2: "nl", iso3: "nld", name: "Dutch" },
    LanguageEntry { iso2: "no", iso3: "nor", name: "Norwegian" },
    LanguageEntry { iso2: "pl", iso3: "pol", name: "Polish" },
    LanguageEntry { iso2: "pt", iso3: "por", name: "Portuguese" },
    LanguageEntry { iso2: "ro", iso3: "ron", name: "Romanian" },
    LanguageEntry { iso2: "ru", iso3: "rus", name: "Russian" },
    LanguageEntry { iso2: "sk", iso3: "slk", name: "Slovak" },
    LanguageEntry { iso2: "sl", iso3: "slv", name: "Slovenian" },
    LanguageEntry { iso2: "sq", iso3: "sqi", name: "Albanian" },
    LanguageEntry { iso2: "sr", iso3: "srp", name: "Serbian" },
    LanguageEntry { iso2: "sv", iso3: "swe", name: "Swedish" },
    LanguageEntry { iso2: "th", iso3: "tha", name: "Thai" },
    LanguageEntry { iso2: "tr", iso3: "tur", name: "Turkish" },
    LanguageEntry { iso2: "uk", iso3: "ukr", name: "Ukrainian" },
    LanguageEntry { iso2: "vi", iso3: "vie", name: "Vietnamese" },
    LanguageEntry { iso2: "zh", iso3: "zho", name: "Chinese" },
];

/// Look up a language by two-letter code, three-letter code or English name
/// (case-insensitive).
pub fn find(token: &str) -> Option<&'static LanguageEntry> {
    LANGUAGES.iter().find(|l| {
        token.eq_ignore_ascii_case(l.iso2)
            || token.eq_ignore_ascii_case(l.iso3)
            || token.eq_ignore_ascii_case(l.name)
    })
}

/// Render a detected language token in the configured style. Unknown tokens
/// pass through unchanged so nothing is silently lost.
pub fn render(token: &str, style: LanguageStyle) -> String {
    match find(token) {
        Some(entry) => match style {
            LanguageStyle::Iso2 => entry.iso2.to_string(),
            LanguageStyle::Iso3 => entry.iso3.to_string(),
            LanguageStyle::EnglishName => entry.name.to_string(),
        },
        None => token.to_string(),
    }
}

/// Detect (language, forced) from a subtitle basename.
///
/// `video_basename` is removed from the subtitle name first to ease parsing
/// ("inception.en" vs "inception"), then a literal "forced" marker is
/// stripped, and the remaining trailing token is matched against the known
/// language set.
pub fn detect_from_basename(sub_basename: &str, video_basename: &str) -> (Option<&'static LanguageEntry>, bool) {
    let mut shortname = sub_basename.to_lowercase();
    if !video_basename.is_empty() {
        shortname = shortname.replace(&video_basename.to_lowercase(), "");
    }

    let forced = shortname.contains("forced");
    if forced {
        shortname = shortname.replace("forced", "");
        shortname = shortname
            .trim_matches(['.', '-', '_', ' '])
            .to_string();
    }

    for lang in LANGUAGES {
        let name_lower = lang.name.to_lowercase();
        for key in [lang.iso2, lang.iso3, name_lower.as_str()] {
            if shortname == key {
                return (Some(lang), forced);
            }
            for sep in ['.', '-', '_', ' '] {
                if shortname.ends_with(&format!("{sep}{key}")) {
                    return (Some(lang), forced);
                }
            }
        }
    }
    (None, forced)
}
