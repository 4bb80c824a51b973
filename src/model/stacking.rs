//! Multi-disc "stacking" marker detection.
//!
//! Recognizes the usual conventions for splitting one movie over several
//! files: `movie-cd1.avi`, `movie.dvd2.avi`, `movie-part3.mkv`,
//! `movie-a.avi`, `movie-1of2.avi`. A stacking number of 0 means the file
//! is not part of a stacked set.

use once_cell::sync::Lazy;
use regex::Regex;

// <cd/dvd/part/pt/disk/disc> <1-9>
static STACK_NUMBERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.*?)[ _.-]+((?:cd|dvd|p(?:ar)?t|dis[ck])[ _.-]*[1-9])(\.[^.]+)?$")
        .expect("valid regex")
});

// <cd/dvd/part/pt/disk/disc> <a-d>
static STACK_LETTERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.*?)[ _.-]+((?:cd|dvd|p(?:ar)?t|dis[ck])[ _.-]*[a-d])(\.[^.]+)?$")
        .expect("valid regex")
});

// bare trailing letter: movie-a.avi (mandatory delimiter, a-d only)
static STACK_BARE_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.*?)[_.-]+([a-d])(\.[^.]+)?$").expect("valid regex"));

// movie-1of2.avi, movie (1 of 2).avi
static STACK_X_OF_Y: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.*?)[ (_.-]+([1-9][ .]?of[ .]?[1-9])[ )_-]?(\.[^.]+)?$")
        .expect("valid regex")
});

fn patterns() -> [&'static Regex; 4] {
    [
        &STACK_NUMBERED,
        &STACK_LETTERED,
        &STACK_BARE_LETTER,
        &STACK_X_OF_Y,
    ]
}

/// Extract the stacking marker from a filename, e.g. `"CD1"`, `"part2"`,
/// `"1of2"`. Returns an empty string when the name carries none.
pub fn marker(filename: &str) -> String {
    for pattern in patterns() {
        if let Some(caps) = pattern.captures(filename) {
            return caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
        }
    }
    String::new()
}

/// Map the stacking marker to its disc/part number.
///
/// Letters a-d count as 1-4; `1of2` style markers yield the first number.
/// Returns 0 for unstacked names.
pub fn number(filename: &str) -> u32 {
    let marker = marker(filename);
    if marker.is_empty() {
        return 0;
    }
    match marker.to_ascii_lowercase().as_str() {
        "a" => return 1,
        "b" => return 2,
        "c" => return 3,
        "d" => return 4,
        _ => {}
    }
    let digits = marker
        .to_ascii_lowercase()
        .split("of")
        .next()
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>();
    digits.parse().unwrap_or(0)
}

/// Remove the stacking marker from a filename, keeping the extension.
///
/// Works on names both with and without an extension, so it can also be
/// applied to an already-extracted basename.
pub fn strip_markers(filename: &str) -> String {
    for pattern in patterns() {
        if let Some(caps) = pattern.captures(filename) {
            let title = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let ext = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
            return format!("{title}{ext}");
        }
    }
    filename.to_string()
}
