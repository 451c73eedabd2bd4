//! Pure helpers for demo submissions: name sanitising, demo ids, email and
//! upload-path checks, and the compact submission timestamp.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Longest accepted artist name or track title, in characters.
pub const MAX_NAME_LENGTH: usize = 100;

/// Characters that are never allowed in a stored demo filename.
pub const FORBIDDEN_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Make a user-supplied name safe for use inside a storage filename.
///
/// Whitespace runs collapse to `_`, forbidden characters are removed and any
/// `..` sequence is stripped until none remain. Leading and trailing
/// whitespace is kept as `_`.
pub fn sanitize_name(input: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(input, "_");
    let mut cleaned: String = collapsed
        .chars()
        .filter(|c| !FORBIDDEN_FILENAME_CHARS.contains(c) && !c.is_control())
        .collect();
    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", "");
    }
    cleaned
}

/// Deterministic demo id for an artist/title pair: `<artist> - <title>`.
pub fn demo_id(artist_name: &str, track_title: &str) -> String {
    format!(
        "{} - {}",
        sanitize_name(artist_name),
        sanitize_name(track_title)
    )
}

/// Storage path of the audio file for a demo id.
pub fn demo_file_path(upload_dir: &str, demo_id: &str) -> String {
    format!("{}/{}.mp3", upload_dir.trim_end_matches('/'), demo_id)
}

/// Storage path of the metadata sidecar for an audio file path.
pub fn metadata_path(file_path: &str) -> String {
    format!("{}.metadata.json", file_path)
}

/// Conservative shape check: one `@`, and a `.` somewhere after it.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Whether a client-reported upload path points at a demo inside `upload_dir`.
pub fn is_valid_demo_path(upload_dir: &str, file_path: &str) -> bool {
    let prefix = format!("{}/", upload_dir.trim_end_matches('/'));
    file_path.starts_with(&prefix)
        && file_path.ends_with(".mp3")
        && file_path.len() > prefix.len() + ".mp3".len()
        && !file_path.contains("..")
        && !file_path[prefix.len()..].contains('/')
}

/// Whether a relayed file name carries the accepted audio extension.
pub fn has_mp3_extension(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".mp3")
}

/// Compact sortable timestamp `YYYYMMDD_HHMMSS`.
pub fn submission_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Returns the value when it is present and not blank.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Names of the required fields that are absent or blank, in the given order.
pub fn missing_fields<'a>(fields: &[(&'a str, &Option<String>)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, value)| non_blank(value).is_none())
        .map(|(name, _)| *name)
        .collect()
}
