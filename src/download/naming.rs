//! Destination file naming
//!
//! Files are written as `NNN_title.mp3`. Numbering continues from the highest
//! prefix already in the directory, so a second run never overwrites the
//! first.

use crate::HarvestError;
use std::io;
use std::path::Path;

/// Characters replaced with `_` in titles
const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Minimum width of a numeric prefix counted by the continuation scan
const MIN_PREFIX_DIGITS: usize = 3;

/// Title used when sanitization leaves nothing
const EMPTY_TITLE: &str = "untitled";

/// Parses the numeric prefix of a `NNN_...` filename
///
/// Returns None unless the name starts with at least three digits followed by
/// an underscore.
pub fn numbered_prefix(file_name: &str) -> Option<u32> {
    let digits = file_name
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits < MIN_PREFIX_DIGITS || file_name.as_bytes().get(digits) != Some(&b'_') {
        return None;
    }
    file_name[..digits].parse().ok()
}

/// Returns the next free file number in `dir`
///
/// One more than the highest numbered prefix present, or 1 when the directory
/// is missing or holds no numbered files.
///
/// A prefix already at `u32::MAX` leaves no number to continue with and is
/// reported as a validation error.
pub async fn next_file_number(dir: &Path) -> Result<u32, HarvestError> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(1),
        Err(e) => return Err(e.into()),
    };

    let mut highest = 0;
    while let Some(entry) = read_dir.next_entry().await? {
        if let Some(n) = entry.file_name().to_str().and_then(numbered_prefix) {
            highest = highest.max(n);
        }
    }
    highest.checked_add(1).ok_or_else(|| {
        HarvestError::validation(format!(
            "{} already holds file number {}, no higher number is available",
            dir.display(),
            highest
        ))
    })
}

/// Replaces filesystem-unsafe characters with `_`
///
/// # Examples
///
/// ```
/// use audio_harvest::download::sanitize_title;
///
/// assert_eq!(sanitize_title("AC/DC: Live?"), "AC_DC_ Live_");
/// ```
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if UNSAFE_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        EMPTY_TITLE.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Builds the on-disk name for file number `n`
///
/// ```
/// use audio_harvest::download::file_name;
///
/// assert_eq!(file_name(7, "Rain"), "007_Rain.mp3");
/// assert_eq!(file_name(1234, "Rain"), "1234_Rain.mp3");
/// ```
pub fn file_name(n: u32, title: &str) -> String {
    format!("{:03}_{}.mp3", n, sanitize_title(title))
}
