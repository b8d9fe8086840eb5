//! Naming of persisted signatures.
//!
//! A record is a PNG called `<label>_<YYYYMMDD_HHMMSS>.png`. Everything the
//! gallery shows (label and capture date) is recovered from that name.

use chrono::NaiveDateTime;
use std::time::SystemTime;

pub const EXTENSION: &str = "png";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const DISPLAY_FORMAT: &str = "%b %d, %Y at %I:%M %p";
pub const UNKNOWN_DATE: &str = "Unknown date";

// "YYYYMMDD_HHMMSS"
const TIMESTAMP_LEN: usize = 15;

/// A saved signature as seen by the gallery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureRecord {
    /// File name, unique within the store.
    pub id: String,
    pub label: String,
    pub captured_at: Option<NaiveDateTime>,
    pub modified: SystemTime,
}

impl SignatureRecord {
    pub fn from_file_name(id: impl Into<String>, modified: SystemTime) -> Self {
        let id = id.into();
        Self {
            label: label_from_file_name(&id).to_owned(),
            captured_at: timestamp_from_file_name(&id),
            id,
            modified,
        }
    }

    pub fn display_date(&self) -> String {
        self.captured_at
            .map(|at| at.format(DISPLAY_FORMAT).to_string())
            .unwrap_or_else(|| UNKNOWN_DATE.to_owned())
    }
}

pub fn record_file_name(label: &str, captured_at: NaiveDateTime) -> String {
    format!(
        "{label}_{}.{EXTENSION}",
        captured_at.format(TIMESTAMP_FORMAT)
    )
}

pub fn has_record_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(EXTENSION))
}

/// File name without its `.png` extension.
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case(EXTENSION) => stem,
        _ => name,
    }
}

pub fn timestamp_from_file_name(name: &str) -> Option<NaiveDateTime> {
    let stem = file_stem(name);
    let start = stem.len().checked_sub(TIMESTAMP_LEN)?;
    let suffix = stem.get(start..)?;
    NaiveDateTime::parse_from_str(suffix, TIMESTAMP_FORMAT).ok()
}

/// Label the record was saved under.
///
/// Strips the `_YYYYMMDD_HHMMSS` suffix when it is present and parses. Names
/// written by something else fall back to everything before the last
/// underscore (or the whole stem when there is none).
pub fn label_from_file_name(name: &str) -> &str {
    let stem = file_stem(name);
    if timestamp_from_file_name(name).is_some() {
        let cut = stem.len() - TIMESTAMP_LEN;
        if let Some(label) = cut
            .checked_sub(1)
            .filter(|&at| stem.get(at..cut) == Some("_"))
            .and_then(|at| stem.get(..at))
        {
            return label;
        }
    }
    stem.rsplit_once('_').map_or(stem, |(label, _)| label)
}
