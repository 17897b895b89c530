//! Transcript file naming.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};

/// Default directory transcripts are written to, relative to the client.
pub const DEFAULT_TRANSCRIPT_DIR: &str = "tt/temp";

/// Timestamp layout embedded in transcript names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Build `{dir}/{prefix}_{YYYYMMDD-HHMMSS}.txt` for the given instant.
pub fn transcript_path_at<Tz>(dir: &Path, prefix: &str, at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    dir.join(format!("{}_{}.txt", prefix, at.format(TIMESTAMP_FORMAT)))
}

/// Build a transcript path stamped with the local time now.
pub fn transcript_path(dir: &Path, prefix: &str) -> PathBuf {
    transcript_path_at(dir, prefix, &Local::now())
}

/// Check whether `name` looks like a transcript produced for `prefix`.
pub fn is_transcript_name(name: &str, prefix: &str) -> bool {
    let Some(stamp) = name
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(".txt"))
    else {
        return false;
    };

    let bytes = stamp.as_bytes();
    bytes.len() == 15
        && bytes[8] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 8 || b.is_ascii_digit())
}
