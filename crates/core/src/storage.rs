//! Deterministic on-disk layout for uploaded media.
//!
//! Authenticated uploads land in `root/{bucket}/{YYYY}/{MM}`; everything
//! else goes to `root/test/{YYYY}/{MM}/week-{n}`. Filenames are
//! `{DDMMYYYY}_{5 hex chars}{ext}`. Collisions are possible in principle and
//! accepted as negligible.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use rand::Rng;

use crate::media::bucket_for_mime;
use crate::types::Timestamp;

/// Who is uploading, as far as the directory layout is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageScope {
    Authenticated,
    Anonymous,
}

/// 1-based week of the month, weeks starting on Monday.
///
/// The first (partial) week of a month is week 1, so the 1st is always in
/// week 1 and a month can span up to 6 weeks.
pub fn week_of_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    let offset = first.weekday().num_days_from_monday();
    (date.day() + offset).div_ceil(7)
}

/// Directory (relative to `root`) a new upload is written into.
pub fn destination_dir(root: &Path, scope: StorageScope, mime: &str, now: Timestamp) -> PathBuf {
    let year = format!("{:04}", now.year());
    let month = format!("{:02}", now.month());

    match scope {
        StorageScope::Authenticated => root.join(bucket_for_mime(mime)).join(year).join(month),
        StorageScope::Anonymous => {
            let week = format!("week-{}", week_of_month(now.date_naive()));
            root.join("test").join(year).join(month).join(week)
        }
    }
}

/// Longest extension carried over from a client filename.
const MAX_EXTENSION_LEN: usize = 10;

/// Extension of the client-supplied filename including the leading dot,
/// or an empty string. Only ASCII alphanumeric extensions are kept.
pub fn extension_of(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| {
            !e.is_empty()
                && e.len() <= MAX_EXTENSION_LEN
                && e.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}

/// Build a stored filename: `{DDMMYYYY}_{5 hex}{ext}`.
pub fn generate_filename<R: Rng + ?Sized>(now: Timestamp, original_name: &str, rng: &mut R) -> String {
    let mut bytes = [0u8; 3];
    rng.fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();

    format!(
        "{:02}{:02}{:04}_{}{}",
        now.day(),
        now.month(),
        now.year(),
        &hex[..5],
        extension_of(original_name)
    )
}
