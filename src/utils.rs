//! Utility functions for text measurement, log truncation and file system checks.
//!
//! This module provides helper functions used throughout the crate:
//! - Character-based length and keyword counting for CJK text
//! - String truncation for logging
//! - Score rounding
//! - File system validation for output directories

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Length of `s` in characters, not bytes.
///
/// Every length threshold in the filter is expressed in characters so that
/// a 20-character Chinese title is not mistaken for a 60-byte one.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Number of keywords in `keywords` that occur anywhere in `text`.
pub fn count_hits<S: AsRef<str>>(text: &str, keywords: &[S]) -> usize {
    keywords
        .iter()
        .filter(|kw| text.contains(kw.as_ref()))
        .count()
}

/// Whether any keyword in `keywords` occurs in `text`.
pub fn contains_any<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    keywords.iter().any(|kw| text.contains(kw.as_ref()))
}

/// Round to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters with an ellipsis and a
/// count of the dropped characters appended. Cutting on characters keeps
/// multi-byte titles from splitting mid code point.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("央行下调存款利率", 2), "央行…(+6 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = char_len(s);
    if total <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…(+{} chars)", head, total - max)
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
