//! Utility functions for string handling, HTTP clients and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for logging and for bounding prompt inputs
//! - HTML flattening for feed descriptions
//! - Random deduplication tags appended to posts
//! - HTTP client construction with a timeout and user agent
//! - File system validation for the report directory

use crate::compose::take_chars;
use rand::{Rng, rng};
use scraper::Html;
use std::error::Error;
use std::fs as stdfs;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

/// Characters used for deduplication tags.
const TAG_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = take_chars(s, max);
    if kept.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", kept, s.len() - kept.len())
    }
}

/// Bound free text before it is placed into a generation request.
///
/// Whitespace runs are collapsed and the result holds at most `max` characters.
pub fn bound_text(s: &str, max: usize) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    take_chars(&collapsed, max).to_string()
}

/// Flatten an HTML fragment to plain text.
///
/// Feed descriptions are sometimes HTML. Tags are dropped, entities decoded
/// and whitespace collapsed. Plain text passes through unchanged.
pub fn strip_html(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let text = parsed.root_element().text().collect::<Vec<_>>().join(" ");
    bound_text(&text, usize::MAX)
}

/// Random uppercase alphanumeric tag of `len` characters.
pub fn random_tag(len: usize) -> String {
    let mut rng = rng();
    (0..len)
        .map(|_| TAG_ALPHABET[rng.random_range(0..TAG_ALPHABET.len())] as char)
        .collect()
}

/// Build an HTTP client with the request timeout and user agent every adapter uses.
pub fn http_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
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
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Report directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
