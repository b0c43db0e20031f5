//! Scan boundary: turning a decoded QR payload into history input.
//!
//! The decoder hands over one plain string per successful scan. It is
//! sanitized, classified by scheme prefix, given a title, and checked; URL
//! payloads with an unsafe or unparseable target are rejected here so they
//! never reach the history.

use url::Url;

use crate::entry::{EntryType, NewEntry};
use crate::error::{Error, Result};
use crate::sanitize::sanitize;
use crate::validate::is_valid_url;

/// Longest free-text title before it is cut and suffixed with `...`.
pub const TITLE_MAX_CHARS: usize = 30;

/// Classify a payload by its scheme prefix.
#[must_use]
pub fn classify(content: &str) -> EntryType {
    if content.starts_with("http://") || content.starts_with("https://") {
        EntryType::Url
    } else if content.starts_with("mailto:") {
        EntryType::Email
    } else if content.starts_with("tel:") {
        EntryType::Phone
    } else if content.starts_with("WIFI:") {
        EntryType::Wifi
    } else {
        EntryType::Text
    }
}

/// Derive a short label for a payload.
#[must_use]
pub fn derive_title(content: &str) -> String {
    match classify(content) {
        EntryType::Url => Url::parse(content)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| "Website URL".to_string()),
        EntryType::Email => content.replacen("mailto:", "", 1),
        EntryType::Phone => content.replacen("tel:", "", 1),
        EntryType::Wifi => "WiFi Network".to_string(),
        EntryType::Text => truncate_title(content),
    }
}

/// Cut `text` to [`TITLE_MAX_CHARS`] characters, appending `...` if anything
/// was dropped.
#[must_use]
pub fn truncate_title(text: &str) -> String {
    match text.char_indices().nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// A decoded payload that passed the scan checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Sanitized payload.
    pub content: String,
    /// Label derived from the sanitized payload.
    pub title: String,
    /// Payload kind.
    pub entry_type: EntryType,
}

impl ScanResult {
    /// Convert into history input.
    #[must_use]
    pub fn into_new_entry(self) -> NewEntry {
        NewEntry::new(self.content, self.title).with_type(self.entry_type)
    }
}

/// Sanitize, classify and check a decoded payload.
///
/// # Errors
///
/// Returns [`Error::InvalidScan`] if the payload is empty after sanitizing or
/// is URL-typed but not a valid http(s) URL.
pub fn prepare_scan(decoded: &str) -> Result<ScanResult> {
    let content = sanitize(decoded);
    if content.trim().is_empty() {
        return Err(Error::invalid_scan("The scanned QR code is empty"));
    }

    let entry_type = classify(&content);
    if entry_type == EntryType::Url && !is_valid_url(&content) {
        return Err(Error::invalid_scan(
            "The scanned QR code contains an invalid URL",
        ));
    }

    let title = derive_title(&content);
    Ok(ScanResult {
        content,
        title,
        entry_type,
    })
}
