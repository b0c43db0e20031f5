//! History entry types.
//!
//! This module defines the records kept in the scanned and generated history
//! logs and the raw input they are built from.

use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::sanitize::sanitize_opt;

/// What kind of payload a QR code carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Free text.
    #[default]
    Text,
    /// An http(s) link.
    Url,
    /// A `tel:` number.
    Phone,
    /// A `mailto:` address.
    Email,
    /// A `WIFI:` network descriptor.
    Wifi,
}

impl EntryType {
    /// All entry types, in display order.
    pub const ALL: [Self; 5] = [Self::Text, Self::Url, Self::Phone, Self::Email, Self::Wifi];

    /// Lowercase name used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Url => "url",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Wifi => "wifi",
        }
    }

    /// Whether the payload can be opened by another application.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Url | Self::Email | Self::Phone)
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown entry type: {s}"))
    }
}

/// Which of the two history logs an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    /// Codes read through the scanner.
    Scanned,
    /// Codes produced by the generator.
    Generated,
}

impl LogKind {
    /// Prefix of entry ids in this log.
    #[must_use]
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Scanned => "scan",
            Self::Generated => "gen",
        }
    }

    /// Key the log is persisted under.
    #[must_use]
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::Scanned => "quickqr-scanned",
            Self::Generated => "quickqr-generated",
        }
    }
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scanned => write!(f, "scanned"),
            Self::Generated => write!(f, "generated"),
        }
    }
}

/// Raw input for a new history entry.
///
/// Nothing here is trusted. [`NewEntry::into_entry`] is the only way to turn
/// it into a [`HistoryEntry`], and it sanitizes `content` and `title`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEntry {
    /// Decoded or encoded payload.
    pub content: Option<String>,
    /// Short label.
    pub title: Option<String>,
    /// Payload kind; `Text` when absent.
    pub entry_type: Option<EntryType>,
    /// Rendered image, generated entries only. Stored verbatim.
    pub qr_code: Option<String>,
}

impl NewEntry {
    /// Create input with content and title.
    #[must_use]
    pub fn new(content: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Set the entry type.
    #[must_use]
    pub fn with_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    /// Attach a rendered QR image.
    #[must_use]
    pub fn with_qr_code(mut self, qr_code: impl Into<String>) -> Self {
        self.qr_code = Some(qr_code.into());
        self
    }

    /// Build a sanitized entry for `kind` created at `created_at`.
    ///
    /// `created_at` is truncated to milliseconds; the id embeds the same
    /// millisecond epoch.
    #[must_use]
    pub fn into_entry(self, kind: LogKind, created_at: DateTime<Utc>) -> HistoryEntry {
        let timestamp = created_at.trunc_subsecs(3);
        HistoryEntry {
            id: format!("{}_{}", kind.id_prefix(), timestamp.timestamp_millis()),
            timestamp,
            content: sanitize_opt(self.content.as_deref()),
            title: sanitize_opt(self.title.as_deref()),
            entry_type: self.entry_type.unwrap_or_default(),
            qr_code: self.qr_code,
        }
    }
}

/// One scanned or generated QR record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// `<prefix>_<creation millis>`.
    pub id: String,

    /// Creation time, never changed after insertion.
    pub timestamp: DateTime<Utc>,

    /// Sanitized payload.
    pub content: String,

    /// Sanitized label.
    #[serde(default)]
    pub title: String,

    /// Payload kind.
    #[serde(rename = "type", default)]
    pub entry_type: EntryType,

    /// Rendered image as a data URL.
    #[serde(rename = "qrCode", default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
}

impl HistoryEntry {
    /// Creation time formatted for listings, e.g. `Mar 4, 2024 09:15`.
    #[must_use]
    pub fn display_time(&self) -> String {
        self.timestamp.format("%b %-d, %Y %H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 15, 30).unwrap()
    }

    #[test]
    fn test_entry_type_default_is_text() {
        assert_eq!(EntryType::default(), EntryType::Text);
    }

    #[test]
    fn test_entry_type_round_trips_through_str() {
        for t in EntryType::ALL {
            assert_eq!(t.to_string().parse::<EntryType>().unwrap(), t);
        }
        assert_eq!("WIFI".parse::<EntryType>().unwrap(), EntryType::Wifi);
        assert!("sms".parse::<EntryType>().is_err());
    }

    #[test]
    fn test_entry_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&EntryType::Url).unwrap(), "\"url\"");
    }

    #[test]
    fn test_actionable_types() {
        assert!(EntryType::Url.is_actionable());
        assert!(EntryType::Phone.is_actionable());
        assert!(!EntryType::Text.is_actionable());
        assert!(!EntryType::Wifi.is_actionable());
    }

    #[test]
    fn test_log_kind_keys() {
        assert_eq!(LogKind::Scanned.storage_key(), "quickqr-scanned");
        assert_eq!(LogKind::Generated.storage_key(), "quickqr-generated");
        assert_eq!(LogKind::Scanned.id_prefix(), "scan");
        assert_eq!(LogKind::Generated.id_prefix(), "gen");
    }

    #[test]
    fn test_into_entry_builds_id_from_millis() {
        let now = fixed_time() + chrono::Duration::microseconds(123_456);
        let entry = NewEntry::new("hello", "hello").into_entry(LogKind::Scanned, now);

        assert_eq!(entry.id, format!("scan_{}", fixed_time().timestamp_millis() + 123));
        assert_eq!(entry.timestamp.timestamp_subsec_micros(), 123_000);
    }

    #[test]
    fn test_into_entry_sanitizes_content_and_title() {
        let entry = NewEntry::new("<b>hi</b><script>x()</script>", "<i onclick=x>t</i>")
            .into_entry(LogKind::Scanned, fixed_time());

        assert_eq!(entry.content, "hi");
        assert_eq!(entry.title, "t");
    }

    #[test]
    fn test_into_entry_defaults() {
        let entry = NewEntry::default().into_entry(LogKind::Generated, fixed_time());

        assert_eq!(entry.content, "");
        assert_eq!(entry.title, "");
        assert_eq!(entry.entry_type, EntryType::Text);
        assert!(entry.qr_code.is_none());
        assert!(entry.id.starts_with("gen_"));
    }

    #[test]
    fn test_qr_code_is_kept_verbatim() {
        let image = "data:image/svg+xml;base64,PHN2Zz4=";
        let entry = NewEntry::new("x", "x")
            .with_qr_code(image)
            .into_entry(LogKind::Generated, fixed_time());
        assert_eq!(entry.qr_code.as_deref(), Some(image));
    }

    #[test]
    fn test_wire_format_field_names() {
        let entry = NewEntry::new("https://a.example", "a.example")
            .with_type(EntryType::Url)
            .with_qr_code("data:x")
            .into_entry(LogKind::Generated, fixed_time());
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["type"], "url");
        assert_eq!(value["qrCode"], "data:x");
        assert_eq!(value["timestamp"], "2024-03-04T09:15:30Z");
        assert!(value.get("entry_type").is_none());
    }

    #[test]
    fn test_scanned_entry_omits_qr_code() {
        let entry = NewEntry::new("x", "x").into_entry(LogKind::Scanned, fixed_time());
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("qrCode"));
    }

    #[test]
    fn test_deserialize_browser_record() {
        let json = r#"{"id":"scan_1709543730000","timestamp":"2024-03-04T09:15:30.000Z",
            "content":"hello","title":"hello","type":"text"}"#;
        let entry: HistoryEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.timestamp, fixed_time());
        assert_eq!(entry.entry_type, EntryType::Text);
    }

    #[test]
    fn test_display_time() {
        let entry = NewEntry::new("x", "x").into_entry(LogKind::Scanned, fixed_time());
        assert_eq!(entry.display_time(), "Mar 4, 2024 09:15");
    }
}
