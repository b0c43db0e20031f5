//! Generator input: per-type form payloads and the QR content built from them.

use crate::classify::truncate_title;
use crate::entry::{EntryType, NewEntry};
use crate::error::{Error, Result};
use crate::sanitize::sanitize;
use crate::validate::{is_valid_email, is_valid_phone, is_valid_url};

/// Wi-Fi authentication type written into `WIFI:` payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WifiEncryption {
    /// WPA/WPA2.
    #[default]
    Wpa,
    /// Legacy WEP.
    Wep,
    /// Open network.
    NoPass,
}

impl WifiEncryption {
    /// Value of the `T:` field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wpa => "WPA",
            Self::Wep => "WEP",
            Self::NoPass => "nopass",
        }
    }
}

impl std::fmt::Display for WifiEncryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user asked to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrPayload {
    /// Free text.
    Text {
        /// The text.
        text: String,
    },
    /// A website. A missing scheme means `https://`.
    Url {
        /// The address as typed.
        url: String,
    },
    /// A phone number.
    Phone {
        /// The number as typed.
        phone: String,
    },
    /// An email draft.
    Email {
        /// Recipient address.
        email: String,
        /// Optional subject line.
        subject: Option<String>,
        /// Optional body.
        body: Option<String>,
    },
    /// Wi-Fi credentials.
    Wifi {
        /// Network name.
        ssid: String,
        /// Network password.
        password: String,
        /// Authentication type.
        encryption: WifiEncryption,
    },
}

impl QrPayload {
    /// Entry type recorded in the history.
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        match self {
            Self::Text { .. } => EntryType::Text,
            Self::Url { .. } => EntryType::Url,
            Self::Phone { .. } => EntryType::Phone,
            Self::Email { .. } => EntryType::Email,
            Self::Wifi { .. } => EntryType::Wifi,
        }
    }

    /// Check the form fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] carrying the inline message to show.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Text { text } => {
                if text.trim().is_empty() {
                    return Err(Error::validation("text", "Please enter some text"));
                }
            }
            Self::Url { url } => {
                if url.trim().is_empty() {
                    return Err(Error::validation("url", "Please enter a URL"));
                }
                if !is_valid_url(&with_default_scheme(url)) {
                    return Err(Error::validation("url", "Please enter a valid URL"));
                }
            }
            Self::Phone { phone } => {
                if !is_valid_phone(phone) {
                    return Err(Error::validation(
                        "phone",
                        "Please enter a valid phone number",
                    ));
                }
            }
            Self::Email { email, .. } => {
                if !is_valid_email(email) {
                    return Err(Error::validation(
                        "email",
                        "Please enter a valid email address",
                    ));
                }
            }
            Self::Wifi { ssid, .. } => {
                if ssid.trim().is_empty() {
                    return Err(Error::validation("ssid", "Please enter a network name"));
                }
            }
        }
        Ok(())
    }

    /// The string to encode. Every user-supplied piece is sanitized.
    #[must_use]
    pub fn content(&self) -> String {
        match self {
            Self::Text { text } => sanitize(text),
            Self::Url { url } => with_default_scheme(&sanitize(url)),
            Self::Phone { phone } => format!("tel:{}", sanitize(phone)),
            Self::Email {
                email,
                subject,
                body,
            } => {
                let mut content = format!("mailto:{}", sanitize(email));
                let mut separator = '?';
                if let Some(subject) = subject.as_deref().filter(|s| !s.is_empty()) {
                    content.push(separator);
                    content.push_str("subject=");
                    content.push_str(&encode_uri_component(&sanitize(subject)));
                    separator = '&';
                }
                if let Some(body) = body.as_deref().filter(|s| !s.is_empty()) {
                    content.push(separator);
                    content.push_str("body=");
                    content.push_str(&encode_uri_component(&sanitize(body)));
                }
                content
            }
            Self::Wifi {
                ssid,
                password,
                encryption,
            } => format!(
                "WIFI:T:{};S:{};P:{};;",
                encryption,
                sanitize(ssid),
                sanitize(password)
            ),
        }
    }

    /// Label recorded with the entry. Sanitized on insertion.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::Text { text } => truncate_title(text),
            Self::Url { url } => url.clone(),
            Self::Phone { phone } => phone.clone(),
            Self::Email { email, .. } => email.clone(),
            Self::Wifi { ssid, .. } => ssid.clone(),
        }
    }

    /// History input for this payload and its rendered image.
    #[must_use]
    pub fn to_new_entry(&self, content: String, qr_code: String) -> NewEntry {
        NewEntry::new(content, self.title())
            .with_type(self.entry_type())
            .with_qr_code(qr_code)
    }
}

fn with_default_scheme(url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`, the set
/// left alone by JavaScript's `encodeURIComponent`.
#[must_use]
pub fn encode_uri_component(input: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(char::from(byte)),
            _ => {
                out.push('%');
                out.push(char::from(HEX[usize::from(byte >> 4)]));
                out.push(char::from(HEX[usize::from(byte & 0x0f)]));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> QrPayload {
        QrPayload::Text {
            text: s.to_string(),
        }
    }

    fn url(s: &str) -> QrPayload {
        QrPayload::Url { url: s.to_string() }
    }

    fn email(address: &str, subject: Option<&str>, body: Option<&str>) -> QrPayload {
        QrPayload::Email {
            email: address.to_string(),
            subject: subject.map(str::to_string),
            body: body.map(str::to_string),
        }
    }

    #[test]
    fn test_text_validation() {
        assert!(text("hello").validate().is_ok());
        assert!(text("   ").validate().unwrap_err().is_validation_error());
    }

    #[test]
    fn test_url_validation_adds_scheme() {
        assert!(url("example.com").validate().is_ok());
        assert!(url("https://example.com").validate().is_ok());
        assert!(url("").validate().is_err());
    }

    #[test]
    fn test_url_validation_message() {
        let err = url("http//").validate().unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid URL");
    }

    #[test]
    fn test_phone_validation() {
        let ok = QrPayload::Phone {
            phone: "+1 (555) 123-4567".to_string(),
        };
        let bad = QrPayload::Phone {
            phone: "abc".to_string(),
        };
        assert!(ok.validate().is_ok());
        assert_eq!(
            bad.validate().unwrap_err().to_string(),
            "Please enter a valid phone number"
        );
    }

    #[test]
    fn test_email_validation() {
        assert!(email("a@b.com", None, None).validate().is_ok());
        assert_eq!(
            email("a@b", None, None).validate().unwrap_err().to_string(),
            "Please enter a valid email address"
        );
    }

    #[test]
    fn test_wifi_requires_ssid() {
        let payload = QrPayload::Wifi {
            ssid: " ".to_string(),
            password: "pw".to_string(),
            encryption: WifiEncryption::Wpa,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_text_content_is_sanitized() {
        assert_eq!(text("<b>hi</b>").content(), "hi");
    }

    #[test]
    fn test_url_content() {
        assert_eq!(url("example.com").content(), "https://example.com");
        assert_eq!(url("http://example.com").content(), "http://example.com");
    }

    #[test]
    fn test_phone_content() {
        let payload = QrPayload::Phone {
            phone: "+15551234567".to_string(),
        };
        assert_eq!(payload.content(), "tel:+15551234567");
    }

    #[test]
    fn test_email_content_variants() {
        assert_eq!(email("a@b.com", None, None).content(), "mailto:a@b.com");
        assert_eq!(
            email("a@b.com", Some("Hi there"), None).content(),
            "mailto:a@b.com?subject=Hi%20there"
        );
        assert_eq!(
            email("a@b.com", None, Some("x&y")).content(),
            "mailto:a@b.com?body=x%26amp%3By"
        );
        assert_eq!(
            email("a@b.com", Some("s"), Some("b")).content(),
            "mailto:a@b.com?subject=s&body=b"
        );
        assert_eq!(email("a@b.com", Some(""), None).content(), "mailto:a@b.com");
    }

    #[test]
    fn test_wifi_content() {
        let payload = QrPayload::Wifi {
            ssid: "home".to_string(),
            password: "secret".to_string(),
            encryption: WifiEncryption::Wep,
        };
        assert_eq!(payload.content(), "WIFI:T:WEP;S:home;P:secret;;");
    }

    #[test]
    fn test_titles() {
        assert_eq!(text(&"x".repeat(40)).title(), format!("{}...", "x".repeat(30)));
        assert_eq!(url("example.com").title(), "example.com");
        assert_eq!(email("a@b.com", Some("s"), None).title(), "a@b.com");
    }

    #[test]
    fn test_entry_types() {
        assert_eq!(text("x").entry_type(), EntryType::Text);
        assert_eq!(url("x").entry_type(), EntryType::Url);
        assert_eq!(email("x", None, None).entry_type(), EntryType::Email);
    }

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("abc-_.!~*'()"), "abc-_.!~*'()");
        assert_eq!(encode_uri_component("a b&c=d?"), "a%20b%26c%3Dd%3F");
        assert_eq!(encode_uri_component("é"), "%C3%A9");
    }

    #[test]
    fn test_wifi_encryption_display() {
        assert_eq!(WifiEncryption::default().to_string(), "WPA");
        assert_eq!(WifiEncryption::NoPass.to_string(), "nopass");
    }
}
