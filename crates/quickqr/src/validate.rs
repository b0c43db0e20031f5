//! Syntactic checks for URLs, email addresses and phone numbers.
//!
//! The email and phone checks are loose on purpose: they catch gross
//! malformation, not every invalid address. QR payloads encoded under these
//! rules must keep validating, so the patterns must not be tightened.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Something, `@`, something, `.`, something; no whitespace, no extra `@`.
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Optional `+`, optional parenthesized 1-4 digit group, then at least six of
/// digits, whitespace, `-`, `.`, `/`, `(` or `)`.
const PHONE_PATTERN: &str = r"^[+]?[(]?[0-9]{1,4}[)]?[-\s./0-9()]{6,}$";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern is valid"))
}

/// True if `s` parses as an absolute URL with an `http` or `https` scheme.
#[must_use]
pub fn is_valid_url(s: &str) -> bool {
    match Url::parse(s) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// True if `s` looks like `local@domain.tld`.
///
/// `a@b.c` passes even though no such domain exists.
#[must_use]
pub fn is_valid_email(s: &str) -> bool {
    email_regex().is_match(s)
}

/// True if `s` looks like a phone number.
#[must_use]
pub fn is_valid_phone(s: &str) -> bool {
    phone_regex().is_match(s)
}
