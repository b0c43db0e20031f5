//! Markup stripping for untrusted text.
//!
//! Everything that ends up in the history (decoded QR payloads, form fields,
//! titles derived from either) goes through [`sanitize`] first. The policy is
//! allow-nothing: no tag and no attribute survives, whatever the input looks
//! like. Text between tags is kept, except inside `script` and `style`, whose
//! contents are dropped with the element.
//!
//! The result is serialized text, so `<`, `>` and `&` occurring in plain text
//! come back entity-escaped (`a < b` becomes `a &lt; b`). That keeps the
//! output free of tag delimiters and makes [`sanitize`] idempotent.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use ammonia::Builder;
use serde_json::Value;

fn cleaner() -> &'static Builder<'static> {
    static CLEANER: OnceLock<Builder<'static>> = OnceLock::new();
    CLEANER.get_or_init(|| {
        let mut builder = Builder::default();
        builder
            .tags(HashSet::new())
            .generic_attributes(HashSet::new())
            .tag_attributes(HashMap::new())
            .url_schemes(HashSet::new())
            .link_rel(None)
            .clean_content_tags(HashSet::from(["script", "style"]))
            .strip_comments(true);
        builder
    })
}

/// Strip all markup from `content`.
///
/// Never fails; malformed markup degrades to its text content.
#[must_use]
pub fn sanitize(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    cleaner().clean(content).to_string()
}

/// Sanitize an optional field. Absent input becomes the empty string.
#[must_use]
pub fn sanitize_opt(content: Option<&str>) -> String {
    content.map(sanitize).unwrap_or_default()
}

/// Sanitize a loosely typed value, such as a field pulled from JSON.
///
/// Only strings carry content; every other value yields `""`.
#[must_use]
pub fn sanitize_value(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize(s),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_markup_free(output: &str) {
        assert!(!output.contains('<'), "tag opener survived: {output}");
        assert!(!output.contains('>'), "tag closer survived: {output}");
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(sanitize("Hello, world!"), "Hello, world!");
        assert_eq!(sanitize("https://example.com/path"), "https://example.com/path");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_strips_formatting_tags() {
        assert_eq!(sanitize("<b>bold</b> and <i>italic</i>"), "bold and italic");
    }

    #[test]
    fn test_drops_script_with_contents() {
        assert_eq!(sanitize("<script>alert(1)</script>hello"), "hello");
        assert_eq!(sanitize("<style>body{}</style>text"), "text");
    }

    #[test]
    fn test_drops_event_handler_attributes() {
        let out = sanitize(r#"<img src="x" onerror="alert(1)">"#);
        assert_eq!(out, "");

        let out = sanitize(r#"<a href="javascript:alert(1)" onclick="steal()">click</a>"#);
        assert_eq!(out, "click");
    }

    #[test]
    fn test_no_tags_or_attributes_survive() {
        let payloads = [
            r#"<svg/onload=alert(1)>"#,
            r#"<iframe src="data:text/html,<script>alert(1)</script>"></iframe>"#,
            r#"<div style="x" class="y" id="z"><p title="t">para</p></div>"#,
            "<<script>script>alert(1)<</script>/script>",
            "<scr<script>ipt>alert(1)</script>",
            r#"<a href="https://safe.example">ok</a>"#,
            "<!-- comment --><b>x</b>",
            "unterminated <b attr='x",
        ];
        for payload in payloads {
            let out = sanitize(payload);
            assert_markup_free(&out);
            assert!(!out.contains("onerror="), "attribute survived: {out}");
        }
    }

    #[test]
    fn test_stray_angle_brackets_are_escaped() {
        let out = sanitize("1 < 2 > 0");
        assert_markup_free(&out);
        assert!(out.contains("&lt;"));
    }

    #[test]
    fn test_is_idempotent() {
        let inputs = ["a & b", "<b>x</b> < y", "WIFI:T:WPA;S:home;P:p&ss;;"];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn test_sanitize_opt() {
        assert_eq!(sanitize_opt(None), "");
        assert_eq!(sanitize_opt(Some("<b>x</b>")), "x");
    }

    #[test]
    fn test_non_string_values_become_empty() {
        assert_eq!(sanitize_value(&json!(42)), "");
        assert_eq!(sanitize_value(&json!(null)), "");
        assert_eq!(sanitize_value(&json!(true)), "");
        assert_eq!(sanitize_value(&json!(["<b>x</b>"])), "");
        assert_eq!(sanitize_value(&json!({"content": "x"})), "");
    }

    #[test]
    fn test_string_values_are_sanitized() {
        assert_eq!(sanitize_value(&json!("<em>hi</em>")), "hi");
    }
}
