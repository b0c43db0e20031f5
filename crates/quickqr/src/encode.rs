//! QR rendering and image handling.
//!
//! Rendering is delegated to an encoder behind [`QrEncoder`]; the default
//! [`SvgQrEncoder`] uses the `qrcode` crate. Encoders return the image as a
//! data URL, which is what the generated history stores verbatim.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use tracing::debug;

use crate::config::{ErrorCorrection, GeneratorConfig};
use crate::entry::EntryType;
use crate::error::{Error, Result};

/// Rendering options passed to the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Minimum width in pixels.
    pub width: u32,
    /// Quiet-zone margin in modules.
    pub margin: u32,
    /// Error-correction level.
    pub error_correction: ErrorCorrection,
    /// Dark module color.
    pub dark_color: String,
    /// Light module color.
    pub light_color: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::from(&GeneratorConfig::default())
    }
}

impl From<&GeneratorConfig> for EncodeOptions {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            width: config.width,
            margin: config.margin,
            error_correction: config.error_correction,
            dark_color: config.dark_color.clone(),
            light_color: config.light_color.clone(),
        }
    }
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => Self::L,
            ErrorCorrection::M => Self::M,
            ErrorCorrection::Q => Self::Q,
            ErrorCorrection::H => Self::H,
        }
    }
}

/// Something that renders content into a QR image.
pub trait QrEncoder {
    /// Render `content` and return the image as a data URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if the content cannot be encoded, for
    /// example because it is too long for the chosen error-correction level.
    fn encode(&self, content: &str, options: &EncodeOptions) -> Result<String>;
}

/// Renders SVG images with the `qrcode` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgQrEncoder;

impl QrEncoder for SvgQrEncoder {
    fn encode(&self, content: &str, options: &EncodeOptions) -> Result<String> {
        let code = QrCode::with_error_correction_level(
            content.as_bytes(),
            options.error_correction.into(),
        )
        .map_err(|e| Error::encode(e.to_string()))?;

        // The renderer only supports an on/off quiet zone of its standard size
        let image = code
            .render::<svg::Color<'_>>()
            .min_dimensions(options.width, options.width)
            .quiet_zone(options.margin > 0)
            .dark_color(svg::Color(&options.dark_color))
            .light_color(svg::Color(&options.light_color))
            .build();

        debug!(
            modules = code.width(),
            bytes = image.len(),
            "Rendered QR code"
        );
        Ok(to_data_url("image/svg+xml", image.as_bytes()))
    }
}

/// Wrap `bytes` in a base64 data URL.
#[must_use]
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// A decoded base64 data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Media type, e.g. `image/svg+xml`.
    pub mime: String,
    /// Decoded payload.
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// File extension for the media type.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/svg+xml" => "svg",
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/gif" => "gif",
            _ => "bin",
        }
    }
}

/// Decode a `data:<mime>;base64,<payload>` URL.
///
/// # Errors
///
/// Returns [`Error::Encode`] if `url` is not a base64 data URL.
pub fn decode_data_url(url: &str) -> Result<DataUrl> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| Error::encode("image is not a data URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::encode("data URL has no payload"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| Error::encode("data URL is not base64 encoded"))?;

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| Error::encode(format!("invalid base64 in data URL: {e}")))?;

    Ok(DataUrl {
        mime: mime.to_string(),
        bytes,
    })
}

/// File name for a downloaded code: `quickqr-<type>-<millis>.<ext>`.
///
/// Anything other than ASCII letters and digits is dropped from the type.
#[must_use]
pub fn download_file_name(entry_type: EntryType, millis: i64, extension: &str) -> String {
    let safe_type: String = entry_type
        .as_str()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    format!("quickqr-{safe_type}-{millis}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_config() {
        let options = EncodeOptions::default();
        assert_eq!(options.width, 300);
        assert_eq!(options.margin, 2);
        assert_eq!(options.error_correction, ErrorCorrection::H);
    }

    #[test]
    fn test_svg_encoder_returns_svg_data_url() {
        let url = SvgQrEncoder
            .encode("https://example.com", &EncodeOptions::default())
            .unwrap();
        assert!(url.starts_with("data:image/svg+xml;base64,"));

        let decoded = decode_data_url(&url).unwrap();
        let svg = String::from_utf8(decoded.bytes.clone()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#000000"));
        assert_eq!(decoded.extension(), "svg");
    }

    #[test]
    fn test_svg_encoder_rejects_oversized_content() {
        let content = "x".repeat(5_000);
        let err = SvgQrEncoder
            .encode(&content, &EncodeOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Encode { .. }));
    }

    #[test]
    fn test_data_url_round_trip() {
        let url = to_data_url("image/png", &[1, 2, 3]);
        assert_eq!(url, "data:image/png;base64,AQID");
        let decoded = decode_data_url(&url).unwrap();
        assert_eq!(decoded.bytes, vec![1, 2, 3]);
        assert_eq!(decoded.extension(), "png");
    }

    #[test]
    fn test_decode_data_url_rejects_malformed() {
        assert!(decode_data_url("https://example.com/a.png").is_err());
        assert!(decode_data_url("data:image/png;base64").is_err());
        assert!(decode_data_url("data:image/png,raw").is_err());
        assert!(decode_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_download_file_name() {
        assert_eq!(
            download_file_name(EntryType::Wifi, 1_700_000_000_000, "svg"),
            "quickqr-wifi-1700000000000.svg"
        );
    }
}
