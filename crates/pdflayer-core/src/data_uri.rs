//! `data:` URI helpers and magic-byte MIME sniffing.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};

/// Build `data:<mime>;base64,<payload>`.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// True for strings that already embed their own content.
pub fn is_data_uri(value: &str) -> bool {
    value.trim_start().starts_with("data:")
}

/// Decode base64 text, tolerating whitespace, missing padding and the
/// URL-safe alphabet.
pub fn decode_base64(text: &str) -> Option<Vec<u8>> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(cleaned.as_bytes()).ok())
}

/// Identify common image encodings from their leading bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if looks_like_svg(bytes) {
        Some("image/svg+xml")
    } else {
        None
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// A parsed `data:` URI.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri {
    pub mime: String,
    pub data: Vec<u8>,
}

impl DataUri {
    /// Parse a base64 or percent-free plain `data:` URI.
    pub fn parse(value: &str) -> Option<DataUri> {
        let rest = value.trim().strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        let (mime, is_base64) = match meta.strip_suffix(";base64") {
            Some(mime) => (mime, true),
            None => (meta, false),
        };
        let data = if is_base64 {
            decode_base64(payload)?
        } else {
            payload.as_bytes().to_vec()
        };
        let mime = if mime.is_empty() {
            "text/plain".to_string()
        } else {
            mime.to_string()
        };
        Some(DataUri { mime, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn sniffs_known_formats() {
        assert_eq!(sniff_mime(PNG_MAGIC), Some("image/png"));
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_mime(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(
            sniff_mime(b"<?xml version=\"1.0\"?><svg xmlns=\"x\"/>"),
            Some("image/svg+xml")
        );
        assert_eq!(sniff_mime(b"plain text"), None);
    }

    #[test]
    fn encode_then_parse() {
        let uri = encode_data_uri("image/png", PNG_MAGIC);
        assert!(uri.starts_with("data:image/png;base64,"));
        let parsed = DataUri::parse(&uri).unwrap();
        assert_eq!(parsed.mime, "image/png");
        assert_eq!(parsed.data, PNG_MAGIC);
    }

    #[test]
    fn base64_tolerates_whitespace_and_missing_padding() {
        assert_eq!(decode_base64("aGVs\nbG8=").unwrap(), b"hello");
        assert_eq!(decode_base64("aGVsbG8").unwrap(), b"hello");
        assert!(decode_base64("   ").is_none());
        assert!(decode_base64("***").is_none());
    }

    #[test]
    fn plain_data_uri() {
        let parsed = DataUri::parse("data:,hi").unwrap();
        assert_eq!(parsed.mime, "text/plain");
        assert_eq!(parsed.data, b"hi");
        assert!(DataUri::parse("https://example.com/a.png").is_none());
    }

    #[test]
    fn data_uri_detection() {
        assert!(is_data_uri("  data:image/png;base64,AAAA"));
        assert!(!is_data_uri("uploads/a.png"));
    }
}
