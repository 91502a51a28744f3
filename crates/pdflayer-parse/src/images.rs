//! Image XObject payloads.
//!
//! Only encodings that can be re-wrapped as a self-contained data URI
//! are returned as [`ImagePayload::Encoded`]: JPEG and JPEG 2000 bytes
//! pass through untouched, and 8-bit gray, RGB or CMYK samples are
//! re-encoded as PNG. Everything else is reported, not guessed.

use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb};
use lopdf::{Document, Object, Stream};
use pdflayer_core::encode_data_uri;

use crate::objects::{get, get_number, resolve};

/// Result of reading an image XObject.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    /// Self-contained bytes and their MIME type.
    Encoded { mime: &'static str, bytes: Vec<u8> },
    /// An encoding the pipeline does not re-wrap (JBIG2, CCITT, indexed, 1-bit, …).
    Unsupported(String),
    /// The stream claimed a supported encoding but could not be read.
    Failed(String),
}

impl ImagePayload {
    /// `data:<mime>;base64,…` for encoded payloads.
    pub fn data_uri(&self) -> Option<String> {
        match self {
            ImagePayload::Encoded { mime, bytes } => Some(encode_data_uri(mime, bytes)),
            _ => None,
        }
    }
}

/// Read the payload of an image XObject stream.
pub fn extract_image_payload(doc: &Document, stream: &Stream) -> ImagePayload {
    let filters = filter_names(doc, stream);
    match filters.last().map(String::as_str) {
        Some("DCTDecode") | Some("DCT") => {
            return passthrough(&filters, stream, "image/jpeg");
        }
        Some("JPXDecode") => return passthrough(&filters, stream, "image/jp2"),
        Some(f @ ("JBIG2Decode" | "CCITTFaxDecode" | "CCF")) => {
            return ImagePayload::Unsupported(format!("{f} images are not embedded"));
        }
        _ => {}
    }

    let dict = &stream.dict;
    if matches!(get(doc, dict, b"ImageMask"), Some(Object::Boolean(true))) {
        return ImagePayload::Unsupported("stencil masks are not embedded".to_string());
    }
    let bpc = get_number(doc, dict, b"BitsPerComponent").unwrap_or(8.0);
    if bpc != 8.0 {
        return ImagePayload::Unsupported(format!("{bpc}-bit samples are not embedded"));
    }
    let channels = match color_channels(doc, get(doc, dict, b"ColorSpace")) {
        Ok(n) => n,
        Err(reason) => return ImagePayload::Unsupported(reason),
    };
    let (Some(width), Some(height)) = (
        get_number(doc, dict, b"Width").filter(|w| *w >= 1.0),
        get_number(doc, dict, b"Height").filter(|h| *h >= 1.0),
    ) else {
        return ImagePayload::Failed("missing image dimensions".to_string());
    };
    let (width, height) = (width as u32, height as u32);

    let samples = if filters.is_empty() {
        stream.content.clone()
    } else {
        match stream.decompressed_content() {
            Ok(bytes) => bytes,
            Err(e) => return ImagePayload::Failed(format!("cannot decode image samples: {e}")),
        }
    };

    match encode_png(width, height, channels, samples) {
        Ok(bytes) => ImagePayload::Encoded {
            mime: "image/png",
            bytes,
        },
        Err(reason) => ImagePayload::Failed(reason),
    }
}

fn passthrough(filters: &[String], stream: &Stream, mime: &'static str) -> ImagePayload {
    if filters.len() > 1 {
        return ImagePayload::Unsupported(format!(
            "{mime} behind additional filters ({})",
            filters.join(", ")
        ));
    }
    ImagePayload::Encoded {
        mime,
        bytes: stream.content.clone(),
    }
}

fn filter_names(doc: &Document, stream: &Stream) -> Vec<String> {
    let name = |obj: &Object| {
        resolve(doc, obj)
            .as_name()
            .ok()
            .map(|n| String::from_utf8_lossy(n).into_owned())
    };
    match get(doc, &stream.dict, b"Filter") {
        Some(Object::Array(items)) => items.iter().filter_map(name).collect(),
        Some(obj) => name(obj).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Number of 8-bit components per pixel for the device families we re-encode.
fn color_channels(doc: &Document, space: Option<&Object>) -> Result<u8, String> {
    let Some(space) = space else {
        return Err("image without a color space".to_string());
    };
    let family = match space {
        Object::Name(n) => String::from_utf8_lossy(n).into_owned(),
        Object::Array(items) => match items.first().map(|obj| resolve(doc, obj)) {
            Some(Object::Name(n)) => {
                let family = String::from_utf8_lossy(n).into_owned();
                if family == "ICCBased" {
                    let n = items
                        .get(1)
                        .map(|obj| resolve(doc, obj))
                        .and_then(|obj| obj.as_stream().ok())
                        .and_then(|s| get_number(doc, &s.dict, b"N"));
                    return match n {
                        Some(n) if n == 1.0 || n == 3.0 || n == 4.0 => Ok(n as u8),
                        _ => Err("ICC profile with unknown component count".to_string()),
                    };
                }
                family
            }
            _ => return Err("malformed color space array".to_string()),
        },
        _ => return Err("malformed color space".to_string()),
    };
    match family.as_str() {
        "DeviceGray" | "CalGray" | "G" => Ok(1),
        "DeviceRGB" | "CalRGB" | "RGB" => Ok(3),
        "DeviceCMYK" | "CMYK" => Ok(4),
        other => Err(format!("{other} color space is not embedded")),
    }
}

fn encode_png(width: u32, height: u32, channels: u8, mut samples: Vec<u8>) -> Result<Vec<u8>, String> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(channels as usize))
        .ok_or_else(|| "image dimensions overflow".to_string())?;
    if samples.len() < expected {
        return Err(format!(
            "image data too short: {} bytes for {width}x{height}x{channels}",
            samples.len()
        ));
    }
    samples.truncate(expected);

    let image = match channels {
        1 => ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(width, height, samples)
            .map(DynamicImage::ImageLuma8),
        3 => ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(width, height, samples)
            .map(DynamicImage::ImageRgb8),
        _ => {
            let rgb = samples
                .chunks_exact(4)
                .flat_map(|px| {
                    let k = 255 - u16::from(px[3]);
                    [px[0], px[1], px[2]].map(|c| ((255 - u16::from(c)) * k / 255) as u8)
                })
                .collect();
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
        }
    }
    .ok_or_else(|| "failed to create image buffer".to_string())?;

    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| format!("PNG encoding failed: {e}"))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

    fn image_stream(extra: lopdf::Dictionary, content: Vec<u8>) -> Stream {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 1,
            "BitsPerComponent" => 8,
        };
        for (k, v) in extra.iter() {
            dict.set(k.clone(), v.clone());
        }
        Stream::new(dict, content)
    }

    #[test]
    fn rgb_samples_become_png() {
        let doc = Document::with_version("1.5");
        let s = image_stream(
            dictionary! { "ColorSpace" => "DeviceRGB" },
            vec![255, 0, 0, 0, 0, 255],
        );
        let ImagePayload::Encoded { mime, bytes } = extract_image_payload(&doc, &s) else {
            panic!("expected encoded payload");
        };
        assert_eq!(mime, "image/png");
        assert!(bytes.starts_with(PNG_MAGIC));
    }

    #[test]
    fn gray_and_cmyk_samples_become_png() {
        let doc = Document::with_version("1.5");
        let gray = image_stream(dictionary! { "ColorSpace" => "DeviceGray" }, vec![0, 255]);
        assert!(matches!(
            extract_image_payload(&doc, &gray),
            ImagePayload::Encoded { mime: "image/png", .. }
        ));
        let cmyk = image_stream(
            dictionary! { "ColorSpace" => "DeviceCMYK" },
            vec![0, 0, 0, 255, 0, 255, 255, 0],
        );
        assert!(matches!(
            extract_image_payload(&doc, &cmyk),
            ImagePayload::Encoded { mime: "image/png", .. }
        ));
    }

    #[test]
    fn jpeg_passes_through() {
        let doc = Document::with_version("1.5");
        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        let s = image_stream(
            dictionary! { "ColorSpace" => "DeviceRGB", "Filter" => "DCTDecode" },
            jpeg.clone(),
        );
        let payload = extract_image_payload(&doc, &s);
        assert_eq!(
            payload,
            ImagePayload::Encoded {
                mime: "image/jpeg",
                bytes: jpeg
            }
        );
        assert!(payload.data_uri().unwrap().starts_with("data:image/jpeg;base64,/9j/"));
    }

    #[test]
    fn jpx_is_labeled_jp2() {
        let doc = Document::with_version("1.5");
        let s = image_stream(dictionary! { "Filter" => "JPXDecode" }, vec![0, 0, 0, 12]);
        assert!(matches!(
            extract_image_payload(&doc, &s),
            ImagePayload::Encoded { mime: "image/jp2", .. }
        ));
    }

    #[test]
    fn unsupported_encodings_are_reported() {
        let doc = Document::with_version("1.5");
        let jbig2 = image_stream(dictionary! { "Filter" => "JBIG2Decode" }, vec![1, 2, 3]);
        assert!(matches!(
            extract_image_payload(&doc, &jbig2),
            ImagePayload::Unsupported(_)
        ));
        let one_bit = image_stream(
            dictionary! { "ColorSpace" => "DeviceGray", "BitsPerComponent" => 1 },
            vec![0b1000_0000],
        );
        assert!(matches!(
            extract_image_payload(&doc, &one_bit),
            ImagePayload::Unsupported(_)
        ));
        let indexed = image_stream(
            dictionary! { "ColorSpace" => vec![Object::Name(b"Indexed".to_vec())] },
            vec![0, 1],
        );
        assert!(matches!(
            extract_image_payload(&doc, &indexed),
            ImagePayload::Unsupported(_)
        ));
        assert!(extract_image_payload(&doc, &indexed).data_uri().is_none());
    }

    #[test]
    fn short_sample_data_fails() {
        let doc = Document::with_version("1.5");
        let s = image_stream(dictionary! { "ColorSpace" => "DeviceRGB" }, vec![1, 2, 3]);
        assert!(matches!(
            extract_image_payload(&doc, &s),
            ImagePayload::Failed(_)
        ));
    }

    #[test]
    fn oversized_dimensions_fail_without_overflow() {
        let doc = Document::with_version("1.5");
        let s = image_stream(
            dictionary! {
                "ColorSpace" => "DeviceRGB",
                "Width" => 4_294_967_295i64,
                "Height" => 4_294_967_295i64,
            },
            vec![0; 6],
        );
        assert_eq!(
            extract_image_payload(&doc, &s),
            ImagePayload::Failed("image dimensions overflow".to_string())
        );
    }

    #[test]
    fn icc_based_uses_component_count() {
        let mut doc = Document::with_version("1.5");
        let icc = doc.add_object(Stream::new(dictionary! { "N" => 1 }, vec![]));
        let s = image_stream(
            dictionary! { "ColorSpace" => vec![Object::Name(b"ICCBased".to_vec()), icc.into()] },
            vec![10, 20],
        );
        assert!(matches!(
            extract_image_payload(&doc, &s),
            ImagePayload::Encoded { mime: "image/png", .. }
        ));
    }
}
