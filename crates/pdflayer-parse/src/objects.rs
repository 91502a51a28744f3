//! Small lopdf object helpers shared by the backend modules.

use lopdf::{Dictionary, Document, Object, Stream};
use pdflayer_core::BBox;

use crate::error::BackendError;

/// Follow an indirect reference once; other objects are returned as is.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Look up `key` and resolve the value.
pub(crate) fn get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

pub(crate) fn get_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    get(doc, dict, key).and_then(|obj| match obj {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    })
}

pub(crate) fn get_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f64> {
    get(doc, dict, key).and_then(number)
}

pub(crate) fn get_name(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    get(doc, dict, key)
        .and_then(|obj| obj.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

/// Integer or real as `f64`.
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Like [`number`] but reports what was found instead.
pub(crate) fn object_to_f64(obj: &Object) -> Result<f64, BackendError> {
    number(obj).ok_or_else(|| BackendError::Parse(format!("expected number, got {obj:?}")))
}

/// A `[x0 y0 x1 y1]` rectangle.
pub(crate) fn bbox_from_array(doc: &Document, array: &[Object]) -> Result<BBox, BackendError> {
    if array.len() != 4 {
        return Err(BackendError::Parse(format!(
            "expected 4-element array for box, got {}",
            array.len()
        )));
    }
    let mut v = [0.0; 4];
    for (slot, obj) in v.iter_mut().zip(array) {
        *slot = object_to_f64(resolve(doc, obj))?;
    }
    Ok(BBox::new(v[0], v[1], v[2], v[3]))
}

/// A six-number matrix array such as a form's `/Matrix`.
pub(crate) fn matrix_from_array(doc: &Document, array: &[Object]) -> Option<[f64; 6]> {
    if array.len() != 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (slot, obj) in m.iter_mut().zip(array) {
        *slot = number(resolve(doc, obj))?;
    }
    Some(m)
}

/// Stream bytes with every filter applied.
pub(crate) fn decode_stream(stream: &Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Parse(format!("stream decompression failed: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// Decode a PDF text string: UTF-16BE with a byte order mark, else UTF-8 (lossy).
pub(crate) fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Text of a string or name object.
pub(crate) fn text_of(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}
