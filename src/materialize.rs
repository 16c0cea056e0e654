//! Decoding the emulated body buffer into a typed `response` value.

use std::borrow::Cow;

use bytes::Bytes;

use crate::value::{Blob, Value};

/// The declared `responseType` of a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseType {
    /// `""` or `"text"`.
    Text,
    /// `"arraybuffer"`.
    ArrayBuffer,
    /// `"blob"`.
    Blob,
    /// `"document"`.
    Document,
    /// `"json"`.
    Json,
    /// Anything else.
    Other(String),
}

impl ResponseType {
    /// Parses the host's `responseType` string.
    pub fn parse(s: &str) -> ResponseType {
        match s {
            "" | "text" => ResponseType::Text,
            "arraybuffer" => ResponseType::ArrayBuffer,
            "blob" => ResponseType::Blob,
            "document" => ResponseType::Document,
            "json" => ResponseType::Json,
            other => ResponseType::Other(other.to_owned()),
        }
    }
}

/// Decodes bytes as UTF-8 text, dropping a leading BOM and replacing
/// malformed sequences.
pub(crate) fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (text, _, _) = encoding_rs::UTF_8.decode(bytes);
    text
}

/// Materializes `bytes` as the value `kind` asks for.
///
/// Never fails: anything that cannot be decoded is `Value::Null`.
pub fn materialize(kind: &ResponseType, bytes: Bytes, content_type: &str) -> Value {
    match kind {
        ResponseType::Text => Value::String(decode_text(&bytes).into_owned()),
        ResponseType::ArrayBuffer => Value::ArrayBuffer(bytes),
        ResponseType::Blob => Value::Blob(Blob::new(bytes, content_type)),
        ResponseType::Document => document(&bytes),
        ResponseType::Json => json(&bytes),
        ResponseType::Other(other) => {
            trace!("unknown response type {:?}, yielding null", other);
            Value::Null
        }
    }
}

#[cfg(feature = "document")]
fn document(bytes: &[u8]) -> Value {
    match crate::document::Document::parse(&decode_text(bytes)) {
        Ok(doc) => Value::Document(doc),
        Err(e) => {
            debug!("response is not a valid document: {}", e);
            Value::Null
        }
    }
}

#[cfg(not(feature = "document"))]
fn document(_bytes: &[u8]) -> Value {
    Value::Null
}

#[cfg(feature = "json")]
fn json(bytes: &[u8]) -> Value {
    match serde_json::from_str(&decode_text(bytes)) {
        Ok(v) => Value::Json(v),
        Err(e) => {
            debug!("response is not valid json: {}", e);
            Value::Null
        }
    }
}

#[cfg(not(feature = "json"))]
fn json(_bytes: &[u8]) -> Value {
    Value::Null
}
