//! The dynamic value that crosses a request surface.

use std::fmt;

use bytes::Bytes;

#[cfg(feature = "document")]
use crate::document::Document;

/// A value read from a getter, passed to a method, or returned from one.
///
/// Legacy request objects are loosely typed: `response` may be text, raw
/// bytes, a parsed document or a JSON value depending on `responseType`, and
/// method arguments are positional. `Value` models that surface without
/// giving up on typed accessors.
#[derive(Clone, PartialEq)]
pub enum Value {
    /// No value at all, as returned by void methods.
    Undefined,
    /// An explicit null, as produced by failed response decoding.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    String(String),
    /// An exact byte range.
    ArrayBuffer(Bytes),
    /// An opaque binary object.
    Blob(Blob),
    /// A parsed XML document.
    #[cfg(feature = "document")]
    Document(Document),
    /// A parsed JSON value.
    #[cfg(feature = "json")]
    Json(serde_json::Value),
}

impl Value {
    /// Returns true for `Null` and `Undefined`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// Returns the string, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number, if this is a `Number`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number truncated to a `u16`, as used by `readyState`
    /// and `status`.
    pub fn as_u16(&self) -> Option<u16> {
        self.as_f64()
            .filter(|n| *n >= 0.0 && *n <= u16::MAX as f64)
            .map(|n| n as u16)
    }

    /// Returns the bool, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the bytes of an `ArrayBuffer` or `Blob`.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::ArrayBuffer(b) => Some(b),
            Value::Blob(blob) => Some(&blob.bytes),
            _ => None,
        }
    }

    /// Returns the blob, if this is a `Blob`.
    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Value::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    /// Returns the document, if this is a `Document`.
    #[cfg(feature = "document")]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Returns the JSON value, if this is `Json`.
    #[cfg(feature = "json")]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::Undefined
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::ArrayBuffer(b) => f.debug_tuple("ArrayBuffer").field(&b.len()).finish(),
            Value::Blob(blob) => fmt::Debug::fmt(blob, f),
            #[cfg(feature = "document")]
            Value::Document(doc) => fmt::Debug::fmt(doc, f),
            #[cfg(feature = "json")]
            Value::Json(v) => f.debug_tuple("Json").field(v).finish(),
        }
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(s: &str) -> Value {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    #[inline]
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<u16> for Value {
    #[inline]
    fn from(n: u16) -> Value {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(n: f64) -> Value {
        Value::Number(n)
    }
}

impl From<Bytes> for Value {
    #[inline]
    fn from(bytes: Bytes) -> Value {
        Value::ArrayBuffer(bytes)
    }
}

impl From<Vec<u8>> for Value {
    #[inline]
    fn from(vec: Vec<u8>) -> Value {
        Value::ArrayBuffer(vec.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(opt: Option<T>) -> Value {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

/// An opaque binary object.
#[derive(Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Bytes,
    content_type: String,
}

impl Blob {
    /// Wraps `bytes` with the given MIME type. An empty type means unknown.
    pub fn new(bytes: Bytes, content_type: impl Into<String>) -> Blob {
        Blob {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// The number of bytes in the blob.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// The MIME type of the blob, or `""` if unknown.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The blob's bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Blob")
            .field("size", &self.size())
            .field("type", &self.content_type)
            .finish()
    }
}
