//! Request bodies
//!
//! A [`Body`] knows its [`ContentType`] and how to serialize itself. The
//! request builder calls [`Body::make_data`] once and, on failure, aborts the
//! whole build with the error returned.

use serde::Serialize;

use crate::content_type::ContentType;
use crate::error::BodyEncodeError;

/// An object that can be serialized and sent as the body of a request
pub trait Body {
    /// The content type of the body, sent as the `Content-Type` header
    fn content_type(&self) -> ContentType;

    /// Serialize the body
    fn make_data(&self) -> Result<Vec<u8>, BodyEncodeError>;

    /// The error matching this body's content type
    fn encode_error(&self) -> BodyEncodeError {
        BodyEncodeError::from_content_type(&self.content_type())
    }
}

impl<B: Body + ?Sized> Body for &B {
    fn content_type(&self) -> ContentType {
        (**self).content_type()
    }

    fn make_data(&self) -> Result<Vec<u8>, BodyEncodeError> {
        (**self).make_data()
    }
}

impl<B: Body + ?Sized> Body for Box<B> {
    fn content_type(&self) -> ContentType {
        (**self).content_type()
    }

    fn make_data(&self) -> Result<Vec<u8>, BodyEncodeError> {
        (**self).make_data()
    }
}

/// Raw bytes, sent unchanged
impl Body for Vec<u8> {
    fn content_type(&self) -> ContentType {
        ContentType::Binary
    }

    fn make_data(&self) -> Result<Vec<u8>, BodyEncodeError> {
        Ok(self.clone())
    }
}

impl Body for [u8] {
    fn content_type(&self) -> ContentType {
        ContentType::Binary
    }

    fn make_data(&self) -> Result<Vec<u8>, BodyEncodeError> {
        Ok(self.to_vec())
    }
}

/// JSON output style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonEncoding {
    /// Compact output
    #[default]
    Compact,
    /// Indented output
    Pretty,
}

/// A serializable object sent as JSON
#[derive(Debug, Clone)]
pub struct JsonBody<T> {
    object: T,
    encoding: JsonEncoding,
}

impl<T: Serialize> JsonBody<T> {
    /// Create a compact JSON body
    pub fn new(object: T) -> Self {
        Self::with_encoding(object, JsonEncoding::Compact)
    }

    /// Create a JSON body with the given output style
    pub fn with_encoding(object: T, encoding: JsonEncoding) -> Self {
        Self { object, encoding }
    }

    /// Get the wrapped object
    pub fn object(&self) -> &T {
        &self.object
    }
}

impl<T: Serialize> Body for JsonBody<T> {
    fn content_type(&self) -> ContentType {
        ContentType::Json
    }

    fn make_data(&self) -> Result<Vec<u8>, BodyEncodeError> {
        let encoded = match self.encoding {
            JsonEncoding::Compact => serde_json::to_vec(&self.object),
            JsonEncoding::Pretty => serde_json::to_vec_pretty(&self.object),
        };
        encoded.map_err(|e| {
            tracing::debug!(error = %e, "JSON body serialization failed");
            self.encode_error()
        })
    }
}

/// A PDF document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfBody {
    data: Vec<u8>,
}

impl PdfBody {
    /// Create a PDF body from serialized PDF data
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl Body for PdfBody {
    fn content_type(&self) -> ContentType {
        ContentType::Pdf
    }

    fn make_data(&self) -> Result<Vec<u8>, BodyEncodeError> {
        Ok(self.data.clone())
    }
}

/// Text encodings available to [`EncodedStringBody`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// 7-bit ASCII
    Ascii,
    /// ISO-8859-1
    Latin1,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    /// Encode a string, or `None` if a character cannot be represented
    pub fn encode(&self, s: &str) -> Option<Vec<u8>> {
        match self {
            TextEncoding::Utf8 => Some(s.as_bytes().to_vec()),
            TextEncoding::Ascii => s.is_ascii().then(|| s.as_bytes().to_vec()),
            TextEncoding::Latin1 => s
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect(),
            TextEncoding::Utf16Le => Some(s.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            TextEncoding::Utf16Be => Some(s.encode_utf16().flat_map(u16::to_be_bytes).collect()),
        }
    }
}

/// A string serialized with a specific text encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedStringBody {
    string: String,
    encoding: TextEncoding,
}

impl EncodedStringBody {
    /// Create a body encoding `string` with `encoding`
    pub fn new(string: impl Into<String>, encoding: TextEncoding) -> Self {
        Self {
            string: string.into(),
            encoding,
        }
    }

    /// Create a UTF-8 body
    pub fn utf8(string: impl Into<String>) -> Self {
        Self::new(string, TextEncoding::Utf8)
    }
}

impl Body for EncodedStringBody {
    fn content_type(&self) -> ContentType {
        ContentType::Text
    }

    fn make_data(&self) -> Result<Vec<u8>, BodyEncodeError> {
        self.encoding
            .encode(&self.string)
            .ok_or_else(|| self.encode_error())
    }
}
