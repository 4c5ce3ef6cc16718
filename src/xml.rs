//! Pluggable XML serialization
//!
//! The crate does not ship an XML grammar. Callers provide an [`XmlEncoder`]
//! (or a closure through [`XmlInlineEncoder`]) and wrap the object in an
//! [`XmlBody`].

use std::fmt;

use thiserror::Error;

use crate::body::Body;
use crate::content_type::ContentType;
use crate::error::BodyEncodeError;

/// XML encoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlEncodeError {
    /// Unable to serialize the given object
    #[error("unable to encode object as XML")]
    EncodeError,
}

/// XML decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlDecodeError {
    /// Unable to deserialize the given data
    #[error("unable to decode XML data")]
    DecodeError,
}

/// Serializes objects as XML
pub trait XmlEncoder {
    /// The object this encoder serializes
    type Object;

    /// Serialize the object
    fn encode(&self, object: &Self::Object) -> Result<Vec<u8>, XmlEncodeError>;
}

/// Deserializes XML into objects
pub trait XmlDecoder {
    /// The object this decoder produces
    type Object;

    /// Deserialize the data
    fn decode(&self, data: &[u8]) -> Result<Self::Object, XmlDecodeError>;
}

/// An XML encoder backed by a closure
pub struct XmlInlineEncoder<T, F> {
    encode: F,
    _object: std::marker::PhantomData<fn(&T)>,
}

impl<T, F> XmlInlineEncoder<T, F>
where
    F: Fn(&T) -> Option<Vec<u8>>,
{
    pub fn new(encode: F) -> Self {
        Self {
            encode,
            _object: std::marker::PhantomData,
        }
    }
}

impl<T, F> XmlEncoder for XmlInlineEncoder<T, F>
where
    F: Fn(&T) -> Option<Vec<u8>>,
{
    type Object = T;

    fn encode(&self, object: &T) -> Result<Vec<u8>, XmlEncodeError> {
        (self.encode)(object).ok_or(XmlEncodeError::EncodeError)
    }
}

impl<T, F> fmt::Debug for XmlInlineEncoder<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlInlineEncoder").finish_non_exhaustive()
    }
}

/// An XML decoder backed by a closure
pub struct XmlInlineDecoder<T, F> {
    decode: F,
    _object: std::marker::PhantomData<fn() -> T>,
}

impl<T, F> XmlInlineDecoder<T, F>
where
    F: Fn(&[u8]) -> Option<T>,
{
    pub fn new(decode: F) -> Self {
        Self {
            decode,
            _object: std::marker::PhantomData,
        }
    }
}

impl<T, F> XmlDecoder for XmlInlineDecoder<T, F>
where
    F: Fn(&[u8]) -> Option<T>,
{
    type Object = T;

    fn decode(&self, data: &[u8]) -> Result<T, XmlDecodeError> {
        (self.decode)(data).ok_or(XmlDecodeError::DecodeError)
    }
}

impl<T, F> fmt::Debug for XmlInlineDecoder<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlInlineDecoder").finish_non_exhaustive()
    }
}

/// An object serialized as XML by an injected encoder
pub struct XmlBody<E: XmlEncoder> {
    object: E::Object,
    encoder: E,
}

impl<E: XmlEncoder> XmlBody<E> {
    /// Create an XML body for `object`, serialized by `encoder`
    pub fn new(object: E::Object, encoder: E) -> Self {
        Self { object, encoder }
    }
}

impl<E: XmlEncoder> Body for XmlBody<E> {
    fn content_type(&self) -> ContentType {
        ContentType::Xml
    }

    fn make_data(&self) -> Result<Vec<u8>, BodyEncodeError> {
        self.encoder.encode(&self.object).map_err(|_| self.encode_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note {
        text: String,
    }

    fn note_encoder() -> impl XmlEncoder<Object = Note> {
        XmlInlineEncoder::new(|note: &Note| {
            if note.text.is_empty() {
                None
            } else {
                Some(format!("<note>{}</note>", note.text).into_bytes())
            }
        })
    }

    #[test]
    fn test_xml_body() {
        let body = XmlBody::new(Note { text: "hi".to_string() }, note_encoder());
        assert_eq!(body.content_type(), ContentType::Xml);
        assert_eq!(body.make_data().unwrap(), b"<note>hi</note>".to_vec());
    }

    #[test]
    fn test_xml_body_failure() {
        let body = XmlBody::new(Note { text: String::new() }, note_encoder());
        assert_eq!(body.make_data(), Err(BodyEncodeError::InvalidXml));
    }

    #[test]
    fn test_inline_decoder() {
        let decoder = XmlInlineDecoder::new(|data: &[u8]| {
            let text = std::str::from_utf8(data).ok()?;
            let inner = text.strip_prefix("<note>")?.strip_suffix("</note>")?;
            Some(inner.to_string())
        });

        assert_eq!(decoder.decode(b"<note>hi</note>"), Ok("hi".to_string()));
        assert_eq!(decoder.decode(b"<other/>"), Err(XmlDecodeError::DecodeError));
    }
}
