use http::StatusCode;
use thiserror::Error;

use crate::content_type::ContentType;

/// Result type for restpx operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error produced by a transport, forwarded to callers unchanged
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for restpx
///
/// Everything a task can report ends up here: construction failures,
/// response classification failures, and transport errors passed through
/// verbatim.
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be built
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// The response was rejected or could not be decoded
    #[error("HTTP error: {0}")]
    Http(#[from] HttpRequestError),

    /// The transport failed before a response was available
    #[error("Transport error: {0}")]
    Transport(#[source] TransportError),
}

impl Error {
    /// Wrap a transport error without altering it
    pub fn transport(err: impl Into<TransportError>) -> Self {
        Error::Transport(err.into())
    }

    /// Check if this is a transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Check if this is a request construction error
    pub fn is_request(&self) -> bool {
        matches!(self, Error::Request(_))
    }

    /// Get the response classification error, if any
    pub fn as_http(&self) -> Option<&HttpRequestError> {
        match self {
            Error::Http(e) => Some(e),
            _ => None,
        }
    }

    /// Get the original transport error, if any
    pub fn as_transport(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Transport(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    /// Get the rejected status code for `InvalidResponse` errors
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Error::Http(HttpRequestError::InvalidResponse { status_code }) => Some(*status_code),
            _ => None,
        }
    }

    /// Get the raw bytes of a response that failed to decode
    pub fn raw_data(&self) -> Option<&[u8]> {
        match self {
            Error::Http(HttpRequestError::DecodeError { raw_data }) => Some(raw_data),
            _ => None,
        }
    }
}

/// Errors raised while building a request
///
/// All of them are raised before any network activity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The resource location and path do not form a valid URL
    #[error("Invalid URL: the resource location and path do not form a URL")]
    InvalidUrl,

    /// The body could not be serialized
    #[error("Invalid body: {0}")]
    InvalidBody(#[from] BodyEncodeError),

    /// A caller supplied header cannot be sent on the wire
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The number of placeholder values does not match the path
    #[error("Placeholder mismatch: path has {expected} placeholders, {supplied} values supplied")]
    PlaceholderMismatch { expected: usize, supplied: usize },
}

/// Body serialization errors, one per content type
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum BodyEncodeError {
    /// Unable to encode as binary
    #[error("unable to encode body as binary")]
    InvalidBinary,

    /// Unable to encode as GraphQL
    #[error("unable to encode body as GraphQL")]
    InvalidGraphQl,

    /// Unable to encode as JPEG
    #[error("unable to encode body as JPEG")]
    InvalidJpeg,

    /// Unable to encode as JSON
    #[error("unable to encode body as JSON")]
    InvalidJson,

    /// Unable to encode as PNG
    #[error("unable to encode body as PNG")]
    InvalidPng,

    /// Unable to encode as PDF
    #[error("unable to encode body as PDF")]
    InvalidPdf,

    /// Unable to encode as text
    #[error("unable to encode body as text")]
    InvalidString,

    /// Unable to encode as XML
    #[error("unable to encode body as XML")]
    InvalidXml,

    /// Unable to encode as zip
    #[error("unable to encode body as zip")]
    InvalidZip,

    /// Unable to encode as a custom content type
    #[error("unable to encode body as {0}")]
    Invalid(String),
}

impl BodyEncodeError {
    /// Map a content type to its encoding error
    pub fn from_content_type(content_type: &ContentType) -> Self {
        match content_type {
            ContentType::Binary => BodyEncodeError::InvalidBinary,
            ContentType::GraphQl => BodyEncodeError::InvalidGraphQl,
            ContentType::Jpeg => BodyEncodeError::InvalidJpeg,
            ContentType::Json => BodyEncodeError::InvalidJson,
            ContentType::Pdf => BodyEncodeError::InvalidPdf,
            ContentType::Png => BodyEncodeError::InvalidPng,
            ContentType::Text => BodyEncodeError::InvalidString,
            ContentType::Xml => BodyEncodeError::InvalidXml,
            ContentType::Zip => BodyEncodeError::InvalidZip,
            ContentType::Custom(media_type) => BodyEncodeError::Invalid(media_type.clone()),
        }
    }

    /// Get the content type this error belongs to
    pub fn content_type(&self) -> ContentType {
        match self {
            BodyEncodeError::InvalidBinary => ContentType::Binary,
            BodyEncodeError::InvalidGraphQl => ContentType::GraphQl,
            BodyEncodeError::InvalidJpeg => ContentType::Jpeg,
            BodyEncodeError::InvalidJson => ContentType::Json,
            BodyEncodeError::InvalidPdf => ContentType::Pdf,
            BodyEncodeError::InvalidPng => ContentType::Png,
            BodyEncodeError::InvalidString => ContentType::Text,
            BodyEncodeError::InvalidXml => ContentType::Xml,
            BodyEncodeError::InvalidZip => ContentType::Zip,
            BodyEncodeError::Invalid(media_type) => ContentType::Custom(media_type.clone()),
        }
    }
}

/// Errors classifying a completed transport exchange
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpRequestError {
    /// The response carried no HTTP status
    #[error("Unknown response: not an HTTP response")]
    UnknownResponse,

    /// The status validator rejected the response
    #[error("Invalid response status: {status_code}")]
    InvalidResponse { status_code: StatusCode },

    /// The response had no payload to decode
    #[error("Empty response data")]
    EmptyResponseData,

    /// The payload could not be decoded into the resource
    #[error("Unable to decode {} bytes of response data", raw_data.len())]
    DecodeError { raw_data: Vec<u8> },
}
