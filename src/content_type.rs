use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Media types used for request bodies and accepted responses
///
/// Every variant maps to a canonical MIME string. Two content types are equal
/// when their canonical strings are equal, so `Custom("application/json")`
/// compares equal to `Json`.
#[derive(Debug, Clone)]
pub enum ContentType {
    /// Binary data
    Binary,
    /// GraphQL body
    GraphQl,
    /// JPEG image
    Jpeg,
    /// JSON body or response
    Json,
    /// PDF document
    Pdf,
    /// PNG image
    Png,
    /// Plain text
    Text,
    /// XML body or response
    Xml,
    /// Zipped payload
    Zip,
    /// Any other media type, carried verbatim
    Custom(String),
}

impl ContentType {
    /// Get the canonical MIME string
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::Binary => "application/octet-stream",
            ContentType::GraphQl => "application/graphql",
            ContentType::Jpeg => "application/jpeg",
            ContentType::Json => "application/json",
            ContentType::Pdf => "application/pdf",
            ContentType::Png => "application/png",
            ContentType::Text => "application/text",
            ContentType::Xml => "application/xml",
            ContentType::Zip => "application/zip",
            ContentType::Custom(media_type) => media_type,
        }
    }

    /// Create a custom content type
    pub fn custom(media_type: impl Into<String>) -> Self {
        ContentType::Custom(media_type.into())
    }

    /// Check if this is a custom content type
    pub fn is_custom(&self) -> bool {
        matches!(self, ContentType::Custom(_))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for ContentType {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ContentType {}

impl Hash for ContentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl FromStr for ContentType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "application/octet-stream" => ContentType::Binary,
            "application/graphql" => ContentType::GraphQl,
            "application/jpeg" => ContentType::Jpeg,
            "application/json" => ContentType::Json,
            "application/pdf" => ContentType::Pdf,
            "application/png" => ContentType::Png,
            "application/text" => ContentType::Text,
            "application/xml" => ContentType::Xml,
            "application/zip" => ContentType::Zip,
            other => ContentType::Custom(other.to_string()),
        })
    }
}

impl From<&str> for ContentType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(content_type) => content_type,
            Err(never) => match never {},
        }
    }
}
