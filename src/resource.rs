use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use url::Url;

use crate::content_type::ContentType;
use crate::error::RequestError;

/// A typed, remotely addressable entity
///
/// A resource describes where it lives and how to decode it. It is defined
/// once per endpoint type; the URL is computed on demand by [`Resource::url`].
///
/// # Examples
///
/// ```rust
/// use std::borrow::Cow;
/// use restpx::{resource, Resource};
///
/// #[derive(serde::Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// impl Resource for User {
///     fn location() -> Cow<'static, str> {
///         "https://api.example.com".into()
///     }
///
///     fn path() -> &'static str {
///         "users/{p}"
///     }
///
///     fn decode(data: &[u8]) -> Option<Self> {
///         resource::decode_json(data)
///     }
/// }
///
/// let url = User::url(&["42"]).unwrap();
/// assert_eq!(url.as_str(), "https://api.example.com/users/42");
/// ```
pub trait Resource: Sized {
    /// Token in [`Resource::path`] replaced by placeholder values
    const PLACEHOLDER: &'static str = "{p}";

    /// The base URL of the resource
    fn location() -> Cow<'static, str>;

    /// The path of the resource, relative to the location
    fn path() -> &'static str;

    /// The content type the resource is decoded from
    fn accepted_content_type() -> ContentType {
        ContentType::Json
    }

    /// Decode the resource, or `None` if the data is not valid
    fn decode(data: &[u8]) -> Option<Self>;

    /// Resolve the full URL
    ///
    /// Placeholders are substituted left to right and every path segment is
    /// appended to the location's path percent-encoded, so substituted
    /// values never introduce a query or fragment. A query carried by the
    /// location is kept.
    fn url(placeholders: &[&str]) -> Result<Url, RequestError> {
        let segments = resolve_segments(Self::path(), Self::PLACEHOLDER, placeholders)?;
        append_segments(&Self::location(), &segments)
    }
}

/// Decode JSON data into `T`
pub fn decode_json<T: DeserializeOwned>(data: &[u8]) -> Option<T> {
    match serde_json::from_slice(data) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "JSON resource decoding failed");
            None
        }
    }
}

/// Split `path` into non-empty segments with placeholders substituted
fn resolve_segments(
    path: &str,
    placeholder: &str,
    values: &[&str],
) -> Result<Vec<String>, RequestError> {
    let expected = if placeholder.is_empty() {
        0
    } else {
        path.matches(placeholder).count()
    };
    if expected != values.len() {
        return Err(RequestError::PlaceholderMismatch {
            expected,
            supplied: values.len(),
        });
    }

    let mut values = values.iter();
    Ok(path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| substitute(segment, placeholder, &mut values))
        .collect())
}

fn substitute(segment: &str, placeholder: &str, values: &mut std::slice::Iter<'_, &str>) -> String {
    if placeholder.is_empty() {
        return segment.to_string();
    }

    let mut resolved = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(index) = rest.find(placeholder) {
        resolved.push_str(&rest[..index]);
        resolved.push_str(values.next().copied().unwrap_or_default());
        rest = &rest[index + placeholder.len()..];
    }
    resolved.push_str(rest);
    resolved
}

fn append_segments(location: &str, segments: &[String]) -> Result<Url, RequestError> {
    let mut url = Url::parse(location).map_err(|_| RequestError::InvalidUrl)?;
    if url.cannot_be_a_base() {
        return Err(RequestError::InvalidUrl);
    }

    if !segments.is_empty() {
        url.path_segments_mut()
            .map_err(|_| RequestError::InvalidUrl)?
            .pop_if_empty()
            .extend(segments);
    }
    Ok(url)
}

/// Key/value parameters appended to a request URL
pub trait Query {
    /// The parameters, in the order they should appear in the query string
    fn parameters(&self) -> Vec<(String, String)>;
}

impl<Q: Query + ?Sized> Query for &Q {
    fn parameters(&self) -> Vec<(String, String)> {
        (**self).parameters()
    }
}

impl<K: ToString, V: ToString> Query for [(K, V)] {
    fn parameters(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl<K: ToString, V: ToString, const N: usize> Query for [(K, V); N] {
    fn parameters(&self) -> Vec<(String, String)> {
        self.as_slice().parameters()
    }
}

impl<K: ToString, V: ToString> Query for Vec<(K, V)> {
    fn parameters(&self) -> Vec<(String, String)> {
        self.as_slice().parameters()
    }
}

impl<K: ToString, V: ToString> Query for BTreeMap<K, V> {
    fn parameters(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

/// Parameters follow the map's iteration order, which is unspecified
impl<K: ToString, V: ToString, S> Query for HashMap<K, V, S> {
    fn parameters(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
