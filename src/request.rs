use std::fmt;
use std::marker::PhantomData;

use http::header::{HeaderName, ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use url::Url;

use crate::auth::{Authentication, AUTHENTICATION_HEADER};
use crate::body::Body;
use crate::content_type::ContentType;
use crate::error::RequestError;
use crate::resource::{Query, Resource};

/// HTTP methods available to requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Get the wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire-level request handed to a transport
#[derive(Clone)]
pub struct RawRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl RawRequest {
    /// Create a request without headers or body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get mutable access to headers
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get a header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the body
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Replace the body
    pub fn set_body(&mut self, body: Option<Vec<u8>>) {
        self.body = body;
    }

    /// Convert to reqwest request
    pub fn into_reqwest_request(self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method, self.url);
        *request.headers_mut() = self.headers;
        if let Some(body) = self.body {
            *request.body_mut() = Some(body.into());
        }
        request
    }
}

impl fmt::Debug for RawRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|b| format!("{} bytes", b.len())))
            .finish()
    }
}

/// A fully built request bound to a resource type
///
/// Built once by [`RequestBuilder::build`] and never mutated afterwards, so
/// it can be shared and reused across tasks.
///
/// # Examples
///
/// ```rust
/// use std::borrow::Cow;
/// use restpx::{resource, Authentication, HttpMethod, Request, Resource};
///
/// #[derive(serde::Deserialize)]
/// struct Status {
///     ok: bool,
/// }
///
/// impl Resource for Status {
///     fn location() -> Cow<'static, str> {
///         "https://api.example.com".into()
///     }
///
///     fn path() -> &'static str {
///         "status"
///     }
///
///     fn decode(data: &[u8]) -> Option<Self> {
///         resource::decode_json(data)
///     }
/// }
///
/// let request = Request::<Status>::builder()
///     .method(HttpMethod::Get)
///     .authentication(Authentication::oauth2("Bearer", "token"))
///     .query([("verbose", "true")])
///     .build()
///     .unwrap();
///
/// assert_eq!(request.url().as_str(), "https://api.example.com/status?verbose=true");
/// assert_eq!(request.header("Accept"), Some("application/json"));
/// ```
pub struct Request<R> {
    raw: RawRequest,
    accept: Option<ContentType>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Request<R> {
    /// Create a new request builder
    pub fn builder<'a>() -> RequestBuilder<'a, R> {
        RequestBuilder::new()
    }

    /// Build a GET request with default options
    pub fn get() -> Result<Self, RequestError> {
        Self::builder().build()
    }
}

impl<R> Request<R> {
    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        self.raw.method()
    }

    /// Get the URL
    pub fn url(&self) -> &Url {
        self.raw.url()
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        self.raw.headers()
    }

    /// Get a header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw.header(name)
    }

    /// Get the body
    pub fn body(&self) -> Option<&[u8]> {
        self.raw.body()
    }

    /// The content type the response is decoded from, if parsing was requested
    pub fn accept(&self) -> Option<&ContentType> {
        self.accept.as_ref()
    }

    /// Check if the response should be decoded into the resource
    pub fn parses_result(&self) -> bool {
        self.accept.is_some()
    }

    /// Get the wire-level request
    pub fn raw(&self) -> &RawRequest {
        &self.raw
    }
}

impl<R> Clone for Request<R> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            accept: self.accept.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R> fmt::Debug for Request<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("resource", &std::any::type_name::<R>())
            .field("raw", &self.raw)
            .field("accept", &self.accept)
            .finish()
    }
}

/// Builder for creating requests
///
/// Defaults: no authentication, `GET`, no query, no headers, no body, no
/// placeholders, and the response is parsed.
///
/// Headers are applied in a fixed order where the last writer wins: caller
/// headers, then `Authentication`, then the body's `Content-Type`, then
/// `Accept`.
pub struct RequestBuilder<'a, R> {
    authentication: Authentication,
    method: HttpMethod,
    query: Option<Box<dyn Query + 'a>>,
    headers: Vec<(String, String)>,
    body: Option<Box<dyn Body + 'a>>,
    placeholders: Vec<String>,
    parse_result: bool,
    _resource: PhantomData<fn() -> R>,
}

impl<'a, R: Resource> RequestBuilder<'a, R> {
    /// Create a new request builder
    pub fn new() -> Self {
        Self {
            authentication: Authentication::None,
            method: HttpMethod::Get,
            query: None,
            headers: Vec::new(),
            body: None,
            placeholders: Vec::new(),
            parse_result: true,
            _resource: PhantomData,
        }
    }

    /// Set the authentication
    pub fn authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = authentication;
        self
    }

    /// Set the HTTP method
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the query parameters
    pub fn query(mut self, query: impl Query + 'a) -> Self {
        self.query = Some(Box::new(query));
        self
    }

    /// Add a header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Add multiple headers, in order
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the body
    pub fn body(mut self, body: impl Body + 'a) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    /// Set the values substituted for placeholders in the resource path
    pub fn placeholders<I, S>(mut self, placeholders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.placeholders = placeholders.into_iter().map(Into::into).collect();
        self
    }

    /// Set whether the response should be decoded into the resource
    pub fn parse_result(mut self, parse_result: bool) -> Self {
        self.parse_result = parse_result;
        self
    }

    /// Build the request
    ///
    /// Nothing is produced on failure: an invalid URL, header or body aborts
    /// the whole build.
    pub fn build(self) -> Result<Request<R>, RequestError> {
        let placeholders: Vec<&str> = self.placeholders.iter().map(String::as_str).collect();
        let mut url = R::url(&placeholders)?;

        if let Some(query) = &self.query {
            let parameters = query.parameters();
            if !parameters.is_empty() {
                url.query_pairs_mut().extend_pairs(parameters);
            }
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            insert_header(&mut headers, name, value)?;
        }

        if let Some(encoded) = self.authentication.encoded() {
            insert_header(&mut headers, AUTHENTICATION_HEADER, &encoded)?;
        }

        let body = match &self.body {
            Some(body) => {
                let data = body.make_data()?;
                insert_header(&mut headers, CONTENT_TYPE.as_str(), body.content_type().as_str())?;
                Some(data)
            }
            None => None,
        };

        let accept = self.parse_result.then(R::accepted_content_type);
        if let Some(accept) = &accept {
            insert_header(&mut headers, ACCEPT.as_str(), accept.as_str())?;
        }

        tracing::trace!(
            method = self.method.as_str(),
            url = %url,
            headers = headers.len(),
            body = body.as_ref().map(Vec::len),
            "built request"
        );

        Ok(Request {
            raw: RawRequest {
                method: self.method.into(),
                url,
                headers,
                body,
            },
            accept,
            _resource: PhantomData,
        })
    }
}

impl<'a, R: Resource> Default for RequestBuilder<'a, R> {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), RequestError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| RequestError::InvalidHeader(name.to_string()))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|_| RequestError::InvalidHeader(name.to_string()))?;
    headers.insert(header_name, header_value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BodyEncodeError;
    use crate::resource::decode_json;
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use serde::Deserialize;
    use std::borrow::Cow;

    #[derive(Debug, Deserialize)]
    struct TestResource {
        #[allow(dead_code)]
        test: String,
    }

    impl Resource for TestResource {
        fn location() -> Cow<'static, str> {
            "http://fake.com".into()
        }

        fn path() -> &'static str {
            "resource"
        }

        fn accepted_content_type() -> ContentType {
            ContentType::Png
        }

        fn decode(data: &[u8]) -> Option<Self> {
            decode_json(data)
        }
    }

    struct DynamicResource;

    impl Resource for DynamicResource {
        fn location() -> Cow<'static, str> {
            "http://fake.com".into()
        }

        fn path() -> &'static str {
            "resource{p}"
        }

        fn decode(_data: &[u8]) -> Option<Self> {
            Some(DynamicResource)
        }
    }

    struct KeyedResource;

    impl Resource for KeyedResource {
        fn location() -> Cow<'static, str> {
            "http://fake.com/api?key=1".into()
        }

        fn path() -> &'static str {
            "files/{p}"
        }

        fn decode(_data: &[u8]) -> Option<Self> {
            Some(KeyedResource)
        }
    }

    struct MockBody {
        return_data: bool,
        content_type: ContentType,
    }

    impl Body for MockBody {
        fn content_type(&self) -> ContentType {
            self.content_type.clone()
        }

        fn make_data(&self) -> Result<Vec<u8>, BodyEncodeError> {
            if self.return_data {
                Ok(b"payload".to_vec())
            } else {
                Err(self.encode_error())
            }
        }
    }

    fn failing(content_type: ContentType) -> MockBody {
        MockBody {
            return_data: false,
            content_type,
        }
    }

    #[test]
    fn test_default_request() {
        let request = Request::<TestResource>::get().unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.url().as_str(), "http://fake.com/resource");
        assert_eq!(request.header("Accept"), Some("application/png"));
        assert!(request.parses_result());
        assert!(request.body().is_none());
        assert_eq!(request.headers().len(), 1);
    }

    #[test]
    fn test_without_parsing() {
        let request = Request::<TestResource>::builder()
            .parse_result(false)
            .build()
            .unwrap();
        assert_eq!(request.header("Accept"), None);
        assert!(!request.parses_result());
        assert!(request.headers().is_empty());
    }

    #[test]
    fn test_methods() {
        for (method, expected) in [
            (HttpMethod::Get, Method::GET),
            (HttpMethod::Post, Method::POST),
            (HttpMethod::Put, Method::PUT),
            (HttpMethod::Patch, Method::PATCH),
            (HttpMethod::Delete, Method::DELETE),
        ] {
            let request = Request::<TestResource>::builder().method(method).build().unwrap();
            assert_eq!(request.method(), &expected);
        }
    }

    #[test]
    fn test_query() {
        let request = Request::<TestResource>::builder()
            .query(vec![("test1", "true"), ("test2", "Test"), ("test3", "5")])
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("test1=true&test2=Test&test3=5"));
        assert_eq!(
            request.url().as_str(),
            "http://fake.com/resource?test1=true&test2=Test&test3=5"
        );
    }

    #[test]
    fn test_query_is_url_encoded() {
        let request = Request::<TestResource>::builder()
            .query([("q", "a b&c")])
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("q=a+b%26c"));
    }

    #[test]
    fn test_empty_query_leaves_url_untouched() {
        let request = Request::<TestResource>::builder()
            .query(Vec::<(String, String)>::new())
            .build()
            .unwrap();
        assert_eq!(request.url().query(), None);
    }

    #[test]
    fn test_placeholder() {
        let request = Request::<DynamicResource>::builder()
            .placeholders(["1234"])
            .build()
            .unwrap();
        assert!(request.url().as_str().contains("resource1234"));
    }

    #[test]
    fn test_query_extends_location_query() {
        let request = Request::<KeyedResource>::builder()
            .placeholders(["items"])
            .query([("page", "2")])
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/api/files/items");
        assert_eq!(request.url().query(), Some("key=1&page=2"));
    }

    #[test]
    fn test_reserved_placeholder_stays_in_path() {
        let request = Request::<KeyedResource>::builder()
            .placeholders(["a?b#c"])
            .query([("page", "2")])
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/api/files/a%3Fb%23c");
        assert_eq!(request.url().query(), Some("key=1&page=2"));
        assert!(request.url().fragment().is_none());
    }

    #[test]
    fn test_placeholder_mismatch() {
        let err = Request::<DynamicResource>::get().unwrap_err();
        assert_eq!(err, RequestError::PlaceholderMismatch { expected: 1, supplied: 0 });
    }

    #[test]
    fn test_headers() {
        let request = Request::<TestResource>::builder()
            .header("a", "b")
            .build()
            .unwrap();
        assert_eq!(request.header("a"), Some("b"));
        assert!(request.header(AUTHENTICATION_HEADER).is_none());
        assert_eq!(request.headers().len(), 2);
    }

    #[test]
    fn test_authentication() {
        let request = Request::<TestResource>::builder()
            .authentication(Authentication::basic("user", "secret"))
            .build()
            .unwrap();
        let expected = format!("Basic {}", BASE64.encode("user:secret"));
        assert_eq!(request.header("Authentication"), Some(expected.as_str()));

        let request = Request::<TestResource>::builder()
            .authentication(Authentication::oauth2("name", "secret"))
            .build()
            .unwrap();
        assert_eq!(request.header("Authentication"), Some("name secret"));
    }

    #[test]
    fn test_overlapping_headers() {
        let body = MockBody {
            return_data: true,
            content_type: ContentType::Xml,
        };
        let request = Request::<TestResource>::builder()
            .authentication(Authentication::oauth2("oauth", "secret"))
            .headers([
                ("Accept", "application/jpg"),
                ("Content-Type", "application/text"),
                ("Authentication", "TestAuth"),
                ("test-header", "test"),
            ])
            .body(body)
            .build()
            .unwrap();

        assert_eq!(request.header("Accept"), Some("application/png"));
        assert_eq!(request.header("Content-Type"), Some("application/xml"));
        assert_eq!(request.header("Authentication"), Some("oauth secret"));
        assert_eq!(request.header("test-header"), Some("test"));
    }

    #[test]
    fn test_derived_headers_win_regardless_of_case() {
        let request = Request::<TestResource>::builder()
            .header("accept", "application/jpg")
            .build()
            .unwrap();
        assert_eq!(request.headers().get_all("Accept").iter().count(), 1);
        assert_eq!(request.header("Accept"), Some("application/png"));
    }

    #[test]
    fn test_valid_body() {
        let body = MockBody {
            return_data: true,
            content_type: ContentType::Json,
        };
        let request = Request::<TestResource>::builder().body(&body).build().unwrap();
        assert_eq!(request.body(), Some(&b"payload"[..]));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_invalid_body_for_every_content_type() {
        let cases = [
            (ContentType::Binary, BodyEncodeError::InvalidBinary),
            (ContentType::GraphQl, BodyEncodeError::InvalidGraphQl),
            (ContentType::Jpeg, BodyEncodeError::InvalidJpeg),
            (ContentType::Json, BodyEncodeError::InvalidJson),
            (ContentType::Png, BodyEncodeError::InvalidPng),
            (ContentType::Pdf, BodyEncodeError::InvalidPdf),
            (ContentType::Text, BodyEncodeError::InvalidString),
            (ContentType::Xml, BodyEncodeError::InvalidXml),
            (ContentType::Zip, BodyEncodeError::InvalidZip),
            (
                ContentType::custom("text/csv"),
                BodyEncodeError::Invalid("text/csv".to_string()),
            ),
        ];

        for (content_type, expected) in cases {
            let err = Request::<TestResource>::builder()
                .body(failing(content_type))
                .build()
                .unwrap_err();
            assert_eq!(err, RequestError::InvalidBody(expected));
        }
    }

    #[test]
    fn test_invalid_header() {
        let err = Request::<TestResource>::builder()
            .header("bad header", "x")
            .build()
            .unwrap_err();
        assert_eq!(err, RequestError::InvalidHeader("bad header".to_string()));
    }

    #[test]
    fn test_into_reqwest_request() {
        let request = Request::<TestResource>::builder()
            .method(HttpMethod::Post)
            .body(vec![1u8, 2, 3])
            .build()
            .unwrap();

        let reqwest_request = request.raw().clone().into_reqwest_request();
        assert_eq!(reqwest_request.method(), &Method::POST);
        assert_eq!(reqwest_request.url().as_str(), "http://fake.com/resource");
        assert_eq!(
            reqwest_request.body().and_then(|b| b.as_bytes()),
            Some(&[1u8, 2, 3][..])
        );
        assert_eq!(
            reqwest_request.headers().get("Content-Type").unwrap(),
            "application/octet-stream"
        );
    }
}
