//! RestPX - Typed resource requests for Rust
//!
//! RestPX turns HTTP endpoints into typed resources. A [`Resource`] declares
//! where it lives and how it is decoded; a [`Request`] is built against it
//! with a declarative [`RequestBuilder`]; a [`Session`] executes the request
//! over a pluggable [`Transport`] and hands back the decoded resource.
//!
//! ## Features
//!
//! - **Declarative requests** with authentication, query parameters, headers,
//!   path placeholders and typed bodies
//! - **Typed bodies** for JSON, text, PDF, JPEG/PNG images, XML and GraphQL
//! - **Data, upload and download tasks** with suspend, resume and cancel
//! - **Status validation** with a replaceable policy
//! - **Single-item streams** with optional background-work tokens
//! - **Pluggable transports**, with a reqwest transport out of the box
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::borrow::Cow;
//! use restpx::{resource, Authentication, HttpMethod, JsonBody, Request, Resource, Session, StatusValidator};
//!
//! #[derive(Debug, serde::Deserialize)]
//! struct Post {
//!     id: u64,
//!     title: String,
//! }
//!
//! impl Resource for Post {
//!     fn location() -> Cow<'static, str> {
//!         "https://jsonplaceholder.typicode.com".into()
//!     }
//!
//!     fn path() -> &'static str {
//!         "posts/{p}"
//!     }
//!
//!     fn decode(data: &[u8]) -> Option<Self> {
//!         resource::decode_json(data)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = Request::<Post>::builder()
//!         .method(HttpMethod::Put)
//!         .authentication(Authentication::basic("user", "secret"))
//!         .placeholders(["1"])
//!         .body(JsonBody::new(serde_json::json!({ "title": "updated" })))
//!         .build()?;
//!
//!     let session = Session::new();
//!     let post = session.data(&request, &StatusValidator::default()).await?;
//!     println!("{:?}", post);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod body;
pub mod body_image;
pub mod content_type;
pub mod error;
pub mod graphql;
pub mod reactive;
pub mod request;
pub mod resource;
pub mod response;
pub mod session;
pub mod task;
pub mod transport;
pub mod xml;

// Re-export main types for convenience
pub use auth::{Authentication, AUTHENTICATION_HEADER};
pub use body::{Body, EncodedStringBody, JsonBody, JsonEncoding, PdfBody, TextEncoding};
pub use body_image::ImageBody;
pub use content_type::ContentType;
pub use error::{BodyEncodeError, Error, HttpRequestError, RequestError, Result, TransportError};
pub use graphql::{GraphQlBody, GraphQlEncoder, GraphQlDecoder, GraphQlQueryType};
pub use reactive::{BackgroundExecution, BackgroundToken, ExpirationHandler, ResourceStream};
pub use request::{HttpMethod, RawRequest, Request, RequestBuilder};
pub use resource::{Query, Resource};
pub use response::{DownloadResponse, StatusValidator, TransportResponse};
pub use session::Session;
pub use task::{TaskHandle, TaskOptions, TaskState};
pub use transport::{ReqwestTransport, Transport, TransportBuilder, TransportConfig};
pub use xml::{XmlBody, XmlDecoder, XmlEncoder};

// Re-export common HTTP types
pub use http::{HeaderMap, HeaderValue, Method, StatusCode};

// Re-export URL types
pub use url::Url;

// Re-export common traits
pub use async_trait::async_trait;
