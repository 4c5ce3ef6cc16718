use std::sync::Arc;

use http::StatusCode;

use crate::error::{Error, HttpRequestError, Result, TransportError};
use crate::request::Request;
use crate::resource::Resource;
use crate::response::{DownloadResponse, StatusValidator, TransportResponse};
use crate::task::{TaskHandle, TaskOptions};
use crate::transport::{ReqwestTransport, Transport, TransportConfig};

/// Executes typed requests over a [`Transport`]
///
/// A session runs data, upload and download tasks, validates the response
/// status and decodes the payload into the request's resource type. Every
/// task produces exactly one outcome: a decoded resource, `None` when the
/// request did not ask for parsing, or an [`Error`].
///
/// Sessions are cheap to clone; clones share the same transport.
///
/// # Examples
///
/// ```rust,no_run
/// use std::borrow::Cow;
/// use restpx::{resource, Request, Resource, Session, StatusValidator};
///
/// #[derive(Debug, serde::Deserialize)]
/// struct Ip {
///     origin: String,
/// }
///
/// impl Resource for Ip {
///     fn location() -> Cow<'static, str> {
///         "https://httpbin.org".into()
///     }
///
///     fn path() -> &'static str {
///         "ip"
///     }
///
///     fn decode(data: &[u8]) -> Option<Self> {
///         resource::decode_json(data)
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let session = Session::new();
///     let request = Request::<Ip>::get()?;
///     let ip = session.data(&request, &StatusValidator::default()).await?;
///     println!("{:?}", ip);
///     Ok(())
/// }
/// ```
pub struct Session<T: Transport = ReqwestTransport> {
    transport: Arc<T>,
}

impl Session<ReqwestTransport> {
    /// Create a session with the default reqwest transport
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }

    /// Create a session with a configured reqwest transport
    pub fn from_config(config: TransportConfig) -> std::result::Result<Self, reqwest::Error> {
        Ok(Self::with_transport(ReqwestTransport::from_config(config)?))
    }
}

impl Default for Session<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport.name())
            .finish()
    }
}

impl<T: Transport + 'static> Session<T> {
    /// Create a session over a transport
    pub fn with_transport(transport: T) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Create a session over a shared transport
    pub fn from_shared(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Get the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run a data task
    pub async fn data<R: Resource>(
        &self,
        request: &Request<R>,
        validator: &StatusValidator,
    ) -> Result<Option<R>> {
        tracing::debug!(method = %request.method(), url = %request.url(), "data task");
        let outcome = self.transport.data(request.raw().clone()).await;
        let body = validate_response(outcome, validator)?;
        finalize(request.parses_result(), body)
    }

    /// Run an upload task with `data` as the payload
    pub async fn upload<R: Resource>(
        &self,
        request: &Request<R>,
        data: Vec<u8>,
        validator: &StatusValidator,
    ) -> Result<Option<R>> {
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            bytes = data.len(),
            "upload task"
        );
        let outcome = self.transport.upload(request.raw().clone(), data).await;
        let body = validate_response(outcome, validator)?;
        finalize(request.parses_result(), body)
    }

    /// Run a download task, continuing from `resume_data` when given
    pub async fn download<R: Resource>(
        &self,
        request: &Request<R>,
        resume_data: Option<Vec<u8>>,
        validator: &StatusValidator,
    ) -> Result<Option<R>> {
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            resumed = resume_data.is_some(),
            "download task"
        );
        let outcome = self.transport.download(request.raw().clone(), resume_data).await;
        let body = self.materialize(outcome, validator).await?;
        finalize(request.parses_result(), Some(body))
    }

    /// Spawn a data task and deliver its outcome to `completion`
    ///
    /// Must be called within a tokio runtime.
    pub fn data_request<R, C>(&self, request: &Request<R>, options: TaskOptions, completion: C) -> TaskHandle
    where
        R: Resource + Send + 'static,
        C: FnOnce(Result<Option<R>>) + Send + 'static,
    {
        let session = self.clone();
        let request = request.clone();
        let TaskOptions { start_immediately, validator } = options;

        TaskHandle::spawn(
            async move { session.data(&request, &validator).await },
            completion,
            start_immediately,
        )
    }

    /// Spawn an upload task and deliver its outcome to `completion`
    ///
    /// Must be called within a tokio runtime.
    pub fn upload_request<R, C>(
        &self,
        request: &Request<R>,
        data: Vec<u8>,
        options: TaskOptions,
        completion: C,
    ) -> TaskHandle
    where
        R: Resource + Send + 'static,
        C: FnOnce(Result<Option<R>>) + Send + 'static,
    {
        let session = self.clone();
        let request = request.clone();
        let TaskOptions { start_immediately, validator } = options;

        TaskHandle::spawn(
            async move { session.upload(&request, data, &validator).await },
            completion,
            start_immediately,
        )
    }

    /// Spawn a download task and deliver its outcome to `completion`
    ///
    /// Must be called within a tokio runtime.
    pub fn download_request<R, C>(
        &self,
        request: &Request<R>,
        resume_data: Option<Vec<u8>>,
        options: TaskOptions,
        completion: C,
    ) -> TaskHandle
    where
        R: Resource + Send + 'static,
        C: FnOnce(Result<Option<R>>) + Send + 'static,
    {
        let session = self.clone();
        let request = request.clone();
        let TaskOptions { start_immediately, validator } = options;

        TaskHandle::spawn(
            async move { session.download(&request, resume_data, &validator).await },
            completion,
            start_immediately,
        )
    }

    /// Validate a download and read its payload into memory
    async fn materialize(
        &self,
        outcome: std::result::Result<DownloadResponse, TransportError>,
        validator: &StatusValidator,
    ) -> Result<Vec<u8>> {
        let response = outcome.map_err(Error::Transport)?;

        if let Err(e) = check_status(response.status, validator) {
            if let Some(location) = &response.location {
                let _ = tokio::fs::remove_file(location).await;
            }
            return Err(e.into());
        }

        let location = response
            .location
            .ok_or(HttpRequestError::EmptyResponseData)?;

        self.transport.read_download(&location).await.map_err(|e| {
            tracing::warn!(path = %location.display(), error = %e, "failed to read downloaded payload");
            Error::from(HttpRequestError::EmptyResponseData)
        })
    }
}

/// Turn a transport outcome into the response payload, or the first failure
fn validate_response(
    outcome: std::result::Result<TransportResponse, TransportError>,
    validator: &StatusValidator,
) -> Result<Option<Vec<u8>>> {
    let response = outcome.map_err(Error::Transport)?;
    check_status(response.status, validator)?;
    Ok(response.body)
}

fn check_status(
    status: Option<StatusCode>,
    validator: &StatusValidator,
) -> std::result::Result<StatusCode, HttpRequestError> {
    let status_code = status.ok_or(HttpRequestError::UnknownResponse)?;
    if !validator.validate(status_code) {
        tracing::warn!(status = %status_code, "response status rejected");
        return Err(HttpRequestError::InvalidResponse { status_code });
    }
    Ok(status_code)
}

/// Decode a validated payload into the resource type
fn finalize<R: Resource>(parse_result: bool, data: Option<Vec<u8>>) -> Result<Option<R>> {
    if !parse_result {
        return Ok(None);
    }

    let data = match data {
        Some(data) if !data.is_empty() => data,
        _ => return Err(HttpRequestError::EmptyResponseData.into()),
    };

    match R::decode(&data) {
        Some(resource) => Ok(Some(resource)),
        None => {
            tracing::warn!(bytes = data.len(), "response data could not be decoded");
            Err(HttpRequestError::DecodeError { raw_data: data }.into())
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::Deserialize;
    use tokio::sync::oneshot;

    use crate::request::RawRequest;
    use crate::resource::decode_json;
    use crate::task::TaskState;

    #[derive(Debug, Deserialize, PartialEq)]
    pub(crate) struct TestResource {
        pub test: String,
    }

    impl Resource for TestResource {
        fn location() -> Cow<'static, str> {
            "http://fake.com".into()
        }

        fn path() -> &'static str {
            "resource"
        }

        fn decode(data: &[u8]) -> Option<Self> {
            decode_json(data)
        }
    }

    pub(crate) const VALID_JSON: &[u8] = br#"{ "test": "value" }"#;

    #[derive(Debug, Default)]
    pub(crate) struct MockTransport {
        status: Option<StatusCode>,
        body: Option<Vec<u8>>,
        failure: Option<String>,
        missing_file: bool,
        delay: Option<Duration>,
        calls: AtomicUsize,
        resume_data: Mutex<Option<Vec<u8>>>,
    }

    impl MockTransport {
        pub(crate) fn responding(status: u16, body: &[u8]) -> Self {
            Self {
                status: StatusCode::from_u16(status).ok(),
                body: Some(body.to_vec()),
                ..Self::default()
            }
        }

        pub(crate) fn empty(status: u16) -> Self {
            Self {
                status: StatusCode::from_u16(status).ok(),
                ..Self::default()
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                failure: Some(message.to_string()),
                ..Self::default()
            }
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn respond(&self) -> std::result::Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = &self.failure {
                return Err(message.clone().into());
            }
            Ok(TransportResponse {
                status: self.status,
                headers: Default::default(),
                body: self.body.clone(),
            })
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn data(&self, _request: RawRequest) -> std::result::Result<TransportResponse, TransportError> {
            self.respond().await
        }

        async fn upload(
            &self,
            _request: RawRequest,
            data: Vec<u8>,
        ) -> std::result::Result<TransportResponse, TransportError> {
            assert!(!data.is_empty());
            self.respond().await
        }

        async fn download(
            &self,
            _request: RawRequest,
            resume_data: Option<Vec<u8>>,
        ) -> std::result::Result<DownloadResponse, TransportError> {
            *self.resume_data.lock().unwrap() = resume_data;
            let response = self.respond().await?;

            let location = if self.missing_file {
                // The directory is gone once this returns
                Some(tempfile::tempdir()?.path().join("missing.download"))
            } else if let Some(body) = response.body {
                let staged = tempfile::Builder::new()
                    .prefix("restpx-test-")
                    .suffix(".download")
                    .tempfile()?;
                tokio::fs::write(staged.path(), body).await?;
                Some(staged.into_temp_path().keep()?)
            } else {
                None
            };

            Ok(DownloadResponse {
                status: response.status,
                headers: response.headers,
                location,
            })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn mock_session(transport: MockTransport) -> Session<MockTransport> {
        Session::with_transport(transport)
    }

    fn request() -> Request<TestResource> {
        Request::get().unwrap()
    }

    fn unparsed_request() -> Request<TestResource> {
        Request::builder().parse_result(false).build().unwrap()
    }

    #[tokio::test]
    async fn test_data_decodes_resource() {
        let session = mock_session(MockTransport::responding(200, VALID_JSON));
        let resource = session.data(&request(), &StatusValidator::default()).await.unwrap();
        assert_eq!(resource, Some(TestResource { test: "value".to_string() }));
    }

    #[tokio::test]
    async fn test_transport_error_is_forwarded() {
        let session = mock_session(MockTransport::failing("connection reset"));
        let err = session.data(&request(), &StatusValidator::default()).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "Transport error: connection reset");
    }

    #[tokio::test]
    async fn test_missing_status_is_unknown_response() {
        let transport = MockTransport {
            body: Some(VALID_JSON.to_vec()),
            ..MockTransport::default()
        };
        let err = mock_session(transport).data(&request(), &StatusValidator::default()).await.unwrap_err();
        assert_eq!(err.as_http(), Some(&HttpRequestError::UnknownResponse));
    }

    #[tokio::test]
    async fn test_rejected_status() {
        let session = mock_session(MockTransport::responding(404, VALID_JSON));
        let err = session.data(&request(), &StatusValidator::default()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND));
        assert_eq!(
            err.as_http(),
            Some(&HttpRequestError::InvalidResponse { status_code: StatusCode::NOT_FOUND })
        );
    }

    #[tokio::test]
    async fn test_default_validator_accepts_server_errors() {
        let session = mock_session(MockTransport::responding(500, VALID_JSON));
        assert!(session.data(&request(), &StatusValidator::default()).await.is_ok());

        let err = session.data(&request(), &StatusValidator::success()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_rejected_status_wins_over_parse_flag() {
        let session = mock_session(MockTransport::responding(401, b""));
        let err = session.data(&unparsed_request(), &StatusValidator::default()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_no_parse_yields_none() {
        let session = mock_session(MockTransport::responding(200, b"not json"));
        let resource = session.data(&unparsed_request(), &StatusValidator::default()).await.unwrap();
        assert!(resource.is_none());

        let session = mock_session(MockTransport::empty(204));
        assert!(session.data(&unparsed_request(), &StatusValidator::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_response_data() {
        let session = mock_session(MockTransport::empty(200));
        let err = session.data(&request(), &StatusValidator::default()).await.unwrap_err();
        assert_eq!(err.as_http(), Some(&HttpRequestError::EmptyResponseData));

        let session = mock_session(MockTransport::responding(200, b""));
        let err = session.data(&request(), &StatusValidator::default()).await.unwrap_err();
        assert_eq!(err.as_http(), Some(&HttpRequestError::EmptyResponseData));
    }

    #[tokio::test]
    async fn test_decode_error_carries_raw_data() {
        let session = mock_session(MockTransport::responding(200, b"<html/>"));
        let err = session.data(&request(), &StatusValidator::default()).await.unwrap_err();
        assert_eq!(err.raw_data(), Some(&b"<html/>"[..]));
    }

    #[tokio::test]
    async fn test_upload() {
        let session = mock_session(MockTransport::responding(201, VALID_JSON));
        let resource = session
            .upload(&request(), b"payload".to_vec(), &StatusValidator::default())
            .await
            .unwrap();
        assert_eq!(resource.unwrap().test, "value");
        assert_eq!(session.transport().calls(), 1);
    }

    #[tokio::test]
    async fn test_download() {
        let session = mock_session(MockTransport::responding(200, VALID_JSON));
        let resource = session
            .download(&request(), Some(b"prior".to_vec()), &StatusValidator::default())
            .await
            .unwrap();
        assert_eq!(resource.unwrap().test, "value");
        assert_eq!(
            session.transport().resume_data.lock().unwrap().as_deref(),
            Some(&b"prior"[..])
        );
    }

    #[tokio::test]
    async fn test_download_without_location() {
        let session = mock_session(MockTransport::empty(200));
        let err = session
            .download(&request(), None, &StatusValidator::default())
            .await
            .unwrap_err();
        assert_eq!(err.as_http(), Some(&HttpRequestError::EmptyResponseData));
    }

    #[tokio::test]
    async fn test_download_unreadable_location() {
        let transport = MockTransport {
            missing_file: true,
            ..MockTransport::responding(200, VALID_JSON)
        };
        let err = mock_session(transport)
            .download(&request(), None, &StatusValidator::default())
            .await
            .unwrap_err();
        assert_eq!(err.as_http(), Some(&HttpRequestError::EmptyResponseData));
    }

    #[tokio::test]
    async fn test_download_rejected_status_removes_file() {
        struct Tracking {
            inner: MockTransport,
            location: Mutex<Option<PathBuf>>,
        }

        #[async_trait]
        impl Transport for Tracking {
            async fn data(&self, r: RawRequest) -> std::result::Result<TransportResponse, TransportError> {
                self.inner.data(r).await
            }

            async fn upload(
                &self,
                r: RawRequest,
                d: Vec<u8>,
            ) -> std::result::Result<TransportResponse, TransportError> {
                self.inner.upload(r, d).await
            }

            async fn download(
                &self,
                r: RawRequest,
                d: Option<Vec<u8>>,
            ) -> std::result::Result<DownloadResponse, TransportError> {
                let response = self.inner.download(r, d).await?;
                *self.location.lock().unwrap() = response.location.clone();
                Ok(response)
            }

            fn name(&self) -> &str {
                "tracking"
            }
        }

        let session = Session::with_transport(Tracking {
            inner: MockTransport::responding(403, VALID_JSON),
            location: Mutex::new(None),
        });
        let err = session
            .download(&request(), None, &StatusValidator::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::FORBIDDEN));

        let location = session.transport().location.lock().unwrap().clone().unwrap();
        assert!(!Path::new(&location).exists());
    }

    #[tokio::test]
    async fn test_data_request_delivers_completion() {
        let session = mock_session(MockTransport::responding(200, VALID_JSON));
        let (tx, rx) = oneshot::channel();

        let handle = session.data_request(&request(), TaskOptions::default(), move |result| {
            let _ = tx.send(result);
        });

        let result = rx.await.unwrap();
        assert_eq!(result.unwrap().unwrap().test, "value");
        assert_eq!(handle.join().await, TaskState::Completed);
    }

    #[tokio::test]
    async fn test_suspended_request_waits_for_resume() {
        let session = mock_session(MockTransport::responding(200, VALID_JSON));
        let (tx, rx) = oneshot::channel();

        let handle = session.upload_request(
            &request(),
            b"payload".to_vec(),
            TaskOptions::suspended(),
            move |result| {
                let _ = tx.send(result);
            },
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(handle.state(), TaskState::Suspended);
        assert_eq!(session.transport().calls(), 0);

        handle.resume();
        assert!(rx.await.unwrap().is_ok());
        assert_eq!(session.transport().calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_request_never_completes() {
        let session = mock_session(MockTransport::responding(200, VALID_JSON).delayed(Duration::from_secs(60)));
        let completed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completed);

        let handle = session.download_request(&request(), None, TaskOptions::default(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::task::yield_now().await;
        handle.cancel();
        assert_eq!(handle.join().await, TaskState::Cancelled);
        assert_eq!(completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_request_options_validator() {
        let session = mock_session(MockTransport::responding(201, VALID_JSON));
        let (tx, rx) = oneshot::channel();

        let options = TaskOptions::new().validator(StatusValidator::only_200());
        session.data_request(&request(), options, move |result| {
            let _ = tx.send(result);
        });

        let err = rx.await.unwrap().unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::CREATED));
    }

    #[test]
    fn test_finalize() {
        assert!(finalize::<TestResource>(false, None).unwrap().is_none());
        assert!(finalize::<TestResource>(true, Some(VALID_JSON.to_vec())).unwrap().is_some());
        assert_eq!(
            finalize::<TestResource>(true, None).unwrap_err().as_http(),
            Some(&HttpRequestError::EmptyResponseData)
        );
    }
}
