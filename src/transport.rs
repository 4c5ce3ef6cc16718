use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use http::header::RANGE;
use http::{HeaderValue, StatusCode};
use reqwest::Client as ReqwestClient;
use tokio::io::AsyncWriteExt;

use crate::error::TransportError;
use crate::request::RawRequest;
use crate::response::{DownloadResponse, TransportResponse};

/// Transport trait for network I/O
///
/// This trait abstracts the layer that actually talks to the network. A
/// transport performs one exchange per call and reports the raw outcome;
/// validation and decoding happen in [`Session`](crate::Session).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the response payload in memory
    async fn data(&self, request: RawRequest) -> Result<TransportResponse, TransportError>;

    /// Send `data` as the request payload
    async fn upload(&self, request: RawRequest, data: Vec<u8>) -> Result<TransportResponse, TransportError>;

    /// Download the response payload to a temporary location, continuing
    /// from `resume_data` when given
    async fn download(
        &self,
        request: RawRequest,
        resume_data: Option<Vec<u8>>,
    ) -> Result<DownloadResponse, TransportError>;

    /// Read a downloaded payload into memory and remove the temporary file
    async fn read_download(&self, location: &Path) -> std::io::Result<Vec<u8>> {
        let data = tokio::fs::read(location).await?;
        if let Err(e) = tokio::fs::remove_file(location).await {
            tracing::debug!(path = %location.display(), error = %e, "failed to remove downloaded file");
        }
        Ok(data)
    }

    /// Get the transport name
    fn name(&self) -> &str;
}

/// Transport configuration
#[derive(Clone, Debug, Default)]
pub struct TransportConfig {
    /// Overall request timeout
    pub timeout: Option<Duration>,
    /// Connection establishment timeout
    pub connect_timeout: Option<Duration>,
    /// User agent sent with every request
    pub user_agent: Option<String>,
    /// Directory for temporary download files
    pub download_dir: Option<PathBuf>,
}

impl TransportConfig {
    /// Get the directory for temporary download files
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Transport builder for creating transport configurations
#[derive(Debug, Default)]
pub struct TransportBuilder {
    config: TransportConfig,
}

impl TransportBuilder {
    /// Create a new transport builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the overall request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.config.user_agent = Some(user_agent.to_string());
        self
    }

    /// Set the directory for temporary download files
    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = Some(dir.into());
        self
    }

    /// Build the transport configuration
    pub fn build(self) -> TransportConfig {
        self.config
    }
}

/// Default transport implementation using reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
    config: TransportConfig,
}

impl ReqwestTransport {
    /// Create a transport with default settings
    pub fn new() -> Self {
        Self::with_client(ReqwestClient::new(), TransportConfig::default())
    }

    /// Create a transport from a configuration
    pub fn from_config(config: TransportConfig) -> Result<Self, reqwest::Error> {
        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        Ok(Self::with_client(builder.build()?, config))
    }

    /// Create a transport around an existing reqwest client
    pub fn with_client(client: ReqwestClient, config: TransportConfig) -> Self {
        Self { client, config }
    }

    /// Get the underlying reqwest client
    pub fn client(&self) -> &ReqwestClient {
        &self.client
    }

    /// Get the transport configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, TransportError> {
        tracing::debug!(method = %request.method(), url = %request.url(), "sending request");
        let response = self.client.execute(request).await?;
        tracing::debug!(status = %response.status(), url = %response.url(), "received response");
        Ok(response)
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn data(&self, request: RawRequest) -> Result<TransportResponse, TransportError> {
        let response = self.execute(request.into_reqwest_request()).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(TransportResponse {
            status: Some(status),
            headers,
            body: (!body.is_empty()).then(|| body.to_vec()),
        })
    }

    async fn upload(&self, mut request: RawRequest, data: Vec<u8>) -> Result<TransportResponse, TransportError> {
        request.set_body(Some(data));
        self.data(request).await
    }

    async fn download(
        &self,
        request: RawRequest,
        resume_data: Option<Vec<u8>>,
    ) -> Result<DownloadResponse, TransportError> {
        let mut request = request.into_reqwest_request();
        let resume_data = resume_data.filter(|data| !data.is_empty());
        if let Some(prior) = &resume_data {
            let range = HeaderValue::from_str(&format!("bytes={}-", prior.len()))?;
            request.headers_mut().insert(RANGE, range);
        }

        let response = self.execute(request).await?;
        let status = response.status();
        let headers = response.headers().clone();

        // Staged file is removed on drop unless kept below
        let staged = tempfile::Builder::new()
            .prefix("restpx-")
            .suffix(".download")
            .tempfile_in(self.config.download_dir())?;
        let mut file = tokio::fs::File::from_std(staged.reopen()?);

        // Only a partial response continues the prior bytes
        if let Some(prior) = resume_data.as_ref().filter(|_| status == StatusCode::PARTIAL_CONTENT) {
            file.write_all(prior).await?;
        }

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        drop(file);

        let location = staged.into_temp_path().keep()?;
        tracing::debug!(path = %location.display(), status = %status, "download stored");

        Ok(DownloadResponse {
            status: Some(status),
            headers,
            location: Some(location),
        })
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}
