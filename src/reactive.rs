//! Stream adapters
//!
//! Each session task can be consumed as a single-item [`Stream`]. The stream
//! is lazy: the task starts on first poll, yields exactly one outcome and
//! then ends.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::stream::{FusedStream, Stream};
use futures::FutureExt;

use crate::error::Result;
use crate::request::Request;
use crate::resource::Resource;
use crate::response::StatusValidator;
use crate::session::Session;
use crate::transport::Transport;

/// Opaque token for a unit of background work
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct BackgroundToken(pub u64);

/// Called by the host when the background time granted to a token runs out
pub type ExpirationHandler = Box<dyn FnOnce() + Send + 'static>;

/// Host capability that keeps work alive while the application is
/// backgrounded
pub trait BackgroundExecution: Send + Sync {
    /// Register background work and return its token
    ///
    /// The host calls `on_expiration`, if given, when the granted time runs
    /// out before the token is released.
    fn begin(&self, name: &str, on_expiration: Option<ExpirationHandler>) -> BackgroundToken;

    /// Release a token returned by [`BackgroundExecution::begin`]
    fn end(&self, token: BackgroundToken);
}

/// Releases its token exactly once
struct BackgroundGuard {
    executor: Arc<dyn BackgroundExecution>,
    token: Option<BackgroundToken>,
}

impl BackgroundGuard {
    fn begin(
        executor: Arc<dyn BackgroundExecution>,
        name: &str,
        on_expiration: Option<ExpirationHandler>,
    ) -> Self {
        let token = executor.begin(name, on_expiration);
        tracing::trace!(name, token = token.0, "background work started");
        Self {
            executor,
            token: Some(token),
        }
    }
}

impl Drop for BackgroundGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            tracing::trace!(token = token.0, "background work ended");
            self.executor.end(token);
        }
    }
}

/// A stream yielding the single outcome of a session task
pub struct ResourceStream<R> {
    work: Option<BoxFuture<'static, Result<Option<R>>>>,
    guards: Vec<BackgroundGuard>,
}

impl<R: Send + 'static> ResourceStream<R> {
    pub(crate) fn new<F>(work: F) -> Self
    where
        F: std::future::Future<Output = Result<Option<R>>> + Send + 'static,
    {
        Self {
            work: Some(work.boxed()),
            guards: Vec::new(),
        }
    }

    /// Hold a background token from `executor` until the outcome is
    /// delivered or the stream is dropped
    pub fn in_background(self, executor: Arc<dyn BackgroundExecution>, name: &str) -> Self {
        self.hold_background(executor, name, None)
    }

    /// Like [`ResourceStream::in_background`], with a handler the host runs
    /// if the background time expires first
    pub fn in_background_with_expiration<F>(
        self,
        executor: Arc<dyn BackgroundExecution>,
        name: &str,
        on_expiration: F,
    ) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.hold_background(executor, name, Some(Box::new(on_expiration)))
    }

    fn hold_background(
        mut self,
        executor: Arc<dyn BackgroundExecution>,
        name: &str,
        on_expiration: Option<ExpirationHandler>,
    ) -> Self {
        if self.work.is_some() {
            self.guards.push(BackgroundGuard::begin(executor, name, on_expiration));
        }
        self
    }
}

impl<R> Stream for ResourceStream<R> {
    type Item = Result<Option<R>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let work = match this.work.as_mut() {
            Some(work) => work,
            None => return Poll::Ready(None),
        };

        match work.poll_unpin(cx) {
            Poll::Ready(outcome) => {
                this.work = None;
                this.guards.clear();
                Poll::Ready(Some(outcome))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::from(self.work.is_some());
        (remaining, Some(remaining))
    }
}

impl<R> FusedStream for ResourceStream<R> {
    fn is_terminated(&self) -> bool {
        self.work.is_none()
    }
}

impl<R> fmt::Debug for ResourceStream<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStream")
            .field("terminated", &self.work.is_none())
            .field("background_tokens", &self.guards.len())
            .finish()
    }
}

impl<T: Transport + 'static> Session<T> {
    /// Stream the outcome of a data task
    pub fn data_stream<R>(&self, request: &Request<R>, validator: StatusValidator) -> ResourceStream<R>
    where
        R: Resource + Send + 'static,
    {
        let session = self.clone();
        let request = request.clone();
        ResourceStream::new(async move { session.data(&request, &validator).await })
    }

    /// Stream the outcome of an upload task
    pub fn upload_stream<R>(
        &self,
        request: &Request<R>,
        data: Vec<u8>,
        validator: StatusValidator,
    ) -> ResourceStream<R>
    where
        R: Resource + Send + 'static,
    {
        let session = self.clone();
        let request = request.clone();
        ResourceStream::new(async move { session.upload(&request, data, &validator).await })
    }

    /// Stream the outcome of a download task
    pub fn download_stream<R>(
        &self,
        request: &Request<R>,
        resume_data: Option<Vec<u8>>,
        validator: StatusValidator,
    ) -> ResourceStream<R>
    where
        R: Resource + Send + 'static,
    {
        let session = self.clone();
        let request = request.clone();
        ResourceStream::new(async move { session.download(&request, resume_data, &validator).await })
    }
}
