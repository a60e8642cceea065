//! The fetch contract shared by transports, pipelines and retry clients.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{Error, Request, Response, Result};

/// Type alias for a boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything that turns a [`Request`] into a [`Response`].
///
/// Implemented by [`HttpTransport`], [`Fetcher`](crate::Fetcher) and
/// [`RetryClient`](crate::RetryClient), so the layers nest freely.
pub trait Fetch: Send + Sync {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Result<Response>>;
}

impl<T: Fetch + ?Sized> Fetch for Arc<T> {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        (**self).fetch(request)
    }
}

/// [`Fetch`] implementation backed by a closure. Built by [`fetch_fn`].
#[derive(Clone)]
pub struct FetchFn<F> {
    f: F,
}

impl<F> fmt::Debug for FetchFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchFn").finish_non_exhaustive()
    }
}

/// Adapts an async closure into a [`Fetch`] implementation.
pub fn fetch_fn<F, Fut>(f: F) -> FetchFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    FetchFn { f }
}

impl<F, Fut> Fetch for FetchFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn fetch(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        Box::pin((self.f)(request))
    }
}

/// Default transport: sends requests with `reqwest` and buffers the body.
///
/// A request carrying an [`AbortSignal`](crate::AbortSignal) is raced against
/// it; when the signal fires first the exchange is dropped and
/// [`Error::Aborted`] is returned.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a default `reqwest` client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured `reqwest` client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn send(&self, request: Request) -> Result<Response> {
        let Some(signal) = request.signal().cloned() else {
            return self.exchange(request).await;
        };

        if let Some(reason) = signal.reason() {
            return Err(Error::Aborted(reason));
        }

        tokio::select! {
            biased;
            reason = signal.aborted() => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%reason, "request aborted in flight");

                Err(Error::Aborted(reason))
            }
            result = self.exchange(request) => result,
        }
    }

    async fn exchange(&self, request: Request) -> Result<Response> {
        let (method, url, headers, body) = request.into_parts();

        let mut builder = self.http.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(Error::Transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(Error::Transport)?;

        Ok(Response::from_parts(status, headers, body.to_vec()))
    }
}

impl Fetch for HttpTransport {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        Box::pin(self.send(request))
    }
}
