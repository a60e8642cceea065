//! Retry with backoff around any [`Fetch`] implementation.

use std::fmt;
use std::sync::Arc;

use reqwest::StatusCode;

use crate::{BoxFuture, Error, Fetch, Request, Response, Result, RetryOptions};

/// Outcome of a single attempt, as seen by the retry decision.
#[derive(Debug, Clone, Copy)]
pub enum RetryOutcome<'a> {
    Response(&'a Response),
    Error(&'a Error),
}

/// Input to a retry decision. Built fresh for every decision.
#[derive(Debug, Clone, Copy)]
pub struct RetryContext<'a> {
    /// Retries already performed: 0 for the decision after the first attempt.
    pub retries: u32,
    /// The caller's request.
    pub request: &'a Request,
    /// What the attempt produced.
    pub outcome: RetryOutcome<'a>,
}

impl<'a> RetryContext<'a> {
    /// Returns `true` when the attempt failed.
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, RetryOutcome::Error(_))
    }

    /// The attempt's response, if it produced one.
    pub fn response(&self) -> Option<&'a Response> {
        match self.outcome {
            RetryOutcome::Response(response) => Some(response),
            RetryOutcome::Error(_) => None,
        }
    }

    /// The attempt's error, if it failed.
    pub fn error(&self) -> Option<&'a Error> {
        match self.outcome {
            RetryOutcome::Error(err) => Some(err),
            RetryOutcome::Response(_) => None,
        }
    }
}

/// Decides whether an attempt should be retried.
///
/// Implemented for every `Fn(&RetryContext) -> bool`. Implement it directly
/// for predicates that need to await or can fail; a failure ends the call
/// and is returned to the caller.
pub trait RetryPredicate: Send + Sync {
    fn should_retry<'a>(&'a self, ctx: &'a RetryContext<'a>) -> BoxFuture<'a, Result<bool>>;
}

impl<F> RetryPredicate for F
where
    F: Fn(&RetryContext<'_>) -> bool + Send + Sync,
{
    fn should_retry<'a>(&'a self, ctx: &'a RetryContext<'a>) -> BoxFuture<'a, Result<bool>> {
        let retry = self(ctx);
        Box::pin(async move { Ok(retry) })
    }
}

/// Retries every error, and responses with status 429, 500, 502, 503 or 504.
pub fn default_should_retry(ctx: &RetryContext<'_>) -> bool {
    match ctx.outcome {
        RetryOutcome::Error(_) => true,
        RetryOutcome::Response(response) => matches!(
            response.status(),
            StatusCode::TOO_MANY_REQUESTS
                | StatusCode::INTERNAL_SERVER_ERROR
                | StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
        ),
    }
}

/// Re-invokes a fetcher until the predicate declines or the retry budget
/// is spent.
///
/// The last outcome is returned as is: a non-2xx response is not turned into
/// an error, and the last error is returned without wrapping.
#[derive(Clone)]
pub struct RetryClient {
    inner: Arc<dyn Fetch>,
    options: RetryOptions,
}

impl fmt::Debug for RetryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryClient")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Wraps `fetcher` in a [`RetryClient`].
pub fn create_retry_client(fetcher: impl Fetch + 'static, options: RetryOptions) -> RetryClient {
    RetryClient::new(fetcher, options)
}

impl RetryClient {
    /// Wraps `fetcher` with the given retry options.
    pub fn new(fetcher: impl Fetch + 'static, options: RetryOptions) -> Self {
        Self {
            inner: Arc::new(fetcher),
            options,
        }
    }

    /// Options this client was built with.
    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// Sends `request`, retrying per the configured options.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let mut retries = 0u32;
        loop {
            let outcome = self.inner.fetch(request.clone()).await;

            let ctx = RetryContext {
                retries,
                request: &request,
                outcome: match &outcome {
                    Ok(response) => RetryOutcome::Response(response),
                    Err(err) => RetryOutcome::Error(err),
                },
            };
            let retry = self.options.should_retry.should_retry(&ctx).await?;
            if !retry || retries >= self.options.max_retries {
                return outcome;
            }

            let delay = self.options.delay.for_context(&ctx);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt = retries + 1,
                ?delay,
                is_error = ctx.is_error(),
                "retrying request"
            );

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            retries += 1;
        }
    }
}

impl Fetch for RetryClient {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        Box::pin(self.execute(request))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{default_should_retry, RetryContext, RetryOutcome};
    use crate::{Error, Request, Response};

    fn request() -> Request {
        Request::get("https://example.com").expect("url must parse")
    }

    #[test]
    fn retries_errors() {
        let request = request();
        let err = Error::other("network error");
        let ctx = RetryContext {
            retries: 0,
            request: &request,
            outcome: RetryOutcome::Error(&err),
        };
        assert!(default_should_retry(&ctx));
        assert!(ctx.is_error());
        assert!(ctx.response().is_none());
    }

    #[test]
    fn retries_transient_statuses_only() {
        let request = request();
        for (status, expected) in [
            (StatusCode::TOO_MANY_REQUESTS, true),
            (StatusCode::INTERNAL_SERVER_ERROR, true),
            (StatusCode::BAD_GATEWAY, true),
            (StatusCode::SERVICE_UNAVAILABLE, true),
            (StatusCode::GATEWAY_TIMEOUT, true),
            (StatusCode::OK, false),
            (StatusCode::NOT_FOUND, false),
            (StatusCode::NOT_IMPLEMENTED, false),
        ] {
            let response = Response::new(status);
            let ctx = RetryContext {
                retries: 0,
                request: &request,
                outcome: RetryOutcome::Response(&response),
            };
            assert_eq!(default_should_retry(&ctx), expected, "status {status}");
        }
    }
}
