//! Plugin hooks run by [`Fetcher`](crate::Fetcher).

use std::fmt;

use crate::{BoxFuture, Error, Request, Response, Result};

/// A named bundle of optional hooks.
///
/// Every hook defaults to a no-op, so a plugin implements only the phases
/// it cares about. The name is descriptive and is not used for lookup.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Runs before the request is sent.
    ///
    /// Returning `Some` replaces the working request for later plugins and
    /// for the transport. A failure here aborts the invocation without
    /// running any error hooks.
    fn on_before_request<'a>(
        &'a self,
        request: &'a Request,
    ) -> BoxFuture<'a, Result<Option<Request>>> {
        let _ = request;
        Box::pin(async { Ok(None) })
    }

    /// Runs after the transport returned a response.
    fn on_after_response<'a>(
        &'a self,
        response: &'a Response,
        request: &'a Request,
    ) -> BoxFuture<'a, Result<()>> {
        let _ = (response, request);
        Box::pin(async { Ok(()) })
    }

    /// Runs after the transport (or an after-response hook) failed. The
    /// error is returned to the caller unchanged once every hook ran.
    fn on_error<'a>(&'a self, request: &'a Request, error: &'a Error) -> BoxFuture<'a, ()> {
        let _ = (request, error);
        Box::pin(async {})
    }
}

type BeforeRequestFn = dyn Fn(&Request) -> Result<Option<Request>> + Send + Sync;
type AfterResponseFn = dyn Fn(&Response, &Request) -> Result<()> + Send + Sync;
type ErrorFn = dyn Fn(&Request, &Error) + Send + Sync;

/// A [`Plugin`] assembled from synchronous closures.
///
/// ```
/// use enfetch::FnPlugin;
/// use reqwest::header::{HeaderValue, USER_AGENT};
///
/// let plugin = FnPlugin::new("user-agent").before_request(|req| {
///     Ok(Some(req.clone().header(USER_AGENT, HeaderValue::from_static("enfetch"))))
/// });
/// ```
pub struct FnPlugin {
    name: String,
    before_request: Option<Box<BeforeRequestFn>>,
    after_response: Option<Box<AfterResponseFn>>,
    error: Option<Box<ErrorFn>>,
}

impl fmt::Debug for FnPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPlugin")
            .field("name", &self.name)
            .field("before_request", &self.before_request.is_some())
            .field("after_response", &self.after_response.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

impl FnPlugin {
    /// Creates a plugin with no hooks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            before_request: None,
            after_response: None,
            error: None,
        }
    }

    pub fn before_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request) -> Result<Option<Request>> + Send + Sync + 'static,
    {
        self.before_request = Some(Box::new(hook));
        self
    }

    pub fn after_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Response, &Request) -> Result<()> + Send + Sync + 'static,
    {
        self.after_response = Some(Box::new(hook));
        self
    }

    pub fn error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request, &Error) + Send + Sync + 'static,
    {
        self.error = Some(Box::new(hook));
        self
    }
}

impl Plugin for FnPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_before_request<'a>(
        &'a self,
        request: &'a Request,
    ) -> BoxFuture<'a, Result<Option<Request>>> {
        let result = match &self.before_request {
            Some(hook) => hook(request),
            None => Ok(None),
        };
        Box::pin(async move { result })
    }

    fn on_after_response<'a>(
        &'a self,
        response: &'a Response,
        request: &'a Request,
    ) -> BoxFuture<'a, Result<()>> {
        let result = match &self.after_response {
            Some(hook) => hook(response, request),
            None => Ok(()),
        };
        Box::pin(async move { result })
    }

    fn on_error<'a>(&'a self, request: &'a Request, error: &'a Error) -> BoxFuture<'a, ()> {
        if let Some(hook) = &self.error {
            hook(request, error);
        }
        Box::pin(async {})
    }
}
