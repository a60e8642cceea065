use std::time::Duration;

use crate::{AbortSignal, BoxFuture, Error, Plugin, Request, Result};

/// Plugin that aborts each request after a fixed duration.
///
/// The countdown starts when the before-hook runs, so every pipeline
/// invocation (and so every retry attempt) gets a fresh deadline. The
/// request's existing signal, if any, keeps working: the request is aborted
/// by whichever fires first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeoutPlugin {
    duration: Duration,
}

/// Builds a [`TimeoutPlugin`].
pub fn timeout(duration: Duration) -> TimeoutPlugin {
    TimeoutPlugin::new(duration)
}

impl TimeoutPlugin {
    /// Creates a plugin aborting each request after `duration`.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Deadline applied to every invocation.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns a copy of `request` whose signal also fires after the
    /// configured duration.
    ///
    /// Fails with [`Error::Plugin`] when called outside a tokio runtime.
    pub fn decorate(&self, request: &Request) -> Result<Request> {
        let deadline = AbortSignal::timeout(self.duration)
            .map_err(|err| Error::plugin(self.name(), err.to_string()))?;
        let signal = match request.signal() {
            Some(existing) => AbortSignal::any([existing, &deadline]),
            None => deadline,
        };
        Ok(request.clone().with_signal(signal))
    }
}

impl Plugin for TimeoutPlugin {
    fn name(&self) -> &str {
        "timeout"
    }

    fn on_before_request<'a>(
        &'a self,
        request: &'a Request,
    ) -> BoxFuture<'a, Result<Option<Request>>> {
        let decorated = self.decorate(request);
        Box::pin(async move { decorated.map(Some) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::timeout;
    use crate::{Error, Request};

    #[test]
    fn decorate_outside_runtime_is_a_plugin_error() {
        let request = Request::get("https://example.com").expect("url must parse");

        let err = timeout(Duration::from_millis(10))
            .decorate(&request)
            .expect_err("no runtime is running");

        assert!(matches!(err, Error::Plugin { ref plugin, .. } if plugin == "timeout"));
    }

    #[tokio::test(start_paused = true)]
    async fn decorate_inside_runtime_attaches_signal() {
        let request = Request::get("https://example.com").expect("url must parse");

        let decorated = timeout(Duration::from_millis(10))
            .decorate(&request)
            .expect("runtime is running");

        assert!(decorated.signal().is_some_and(|signal| !signal.is_aborted()));
        assert!(request.signal().is_none());
    }
}
