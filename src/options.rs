use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::{default_should_retry, Fetch, Plugin, RetryContext, RetryPredicate};

/// Configures the plugin list and transport of a [`Fetcher`](crate::Fetcher).
#[derive(Clone, Default)]
pub struct FetcherOptions {
    /// Plugins in execution order.
    pub plugins: Vec<Arc<dyn Plugin>>,
    /// Transport used to send requests. Defaults to [`HttpTransport`](crate::HttpTransport).
    pub transport: Option<Arc<dyn Fetch>>,
}

impl fmt::Debug for FetcherOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.plugins.iter().map(|plugin| plugin.name()).collect();
        f.debug_struct("FetcherOptions")
            .field("plugins", &names)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

impl FetcherOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plugin after the ones already registered.
    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Appends an already shared plugin.
    pub fn with_shared_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn with_transport(mut self, transport: impl Fetch + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }
}

/// Default maximum number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

type DelayFn = dyn Fn(&RetryContext<'_>) -> Duration + Send + Sync;

/// Wait before the next retry attempt.
#[derive(Clone)]
pub enum Delay {
    /// Same wait before every retry.
    Fixed(Duration),
    /// Wait computed from the decision context.
    Computed(Arc<DelayFn>),
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(duration) => f.debug_tuple("Fixed").field(duration).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::Fixed(Duration::ZERO)
    }
}

impl From<Duration> for Delay {
    fn from(duration: Duration) -> Self {
        Self::Fixed(duration)
    }
}

impl Delay {
    /// Delay computed by `f` for every retry decision.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&RetryContext<'_>) -> Duration + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    /// Exponential backoff: `base * 2^retries`, exponent capped at 16.
    pub fn exponential(base: Duration) -> Self {
        Self::computed(move |ctx| {
            let exp = ctx.retries.min(16);
            base.saturating_mul(1u32 << exp)
        })
    }

    pub(crate) fn for_context(&self, ctx: &RetryContext<'_>) -> Duration {
        match self {
            Self::Fixed(duration) => *duration,
            Self::Computed(f) => f(ctx),
        }
    }
}

/// Configures retry behavior of a [`RetryClient`](crate::RetryClient).
#[derive(Clone)]
pub struct RetryOptions {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Wait between attempts.
    pub delay: Delay,
    /// Decides whether an attempt's outcome is retried.
    pub should_retry: Arc<dyn RetryPredicate>,
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_retries", &self.max_retries)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: Delay::default(),
            should_retry: Arc::new(default_should_retry),
        }
    }
}

impl RetryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_delay(mut self, delay: impl Into<Delay>) -> Self {
        self.delay = delay.into();
        self
    }

    /// Uses a synchronous predicate.
    pub fn with_should_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(&RetryContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(f);
        self
    }

    /// Uses a custom, possibly async or fallible, predicate.
    pub fn with_retry_predicate(mut self, predicate: impl RetryPredicate + 'static) -> Self {
        self.should_retry = Arc::new(predicate);
        self
    }
}
