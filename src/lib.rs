//! `enfetch` is a small middleware layer over an async HTTP call.
//!
//! Three layers compose, leaves first:
//! - [`Fetcher`] runs ordered [`Plugin`] hooks around one transport call.
//! - [`RetryClient`] re-invokes any [`Fetch`] implementation with backoff.
//! - [`timeout`] builds a plugin that aborts each attempt after a deadline.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use enfetch::{create_fetcher, create_retry_client, timeout, Delay, FetcherOptions, Request, RetryOptions};
//!
//! # async fn run() -> enfetch::Result<()> {
//! let fetcher = create_fetcher(
//!     FetcherOptions::new().with_plugin(timeout(Duration::from_secs(5))),
//! );
//! let client = create_retry_client(
//!     fetcher,
//!     RetryOptions::new().with_delay(Delay::exponential(Duration::from_millis(100))),
//! );
//!
//! let response = client.execute(Request::get("https://example.com")?).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod error;
mod fetcher;
mod options;
mod plugin;
mod request;
mod response;
mod retry;
mod signal;
mod timeout;
mod transport;

pub use error::Error;
pub use fetcher::{create_fetcher, Fetcher};
pub use options::{Delay, FetcherOptions, RetryOptions, DEFAULT_MAX_RETRIES};
pub use plugin::{FnPlugin, Plugin};
pub use request::Request;
pub use response::Response;
pub use retry::{
    create_retry_client, default_should_retry, RetryClient, RetryContext, RetryOutcome,
    RetryPredicate,
};
pub use signal::{AbortController, AbortReason, AbortSignal};
pub use timeout::{timeout, TimeoutPlugin};
pub use transport::{fetch_fn, BoxFuture, Fetch, FetchFn, HttpTransport};

pub type Result<T> = std::result::Result<T, Error>;
