use std::fmt;
use std::sync::Arc;

use crate::{BoxFuture, Fetch, FetcherOptions, HttpTransport, Plugin, Request, Response, Result};

/// Runs plugin hooks around a single transport call.
///
/// Before-hooks, after-hooks and error-hooks all run sequentially in plugin
/// list order.
#[derive(Clone)]
pub struct Fetcher {
    plugins: Arc<[Arc<dyn Plugin>]>,
    transport: Arc<dyn Fetch>,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.plugins.iter().map(|plugin| plugin.name()).collect();
        f.debug_struct("Fetcher").field("plugins", &names).finish()
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(FetcherOptions::default())
    }
}

/// Builds a [`Fetcher`] from options.
pub fn create_fetcher(options: FetcherOptions) -> Fetcher {
    Fetcher::new(options)
}

impl Fetcher {
    pub fn new(options: FetcherOptions) -> Self {
        let transport = options
            .transport
            .unwrap_or_else(|| Arc::new(HttpTransport::new()));
        Self {
            plugins: options.plugins.into(),
            transport,
        }
    }

    /// Runs one pipeline invocation.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let mut request = request;
        for plugin in self.plugins.iter() {
            // Before-hook failures skip the error hooks.
            let replacement = plugin.on_before_request(&request).await?;
            if let Some(replacement) = replacement {
                request = replacement;
            }
        }

        match self.exchange(&request).await {
            Ok(response) => Ok(response),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %err, url = %request.url(), "fetch failed, running error hooks");

                for plugin in self.plugins.iter() {
                    plugin.on_error(&request, &err).await;
                }
                Err(err)
            }
        }
    }

    async fn exchange(&self, request: &Request) -> Result<Response> {
        let response = self.transport.fetch(request.clone()).await?;
        for plugin in self.plugins.iter() {
            plugin.on_after_response(&response, request).await?;
        }
        Ok(response)
    }
}

impl Fetch for Fetcher {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        Box::pin(self.execute(request))
    }
}
