// JS-rendering proxy fetcher backed by a Browserless /content endpoint.

use std::time::Duration;

use browserless_client::{BrowserlessClient, BrowserlessError, RenderOptions};
use tracing::{info, warn};

use crate::error::{Result, TransportError};
use crate::fetcher::FetchedPage;

pub(crate) struct BrowserlessFetcher {
    client: BrowserlessClient,
    options: RenderOptions,
    timeout: Duration,
}

impl BrowserlessFetcher {
    pub(crate) fn new(
        base_url: &str,
        token: Option<&str>,
        options: RenderOptions,
        timeout: Duration,
    ) -> Result<Self> {
        info!(base_url, wait_ms = ?options.wait_ms, "BrowserlessFetcher initialized");
        let client = BrowserlessClient::new(base_url, token, timeout)
            .map_err(|e| TransportError::Proxy(e.to_string()))?;
        Ok(Self {
            client,
            options,
            timeout,
        })
    }

    pub(crate) async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        info!(url, fetcher = "browserless", "Fetching page");

        let rendered = self
            .client
            .content(url, &self.options)
            .await
            .map_err(|e| match e {
                BrowserlessError::Timeout(_) => TransportError::Timeout {
                    url: url.to_string(),
                    after: self.timeout,
                },
                other => TransportError::Proxy(other.to_string()),
            })?;

        if rendered.html.is_empty() {
            warn!(url, fetcher = "browserless", "Empty HTML response");
        } else {
            info!(url, fetcher = "browserless", bytes = rendered.html.len(), "Fetched successfully");
        }

        Ok(FetchedPage {
            url: url.to_string(),
            body: rendered.html,
            status: rendered.status,
        })
    }
}
