// Plain HTTP fetcher. Static HTML only; no script execution.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use tracing::{info, warn};

use crate::error::{Result, TransportError};
use crate::fetcher::FetchedPage;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,application/json;q=0.8,*/*;q=0.7";
const BROWSER_ACCEPT_LANGUAGE: &str = "es-ES,es;q=0.8,en-US;q=0.5,en;q=0.3";

pub(crate) struct PlainFetcher {
    client: reqwest::Client,
}

impl PlainFetcher {
    pub(crate) fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self { client })
    }

    /// GET `url` within `timeout`. Non-2xx responses are errors.
    pub(crate) async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage> {
        info!(url, fetcher = "plain", "Fetching page");

        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, url, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(url, fetcher = "plain", status = status.as_u16(), "Non-success status");
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(e, url, timeout))?;

        info!(url, fetcher = "plain", bytes = body.len(), "Fetched successfully");

        Ok(FetchedPage {
            url: url.to_string(),
            body,
            status: Some(status.as_u16()),
        })
    }
}
