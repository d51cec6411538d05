pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

/// Header Browserless uses to report the status code of the rendered page.
const RESPONSE_CODE_HEADER: &str = "x-response-code";

/// Rendering hints forwarded to the /content endpoint.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Fixed delay after navigation before the DOM is serialized.
    pub wait_ms: Option<u64>,
    /// Wait until this CSS selector is present in the DOM.
    pub wait_for_selector: Option<String>,
}

/// Rendered page returned by Browserless.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    /// Status of the target page, when Browserless reports it.
    pub status: Option<u16>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentRequest<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    wait_for_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wait_for_selector: Option<WaitForSelector<'a>>,
    goto_options: GotoOptions,
}

#[derive(Serialize)]
struct WaitForSelector<'a> {
    selector: &'a str,
    timeout: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions {
    wait_until: &'static str,
}

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }

    /// Fetch fully-rendered HTML content for a URL via the /content endpoint.
    pub async fn content(&self, url: &str, options: &RenderOptions) -> Result<RenderedPage> {
        let body = content_request(url, options, self.timeout);

        debug!(url, wait_ms = ?options.wait_ms, selector = ?options.wait_for_selector, "Browserless render request");

        let resp = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let page_status = resp
            .headers()
            .get(RESPONSE_CODE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u16>().ok());

        Ok(RenderedPage {
            html: resp.text().await?,
            status: page_status,
        })
    }
}

fn content_request<'a>(url: &'a str, options: &'a RenderOptions, timeout: Duration) -> ContentRequest<'a> {
    // Selector waits must resolve before the HTTP timeout fires.
    let selector_timeout = timeout.as_millis().saturating_sub(5_000).max(1_000) as u64;

    ContentRequest {
        url,
        wait_for_timeout: options.wait_ms,
        wait_for_selector: options
            .wait_for_selector
            .as_deref()
            .map(|selector| WaitForSelector {
                selector,
                timeout: selector_timeout,
            }),
        goto_options: GotoOptions {
            wait_until: "networkidle2",
        },
    }
}
