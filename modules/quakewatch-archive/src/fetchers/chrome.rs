// Headless Chrome fetcher: `--dump-dom` after a virtual-time wait.

use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::error::{Result, TransportError};
use crate::fetcher::FetchedPage;

/// Max launch attempts for transient process failures.
const CHROME_MAX_ATTEMPTS: u32 = 3;
/// Base backoff between launches. Actual delay is base * 3^attempt + jitter.
const CHROME_RETRY_BASE: Duration = Duration::from_secs(3);

pub(crate) struct ChromeFetcher {
    chrome_bin: String,
    /// Virtual time granted to page scripts before the DOM is dumped.
    virtual_time_budget_ms: u64,
    timeout: Duration,
}

impl ChromeFetcher {
    pub(crate) fn new(chrome_bin: &str, virtual_time_budget_ms: u64, timeout: Duration) -> Self {
        info!(chrome_bin, virtual_time_budget_ms, "ChromeFetcher initialized");
        Self {
            chrome_bin: chrome_bin.to_string(),
            virtual_time_budget_ms,
            timeout,
        }
    }

    pub(crate) async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        info!(url, fetcher = "chrome", "Fetching page");

        let html_bytes = self.run_chrome(url).await?;
        let body = String::from_utf8_lossy(&html_bytes).into_owned();

        if body.is_empty() {
            warn!(url, fetcher = "chrome", "Empty DOM output");
        } else {
            info!(url, fetcher = "chrome", bytes = body.len(), "Fetched successfully");
        }

        Ok(FetchedPage {
            url: url.to_string(),
            body,
            status: None,
        })
    }

    /// Launch Chrome --dump-dom and return raw stdout bytes.
    async fn run_chrome(&self, url: &str) -> Result<Vec<u8>> {
        let parsed = url::Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{url}: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(TransportError::InvalidUrl(format!(
                "only http/https URLs allowed, got: {}",
                parsed.scheme()
            )));
        }

        for attempt in 0..CHROME_MAX_ATTEMPTS {
            let tmp_dir = tempfile::tempdir()
                .map_err(|e| TransportError::Browser(format!("failed to create profile dir: {e}")))?;

            let result = tokio::time::timeout(
                self.timeout,
                tokio::process::Command::new(&self.chrome_bin)
                    .args(chrome_args(
                        url,
                        &tmp_dir.path().display().to_string(),
                        self.virtual_time_budget_ms,
                    ))
                    .kill_on_drop(true)
                    .output(),
            )
            .await;

            match result {
                Ok(Ok(output)) => {
                    if output.status.success() {
                        return Ok(output.stdout);
                    }
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    if is_transient_error(&stderr) && attempt + 1 < CHROME_MAX_ATTEMPTS {
                        warn!(url, attempt = attempt + 1, "Chrome cannot fork, retrying");
                        retry_with_backoff(attempt).await;
                        continue;
                    }
                    return Err(TransportError::Browser(format!(
                        "chrome exited with {}: {}",
                        output.status,
                        stderr.trim()
                    )));
                }
                Ok(Err(e)) => {
                    let msg = e.to_string();
                    if is_transient_error(&msg) && attempt + 1 < CHROME_MAX_ATTEMPTS {
                        warn!(url, attempt = attempt + 1, error = %e, "Chrome launch failed, retrying");
                        retry_with_backoff(attempt).await;
                        continue;
                    }
                    return Err(TransportError::Browser(format!(
                        "failed to run {} for {url}: {e}",
                        self.chrome_bin
                    )));
                }
                Err(_) => {
                    return Err(TransportError::Timeout {
                        url: url.to_string(),
                        after: self.timeout,
                    });
                }
            }
        }

        Err(TransportError::Browser(format!(
            "chrome failed {CHROME_MAX_ATTEMPTS} times for {url}"
        )))
    }
}

fn chrome_args(url: &str, profile_dir: &str, virtual_time_budget_ms: u64) -> Vec<String> {
    vec![
        "--headless".to_string(),
        "--no-sandbox".to_string(),
        "--disable-gpu".to_string(),
        "--disable-dev-shm-usage".to_string(),
        format!("--user-data-dir={profile_dir}"),
        format!("--virtual-time-budget={virtual_time_budget_ms}"),
        "--dump-dom".to_string(),
        url.to_string(),
    ]
}

fn is_transient_error(msg: &str) -> bool {
    msg.contains("Cannot fork") || msg.contains("Resource temporarily unavailable")
}

async fn retry_with_backoff(attempt: u32) {
    let backoff = CHROME_RETRY_BASE * 3u32.pow(attempt);
    let jitter = Duration::from_millis(rand::rng().random_range(0..1000));
    tokio::time::sleep(backoff + jitter).await;
}
