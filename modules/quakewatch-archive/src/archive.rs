// Archive: routes a fetch to the backend matching the requested capability profile.

use async_trait::async_trait;
use browserless_client::RenderOptions;
use quakewatch_common::{CapabilityProfile, FetchTimeouts, ScoutConfig};
use tracing::info;

use crate::error::{Result, TransportError};
use crate::fetcher::{FetchedPage, PageFetcher};
use crate::fetchers::browserless::BrowserlessFetcher;
use crate::fetchers::chrome::ChromeFetcher;
use crate::fetchers::plain::PlainFetcher;

/// Wait hints for profiles that execute page scripts.
#[derive(Debug, Clone, Default)]
pub struct RenderHints {
    pub wait_ms: Option<u64>,
    pub wait_for_selector: Option<String>,
}

/// Configuration for which concrete fetchers to build.
pub struct ArchiveConfig {
    pub timeouts: FetchTimeouts,
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
    pub chrome_bin: String,
    pub render: RenderHints,
}

impl From<&ScoutConfig> for ArchiveConfig {
    fn from(config: &ScoutConfig) -> Self {
        Self {
            timeouts: config.timeouts,
            browserless_url: config.browserless_url.clone(),
            browserless_token: config.browserless_token.clone(),
            chrome_bin: config.chrome_bin.clone(),
            render: RenderHints {
                wait_ms: config.render_wait_ms,
                wait_for_selector: config.render_wait_selector.clone(),
            },
        }
    }
}

/// The archive: one fetcher per capability profile.
pub struct Archive {
    plain: PlainFetcher,
    browserless: Option<BrowserlessFetcher>,
    chrome: ChromeFetcher,
    timeouts: FetchTimeouts,
}

impl Archive {
    pub fn new(config: ArchiveConfig) -> Result<Self> {
        let browserless = match config.browserless_url {
            Some(ref base_url) => Some(BrowserlessFetcher::new(
                base_url,
                config.browserless_token.as_deref(),
                RenderOptions {
                    wait_ms: config.render.wait_ms,
                    wait_for_selector: config.render.wait_for_selector.clone(),
                },
                config.timeouts.proxy,
            )?),
            None => None,
        };

        let chrome = ChromeFetcher::new(
            &config.chrome_bin,
            config.render.wait_ms.unwrap_or(5_000),
            config.timeouts.browser,
        );

        info!(browserless = browserless.is_some(), "Archive initialized");

        Ok(Self {
            plain: PlainFetcher::new()?,
            browserless,
            chrome,
            timeouts: config.timeouts,
        })
    }
}

#[async_trait]
impl PageFetcher for Archive {
    async fn fetch(&self, url: &str, profile: CapabilityProfile) -> Result<FetchedPage> {
        match profile {
            CapabilityProfile::Plain => self.plain.fetch(url, self.timeouts.plain).await,
            CapabilityProfile::JsRenderedProxy => match self.browserless {
                Some(ref fetcher) => fetcher.fetch(url).await,
                None => Err(TransportError::Unavailable(profile.to_string())),
            },
            CapabilityProfile::HeadlessBrowser => self.chrome.fetch(url).await,
        }
    }

    async fn probe(&self, url: &str) -> Result<FetchedPage> {
        self.plain.fetch(url, self.timeouts.probe).await
    }

    fn name(&self) -> &str {
        "archive"
    }
}
