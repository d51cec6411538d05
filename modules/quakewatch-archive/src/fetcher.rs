use async_trait::async_trait;
use quakewatch_common::CapabilityProfile;

use crate::error::Result;

/// Raw page content as returned by a fetch backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub body: String,
    /// HTTP status of the target page, when the backend can tell.
    pub status: Option<u16>,
}

/// Retrieves raw page content with a given capability profile.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the target page.
    async fn fetch(&self, url: &str, profile: CapabilityProfile) -> Result<FetchedPage>;

    /// Fetch a structured-data endpoint. Endpoints never need rendering.
    async fn probe(&self, url: &str) -> Result<FetchedPage> {
        self.fetch(url, CapabilityProfile::Plain).await
    }

    fn name(&self) -> &str;
}
