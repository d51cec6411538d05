// Test mocks for the scout pipeline.
//
// - MockFetcher (PageFetcher): HashMap-based URL→canned response or error
//
// Pair with `quakewatch_store::MemorySnapshotStore` for the persistence side.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use quakewatch_archive::{CapabilityProfile, FetchedPage, PageFetcher, Result, TransportError};

/// What a registered URL answers with.
#[derive(Debug, Clone)]
enum Canned {
    Body { body: String, status: u16 },
    Timeout,
    Status(u16),
}

impl Canned {
    fn respond(&self, url: &str) -> Result<FetchedPage> {
        match self {
            Canned::Body { body, status } => Ok(FetchedPage {
                url: url.to_string(),
                body: body.clone(),
                status: Some(*status),
            }),
            Canned::Timeout => Err(TransportError::Timeout {
                url: url.to_string(),
                after: Duration::from_secs(30),
            }),
            Canned::Status(status) => Err(TransportError::HttpStatus {
                status: *status,
                url: url.to_string(),
            }),
        }
    }
}

/// HashMap-based page fetcher. Returns a `Connect` error for unregistered URLs.
/// Builder pattern: `.on_page()`, `.on_timeout()`, `.on_status()`, `.on_probe()`.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, Canned>,
    probes: HashMap<String, Canned>,
    fetched: Mutex<Vec<(String, CapabilityProfile)>>,
    probed: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Canned::Body {
                body: html.to_string(),
                status: 200,
            },
        );
        self
    }

    pub fn on_timeout(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), Canned::Timeout);
        self
    }

    pub fn on_status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), Canned::Status(status));
        self
    }

    pub fn on_probe(mut self, url: &str, body: &str) -> Self {
        self.probes.insert(
            url.to_string(),
            Canned::Body {
                body: body.to_string(),
                status: 200,
            },
        );
        self
    }

    /// Every `fetch` call so far, in order.
    pub fn fetched(&self) -> Vec<(String, CapabilityProfile)> {
        self.fetched.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn was_probed(&self, url: &str) -> bool {
        self.probed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|u| u == url)
    }
}

fn unregistered(kind: &str, url: &str) -> TransportError {
    TransportError::Connect(format!("MockFetcher: no {kind} registered for {url}"))
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str, profile: CapabilityProfile) -> Result<FetchedPage> {
        self.fetched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((url.to_string(), profile));
        match self.pages.get(url) {
            Some(canned) => canned.respond(url),
            None => Err(unregistered("page", url)),
        }
    }

    async fn probe(&self, url: &str) -> Result<FetchedPage> {
        self.probed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());
        match self.probes.get(url) {
            Some(canned) => canned.respond(url),
            None => Err(unregistered("endpoint", url)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
