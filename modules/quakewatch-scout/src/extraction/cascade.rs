//! Ordered strategy cascade with the structural diagnostic as the last resort.

use quakewatch_common::ExtractionLimits;
use tracing::{debug, info};

use super::strategies::{default_strategies, diagnose, Strategy};
use super::{Extraction, PageContent, ParsedPage};

pub struct Cascade {
    strategies: Vec<Box<dyn Strategy>>,
    limits: ExtractionLimits,
}

impl Cascade {
    pub fn new(limits: ExtractionLimits) -> Self {
        Self::with_strategies(default_strategies(), limits)
    }

    pub fn with_strategies(strategies: Vec<Box<dyn Strategy>>, limits: ExtractionLimits) -> Self {
        Self { strategies, limits }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First strategy with a non-empty result, capped at `max_records`.
    pub fn extract_data(&self, page: &ParsedPage<'_>) -> Option<Extraction> {
        for strategy in &self.strategies {
            match strategy.extract(page, &self.limits) {
                Some(mut extraction) if !extraction.candidates.is_empty() => {
                    extraction.candidates.truncate(self.limits.max_records);
                    info!(
                        strategy = strategy.name(),
                        candidates = extraction.candidates.len(),
                        "Strategy produced data"
                    );
                    return Some(extraction);
                }
                _ => debug!(strategy = strategy.name(), "Strategy found nothing"),
            }
        }
        None
    }

    /// Data from the first productive strategy, or a diagnostic of the page.
    pub fn run(&self, content: &PageContent) -> Extraction {
        let page = ParsedPage::parse(content);
        self.extract_data(&page).unwrap_or_else(|| {
            info!(url = content.url.as_str(), "No strategy produced data, describing page structure");
            diagnose(&page, &self.limits)
        })
    }
}
