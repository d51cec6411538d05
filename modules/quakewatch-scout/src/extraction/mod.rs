pub mod cascade;
pub mod fields;
mod html;
pub mod strategies;

pub use cascade::Cascade;
pub use strategies::Strategy;

use quakewatch_common::{FieldMap, SourceTag};
use scraper::Html;

/// One extracted item before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Fields(FieldMap),
    /// Opaque item that could not be read as a field map.
    Raw(String),
}

/// Output of the strategy that won the cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub source_tag: SourceTag,
    pub origin_url: String,
    pub candidates: Vec<Candidate>,
}

/// Body of a structured-data endpoint that answered a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPayload {
    pub endpoint: String,
    pub body: String,
}

/// Everything the cascade gets to look at for one run.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub url: String,
    pub html: String,
    pub status: Option<u16>,
    pub payloads: Vec<EndpointPayload>,
}

/// `PageContent` with its HTML parsed once for all strategies.
pub struct ParsedPage<'a> {
    pub content: &'a PageContent,
    pub document: Html,
}

impl<'a> ParsedPage<'a> {
    pub fn parse(content: &'a PageContent) -> Self {
        Self {
            content,
            document: Html::parse_document(&content.html),
        }
    }
}
