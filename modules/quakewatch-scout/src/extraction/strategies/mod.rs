//! Extraction strategies, strongest structural assumption first.
//!
//! A strategy never fails: malformed input of any kind means "nothing found"
//! and the cascade moves on to the next one.

pub mod diagnostic;
pub mod direct_data;
pub mod selector;
pub mod table;
pub mod text_pattern;

pub use diagnostic::diagnose;
pub use direct_data::DirectDataStrategy;
pub use selector::SelectorStrategy;
pub use table::TableStrategy;
pub use text_pattern::TextPatternStrategy;

use quakewatch_common::ExtractionLimits;

use super::{Extraction, ParsedPage};

pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` (or an empty extraction) lets the next strategy run.
    fn extract(&self, page: &ParsedPage<'_>, limits: &ExtractionLimits) -> Option<Extraction>;
}

/// The production ordering: payloads, tables, selectors, free text.
pub fn default_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(DirectDataStrategy),
        Box::new(TableStrategy),
        Box::new(SelectorStrategy::default()),
        Box::new(TextPatternStrategy),
    ]
}
