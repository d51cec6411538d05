//! Selector heuristics: report "cards" recognized by class names and data attributes.

use std::collections::HashSet;

use quakewatch_common::{ExtractionLimits, SourceTag};
use scraper::ElementRef;
use serde_json::Value;
use tracing::debug;

use super::Strategy;
use crate::extraction::fields::extract_with;
use crate::extraction::html;
use crate::extraction::{Candidate, Extraction, ParsedPage};

const CONTAINER_TAGS: &[&str] = &["div", "section", "article", "li"];
const CLASS_HINTS: &[&str] = &["sismo", "earthquake", "seism", "reporte"];
const ATTRIBUTE_HINTS: &[&str] = &[
    "[ng-repeat]",
    "[data-sismo]",
    "[data-magnitud]",
    "[data-magnitude]",
    "[data-event-id]",
];

pub struct SelectorStrategy {
    selectors: Vec<String>,
}

impl SelectorStrategy {
    /// Try `selectors` in order; the first one with qualifying matches wins.
    pub fn new(selectors: Vec<String>) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }
}

impl Default for SelectorStrategy {
    fn default() -> Self {
        let by_class = CLASS_HINTS.iter().map(|hint| {
            CONTAINER_TAGS
                .iter()
                .map(|tag| format!(r#"{tag}[class*="{hint}" i]"#))
                .collect::<Vec<_>>()
                .join(", ")
        });
        let by_attribute = ATTRIBUTE_HINTS.iter().map(|attr| attr.to_string());
        Self::new(by_class.chain(by_attribute).collect())
    }
}

impl Strategy for SelectorStrategy {
    fn name(&self) -> &'static str {
        "selector"
    }

    fn extract(&self, page: &ParsedPage<'_>, limits: &ExtractionLimits) -> Option<Extraction> {
        for css in &self.selectors {
            let Some(sel) = html::selector(css) else {
                continue;
            };

            let matched: Vec<ElementRef> = page
                .document
                .select(&sel)
                .filter(|el| html::element_text(el).chars().count() > limits.selector_min_text)
                .collect();
            if matched.is_empty() {
                continue;
            }

            let candidates: Vec<Candidate> = innermost(&matched)
                .into_iter()
                .take(limits.max_records)
                .map(|el| card(el, css, limits))
                .collect();

            debug!(selector = css.as_str(), matched = matched.len(), kept = candidates.len(), "Selector matched");
            return Some(Extraction {
                source_tag: SourceTag::Selector,
                origin_url: page.content.url.clone(),
                candidates,
            });
        }
        None
    }
}

/// Drop matches that wrap another match, so a list container and its items
/// are not both reported.
fn innermost<'a>(matched: &[ElementRef<'a>]) -> Vec<ElementRef<'a>> {
    let ids: HashSet<_> = matched.iter().map(|el| el.id()).collect();
    matched
        .iter()
        .filter(|el| !el.descendants().skip(1).any(|node| ids.contains(&node.id())))
        .copied()
        .collect()
}

fn card(element: ElementRef<'_>, css: &str, limits: &ExtractionLimits) -> Candidate {
    let text = html::element_text(&element);
    let mut fields = extract_with(&text, limits.location_min_len);
    fields.insert("selector".into(), Value::String(css.to_string()));
    if let Some(class) = element.value().attr("class") {
        fields.insert("class".into(), Value::String(html::collapse_whitespace(class)));
    }
    fields.insert(
        "text".into(),
        Value::String(quakewatch_common::truncate_chars(&text, limits.excerpt_max)),
    );
    Candidate::Fields(fields)
}
