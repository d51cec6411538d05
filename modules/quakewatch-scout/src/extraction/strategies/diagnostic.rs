//! Structural diagnostic: a description of the page when no data was found.
//!
//! Not a strategy. The cascade runs it only after every strategy came back
//! empty, so there is always at least one record explaining the run.

use std::sync::LazyLock;

use quakewatch_common::{ExtractionLimits, FieldMap, SourceTag};
use regex::Regex;
use serde_json::{json, Value};

use crate::extraction::html;
use crate::extraction::{Candidate, Extraction, ParsedPage};

const MAX_INDICATORS: usize = 3;
const MAX_CONTAINERS: usize = 3;
const NOSCRIPT_MAX: usize = 100;

/// Element ids typical of a client-side app mount point.
static DYNAMIC_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)app|vue|react|angular|root|__next|__nuxt|data|content").expect("valid regex")
});
static CONTAINER_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)loading|content|main|data").expect("valid regex"));

pub fn diagnose(page: &ParsedPage<'_>, limits: &ExtractionLimits) -> Extraction {
    let doc = &page.document;
    let mut fields = FieldMap::new();

    fields.insert("status".into(), json!("page structure analysis"));
    fields.insert("html_title".into(), json!(title(page).unwrap_or_else(|| "untitled".into())));
    fields.insert(
        "http_status".into(),
        page.content
            .status
            .map_or_else(|| json!("no response"), |s| json!(s)),
    );
    fields.insert("total_scripts".into(), json!(html::count(doc, "script")));
    fields.insert("total_tables".into(), json!(html::count(doc, "table")));
    fields.insert("total_divs".into(), json!(html::count(doc, "div")));
    fields.insert("total_sections".into(), json!(html::count(doc, "section")));
    fields.insert("dynamic_indicators".into(), Value::Array(dynamic_indicators(page)));

    if let Some(message) = noscript_message(page) {
        fields.insert("noscript_message".into(), json!(message));
    }

    let containers = candidate_containers(page, limits);
    if !containers.is_empty() {
        fields.insert("candidate_containers".into(), Value::Array(containers));
    }

    Extraction {
        source_tag: SourceTag::StructuralDiagnostic,
        origin_url: page.content.url.clone(),
        candidates: vec![Candidate::Fields(fields)],
    }
}

fn title(page: &ParsedPage<'_>) -> Option<String> {
    let sel = html::selector("title")?;
    page.document
        .select(&sel)
        .map(|t| html::element_text(&t))
        .find(|t| !t.is_empty())
}

fn dynamic_indicators(page: &ParsedPage<'_>) -> Vec<Value> {
    let Some(sel) = html::selector("div[id], section[id]") else {
        return Vec::new();
    };
    page.document
        .select(&sel)
        .filter_map(|el| el.value().id())
        .filter(|id| DYNAMIC_ID_RE.is_match(id))
        .take(MAX_INDICATORS)
        .map(|id| json!(id))
        .collect()
}

fn noscript_message(page: &ParsedPage<'_>) -> Option<String> {
    let sel = html::selector("noscript")?;
    page.document
        .select(&sel)
        .map(|el| html::collapse_whitespace(&el.text().collect::<String>()))
        .find(|text| !text.is_empty())
        .map(|text| quakewatch_common::truncate_chars(&text, NOSCRIPT_MAX))
}

fn candidate_containers(page: &ParsedPage<'_>, limits: &ExtractionLimits) -> Vec<Value> {
    let Some(sel) = html::selector("div[class], section[class]") else {
        return Vec::new();
    };
    page.document
        .select(&sel)
        .filter(|el| el.value().attr("class").is_some_and(|c| CONTAINER_CLASS_RE.is_match(c)))
        .take(MAX_CONTAINERS)
        .map(|el| {
            json!({
                "id": el.value().id(),
                "class": el.value().attr("class").map(html::collapse_whitespace),
                "excerpt": quakewatch_common::truncate_chars(&html::element_text(&el), limits.excerpt_max),
            })
        })
        .collect()
}
