//! Direct-data probe: JSON from known endpoints or embedded in page scripts.

use std::sync::LazyLock;

use quakewatch_common::{ExtractionLimits, SourceTag};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::Strategy;
use crate::extraction::html;
use crate::extraction::{Candidate, Extraction, ParsedPage};

/// Object keys that hold the event list in an envelope payload.
pub const COLLECTION_KEYS: &[&str] = &["sismos", "data", "items", "results", "reportados", "features"];

/// Script assignments that may carry the event list, most specific first.
static SCRIPT_ASSIGNMENTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:var|let|const)\s+sismos\s*=\s*\[",
        r"(?i)\bsismos\s*[:=]\s*\[",
        r"(?i)\bdata\s*[:=]\s*\[",
        r"(?i)\breportados\s*[:=]\s*\[",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

pub struct DirectDataStrategy;

impl Strategy for DirectDataStrategy {
    fn name(&self) -> &'static str {
        "direct-data"
    }

    fn extract(&self, page: &ParsedPage<'_>, limits: &ExtractionLimits) -> Option<Extraction> {
        for payload in &page.content.payloads {
            if let Some(items) = decode_payload(&payload.body) {
                debug!(endpoint = payload.endpoint.as_str(), items = items.len(), "Endpoint payload accepted");
                return Some(extraction(items, &payload.endpoint, limits));
            }
        }

        let script_sel = html::selector("script")?;
        for script in page.document.select(&script_sel) {
            let source = script.text().collect::<String>();
            if let Some(items) = script_items(&source) {
                debug!(items = items.len(), "Embedded script payload accepted");
                return Some(extraction(items, &page.content.url, limits));
            }
        }

        None
    }
}

fn extraction(items: Vec<Value>, origin_url: &str, limits: &ExtractionLimits) -> Extraction {
    Extraction {
        source_tag: SourceTag::Api,
        origin_url: origin_url.to_string(),
        candidates: items
            .into_iter()
            .take(limits.max_records)
            .map(candidate)
            .collect(),
    }
}

fn candidate(item: Value) -> Candidate {
    match item {
        Value::Object(map) => Candidate::Fields(map),
        Value::String(s) => Candidate::Raw(s),
        other => Candidate::Raw(other.to_string()),
    }
}

/// Decode a response body and return its event list, if it has one.
pub fn decode_payload(body: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(body.trim()) {
        Ok(value) => accepted_items(value),
        Err(e) => {
            debug!(error = %e, "Payload is not JSON");
            None
        }
    }
}

/// A non-empty array, or an object wrapping one under a collection key.
pub fn accepted_items(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) if !items.is_empty() => Some(items),
        Value::Object(mut map) => COLLECTION_KEYS.iter().find_map(|key| match map.remove(*key) {
            Some(Value::Array(items)) if !items.is_empty() => Some(items),
            _ => None,
        }),
        _ => None,
    }
}

fn script_items(source: &str) -> Option<Vec<Value>> {
    for pattern in SCRIPT_ASSIGNMENTS.iter() {
        for found in pattern.find_iter(source) {
            // The match ends just past the opening bracket.
            let start = found.end() - 1;
            let Some(literal) = balanced_array(&source[start..]) else {
                continue;
            };
            match serde_json::from_str::<Value>(literal) {
                Ok(Value::Array(items)) if !items.is_empty() => return Some(items),
                Ok(_) => continue,
                Err(e) => debug!(error = %e, "Script array is not JSON"),
            }
        }
    }
    None
}

/// The `[...]` literal at the start of `text`, honoring nesting and strings.
fn balanced_array(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{EndpointPayload, PageContent};

    fn run(content: &PageContent) -> Option<Extraction> {
        let page = ParsedPage::parse(content);
        DirectDataStrategy.extract(&page, &ExtractionLimits::default())
    }

    #[test]
    fn envelope_with_collection_key_is_accepted() {
        let items = decode_payload(r#"{"status":"ok","sismos":[{"magnitud":"4.5"}]}"#).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn empty_and_scalar_payloads_are_rejected() {
        assert!(decode_payload("[]").is_none());
        assert!(decode_payload(r#"{"sismos":[]}"#).is_none());
        assert!(decode_payload(r#"{"message":"not found"}"#).is_none());
        assert!(decode_payload("<html>404</html>").is_none());
        assert!(decode_payload("42").is_none());
    }

    #[test]
    fn endpoint_payload_records_carry_endpoint_origin() {
        let items: Vec<String> = (0..14).map(|i| format!(r#"{{"n":{i}}}"#)).collect();
        let content = PageContent {
            url: "https://page.example".into(),
            payloads: vec![EndpointPayload {
                endpoint: "https://api.example/sismos".into(),
                body: format!("[{}]", items.join(",")),
            }],
            ..PageContent::default()
        };

        let extraction = run(&content).unwrap();
        assert_eq!(extraction.source_tag, SourceTag::Api);
        assert_eq!(extraction.origin_url, "https://api.example/sismos");
        assert_eq!(extraction.candidates.len(), 10);
    }

    #[test]
    fn scalar_items_become_raw_candidates() {
        let content = PageContent {
            payloads: vec![EndpointPayload {
                endpoint: "https://api.example".into(),
                body: r#"["M4.5 Lima", 7]"#.into(),
            }],
            ..PageContent::default()
        };
        let extraction = run(&content).unwrap();
        assert_eq!(
            extraction.candidates,
            vec![Candidate::Raw("M4.5 Lima".into()), Candidate::Raw("7".into())]
        );
    }

    #[test]
    fn script_assignment_with_nested_arrays() {
        let content = PageContent {
            url: "https://page.example".into(),
            html: r#"<html><body><script>
                window.config = {debug: false};
                var sismos = [{"mag": "4.1", "coords": [-12.0, -77.0]}, {"mag": "3.9", "ref": "a ] b"}];
                render(sismos);
            </script></body></html>"#
                .into(),
            ..PageContent::default()
        };

        let extraction = run(&content).unwrap();
        assert_eq!(extraction.origin_url, "https://page.example");
        assert_eq!(extraction.candidates.len(), 2);
    }

    #[test]
    fn non_json_script_literals_are_skipped() {
        let content = PageContent {
            html: "<script>var sismos = [{mag: 4.1}];</script>".into(),
            ..PageContent::default()
        };
        assert!(run(&content).is_none());
    }

    #[test]
    fn balanced_array_stops_at_matching_bracket() {
        assert_eq!(balanced_array("[1, [2, 3]] tail"), Some("[1, [2, 3]]"));
        assert_eq!(balanced_array(r#"["]"] x"#), Some(r#"["]"]"#));
        assert_eq!(balanced_array("[1, 2"), None);
    }
}
