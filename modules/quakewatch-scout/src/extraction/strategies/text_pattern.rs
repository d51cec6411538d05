//! Free-text scan: rendered lines that look like seismic reports.

use std::collections::HashSet;
use std::sync::LazyLock;

use quakewatch_common::{ExtractionLimits, SourceTag};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::Strategy;
use crate::extraction::fields::extract_with;
use crate::extraction::html;
use crate::extraction::{Candidate, Extraction, ParsedPage};

static RELEVANT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        \b(?:sismo|temblor|terremoto|epicentro|magnitud|profundidad|earthquake|epicenter|quake)
        | \bM[wl]?\s*\d\.\d
        | \d+(?:[.,]\d+)?\s*km\b
        | \d{1,2}/\d{1,2}/\d{2,4}
        | \d{4}-\d{2}-\d{2}
        | \d{1,2}:\d{2}:\d{2}
        ",
    )
    .expect("valid regex")
});

pub struct TextPatternStrategy;

impl Strategy for TextPatternStrategy {
    fn name(&self) -> &'static str {
        "text-pattern"
    }

    fn extract(&self, page: &ParsedPage<'_>, limits: &ExtractionLimits) -> Option<Extraction> {
        let mut seen = HashSet::new();
        let candidates: Vec<Candidate> = html::visible_text_lines(&page.document)
            .into_iter()
            .filter(|line| line.chars().count() >= limits.text_min_line)
            .filter(|line| RELEVANT_LINE_RE.is_match(line))
            .filter(|line| seen.insert(line.clone()))
            .take(limits.max_records)
            .map(|line| {
                let mut fields = extract_with(&line, limits.location_min_len);
                fields.insert(
                    "text".into(),
                    Value::String(quakewatch_common::truncate_chars(&line, limits.excerpt_max)),
                );
                Candidate::Fields(fields)
            })
            .collect();

        debug!(lines = candidates.len(), "Text lines matched");
        Some(Extraction {
            source_tag: SourceTag::TextPattern,
            origin_url: page.content.url.clone(),
            candidates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::PageContent;

    fn run(html: &str) -> Extraction {
        let content = PageContent {
            url: "https://page.example".into(),
            html: html.into(),
            ..PageContent::default()
        };
        let page = ParsedPage::parse(&content);
        TextPatternStrategy
            .extract(&page, &ExtractionLimits::default())
            .unwrap()
    }

    fn texts(extraction: &Extraction) -> Vec<&str> {
        extraction
            .candidates
            .iter()
            .filter_map(|c| match c {
                Candidate::Fields(map) => map.get("text").and_then(Value::as_str),
                Candidate::Raw(_) => None,
            })
            .collect()
    }

    #[test]
    fn report_lines_are_picked_up() {
        let extraction = run(
            "<body><p>Bienvenido al portal institucional</p>\
             <p>Sismo de magnitud 4.5 a 25 km al NO de Lima</p>\
             <p>12/05/2024 14:23:45 Profundidad 35 km</p></body>",
        );
        assert_eq!(
            texts(&extraction),
            vec![
                "Sismo de magnitud 4.5 a 25 km al NO de Lima",
                "12/05/2024 14:23:45 Profundidad 35 km"
            ]
        );
    }

    #[test]
    fn short_and_repeated_lines_are_dropped() {
        let extraction = run(
            "<p>Sismo M4.0</p>\
             <p>Temblor sentido en Arequipa, Caylloma</p>\
             <p>Temblor sentido en Arequipa, Caylloma</p>",
        );
        assert_eq!(texts(&extraction), vec!["Temblor sentido en Arequipa, Caylloma"]);
    }

    #[test]
    fn hidden_text_is_ignored() {
        let extraction = run(
            "<script>console.log('sismo magnitud 4.5 en Lima hoy')</script><p>nothing relevant here at all</p>",
        );
        assert!(extraction.candidates.is_empty());
    }

    #[test]
    fn inline_markup_keeps_magnitude_with_its_line() {
        let extraction = run(
            "<ul><li><strong>M 4.5</strong> - 25 km al NO de Lima, 12/05/2024 14:23:45</li></ul>",
        );
        assert_eq!(extraction.candidates.len(), 1);
        let Candidate::Fields(fields) = &extraction.candidates[0] else {
            panic!("expected fields");
        };
        assert_eq!(fields["magnitude"], "4.5");
        assert_eq!(fields["date"], "12/05/2024");
        assert_eq!(fields["time"], "14:23:45");
        assert_eq!(fields["text"], "M 4.5 - 25 km al NO de Lima, 12/05/2024 14:23:45");
    }

    #[test]
    fn matches_are_capped() {
        let lines: String = (0..15)
            .map(|i| format!("<p>Sismo numero {i} reportado en la costa</p>"))
            .collect();
        assert_eq!(run(&lines).candidates.len(), 10);
    }
}
