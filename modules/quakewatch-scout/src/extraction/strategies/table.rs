//! Tabular scrape: the first table with a header row and at least one data row.

use quakewatch_common::{ExtractionLimits, FieldMap, SourceTag};
use scraper::ElementRef;
use serde_json::Value;
use tracing::debug;

use super::Strategy;
use crate::extraction::html;
use crate::extraction::{Candidate, Extraction, ParsedPage};

/// Used when the header row carries no labels at all.
pub const DEFAULT_HEADERS: [&str; 7] = [
    "Fecha",
    "Hora",
    "Latitud",
    "Longitud",
    "Profundidad",
    "Magnitud",
    "Ubicación",
];

pub struct TableStrategy;

impl Strategy for TableStrategy {
    fn name(&self) -> &'static str {
        "table"
    }

    fn extract(&self, page: &ParsedPage<'_>, limits: &ExtractionLimits) -> Option<Extraction> {
        let table_sel = html::selector("table")?;

        let rows: Vec<ElementRef> = page
            .document
            .select(&table_sel)
            .map(own_rows)
            .find(|rows| rows.len() > 1)?;

        let cells_of = |row: &ElementRef| -> Vec<String> {
            row.child_elements()
                .filter(|cell| matches!(cell.value().name(), "th" | "td"))
                .map(|cell| html::element_text(&cell))
                .collect()
        };

        let headers = header_labels(cells_of(&rows[0]));

        let candidates: Vec<Candidate> = rows[1..]
            .iter()
            .map(cells_of)
            .filter(|cells| cells.iter().filter(|c| !c.is_empty()).count() >= limits.min_row_cells)
            .take(limits.max_records)
            .map(|cells| Candidate::Fields(map_row(&headers, cells)))
            .collect();

        debug!(rows = rows.len() - 1, kept = candidates.len(), "Table scanned");

        Some(Extraction {
            source_tag: SourceTag::Table,
            origin_url: page.content.url.clone(),
            candidates,
        })
    }
}

/// Rows of `table` itself. Rows of tables nested inside its cells belong to
/// those tables.
fn own_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.child_elements() {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .child_elements()
                    .filter(|row| row.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

fn header_labels(cells: Vec<String>) -> Vec<String> {
    if cells.iter().all(String::is_empty) {
        DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect()
    } else {
        cells
    }
}

/// Cell `i` goes under header `i`, or `field_<i>` when that header is missing,
/// blank, or already taken by an earlier column.
fn map_row(headers: &[String], cells: Vec<String>) -> FieldMap {
    let mut fields = FieldMap::new();
    for (i, cell) in cells.into_iter().enumerate() {
        let key = match headers.get(i) {
            Some(h) if !h.is_empty() && !fields.contains_key(h) => h.clone(),
            _ => format!("field_{i}"),
        };
        fields.insert(key, Value::String(cell));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::PageContent;

    fn run(html: &str) -> Option<Extraction> {
        let content = PageContent {
            url: "https://page.example".into(),
            html: html.into(),
            ..PageContent::default()
        };
        let page = ParsedPage::parse(&content);
        TableStrategy.extract(&page, &ExtractionLimits::default())
    }

    fn keys(candidate: &Candidate) -> Vec<&str> {
        match candidate {
            Candidate::Fields(map) => map.keys().map(String::as_str).collect(),
            Candidate::Raw(_) => Vec::new(),
        }
    }

    #[test]
    fn single_row_tables_are_skipped() {
        let extraction = run(
            "<table><tr><td>layout</td></tr></table>\
             <table><tr><th>A</th><th>B</th><th>C</th></tr><tr><td>1</td><td>2</td><td>3</td></tr></table>",
        )
        .unwrap();
        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(keys(&extraction.candidates[0]), vec!["A", "B", "C"]);
    }

    #[test]
    fn blank_header_row_falls_back_to_defaults() {
        let extraction = run(
            "<table><tr><td></td><td></td></tr>\
             <tr><td>12/05/2024</td><td>14:23:45</td><td>-12.05</td><td>-77.03</td></tr></table>",
        )
        .unwrap();
        assert_eq!(
            keys(&extraction.candidates[0]),
            vec!["Fecha", "Hora", "Latitud", "Longitud"]
        );
    }

    #[test]
    fn extra_cells_get_synthetic_names() {
        let extraction = run(
            "<table><tr><th>Fecha</th><th>Hora</th></tr>\
             <tr><td>a</td><td>b</td><td>c</td><td>d</td></tr></table>",
        )
        .unwrap();
        assert_eq!(
            keys(&extraction.candidates[0]),
            vec!["Fecha", "Hora", "field_2", "field_3"]
        );
    }

    #[test]
    fn sparse_rows_are_discarded() {
        let extraction = run(
            "<table><tr><th>A</th><th>B</th><th>C</th></tr>\
             <tr><td>1</td><td></td><td></td></tr>\
             <tr><td>1</td><td>2</td><td>3</td></tr></table>",
        )
        .unwrap();
        assert_eq!(extraction.candidates.len(), 1);
    }

    #[test]
    fn rows_are_capped() {
        let rows: String = (0..25)
            .map(|i| format!("<tr><td>{i}</td><td>x</td><td>y</td></tr>"))
            .collect();
        let extraction = run(&format!("<table><tr><th>A</th><th>B</th><th>C</th></tr>{rows}</table>")).unwrap();
        assert_eq!(extraction.candidates.len(), 10);
    }

    #[test]
    fn layout_table_does_not_swallow_nested_data_table() {
        let extraction = run(
            "<table><tr><td>\
             <table><tr><th>Fecha</th><th>Hora</th><th>Magnitud</th></tr>\
             <tr><td>12/05/2024</td><td>14:23:45</td><td>4.5</td></tr>\
             <tr><td>13/05/2024</td><td>10:00:00</td><td>3.9</td></tr></table>\
             </td></tr></table>",
        )
        .unwrap();
        assert_eq!(extraction.candidates.len(), 2);
        for candidate in &extraction.candidates {
            assert_eq!(keys(candidate), vec!["Fecha", "Hora", "Magnitud"]);
        }
        let Candidate::Fields(first) = &extraction.candidates[0] else {
            panic!("expected fields");
        };
        assert_eq!(first["Magnitud"], "4.5");
    }

    #[test]
    fn no_table_is_no_extraction() {
        assert!(run("<div>nothing tabular</div>").is_none());
    }
}
