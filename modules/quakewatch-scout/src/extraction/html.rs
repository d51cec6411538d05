// DOM helpers shared by the strategies.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Elements whose text is never rendered.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head", "title"];

/// Parse a CSS selector. Invalid selectors are logged and skipped.
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            debug!(css, error = ?e, "Skipping unparsable selector");
            None
        }
    }
}

/// Visible text of an element with runs of whitespace collapsed.
pub(crate) fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of elements matching `css`.
pub(crate) fn count(document: &Html, css: &str) -> usize {
    selector(css).map_or(0, |sel| document.select(&sel).count())
}

/// Elements that start a new rendered line. Everything else is inline and
/// its text joins the surrounding line.
const BLOCK_ELEMENTS: &[&str] = &[
    "html", "body", "main", "header", "footer", "nav", "aside", "section", "article", "div", "p",
    "pre", "blockquote", "address", "figure", "figcaption", "form", "fieldset", "h1", "h2", "h3",
    "h4", "h5", "h6", "ul", "ol", "li", "dl", "dt", "dd", "table", "caption", "thead", "tbody",
    "tfoot", "tr", "th", "td", "br", "hr",
];

/// Trimmed, non-empty rendered lines in document order. Lines break at block
/// elements, `<br>` and newlines inside text.
pub(crate) fn visible_text_lines(document: &Html) -> Vec<String> {
    let mut lines = LineBuffer::default();
    collect_lines(document.root_element(), &mut lines);
    lines.finish()
}

fn collect_lines(element: ElementRef<'_>, lines: &mut LineBuffer) {
    let name = element.value().name();
    if HIDDEN_ELEMENTS.contains(&name) {
        return;
    }
    let block = BLOCK_ELEMENTS.contains(&name);
    if block {
        lines.break_line();
    }
    for child in element.children() {
        if let Some(child) = ElementRef::wrap(child) {
            collect_lines(child, lines);
        } else if let Some(text) = child.value().as_text() {
            lines.push_text(text);
        }
    }
    if block {
        lines.break_line();
    }
}

#[derive(Default)]
struct LineBuffer {
    current: String,
    lines: Vec<String>,
}

impl LineBuffer {
    fn push_text(&mut self, text: &str) {
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.break_line();
            }
            self.current.push(' ');
            self.current.push_str(part);
        }
    }

    fn break_line(&mut self) {
        let line = collapse_whitespace(&self.current);
        if !line.is_empty() {
            self.lines.push(line);
        }
        self.current.clear();
    }

    fn finish(mut self) -> Vec<String> {
        self.break_line();
        self.lines
    }
}
