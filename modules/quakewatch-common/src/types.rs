use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QuakeError;

/// Open field mapping discovered at parse time. Insertion order is kept.
pub type FieldMap = serde_json::Map<String, Value>;

// --- Limits ---

/// Hard cap on data records kept per run ("recent N reports").
pub const MAX_RECORDS: usize = 10;
/// Records echoed back in the run response.
pub const PREVIEW_RECORDS: usize = 3;
/// Selector matches with less visible text than this are ignored.
pub const SELECTOR_MIN_TEXT: usize = 10;
/// Text lines shorter than this are treated as noise.
pub const TEXT_MIN_LINE: usize = 20;
/// Shortest acceptable location phrase.
pub const LOCATION_MIN_LEN: usize = 5;
/// Table rows need at least this many non-empty cells.
pub const MIN_ROW_CELLS: usize = 3;
/// Error messages stored on error records are cut to this many chars.
pub const ERROR_MESSAGE_MAX: usize = 300;
/// Raw text excerpts stored alongside extracted fields.
pub const EXCERPT_MAX: usize = 300;

/// Tunable extraction thresholds. Defaults mirror the constants above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    pub max_records: usize,
    pub preview_records: usize,
    pub selector_min_text: usize,
    pub text_min_line: usize,
    pub location_min_len: usize,
    pub min_row_cells: usize,
    pub error_message_max: usize,
    pub excerpt_max: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_records: MAX_RECORDS,
            preview_records: PREVIEW_RECORDS,
            selector_min_text: SELECTOR_MIN_TEXT,
            text_min_line: TEXT_MIN_LINE,
            location_min_len: LOCATION_MIN_LEN,
            min_row_cells: MIN_ROW_CELLS,
            error_message_max: ERROR_MESSAGE_MAX,
            excerpt_max: EXCERPT_MAX,
        }
    }
}

// --- Source tags ---

/// Which strategy (or fallback) produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceTag {
    Api,
    Table,
    Selector,
    TextPattern,
    StructuralDiagnostic,
    Error,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Api => "api",
            SourceTag::Table => "table",
            SourceTag::Selector => "selector",
            SourceTag::TextPattern => "text-pattern",
            SourceTag::StructuralDiagnostic => "structural-diagnostic",
            SourceTag::Error => "error",
        }
    }

    /// Diagnostic and error records describe the run, not seismic events.
    pub fn is_data(&self) -> bool {
        !matches!(self, SourceTag::StructuralDiagnostic | SourceTag::Error)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Capability profiles ---

/// How the page fetcher retrieves content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityProfile {
    /// Static HTML over plain HTTP.
    #[default]
    Plain,
    /// Remote rendering service that executes the page's scripts.
    JsRenderedProxy,
    /// Local headless browser.
    HeadlessBrowser,
}

impl CapabilityProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityProfile::Plain => "plain",
            CapabilityProfile::JsRenderedProxy => "js-rendered-proxy",
            CapabilityProfile::HeadlessBrowser => "headless-browser",
        }
    }
}

impl fmt::Display for CapabilityProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityProfile {
    type Err = QuakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "http" => Ok(CapabilityProfile::Plain),
            "js-rendered-proxy" | "proxy" | "browserless" => Ok(CapabilityProfile::JsRenderedProxy),
            "headless-browser" | "headless" | "chrome" => Ok(CapabilityProfile::HeadlessBrowser),
            other => Err(QuakeError::Config(format!("unknown fetch profile: {other}"))),
        }
    }
}

// --- Records ---

/// One extracted or diagnostic observation. The unit of persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub sequence: u32,
    pub captured_at: DateTime<Utc>,
    pub source_tag: SourceTag,
    pub origin_url: String,
    pub fields: FieldMap,
}

impl Record {
    /// Flatten into the persisted item shape: metadata first, then extracted
    /// fields merged on top. Extracted values win on key collisions.
    pub fn to_item(&self) -> FieldMap {
        let mut item = FieldMap::new();
        item.insert("id".into(), Value::String(self.id.clone()));
        item.insert("sequence".into(), Value::from(self.sequence));
        item.insert(
            "captured_at".into(),
            Value::String(self.captured_at.to_rfc3339()),
        );
        item.insert("source".into(), Value::String(self.source_tag.to_string()));
        item.insert("origin_url".into(), Value::String(self.origin_url.clone()));
        for (key, value) in &self.fields {
            item.insert(key.clone(), value.clone());
        }
        item
    }
}

/// Outcome of one invocation. Never persisted; only its records are.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub records: Vec<Record>,
    pub success: bool,
    pub message: String,
}

impl RunResult {
    pub fn data_records(&self) -> usize {
        self.records.iter().filter(|r| r.source_tag.is_data()).count()
    }
}

/// Cut a string to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: FieldMap) -> Record {
        Record {
            id: "abc".into(),
            sequence: 2,
            captured_at: Utc::now(),
            source_tag: SourceTag::TextPattern,
            origin_url: "https://example.com".into(),
            fields,
        }
    }

    #[test]
    fn item_puts_metadata_first() {
        let mut fields = FieldMap::new();
        fields.insert("magnitude".into(), Value::String("4.5".into()));
        let item = record(fields).to_item();

        let keys: Vec<_> = item.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["id", "sequence", "captured_at", "source", "origin_url", "magnitude"]
        );
        assert_eq!(item["source"], "text-pattern");
    }

    #[test]
    fn extracted_fields_override_metadata() {
        let mut fields = FieldMap::new();
        fields.insert("origin_url".into(), Value::String("https://api.example.com".into()));
        let item = record(fields).to_item();
        assert_eq!(item["origin_url"], "https://api.example.com");
    }

    #[test]
    fn diagnostic_tags_are_not_data() {
        assert!(SourceTag::Table.is_data());
        assert!(!SourceTag::StructuralDiagnostic.is_data());
        assert!(!SourceTag::Error.is_data());
    }

    #[test]
    fn profile_parses_aliases() {
        assert_eq!("browserless".parse::<CapabilityProfile>().unwrap(), CapabilityProfile::JsRenderedProxy);
        assert_eq!("Headless-Browser".parse::<CapabilityProfile>().unwrap(), CapabilityProfile::HeadlessBrowser);
        assert!("selenium".parse::<CapabilityProfile>().is_err());
    }

    #[test]
    fn truncation_counts_chars() {
        assert_eq!(truncate_chars("Ubicación", 8), "Ubicació");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
