//! Field extractor: best-guess seismic fields from an arbitrary text fragment.
//!
//! Every field is matched independently and the first match wins. Fields that
//! do not match are left out of the map; nothing is null-filled.

use std::sync::LazyLock;

use quakewatch_common::{FieldMap, LOCATION_MIN_LEN};
use regex::Regex;
use serde_json::Value;

static MAGNITUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\b(?i:magnitude|magnitud|mag)\.?|\bM[wWlLbBsSdD]?)\s*[:=]?\s*(\d{1,2}(?:[.,]\d{1,2})?)")
        .expect("valid regex")
});
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(\d{4}-\d{1,2}-\d{1,2}|\d{1,2}[/.-]\d{1,2}[/.-]\d{4}|\d{1,2}/\d{1,2}/\d{2})(?:$|\D)")
        .expect("valid regex")
});
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)((?:[01]?\d|2[0-3]):[0-5]\d:[0-5]\d)(?:$|\D)").expect("valid regex"));
static LABELLED_DEPTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:profundidad|depth|prof)\.?\s*[:=]?\s*(\d+(?:[.,]\d+)?)").expect("valid regex")
});
static DEPTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*km\b").expect("valid regex"));
/// "... km al NO de ...": a distance to a reference town, not a depth.
static BEARING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s+(?:al|del?|from|[NSEOW]{1,3}\b)").expect("valid regex")
});
static LATITUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\blat(?:itud|itude)?\.?\s*[:=]?\s*(-?\d{1,2}(?:[.,]\d+)?)").expect("valid regex")
});
static LONGITUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\blon(?:gitud|gitude|g)?\.?\s*[:=]?\s*(-?\d{1,3}(?:[.,]\d+)?)").expect("valid regex")
});
static LOCATION_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:referencia|ubicaci[oó]n|location|epicentro|lugar)\s*[:=\-]\s*([^|;\n]+)")
        .expect("valid regex")
});
static EPICENTRAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+(?:[.,]\d+)?\s*km\s+al\s+\p{L}+\s+de\s+[^|;\n\d]+)").expect("valid regex")
});
static SEGMENT_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:[|;\t\n]| - |\s{2,})\s*").expect("valid regex"));

const LOCATION_MAX_LEN: usize = 200;

/// Extract every recognizable field from `text`.
pub fn extract(text: &str) -> FieldMap {
    extract_with(text, LOCATION_MIN_LEN)
}

/// Like [`extract`] with a custom shortest-acceptable location length.
pub fn extract_with(text: &str, location_min_len: usize) -> FieldMap {
    let mut fields = FieldMap::new();

    let mut put = |key: &str, value: Option<String>| {
        if let Some(v) = value {
            fields.insert(key.to_string(), Value::String(v));
        }
    };

    put("magnitude", magnitude(text));
    put("date", first_capture(&DATE_RE, text));
    put("time", first_capture(&TIME_RE, text));
    put("depth_km", depth(text));
    put("latitude", first_capture(&LATITUDE_RE, text).map(|v| decimal(&v)));
    put("longitude", first_capture(&LONGITUDE_RE, text).map(|v| decimal(&v)));
    put("location", location(text, location_min_len));

    fields
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| c[1].to_string())
}

fn decimal(raw: &str) -> String {
    raw.replace(',', ".")
}

fn magnitude(text: &str) -> Option<String> {
    MAGNITUDE_RE.captures_iter(text).find_map(|caps| {
        let value = caps.get(1)?;
        // "M 10/05/2024" is a date after a stray M, not a magnitude.
        let next = text[value.end()..].chars().next();
        if matches!(next, Some('/' | ':' | '-')) || next.is_some_and(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(decimal(value.as_str()))
    })
}

fn depth(text: &str) -> Option<String> {
    if let Some(v) = first_capture(&LABELLED_DEPTH_RE, text) {
        return Some(decimal(&v));
    }

    let mut first = None;
    for caps in DEPTH_RE.captures_iter(text) {
        let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = decimal(value.as_str());
        if !BEARING_RE.is_match(&text[whole.end()..]) {
            return Some(value);
        }
        first.get_or_insert(value);
    }
    first
}

/// Prioritized location heuristics; the first acceptable phrase wins.
fn location(text: &str, min_len: usize) -> Option<String> {
    let acceptable = |candidate: &str| {
        let cleaned = clean_phrase(candidate);
        (cleaned.chars().count() >= min_len && cleaned.chars().any(char::is_alphabetic))
            .then(|| truncate(&cleaned))
    };

    if let Some(found) = LOCATION_LABEL_RE
        .captures_iter(text)
        .find_map(|c| acceptable(&c[1]))
    {
        return Some(found);
    }

    if let Some(found) = EPICENTRAL_RE.captures_iter(text).find_map(|c| acceptable(&c[1])) {
        return Some(found);
    }

    if let Some(found) = trailing_phrase(text).and_then(|tail| acceptable(&tail)) {
        return Some(found);
    }

    SEGMENT_SPLIT_RE
        .split(text)
        .filter(|segment| !segment.chars().any(|c| c.is_ascii_digit()))
        .filter_map(acceptable)
        .fold(None, |best: Option<String>, segment| match best {
            Some(b) if b.chars().count() > segment.chars().count() => Some(b),
            _ => Some(segment),
        })
}

/// Digit-free text after the last number, minus a leading unit.
fn trailing_phrase(text: &str) -> Option<String> {
    let last_digit = text.rfind(|c: char| c.is_ascii_digit())?;
    let tail = text[last_digit + 1..].trim_start_matches(|c: char| !c.is_alphanumeric());
    let tail = strip_unit(tail);
    (!tail.is_empty()).then(|| tail.to_string())
}

fn strip_unit(tail: &str) -> &str {
    for unit in ["km", "KM", "Km"] {
        if let Some(rest) = tail.strip_prefix(unit) {
            if rest.chars().next().map_or(true, |c| !c.is_alphabetic()) {
                return rest.trim_start_matches(|c: char| !c.is_alphanumeric());
            }
        }
    }
    tail
}

fn clean_phrase(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | ':' | '-' | '|' | ';'))
        .to_string()
}

fn truncate(phrase: &str) -> String {
    quakewatch_common::truncate_chars(phrase, LOCATION_MAX_LEN)
}
