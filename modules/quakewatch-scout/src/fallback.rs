//! Error records: a failed run still leaves one explanatory item in the store.

use quakewatch_common::{truncate_chars, ExtractionLimits, FieldMap};
use serde_json::Value;

use crate::error::ScoutError;
use crate::extraction::Candidate;

pub fn error_candidate(error: &ScoutError, limits: &ExtractionLimits) -> Candidate {
    let mut fields = FieldMap::new();
    fields.insert("error_kind".into(), Value::String(error.kind().to_string()));
    fields.insert(
        "error".into(),
        Value::String(truncate_chars(&error.to_string(), limits.error_message_max)),
    );
    Candidate::Fields(fields)
}
