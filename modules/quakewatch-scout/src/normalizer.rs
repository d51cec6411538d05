//! Candidates to records: fresh ids, one timestamp, a running sequence.

use chrono::{DateTime, Utc};
use quakewatch_common::{FieldMap, Record, SourceTag};
use serde_json::Value;
use uuid::Uuid;

use crate::extraction::Candidate;

/// Stamps every candidate of one run. Sequence numbers keep counting across
/// calls, so error records appended after data records never collide.
pub struct Normalizer {
    captured_at: DateTime<Utc>,
    next_sequence: u32,
}

impl Normalizer {
    pub fn new(captured_at: DateTime<Utc>) -> Self {
        Self {
            captured_at,
            next_sequence: 1,
        }
    }

    pub fn normalize(
        &mut self,
        candidates: Vec<Candidate>,
        source_tag: SourceTag,
        origin_url: &str,
    ) -> Vec<Record> {
        candidates
            .into_iter()
            .map(|candidate| {
                let sequence = self.next_sequence;
                self.next_sequence += 1;
                Record {
                    id: Uuid::new_v4().to_string(),
                    sequence,
                    captured_at: self.captured_at,
                    source_tag,
                    origin_url: origin_url.to_string(),
                    fields: fields_of(candidate),
                }
            })
            .collect()
    }
}

/// One-shot normalization starting at sequence 1.
pub fn normalize(
    candidates: Vec<Candidate>,
    source_tag: SourceTag,
    origin_url: &str,
    captured_at: DateTime<Utc>,
) -> Vec<Record> {
    Normalizer::new(captured_at).normalize(candidates, source_tag, origin_url)
}

fn fields_of(candidate: Candidate) -> FieldMap {
    match candidate {
        Candidate::Fields(fields) => fields,
        Candidate::Raw(text) => {
            let mut fields = FieldMap::new();
            fields.insert("raw".into(), Value::String(text));
            fields
        }
    }
}
