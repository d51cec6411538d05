//! HTTP-shaped run response, for whatever triggered the run.

use std::collections::BTreeMap;

use quakewatch_common::RunResult;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ScoutError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl RunResponse {
    /// 200 with a preview of the first `preview` records.
    pub fn success(result: &RunResult, source_label: &str, preview: usize) -> Self {
        let records: Vec<Value> = result
            .records
            .iter()
            .take(preview)
            .map(|r| Value::Object(r.to_item()))
            .collect();
        let captured_at = result.records.first().map(|r| r.captured_at.to_rfc3339());

        Self {
            status_code: 200,
            headers: success_headers(),
            body: json!({
                "message": result.message,
                "total_records": result.records.len(),
                "records": records,
                "captured_at": captured_at,
                "source": source_label,
            }),
        }
    }

    /// 500 when nothing extracted could be stored.
    pub fn persistence_failure(error: &ScoutError, extracted: usize) -> Self {
        Self {
            status_code: 500,
            headers: json_headers(),
            body: json!({
                "error": error.to_string(),
                "extracted_records": extracted,
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

fn json_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())])
}

/// Successful runs are readable cross-origin.
fn success_headers() -> BTreeMap<String, String> {
    let mut headers = json_headers();
    headers.insert("Access-Control-Allow-Origin".to_string(), "*".to_string());
    headers
}
