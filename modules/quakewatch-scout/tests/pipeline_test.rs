//! End-to-end runs: mock fetcher → cascade → memory snapshot store → response.
//!
//! Run with: cargo test -p quakewatch-scout --test pipeline_test

use std::sync::Arc;

use quakewatch_common::{FieldMap, ScoutConfig};
use quakewatch_scout::testing::MockFetcher;
use quakewatch_scout::{InvocationContext, RunResponse, Scout};
use quakewatch_store::MemorySnapshotStore;
use serde_json::Value;

const PAGE: &str = "https://ultimosismo.igp.gob.pe/ultimo-sismo/sismos-reportados";
const ENDPOINT: &str = "https://ultimosismo.igp.gob.pe/api/ultimo-sismo/ajaxb/sismos-reportados";

fn config() -> ScoutConfig {
    ScoutConfig {
        target_url: PAGE.into(),
        probe_endpoints: Vec::new(),
        source_label: "IGP".into(),
        ..ScoutConfig::default()
    }
}

async fn run(fetcher: MockFetcher, store: &Arc<MemorySnapshotStore>, config: ScoutConfig) -> RunResponse {
    let scout = Scout::new(Arc::new(fetcher), store.clone(), config);
    scout.run(&InvocationContext::new("test")).await
}

fn stored_items(store: &MemorySnapshotStore) -> Vec<FieldMap> {
    let mut items: Vec<FieldMap> = store.ids().iter().filter_map(|id| store.get(id)).collect();
    items.sort_by_key(|item| item["sequence"].as_u64());
    items
}

/// Stored items minus the per-run id and timestamp.
fn stable_view(store: &MemorySnapshotStore) -> Vec<FieldMap> {
    stored_items(store)
        .into_iter()
        .map(|mut item| {
            item.remove("id");
            item.remove("captured_at");
            item
        })
        .collect()
}

#[tokio::test]
async fn table_page_replaces_store_and_previews_three() {
    let store = Arc::new(MemorySnapshotStore::new());
    let fetcher = MockFetcher::new().on_page(PAGE, include_str!("fixtures/igp_table.html"));

    let response = run(fetcher, &store, config()).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers["Content-Type"], "application/json");
    assert_eq!(response.body["total_records"], 3);
    assert_eq!(response.body["records"].as_array().unwrap().len(), 3);
    assert_eq!(response.body["source"], "IGP");
    assert_eq!(store.len(), 3);

    let items = stored_items(&store);
    assert_eq!(items[0]["source"], "table");
    assert_eq!(items[0]["sequence"], 1);
    assert_eq!(items[0]["Magnitud"], "4.5");
    assert_eq!(items[2]["sequence"], 3);
}

#[tokio::test]
async fn empty_page_yields_single_diagnostic_record() {
    let store = Arc::new(MemorySnapshotStore::new());
    let fetcher = MockFetcher::new().on_page(PAGE, "");

    let response = run(fetcher, &store, config()).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body["total_records"], 1);
    let items = stored_items(&store);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["source"], "structural-diagnostic");
    assert_eq!(items[0]["status"], "page structure analysis");
}

#[tokio::test]
async fn timeout_yields_single_error_record_with_success_status() {
    let store = Arc::new(MemorySnapshotStore::new());
    let fetcher = MockFetcher::new().on_timeout(PAGE);

    let response = run(fetcher, &store, config()).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body["total_records"], 1);
    let items = stored_items(&store);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["source"], "error");
    assert_eq!(items[0]["error_kind"], "Timeout");
    assert_eq!(items[0]["sequence"], 1);
    assert!(items[0]["error"].as_str().unwrap().contains(PAGE));
}

#[tokio::test]
async fn http_error_status_is_recorded() {
    let store = Arc::new(MemorySnapshotStore::new());
    let fetcher = MockFetcher::new().on_status(PAGE, 503);

    run(fetcher, &store, config()).await;

    let items = stored_items(&store);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["error_kind"], "HttpStatus");
}

#[tokio::test]
async fn store_count_matches_run_output_after_previous_runs() {
    let store = Arc::new(MemorySnapshotStore::new());
    for i in 0..40 {
        store.seed(&format!("stale-{i}"), FieldMap::new());
    }
    let fetcher = MockFetcher::new().on_page(PAGE, include_str!("fixtures/report_cards.html"));

    let response = run(fetcher, &store, config()).await;

    assert_eq!(response.body["total_records"], 2);
    assert_eq!(store.len(), 2);
    assert!(store.ids().iter().all(|id| !id.starts_with("stale-")));
}

#[tokio::test]
async fn scan_failure_does_not_block_inserts() {
    let store = Arc::new(MemorySnapshotStore::new().with_failing_scan());
    store.seed("stale-0", FieldMap::new());
    let fetcher = MockFetcher::new().on_page(PAGE, include_str!("fixtures/igp_table.html"));

    let response = run(fetcher, &store, config()).await;

    assert_eq!(response.status_code, 200);
    // Three new records plus the item the failed scan could not clear.
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn store_rejecting_every_record_is_a_500() {
    let store = Arc::new(MemorySnapshotStore::new().with_failing_puts());
    let fetcher = MockFetcher::new().on_page(PAGE, include_str!("fixtures/igp_table.html"));

    let response = run(fetcher, &store, config()).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(response.body["extracted_records"], 3);
    assert!(response.body["error"].as_str().unwrap().contains("No record could be saved"));
}

#[tokio::test]
async fn partial_insert_failure_still_succeeds() {
    let store = Arc::new(MemorySnapshotStore::new().with_failing_put(2));
    let fetcher = MockFetcher::new().on_page(PAGE, include_str!("fixtures/igp_table.html"));

    let response = run(fetcher, &store, config()).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn stable_page_gives_same_snapshot() {
    let store = Arc::new(MemorySnapshotStore::new());

    run(MockFetcher::new().on_page(PAGE, include_str!("fixtures/igp_table.html")), &store, config()).await;
    let first_ids = store.ids();
    let first = stable_view(&store);

    run(MockFetcher::new().on_page(PAGE, include_str!("fixtures/igp_table.html")), &store, config()).await;

    assert_eq!(stable_view(&store), first);
    assert!(store.ids().iter().all(|id| !first_ids.contains(id)));
}

#[tokio::test]
async fn accepted_endpoint_payload_skips_page_fetch() {
    let store = Arc::new(MemorySnapshotStore::new());
    let fetcher = MockFetcher::new()
        .on_probe(ENDPOINT, r#"{"status":"ok","data":[{"magnitud":"4.6"},{"magnitud":"3.1"}]}"#)
        .on_timeout(PAGE);

    let response = run(
        fetcher,
        &store,
        ScoutConfig {
            probe_endpoints: vec!["https://ultimosismo.igp.gob.pe/api/missing".into(), ENDPOINT.into()],
            ..config()
        },
    )
    .await;

    assert_eq!(response.status_code, 200);
    let items = stored_items(&store);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["source"], "api");
    assert_eq!(items[0]["origin_url"], ENDPOINT);
    assert_eq!(items[1]["magnitud"], Value::String("3.1".into()));
}

#[tokio::test]
async fn records_share_one_capture_timestamp() {
    let store = Arc::new(MemorySnapshotStore::new());
    let fetcher = MockFetcher::new().on_page(PAGE, include_str!("fixtures/free_text.html"));

    run(fetcher, &store, config()).await;

    let items = stored_items(&store);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["captured_at"], items[1]["captured_at"]);
    assert_ne!(items[0]["id"], items[1]["id"]);
}
