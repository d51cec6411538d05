//! Run orchestrator: probe → fetch → cascade → normalize → persist → respond.

use std::any::Any;
use std::sync::Arc;

use chrono::Utc;
use quakewatch_archive::PageFetcher;
use quakewatch_common::{Record, RunResult, ScoutConfig, SourceTag};
use quakewatch_store::{replace_snapshot, PersistenceError, SnapshotStore};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{Result, ScoutError};
use crate::extraction::{Cascade, Extraction, PageContent};
use crate::fallback::error_candidate;
use crate::normalizer::Normalizer;
use crate::probe::probe_endpoints;
use crate::response::RunResponse;

/// Opaque per-invocation context. Only used to label logs.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub invocation_id: Uuid,
    pub trigger: String,
}

impl InvocationContext {
    pub fn new(trigger: &str) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            trigger: trigger.to_string(),
        }
    }
}

pub struct Scout {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn SnapshotStore>,
    config: ScoutConfig,
    cascade: Arc<Cascade>,
}

impl Scout {
    pub fn new(fetcher: Arc<dyn PageFetcher>, store: Arc<dyn SnapshotStore>, config: ScoutConfig) -> Self {
        let cascade = Arc::new(Cascade::new(config.limits));
        Self {
            fetcher,
            store,
            config,
            cascade,
        }
    }

    /// Swap in a custom strategy cascade.
    pub fn with_cascade(mut self, cascade: Cascade) -> Self {
        self.cascade = Arc::new(cascade);
        self
    }

    /// One full invocation. Only a store that accepted none of the records
    /// turns into a failure response; everything else is reported as records.
    pub async fn run(&self, ctx: &InvocationContext) -> RunResponse {
        let span = info_span!("run", invocation_id = %ctx.invocation_id, trigger = ctx.trigger.as_str());
        async {
            info!(
                url = self.config.target_url.as_str(),
                profile = %self.config.profile,
                fetcher = self.fetcher.name(),
                store = self.store.name(),
                "Run started"
            );

            let result = self.extract().await;
            let report = replace_snapshot(self.store.as_ref(), &result.records).await;

            if report.is_total_failure() {
                let err = ScoutError::Persistence(PersistenceError::Unavailable {
                    attempted: result.records.len(),
                    failed: report.failed_inserts,
                });
                error!(error = %err, extracted = result.records.len(), "Run could not persist any record");
                return RunResponse::persistence_failure(&err, result.records.len());
            }

            info!(
                success = result.success,
                records = result.records.len(),
                data_records = result.data_records(),
                inserted = report.inserted,
                failed_inserts = report.failed_inserts,
                "Run complete"
            );
            RunResponse::success(&result, &self.config.source_label, self.config.limits.preview_records)
        }
        .instrument(span)
        .await
    }

    /// Everything up to (not including) persistence. Never fails: a failure
    /// becomes an error record after whatever was gathered.
    pub async fn extract(&self) -> RunResult {
        let mut normalizer = Normalizer::new(Utc::now());
        let mut records = Vec::new();

        match self.gather(&mut normalizer, &mut records).await {
            Ok(()) => {
                let message = summary(&records);
                RunResult {
                    records,
                    success: true,
                    message,
                }
            }
            Err(err) => {
                warn!(kind = err.kind(), error = %err, gathered = records.len(), "Extraction failed");
                let candidate = error_candidate(&err, &self.config.limits);
                records.extend(normalizer.normalize(vec![candidate], SourceTag::Error, &self.config.target_url));
                RunResult {
                    records,
                    success: false,
                    message: format!("Extraction failed: {err}"),
                }
            }
        }
    }

    async fn gather(&self, normalizer: &mut Normalizer, records: &mut Vec<Record>) -> Result<()> {
        let payloads = probe_endpoints(self.fetcher.as_ref(), &self.config.probe_endpoints).await;

        let content = if payloads.is_empty() {
            let page = self
                .fetcher
                .fetch(&self.config.target_url, self.config.profile)
                .await?;
            info!(url = page.url.as_str(), status = ?page.status, bytes = page.body.len(), "Page fetched");
            PageContent {
                url: page.url,
                html: page.body,
                status: page.status,
                payloads,
            }
        } else {
            PageContent {
                url: self.config.target_url.clone(),
                payloads,
                ..PageContent::default()
            }
        };

        let extraction = self.run_cascade(content).await?;
        records.extend(normalizer.normalize(
            extraction.candidates,
            extraction.source_tag,
            &extraction.origin_url,
        ));
        Ok(())
    }

    /// HTML parsing is CPU-bound and the parsed document is not `Send`.
    async fn run_cascade(&self, content: PageContent) -> Result<Extraction> {
        let cascade = Arc::clone(&self.cascade);
        tokio::task::spawn_blocking(move || cascade.run(&content))
            .await
            .map_err(|join_err| {
                if join_err.is_panic() {
                    ScoutError::Unclassified {
                        type_name: "Panic".into(),
                        message: panic_message(join_err.into_panic()),
                    }
                } else {
                    ScoutError::Unclassified {
                        type_name: "Cancelled".into(),
                        message: join_err.to_string(),
                    }
                }
            })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn summary(records: &[Record]) -> String {
    match records.first() {
        Some(first) if first.source_tag.is_data() => {
            format!("Extracted {} seismic records via {}", records.len(), first.source_tag)
        }
        Some(_) => "No seismic data found; stored a page structure diagnostic".to_string(),
        None => "No records produced".to_string(),
    }
}
