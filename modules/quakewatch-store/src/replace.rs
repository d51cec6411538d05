// Snapshot replace: scan -> delete (batched) -> put each record.
//
// Not transactional. A failure between the delete and put phases leaves the
// store with fewer records than either run produced.

use quakewatch_common::Record;
use tracing::{info, warn};

use crate::SnapshotStore;

/// Ids deleted per `delete_batch` call.
pub const DELETE_BATCH_SIZE: usize = 25;

/// What happened during one replace.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PersistReport {
    pub scanned: usize,
    pub deleted: usize,
    pub inserted: usize,
    pub failed_inserts: usize,
    /// Scan or delete failure. Never stops the insert phase.
    pub cleanup_error: Option<String>,
}

impl PersistReport {
    /// Records were offered but none of them reached the store.
    pub fn is_total_failure(&self) -> bool {
        self.inserted == 0 && self.failed_inserts > 0
    }
}

/// Make the store hold exactly `records`.
pub async fn replace_snapshot(store: &dyn SnapshotStore, records: &[Record]) -> PersistReport {
    let mut report = PersistReport::default();

    match store.scan_all().await {
        Ok(ids) => {
            report.scanned = ids.len();
            for batch in ids.chunks(DELETE_BATCH_SIZE) {
                if let Err(e) = store.delete_batch(batch).await {
                    warn!(store = store.name(), error = %e, "Failed to clear previous snapshot");
                    report.cleanup_error = Some(e.to_string());
                    break;
                }
                report.deleted += batch.len();
            }
        }
        Err(e) => {
            warn!(store = store.name(), error = %e, "Failed to scan previous snapshot");
            report.cleanup_error = Some(e.to_string());
        }
    }

    for record in records {
        match store.put_item(record).await {
            Ok(()) => report.inserted += 1,
            Err(e) => {
                warn!(store = store.name(), id = record.id.as_str(), error = %e, "Failed to insert record");
                report.failed_inserts += 1;
            }
        }
    }

    info!(
        store = store.name(),
        scanned = report.scanned,
        deleted = report.deleted,
        inserted = report.inserted,
        failed_inserts = report.failed_inserts,
        "Snapshot replaced"
    );

    report
}
