// In-memory snapshot store. Used for dry runs and tests; failures can be injected.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use quakewatch_common::{FieldMap, Record};

use crate::error::{PersistenceError, Result};
use crate::SnapshotStore;

#[derive(Default)]
pub struct MemorySnapshotStore {
    items: Mutex<BTreeMap<String, FieldMap>>,
    fail_scan: bool,
    fail_all_puts: bool,
    fail_put_sequences: HashSet<u32>,
    put_attempts: Mutex<usize>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `scan_all` call fail.
    pub fn with_failing_scan(mut self) -> Self {
        self.fail_scan = true;
        self
    }

    /// Make every `put_item` call fail.
    pub fn with_failing_puts(mut self) -> Self {
        self.fail_all_puts = true;
        self
    }

    /// Make `put_item` fail for the record with this sequence number.
    pub fn with_failing_put(mut self, sequence: u32) -> Self {
        self.fail_put_sequences.insert(sequence);
        self
    }

    /// Pre-populate an item, as if left behind by a previous run.
    pub fn seed(&self, id: &str, item: FieldMap) {
        self.lock_items().insert(id.to_string(), item);
    }

    pub fn len(&self) -> usize {
        self.lock_items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<String> {
        self.lock_items().keys().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<FieldMap> {
        self.lock_items().get(id).cloned()
    }

    /// Number of `put_item` calls, successful or not.
    pub fn put_attempts(&self) -> usize {
        *self.put_attempts.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_items(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, FieldMap>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn scan_all(&self) -> Result<Vec<String>> {
        if self.fail_scan {
            return Err(PersistenceError::Backend("scan refused".into()));
        }
        Ok(self.ids())
    }

    async fn delete_batch(&self, ids: &[String]) -> Result<()> {
        let mut items = self.lock_items();
        for id in ids {
            items.remove(id);
        }
        Ok(())
    }

    async fn put_item(&self, record: &Record) -> Result<()> {
        *self.put_attempts.lock().unwrap_or_else(|e| e.into_inner()) += 1;

        if self.fail_all_puts || self.fail_put_sequences.contains(&record.sequence) {
            return Err(PersistenceError::Backend(format!(
                "put refused for {}",
                record.id
            )));
        }
        self.lock_items().insert(record.id.clone(), record.to_item());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
