pub mod error;
pub mod memory;
pub mod postgres;
pub mod replace;

pub use error::{PersistenceError, Result};
pub use memory::MemorySnapshotStore;
pub use postgres::PgSnapshotStore;
pub use replace::{replace_snapshot, PersistReport, DELETE_BATCH_SIZE};

use async_trait::async_trait;
use quakewatch_common::Record;

/// A single flat collection of records keyed by `id`.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Ids of every item currently stored.
    async fn scan_all(&self) -> Result<Vec<String>>;

    /// Remove the given ids. Unknown ids are ignored.
    async fn delete_batch(&self, ids: &[String]) -> Result<()>;

    /// Insert or overwrite one record.
    async fn put_item(&self, record: &Record) -> Result<()>;

    fn name(&self) -> &str;
}
