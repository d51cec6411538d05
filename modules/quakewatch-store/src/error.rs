/// Result type alias for snapshot store operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("No record could be saved ({failed} of {attempted} inserts failed)")]
    Unavailable { attempted: usize, failed: usize },
}
