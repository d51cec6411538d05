use quakewatch_archive::TransportError;
use quakewatch_store::PersistenceError;

pub type Result<T> = std::result::Result<T, ScoutError>;

/// Anything that can go wrong during a run. Only persistence failures reach
/// the caller; the rest are recorded as error records.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("{type_name}: {message}")]
    Unclassified { type_name: String, message: String },
}

impl ScoutError {
    /// Short tag stored on error records. Transport errors keep their own kind.
    pub fn kind(&self) -> &str {
        match self {
            ScoutError::Transport(e) => e.kind(),
            ScoutError::Persistence(_) => "Persistence",
            ScoutError::Unclassified { type_name, .. } => type_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn transport_kind_passes_through() {
        let err = ScoutError::from(TransportError::Timeout {
            url: "https://example.com".into(),
            after: Duration::from_secs(30),
        });
        assert_eq!(err.kind(), "Timeout");
        assert_eq!(err.to_string(), "Timed out after 30s fetching https://example.com");
    }

    #[test]
    fn unclassified_keeps_type_name() {
        let err = ScoutError::Unclassified {
            type_name: "Panic".into(),
            message: "index out of bounds".into(),
        };
        assert_eq!(err.kind(), "Panic");
        assert_eq!(err.to_string(), "Panic: index out of bounds");
    }
}
