pub mod config;
pub mod error;
pub mod types;

pub use config::{FetchTimeouts, ScoutConfig, DEFAULT_PROBE_ENDPOINTS, DEFAULT_TARGET_URL};
pub use error::QuakeError;
pub use types::*;
