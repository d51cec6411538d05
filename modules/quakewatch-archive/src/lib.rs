pub mod archive;
pub mod error;
pub mod fetcher;
mod fetchers;

pub use archive::{Archive, ArchiveConfig, RenderHints};
pub use error::{Result, TransportError};
pub use fetcher::{FetchedPage, PageFetcher};
pub use quakewatch_common::CapabilityProfile;
