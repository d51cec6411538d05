pub mod error;
pub mod extraction;
pub mod fallback;
pub mod normalizer;
pub mod probe;
pub mod response;
pub mod scout;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{Result, ScoutError};
pub use extraction::{Candidate, Cascade, EndpointPayload, Extraction, PageContent, Strategy};
pub use normalizer::{normalize, Normalizer};
pub use response::RunResponse;
pub use scout::{InvocationContext, Scout};
