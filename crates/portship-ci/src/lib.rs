//! Portship CI - the vcpkg release pipeline
//!
//! Drives the five-stage publishing flow:
//! - Resolve the latest release tag from the ambient checkout
//! - Destructively re-checkout the source tree at that tag
//! - Generate the port manifest and build recipe
//! - Trial-install with a placeholder hash to recover the real SHA512
//! - Re-install verified and push the refreshed port files

pub mod pipeline;

mod publish;
mod trial;

// Re-export key types
pub use pipeline::{PipelineReport, ReleasePipeline, StageReport};
