//! Domain models for portship.
//!
//! Canonical definitions for the transient entities the pipeline moves
//! between stages:
//! - `ReleaseTag`: the tag being packaged and its derived version
//! - `ContentHash`: placeholder or real SHA512 for the source archive
//! - `PortshipError`: the pipeline's error taxonomy and exit-code map

pub mod error;
pub mod release;

pub use error::{PortshipError, Result};
pub use release::{ContentHash, ReleaseTag};
