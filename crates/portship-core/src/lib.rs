//! Portship Core
//!
//! Domain types and external-collaborator seams for the vcpkg release
//! packager: configuration, command execution, the git and vcpkg
//! wrappers, manifest/recipe generation, and hash extraction.

pub mod config;
pub mod domain;
pub mod exec;
pub mod git;
pub mod hash;
pub mod manifest;
pub mod telemetry;
pub mod vcpkg;

// Re-export key types
pub use config::{
    CloneUrl, Credentials, GitIdentity, PackagerConfig, ToolPaths, DEFAULT_TRIPLET,
    DEFAULT_VCPKG_ROOT,
};
pub use domain::{ContentHash, PortshipError, ReleaseTag, Result};
pub use exec::{CommandLine, CommandOutput, CommandRunner, ProcessRunner};
pub use git::GitClient;
pub use hash::extract_actual_hash;
pub use manifest::{render_portfile, PortDefinition, PortFiles, PortManifest};
pub use telemetry::init_tracing;
pub use vcpkg::VcpkgClient;
