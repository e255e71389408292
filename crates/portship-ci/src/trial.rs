//! Trial build: an intentionally hash-mismatched install whose failure
//! diagnostics carry the real content hash.

use tracing::{error, info};

use portship_core::domain::error::{PortshipError, Result};
use portship_core::domain::release::ContentHash;
use portship_core::hash::extract_actual_hash;
use portship_core::manifest::{PortDefinition, PortFiles};
use portship_core::vcpkg::VcpkgClient;

/// Install the manifest and placeholder recipe into the global tree and
/// scrape the real hash out of the install failure.
///
/// The install command failing is expected here; the output lacking an
/// `Actual hash:` line is the real error.
pub(crate) async fn run(
    vcpkg: &VcpkgClient<'_>,
    files: &PortFiles<'_>,
    port: &PortDefinition,
    recipe: &str,
) -> Result<ContentHash> {
    info!(port = %port.name, "starting trial build");

    vcpkg.ensure_port_dir(&port.name).await?;
    vcpkg
        .install_file(&files.manifest_path(), &port.name, "vcpkg.json")
        .await?;

    // Relay the recipe through a temp file so the elevated copy can
    // read it.
    let staged = tempfile::NamedTempFile::new()?;
    std::fs::write(staged.path(), recipe)?;
    vcpkg
        .install_file(staged.path(), &port.name, "portfile.cmake")
        .await?;

    let output = vcpkg.install(&port.name).await?;
    match extract_actual_hash(&output.combined()) {
        Some(hash) => {
            info!(hash = %hash, "recovered content hash from trial build");
            Ok(hash)
        }
        None => {
            error!(
                exit_code = output.exit_code,
                "trial build output contained no content hash"
            );
            Err(PortshipError::HashNotFound)
        }
    }
}
