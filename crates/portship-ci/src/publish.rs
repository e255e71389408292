//! Verified build and publish: the ordered steps that land the port in
//! the global tree and push the refreshed files to the default branch.

use std::path::Path;
use tracing::{error, info, warn};

use portship_core::domain::error::{PortshipError, Result};
use portship_core::git::GitClient;
use portship_core::manifest::{PortDefinition, PortFiles};
use portship_core::vcpkg::VcpkgClient;

/// Commit message for the local-only commit inside the global tree.
const GLOBAL_COMMIT_MESSAGE: &str = "Update vcpkg port files";

/// Commit message for the checkout; the marker keeps CI from re-running
/// on its own commit.
const CHECKOUT_COMMIT_MESSAGE: &str = "Update vcpkg port files [skip ci]";

/// Run the verified build and publish the refreshed port files.
///
/// Steps run strictly in order; any failure propagates immediately with
/// no rollback of already-applied side effects. Returns `Ok` iff the
/// final verification install exits zero.
pub(crate) async fn run(
    git: &GitClient<'_>,
    vcpkg: &VcpkgClient<'_>,
    files: &PortFiles<'_>,
    port: &PortDefinition,
    default_branch: &str,
    recipe: &str,
) -> Result<()> {
    info!(port = %port.name, "starting verified build");

    // Recipe with the real hash into the checkout.
    files.write_portfile(recipe)?;

    // Manifest and recipe into the global tree.
    vcpkg
        .install_file(&files.manifest_path(), &port.name, "vcpkg.json")
        .await?;
    vcpkg
        .install_file(&files.portfile_path(), &port.name, "portfile.cmake")
        .await?;

    // Every locally tracked port rides along.
    vcpkg.mirror_ports(&files.ports_dir()).await?;

    // Let vcpkg's own tooling normalize the global manifest.
    vcpkg.format_manifest(&port.name).await?;

    // Local-only commit of the global tree; x-add-version requires a
    // clean tree there, and that checkout has no usable remote.
    git.add_all(vcpkg.root(), true).await?;
    git.commit(vcpkg.root(), GLOBAL_COMMIT_MESSAGE, true).await?;

    // Register this version against the port's current tree.
    vcpkg.add_version(&port.name).await?;

    // Refreshed manifest and the new version record back into the
    // checkout, verbatim.
    info!("copying refreshed port files back into the checkout");
    std::fs::create_dir_all(files.versions_dir())?;
    std::fs::copy(
        vcpkg.port_dir(&port.name).join("vcpkg.json"),
        files.manifest_path(),
    )?;
    std::fs::copy(
        vcpkg.version_record_path(&port.name, &port.version_bucket()),
        files.version_record_path(),
    )?;

    // Commit and push the checkout's default branch.
    let checkout = files.checkout_dir();
    git.add_all(checkout, false).await?;
    git.commit(checkout, CHECKOUT_COMMIT_MESSAGE, false).await?;
    git.config_pull_no_rebase(checkout).await?;
    git.pull(checkout).await?;
    git.push(checkout, default_branch).await?;

    // Final verification install; its exit code is the pipeline's
    // outcome.
    info!(port = %port.name, "running verification install");
    let output = vcpkg.install(&port.name).await?;
    if !output.success() {
        surface_build_log(&vcpkg.build_log_path(&port.name), output.exit_code);
        return Err(PortshipError::FinalInstall {
            code: output.exit_code,
        });
    }

    info!(port = %port.name, "verification install succeeded");
    Ok(())
}

/// Dump the port's install log for the operator; this is the only
/// diagnostic vcpkg leaves behind for a failed verification build.
fn surface_build_log(log_path: &Path, exit_code: i32) {
    match std::fs::read_to_string(log_path) {
        Ok(log) => error!(
            exit_code,
            "verification install failed; build log from {}:\n{log}",
            log_path.display()
        ),
        Err(e) => warn!(
            exit_code,
            error = %e,
            path = %log_path.display(),
            "verification install failed and the build log could not be read"
        ),
    }
}
