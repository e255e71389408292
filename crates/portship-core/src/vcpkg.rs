//! vcpkg collaborator: the CLI and the system-wide ports tree.
//!
//! Every mutation of the global installation goes through here, so the
//! per-step read/write contract on that shared tree sits behind one seam
//! and tests can point it at a temporary directory.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::error::Result;
use crate::exec::{CommandLine, CommandOutput, CommandRunner};

/// Wrapper over one vcpkg installation rooted at `root`.
pub struct VcpkgClient<'a> {
    runner: &'a dyn CommandRunner,
    root: PathBuf,
    triplet: String,
}

impl<'a> VcpkgClient<'a> {
    pub fn new(runner: &'a dyn CommandRunner, root: impl Into<PathBuf>, triplet: impl Into<String>) -> Self {
        Self {
            runner,
            root: root.into(),
            triplet: triplet.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn vcpkg_bin(&self) -> String {
        self.root.join("vcpkg").to_string_lossy().into_owned()
    }

    /// `ports` directory of this installation.
    pub fn ports_dir(&self) -> PathBuf {
        self.root.join("ports")
    }

    /// One port's directory inside this installation.
    pub fn port_dir(&self, name: &str) -> PathBuf {
        self.ports_dir().join(name)
    }

    /// Version-registration record written by `x-add-version`.
    pub fn version_record_path(&self, name: &str, bucket: &str) -> PathBuf {
        self.root.join("versions").join(bucket).join(format!("{name}.json"))
    }

    /// Debug-build install log for one port, the diagnostic of last
    /// resort when the verification install fails.
    pub fn build_log_path(&self, name: &str) -> PathBuf {
        self.root
            .join("buildtrees")
            .join(name)
            .join(format!("install-{}-dbg-out.log", self.triplet))
    }

    /// Ensure the global directory for `name` exists (elevated).
    pub async fn ensure_port_dir(&self, name: &str) -> Result<()> {
        let dir = self.port_dir(name).to_string_lossy().into_owned();
        let cmd = CommandLine::new("mkdir").args(["-p", dir.as_str()]).elevated();
        self.runner.run_checked(&cmd).await?;
        Ok(())
    }

    /// Copy one file into the global directory for `name` (elevated).
    pub async fn install_file(&self, src: &Path, name: &str, file_name: &str) -> Result<()> {
        let src = src.to_string_lossy().into_owned();
        let dst = self
            .port_dir(name)
            .join(file_name)
            .to_string_lossy()
            .into_owned();
        let cmd = CommandLine::new("cp")
            .args(["-v", "-R", src.as_str(), dst.as_str()])
            .elevated();
        self.runner.run_checked(&cmd).await?;
        Ok(())
    }

    /// Mirror every locally tracked port into the global tree
    /// (elevated). Deliberately broader than this one port: any other
    /// local port change rides along.
    pub async fn mirror_ports(&self, local_ports_dir: &Path) -> Result<()> {
        let dst = self.ports_dir().to_string_lossy().into_owned();
        for entry in std::fs::read_dir(local_ports_dir)? {
            let entry = entry?;
            let src = entry.path().to_string_lossy().into_owned();
            let cmd = CommandLine::new("cp")
                .args(["-v", "-R", src.as_str(), dst.as_str()])
                .elevated();
            self.runner.run_checked(&cmd).await?;
        }
        Ok(())
    }

    /// `vcpkg install <name>:<triplet>` (elevated).
    ///
    /// A nonzero exit is returned in the output, not as an error: the
    /// trial build counts on failing, and the verification install's
    /// exit code is the pipeline's outcome.
    pub async fn install(&self, name: &str) -> Result<CommandOutput> {
        let spec = format!("{name}:{}", self.triplet);
        let cmd = CommandLine::new(self.vcpkg_bin())
            .args(["install", spec.as_str()])
            .elevated();
        debug!(spec = %spec, "running vcpkg install");
        self.runner.run(&cmd).await
    }

    /// `vcpkg format-manifest` on the global copy of `name`'s manifest
    /// (elevated, run from the tree root).
    pub async fn format_manifest(&self, name: &str) -> Result<()> {
        let manifest = format!("./ports/{name}/vcpkg.json");
        let cmd = CommandLine::new(self.vcpkg_bin())
            .args(["format-manifest", manifest.as_str()])
            .current_dir(&self.root)
            .elevated();
        self.runner.run_checked(&cmd).await?;
        Ok(())
    }

    /// `vcpkg x-add-version <name>` (elevated): record the manifest's
    /// version against the port's current tree.
    pub async fn add_version(&self, name: &str) -> Result<()> {
        let cmd = CommandLine::new(self.vcpkg_bin())
            .args(["x-add-version", name])
            .current_dir(&self.root)
            .elevated();
        self.runner.run_checked(&cmd).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::PortshipError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every command line; answers all of them with success.
    struct RecordingRunner {
        calls: Mutex<Vec<CommandLine>>,
    }

    impl RecordingRunner {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn displays(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(CommandLine::display).collect()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, cmd: &CommandLine) -> std::result::Result<CommandOutput, PortshipError> {
            self.calls.lock().unwrap().push(cmd.clone());
            Ok(CommandOutput {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
                duration_ms: 0,
            })
        }
    }

    #[test]
    fn test_tree_paths() {
        let runner = RecordingRunner::new();
        let vcpkg = VcpkgClient::new(&runner, "/usr/local/share/vcpkg", "x64-linux");

        assert_eq!(
            vcpkg.port_dir("quayside"),
            PathBuf::from("/usr/local/share/vcpkg/ports/quayside")
        );
        assert_eq!(
            vcpkg.version_record_path("quayside", "q-"),
            PathBuf::from("/usr/local/share/vcpkg/versions/q-/quayside.json")
        );
        assert_eq!(
            vcpkg.build_log_path("quayside"),
            PathBuf::from(
                "/usr/local/share/vcpkg/buildtrees/quayside/install-x64-linux-dbg-out.log"
            )
        );
    }

    #[tokio::test]
    async fn test_install_targets_triplet() {
        let runner = RecordingRunner::new();
        let vcpkg = VcpkgClient::new(&runner, "/opt/vcpkg", "x64-linux");
        vcpkg.install("quayside").await.unwrap();

        let displays = runner.displays();
        assert_eq!(displays.len(), 1);
        assert!(displays[0].ends_with("vcpkg install quayside:x64-linux"));
    }

    #[tokio::test]
    async fn test_elevated_commands_marked() {
        let runner = RecordingRunner::new();
        let vcpkg = VcpkgClient::new(&runner, "/opt/vcpkg", "x64-linux");
        vcpkg.ensure_port_dir("quayside").await.unwrap();
        vcpkg.format_manifest("quayside").await.unwrap();
        vcpkg.add_version("quayside").await.unwrap();

        let calls = runner.calls.lock().unwrap();
        assert!(calls.iter().all(|c| c.elevated));
    }

    #[tokio::test]
    async fn test_format_manifest_runs_from_tree_root() {
        let runner = RecordingRunner::new();
        let vcpkg = VcpkgClient::new(&runner, "/opt/vcpkg", "x64-linux");
        vcpkg.format_manifest("quayside").await.unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].cwd.as_deref(), Some(Path::new("/opt/vcpkg")));
        assert!(calls[0].args.contains(&"./ports/quayside/vcpkg.json".to_string()));
    }
}
