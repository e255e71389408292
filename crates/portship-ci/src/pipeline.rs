//! Release pipeline orchestration.
//!
//! Stages run strictly top-to-bottom; a failed stage halts the run and
//! the error's exit-code mapping becomes the process outcome.

use std::path::Path;
use std::time::Instant;
use tracing::{error, info};

use portship_core::config::PackagerConfig;
use portship_core::domain::error::{PortshipError, Result};
use portship_core::domain::release::{ContentHash, ReleaseTag};
use portship_core::exec::CommandRunner;
use portship_core::git::GitClient;
use portship_core::manifest::PortFiles;
use portship_core::vcpkg::VcpkgClient;

use crate::{publish, trial};

/// Result of one pipeline stage.
#[derive(Debug, Clone)]
pub struct StageReport {
    /// Stage name.
    pub stage: &'static str,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether the stage completed.
    pub success: bool,
}

/// Result of a complete pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Tag that was packaged.
    pub tag: String,

    /// Version derived from the tag.
    pub version: String,

    /// Stages in execution order.
    pub stages: Vec<StageReport>,

    /// Whether the whole run completed.
    pub success: bool,
}

/// The five-stage release pipeline.
///
/// Holds the one piece of cross-stage state that matters: the content
/// hash recovered by the trial build, which gates the publish stage.
pub struct ReleasePipeline<'a> {
    config: &'a PackagerConfig,
    runner: &'a dyn CommandRunner,
    content_hash: Option<ContentHash>,
    default_branch: Option<String>,
    reports: Vec<StageReport>,
}

impl<'a> ReleasePipeline<'a> {
    pub fn new(config: &'a PackagerConfig, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            runner,
            content_hash: None,
            default_branch: None,
            reports: Vec::new(),
        }
    }

    fn git(&self) -> GitClient<'a> {
        GitClient::new(self.runner, &self.config.tools.git)
    }

    fn vcpkg(&self) -> VcpkgClient<'a> {
        VcpkgClient::new(
            self.runner,
            self.config.vcpkg_root.clone(),
            self.config.triplet.clone(),
        )
    }

    fn files(&self) -> PortFiles<'a> {
        PortFiles::new(&self.config.port, &self.config.checkout_dir)
    }

    fn finish_stage(&mut self, stage: &'static str, start: Instant, success: bool) {
        let duration_ms = start.elapsed().as_millis() as u64;
        if success {
            info!(stage, duration_ms, "stage completed");
        } else {
            error!(stage, duration_ms, "stage failed");
        }
        self.reports.push(StageReport {
            stage,
            duration_ms,
            success,
        });
    }

    async fn resolve_default_branch(&mut self) -> String {
        if let Some(branch) = &self.default_branch {
            return branch.clone();
        }
        let branch = self.git().default_branch().await;
        self.default_branch = Some(branch.clone());
        branch
    }

    /// Resolve the tag to package from the repository at `workdir` (the
    /// tree CI checked this job out from).
    pub async fn resolve_tag(&mut self, workdir: &Path) -> Result<ReleaseTag> {
        let start = Instant::now();
        let result = self.git().latest_tag(workdir).await;
        if let Ok(tag) = &result {
            info!(tag = %tag, version = tag.version(), "resolved release tag");
        }
        self.finish_stage("resolve-tag", start, result.is_ok());
        result
    }

    /// Destructively re-checkout the source tree at `tag`, or at the
    /// default branch when `None`.
    ///
    /// Any underlying failure -- clone, config, fetch or checkout --
    /// surfaces as a checkout error (exit 1).
    pub async fn checkout(&mut self, tag: Option<&ReleaseTag>) -> Result<()> {
        let start = Instant::now();
        let refname = match tag {
            Some(tag) => tag.as_str().to_string(),
            None => self.resolve_default_branch().await,
        };

        let result = match self.config.credentials.clone_url(&self.config.port.repo) {
            Ok(url) => {
                info!(
                    refname = %refname,
                    account = self.config.credentials.account(),
                    "checking out repository"
                );
                self.git()
                    .checkout(
                        &url,
                        &self.config.checkout_dir,
                        &refname,
                        &self.config.identity,
                    )
                    .await
                    .map_err(|e| PortshipError::Checkout(e.to_string()))
            }
            Err(e) => Err(e),
        };

        self.finish_stage("checkout", start, result.is_ok());
        result
    }

    /// Write the manifest for `tag` into the checkout and return the
    /// recipe rendered with `hash`.
    pub fn generate(&mut self, tag: &ReleaseTag, hash: &ContentHash) -> Result<String> {
        let start = Instant::now();
        info!(version = tag.version(), hash = %hash, "generating port manifest and recipe");
        let result = self.files().generate(tag, hash);
        self.finish_stage("generate", start, result.is_ok());
        result
    }

    /// Run the trial build and record the recovered content hash.
    pub async fn trial_build(&mut self, recipe: &str) -> Result<ContentHash> {
        let start = Instant::now();
        let result = trial::run(&self.vcpkg(), &self.files(), &self.config.port, recipe).await;
        if let Ok(hash) = &result {
            self.content_hash = Some(hash.clone());
        }
        self.finish_stage("trial-build", start, result.is_ok());
        result
    }

    /// Run the verified build and publish the refreshed port files.
    ///
    /// Calling this before a trial build has recovered a content hash
    /// is an ordering bug; it fails before any file or command side
    /// effect.
    pub async fn publish(&mut self, recipe: &str) -> Result<()> {
        if self.content_hash.is_none() {
            return Err(PortshipError::MissingTrialHash);
        }

        let start = Instant::now();
        let branch = self.resolve_default_branch().await;
        let result = publish::run(
            &self.git(),
            &self.vcpkg(),
            &self.files(),
            &self.config.port,
            &branch,
            recipe,
        )
        .await;
        self.finish_stage("publish", start, result.is_ok());
        result
    }

    /// Run the whole pipeline: resolve, checkout at the tag, trial
    /// build, re-checkout the default branch, verified build, publish.
    pub async fn run(mut self, workdir: &Path) -> Result<PipelineReport> {
        info!(port = %self.config.port.name, "starting release packager");

        let tag = self.resolve_tag(workdir).await?;
        self.checkout(Some(&tag)).await?;

        let recipe = self.generate(&tag, &ContentHash::placeholder())?;
        let hash = self.trial_build(&recipe).await?;

        self.checkout(None).await?;
        let recipe = self.generate(&tag, &hash)?;
        self.publish(&recipe).await?;

        info!(tag = %tag, "port published and verified");
        Ok(PipelineReport {
            tag: tag.as_str().to_string(),
            version: tag.version().to_string(),
            stages: self.reports,
            success: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use portship_core::config::{Credentials, GitIdentity, ToolPaths};
    use portship_core::exec::{CommandLine, CommandOutput};
    use portship_core::manifest::PortDefinition;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Answers every command with success and records the call.
    struct RecordingRunner {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingRunner {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, cmd: &CommandLine) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(cmd.display());
            Ok(CommandOutput {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
                duration_ms: 0,
            })
        }
    }

    /// Fails every command with the given exit code.
    struct FailingRunner {
        code: i32,
    }

    #[async_trait]
    impl CommandRunner for FailingRunner {
        async fn run(&self, cmd: &CommandLine) -> Result<CommandOutput> {
            Ok(CommandOutput {
                exit_code: self.code,
                stdout: String::new(),
                stderr: format!("{} refused", cmd.display()),
                duration_ms: 0,
            })
        }
    }

    fn test_config(root: &Path) -> PackagerConfig {
        PackagerConfig {
            credentials: Credentials::new("ci-bot", "token").unwrap(),
            port: PortDefinition::quayside(),
            identity: GitIdentity::default(),
            checkout_dir: root.join("checkout"),
            vcpkg_root: root.join("vcpkg"),
            triplet: "x64-linux".to_string(),
            tools: ToolPaths {
                git: PathBuf::from("git"),
                sudo: None,
            },
        }
    }

    #[tokio::test]
    async fn test_publish_without_trial_hash_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let runner = RecordingRunner::new();
        let mut pipeline = ReleasePipeline::new(&config, &runner);

        let err = pipeline.publish("recipe text").await.expect_err("gated");

        assert!(matches!(err, PortshipError::MissingTrialHash));
        assert_eq!(err.exit_code(), 1);
        // Nothing may run before the gate: no commands, no file writes.
        assert_eq!(runner.call_count(), 0);
        assert!(!config
            .checkout_dir
            .join("Vcpkg/ports/quayside/portfile.cmake")
            .exists());
    }

    #[tokio::test]
    async fn test_checkout_failure_maps_to_checkout_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let runner = FailingRunner { code: 128 };
        let mut pipeline = ReleasePipeline::new(&config, &runner);

        let tag = ReleaseTag::new("v1.0.0");
        let err = pipeline.checkout(Some(&tag)).await.expect_err("clone fails");

        // Checkout failures always exit 1, whatever git's own status was.
        assert!(matches!(err, PortshipError::Checkout(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_stage_reports_record_failures() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let runner = FailingRunner { code: 1 };
        let mut pipeline = ReleasePipeline::new(&config, &runner);

        let tag = ReleaseTag::new("v1.0.0");
        let _ = pipeline.checkout(Some(&tag)).await;

        assert_eq!(pipeline.reports.len(), 1);
        assert_eq!(pipeline.reports[0].stage, "checkout");
        assert!(!pipeline.reports[0].success);
    }
}
