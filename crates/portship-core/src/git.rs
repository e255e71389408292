//! Git collaborator: tag discovery, destructive re-checkout, and the
//! commit/push plumbing used when publishing port files.

use std::path::Path;
use tracing::info;

use crate::config::{CloneUrl, GitIdentity};
use crate::domain::error::{PortshipError, Result};
use crate::domain::release::ReleaseTag;
use crate::exec::{CommandLine, CommandOutput, CommandRunner};

/// Thin wrapper over the git CLI.
///
/// Every operation checks the underlying command's exit status; there is
/// no "the directory exists, so it probably worked" signal anywhere.
pub struct GitClient<'a> {
    runner: &'a dyn CommandRunner,
    git: String,
}

impl<'a> GitClient<'a> {
    /// `git` is the resolved path discovered at startup.
    pub fn new(runner: &'a dyn CommandRunner, git: &Path) -> Self {
        Self {
            runner,
            git: git.to_string_lossy().into_owned(),
        }
    }

    fn cmd(&self, cwd: Option<&Path>, args: &[&str], elevated: bool) -> CommandLine {
        let mut cmd = CommandLine::new(&self.git).args(args.iter().copied());
        if let Some(dir) = cwd {
            cmd = cmd.current_dir(dir);
        }
        if elevated {
            cmd = cmd.elevated();
        }
        cmd
    }

    async fn run_checked(&self, cwd: Option<&Path>, args: &[&str]) -> Result<CommandOutput> {
        self.runner.run_checked(&self.cmd(cwd, args, false)).await
    }

    /// Tag reachable from the most recent tagged commit in `dir` --
    /// recency order, not lexical or semver order.
    ///
    /// A repository without tags is a fatal configuration problem for a
    /// release pipeline.
    pub async fn latest_tag(&self, dir: &Path) -> Result<ReleaseTag> {
        let output = self
            .run_checked(Some(dir), &["rev-list", "--tags", "--max-count=1"])
            .await?;
        let sha = output.stdout.trim().to_string();
        if sha.is_empty() {
            return Err(PortshipError::Git(
                "repository has no tags to release from".to_string(),
            ));
        }

        let output = self
            .run_checked(Some(dir), &["describe", "--tags", sha.as_str()])
            .await?;
        let tag = output.stdout.trim().to_string();
        if tag.is_empty() {
            return Err(PortshipError::Git(format!(
                "git describe produced no tag for {sha}"
            )));
        }
        Ok(ReleaseTag::new(tag))
    }

    /// Configured default branch (`init.defaultBranch`), falling back to
    /// the literal `main` when unset or unreadable.
    pub async fn default_branch(&self) -> String {
        match self
            .runner
            .run(&self.cmd(None, &["config", "--get", "init.defaultBranch"], false))
            .await
        {
            Ok(output) if output.success() && !output.stdout.trim().is_empty() => {
                output.stdout.trim().to_string()
            }
            _ => "main".to_string(),
        }
    }

    /// Destructively re-clone `url` into `dir` at depth 1, configure the
    /// commit-author identity, fetch all tags, and check out `refname`.
    ///
    /// Removes any pre-existing tree at `dir` first. Each git command's
    /// outcome is checked and propagated.
    pub async fn checkout(
        &self,
        url: &CloneUrl,
        dir: &Path,
        refname: &str,
        identity: &GitIdentity,
    ) -> Result<()> {
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }

        let dir_arg = dir.to_string_lossy().into_owned();
        let clone = CommandLine::new(&self.git)
            .args(["clone", url.as_str(), dir_arg.as_str(), "--depth=1"])
            .display_as(format!(
                "{} clone {} {} --depth=1",
                self.git,
                url.redacted(),
                dir_arg
            ));
        self.runner.run_checked(&clone).await?;

        self.run_checked(Some(dir), &["config", "user.email", identity.email.as_str()])
            .await?;
        self.run_checked(Some(dir), &["config", "user.name", identity.name.as_str()])
            .await?;
        self.run_checked(Some(dir), &["fetch", "-at"]).await?;
        self.run_checked(Some(dir), &["checkout", refname]).await?;

        info!(refname, dir = %dir.display(), "checkout complete");
        Ok(())
    }

    /// Stage everything in `dir`.
    pub async fn add_all(&self, dir: &Path, elevated: bool) -> Result<()> {
        self.runner
            .run_checked(&self.cmd(Some(dir), &["add", "."], elevated))
            .await?;
        Ok(())
    }

    /// Commit staged changes in `dir`.
    pub async fn commit(&self, dir: &Path, message: &str, elevated: bool) -> Result<()> {
        self.runner
            .run_checked(&self.cmd(Some(dir), &["commit", "-m", message], elevated))
            .await?;
        Ok(())
    }

    /// Pin `pull` to a non-rebasing merge in `dir`.
    pub async fn config_pull_no_rebase(&self, dir: &Path) -> Result<()> {
        self.run_checked(Some(dir), &["config", "pull.rebase", "false"])
            .await?;
        Ok(())
    }

    /// Pull the current branch in `dir`.
    pub async fn pull(&self, dir: &Path) -> Result<()> {
        self.run_checked(Some(dir), &["pull"]).await?;
        Ok(())
    }

    /// Push `branch` to origin from `dir`.
    pub async fn push(&self, dir: &Path, branch: &str) -> Result<()> {
        self.run_checked(Some(dir), &["push", "origin", branch])
            .await?;
        Ok(())
    }
}
