//! portship - automated vcpkg port publishing for Stevedores releases.
//!
//! Resolves the latest quayside release tag from the ambient checkout,
//! re-checks-out the source tree, and drives the trial/verified vcpkg
//! install cycle that recovers and registers the release's content hash.
//!
//! Exit behavior: 0 on full success; 1 when the checkout fails or the
//! trial build yields no hash; the verification install's own exit code
//! when it is the step that fails.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, Level};

use portship_ci::ReleasePipeline;
use portship_core::config::{
    Credentials, GitIdentity, PackagerConfig, ToolPaths, DEFAULT_TRIPLET, DEFAULT_VCPKG_ROOT,
};
use portship_core::exec::ProcessRunner;
use portship_core::manifest::PortDefinition;
use portship_core::PortshipError;

#[derive(Parser)]
#[command(name = "portship")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Publish the quayside vcpkg port for the latest release", long_about = None)]
struct Cli {
    /// GitHub account used for the authenticated checkout
    account: String,

    /// Access token for the account
    #[arg(env = "PORTSHIP_TOKEN")]
    token: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Directory the source tree is re-cloned into
    /// (default: ~/quayside)
    #[arg(long)]
    checkout_dir: Option<PathBuf>,

    /// Root of the system-wide vcpkg installation
    #[arg(long, default_value = DEFAULT_VCPKG_ROOT)]
    vcpkg_root: PathBuf,

    /// Target triplet passed to vcpkg install
    #[arg(long, default_value = DEFAULT_TRIPLET)]
    triplet: String,

    /// Run elevated steps directly instead of through sudo
    #[arg(long)]
    no_sudo: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    portship_core::init_tracing(cli.json, level);

    match run(cli).await {
        Ok(()) => {}
        Err(err) => {
            let code = err
                .downcast_ref::<PortshipError>()
                .map(PortshipError::exit_code)
                .unwrap_or(1);
            error!(error = %err, exit_code = code, "release pipeline failed");
            std::process::exit(code);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let credentials = Credentials::new(cli.account, cli.token)?;
    let tools = ToolPaths::discover(cli.no_sudo)?;
    let port = PortDefinition::quayside();

    let checkout_dir = match cli.checkout_dir {
        Some(dir) => dir,
        None => dirs::home_dir()
            .context("cannot determine home directory")?
            .join(&port.name),
    };

    let config = PackagerConfig {
        credentials,
        port,
        identity: GitIdentity::default(),
        checkout_dir,
        vcpkg_root: cli.vcpkg_root,
        triplet: cli.triplet,
        tools,
    };

    let runner = ProcessRunner::new(config.tools.sudo.clone());
    let workdir = std::env::current_dir().context("cannot determine working directory")?;

    let report = ReleasePipeline::new(&config, &runner)
        .run(&workdir)
        .await?;

    info!(
        tag = %report.tag,
        version = %report.version,
        stages = report.stages.len(),
        "release pipeline completed"
    );
    Ok(())
}
