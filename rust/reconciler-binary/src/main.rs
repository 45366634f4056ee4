use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use stackable_hdfs_resource::{ignore::PathSet, HdfsResource, ResourceAction};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::ReconcilerConfig, reconciler::Reconciler};

mod config;
mod hadoop;
mod jar_batch;
mod kerberos;
mod reconciler;
mod webhdfs;

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

const LOG_ENV_VAR: &str = "HDFS_RECONCILER_LOG";

#[derive(clap::Parser)]
#[clap(about, author)]
struct Opts {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Converge the cluster filesystem to the state declared in a manifest
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Cluster configuration (JSON)
    #[clap(long)]
    config: PathBuf,

    /// Manifest with the desired filesystem state (JSON array of resources)
    #[clap(long)]
    manifest: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    match opts.cmd {
        Command::Run(args) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .init();

            info!(
                version = built_info::PKG_VERSION,
                rustc = built_info::RUSTC_VERSION,
                target = built_info::TARGET,
                built_at = built_info::BUILT_TIME_UTC,
                "starting {}",
                built_info::PKG_NAME,
            );

            run(args).await
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = ReconcilerConfig::from_file(&args.config)
        .with_context(|| format!("cannot load config from {:?}", args.config))?;

    let ignored = match &config.ignore_file {
        Some(ignore_file) => {
            let ignored = PathSet::from_file(ignore_file)
                .with_context(|| format!("cannot load ignore list from {ignore_file:?}"))?;
            info!(paths = ignored.len(), "loaded ignore list");
            ignored
        }
        None => PathSet::default(),
    };

    let manifest = std::fs::read_to_string(&args.manifest)
        .with_context(|| format!("cannot read manifest from {:?}", args.manifest))?;
    let resources: Vec<HdfsResource> = serde_json::from_str(&manifest)
        .with_context(|| format!("cannot parse manifest from {:?}", args.manifest))?;

    let mut reconciler = Reconciler::new(config, ignored);
    for resource in resources {
        match resource.action {
            ResourceAction::Create => reconciler.create_on_execute(resource),
            ResourceAction::Delete => reconciler.delete_on_execute(resource),
            // An execute entry converges everything declared so far before
            // the remaining manifest is processed.
            ResourceAction::Execute => reconciler.execute().await?,
        }
    }
    info!(pending = reconciler.pending(), "manifest processed, flushing");
    reconciler.execute().await?;

    info!("reconciliation finished");
    Ok(())
}
