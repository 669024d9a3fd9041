//! The `build` subcommand

use crate::display::{display_info, display_warning, print_build_summary};
use crate::progress::ProgressTicker;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use rome_build::{BuildTagConfig, BuildTagTransformer, DirectoryCleaner};
use rome_config::RomeConfig;
use rome_engine::{Mirror, MirrorConfig, MirrorReport, SkipRules};
use rome_types::{BuildTarget, Clean, QueueCapacity, WorkerCount};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Arguments of `rome build`
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Source folder to build from
    pub source: PathBuf,

    /// Where the built files are put
    #[arg(short, long)]
    pub destination: PathBuf,

    /// Version being built
    #[arg(short = 'v', long = "version")]
    pub version: String,

    /// Flavor being built (falls back to `build.flavor` from the config)
    #[arg(short, long)]
    pub flavor: Option<String>,

    /// Remove an existing build before building
    #[arg(long)]
    pub clean: bool,

    /// Number of workers processing files
    #[arg(long)]
    pub file_workers: Option<usize>,

    /// Capacity of the file queue
    #[arg(long)]
    pub file_buffer_size: Option<usize>,

    /// Number of workers processing symlinks
    #[arg(long)]
    pub symlink_workers: Option<usize>,

    /// Capacity of the symlink queue
    #[arg(long)]
    pub symlink_buffer_size: Option<usize>,

    /// Directory to leave out, relative to the source (repeatable)
    #[arg(long = "skip", value_name = "RULE")]
    pub skip: Vec<String>,

    /// Ignore the skip rules from the configuration
    #[arg(long)]
    pub no_default_skips: bool,
}

/// How a build ended, when it did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every entry was mirrored
    Success,
    /// The run finished but some entries failed
    CompletedWithErrors,
    /// The run was interrupted
    Cancelled,
}

impl Outcome {
    /// Classify a finished run
    pub fn from_report(report: &MirrorReport) -> Self {
        if report.cancelled {
            Self::Cancelled
        } else if report.has_failures() {
            Self::CompletedWithErrors
        } else {
            Self::Success
        }
    }

    /// Process exit code
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::CompletedWithErrors => 2,
            Self::Cancelled => 130,
        }
    }
}

/// Merge command line flags over the loaded configuration
pub fn mirror_config(args: &BuildArgs, config: &RomeConfig) -> Result<MirrorConfig> {
    let flavor = args
        .flavor
        .clone()
        .or_else(|| config.build.flavor.clone())
        .context("A flavor is required: pass --flavor or set build.flavor")?;

    let file_workers = worker_count(args.file_workers, config.workers.file_workers, "--file-workers")?;
    let file_capacity = queue_capacity(
        args.file_buffer_size,
        config.workers.file_queue_capacity,
        "--file-buffer-size",
    )?;
    let link_workers = worker_count(
        args.symlink_workers,
        config.workers.link_workers,
        "--symlink-workers",
    )?;
    let link_capacity = queue_capacity(
        args.symlink_buffer_size,
        config.workers.link_queue_capacity,
        "--symlink-buffer-size",
    )?;

    let mut rules = if args.no_default_skips {
        Vec::new()
    } else {
        config.skip.clone()
    };
    rules.extend(args.skip.iter().cloned());
    let skip = SkipRules::new(&rules)?;

    Ok(MirrorConfig::new(
        &args.source,
        &args.destination,
        BuildTarget::new(flavor, &args.version),
    )
    .with_file_pool(file_workers, file_capacity)
    .with_link_pool(link_workers, link_capacity)
    .with_skip_rules(skip))
}

fn worker_count(flag: Option<usize>, configured: WorkerCount, name: &str) -> Result<WorkerCount> {
    flag.map_or(Ok(configured), |n| {
        WorkerCount::new(n).map_err(|e| anyhow!("{}: {}", name, e))
    })
}

fn queue_capacity(
    flag: Option<usize>,
    configured: QueueCapacity,
    name: &str,
) -> Result<QueueCapacity> {
    flag.map_or(Ok(configured), |n| {
        QueueCapacity::new(n).map_err(|e| anyhow!("{}: {}", name, e))
    })
}

/// Content transform configured from the `build` section
pub fn transformer(config: &RomeConfig) -> BuildTagTransformer {
    BuildTagTransformer::new(BuildTagConfig {
        version_token: config.build.version_token.clone(),
        flavor_token: config.build.flavor_token.clone(),
        flavor_order: config.build.flavor_order.clone(),
    })
}

/// Run `rome build`
pub async fn build_command(args: BuildArgs, config: &RomeConfig, quiet: bool) -> Result<Outcome> {
    if !args.source.is_dir() {
        return Err(anyhow!(
            "Source path ({}) does not exist",
            args.source.display()
        ));
    }

    let mirror_config = mirror_config(&args, config)?;

    let mut clean = args.clean;
    if !args.destination.exists() {
        if !quiet {
            display_info(&format!(
                "Destination path ({}) does not exist, creating it",
                args.destination.display()
            ));
        }
        std::fs::create_dir_all(&args.destination).with_context(|| {
            format!("Could not create destination {}", args.destination.display())
        })?;
        // nothing to clean in a directory we just made
        clean = false;
    }

    if clean {
        if !quiet {
            display_info(&format!("Cleaning {}", args.destination.display()));
        }
        DirectoryCleaner::new()
            .clean(&args.destination)
            .await
            .with_context(|| format!("Could not clean {}", args.destination.display()))?;
    }

    if !quiet {
        display_info(&format!("Starting rome on {}...", args.source.display()));
    }

    let mirror = Mirror::new(mirror_config, Arc::new(transformer(config)));
    info!("Build run {}", mirror.run_id());

    let cancel = mirror.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping workers");
            cancel.cancel();
        }
    });

    let ticker = ProgressTicker::start(mirror.progress(), quiet);
    let result = mirror.run().await;
    ticker.finish();
    interrupt.abort();

    let report = result?;
    if !quiet || report.has_failures() {
        print_build_summary(&report);
    }

    let outcome = Outcome::from_report(&report);
    if outcome == Outcome::Cancelled && !quiet {
        display_warning("Build cancelled, the destination is incomplete");
    }
    Ok(outcome)
}
