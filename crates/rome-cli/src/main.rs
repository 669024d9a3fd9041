//! rome - builds an installable product flavor from a source tree
//!
//! Mirrors a source folder into a destination folder, stamping version and
//! flavor tags into every text file and recreating symbolic links as they are.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use rome_config::{ConfigLoader, LogFormat, OutputFormat, RomeConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

mod build;
mod display;
mod progress;

use build::{build_command, BuildArgs};
use display::display_error;

/// rome - build a flavor of the product from its source tree
#[derive(Parser)]
#[command(
    name = "rome",
    version = env!("CARGO_PKG_VERSION"),
    about = "Build an installable product flavor from a source tree",
    long_about = "rome takes a source checkout, substitutes the build tags for the requested\n\
                  flavor and version, and writes an installable copy to the destination.\n\
                  Files are processed by a pool of workers; symlinks are recreated as-is."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a flavor from a source folder
    #[command(disable_version_flag = true)]
    Build(BuildArgs),
    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: FormatArg,
        /// Write to FILE instead of printing; the format follows its extension
        #[arg(short, long, value_name = "FILE", conflicts_with = "format")]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(ValueEnum, Clone, Copy)]
enum FormatArg {
    Yaml,
    Toml,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Yaml => OutputFormat::Yaml,
            FormatArg::Toml => OutputFormat::Toml,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            display_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config = load_config(cli.config.as_ref())?;

    let format = cli.log_format.map_or(config.logging.format, LogFormat::from);
    init_logging(cli.debug, cli.quiet, cli.verbose, &config.logging.level, format)?;

    info!("rome v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Build(args) => {
            let outcome = build_command(args, &config, cli.quiet).await?;
            Ok(outcome.exit_code())
        }
        Commands::Config {
            default,
            format,
            output,
        } => {
            config_command(&config, default, format.into(), output.as_deref())?;
            Ok(0)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<RomeConfig> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => ConfigLoader::load_default().context("Failed to load configuration"),
    }
}

fn init_logging(
    debug: bool,
    quiet: bool,
    verbose: bool,
    configured: &str,
    format: LogFormat,
) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        configured
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log filter")?;

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))
}

fn config_command(
    config: &RomeConfig,
    default: bool,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let (title, shown) = if default {
        ("Default configuration:", RomeConfig::default())
    } else {
        ("Current configuration:", config.clone())
    };

    if let Some(path) = output {
        ConfigLoader::save_to_file(&shown, path)
            .with_context(|| format!("Failed to write configuration to {}", path.display()))?;
        println!(
            "{} Configuration written to {}",
            style("✓").green().bold(),
            path.display()
        );
        return Ok(());
    }

    println!("{} {}", style("⚙").blue().bold(), title);
    print!("{}", ConfigLoader::render(&shown, format)?);
    Ok(())
}
