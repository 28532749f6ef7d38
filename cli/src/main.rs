//! CloudCAFE CLI - inspect a config file and what it resolves to.
//!
//! ```text
//! cloudcafe [--config FILE] sections
//! cloudcafe [--config FILE] endpoints
//! cloudcafe [--config FILE] datasets <KIND>
//! ```
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `info`). Command output
//! goes to stdout.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cloudcafe_composites::CloudComposite;
use cloudcafe_config::CafeConfig;

#[derive(Debug, Parser)]
#[command(name = "cloudcafe", about = "Inspect CloudCAFE config, catalogs and datasets.")]
struct Cli {
    /// Config file. Defaults to `CAFE_CONFIG_FILE_PATH`, then
    /// `~/.cloudcafe/config.toml`.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the config file's sections.
    Sections,
    /// Authenticate and print the URL each service resolves to.
    Endpoints,
    /// Build a dataset list from live listings and print its names.
    Datasets {
        #[arg(value_enum)]
        kind: DatasetKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DatasetKind {
    Images,
    Flavors,
    VolumeTypes,
    VolumeTypesWithImages,
    ImageFormats,
    Drivers,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<CafeConfig> {
    let config = match path {
        Some(path) => CafeConfig::load_from(path),
        None => CafeConfig::load(),
    };
    config.context("failed to load CloudCAFE config")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    if let Some(path) = config.path() {
        tracing::debug!(path = %path.display(), "Loaded config");
    }

    let output = match cli.command {
        Command::Sections => commands::sections(&config),
        Command::Endpoints => {
            let cloud = CloudComposite::new(config).context("failed to set up auth")?;
            commands::endpoints(&cloud).await
        }
        Command::Datasets { kind } => {
            let cloud = CloudComposite::new(config).context("failed to set up auth")?;
            commands::datasets(&cloud, kind).await?
        }
    };
    print!("{output}");
    Ok(())
}
