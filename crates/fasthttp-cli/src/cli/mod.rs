//! CLI for fasthttp parallel range downloads.

mod get;
mod mirror;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fasthttp_core::config::{self, FetchConfig};
use fasthttp_core::planner::worker_count;
use std::path::PathBuf;

use get::run_get;
use mirror::run_mirror;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fasthttp-get")]
#[command(about = "Fast HTTP downloads over parallel byte-range requests", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/fasthttp/config.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one resource to a file, or to stdout when no path is given.
    Get {
        /// HTTP/HTTPS URL to download.
        url: String,
        /// Destination file. Parent directories are created.
        path: Option<PathBuf>,
        /// Number of parallel connections (1-255).
        #[arg(short = 't', long, value_name = "N")]
        threads: Option<u64>,
    },

    /// Mirror a directory listing (URL ending in '/') into a local directory.
    Mirror {
        /// Directory or file URL. A numeric fragment (e.g. #8) sets the thread count.
        url: String,
        /// Local destination directory.
        dest: PathBuf,
        /// Number of parallel connections per file (1-255).
        #[arg(short = 't', long, value_name = "N")]
        threads: Option<u64>,
        /// Maximum directory depth below the starting URL.
        #[arg(long, default_value = "8", value_name = "D")]
        max_depth: usize,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get { url, path, threads } => {
                let workers = resolve_workers(threads, &cfg)?;
                run_get(cfg, url, path, workers).await?;
            }
            CliCommand::Mirror {
                url,
                dest,
                threads,
                max_depth,
            } => {
                let workers = resolve_workers(threads, &cfg)?;
                run_mirror(cfg, url, dest, workers, max_depth).await?;
            }
        }

        Ok(())
    }
}

/// Worker count from the flag, else the config default; must fit in a byte.
fn resolve_workers(flag: Option<u64>, cfg: &FetchConfig) -> Result<u8> {
    let requested = flag.unwrap_or(u64::from(cfg.workers));
    Ok(worker_count(requested)?)
}
