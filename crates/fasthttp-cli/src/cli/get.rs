//! Get command: one resource to a file or stdout.

use anyhow::{Context, Result};
use fasthttp_core::config::FetchConfig;
use fasthttp_core::engine::task;
use fasthttp_core::Downloader;
use std::io::Write;
use std::path::PathBuf;

pub async fn run_get(
    cfg: FetchConfig,
    url: String,
    path: Option<PathBuf>,
    workers: u8,
) -> Result<()> {
    let downloader = Downloader::new(cfg);
    match path {
        Some(path) => {
            task::fetch_to_file(downloader, url.clone(), path.clone(), workers)
                .await
                .with_context(|| format!("downloading {}", url))?;
            tracing::info!("saved {} to {}", url, path.display());
        }
        None => {
            let bytes = task::fetch_to_memory(downloader, url.clone(), workers)
                .await
                .with_context(|| format!("downloading {}", url))?;
            let mut out = std::io::stdout().lock();
            out.write_all(&bytes).context("writing to stdout")?;
            out.flush()?;
        }
    }
    Ok(())
}
