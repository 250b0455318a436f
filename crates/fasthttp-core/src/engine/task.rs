//! Async entry points: run the blocking engine on tokio's blocking pool.

use std::path::PathBuf;

use super::Downloader;
use crate::error::FetchError;

/// Async `Downloader::fetch_to_memory`.
pub async fn fetch_to_memory(
    downloader: Downloader,
    url: String,
    workers: u8,
) -> Result<Vec<u8>, FetchError> {
    tokio::task::spawn_blocking(move || downloader.fetch_to_memory(&url, workers))
        .await
        .map_err(|e| FetchError::Worker(e.to_string()))?
}

/// Async `Downloader::fetch_to_file`.
pub async fn fetch_to_file(
    downloader: Downloader,
    url: String,
    path: PathBuf,
    workers: u8,
) -> Result<(), FetchError> {
    tokio::task::spawn_blocking(move || downloader.fetch_to_file(&url, &path, workers))
        .await
        .map_err(|e| FetchError::Worker(e.to_string()))?
}
