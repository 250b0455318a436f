//! Download engine.
//!
//! Probes the resource, plans one range per worker, fetches every range
//! concurrently into a shared sink, and waits for all fetchers before
//! reporting success or the first failure in plan order. Fetchers are never
//! cancelled early; once dispatched they run to completion or failure.

mod join;
pub mod task;

use std::path::Path;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::planner::{self, DownloadPlan};
use crate::probe::{self, Resource};
use crate::sink::{FileSinkBuilder, MemorySink, RandomAccessSink};

/// Download engine carrying its configuration through every call.
#[derive(Debug, Clone, Default)]
pub struct Downloader {
    config: FetchConfig,
}

impl Downloader {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Probe `url` and plan its ranges for `workers` fetchers.
    pub fn prepare(&self, url: &str, workers: u8) -> Result<(Resource, DownloadPlan), FetchError> {
        let resource =
            probe::probe(url, &self.config.curl_options()).map_err(|source| FetchError::Probe {
                url: url.to_string(),
                source,
            })?;
        let plan = planner::plan(resource.length, workers)?;
        tracing::info!(
            url,
            length = resource.length,
            requested = workers,
            workers = plan.worker_count(),
            "planned download"
        );
        Ok((resource, plan))
    }

    /// Fetch every range of `plan` into `sink` and join. Returns bytes written.
    pub fn execute(
        &self,
        url: &str,
        plan: &DownloadPlan,
        sink: &dyn RandomAccessSink,
    ) -> Result<u64, FetchError> {
        let opts = self.config.curl_options();
        let results = join::run_all(sink, url, plan.ranges(), &opts);
        let written = join::first_error(url, results)?;
        tracing::info!(url, bytes = written, "download complete");
        Ok(written)
    }

    /// Probe, plan and fetch `url` into a caller-provided sink.
    pub fn download(
        &self,
        url: &str,
        workers: u8,
        sink: &dyn RandomAccessSink,
    ) -> Result<Resource, FetchError> {
        let (resource, plan) = self.prepare(url, workers)?;
        self.execute(url, &plan, sink)?;
        Ok(resource)
    }

    /// Download `url` into memory and return its bytes.
    pub fn fetch_to_memory(&self, url: &str, workers: u8) -> Result<Vec<u8>, FetchError> {
        let (resource, plan) = self.prepare(url, workers)?;
        let sink = if resource.length > 0 {
            MemorySink::with_length(resource.length).map_err(FetchError::storage)?
        } else {
            MemorySink::with_capacity(self.config.memory_reserve_bytes)
        };
        self.execute(url, &plan, &sink)?;
        Ok(sink.into_inner())
    }

    /// Download `url` to `path`, creating parent directories as needed.
    ///
    /// Bytes land in `<path>.part`, which replaces `path` only on success and
    /// is removed on failure.
    pub fn fetch_to_file(&self, url: &str, path: &Path, workers: u8) -> Result<(), FetchError> {
        let (resource, plan) = self.prepare(url, workers)?;

        let mut builder =
            FileSinkBuilder::create(path).map_err(|e| FetchError::storage_at(path, e))?;
        if let Err(e) = builder.preallocate(resource.length) {
            let sink = builder.build();
            let part = sink.part_path().to_path_buf();
            sink.discard();
            return Err(FetchError::storage_at(part, e));
        }
        let sink = builder.build();

        if let Err(e) = self.execute(url, &plan, &sink) {
            sink.discard();
            return Err(e);
        }
        sink.finalize(self.config.sync_on_finish)
            .map_err(|e| FetchError::storage_at(path, e))?;
        Ok(())
    }
}

/// Download `url` into memory with the default configuration.
pub fn fetch_to_memory(url: &str, workers: u8) -> Result<Vec<u8>, FetchError> {
    Downloader::default().fetch_to_memory(url, workers)
}

/// Download `url` to `path` with the default configuration.
pub fn fetch_to_file(url: &str, path: &Path, workers: u8) -> Result<(), FetchError> {
    Downloader::default().fetch_to_file(url, path, workers)
}
