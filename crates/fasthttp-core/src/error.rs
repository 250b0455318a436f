//! Error types for probing, planning, fetching and storage.
//!
//! Every error is fatal to the download call that produced it. Callers get a
//! single `FetchError` per call; a sink left behind by a failed call must be
//! treated as invalid.

use std::path::PathBuf;

use thiserror::Error;

use crate::planner::FetchRange;

/// Failure of the metadata (HEAD) request.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The request could not be performed (DNS, connect, TLS, ...).
    #[error("metadata request failed: {0}")]
    Request(#[source] curl::Error),
    /// The server answered with a non-success status.
    #[error("bad response code: {0}")]
    BadStatus(u32),
}

/// Invalid worker count handed to the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("cannot plan a download with zero workers")]
    ZeroWorkers,
    #[error("invalid worker count {0}: must fit in a single byte (1..=255)")]
    TooManyWorkers(u64),
}

/// Outcome error of one download call.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("probing {url}: {source}")]
    Probe {
        url: String,
        #[source]
        source: ProbeError,
    },

    #[error(transparent)]
    Plan(#[from] PlanError),

    /// A GET returned a status other than the one its range requires.
    #[error("bad response code: {actual} (expected {expected}){}", describe_range(.range))]
    RangeRequest {
        expected: u32,
        actual: u32,
        range: FetchRange,
    },

    /// The body stream failed mid-transfer.
    #[error("transfer failed{}: {source}", describe_range(.range))]
    Transfer {
        range: FetchRange,
        #[source]
        source: curl::Error,
    },

    /// The destination could not be created or written.
    #[error("storage error{}: {source}", describe_path(.path))]
    Storage {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// A fetch worker panicked or a blocking task could not be joined.
    #[error("fetch worker failed: {0}")]
    Worker(String),
}

impl FetchError {
    pub(crate) fn storage(source: std::io::Error) -> Self {
        FetchError::Storage { path: None, source }
    }

    pub(crate) fn storage_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Storage {
            path: Some(path.into()),
            source,
        }
    }
}

fn describe_range(range: &FetchRange) -> String {
    match range {
        FetchRange::Whole => String::new(),
        FetchRange::Bytes { start, end } => {
            format!(" while reading bytes {} through {}", start, end)
        }
    }
}

fn describe_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" at {}", p.display()))
        .unwrap_or_default()
}
