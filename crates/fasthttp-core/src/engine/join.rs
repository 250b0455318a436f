//! Concurrent dispatch of planned ranges with a join barrier.

use std::thread;

use crate::config::CurlOptions;
use crate::error::FetchError;
use crate::fetcher;
use crate::planner::FetchRange;
use crate::sink::RandomAccessSink;

/// Result of a single range fetch: bytes written, or why it failed.
pub(super) type RangeResult = Result<u64, FetchError>;

/// Fetch every range into `sink`, one thread per range, and wait for all of
/// them. Results come back in plan order (one slot per range), regardless of
/// completion order. A lone range runs on the calling thread.
pub(super) fn run_all(
    sink: &dyn RandomAccessSink,
    url: &str,
    ranges: &[FetchRange],
    opts: &CurlOptions,
) -> Vec<RangeResult> {
    if let [range] = ranges {
        return vec![fetcher::fetch_range(sink, url, *range, opts)];
    }

    thread::scope(|scope| {
        let handles: Vec<_> = ranges
            .iter()
            .map(|&range| {
                tracing::debug!(url, ?range, "dispatching range");
                scope.spawn(move || fetcher::fetch_range(sink, url, range, opts))
            })
            .collect();

        handles
            .into_iter()
            .zip(ranges)
            .map(|(handle, range)| {
                handle.join().unwrap_or_else(|e| {
                    Err(FetchError::Worker(format!(
                        "fetcher for {:?} panicked: {:?}",
                        range, e
                    )))
                })
            })
            .collect()
    })
}

/// First failure in plan order (lowest start offset), or total bytes written.
pub(super) fn first_error(url: &str, results: Vec<RangeResult>) -> Result<u64, FetchError> {
    let mut first: Option<FetchError> = None;
    let mut total = 0u64;
    for res in results {
        match res {
            Ok(n) => total += n,
            Err(e) => {
                tracing::warn!(url, "range failed: {}", e);
                if first.is_none() {
                    first = Some(e);
                }
            }
        }
    }
    match first {
        Some(e) => Err(e),
        None => Ok(total),
    }
}
