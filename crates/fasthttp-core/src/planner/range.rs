//! Fetch range type and plan construction.

use crate::error::PlanError;

/// Byte span fetched by one worker.
///
/// `Whole` is a plain GET of the entire resource (no `Range` header); its bytes
/// are written starting at offset 0. `Bytes` is an inclusive, zero-indexed span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRange {
    Whole,
    Bytes { start: u64, end: u64 },
}

impl FetchRange {
    /// Offset of the first byte this range writes.
    pub fn start(&self) -> u64 {
        match self {
            FetchRange::Whole => 0,
            FetchRange::Bytes { start, .. } => *start,
        }
    }

    /// Number of bytes in the span, or `None` for a whole-resource fetch.
    pub fn len(&self) -> Option<u64> {
        match self {
            FetchRange::Whole => None,
            FetchRange::Bytes { start, end } => Some(end - start + 1),
        }
    }

    pub fn is_whole(&self) -> bool {
        matches!(self, FetchRange::Whole)
    }

    /// HTTP status that counts as success for this range.
    pub fn expected_status(&self) -> u32 {
        match self {
            FetchRange::Whole => 200,
            FetchRange::Bytes { .. } => 206,
        }
    }

    /// `Range` header value (`bytes=start-end`), if this is a range request.
    pub fn header_value(&self) -> Option<String> {
        self.curl_range().map(|r| format!("bytes={}", r))
    }

    /// Range in the `start-end` form libcurl expects.
    pub(crate) fn curl_range(&self) -> Option<String> {
        match self {
            FetchRange::Whole => None,
            FetchRange::Bytes { start, end } => Some(format!("{}-{}", start, end)),
        }
    }
}

/// Ordered, gap-free, non-overlapping partition of a resource's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    ranges: Vec<FetchRange>,
}

impl DownloadPlan {
    pub fn ranges(&self) -> &[FetchRange] {
        &self.ranges
    }

    /// Number of concurrent fetchers this plan dispatches.
    pub fn worker_count(&self) -> usize {
        self.ranges.len()
    }

    /// True when the plan is a single whole-resource GET.
    pub fn is_single_stream(&self) -> bool {
        matches!(self.ranges.as_slice(), [FetchRange::Whole])
    }

    fn single_stream() -> Self {
        DownloadPlan {
            ranges: vec![FetchRange::Whole],
        }
    }
}

/// Validates an externally supplied worker count (CLI flag, URL fragment).
pub fn worker_count(requested: u64) -> Result<u8, PlanError> {
    match requested {
        0 => Err(PlanError::ZeroWorkers),
        n => u8::try_from(n).map_err(|_| PlanError::TooManyWorkers(n)),
    }
}

/// Splits `length` bytes across `workers` fetchers.
///
/// An unknown length (0), a length smaller than the worker count, or a single
/// worker yields one whole-resource fetch. Otherwise every range is
/// `length / workers` bytes long, and the first one also takes the
/// `length % workers` leftover bytes.
pub fn plan(length: u64, workers: u8) -> Result<DownloadPlan, PlanError> {
    if workers == 0 {
        return Err(PlanError::ZeroWorkers);
    }

    let n = u64::from(workers);
    if workers == 1 || length < n {
        return Ok(DownloadPlan::single_stream());
    }

    let block = length / n;
    let mut remainder = length % n;

    let mut ranges = Vec::with_capacity(workers as usize);
    let mut offset = 0u64;
    while offset < length {
        let end = offset + block + remainder - 1;
        ranges.push(FetchRange::Bytes { start: offset, end });
        offset = end + 1;
        remainder = 0;
    }

    Ok(DownloadPlan { ranges })
}
