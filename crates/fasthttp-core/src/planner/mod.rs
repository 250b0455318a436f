//! Range math and download planning.
//!
//! Splits a resource of known length into one contiguous byte range per
//! worker, or collapses to a single whole-resource GET when ranges cannot or
//! need not be used.

mod range;

pub use range::{plan, worker_count, DownloadPlan, FetchRange};
