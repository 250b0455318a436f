pub mod config;
pub mod logging;

pub mod engine;
pub mod error;
pub mod fetcher;
pub mod planner;
pub mod probe;
pub mod sink;

pub use engine::{fetch_to_file, fetch_to_memory, Downloader};
pub use error::{FetchError, PlanError, ProbeError};
