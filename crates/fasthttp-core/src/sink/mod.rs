//! Random-access output targets.
//!
//! A sink accepts writes at arbitrary absolute offsets from many fetchers at
//! once. The plan guarantees fetchers write disjoint spans, so a sink only has
//! to keep concurrent writes memory-safe, not ordered.

mod file;
mod memory;

pub use file::{part_path, FileSink, FileSinkBuilder, PART_SUFFIX};
pub use memory::MemorySink;

use std::io;

/// Somewhere bytes can be written at an arbitrary offset.
pub trait RandomAccessSink: Send + Sync {
    /// Write all of `data` at `offset`, growing the target if needed.
    fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()>;
}
