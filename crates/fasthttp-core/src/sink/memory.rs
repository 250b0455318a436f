//! In-memory sink backed by one contiguous buffer.

use std::io;
use std::sync::Mutex;

use super::RandomAccessSink;

/// Growable buffer shared by all fetchers of one download.
///
/// Pre-sized to the resource length when it is known, so fetchers never
/// trigger growth; otherwise writes extend the logical size to the highest
/// byte touched.
#[derive(Debug, Default)]
pub struct MemorySink {
    buffer: Mutex<Vec<u8>>,
}

impl MemorySink {
    /// Buffer of exactly `length` zeroed bytes.
    pub fn with_length(length: u64) -> io::Result<Self> {
        let mut buffer = Vec::new();
        grow(&mut buffer, to_usize(length)?)?;
        Ok(MemorySink {
            buffer: Mutex::new(buffer),
        })
    }

    /// Empty buffer with `capacity` bytes reserved, for unknown lengths.
    pub fn with_capacity(capacity: usize) -> Self {
        MemorySink {
            buffer: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Current logical size in bytes.
    pub fn len(&self) -> usize {
        self.buffer.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the sink and return its contents.
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RandomAccessSink for MemorySink {
    fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        let start = to_usize(offset)?;
        let end = start
            .checked_add(data.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "write past addressable memory"))?;

        let mut buf = self
            .buffer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory sink lock poisoned"))?;
        grow(&mut buf, end)?;
        buf[start..end].copy_from_slice(data);
        Ok(())
    }
}

/// Zero-extend `buf` to `len` bytes. Allocation failure is an error, not an abort.
fn grow(buf: &mut Vec<u8>, len: usize) -> io::Result<()> {
    if len <= buf.len() {
        return Ok(());
    }
    buf.try_reserve_exact(len - buf.len()).map_err(|e| {
        io::Error::new(
            io::ErrorKind::OutOfMemory,
            format!("cannot hold {} bytes in memory: {}", len, e),
        )
    })?;
    buf.resize(len, 0);
    Ok(())
}

fn to_usize(n: u64) -> io::Result<usize> {
    usize::try_from(n).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("offset {} does not fit in memory", n),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presized_buffer_keeps_length() {
        let sink = MemorySink::with_length(10).unwrap();
        sink.write_at(0, b"abc").unwrap();
        sink.write_at(7, b"xyz").unwrap();
        assert_eq!(sink.into_inner(), b"abc\0\0\0\0xyz");
    }

    #[test]
    fn oversized_length_is_an_error() {
        let err = MemorySink::with_length(1 << 63).unwrap_err();
        if cfg!(target_pointer_width = "64") {
            assert_eq!(err.kind(), io::ErrorKind::OutOfMemory);
        }
    }

    #[test]
    fn write_at_huge_offset_is_an_error() {
        let sink = MemorySink::with_capacity(0);
        assert!(sink.write_at(1 << 62, b"x").is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn write_past_end_grows_to_exact_bound() {
        let sink = MemorySink::with_capacity(4);
        sink.write_at(5, b"hi").unwrap();
        assert_eq!(sink.len(), 7);
        sink.write_at(0, b"12345").unwrap();
        assert_eq!(sink.into_inner(), b"12345hi");
    }

    #[test]
    fn empty_write_leaves_sink_empty() {
        let sink = MemorySink::with_capacity(16);
        sink.write_at(0, b"").unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn concurrent_disjoint_writes() {
        let sink = MemorySink::with_capacity(0);
        std::thread::scope(|s| {
            for i in 0..8u8 {
                let sink = &sink;
                s.spawn(move || {
                    let chunk = vec![i; 100];
                    sink.write_at(u64::from(i) * 100, &chunk).unwrap();
                });
            }
        });
        let out = sink.into_inner();
        assert_eq!(out.len(), 800);
        for (i, chunk) in out.chunks(100).enumerate() {
            assert!(chunk.iter().all(|&b| b == i as u8));
        }
    }
}
