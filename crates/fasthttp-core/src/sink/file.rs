//! File sink: positional writes into a `.part` file, then an atomic rename.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

use super::RandomAccessSink;

/// Suffix of the in-progress file next to the destination.
pub const PART_SUFFIX: &str = ".part";

/// Path for the part file: appends `.part` to the final path (e.g. `file.iso` → `file.iso.part`).
pub fn part_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(PART_SUFFIX);
    PathBuf::from(o)
}

/// Builder for a new part file. Call `preallocate` then `build` to get a
/// `FileSink` that supports concurrent `write_at` from multiple fetchers.
pub struct FileSinkBuilder {
    file: File,
    final_path: PathBuf,
    part_path: PathBuf,
}

impl FileSinkBuilder {
    /// Create (or truncate) the part file for `final_path`, creating parent
    /// directories as needed.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        if let Some(parent) = final_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let part_path = part_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&part_path)?;
        Ok(FileSinkBuilder {
            file,
            final_path: final_path.to_path_buf(),
            part_path,
        })
    }

    /// Preallocate `size` bytes. On Linux tries `posix_fallocate` for real block
    /// allocation; falls back to `set_len` on failure or elsewhere.
    pub fn preallocate(&mut self, size: u64) -> io::Result<()> {
        if size == 0 {
            return Ok(());
        }
        #[cfg(target_os = "linux")]
        {
            let fd = self.file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
        }
        self.file.set_len(size)
    }

    pub fn build(self) -> FileSink {
        FileSink {
            file: self.file,
            final_path: self.final_path,
            part_path: self.part_path,
        }
    }
}

/// Part file shared by all fetchers; each `write_at` is independent (pwrite-style).
#[derive(Debug)]
pub struct FileSink {
    file: File,
    final_path: PathBuf,
    part_path: PathBuf,
}

impl FileSink {
    pub fn part_path(&self) -> &Path {
        &self.part_path
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Optionally fsync, close, and rename the part file onto the final path,
    /// replacing any existing file there. On error the part file is removed.
    pub fn finalize(self, sync: bool) -> io::Result<PathBuf> {
        let synced = if sync { self.file.sync_all() } else { Ok(()) };
        drop(self.file);
        let result = synced.and_then(|()| fs::rename(&self.part_path, &self.final_path));
        if let Err(e) = result {
            remove_part(&self.part_path);
            return Err(e);
        }
        Ok(self.final_path)
    }

    /// Close and delete the part file; the final path is left untouched.
    pub fn discard(self) {
        drop(self.file);
        remove_part(&self.part_path);
    }
}

fn remove_part(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), "could not remove part file: {}", e);
    }
}

impl RandomAccessSink for FileSink {
    #[cfg(unix)]
    fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        use std::os::unix::fs::FileExt;
        self.file.write_all_at(data, offset)
    }

    #[cfg(windows)]
    fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        use std::os::windows::fs::FileExt;
        let mut written = 0;
        while written < data.len() {
            let n = self
                .file
                .seek_write(&data[written..], offset + written as u64)?;
            if n == 0 {
                return Err(io::ErrorKind::WriteZero.into());
            }
            written += n;
        }
        Ok(())
    }
}
