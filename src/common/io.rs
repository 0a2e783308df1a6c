use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Read};
use std::ops::Deref;
use std::path::Path;

#[cfg(target_os = "linux")]
use std::sync::atomic::{AtomicBool, Ordering};

use memmap2::{Mmap, MmapOptions};
use thiserror::Error;

use crate::error::Error;

/// Ceiling for a single line. Longer lines are fatal for the file being read.
pub const MAX_LINE_LEN: usize = 1 << 20;

/// Buffer size for readers and writers over intermediate and output files.
pub const IO_BUF_SIZE: usize = 1 << 20;

/// Below this size a plain read() beats mmap setup/teardown.
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Whole-file contents, either memory-mapped or owned.
/// Dereferences to `&[u8]`.
pub enum FileData {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Deref for FileData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FileData::Mmap(m) => m,
            FileData::Owned(v) => v,
        }
    }
}

/// Cleared after the first EPERM so later opens skip the O_NOATIME attempt.
#[cfg(target_os = "linux")]
static NOATIME_SUPPORTED: AtomicBool = AtomicBool::new(true);

/// Open for reading with O_NOATIME where the kernel allows it.
#[cfg(target_os = "linux")]
pub fn open_input(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    if NOATIME_SUPPORTED.load(Ordering::Relaxed) {
        match fs::OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOATIME)
            .open(path)
        {
            Ok(f) => return Ok(f),
            // O_NOATIME needs file ownership or CAP_FOWNER
            Err(ref e) if e.raw_os_error() == Some(libc::EPERM) => {
                NOATIME_SUPPORTED.store(false, Ordering::Relaxed);
            }
            Err(e) => return Err(e),
        }
    }
    File::open(path)
}

#[cfg(not(target_os = "linux"))]
pub fn open_input(path: &Path) -> io::Result<File> {
    File::open(path)
}

/// Create (or truncate) a file and wrap it in a 1 MiB buffered writer.
pub fn create_output(path: &Path) -> io::Result<BufWriter<File>> {
    Ok(BufWriter::with_capacity(IO_BUF_SIZE, File::create(path)?))
}

/// Read a whole file: mmap for large regular files, read() otherwise.
pub fn read_file(path: &Path) -> io::Result<FileData> {
    let mut file = open_input(path)?;
    let metadata = file.metadata()?;
    let len = metadata.len();

    if len >= MMAP_THRESHOLD && metadata.file_type().is_file() {
        // SAFETY: read-only mapping of a file no other stage writes to while it is mapped.
        if let Ok(mmap) = unsafe { MmapOptions::new().map(&file) } {
            #[cfg(target_os = "linux")]
            {
                let _ = mmap.advise(memmap2::Advice::Sequential);
                let _ = mmap.advise(memmap2::Advice::WillNeed);
            }
            return Ok(FileData::Mmap(mmap));
        }
    }

    let mut buf = Vec::with_capacity(len as usize);
    file.read_to_end(&mut buf)?;
    Ok(FileData::Owned(buf))
}

/// Failure while pulling a line out of a [`LineReader`].
#[derive(Error, Debug)]
pub enum LineError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("line {line} too long (limit {limit} bytes)")]
    TooLong { line: u64, limit: usize },
}

impl LineError {
    /// Attach the path being read. Underlying read failures become [`Error::Io`].
    pub fn into_error(self, path: &Path) -> Error {
        match self {
            LineError::Io(source) => Error::io("read", path)(source),
            LineError::TooLong { line, limit } => Error::LineTooLong {
                path: path.to_path_buf(),
                line,
                limit,
            },
        }
    }
}

/// Newline-delimited reader with a per-line size ceiling.
///
/// Lines are yielded without their terminator; a `\r` right before the `\n`
/// is dropped as well. A final line with no trailing newline is still yielded,
/// an empty one is not. The returned slice borrows an internal buffer that is
/// reused on every call.
pub struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
    limit: usize,
    lines: u64,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_limit(inner, MAX_LINE_LEN)
    }

    pub fn with_limit(inner: R, limit: usize) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(64),
            limit,
            lines: 0,
        }
    }

    /// Number of lines returned so far.
    pub fn lines_read(&self) -> u64 {
        self.lines
    }

    /// Read the next line. `Ok(None)` at end of input.
    pub fn next_line(&mut self) -> Result<Option<&[u8]>, LineError> {
        self.buf.clear();
        loop {
            let available = match self.inner.fill_buf() {
                Ok(b) => b,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if available.is_empty() {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                break;
            }
            let (take, found) = match memchr::memchr(b'\n', available) {
                Some(pos) => (pos, true),
                None => (available.len(), false),
            };
            // A line of exactly `limit` bytes is accepted; the terminator is not counted.
            if self.buf.len() + take > self.limit {
                return Err(LineError::TooLong {
                    line: self.lines + 1,
                    limit: self.limit,
                });
            }
            self.buf.extend_from_slice(&available[..take]);
            if found {
                self.inner.consume(take + 1);
                break;
            }
            self.inner.consume(take);
        }

        self.lines += 1;
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        Ok(Some(self.buf.as_slice()))
    }
}
