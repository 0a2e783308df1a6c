use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use log::info;

use crate::common::io::{IO_BUF_SIZE, LineError, LineReader, create_output, open_input};
use crate::common::progress::Progress;
use crate::error::{Error, Result};

/// Shortest accepted code, in bytes.
pub const MIN_CODE_LEN: usize = 8;

/// Longest accepted code, in bytes.
pub const MAX_CODE_LEN: usize = 10;

/// Inclusive byte-length range a line must fall in to be kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self {
            min: MIN_CODE_LEN,
            max: MAX_CODE_LEN,
        }
    }
}

impl LengthBounds {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, len: usize) -> bool {
        len >= self.min && len <= self.max
    }
}

/// One unit of filter work: a gzip source and the plain file its valid lines go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl FilterJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Line counts for one filtered source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Lines scanned.
    pub total: u64,
    /// Lines written.
    pub kept: u64,
}

/// Short display name for log lines.
pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// Copy every line of `reader` whose length is within `bounds` to `out`,
/// newline-terminated and in input order.
///
/// `reader` yields the decompressed source of `job.input`; read failures are
/// reported as decompression errors against that path, write failures
/// against `job.output`.
pub fn filter_lines<R: BufRead, W: Write>(
    job: &FilterJob,
    reader: R,
    out: &mut W,
    bounds: LengthBounds,
) -> Result<FilterStats> {
    let mut lines = LineReader::new(reader);
    let mut progress = Progress::new(format!("[filter] {} lines scanned:", file_label(&job.input)));
    let mut kept = 0u64;

    loop {
        let line = match lines.next_line() {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(LineError::Io(source)) => {
                return Err(Error::Decompress {
                    path: job.input.clone(),
                    source,
                });
            }
            Err(e) => return Err(e.into_error(&job.input)),
        };
        progress.tick();

        if bounds.contains(line.len()) {
            out.write_all(line)
                .and_then(|()| out.write_all(b"\n"))
                .map_err(Error::io("write", &job.output))?;
            kept += 1;
        }
    }

    Ok(FilterStats {
        total: progress.count(),
        kept,
    })
}

/// Decompress `job.input`, keep lines within `bounds` and write them to
/// `job.output`. The output's parent directory is created when missing.
pub fn filter_file(job: &FilterJob, bounds: LengthBounds) -> Result<FilterStats> {
    info!("[filter] start {}", job.input.display());

    let file = open_input(&job.input).map_err(Error::io("open input", &job.input))?;
    let reader = BufReader::with_capacity(IO_BUF_SIZE, MultiGzDecoder::new(file));

    if let Some(parent) = job.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(Error::io("create directory", parent))?;
        }
    }
    let mut out = create_output(&job.output).map_err(Error::io("create output", &job.output))?;

    let stats = filter_lines(job, reader, &mut out, bounds)?;
    out.flush().map_err(Error::io("write", &job.output))?;

    info!(
        "[filter] done {} -> total={} kept={}",
        file_label(&job.input),
        stats.total,
        stats.kept
    );
    Ok(stats)
}
