use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::common::io::{LineReader, create_output, open_input};
use crate::common::progress::Progress;
use crate::error::{Error, Result};

/// A code is emitted when at least this many cursors hold it in one round.
pub const MIN_OCCURRENCES: usize = 2;

/// Read buffer per sorted input. One is held open for every input at once.
const MERGE_READ_BUF: usize = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeConfig {
    /// Minimum number of cursors that must hold the round minimum for it to be emitted.
    pub min_occurrences: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            min_occurrences: MIN_OCCURRENCES,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Merge rounds run, one per distinct minimum consumed.
    pub rounds: u64,
    /// Codes written to the output.
    pub emitted: u64,
}

/// Read position in one sorted input: the current line, or exhausted.
pub struct MergeCursor<R> {
    path: PathBuf,
    lines: LineReader<R>,
    current: Vec<u8>,
    exhausted: bool,
}

impl<R: BufRead> MergeCursor<R> {
    /// Create a cursor primed with the first line of `reader`. An empty input
    /// gives a cursor that is exhausted from the start. `path` labels errors.
    pub fn new(path: impl Into<PathBuf>, reader: R) -> Result<Self> {
        let mut cursor = Self {
            path: path.into(),
            lines: LineReader::new(reader),
            current: Vec::with_capacity(16),
            exhausted: false,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    /// The line under the cursor, `None` once exhausted.
    #[inline]
    pub fn current(&self) -> Option<&[u8]> {
        if self.exhausted {
            None
        } else {
            Some(self.current.as_slice())
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Move to the next line, or mark the cursor exhausted at end of input.
    pub fn advance(&mut self) -> Result<()> {
        match self.lines.next_line() {
            Ok(Some(line)) => {
                self.current.clear();
                self.current.extend_from_slice(line);
            }
            Ok(None) => {
                self.current.clear();
                self.exhausted = true;
            }
            Err(e) => return Err(e.into_error(&self.path)),
        }
        Ok(())
    }
}

/// Merge sorted cursors, writing each round minimum held by at least
/// `config.min_occurrences` cursors to `out`.
///
/// Every round takes the smallest current line across live cursors, advances
/// each cursor sitting on it exactly once, and counts those advances. The
/// count is per round, not per distinct input: a code repeated within inputs
/// can be counted again in a later round and emitted again. Inputs must all be
/// sorted in byte order, otherwise output order and counts are meaningless.
///
/// `output` only labels write errors.
pub fn merge_cursors<R: BufRead, W: Write>(
    cursors: &mut [MergeCursor<R>],
    out: &mut W,
    config: &MergeConfig,
    output: &Path,
) -> Result<MergeStats> {
    let mut progress = Progress::new("[merge] rounds:");
    let mut min: Vec<u8> = Vec::with_capacity(16);
    let mut emitted = 0u64;

    loop {
        let Some(smallest) = cursors.iter().filter_map(MergeCursor::current).min() else {
            break;
        };
        min.clear();
        min.extend_from_slice(smallest);

        let mut count = 0usize;
        for cursor in cursors.iter_mut() {
            if cursor.current() == Some(min.as_slice()) {
                count += 1;
                cursor.advance()?;
            }
        }
        progress.tick();

        if count >= config.min_occurrences {
            out.write_all(&min)
                .and_then(|()| out.write_all(b"\n"))
                .map_err(Error::io("write", output))?;
            emitted += 1;
        }
    }

    Ok(MergeStats {
        rounds: progress.count(),
        emitted,
    })
}

/// Open every sorted file in `inputs`, merge them with [`merge_cursors`] and
/// write the result to `output`, one code per line.
pub fn merge_sorted_files(
    inputs: &[PathBuf],
    output: &Path,
    config: &MergeConfig,
) -> Result<MergeStats> {
    info!("[merge] starting merge of {} files", inputs.len());

    let mut cursors = Vec::with_capacity(inputs.len());
    for path in inputs {
        let file = open_input(path).map_err(Error::io("open", path))?;
        cursors.push(MergeCursor::new(
            path,
            BufReader::with_capacity(MERGE_READ_BUF, file),
        )?);
    }

    let mut out = create_output(output).map_err(Error::io("create output", output))?;
    let stats = merge_cursors(&mut cursors, &mut out, config, output)?;
    out.flush().map_err(Error::io("write", output))?;

    info!(
        "[merge] completed: {} rounds, {} valid codes",
        stats.rounds, stats.emitted
    );
    Ok(stats)
}
