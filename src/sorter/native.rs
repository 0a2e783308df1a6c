use std::io::Write;
use std::path::Path;

use rayon::prelude::*;

use super::core::Sorter;
use crate::common::io::{create_output, read_file};
use crate::error::{Error, Result};

/// Below this many lines the rayon split costs more than it saves.
const PARALLEL_SORT_THRESHOLD: usize = 10_000;

/// In-process sorter: byte-order sort of one file held in memory
/// (memory-mapped when large).
///
/// Unlike an external `sort`, the whole filtered file must fit in memory.
/// Order is always plain byte order, independent of locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeSorter;

impl NativeSorter {
    pub fn new() -> Self {
        Self
    }
}

/// Split on `\n`. A trailing newline does not produce an empty last line.
fn split_lines(data: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::with_capacity(memchr::memchr_iter(b'\n', data).count() + 1);
    let mut start = 0;
    for pos in memchr::memchr_iter(b'\n', data) {
        lines.push(&data[start..pos]);
        start = pos + 1;
    }
    if start < data.len() {
        lines.push(&data[start..]);
    }
    lines
}

/// Sort line slices in byte order, in parallel for large inputs.
pub fn sort_lines(lines: &mut [&[u8]]) {
    if lines.len() > PARALLEL_SORT_THRESHOLD {
        lines.par_sort_unstable();
    } else {
        lines.sort_unstable();
    }
}

impl Sorter for NativeSorter {
    fn name(&self) -> &str {
        "native"
    }

    fn sort(&self, input: &Path, output: &Path) -> Result<()> {
        let data = read_file(input).map_err(Error::io("read sort input", input))?;
        let mut lines = split_lines(&data);
        sort_lines(&mut lines);

        let mut out = create_output(output).map_err(Error::io("create sort output", output))?;
        for line in &lines {
            out.write_all(line)
                .and_then(|()| out.write_all(b"\n"))
                .map_err(Error::io("write", output))?;
        }
        out.flush().map_err(Error::io("write", output))?;
        Ok(())
    }
}
