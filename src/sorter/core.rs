use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};
use crate::filter::core::file_label;

/// Produces a byte-sorted copy of a newline-delimited file.
///
/// The merge stage relies on every sorted file using the same total order it
/// compares with (plain byte order). Implementations are trusted to provide it.
pub trait Sorter {
    /// Name used in log lines and error messages.
    fn name(&self) -> &str;

    /// Write the lines of `input`, sorted, to `output` (created or truncated).
    fn sort(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Sort each `inputs[i]` into `outputs[i]`, one at a time, in order.
/// Stops at the first failure.
pub fn sort_all(sorter: &dyn Sorter, inputs: &[PathBuf], outputs: &[PathBuf]) -> Result<()> {
    if inputs.len() != outputs.len() {
        return Err(Error::InvalidArgument(format!(
            "{} sort inputs but {} outputs",
            inputs.len(),
            outputs.len()
        )));
    }

    for (input, output) in inputs.iter().zip(outputs) {
        info!(
            "[sort] {} {} -> {}",
            sorter.name(),
            file_label(input),
            file_label(output)
        );
        sorter.sort(input, output)?;
        info!("[sort] done {}", file_label(input));
    }
    Ok(())
}
