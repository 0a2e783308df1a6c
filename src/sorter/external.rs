use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::core::Sorter;
use crate::error::{Error, Result};

/// Default sorter executable, looked up on PATH.
pub const DEFAULT_SORT_BIN: &str = "sort";

/// Runs `<program> <input>` with stdout redirected into the output file.
/// The child's stderr goes to ours.
#[derive(Debug, Clone)]
pub struct ExternalSorter {
    program: PathBuf,
    display: String,
    c_locale: bool,
}

impl ExternalSorter {
    /// An empty program name falls back to [`DEFAULT_SORT_BIN`].
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let mut program: PathBuf = program.into();
        if program.as_os_str().is_empty() {
            program = PathBuf::from(DEFAULT_SORT_BIN);
        }
        let display = program.display().to_string();
        Self {
            program,
            display,
            c_locale: false,
        }
    }

    /// Run the child with `LC_ALL=C` so its collation is plain byte order.
    pub fn with_c_locale(mut self, enabled: bool) -> Self {
        self.c_locale = enabled;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for ExternalSorter {
    fn default() -> Self {
        Self::new(DEFAULT_SORT_BIN)
    }
}

impl Sorter for ExternalSorter {
    fn name(&self) -> &str {
        &self.display
    }

    fn sort(&self, input: &Path, output: &Path) -> Result<()> {
        let out = File::create(output).map_err(Error::io("create sort output", output))?;

        let mut cmd = Command::new(&self.program);
        cmd.arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::from(out))
            .stderr(Stdio::inherit());
        if self.c_locale {
            cmd.env("LC_ALL", "C");
        }

        let status = cmd.status().map_err(|source| Error::SortLaunch {
            program: self.display.clone(),
            source,
        })?;
        if !status.success() {
            return Err(Error::SortFailed {
                program: self.display.clone(),
                path: input.to_path_buf(),
                status,
            });
        }
        Ok(())
    }
}
