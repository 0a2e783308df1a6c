use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::common::io_error_msg;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The three sequential stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Filter,
    Sort,
    Merge,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Filter => "filter",
            Stage::Sort => "sort",
            Stage::Merge => "merge",
        })
    }
}

/// Error type for every pipeline operation. All variants are fatal to the run.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input to the pipeline.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Open, create, read or write failure on a file.
    #[error("{context} {}: {}", .path.display(), io_error_msg(.source))]
    Io {
        /// What was being done, e.g. "open input".
        context: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    /// The gzip stream could not be decoded.
    #[error("decompress {}: {}", .path.display(), io_error_msg(.source))]
    Decompress { path: PathBuf, source: io::Error },

    /// A single line exceeded the line buffer ceiling.
    #[error("{}: line {line} too long (limit {limit} bytes)", .path.display())]
    LineTooLong {
        path: PathBuf,
        /// 1-based line number.
        line: u64,
        limit: usize,
    },

    /// The sorter process could not be started.
    #[error("launch sorter '{program}': {}", io_error_msg(.source))]
    SortLaunch { program: String, source: io::Error },

    /// The sorter process ran but reported failure.
    #[error("sorter '{program}' failed on {}: {status}", .path.display())]
    SortFailed {
        program: String,
        path: PathBuf,
        status: ExitStatus,
    },

    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("operation cancelled")]
    Cancelled,

    /// Wraps a failure with the stage it happened in.
    #[error("{stage} stage: {source}")]
    Stage {
        stage: Stage,
        source: Box<Error>,
    },
}

impl Error {
    /// Build a closure mapping an `io::Error` into [`Error::Io`], for use with `map_err`.
    pub fn io<'a>(
        context: &'static str,
        path: &'a Path,
    ) -> impl FnOnce(io::Error) -> Error + 'a {
        move |source| Error::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Wrap `self` with the stage it failed in.
    pub fn in_stage(self, stage: Stage) -> Error {
        Error::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The stage this error was attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The innermost error, with all stage wrappers removed.
    pub fn root(&self) -> &Error {
        let mut err = self;
        while let Error::Stage { source, .. } = err {
            err = source;
        }
        err
    }

    /// True for deadline and explicit-cancel errors.
    pub fn is_cancellation(&self) -> bool {
        matches!(self.root(), Error::DeadlineExceeded(_) | Error::Cancelled)
    }
}
