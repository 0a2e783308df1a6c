use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::info;

use crate::common::deadline::Deadline;
use crate::error::{Error, Result, Stage};
use crate::filter::{FilterJob, LengthBounds, filter_all};
use crate::merge::{MergeConfig, MergeStats, merge_sorted_files};
use crate::sorter::{Sorter, sort_all};

pub const DEFAULT_TMP_DIR: &str = "./tmp/promo";
pub const DEFAULT_OUTPUT: &str = "./valid_promo_codes.txt";
pub const DEFAULT_PARALLELISM: usize = 3;

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Gzip sources, in the order their intermediate files are numbered.
    pub inputs: Vec<PathBuf>,
    /// Directory for `file_N.raw` and `file_N.sorted`. Created if missing.
    pub tmp_dir: PathBuf,
    /// Final list of shared codes.
    pub output: PathBuf,
    /// Filter worker count, at least 1.
    pub parallelism: usize,
    pub bounds: LengthBounds,
    pub merge: MergeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            tmp_dir: PathBuf::from(DEFAULT_TMP_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT),
            parallelism: DEFAULT_PARALLELISM,
            bounds: LengthBounds::default(),
            merge: MergeConfig::default(),
        }
    }
}

/// Where a finished run left its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub raw_files: Vec<PathBuf>,
    pub sorted_files: Vec<PathBuf>,
    pub merge: MergeStats,
}

/// Filtered output for the `n`th input (1-based).
pub fn raw_path(tmp_dir: &Path, n: usize) -> PathBuf {
    tmp_dir.join(format!("file_{}.raw", n))
}

/// Sorted output for the `n`th input (1-based).
pub fn sorted_path(tmp_dir: &Path, n: usize) -> PathBuf {
    tmp_dir.join(format!("file_{}.sorted", n))
}

/// Run filter, sort and merge over `config.inputs` and write the codes found
/// in at least two sources to `config.output`.
///
/// Stages run strictly one after another; a failing stage stops the run and
/// its error is wrapped with the stage name. `deadline` is only consulted by
/// the filter stage, before each file. Intermediate files are left in
/// `config.tmp_dir`.
pub fn extract_valid_codes(
    config: &PipelineConfig,
    sorter: &dyn Sorter,
    deadline: &Deadline,
) -> Result<PipelineReport> {
    if config.inputs.is_empty() {
        return Err(Error::InvalidArgument("no input files".to_string()));
    }
    if config.tmp_dir.as_os_str().is_empty() {
        return Err(Error::InvalidArgument(
            "temporary directory must not be empty".to_string(),
        ));
    }

    fs::create_dir_all(&config.tmp_dir)
        .map_err(Error::io("create directory", &config.tmp_dir))?;

    let raw_files: Vec<PathBuf> = (1..=config.inputs.len())
        .map(|n| raw_path(&config.tmp_dir, n))
        .collect();
    let sorted_files: Vec<PathBuf> = (1..=config.inputs.len())
        .map(|n| sorted_path(&config.tmp_dir, n))
        .collect();
    let jobs: Vec<FilterJob> = config
        .inputs
        .iter()
        .zip(&raw_files)
        .map(|(input, raw)| FilterJob::new(input, raw))
        .collect();

    let start = Instant::now();
    filter_all(&jobs, config.parallelism, config.bounds, deadline)
        .map_err(|e| e.in_stage(Stage::Filter))?;
    info!("[pipeline] filter stage finished in {:.2?}", start.elapsed());

    let start = Instant::now();
    sort_all(sorter, &raw_files, &sorted_files).map_err(|e| e.in_stage(Stage::Sort))?;
    info!("[pipeline] sort stage finished in {:.2?}", start.elapsed());

    let start = Instant::now();
    let merge = merge_sorted_files(&sorted_files, &config.output, &config.merge)
        .map_err(|e| e.in_stage(Stage::Merge))?;
    info!("[pipeline] merge stage finished in {:.2?}", start.elapsed());

    Ok(PipelineReport {
        raw_files,
        sorted_files,
        merge,
    })
}
