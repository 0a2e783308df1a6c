use std::ffi::OsString;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use anyhow::{Result, bail};
use clap::Parser;
use clap::error::ErrorKind;
use env_logger::Env;
use log::info;

use promo_loader::common::deadline::Deadline;
use promo_loader::common::duration::parse_duration;
use promo_loader::common::split_list;
use promo_loader::filter::{LengthBounds, normalize_parallelism};
use promo_loader::merge::MergeConfig;
use promo_loader::pipeline::{DEFAULT_OUTPUT, DEFAULT_TMP_DIR, PipelineConfig, extract_valid_codes};
use promo_loader::sorter::{DEFAULT_SORT_BIN, ExternalSorter, NativeSorter, Sorter};

const TOOL_NAME: &str = "promo-loader";

/// Long options that may also be spelled with a single dash (`-files a.gz`).
const LONG_FLAGS: &[&str] = &[
    "files",
    "tmp-dir",
    "output",
    "sort-bin",
    "parallelism",
    "timeout",
    "native-sort",
    "c-locale",
    "help",
    "version",
];

#[derive(Parser)]
#[command(
    name = "promo-loader",
    version,
    about = "Extract promo codes of 8-10 bytes that appear in at least two gzip sources",
    after_help = "Sources are filtered in parallel into TMP_DIR/file_N.raw, sorted one at a time \
                  into TMP_DIR/file_N.sorted, then merged. Intermediate files are kept.\n\n\
                  Single-dash long options (-files, -tmp-dir, ...) are accepted as well."
)]
struct Cli {
    /// Comma-separated list of gzip source files
    #[arg(long = "files", value_name = "LIST", default_value = "")]
    files: String,

    /// Directory for intermediate files
    #[arg(long = "tmp-dir", value_name = "DIR", default_value = DEFAULT_TMP_DIR)]
    tmp_dir: PathBuf,

    /// Output file for the valid codes
    #[arg(long = "output", value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// External sort program, invoked as PROGRAM INPUT
    #[arg(long = "sort-bin", value_name = "PROGRAM", default_value = DEFAULT_SORT_BIN)]
    sort_bin: String,

    /// Number of sources filtered concurrently (values below 1 mean 1)
    #[arg(
        long = "parallelism",
        value_name = "N",
        default_value = "3",
        allow_negative_numbers = true
    )]
    parallelism: i64,

    /// Filter stage deadline, e.g. 30m or 1h30m (0s disables it)
    #[arg(long = "timeout", value_name = "DURATION", default_value = "0s")]
    timeout: String,

    /// Sort in-process instead of running the external sort program
    #[arg(long = "native-sort")]
    native_sort: bool,

    /// Run the external sort program with LC_ALL=C
    #[arg(long = "c-locale")]
    c_locale: bool,
}

/// Rewrite Go-style single-dash long options (`-files`, `-timeout=5m`) to
/// their double-dash form. Anything else, including negative numbers, passes through.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 {
                return arg;
            }
            let Some(s) = arg.to_str() else {
                return arg;
            };
            if s.starts_with("--") {
                return arg;
            }
            match s.strip_prefix('-') {
                Some(rest) if LONG_FLAGS.contains(&rest.split('=').next().unwrap_or(rest)) => {
                    OsString::from(format!("-{}", s))
                }
                _ => arg,
            }
        })
        .collect()
}

fn run(cli: Cli) -> Result<()> {
    let inputs: Vec<PathBuf> = split_list(&cli.files)
        .into_iter()
        .map(PathBuf::from)
        .collect();
    if inputs.is_empty() {
        bail!("no input files given; pass -files a.gz,b.gz");
    }

    let timeout = match parse_duration(&cli.timeout) {
        Ok(d) => d,
        Err(msg) => bail!("invalid value '{}' for '--timeout': {}", cli.timeout, msg),
    };

    let sorter: Box<dyn Sorter> = if cli.native_sort {
        Box::new(NativeSorter::new())
    } else {
        Box::new(ExternalSorter::new(cli.sort_bin.as_str()).with_c_locale(cli.c_locale))
    };

    let config = PipelineConfig {
        inputs,
        tmp_dir: cli.tmp_dir,
        output: cli.output,
        parallelism: normalize_parallelism(cli.parallelism),
        bounds: LengthBounds::default(),
        merge: MergeConfig::default(),
    };
    let deadline = Deadline::after(timeout);

    info!(
        "starting: {} files, parallelism={}, sorter={}, tmp_dir={}",
        config.inputs.len(),
        config.parallelism,
        sorter.name(),
        config.tmp_dir.display()
    );
    let start = Instant::now();
    let report = extract_valid_codes(&config, sorter.as_ref(), &deadline)?;
    info!(
        "finished in {:.2?}: {} valid codes written to {}",
        start.elapsed(),
        report.merge.emitted,
        config.output.display()
    );
    Ok(())
}

fn main() {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            process::exit(code);
        }
    };

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run(cli) {
        eprintln!("{}: error: {}", TOOL_NAME, e);
        process::exit(1);
    }
}
