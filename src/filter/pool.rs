use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use log::{debug, warn};

use super::core::{FilterJob, LengthBounds, filter_file};
use crate::common::deadline::Deadline;
use crate::error::{Error, Result};

/// Map a requested worker count to a usable one. Zero and negative become 1.
pub fn normalize_parallelism(requested: i64) -> usize {
    if requested <= 0 {
        1
    } else {
        usize::try_from(requested).unwrap_or(usize::MAX)
    }
}

/// Run [`filter_file`] for every job on `parallelism` worker threads.
///
/// Workers pull from a shared queue in no particular order. Before starting a
/// claimed job a worker checks `deadline`; a file already in progress is never
/// interrupted. A worker that fails reports once and stops claiming jobs,
/// while the others keep draining the queue. Once every worker has finished,
/// the first reported error is returned. Files already written stay on disk.
pub fn filter_all(
    jobs: &[FilterJob],
    parallelism: usize,
    bounds: LengthBounds,
    deadline: &Deadline,
) -> Result<()> {
    run_filter_jobs(jobs, parallelism, deadline, |job| {
        filter_file(job, bounds).map(|_| ())
    })
}

/// Worker pool behind [`filter_all`], with the per-job work supplied by `run`.
pub fn run_filter_jobs<F>(
    jobs: &[FilterJob],
    parallelism: usize,
    deadline: &Deadline,
    run: F,
) -> Result<()>
where
    F: Fn(&FilterJob) -> Result<()> + Sync,
{
    let workers = parallelism.max(1);

    // Queue is filled and closed up front so the producer never waits on workers.
    let (job_tx, job_rx) = unbounded::<&FilterJob>();
    for job in jobs {
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    // One slot per worker: each worker reports at most once, so sends never block.
    let (err_tx, err_rx) = bounded::<Error>(workers);

    thread::scope(|scope| {
        for id in 0..workers {
            let job_rx = job_rx.clone();
            let err_tx = err_tx.clone();
            let run = &run;
            scope.spawn(move || run_worker(id, job_rx, err_tx, deadline, run));
        }
    });
    drop(err_tx);

    let mut errors = err_rx.try_iter();
    match errors.next() {
        Some(first) => {
            let suppressed = errors.count();
            if suppressed > 0 {
                warn!(
                    "[filter] {} further worker error(s) after: {}",
                    suppressed, first
                );
            }
            Err(first)
        }
        None => Ok(()),
    }
}

fn run_worker<F>(
    id: usize,
    jobs: Receiver<&FilterJob>,
    errors: Sender<Error>,
    deadline: &Deadline,
    run: &F,
) where
    F: Fn(&FilterJob) -> Result<()>,
{
    for job in jobs.iter() {
        let result = deadline.check().and_then(|()| run(job));
        if let Err(e) = result {
            debug!("[filter] worker {} stopping: {}", id, e);
            let _ = errors.send(e);
            return;
        }
    }
}
