use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Cancellation signal shared by filter workers.
///
/// Carries an optional deadline plus an explicit cancel flag. Clones share the
/// flag. Only the filter orchestrator consults it, between jobs.
#[derive(Debug, Clone)]
pub struct Deadline {
    expires: Option<(Instant, Duration)>,
    cancelled: Arc<AtomicBool>,
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}

impl Deadline {
    /// A signal that never fires unless [`Deadline::cancel`] is called.
    pub fn none() -> Self {
        Self {
            expires: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Expires `timeout` from now. A zero timeout means no deadline.
    pub fn after(timeout: Duration) -> Self {
        let mut deadline = Self::none();
        if !timeout.is_zero() {
            deadline.expires = Some((Instant::now() + timeout, timeout));
        }
        deadline
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// The configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.expires.map(|(_, timeout)| timeout)
    }

    /// Err if cancelled or past the deadline. Explicit cancel wins.
    pub fn check(&self) -> Result<()> {
        if self.cancelled.load(Ordering::Acquire) {
            return Err(Error::Cancelled);
        }
        match self.expires {
            Some((at, timeout)) if Instant::now() >= at => Err(Error::DeadlineExceeded(timeout)),
            _ => Ok(()),
        }
    }
}
