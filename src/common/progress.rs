use log::info;

/// Default interval between progress notifications.
pub const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Counts processed items and logs a line each time the count reaches a
/// multiple of the interval.
///
/// One tracker is owned by one stage or worker, so the counter is a plain `u64`.
pub struct Progress {
    label: String,
    interval: u64,
    count: u64,
}

impl Progress {
    /// Create a tracker logging every [`PROGRESS_INTERVAL`] items.
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_interval(label, PROGRESS_INTERVAL)
    }

    pub fn with_interval(label: impl Into<String>, interval: u64) -> Self {
        Self {
            label: label.into(),
            interval: interval.max(1),
            count: 0,
        }
    }

    /// Count one item. Returns true when this item triggered a log line.
    #[inline]
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count % self.interval == 0 {
            info!("{} {}", self.label, self.count);
            true
        } else {
            false
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}
