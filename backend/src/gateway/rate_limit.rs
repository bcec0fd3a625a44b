//! Rolling-window rate budget
//!
//! Enforces a fixed request count per rolling minute and per rolling
//! hour. The budget is shared: when several gateway workers run
//! concurrently they consult one instance behind a mutex, so effective
//! concurrency is throttled to the configured rate.

use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Default requests allowed per rolling minute
pub const DEFAULT_PER_MINUTE: usize = 8;

/// Default requests allowed per rolling hour
pub const DEFAULT_PER_HOUR: usize = 80;

/// Shared admission budget over rolling minute/hour windows
#[derive(Debug, Clone)]
pub struct RateBudget {
    per_minute: usize,
    per_hour: usize,
    /// Admission timestamps within the last hour, oldest first
    admissions: Vec<Duration>,
    total_requests: u64,
}

impl RateBudget {
    /// Create a budget with explicit limits
    ///
    /// # Panics
    /// Panics if either limit is zero.
    pub fn new(per_minute: usize, per_hour: usize) -> Self {
        assert!(per_minute > 0, "per_minute must be positive");
        assert!(per_hour > 0, "per_hour must be positive");
        Self {
            per_minute,
            per_hour,
            admissions: Vec::new(),
            total_requests: 0,
        }
    }

    /// How long the caller must wait before a request may be admitted
    ///
    /// Returns `Duration::ZERO` when a slot is free right now. An
    /// admission occupies its window until `timestamp + window` has
    /// passed.
    pub fn wait_required(&mut self, now: Duration) -> Duration {
        self.prune(now);

        if self.admissions.len() >= self.per_hour {
            let oldest = self.admissions[self.admissions.len() - self.per_hour];
            return (oldest + HOUR).saturating_sub(now);
        }

        let in_minute: Vec<Duration> = self
            .admissions
            .iter()
            .copied()
            .filter(|t| *t + MINUTE > now)
            .collect();
        if in_minute.len() >= self.per_minute {
            let oldest = in_minute[in_minute.len() - self.per_minute];
            return (oldest + MINUTE).saturating_sub(now);
        }

        Duration::ZERO
    }

    /// Record an admitted request at `now`
    pub fn record(&mut self, now: Duration) {
        self.admissions.push(now);
        self.total_requests += 1;
    }

    /// Total requests admitted over the life of the budget
    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    fn prune(&mut self, now: Duration) {
        self.admissions.retain(|t| *t + HOUR > now);
    }
}

impl Default for RateBudget {
    fn default() -> Self {
        Self::new(DEFAULT_PER_MINUTE, DEFAULT_PER_HOUR)
    }
}
