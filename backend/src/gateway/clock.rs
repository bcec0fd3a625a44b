//! Time source abstraction for the gateway
//!
//! Rate limiting and backoff need to observe and spend real time in
//! production, but tests must drive the same code without waiting.
//! Both sides of the gateway therefore talk to a `Clock` trait instead
//! of the system clock directly.

use std::time::{Duration, Instant};

/// Monotonic time source plus blocking sleep
pub trait Clock {
    /// Elapsed time since an arbitrary fixed origin
    fn now(&self) -> Duration;

    /// Block the caller for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation used in production
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
