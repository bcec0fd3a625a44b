//! Event extraction gateway
//!
//! Rate-limited, retrying wrapper around the external event extractor.
//! The engine never calls the remote service directly; every request
//! passes through this gateway, which enforces a shared rate budget,
//! retries transient failures with jittered exponential backoff, and
//! degrades to the local keyword classifier when the remote stays
//! unavailable. Fatal failures (authentication, configuration) surface
//! immediately — retrying cannot help and silent fallback would mask a
//! misconfiguration.
//!
//! # Request lifecycle
//!
//! ```text
//! Idle → RequestPending → Success
//!                       → RateLimited       (suspend until budget frees)
//!                       → TransientFailure  (backoff 30s/60s/120s/300s, then fallback)
//!                       → FatalFailure      (surface immediately)
//! ```

pub mod clock;
pub mod fallback;
pub mod rate_limit;

pub use clock::{Clock, SystemClock};
pub use fallback::KeywordClassifier;
pub use rate_limit::{RateBudget, DEFAULT_PER_HOUR, DEFAULT_PER_MINUTE};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::event::ExtractedEvent;
use crate::rng::JitterRng;

/// Retry delays (seconds) for transient failures; the last entry is the cap
pub const BACKOFF_SCHEDULE_SECS: [u64; 4] = [30, 60, 120, 300];

/// Confidence tag applied to every fallback classification
///
/// Fixed and deliberately lower than typical remote self-reported
/// confidences, within the 0.3–0.4 band reserved for degraded output.
pub const FALLBACK_CONFIDENCE: f64 = 0.35;

/// Relative jitter applied to each backoff delay
const JITTER_SPREAD: f64 = 0.1;

/// One transcript to classify
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub transcript: String,
    pub participants: Vec<String>,
    pub period: u32,
}

/// Where a classified batch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Remote,
    Fallback,
}

/// Classified events plus provenance
#[derive(Debug, Clone)]
pub struct ExtractionBatch {
    pub events: Vec<ExtractedEvent>,
    pub source: ExtractionSource,
}

/// Failure signal reported by an extractor implementation
#[derive(Debug, Clone, Error)]
pub enum ExtractionFailure {
    /// Remote overload, unavailability, or a malformed response;
    /// worth retrying
    #[error("transient extraction failure: {0}")]
    Transient(String),

    /// Authentication or configuration error; retrying cannot help
    #[error("fatal extraction failure: {0}")]
    Fatal(String),
}

/// Contract implemented by the remote service adapter and by the local
/// fallback classifier alike
pub trait EventExtractor {
    fn extract(
        &mut self,
        request: &ExtractionRequest,
    ) -> Result<Vec<ExtractedEvent>, ExtractionFailure>;
}

/// Observable lifecycle state of the gateway's current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    Idle,
    RequestPending,
    Success,
    RateLimited,
    TransientFailure,
    FatalFailure,
}

/// Errors surfaced to gateway callers
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The remote reported an error no retry can fix
    #[error("fatal extraction failure: {0}")]
    Fatal(String),

    /// The request was cancelled before completion
    #[error("extraction cancelled before completion")]
    Cancelled,
}

/// Cooperative cancellation shared with the embedding process
///
/// Cancelling stops the gateway from admitting new requests; it never
/// interrupts state application already in progress.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Rate-limited, retrying extraction front end
pub struct ExtractionGateway<E: EventExtractor, C: Clock> {
    remote: E,
    fallback: KeywordClassifier,
    clock: C,
    budget: Arc<Mutex<RateBudget>>,
    backoff_secs: Vec<u64>,
    rng: JitterRng,
    cancel: CancelToken,
    state: GatewayState,
}

impl<E: EventExtractor, C: Clock> ExtractionGateway<E, C> {
    /// Create a gateway sharing `budget` with any sibling workers
    pub fn new(remote: E, clock: C, budget: Arc<Mutex<RateBudget>>, jitter_seed: u64) -> Self {
        Self {
            remote,
            fallback: KeywordClassifier::new(),
            clock,
            budget,
            backoff_secs: BACKOFF_SCHEDULE_SECS.to_vec(),
            rng: JitterRng::new(jitter_seed),
            cancel: CancelToken::new(),
            state: GatewayState::Idle,
        }
    }

    /// Create a gateway with a private default budget
    pub fn with_default_budget(remote: E, clock: C, jitter_seed: u64) -> Self {
        Self::new(
            remote,
            clock,
            Arc::new(Mutex::new(RateBudget::default())),
            jitter_seed,
        )
    }

    /// Override the backoff schedule (seconds); mostly for tests
    pub fn with_backoff_schedule(mut self, schedule: Vec<u64>) -> Self {
        self.backoff_secs = schedule;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> GatewayState {
        self.state
    }

    /// Token that stops new request admissions when cancelled
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Classify one transcript
    ///
    /// Retries transient failures across the backoff schedule, then
    /// degrades to the keyword fallback. Fatal failures and
    /// cancellation return an error without touching the fallback.
    pub fn classify(
        &mut self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionBatch, GatewayError> {
        let mut failures = 0usize;

        loop {
            self.wait_for_budget()?;
            self.state = GatewayState::RequestPending;

            match self.remote.extract(request) {
                Ok(events) => {
                    self.state = GatewayState::Success;
                    debug!(
                        period = request.period,
                        events = events.len(),
                        "remote extraction succeeded"
                    );
                    return Ok(ExtractionBatch {
                        events,
                        source: ExtractionSource::Remote,
                    });
                }
                Err(ExtractionFailure::Fatal(message)) => {
                    self.state = GatewayState::FatalFailure;
                    warn!(period = request.period, %message, "fatal extraction failure");
                    return Err(GatewayError::Fatal(message));
                }
                Err(ExtractionFailure::Transient(message)) => {
                    self.state = GatewayState::TransientFailure;
                    failures += 1;
                    if failures > self.backoff_secs.len() {
                        break;
                    }
                    let base = Duration::from_secs(self.backoff_secs[failures - 1]);
                    let delay = base.mul_f64(self.rng.jitter_factor(JITTER_SPREAD));
                    warn!(
                        period = request.period,
                        %message,
                        attempt = failures,
                        delay_secs = delay.as_secs_f64(),
                        "transient extraction failure; backing off"
                    );
                    self.clock.sleep(delay);
                }
            }
        }

        info!(
            period = request.period,
            "backoff schedule exhausted; using keyword fallback"
        );
        let events = self.fallback.classify(request);
        self.state = GatewayState::Success;
        Ok(ExtractionBatch {
            events,
            source: ExtractionSource::Fallback,
        })
    }

    /// Block until the shared budget admits a request
    fn wait_for_budget(&mut self) -> Result<(), GatewayError> {
        loop {
            if self.cancel.is_cancelled() {
                self.state = GatewayState::Idle;
                return Err(GatewayError::Cancelled);
            }
            let now = self.clock.now();
            let wait = {
                let mut budget = self
                    .budget
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let wait = budget.wait_required(now);
                if wait.is_zero() {
                    budget.record(now);
                }
                wait
            };
            if wait.is_zero() {
                return Ok(());
            }
            self.state = GatewayState::RateLimited;
            debug!(wait_secs = wait.as_secs_f64(), "rate budget exhausted; suspending");
            self.clock.sleep(wait);
        }
    }
}
