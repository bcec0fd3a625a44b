//! Relationship & Resource Dynamics Engine
//!
//! Deterministic simulation core for a multi-period, multi-agent
//! scenario. The engine ingests structured events (conflicts,
//! alliances, behavioral observations, financial/social signals)
//! extracted from free-text interaction records, applies fixed update
//! rules to a persistent state, computes per-period metrics, and
//! checkpoints/resumes that state across sequential periods.
//!
//! # Architecture
//!
//! - **core**: period bookkeeping
//! - **models**: domain types (Agent, ExtractedEvent, ExperimentState)
//! - **relations**: trust matrix, relationship ledger, connection tracker
//! - **behavior**: behavioral pattern tracker
//! - **resources**: resource ledger, shared pool, allocation history
//! - **metrics**: per-period snapshot aggregation
//! - **gateway**: rate-limited, retrying extraction front end
//! - **orchestrator**: period engine and checkpoint manager
//! - **rng**: deterministic jitter for gateway retries
//!
//! # Critical Invariants
//!
//! 1. Trust values stay in [0, 1]; self-trust is always exactly 1.0
//! 2. Relationship and behavioral histories are append-only
//! 3. A period's snapshot is computed only after all of its events applied
//! 4. State is fully reconstructible from the last checkpoint; re-running
//!    a period from the same checkpoint with the same events is
//!    bit-identical

pub mod behavior;
pub mod core;
pub mod gateway;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod relations;
pub mod resources;
pub mod rng;

// Re-exports for convenience
pub use behavior::{BehaviorKind, PatternTracker};
pub use core::PeriodClock;
pub use gateway::{
    CancelToken, Clock, EventExtractor, ExtractionBatch, ExtractionFailure, ExtractionGateway,
    ExtractionRequest, ExtractionSource, GatewayError, GatewayState, KeywordClassifier,
    RateBudget, SystemClock, FALLBACK_CONFIDENCE,
};
pub use metrics::{MetricKind, MonthlySnapshot, SnapshotStore};
pub use models::{
    Agent, AgentProfile, AllianceStrength, BehaviorImpact, ConflictSeverity,
    ContributionPattern, EventKind, ExperimentState, ExtractedEvent, FinancialSignalClass,
    ResourcePool, CONFIDENCE_GATE,
};
pub use orchestrator::{
    AgentConfig, CheckpointManager, Engine, ExperimentConfig, Orchestrator, PeriodInputs,
    PeriodResult, SimulationError, Variant,
};
pub use relations::{ConnectionTracker, RelationshipLedger, TrustMatrix};
pub use resources::{involvement_multiplier, ResourceLog, SharedPool};
pub use rng::JitterRng;
