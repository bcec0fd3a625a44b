//! Domain types: agents, classified events, and the experiment state
//! aggregate root.

pub mod agent;
pub mod event;
pub mod state;

pub use agent::{Agent, AgentProfile, ContributionPattern, ResourcePool};
pub use event::{
    AllianceStrength, BehaviorImpact, ConflictSeverity, EventKind, ExtractedEvent,
    FinancialSignalClass, CONFIDENCE_GATE,
};
pub use state::ExperimentState;
