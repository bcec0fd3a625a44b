//! Experiment state — the aggregate root
//!
//! One `ExperimentState` exists per run. It owns every entity the
//! engine mutates: agents, the trust matrix, the relationship ledger,
//! behavioral histories, connection bumps, the resource log and all
//! written snapshots. Between periods the checkpoint manager is its
//! sole keeper; a persisted state is sufficient to reconstruct the run
//! exactly (no hidden external state).
//!
//! # Canonical serialization
//!
//! All maps are `BTreeMap`s, so serializing the same state twice yields
//! byte-identical JSON. This is what makes checkpoint-resume re-runs
//! bit-reproducible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::behavior::PatternTracker;
use crate::core::PeriodClock;
use crate::metrics::SnapshotStore;
use crate::models::agent::Agent;
use crate::orchestrator::SimulationError;
use crate::relations::{ConnectionTracker, RelationshipLedger, TrustMatrix};
use crate::resources::ResourceLog;

/// Complete persistent state of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentState {
    /// Run identity, minted once at experiment creation
    run_id: Uuid,
    /// Completed-period bookkeeping
    pub(crate) clock: PeriodClock,
    /// All participants, keyed by id
    pub(crate) agents: BTreeMap<String, Agent>,
    /// Directed pairwise trust
    pub(crate) trust: TrustMatrix,
    /// Append-only conflict/alliance history
    pub(crate) relationships: RelationshipLedger,
    /// Append-only behavioral history
    pub(crate) behaviors: PatternTracker,
    /// Accumulated interaction bumps
    pub(crate) connections: ConnectionTracker,
    /// Shared pool and allocation history
    pub(crate) resources: ResourceLog,
    /// Written metric snapshots
    pub(crate) metrics: SnapshotStore,
}

impl ExperimentState {
    /// Create a fresh state for the given agent set
    ///
    /// The trust matrix is seeded deterministically from the agent
    /// identifiers; everything else starts empty.
    pub fn new(agents: Vec<Agent>, total_periods: u32, shared_budget: f64) -> Self {
        let ids: Vec<String> = agents.iter().map(|a| a.id().to_string()).collect();
        let agents = agents
            .into_iter()
            .map(|a| (a.id().to_string(), a))
            .collect();
        Self {
            run_id: Uuid::new_v4(),
            clock: PeriodClock::new(total_periods),
            agents,
            trust: TrustMatrix::seed(&ids),
            relationships: RelationshipLedger::new(),
            behaviors: PatternTracker::new(),
            connections: ConnectionTracker::new(),
            resources: ResourceLog::new(shared_budget),
            metrics: SnapshotStore::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn last_completed_period(&self) -> u32 {
        self.clock.last_completed()
    }

    pub fn next_period(&self) -> u32 {
        self.clock.next_period()
    }

    pub fn total_periods(&self) -> u32 {
        self.clock.total_periods()
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    pub fn agents(&self) -> &BTreeMap<String, Agent> {
        &self.agents
    }

    /// Look up one agent
    pub fn agent(&self, id: &str) -> Result<&Agent, SimulationError> {
        self.agents
            .get(id)
            .ok_or_else(|| SimulationError::UnknownAgent(id.to_string()))
    }

    /// Agent identifiers in canonical (sorted) order
    pub fn agent_ids(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn trust(&self) -> &TrustMatrix {
        &self.trust
    }

    pub fn relationships(&self) -> &RelationshipLedger {
        &self.relationships
    }

    pub fn behaviors(&self) -> &PatternTracker {
        &self.behaviors
    }

    pub fn connections(&self) -> &ConnectionTracker {
        &self.connections
    }

    pub fn resources(&self) -> &ResourceLog {
        &self.resources
    }

    pub fn metrics(&self) -> &SnapshotStore {
        &self.metrics
    }

    /// Verify cross-component invariants
    ///
    /// Called before every checkpoint write and after every load. A
    /// failure here means state was corrupted outside the normal update
    /// paths, and the run halts rather than clamping the damage away.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.agents.is_empty() {
            return Err(SimulationError::InvariantViolation(
                "state holds no agents".to_string(),
            ));
        }
        self.trust.validate()?;
        for id in self.agents.keys() {
            // Every agent must have a trust row
            self.trust.get(id, id)?;
        }
        let last = self.clock.last_completed();
        for snapshot in self.metrics.rows() {
            if snapshot.period == 0 || snapshot.period > last {
                return Err(SimulationError::InvariantViolation(format!(
                    "snapshot for {} at period {} outside completed range 1..={}",
                    snapshot.agent, snapshot.period, last
                )));
            }
            if !self.agents.contains_key(&snapshot.agent) {
                return Err(SimulationError::UnknownAgent(snapshot.agent.clone()));
            }
        }
        Ok(())
    }
}
