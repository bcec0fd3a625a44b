//! Period engine
//!
//! Integrates all components over one period:
//!
//! ```text
//! For each period p:
//! 1. Credit the period's time allowance
//! 2. Apply classified events in arrival order
//!    - conflicts/alliances → relationship ledger → trust matrix
//!    - behavioral observations → pattern tracker
//!    - interactions → connection bumps
//!    - signals → collected for metrics and connection context
//!    - resource adjustments → deferred until after base contribution
//! 3. Apply base resource contributions (involvement-scaled)
//! 4. Apply deferred resource adjustments
//! 5. Recompute derived connection strengths
//! 6. Snapshot the five metrics per agent
//! 7. Mark the period complete and validate invariants
//! ```
//!
//! Event application within a period is strictly sequential: later
//! updates observe the effects of earlier ones.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::behavior::PatternRecord;
use crate::metrics::aggregator::compute_snapshot;
use crate::models::agent::{Agent, AgentProfile, ContributionPattern, ResourcePool};
use crate::models::event::{EventKind, ExtractedEvent};
use crate::models::state::ExperimentState;
use crate::orchestrator::checkpoint::CheckpointManager;
use crate::relations::connections::pair_key;
use crate::relations::ledger::{AllianceRecord, ConflictRecord};

// ============================================================================
// Configuration Types
// ============================================================================

/// Behavioral variant of the run
///
/// `Altered` selects each agent's alternate contribution pattern where
/// one is configured. The variant participates in the config hash, so
/// checkpoints from different variants cannot be cross-loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Base,
    Altered,
}

/// Complete experiment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Number of periods in the run
    pub total_periods: u32,

    /// Behavioral variant selection
    #[serde(default)]
    pub variant: Variant,

    /// Opening balance of the shared pool
    pub shared_budget: f64,

    /// Per-agent configuration
    pub agents: Vec<AgentConfig>,
}

/// Per-agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique agent identifier (e.g. "C1")
    pub id: String,

    /// Personality profile carried through state and snapshots
    pub profile: AgentProfile,

    pub starting_money: f64,
    pub starting_reputation: f64,
    pub starting_time_hours: f64,

    /// Weekly time allowance credited each period
    pub weekly_time_hours: f64,

    /// Base contribution pattern
    pub pattern: ContributionPattern,

    /// Alternate pattern used under the `Altered` variant
    #[serde(default)]
    pub altered_pattern: Option<ContributionPattern>,
}

// ============================================================================
// Inputs and Results
// ============================================================================

/// Everything the engine consumes for one period
///
/// Produced outside the engine: events come from the extraction
/// gateway, mention counts from the dialogue-generator contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodInputs {
    pub period: u32,

    /// Classified events in arrival order
    pub events: Vec<ExtractedEvent>,

    /// Per-agent transcript mention counts; absent agents count zero
    #[serde(default)]
    pub mentions: BTreeMap<String, u32>,
}

/// Summary of one applied period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodResult {
    pub period: u32,
    pub admitted_events: usize,
    pub discarded_events: usize,
    pub conflicts_recorded: usize,
    pub alliances_recorded: usize,
    pub patterns_recorded: usize,
    pub snapshots_written: usize,
    /// Derived connection strength per unordered pair key
    pub connection_strengths: BTreeMap<String, f64>,
}

// ============================================================================
// Errors
// ============================================================================

/// Engine and checkpoint error types
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown agent identifier: {0}")]
    UnknownAgent(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("snapshot already written for agent {agent} in period {period}")]
    DuplicateSnapshot { agent: String, period: u32 },

    #[error("period {got} cannot run; expected period {expected}")]
    PeriodOutOfOrder { got: u32, expected: u32 },

    #[error("serialization failure: {0}")]
    Serialization(String),

    #[error("checkpoint io failure: {0}")]
    CheckpointIo(String),

    #[error("checkpoint config mismatch: expected {expected}, found {found}")]
    ConfigMismatch { expected: String, found: String },

    #[error("no checkpoint found under {0}")]
    NoCheckpoint(String),
}

// ============================================================================
// Engine
// ============================================================================

/// Applies periods to the experiment state
///
/// The engine owns the state while a period is being applied; between
/// periods the checkpoint manager is the state's keeper of record.
#[derive(Debug)]
pub struct Engine {
    state: ExperimentState,
}

impl Engine {
    /// Build a fresh engine from configuration
    pub fn new(config: &ExperimentConfig) -> Result<Self, SimulationError> {
        validate_config(config)?;
        let agents: Vec<Agent> = config
            .agents
            .iter()
            .map(|a| {
                let pattern = match (config.variant, a.altered_pattern) {
                    (Variant::Altered, Some(altered)) => altered,
                    _ => a.pattern,
                };
                Agent::new(
                    a.id.clone(),
                    a.profile.clone(),
                    ResourcePool::new(
                        a.starting_money,
                        a.starting_reputation,
                        a.starting_time_hours,
                    ),
                    pattern,
                    a.weekly_time_hours,
                )
            })
            .collect();
        let state = ExperimentState::new(agents, config.total_periods, config.shared_budget);
        info!(
            run_id = %state.run_id(),
            agents = state.agents().len(),
            periods = config.total_periods,
            "experiment initialized"
        );
        Ok(Self { state })
    }

    /// Rebuild an engine around a restored state
    pub fn from_state(state: ExperimentState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ExperimentState {
        &self.state
    }

    /// Consume the engine, yielding its state
    pub fn into_state(self) -> ExperimentState {
        self.state
    }

    /// Apply one period's inputs
    ///
    /// Periods run strictly in sequence. All admitted events are
    /// applied in arrival order; low-confidence events are discarded
    /// and counted but never touch state.
    pub fn run_period(&mut self, inputs: &PeriodInputs) -> Result<PeriodResult, SimulationError> {
        let period = inputs.period;
        let expected = self.state.clock.next_period();
        if period != expected {
            return Err(SimulationError::PeriodOutOfOrder {
                got: period,
                expected,
            });
        }
        info!(period, events = inputs.events.len(), "applying period");

        // 1. Time allowance precedes any deduction for the period.
        self.state
            .resources
            .credit_period_allowance(&mut self.state.agents, period);

        let mut admitted = 0usize;
        let mut discarded = 0usize;
        let mut conflicts_recorded = 0usize;
        let mut alliances_recorded = 0usize;
        let mut patterns_recorded = 0usize;
        let mut signals: Vec<ExtractedEvent> = Vec::new();
        let mut adjustments: Vec<&ExtractedEvent> = Vec::new();

        // 2. Events apply in arrival order.
        for event in &inputs.events {
            match &event.kind {
                EventKind::Conflict {
                    participants,
                    severity,
                } => {
                    let record = ConflictRecord {
                        participants: participants.clone(),
                        severity: *severity,
                        confidence: event.confidence,
                        period,
                        reason: event.description.clone(),
                    };
                    if self
                        .state
                        .relationships
                        .admit_conflict(&mut self.state.trust, record)?
                    {
                        admitted += 1;
                        conflicts_recorded += 1;
                    } else {
                        discarded += 1;
                    }
                }
                EventKind::Alliance {
                    participants,
                    strength,
                } => {
                    let record = AllianceRecord {
                        participants: participants.clone(),
                        strength: *strength,
                        confidence: event.confidence,
                        period,
                        reason: event.description.clone(),
                    };
                    if self
                        .state
                        .relationships
                        .admit_alliance(&mut self.state.trust, record)?
                    {
                        admitted += 1;
                        alliances_recorded += 1;
                    } else {
                        discarded += 1;
                    }
                }
                EventKind::Behavior {
                    agent,
                    behavior,
                    impact,
                } => {
                    if !event.is_admissible() {
                        discarded += 1;
                        continue;
                    }
                    self.ensure_known(agent)?;
                    let record = PatternRecord {
                        agent: agent.clone(),
                        behavior: *behavior,
                        impact: *impact,
                        period,
                        description: event.description.clone(),
                    };
                    self.state.behaviors.admit(record, event.confidence);
                    admitted += 1;
                    patterns_recorded += 1;
                }
                EventKind::Interaction { participants } => {
                    if !event.is_admissible() {
                        discarded += 1;
                        continue;
                    }
                    for id in participants {
                        self.ensure_known(id)?;
                    }
                    for (i, a) in participants.iter().enumerate() {
                        for b in participants.iter().skip(i + 1) {
                            if a != b {
                                self.state.connections.record_interaction(a, b);
                            }
                        }
                    }
                    signals.push(event.clone());
                    admitted += 1;
                }
                EventKind::FinancialSignal { agent, .. }
                | EventKind::OpportunitySignal { agent }
                | EventKind::SocialSignal { agent, .. } => {
                    if !event.is_admissible() {
                        discarded += 1;
                        continue;
                    }
                    self.ensure_known(agent)?;
                    signals.push(event.clone());
                    admitted += 1;
                }
                EventKind::ResourceAdjustment { .. } => {
                    if !event.is_admissible() {
                        discarded += 1;
                        continue;
                    }
                    adjustments.push(event);
                    admitted += 1;
                }
            }
        }
        debug!(period, admitted, discarded, "events classified");

        // 3. Base contribution scaled by involvement.
        self.state.resources.apply_period_contributions(
            &mut self.state.agents,
            &inputs.mentions,
            period,
        );

        // 4. Explicit scenario-outcome deltas follow the base contribution.
        for event in adjustments {
            if let EventKind::ResourceAdjustment {
                agent,
                money,
                reputation,
                time_hours,
            } = &event.kind
            {
                self.state.resources.apply_adjustment(
                    &mut self.state.agents,
                    agent.as_deref(),
                    *money,
                    *reputation,
                    *time_hours,
                    period,
                    &event.description,
                )?;
            }
        }

        // 5. Derived connection strengths for the period output.
        let ids = self.state.agent_ids();
        let pair_signals = pair_signal_counts(&ids, &signals);
        let connection_strengths = self.state.connections.strengths(
            &ids,
            &self.state.trust,
            &self.state.relationships,
            &pair_signals,
        )?;

        // 6. Snapshot metrics once every input for the period is final.
        let mut snapshots_written = 0usize;
        for id in &ids {
            let agent = &self.state.agents[id];
            let mention_count = inputs.mentions.get(id).copied().unwrap_or(0);
            let snapshot = compute_snapshot(
                agent,
                period,
                &self.state.trust,
                &self.state.relationships,
                &self.state.behaviors,
                &signals,
                mention_count,
            )?;
            self.state.metrics.record(snapshot)?;
            snapshots_written += 1;
        }

        // 7. Completion and invariant check.
        self.state
            .clock
            .complete(period)
            .map_err(|e| SimulationError::PeriodOutOfOrder {
                got: e.got,
                expected: e.expected,
            })?;
        self.state.validate()?;

        info!(period, admitted, discarded, "period applied");
        Ok(PeriodResult {
            period,
            admitted_events: admitted,
            discarded_events: discarded,
            conflicts_recorded,
            alliances_recorded,
            patterns_recorded,
            snapshots_written,
            connection_strengths,
        })
    }

    fn ensure_known(&self, id: &str) -> Result<(), SimulationError> {
        if self.state.agents.contains_key(id) {
            Ok(())
        } else {
            Err(SimulationError::UnknownAgent(id.to_string()))
        }
    }
}

/// Per-pair counts of the period's positive signals
///
/// Interactions credit each unordered pair among their participants;
/// positive social signals credit every pair containing the named agent.
fn pair_signal_counts(
    ids: &[String],
    signals: &[ExtractedEvent],
) -> BTreeMap<String, u32> {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for event in signals {
        match &event.kind {
            EventKind::Interaction { participants } => {
                for (i, a) in participants.iter().enumerate() {
                    for b in participants.iter().skip(i + 1) {
                        if a != b {
                            *counts.entry(pair_key(a, b)).or_insert(0) += 1;
                        }
                    }
                }
            }
            EventKind::SocialSignal {
                agent,
                positive: true,
            } => {
                for other in ids {
                    if other != agent {
                        *counts.entry(pair_key(agent, other)).or_insert(0) += 1;
                    }
                }
            }
            _ => {}
        }
    }
    counts
}

fn validate_config(config: &ExperimentConfig) -> Result<(), SimulationError> {
    if config.total_periods == 0 {
        return Err(SimulationError::InvalidConfig(
            "total_periods must be positive".to_string(),
        ));
    }
    if config.agents.is_empty() {
        return Err(SimulationError::InvalidConfig(
            "at least one agent is required".to_string(),
        ));
    }
    let mut seen = std::collections::BTreeSet::new();
    for agent in &config.agents {
        if agent.id.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "agent id must not be empty".to_string(),
            ));
        }
        if !seen.insert(agent.id.as_str()) {
            return Err(SimulationError::InvalidConfig(format!(
                "duplicate agent id: {}",
                agent.id
            )));
        }
    }
    Ok(())
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Engine plus checkpoint manager: the run-level driver
///
/// A period transition is all-or-nothing from the caller's point of
/// view: `complete_period` either applies every admitted event and
/// writes the checkpoint, or returns an error with the previous
/// checkpoint left intact, so the period can be retried on resume.
#[derive(Debug)]
pub struct Orchestrator {
    engine: Engine,
    checkpoints: CheckpointManager,
}

impl Orchestrator {
    /// Start a fresh run
    pub fn new(
        config: &ExperimentConfig,
        state_dir: impl Into<std::path::PathBuf>,
    ) -> Result<Self, SimulationError> {
        let checkpoints = CheckpointManager::new(state_dir, config)?;
        let engine = Engine::new(config)?;
        Ok(Self {
            engine,
            checkpoints,
        })
    }

    /// Resume from the highest completed checkpoint
    pub fn resume(
        config: &ExperimentConfig,
        state_dir: impl Into<std::path::PathBuf>,
    ) -> Result<Self, SimulationError> {
        let checkpoints = CheckpointManager::new(state_dir, config)?;
        let state = checkpoints.load_latest()?;
        info!(
            run_id = %state.run_id(),
            period = state.last_completed_period(),
            "resumed from checkpoint"
        );
        Ok(Self {
            engine: Engine::from_state(state),
            checkpoints,
        })
    }

    /// Resume if a checkpoint exists, otherwise start fresh
    pub fn resume_or_new(
        config: &ExperimentConfig,
        state_dir: impl Into<std::path::PathBuf>,
    ) -> Result<Self, SimulationError> {
        let checkpoints = CheckpointManager::new(state_dir, config)?;
        match checkpoints.latest_period()? {
            Some(_) => {
                let state = checkpoints.load_latest()?;
                info!(
                    run_id = %state.run_id(),
                    period = state.last_completed_period(),
                    "resumed from checkpoint"
                );
                Ok(Self {
                    engine: Engine::from_state(state),
                    checkpoints,
                })
            }
            None => Ok(Self {
                engine: Engine::new(config)?,
                checkpoints,
            }),
        }
    }

    pub fn state(&self) -> &ExperimentState {
        self.engine.state()
    }

    pub fn is_finished(&self) -> bool {
        self.engine.state().is_finished()
    }

    /// Apply one period and persist the result
    pub fn complete_period(
        &mut self,
        inputs: &PeriodInputs,
    ) -> Result<PeriodResult, SimulationError> {
        let result = self.engine.run_period(inputs)?;
        self.checkpoints.save(self.engine.state())?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> AgentProfile {
        AgentProfile {
            role: String::new(),
            goal: String::new(),
            strengths: vec![],
            weaknesses: vec![],
            success_metric: String::new(),
        }
    }

    fn agent_config(id: &str) -> AgentConfig {
        AgentConfig {
            id: id.to_string(),
            profile: profile(),
            starting_money: 1000.0,
            starting_reputation: 10.0,
            starting_time_hours: 40.0,
            weekly_time_hours: 40.0,
            pattern: ContributionPattern {
                base_time_hours: 8.0,
                base_money: 500.0,
                base_reputation: 2.0,
            },
            altered_pattern: None,
        }
    }

    fn config() -> ExperimentConfig {
        ExperimentConfig {
            total_periods: 6,
            variant: Variant::Base,
            shared_budget: 100_000.0,
            agents: vec![agent_config("C1"), agent_config("C2")],
        }
    }

    #[test]
    fn test_duplicate_agent_id_rejected() {
        let mut cfg = config();
        cfg.agents.push(agent_config("C1"));
        assert!(matches!(
            Engine::new(&cfg),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_period_must_run_in_sequence() {
        let mut engine = Engine::new(&config()).unwrap();
        let inputs = PeriodInputs {
            period: 3,
            events: vec![],
            mentions: BTreeMap::new(),
        };
        assert!(matches!(
            engine.run_period(&inputs),
            Err(SimulationError::PeriodOutOfOrder {
                got: 3,
                expected: 1
            })
        ));
    }

    #[test]
    fn test_altered_variant_selects_alternate_pattern() {
        let mut cfg = config();
        cfg.variant = Variant::Altered;
        cfg.agents[0].altered_pattern = Some(ContributionPattern {
            base_time_hours: 1.0,
            base_money: 1.0,
            base_reputation: 1.0,
        });
        let engine = Engine::new(&cfg).unwrap();
        let pattern = engine.state().agent("C1").unwrap().pattern();
        assert_eq!(pattern.base_money, 1.0);
        // Agents without an alternate keep their base pattern
        let other = engine.state().agent("C2").unwrap().pattern();
        assert_eq!(other.base_money, 500.0);
    }

    #[test]
    fn test_empty_period_still_snapshots() {
        let mut engine = Engine::new(&config()).unwrap();
        let inputs = PeriodInputs {
            period: 1,
            events: vec![],
            mentions: BTreeMap::new(),
        };
        let result = engine.run_period(&inputs).unwrap();
        assert_eq!(result.snapshots_written, 2);
        assert_eq!(result.connection_strengths.len(), 1);
        assert_eq!(engine.state().last_completed_period(), 1);
    }
}
