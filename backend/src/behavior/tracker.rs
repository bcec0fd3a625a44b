//! Behavioral pattern tracker
//!
//! Append-only per-agent history of admitted behavioral observations.
//! Each behavior kind carries two fixed bonuses (either may be zero):
//!
//! | kind               | social capital | influence |
//! |--------------------|---------------:|----------:|
//! | leadership         |             +5 |     +0.3  |
//! | collaboration      |             +5 |      0    |
//! | cooperation        |             +5 |      0    |
//! | proposal_making    |              0 |     +0.25 |
//! | assertiveness      |              0 |     +0.2  |
//! | consensus_building |              0 |     +0.15 |
//! | competition        |             +2 |      0    |
//! | conflict_avoidance |             +2 |      0    |
//! | compromise         |              0 |      0    |
//! | risk_taking        |              0 |      0    |
//! | conservative       |              0 |      0    |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::event::{BehaviorImpact, CONFIDENCE_GATE};

/// Fixed enumeration of tracked behavior kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    Leadership,
    Collaboration,
    Cooperation,
    ProposalMaking,
    Assertiveness,
    ConsensusBuilding,
    Competition,
    ConflictAvoidance,
    Compromise,
    RiskTaking,
    Conservative,
}

impl BehaviorKind {
    /// Social-capital bonus contributed by one observation
    pub fn social_capital_bonus(self) -> f64 {
        match self {
            BehaviorKind::Leadership
            | BehaviorKind::Collaboration
            | BehaviorKind::Cooperation => 5.0,
            BehaviorKind::Competition | BehaviorKind::ConflictAvoidance => 2.0,
            _ => 0.0,
        }
    }

    /// Influence-index bonus contributed by one observation
    pub fn influence_bonus(self) -> f64 {
        match self {
            BehaviorKind::Leadership => 0.3,
            BehaviorKind::ProposalMaking => 0.25,
            BehaviorKind::Assertiveness => 0.2,
            BehaviorKind::ConsensusBuilding => 0.15,
            _ => 0.0,
        }
    }
}

/// One admitted behavioral observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub agent: String,
    pub behavior: BehaviorKind,
    pub impact: BehaviorImpact,
    pub period: u32,
    pub description: String,
}

/// Aggregate bonuses over one agent-period
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BehaviorBonus {
    pub social_capital: f64,
    pub influence: f64,
}

/// Append-only behavioral history per agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternTracker {
    history: BTreeMap<String, Vec<PatternRecord>>,
}

impl PatternTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit an observation if it clears the confidence gate
    ///
    /// Returns whether the record was admitted. History is never
    /// retroactively altered.
    pub fn admit(&mut self, record: PatternRecord, confidence: f64) -> bool {
        if confidence <= CONFIDENCE_GATE {
            debug!(
                agent = %record.agent,
                confidence,
                "discarding low-confidence behavioral observation"
            );
            return false;
        }
        self.history.entry(record.agent.clone()).or_default().push(record);
        true
    }

    /// Full history for an agent
    pub fn history_for(&self, agent: &str) -> &[PatternRecord] {
        self.history.get(agent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Summed bonuses over the agent's admitted patterns in `period`
    pub fn period_bonus(&self, agent: &str, period: u32) -> BehaviorBonus {
        let mut bonus = BehaviorBonus::default();
        for record in self.history_for(agent) {
            if record.period == period {
                bonus.social_capital += record.behavior.social_capital_bonus();
                bonus.influence += record.behavior.influence_bonus();
            }
        }
        bonus
    }

    /// Total number of admitted records across all agents
    pub fn len(&self) -> usize {
        self.history.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.history.values().all(Vec::is_empty)
    }
}
