//! Metrics aggregator
//!
//! Computes the five published metrics per agent per period. Every
//! metric is a pure function of accumulated state — ledgers, trackers,
//! resource pools and the period's admitted signals — and is snapshotted
//! exactly once per (agent, period). Snapshots are immutable once
//! written.

use serde::{Deserialize, Serialize};

use crate::behavior::PatternTracker;
use crate::models::agent::Agent;
use crate::models::event::{EventKind, ExtractedEvent};
use crate::orchestrator::SimulationError;
use crate::relations::ledger::RelationshipLedger;
use crate::relations::trust::TrustMatrix;

/// Mention count weight in the influence index
const INFLUENCE_PER_MENTION: f64 = 0.05;

/// The five published metrics for one agent-period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySnapshot {
    pub agent: String,
    pub period: u32,
    pub financial_returns: f64,
    pub social_capital: f64,
    /// Always in [0, 1]
    pub influence_index: f64,
    pub future_opportunities: f64,
    pub reputation_score: f64,
}

/// Metric selector for rankings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    FinancialReturns,
    SocialCapital,
    InfluenceIndex,
    FutureOpportunities,
    ReputationScore,
}

impl MonthlySnapshot {
    fn metric(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::FinancialReturns => self.financial_returns,
            MetricKind::SocialCapital => self.social_capital,
            MetricKind::InfluenceIndex => self.influence_index,
            MetricKind::FutureOpportunities => self.future_opportunities,
            MetricKind::ReputationScore => self.reputation_score,
        }
    }
}

/// Compute one agent's snapshot for a period
///
/// `signals` must contain only the period's admitted events; the
/// aggregator itself applies no confidence gating.
pub fn compute_snapshot(
    agent: &Agent,
    period: u32,
    trust: &TrustMatrix,
    ledger: &RelationshipLedger,
    behaviors: &PatternTracker,
    signals: &[ExtractedEvent],
    mention_count: u32,
) -> Result<MonthlySnapshot, SimulationError> {
    let id = agent.id();
    let bonus = behaviors.period_bonus(id, period);

    // Financial returns: a fixed share of accumulated money plus the
    // period's keyword-driven scenario bonuses.
    let signal_bonus: f64 = signals
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::FinancialSignal { agent, class } if agent == id => Some(class.bonus()),
            _ => None,
        })
        .sum();
    let financial_returns = agent.resources().money() * 0.1 + signal_bonus;

    // Social capital: alliance history, average outgoing trust, and
    // behavioral bonuses.
    let alliance_count = ledger.alliances_involving(id, None).len() as f64;
    let avg_trust = trust.average_toward_others(id)?;
    let social_capital = alliance_count * 10.0 + avg_trust * 20.0 + bonus.social_capital;

    // Influence index, clamped into [0, 1].
    let influence_index =
        (bonus.influence + INFLUENCE_PER_MENTION * mention_count as f64).min(1.0);

    // Future opportunities: opportunity signals weigh double; positive
    // relationship indicators (period alliances plus positive social
    // signals naming the agent) weigh single.
    let opportunity_count = signals
        .iter()
        .filter(|e| {
            matches!(&e.kind, EventKind::OpportunitySignal { agent } if agent == id)
        })
        .count() as f64;
    let positive_indicators = ledger.alliances_involving(id, Some(period)).len() as f64
        + signals
            .iter()
            .filter(|e| {
                matches!(
                    &e.kind,
                    EventKind::SocialSignal { agent, positive: true } if agent == id
                )
            })
            .count() as f64;
    let future_opportunities = 2.0 * opportunity_count + positive_indicators;

    // Reputation: direct passthrough of the accumulated points.
    let reputation_score = agent.resources().reputation_points();

    Ok(MonthlySnapshot {
        agent: id.to_string(),
        period,
        financial_returns,
        social_capital,
        influence_index,
        future_opportunities,
        reputation_score,
    })
}

/// Immutable store of written snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStore {
    rows: Vec<MonthlySnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot; one per (agent, period), ever
    pub fn record(&mut self, snapshot: MonthlySnapshot) -> Result<(), SimulationError> {
        if self
            .rows
            .iter()
            .any(|s| s.agent == snapshot.agent && s.period == snapshot.period)
        {
            return Err(SimulationError::DuplicateSnapshot {
                agent: snapshot.agent,
                period: snapshot.period,
            });
        }
        self.rows.push(snapshot);
        Ok(())
    }

    pub fn rows(&self) -> &[MonthlySnapshot] {
        &self.rows
    }

    pub fn for_period(&self, period: u32) -> Vec<&MonthlySnapshot> {
        self.rows.iter().filter(|s| s.period == period).collect()
    }

    pub fn for_agent(&self, agent: &str) -> Vec<&MonthlySnapshot> {
        self.rows.iter().filter(|s| s.agent == agent).collect()
    }

    /// Agents ranked descending by a metric for one period
    pub fn leaderboard(&self, kind: MetricKind, period: u32) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .for_period(period)
            .into_iter()
            .map(|s| (s.agent.clone(), s.metric(kind)))
            .collect();
        entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        entries
    }
}
