//! Resource ledger
//!
//! Applies the per-period resource dynamics:
//!
//! 1. a weekly time allowance is credited (four weeks per period),
//! 2. each agent's base contribution pattern is applied, scaled by an
//!    involvement multiplier derived from transcript mention counts,
//! 3. explicit scenario-outcome adjustments are applied afterwards.
//!
//! Money, reputation and time are never reset between periods; they
//! accumulate for the life of the run. Every applied delta is recorded
//! in an append-only allocation history for audit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::agent::Agent;
use crate::orchestrator::SimulationError;

/// Weeks folded into one period's time allowance
pub const WEEKS_PER_PERIOD: f64 = 4.0;

/// Involvement multiplier for a period's mention count
///
/// `clamp(1.0 + (mentions − 3) × 0.1, 0.7, 1.5)` — an agent mentioned
/// three times contributes exactly their base pattern; silence bottoms
/// out at 0.7, dominance caps at 1.5.
///
/// # Example
/// ```
/// use relationship_sim_core::resources::involvement_multiplier;
///
/// assert_eq!(involvement_multiplier(0), 0.7);
/// assert_eq!(involvement_multiplier(3), 1.0);
/// assert!((involvement_multiplier(5) - 1.2).abs() < 1e-12);
/// assert_eq!(involvement_multiplier(20), 1.5);
/// ```
pub fn involvement_multiplier(mentions: u32) -> f64 {
    (1.0 + (mentions as f64 - 3.0) * 0.1).clamp(0.7, 1.5)
}

/// Resource categories tracked per agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Time,
    Money,
    Reputation,
}

/// One applied resource delta
///
/// `agent: None` denotes the shared pool. Amounts are signed: time
/// deductions are negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub agent: Option<String>,
    pub kind: ResourceKind,
    pub amount: f64,
    pub period: u32,
    pub description: String,
}

/// Resources held jointly by all agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedPool {
    budget: f64,
    reputation: f64,
}

impl SharedPool {
    pub fn new(budget: f64) -> Self {
        Self {
            budget,
            reputation: 0.0,
        }
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn reputation(&self) -> f64 {
        self.reputation
    }

    /// Debit the shared budget; refuses to overdraw
    pub fn try_debit(&mut self, amount: f64) -> bool {
        if self.budget >= amount {
            self.budget -= amount;
            true
        } else {
            false
        }
    }

    fn credit(&mut self, amount: f64) {
        self.budget += amount;
    }

    fn credit_reputation(&mut self, amount: f64) {
        self.reputation += amount;
    }
}

impl Default for SharedPool {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Shared pool plus append-only allocation history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLog {
    shared: SharedPool,
    history: Vec<AllocationRecord>,
}

impl ResourceLog {
    pub fn new(shared_budget: f64) -> Self {
        Self {
            shared: SharedPool::new(shared_budget),
            history: Vec::new(),
        }
    }

    pub fn shared(&self) -> &SharedPool {
        &self.shared
    }

    pub fn history(&self) -> &[AllocationRecord] {
        &self.history
    }

    /// Credit every agent's weekly time allowance for the period
    pub fn credit_period_allowance(
        &mut self,
        agents: &mut BTreeMap<String, Agent>,
        period: u32,
    ) {
        for agent in agents.values_mut() {
            let hours = agent.weekly_time_hours() * WEEKS_PER_PERIOD;
            agent.credit_time(hours);
            self.record(
                Some(agent.id().to_string()),
                ResourceKind::Time,
                hours,
                period,
                "weekly allowance",
            );
        }
    }

    /// Apply every agent's base contribution, scaled by involvement
    ///
    /// `mentions` maps agent ids to that agent's mention count in the
    /// period transcript; absent agents count zero mentions.
    pub fn apply_period_contributions(
        &mut self,
        agents: &mut BTreeMap<String, Agent>,
        mentions: &BTreeMap<String, u32>,
        period: u32,
    ) {
        for agent in agents.values_mut() {
            let count = mentions.get(agent.id()).copied().unwrap_or(0);
            let multiplier = involvement_multiplier(count);
            let pattern = *agent.pattern();

            let time = pattern.base_time_hours * multiplier;
            let money = pattern.base_money * multiplier;
            let reputation = pattern.base_reputation * multiplier;

            agent.deduct_time(time);
            agent.credit_money(money);
            agent.credit_reputation(reputation);

            let id = agent.id().to_string();
            self.record(
                Some(id.clone()),
                ResourceKind::Time,
                -time,
                period,
                "period participation",
            );
            self.record(
                Some(id.clone()),
                ResourceKind::Money,
                money,
                period,
                "period contribution",
            );
            self.record(
                Some(id),
                ResourceKind::Reputation,
                reputation,
                period,
                "period contribution",
            );
        }
    }

    /// Apply an explicit scenario-outcome adjustment
    ///
    /// Targets one agent, or the shared pool when `agent` is `None`.
    /// Shared-pool debits that would overdraw the budget are skipped
    /// with a warning, mirroring a rejected allocation request.
    pub fn apply_adjustment(
        &mut self,
        agents: &mut BTreeMap<String, Agent>,
        agent: Option<&str>,
        money: f64,
        reputation: f64,
        time_hours: f64,
        period: u32,
        description: &str,
    ) -> Result<(), SimulationError> {
        match agent {
            Some(id) => {
                let target = agents
                    .get_mut(id)
                    .ok_or_else(|| SimulationError::UnknownAgent(id.to_string()))?;
                if money != 0.0 {
                    target.credit_money(money);
                    self.record(
                        Some(id.to_string()),
                        ResourceKind::Money,
                        money,
                        period,
                        description,
                    );
                }
                if reputation != 0.0 {
                    target.credit_reputation(reputation);
                    self.record(
                        Some(id.to_string()),
                        ResourceKind::Reputation,
                        reputation,
                        period,
                        description,
                    );
                }
                if time_hours != 0.0 {
                    target.deduct_time(time_hours);
                    self.record(
                        Some(id.to_string()),
                        ResourceKind::Time,
                        -time_hours,
                        period,
                        description,
                    );
                }
            }
            None => {
                if money > 0.0 {
                    self.shared.credit(money);
                    self.record(None, ResourceKind::Money, money, period, description);
                } else if money < 0.0 {
                    if self.shared.try_debit(-money) {
                        self.record(None, ResourceKind::Money, money, period, description);
                    } else {
                        warn!(
                            amount = -money,
                            budget = self.shared.budget(),
                            "shared budget insufficient; adjustment skipped"
                        );
                    }
                }
                if reputation != 0.0 {
                    self.shared.credit_reputation(reputation);
                    self.record(None, ResourceKind::Reputation, reputation, period, description);
                }
                if time_hours != 0.0 {
                    warn!("time adjustment without a target agent is ignored");
                }
            }
        }
        Ok(())
    }

    fn record(
        &mut self,
        agent: Option<String>,
        kind: ResourceKind,
        amount: f64,
        period: u32,
        description: &str,
    ) {
        self.history.push(AllocationRecord {
            agent,
            kind,
            amount,
            period,
            description: description.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::agent::{AgentProfile, ContributionPattern, ResourcePool};

    fn agents() -> BTreeMap<String, Agent> {
        let mut map = BTreeMap::new();
        map.insert(
            "C1".to_string(),
            Agent::new(
                "C1".to_string(),
                AgentProfile {
                    role: String::new(),
                    goal: String::new(),
                    strengths: vec![],
                    weaknesses: vec![],
                    success_metric: String::new(),
                },
                ResourcePool::new(5000.0, 10.0, 40.0),
                ContributionPattern {
                    base_time_hours: 8.0,
                    base_money: 500.0,
                    base_reputation: 2.0,
                },
                42.0,
            ),
        );
        map
    }

    #[test]
    fn test_multiplier_clamps() {
        assert_eq!(involvement_multiplier(0), 0.7);
        assert_eq!(involvement_multiplier(20), 1.5);
        assert!((involvement_multiplier(5) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_base_contribution_with_five_mentions() {
        let mut pool = agents();
        let mut log = ResourceLog::new(100_000.0);
        let mentions: BTreeMap<String, u32> = [("C1".to_string(), 5)].into_iter().collect();

        log.apply_period_contributions(&mut pool, &mentions, 1);

        let agent = &pool["C1"];
        assert!((agent.resources().money() - 5600.0).abs() < 1e-9);
        assert!((agent.resources().reputation_points() - 12.4).abs() < 1e-9);
        assert!((agent.resources().time_remaining() - (40.0 - 9.6)).abs() < 1e-9);
        assert_eq!(log.history().len(), 3);
    }

    #[test]
    fn test_shared_debit_refuses_overdraw() {
        let mut pool = agents();
        let mut log = ResourceLog::new(100.0);
        log.apply_adjustment(&mut pool, None, -500.0, 0.0, 0.0, 1, "legal costs")
            .unwrap();
        // Skipped: budget unchanged, nothing recorded
        assert_eq!(log.shared().budget(), 100.0);
        assert!(log.history().is_empty());
    }

    #[test]
    fn test_adjustment_unknown_agent_is_error() {
        let mut pool = agents();
        let mut log = ResourceLog::new(0.0);
        let err = log
            .apply_adjustment(&mut pool, Some("C9"), 10.0, 0.0, 0.0, 1, "x")
            .unwrap_err();
        assert!(matches!(err, SimulationError::UnknownAgent(id) if id == "C9"));
    }
}
