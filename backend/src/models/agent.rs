//! Agent model
//!
//! One agent per scenario participant, created at experiment start and
//! never destroyed. An agent is a fixed identity and personality
//! profile plus a mutable pool of resources:
//! - `money` and `reputation_points` grow over the run
//! - `time_remaining` is drawn down by participation and replenished by
//!   the periodic allowance
//!
//! All three are running, unbounded real numbers. Resources are only
//! ever mutated through the resource ledger; the credit/debit methods
//! here are the primitives the ledger builds on.

use serde::{Deserialize, Serialize};

/// Personality profile, fixed at experiment start
///
/// The profile is descriptive: the engine never interprets the text
/// fields, it only carries them through state and snapshots so external
/// tooling can correlate behavior with personality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Short role description (e.g. "Creative Visionary")
    pub role: String,
    /// The agent's stated goal for the scenario
    pub goal: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    /// How the agent itself measures success
    pub success_metric: String,
}

/// Fixed base contribution applied each period, scaled by involvement
///
/// Time is spent; money and reputation are earned. The effective delta
/// for a period is `base × involvement_multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributionPattern {
    pub base_time_hours: f64,
    pub base_money: f64,
    pub base_reputation: f64,
}

/// Mutable per-agent resource pool
///
/// Values accumulate for the life of the run; there is no floor or
/// ceiling beyond what the update formulas themselves clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    money: f64,
    reputation_points: f64,
    time_remaining: f64,
}

impl ResourcePool {
    pub fn new(money: f64, reputation_points: f64, time_remaining: f64) -> Self {
        Self {
            money,
            reputation_points,
            time_remaining,
        }
    }

    pub fn money(&self) -> f64 {
        self.money
    }

    pub fn reputation_points(&self) -> f64 {
        self.reputation_points
    }

    pub fn time_remaining(&self) -> f64 {
        self.time_remaining
    }
}

/// A scenario participant
///
/// # Example
/// ```
/// use relationship_sim_core::models::{Agent, AgentProfile, ContributionPattern};
///
/// let agent = Agent::new(
///     "C1".to_string(),
///     AgentProfile {
///         role: "Creative Visionary".to_string(),
///         goal: "Turn the venture into a cultural hub".to_string(),
///         strengths: vec!["Creative".to_string()],
///         weaknesses: vec!["Impatient".to_string()],
///         success_metric: "Recognition".to_string(),
///     },
///     relationship_sim_core::models::ResourcePool::new(5000.0, 10.0, 40.0),
///     ContributionPattern {
///         base_time_hours: 8.0,
///         base_money: 500.0,
///         base_reputation: 2.0,
///     },
///     42.0,
/// );
/// assert_eq!(agent.id(), "C1");
/// assert_eq!(agent.resources().money(), 5000.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent identifier (e.g. "C1")
    id: String,
    profile: AgentProfile,
    resources: ResourcePool,
    /// Base contribution scaled each period by involvement
    pattern: ContributionPattern,
    /// Weekly working-time allowance credited at the start of each period
    weekly_time_hours: f64,
}

impl Agent {
    pub fn new(
        id: String,
        profile: AgentProfile,
        resources: ResourcePool,
        pattern: ContributionPattern,
        weekly_time_hours: f64,
    ) -> Self {
        Self {
            id,
            profile,
            resources,
            pattern,
            weekly_time_hours,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn resources(&self) -> &ResourcePool {
        &self.resources
    }

    pub fn pattern(&self) -> &ContributionPattern {
        &self.pattern
    }

    pub fn weekly_time_hours(&self) -> f64 {
        self.weekly_time_hours
    }

    /// Add money to the agent's pool (negative amounts deduct)
    ///
    /// Only the resource ledger should call this.
    pub(crate) fn credit_money(&mut self, amount: f64) {
        self.resources.money += amount;
    }

    /// Add reputation points (negative amounts deduct)
    pub(crate) fn credit_reputation(&mut self, amount: f64) {
        self.resources.reputation_points += amount;
    }

    /// Spend working time
    pub(crate) fn deduct_time(&mut self, hours: f64) {
        self.resources.time_remaining -= hours;
    }

    /// Replenish working time
    pub(crate) fn credit_time(&mut self, hours: f64) {
        self.resources.time_remaining += hours;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_agent() -> Agent {
        Agent::new(
            "C3".to_string(),
            AgentProfile {
                role: "Analytical Strategist".to_string(),
                goal: "Data-driven decisions".to_string(),
                strengths: vec![],
                weaknesses: vec![],
                success_metric: "Prediction accuracy".to_string(),
            },
            ResourcePool::new(2000.0, 5.0, 40.0),
            ContributionPattern {
                base_time_hours: 10.0,
                base_money: 200.0,
                base_reputation: 1.0,
            },
            40.0,
        )
    }

    #[test]
    fn test_credit_and_deduct() {
        let mut agent = test_agent();
        agent.credit_money(600.0);
        agent.credit_reputation(2.4);
        agent.deduct_time(9.6);
        assert_eq!(agent.resources().money(), 2600.0);
        assert_eq!(agent.resources().reputation_points(), 7.4);
        assert!((agent.resources().time_remaining() - 30.4).abs() < 1e-12);
    }

    #[test]
    fn test_resources_may_go_negative() {
        // No floor: deficits are representable and carried forward.
        let mut agent = test_agent();
        agent.credit_money(-5000.0);
        agent.deduct_time(100.0);
        assert_eq!(agent.resources().money(), -3000.0);
        assert_eq!(agent.resources().time_remaining(), -60.0);
    }
}
