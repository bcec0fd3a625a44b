//! Metrics Aggregator Tests
//!
//! The five published metrics, computed through full engine periods so
//! every input path (resources, ledger, tracker, signals, mentions) is
//! exercised together.

use std::collections::BTreeMap;

use relationship_sim_core::{
    AgentConfig, AgentProfile, AllianceStrength, BehaviorImpact, BehaviorKind,
    ContributionPattern, Engine, EventKind, ExperimentConfig, ExtractedEvent,
    FinancialSignalClass, MetricKind, PeriodInputs, Variant,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn agent_config(id: &str) -> AgentConfig {
    AgentConfig {
        id: id.to_string(),
        profile: AgentProfile {
            role: String::new(),
            goal: String::new(),
            strengths: vec![],
            weaknesses: vec![],
            success_metric: String::new(),
        },
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
        shared_budget: 0.0,
        agents: vec![agent_config("C1"), agent_config("C2")],
    }
}

fn event(kind: EventKind) -> ExtractedEvent {
    ExtractedEvent {
        kind,
        confidence: 0.9,
        period: 1,
        description: String::new(),
    }
}

fn snapshot_for<'a>(
    engine: &'a Engine,
    agent: &str,
    period: u32,
) -> &'a relationship_sim_core::MonthlySnapshot {
    engine
        .state()
        .metrics()
        .rows()
        .iter()
        .find(|s| s.agent == agent && s.period == period)
        .expect("snapshot missing")
}

// ============================================================================
// Metric Formulas
// ============================================================================

#[test]
fn test_financial_returns_combines_money_share_and_signal_bonuses() {
    let mut engine = Engine::new(&config()).unwrap();
    let inputs = PeriodInputs {
        period: 1,
        events: vec![
            event(EventKind::FinancialSignal {
                agent: "C1".to_string(),
                class: FinancialSignalClass::Revenue,
            }),
            event(EventKind::FinancialSignal {
                agent: "C1".to_string(),
                class: FinancialSignalClass::Grant,
            }),
        ],
        mentions: [("C1".to_string(), 5u32)].into_iter().collect(),
    };
    engine.run_period(&inputs).unwrap();

    // money = 1000 + 500 × 1.2 = 1600; bonuses: +100 (revenue) +75 (grant)
    let snapshot = snapshot_for(&engine, "C1", 1);
    assert!((snapshot.financial_returns - (160.0 + 175.0)).abs() < 1e-9);

    // C2 saw no signals: money share only
    let other = snapshot_for(&engine, "C2", 1);
    assert!((other.financial_returns - (1000.0 + 350.0) * 0.1).abs() < 1e-9);
}

#[test]
fn test_social_capital_formula() {
    let mut engine = Engine::new(&config()).unwrap();
    let inputs = PeriodInputs {
        period: 1,
        events: vec![
            event(EventKind::Alliance {
                participants: vec!["C1".to_string(), "C2".to_string()],
                strength: AllianceStrength::Medium,
            }),
            event(EventKind::Behavior {
                agent: "C1".to_string(),
                behavior: BehaviorKind::Leadership,
                impact: BehaviorImpact::Positive,
            }),
        ],
        mentions: BTreeMap::new(),
    };
    engine.run_period(&inputs).unwrap();

    let trust = engine.state().trust().get("C1", "C2").unwrap();
    let snapshot = snapshot_for(&engine, "C1", 1);
    let expected = 1.0 * 10.0 + trust * 20.0 + 5.0;
    assert!((snapshot.social_capital - expected).abs() < 1e-9);
}

#[test]
fn test_influence_index_from_bonus_and_mentions() {
    let mut engine = Engine::new(&config()).unwrap();
    let inputs = PeriodInputs {
        period: 1,
        events: vec![event(EventKind::Behavior {
            agent: "C1".to_string(),
            behavior: BehaviorKind::Leadership,
            impact: BehaviorImpact::Positive,
        })],
        mentions: [("C1".to_string(), 5u32)].into_iter().collect(),
    };
    engine.run_period(&inputs).unwrap();

    // 0.3 + 0.05 × 5 = 0.55
    let snapshot = snapshot_for(&engine, "C1", 1);
    assert!((snapshot.influence_index - 0.55).abs() < 1e-12);
}

#[test]
fn test_influence_index_caps_at_one() {
    let mut engine = Engine::new(&config()).unwrap();
    let events = (0..4)
        .map(|_| {
            event(EventKind::Behavior {
                agent: "C1".to_string(),
                behavior: BehaviorKind::Leadership,
                impact: BehaviorImpact::Positive,
            })
        })
        .collect();
    let inputs = PeriodInputs {
        period: 1,
        events,
        mentions: [("C1".to_string(), 20u32)].into_iter().collect(),
    };
    engine.run_period(&inputs).unwrap();

    // 0.3 × 4 + 0.05 × 20 = 2.2 → capped
    let snapshot = snapshot_for(&engine, "C1", 1);
    assert_eq!(snapshot.influence_index, 1.0);
}

#[test]
fn test_influence_index_always_within_unit_interval() {
    let mut engine = Engine::new(&config()).unwrap();
    for period in 1..=6 {
        let events = (0..period as usize)
            .map(|_| {
                let mut e = event(EventKind::Behavior {
                    agent: "C1".to_string(),
                    behavior: BehaviorKind::Assertiveness,
                    impact: BehaviorImpact::Neutral,
                });
                e.period = period;
                e
            })
            .collect();
        let inputs = PeriodInputs {
            period,
            events,
            mentions: [("C1".to_string(), period * 4)].into_iter().collect(),
        };
        engine.run_period(&inputs).unwrap();
    }
    for snapshot in engine.state().metrics().rows() {
        assert!(
            (0.0..=1.0).contains(&snapshot.influence_index),
            "influence {} outside [0, 1]",
            snapshot.influence_index
        );
    }
}

#[test]
fn test_future_opportunities_weights() {
    let mut engine = Engine::new(&config()).unwrap();
    let inputs = PeriodInputs {
        period: 1,
        events: vec![
            event(EventKind::OpportunitySignal {
                agent: "C1".to_string(),
            }),
            event(EventKind::Alliance {
                participants: vec!["C1".to_string(), "C2".to_string()],
                strength: AllianceStrength::Weak,
            }),
            event(EventKind::SocialSignal {
                agent: "C1".to_string(),
                positive: true,
            }),
        ],
        mentions: BTreeMap::new(),
    };
    engine.run_period(&inputs).unwrap();

    // 2 × 1 opportunity + (1 alliance + 1 positive signal) = 4
    let snapshot = snapshot_for(&engine, "C1", 1);
    assert_eq!(snapshot.future_opportunities, 4.0);
}

#[test]
fn test_reputation_score_is_passthrough() {
    let mut engine = Engine::new(&config()).unwrap();
    let inputs = PeriodInputs {
        period: 1,
        events: vec![],
        mentions: [("C1".to_string(), 3u32)].into_iter().collect(),
    };
    engine.run_period(&inputs).unwrap();

    let snapshot = snapshot_for(&engine, "C1", 1);
    let agent = engine.state().agent("C1").unwrap();
    assert_eq!(snapshot.reputation_score, agent.resources().reputation_points());
    assert!((snapshot.reputation_score - 12.0).abs() < 1e-9);
}

#[test]
fn test_snapshots_are_immutable_once_written() {
    let mut engine = Engine::new(&config()).unwrap();
    engine
        .run_period(&PeriodInputs {
            period: 1,
            events: vec![],
            mentions: BTreeMap::new(),
        })
        .unwrap();
    let first = snapshot_for(&engine, "C1", 1).clone();

    engine
        .run_period(&PeriodInputs {
            period: 2,
            events: vec![],
            mentions: BTreeMap::new(),
        })
        .unwrap();

    // Period 1's row is unchanged by later periods.
    assert_eq!(snapshot_for(&engine, "C1", 1), &first);
}

#[test]
fn test_leaderboard_ranks_for_period() {
    let mut engine = Engine::new(&config()).unwrap();
    let inputs = PeriodInputs {
        period: 1,
        events: vec![],
        mentions: [("C1".to_string(), 10u32)].into_iter().collect(),
    };
    engine.run_period(&inputs).unwrap();

    let board = engine
        .state()
        .metrics()
        .leaderboard(MetricKind::ReputationScore, 1);
    assert_eq!(board.len(), 2);
    // C1 earned more reputation through higher involvement
    assert_eq!(board[0].0, "C1");
}
