//! Behavioral Pattern Tracker Tests
//!
//! Admission gating and per-period bonus aggregation through full
//! engine periods.

use std::collections::BTreeMap;

use relationship_sim_core::{
    AgentConfig, AgentProfile, BehaviorImpact, BehaviorKind, ContributionPattern, Engine,
    EventKind, ExperimentConfig, ExtractedEvent, PeriodInputs, SimulationError, Variant,
};

fn config() -> ExperimentConfig {
    ExperimentConfig {
        total_periods: 6,
        variant: Variant::Base,
        shared_budget: 0.0,
        agents: vec![AgentConfig {
            id: "C1".to_string(),
            profile: AgentProfile {
                role: String::new(),
                goal: String::new(),
                strengths: vec![],
                weaknesses: vec![],
                success_metric: String::new(),
            },
            starting_money: 0.0,
            starting_reputation: 0.0,
            starting_time_hours: 40.0,
            weekly_time_hours: 40.0,
            pattern: ContributionPattern {
                base_time_hours: 8.0,
                base_money: 500.0,
                base_reputation: 2.0,
            },
            altered_pattern: None,
        }],
    }
}

fn behavior_event(behavior: BehaviorKind, confidence: f64, period: u32) -> ExtractedEvent {
    ExtractedEvent {
        kind: EventKind::Behavior {
            agent: "C1".to_string(),
            behavior,
            impact: BehaviorImpact::Positive,
        },
        confidence,
        period,
        description: String::new(),
    }
}

fn run_period(engine: &mut Engine, period: u32, events: Vec<ExtractedEvent>) {
    engine
        .run_period(&PeriodInputs {
            period,
            events,
            mentions: BTreeMap::new(),
        })
        .unwrap();
}

#[test]
fn test_gate_discards_but_does_not_error() {
    let mut engine = Engine::new(&config()).unwrap();
    run_period(
        &mut engine,
        1,
        vec![
            behavior_event(BehaviorKind::Leadership, 0.9, 1),
            behavior_event(BehaviorKind::Collaboration, 0.5, 1),
            behavior_event(BehaviorKind::Cooperation, 0.1, 1),
        ],
    );

    let history = engine.state().behaviors().history_for("C1");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].behavior, BehaviorKind::Leadership);
}

#[test]
fn test_period_bonuses_feed_aggregate() {
    let mut engine = Engine::new(&config()).unwrap();
    run_period(
        &mut engine,
        1,
        vec![
            behavior_event(BehaviorKind::Leadership, 0.9, 1),
            behavior_event(BehaviorKind::ProposalMaking, 0.9, 1),
            behavior_event(BehaviorKind::Competition, 0.9, 1),
        ],
    );

    let bonus = engine.state().behaviors().period_bonus("C1", 1);
    assert_eq!(bonus.social_capital, 7.0); // 5 + 0 + 2
    assert!((bonus.influence - 0.55).abs() < 1e-12); // 0.3 + 0.25
}

#[test]
fn test_history_is_append_only_across_periods() {
    let mut engine = Engine::new(&config()).unwrap();
    run_period(
        &mut engine,
        1,
        vec![behavior_event(BehaviorKind::Leadership, 0.9, 1)],
    );
    let first: Vec<_> = engine.state().behaviors().history_for("C1").to_vec();

    run_period(
        &mut engine,
        2,
        vec![behavior_event(BehaviorKind::Compromise, 0.9, 2)],
    );

    let history = engine.state().behaviors().history_for("C1");
    assert_eq!(history.len(), 2);
    // Earlier records unchanged, order preserved
    assert_eq!(&history[..1], first.as_slice());
}

#[test]
fn test_zero_bonus_kinds_still_recorded() {
    let mut engine = Engine::new(&config()).unwrap();
    run_period(
        &mut engine,
        1,
        vec![
            behavior_event(BehaviorKind::RiskTaking, 0.9, 1),
            behavior_event(BehaviorKind::Conservative, 0.9, 1),
        ],
    );

    assert_eq!(engine.state().behaviors().history_for("C1").len(), 2);
    let bonus = engine.state().behaviors().period_bonus("C1", 1);
    assert_eq!(bonus.social_capital, 0.0);
    assert_eq!(bonus.influence, 0.0);
}

#[test]
fn test_unknown_agent_in_behavior_event_is_fatal() {
    let mut engine = Engine::new(&config()).unwrap();
    let result = engine.run_period(&PeriodInputs {
        period: 1,
        events: vec![ExtractedEvent {
            kind: EventKind::Behavior {
                agent: "C9".to_string(),
                behavior: BehaviorKind::Leadership,
                impact: BehaviorImpact::Neutral,
            },
            confidence: 0.9,
            period: 1,
            description: String::new(),
        }],
        mentions: BTreeMap::new(),
    });
    assert!(matches!(result, Err(SimulationError::UnknownAgent(_))));
}
