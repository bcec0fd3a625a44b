//! Classified event model
//!
//! Events are the engine's only input: structured, confidence-scored
//! classifications of what happened in a period's transcript. They are
//! produced either by the remote extraction service or by the local
//! keyword fallback; the engine treats both identically.
//!
//! # Admission
//!
//! Every event carries a confidence in [0, 1]. Events at or below the
//! inclusion threshold are discarded before they touch any state; this
//! is normal operation, not an error.

use serde::{Deserialize, Serialize};

use crate::behavior::BehaviorKind;

/// Inclusion threshold: only events with strictly greater confidence
/// are admitted into persistent history.
pub const CONFIDENCE_GATE: f64 = 0.5;

/// Conflict severity categories
///
/// Three-tier scheme; the multiplier scales the base trust impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

impl ConflictSeverity {
    pub fn multiplier(self) -> f64 {
        match self {
            ConflictSeverity::Low => 0.5,
            ConflictSeverity::Medium => 1.0,
            ConflictSeverity::High => 1.5,
        }
    }
}

/// Alliance strength categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllianceStrength {
    Weak,
    Medium,
    Strong,
}

impl AllianceStrength {
    pub fn multiplier(self) -> f64 {
        match self {
            AllianceStrength::Weak => 0.5,
            AllianceStrength::Medium => 1.0,
            AllianceStrength::Strong => 1.5,
        }
    }
}

/// Keyword families recognized as financial signals, each mapped to a
/// fixed scenario bonus on the financial-returns metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialSignalClass {
    /// revenue / profit
    Revenue,
    /// budget / cost / invest
    Budget,
    /// grant / funding
    Grant,
}

impl FinancialSignalClass {
    pub fn bonus(self) -> f64 {
        match self {
            FinancialSignalClass::Revenue => 100.0,
            FinancialSignalClass::Budget => 50.0,
            FinancialSignalClass::Grant => 75.0,
        }
    }
}

/// Observed impact polarity of a behavioral pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorImpact {
    Positive,
    Negative,
    Neutral,
}

/// Payload of a classified event
///
/// Serialized with an explicit `type` tag so period input files stay
/// readable and stable across versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A conflict among two or more agents; reduces pairwise trust
    Conflict {
        participants: Vec<String>,
        severity: ConflictSeverity,
    },

    /// An alliance among two or more agents; increases pairwise trust
    Alliance {
        participants: Vec<String>,
        strength: AllianceStrength,
    },

    /// A behavioral observation about a single agent
    Behavior {
        agent: String,
        behavior: BehaviorKind,
        impact: BehaviorImpact,
    },

    /// A direct interaction between agents; strengthens their social
    /// connection independently of the derived formula
    Interaction { participants: Vec<String> },

    /// A financial keyword signal attributed to an agent
    FinancialSignal {
        agent: String,
        class: FinancialSignalClass,
    },

    /// A future-opportunity signal attributed to an agent
    OpportunitySignal { agent: String },

    /// A social signal (positive or negative) attributed to an agent
    SocialSignal { agent: String, positive: bool },

    /// An explicit scenario-outcome resource delta, applied after the
    /// period's base contribution. `agent: None` targets the shared pool.
    ResourceAdjustment {
        agent: Option<String>,
        money: f64,
        reputation: f64,
        time_hours: f64,
    },
}

impl EventKind {
    /// Short name of the event kind, for logs and summaries
    pub fn kind_name(&self) -> &'static str {
        match self {
            EventKind::Conflict { .. } => "Conflict",
            EventKind::Alliance { .. } => "Alliance",
            EventKind::Behavior { .. } => "Behavior",
            EventKind::Interaction { .. } => "Interaction",
            EventKind::FinancialSignal { .. } => "FinancialSignal",
            EventKind::OpportunitySignal { .. } => "OpportunitySignal",
            EventKind::SocialSignal { .. } => "SocialSignal",
            EventKind::ResourceAdjustment { .. } => "ResourceAdjustment",
        }
    }

    /// Whether the event names the given agent in any role
    pub fn involves(&self, id: &str) -> bool {
        match self {
            EventKind::Conflict { participants, .. }
            | EventKind::Alliance { participants, .. }
            | EventKind::Interaction { participants } => {
                participants.iter().any(|p| p == id)
            }
            EventKind::Behavior { agent, .. }
            | EventKind::FinancialSignal { agent, .. }
            | EventKind::OpportunitySignal { agent }
            | EventKind::SocialSignal { agent, .. } => agent == id,
            EventKind::ResourceAdjustment { agent, .. } => {
                agent.as_deref() == Some(id)
            }
        }
    }
}

/// One classified unit of evidence extracted from a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEvent {
    pub kind: EventKind,
    /// Extractor-reported certainty in [0, 1]
    pub confidence: f64,
    /// Period the evidence belongs to
    pub period: u32,
    /// Free-text reason or excerpt supporting the classification
    pub description: String,
}

impl ExtractedEvent {
    /// Whether the event clears the confidence gate
    pub fn is_admissible(&self) -> bool {
        self.confidence > CONFIDENCE_GATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_multipliers() {
        assert_eq!(ConflictSeverity::Low.multiplier(), 0.5);
        assert_eq!(ConflictSeverity::Medium.multiplier(), 1.0);
        assert_eq!(ConflictSeverity::High.multiplier(), 1.5);
    }

    #[test]
    fn test_strength_multipliers() {
        assert_eq!(AllianceStrength::Weak.multiplier(), 0.5);
        assert_eq!(AllianceStrength::Medium.multiplier(), 1.0);
        assert_eq!(AllianceStrength::Strong.multiplier(), 1.5);
    }

    #[test]
    fn test_financial_bonuses() {
        assert_eq!(FinancialSignalClass::Revenue.bonus(), 100.0);
        assert_eq!(FinancialSignalClass::Budget.bonus(), 50.0);
        assert_eq!(FinancialSignalClass::Grant.bonus(), 75.0);
    }

    #[test]
    fn test_confidence_gate_is_strict() {
        let event = ExtractedEvent {
            kind: EventKind::OpportunitySignal {
                agent: "C1".to_string(),
            },
            confidence: 0.5,
            period: 1,
            description: String::new(),
        };
        // Exactly at the threshold is discarded
        assert!(!event.is_admissible());
    }

    #[test]
    fn test_involves() {
        let kind = EventKind::Conflict {
            participants: vec!["C1".to_string(), "C3".to_string()],
            severity: ConflictSeverity::High,
        };
        assert!(kind.involves("C1"));
        assert!(kind.involves("C3"));
        assert!(!kind.involves("C2"));
    }

    #[test]
    fn test_event_round_trips_through_json() {
        let event = ExtractedEvent {
            kind: EventKind::Alliance {
                participants: vec!["C2".to_string(), "C4".to_string()],
                strength: AllianceStrength::Strong,
            },
            confidence: 0.8,
            period: 2,
            description: "joint proposal".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"alliance\""));
        let back: ExtractedEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
