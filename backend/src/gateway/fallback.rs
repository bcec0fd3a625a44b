//! Local keyword classifier
//!
//! Degraded-mode extractor used when the remote service stays
//! unavailable after the full backoff schedule. It scans the transcript
//! line by line for fixed keyword families and emits the same event
//! structures as the remote contract, tagged with the fixed fallback
//! confidence. Crude but deterministic and always available.

use crate::behavior::BehaviorKind;
use crate::models::event::{
    AllianceStrength, BehaviorImpact, ConflictSeverity, EventKind, ExtractedEvent,
    FinancialSignalClass,
};
use std::collections::BTreeMap;

use super::{EventExtractor, ExtractionFailure, ExtractionRequest, FALLBACK_CONFIDENCE};

const CONFLICT_WORDS: [&str; 5] = ["argue", "disagree", "conflict", "refuse", "object"];
const ALLIANCE_WORDS: [&str; 5] = ["agree", "alliance", "support", "partner", "together"];
const INTERACTION_WORDS: [&str; 3] = ["meet", "discuss", "talk"];
const OPPORTUNITY_WORDS: [&str; 3] = ["opportunity", "potential", "expansion"];
const POSITIVE_WORDS: [&str; 3] = ["thank", "appreciate", "trust"];
const NEGATIVE_WORDS: [&str; 2] = ["blame", "distrust"];

const BEHAVIOR_WORDS: [(&str, BehaviorKind); 6] = [
    ("propose", BehaviorKind::ProposalMaking),
    ("lead", BehaviorKind::Leadership),
    ("collaborat", BehaviorKind::Collaboration),
    ("compromise", BehaviorKind::Compromise),
    ("insist", BehaviorKind::Assertiveness),
    ("consensus", BehaviorKind::ConsensusBuilding),
];

const FINANCIAL_WORDS: [(&str, FinancialSignalClass); 7] = [
    ("revenue", FinancialSignalClass::Revenue),
    ("profit", FinancialSignalClass::Revenue),
    ("budget", FinancialSignalClass::Budget),
    ("cost", FinancialSignalClass::Budget),
    ("invest", FinancialSignalClass::Budget),
    ("grant", FinancialSignalClass::Grant),
    ("funding", FinancialSignalClass::Grant),
];

/// Keyword/pattern based transcript classifier
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a transcript into events, all at the fallback confidence
    pub fn classify(&self, request: &ExtractionRequest) -> Vec<ExtractedEvent> {
        let mut events = Vec::new();

        for line in request.transcript.lines() {
            let lower = line.to_lowercase();
            let present: Vec<String> = request
                .participants
                .iter()
                .filter(|id| line.contains(id.as_str()))
                .cloned()
                .collect();
            let speaker = request
                .participants
                .iter()
                .find(|id| line.starts_with(&format!("{id}:")))
                .cloned();

            let push = |events: &mut Vec<ExtractedEvent>, kind: EventKind| {
                events.push(ExtractedEvent {
                    kind,
                    confidence: FALLBACK_CONFIDENCE,
                    period: request.period,
                    description: excerpt(line),
                });
            };

            if present.len() >= 2 && contains_any(&lower, &CONFLICT_WORDS) {
                push(
                    &mut events,
                    EventKind::Conflict {
                        participants: present.clone(),
                        severity: ConflictSeverity::Medium,
                    },
                );
            }
            if present.len() >= 2 && contains_any(&lower, &ALLIANCE_WORDS) {
                push(
                    &mut events,
                    EventKind::Alliance {
                        participants: present.clone(),
                        strength: AllianceStrength::Medium,
                    },
                );
            }
            if present.len() >= 2 && contains_any(&lower, &INTERACTION_WORDS) {
                push(
                    &mut events,
                    EventKind::Interaction {
                        participants: present.clone(),
                    },
                );
            }

            let Some(speaker) = speaker else { continue };

            for (word, behavior) in BEHAVIOR_WORDS {
                if lower.contains(word) {
                    push(
                        &mut events,
                        EventKind::Behavior {
                            agent: speaker.clone(),
                            behavior,
                            impact: BehaviorImpact::Neutral,
                        },
                    );
                }
            }
            let mut seen_classes: Vec<FinancialSignalClass> = Vec::new();
            for (word, class) in FINANCIAL_WORDS {
                if lower.contains(word) && !seen_classes.contains(&class) {
                    seen_classes.push(class);
                    push(
                        &mut events,
                        EventKind::FinancialSignal {
                            agent: speaker.clone(),
                            class,
                        },
                    );
                }
            }
            if contains_any(&lower, &OPPORTUNITY_WORDS) {
                push(
                    &mut events,
                    EventKind::OpportunitySignal {
                        agent: speaker.clone(),
                    },
                );
            }
            if contains_any(&lower, &POSITIVE_WORDS) {
                push(
                    &mut events,
                    EventKind::SocialSignal {
                        agent: speaker.clone(),
                        positive: true,
                    },
                );
            } else if contains_any(&lower, &NEGATIVE_WORDS) {
                push(
                    &mut events,
                    EventKind::SocialSignal {
                        agent: speaker.clone(),
                        positive: false,
                    },
                );
            }
        }

        events
    }

    /// Count speaker-prefix occurrences (`"{id}:"`) per participant
    pub fn mention_counts(
        transcript: &str,
        participants: &[String],
    ) -> BTreeMap<String, u32> {
        participants
            .iter()
            .map(|id| {
                let needle = format!("{id}:");
                let count = transcript.matches(&needle).count() as u32;
                (id.clone(), count)
            })
            .collect()
    }
}

impl EventExtractor for KeywordClassifier {
    fn extract(
        &mut self,
        request: &ExtractionRequest,
    ) -> Result<Vec<ExtractedEvent>, ExtractionFailure> {
        Ok(self.classify(request))
    }
}

fn contains_any(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|w| haystack.contains(w))
}

fn excerpt(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.len() > 120 {
        // Truncate on a char boundary
        let mut end = 120;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        trimmed[..end].to_string()
    } else {
        trimmed.to_string()
    }
}
