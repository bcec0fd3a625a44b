//! Relationship ledger
//!
//! Append-only history of admitted conflicts and alliances. Admission
//! is gated on extractor confidence; an admitted record is immutable
//! and immediately drives the corresponding trust update. Nothing is
//! ever retracted: a later alliance between the same agents does not
//! erase an earlier conflict, and their trust effects accumulate.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::event::{AllianceStrength, ConflictSeverity, CONFIDENCE_GATE};
use crate::orchestrator::SimulationError;
use crate::relations::trust::TrustMatrix;

/// An admitted conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub participants: Vec<String>,
    pub severity: ConflictSeverity,
    pub confidence: f64,
    pub period: u32,
    pub reason: String,
}

/// An admitted alliance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllianceRecord {
    pub participants: Vec<String>,
    pub strength: AllianceStrength,
    pub confidence: f64,
    pub period: u32,
    pub reason: String,
}

/// Append-only conflict/alliance history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipLedger {
    conflicts: Vec<ConflictRecord>,
    alliances: Vec<AllianceRecord>,
}

impl RelationshipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a conflict if it clears the confidence gate
    ///
    /// On admission the record is appended and the trust matrix update
    /// applied. Returns whether the record was admitted.
    pub fn admit_conflict(
        &mut self,
        trust: &mut TrustMatrix,
        record: ConflictRecord,
    ) -> Result<bool, SimulationError> {
        if record.confidence <= CONFIDENCE_GATE {
            debug!(
                confidence = record.confidence,
                period = record.period,
                "discarding low-confidence conflict"
            );
            return Ok(false);
        }
        trust.apply_conflict(&record.participants, record.severity)?;
        self.conflicts.push(record);
        Ok(true)
    }

    /// Admit an alliance if it clears the confidence gate
    pub fn admit_alliance(
        &mut self,
        trust: &mut TrustMatrix,
        record: AllianceRecord,
    ) -> Result<bool, SimulationError> {
        if record.confidence <= CONFIDENCE_GATE {
            debug!(
                confidence = record.confidence,
                period = record.period,
                "discarding low-confidence alliance"
            );
            return Ok(false);
        }
        trust.apply_alliance(&record.participants, record.strength)?;
        self.alliances.push(record);
        Ok(true)
    }

    /// Conflicts involving `agent`, optionally restricted to one period
    pub fn conflicts_involving(&self, agent: &str, period: Option<u32>) -> Vec<&ConflictRecord> {
        self.conflicts
            .iter()
            .filter(|c| c.participants.iter().any(|p| p == agent))
            .filter(|c| period.map_or(true, |p| c.period == p))
            .collect()
    }

    /// Alliances involving `agent`, optionally restricted to one period
    pub fn alliances_involving(&self, agent: &str, period: Option<u32>) -> Vec<&AllianceRecord> {
        self.alliances
            .iter()
            .filter(|a| a.participants.iter().any(|p| p == agent))
            .filter(|a| period.map_or(true, |p| a.period == p))
            .collect()
    }

    /// All-time count of conflicts naming both `a` and `b`
    pub fn pair_conflict_count(&self, a: &str, b: &str) -> usize {
        self.conflicts
            .iter()
            .filter(|c| {
                c.participants.iter().any(|p| p == a) && c.participants.iter().any(|p| p == b)
            })
            .count()
    }

    /// All-time count of alliances naming both `a` and `b`
    pub fn pair_alliance_count(&self, a: &str, b: &str) -> usize {
        self.alliances
            .iter()
            .filter(|r| {
                r.participants.iter().any(|p| p == a) && r.participants.iter().any(|p| p == b)
            })
            .count()
    }

    pub fn conflicts(&self) -> &[ConflictRecord] {
        &self.conflicts
    }

    pub fn alliances(&self) -> &[AllianceRecord] {
        &self.alliances
    }
}
