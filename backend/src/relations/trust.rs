//! Directed trust matrix
//!
//! Every ordered pair of distinct agents carries a trust value in
//! [0, 1]. Self-trust is pinned at 1.0 and never updated.
//!
//! # Deterministic initialization
//!
//! Initial values are a pure function of the two identifiers: the first
//! byte of `SHA-256("{from}_{to}")` is mapped into a ±0.1 personality
//! factor around the 0.5 baseline, then clamped to [0.3, 0.7]. SHA-256
//! is a fixed, widely standardized digest, so the seeded matrix is
//! reproducible across implementations and languages.
//!
//! # Updates
//!
//! Conflicts and alliances shift both directions of each unordered
//! participant pair by the same signed amount, then clamp to [0, 1].
//! A later alliance does not erase an earlier conflict; effects
//! accumulate over the run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::event::{AllianceStrength, ConflictSeverity};
use crate::orchestrator::SimulationError;

/// Base trust reduction per conflict, scaled by severity multiplier
pub const CONFLICT_BASE_IMPACT: f64 = 0.05;

/// Base trust increase per alliance, scaled by strength multiplier
pub const ALLIANCE_BASE_IMPACT: f64 = 0.03;

/// Initial-value bounds after seeding
const SEED_MIN: f64 = 0.3;
const SEED_MAX: f64 = 0.7;

/// Directed pairwise trust values
///
/// Stored as nested `BTreeMap`s so serialized state is canonical:
/// serializing the same matrix twice yields byte-identical JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustMatrix {
    edges: BTreeMap<String, BTreeMap<String, f64>>,
}

impl TrustMatrix {
    /// Seed the matrix for the given agent set
    ///
    /// Creates every ordered pair once. Self-edges are fixed at 1.0.
    pub fn seed(ids: &[String]) -> Self {
        let mut edges = BTreeMap::new();
        for from in ids {
            let mut row = BTreeMap::new();
            for to in ids {
                let value = if from == to {
                    1.0
                } else {
                    (0.5 + personality_factor(from, to)).clamp(SEED_MIN, SEED_MAX)
                };
                row.insert(to.clone(), value);
            }
            edges.insert(from.clone(), row);
        }
        Self { edges }
    }

    /// Trust of `from` toward `to`
    pub fn get(&self, from: &str, to: &str) -> Result<f64, SimulationError> {
        self.edges
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .ok_or_else(|| SimulationError::UnknownAgent(unknown_of(self, from, to)))
    }

    /// Mean of the two directed values between `a` and `b`
    pub fn pair_average(&self, a: &str, b: &str) -> Result<f64, SimulationError> {
        Ok((self.get(a, b)? + self.get(b, a)?) / 2.0)
    }

    /// Average outgoing trust of `id` toward all other agents
    pub fn average_toward_others(&self, id: &str) -> Result<f64, SimulationError> {
        let row = self
            .edges
            .get(id)
            .ok_or_else(|| SimulationError::UnknownAgent(id.to_string()))?;
        let others: Vec<f64> = row
            .iter()
            .filter(|(to, _)| to.as_str() != id)
            .map(|(_, v)| *v)
            .collect();
        if others.is_empty() {
            return Ok(0.0);
        }
        Ok(others.iter().sum::<f64>() / others.len() as f64)
    }

    /// Apply a conflict among `participants`
    ///
    /// Reduces trust symmetrically for every unordered pair in the set.
    pub fn apply_conflict(
        &mut self,
        participants: &[String],
        severity: ConflictSeverity,
    ) -> Result<(), SimulationError> {
        let delta = -CONFLICT_BASE_IMPACT * severity.multiplier();
        self.shift_all_pairs(participants, delta)
    }

    /// Apply an alliance among `participants`
    ///
    /// Increases trust symmetrically for every unordered pair in the set.
    pub fn apply_alliance(
        &mut self,
        participants: &[String],
        strength: AllianceStrength,
    ) -> Result<(), SimulationError> {
        let delta = ALLIANCE_BASE_IMPACT * strength.multiplier();
        self.shift_all_pairs(participants, delta)
    }

    fn shift_all_pairs(
        &mut self,
        participants: &[String],
        delta: f64,
    ) -> Result<(), SimulationError> {
        // Validate the whole set first so a bad identifier cannot leave
        // a half-applied update behind.
        for id in participants {
            if !self.edges.contains_key(id) {
                return Err(SimulationError::UnknownAgent(id.clone()));
            }
        }
        for (i, a) in participants.iter().enumerate() {
            for b in participants.iter().skip(i + 1) {
                if a == b {
                    continue;
                }
                self.shift_edge(a, b, delta);
                self.shift_edge(b, a, delta);
            }
        }
        Ok(())
    }

    fn shift_edge(&mut self, from: &str, to: &str, delta: f64) {
        if let Some(value) = self
            .edges
            .get_mut(from)
            .and_then(|row| row.get_mut(to))
        {
            *value = (*value + delta).clamp(0.0, 1.0);
        }
    }

    /// All agent identifiers in the matrix
    pub fn agent_ids(&self) -> Vec<&str> {
        self.edges.keys().map(|k| k.as_str()).collect()
    }

    /// Verify the matrix invariants
    ///
    /// Every value must lie in [0, 1] and every self-edge must be
    /// exactly 1.0. A violation means a value bypassed the normal
    /// update path and the run must halt.
    pub fn validate(&self) -> Result<(), SimulationError> {
        for (from, row) in &self.edges {
            for (to, value) in row {
                if !(0.0..=1.0).contains(value) {
                    return Err(SimulationError::InvariantViolation(format!(
                        "trust({from}->{to}) = {value} outside [0, 1]"
                    )));
                }
                if from == to && *value != 1.0 {
                    return Err(SimulationError::InvariantViolation(format!(
                        "self-trust of {from} is {value}, expected 1.0"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Deterministic ±0.1 personality factor for an ordered pair
///
/// `(first_byte(sha256("{from}_{to}")) / 255 − 0.5) × 0.2`
pub fn personality_factor(from: &str, to: &str) -> f64 {
    let digest = Sha256::digest(format!("{from}_{to}").as_bytes());
    (digest[0] as f64 / 255.0 - 0.5) * 0.2
}

fn unknown_of(matrix: &TrustMatrix, from: &str, to: &str) -> String {
    if matrix.edges.contains_key(from) {
        to.to_string()
    } else {
        from.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<String> {
        vec!["C1", "C2", "C3", "C4"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_seed_bounds() {
        let matrix = TrustMatrix::seed(&ids());
        for a in ids() {
            for b in ids() {
                let v = matrix.get(&a, &b).unwrap();
                if a == b {
                    assert_eq!(v, 1.0);
                } else {
                    assert!((0.3..=0.7).contains(&v), "trust({a}->{b}) = {v}");
                }
            }
        }
    }

    #[test]
    fn test_seed_is_pure_function_of_ids() {
        let m1 = TrustMatrix::seed(&ids());
        let m2 = TrustMatrix::seed(&ids());
        assert_eq!(m1, m2);
    }

    #[test]
    fn test_conflict_is_symmetric() {
        let mut matrix = TrustMatrix::seed(&ids());
        let before_ab = matrix.get("C1", "C3").unwrap();
        let before_ba = matrix.get("C3", "C1").unwrap();

        matrix
            .apply_conflict(
                &["C1".to_string(), "C3".to_string()],
                ConflictSeverity::High,
            )
            .unwrap();

        assert!((matrix.get("C1", "C3").unwrap() - (before_ab - 0.075)).abs() < 1e-12);
        assert!((matrix.get("C3", "C1").unwrap() - (before_ba - 0.075)).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_participant_is_fatal_and_atomic() {
        let mut matrix = TrustMatrix::seed(&ids());
        let before = matrix.clone();
        let err = matrix
            .apply_conflict(
                &["C1".to_string(), "C9".to_string()],
                ConflictSeverity::Low,
            )
            .unwrap_err();
        assert!(matches!(err, SimulationError::UnknownAgent(id) if id == "C9"));
        // No partial update happened
        assert_eq!(matrix, before);
    }

    #[test]
    fn test_multi_party_conflict_touches_every_pair() {
        let mut matrix = TrustMatrix::seed(&ids());
        let before = matrix.clone();
        let trio = vec!["C1".to_string(), "C2".to_string(), "C3".to_string()];
        matrix
            .apply_conflict(&trio, ConflictSeverity::Medium)
            .unwrap();
        for a in ["C1", "C2", "C3"] {
            for b in ["C1", "C2", "C3"] {
                if a == b {
                    continue;
                }
                let was = before.get(a, b).unwrap();
                let now = matrix.get(a, b).unwrap();
                assert!((now - (was - 0.05)).abs() < 1e-12);
            }
        }
        // C4 untouched
        assert_eq!(matrix.get("C4", "C1").unwrap(), before.get("C4", "C1").unwrap());
    }

    #[test]
    fn test_validate_catches_out_of_band_value() {
        let mut matrix = TrustMatrix::seed(&ids());
        matrix
            .edges
            .get_mut("C1")
            .unwrap()
            .insert("C2".to_string(), 1.4);
        assert!(matches!(
            matrix.validate(),
            Err(SimulationError::InvariantViolation(_))
        ));
    }
}
