//! Social connection tracker
//!
//! Connection strengths are derived, not stored: each period they are
//! recomputed as a pure function of the trust matrix and the
//! relationship ledger. The one exception is the interaction bump — a
//! +0.1 relationship-building credit applied once per direct
//! interaction between a pair — which accumulates here and is
//! serialized with the state so a resumed run reproduces the same
//! strengths.
//!
//! ```text
//! strength = trust_avg × 0.6
//!          + alliance_bonus × 0.25
//!          − conflict_penalty × 0.15
//!          + context_bonus × 0.1
//!          + pair_offset
//!          + interaction_bump          (then clamped to [0, 1])
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::orchestrator::SimulationError;
use crate::relations::ledger::RelationshipLedger;
use crate::relations::trust::TrustMatrix;

/// Strength credited per direct interaction between a pair
pub const INTERACTION_BUMP: f64 = 0.1;

/// Pair counts saturate the alliance/conflict terms at five events
const PAIR_COUNT_SCALE: f64 = 0.2;

/// Positive period signals saturate the context term at two
const CONTEXT_SIGNAL_SCALE: f64 = 0.5;

/// Canonical key for an unordered pair: lexicographically ordered ids
/// joined by `_`
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}_{b}")
    } else {
        format!("{b}_{a}")
    }
}

/// Deterministic ±0.05 offset for an unordered pair
///
/// Derived like the trust personality factor, from the first byte of
/// `SHA-256(pair_key)` — variety without randomness.
pub fn pair_offset(a: &str, b: &str) -> f64 {
    let digest = Sha256::digest(pair_key(a, b).as_bytes());
    (digest[0] as f64 / 255.0 - 0.5) * 0.1
}

/// Accumulated interaction bumps per unordered pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionTracker {
    bumps: BTreeMap<String, f64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit one direct interaction between `a` and `b`
    ///
    /// The accumulated bump is capped at 1.0; the strength clamp makes
    /// any further credit a no-op anyway.
    pub fn record_interaction(&mut self, a: &str, b: &str) {
        let entry = self.bumps.entry(pair_key(a, b)).or_insert(0.0);
        *entry = (*entry + INTERACTION_BUMP).min(1.0);
    }

    /// Accumulated bump for a pair
    pub fn bump(&self, a: &str, b: &str) -> f64 {
        self.bumps.get(&pair_key(a, b)).copied().unwrap_or(0.0)
    }

    /// Current connection strength of an unordered pair
    ///
    /// `positive_signals` is the count of this period's admitted
    /// positive signals relevant to the pair (interactions between them
    /// plus positive social signals naming either member).
    pub fn strength(
        &self,
        a: &str,
        b: &str,
        trust: &TrustMatrix,
        ledger: &RelationshipLedger,
        positive_signals: u32,
    ) -> Result<f64, SimulationError> {
        let trust_avg = trust.pair_average(a, b)?;
        let alliance_bonus =
            (ledger.pair_alliance_count(a, b) as f64 * PAIR_COUNT_SCALE).min(1.0);
        let conflict_penalty =
            (ledger.pair_conflict_count(a, b) as f64 * PAIR_COUNT_SCALE).min(1.0);
        let context_bonus = (positive_signals as f64 * CONTEXT_SIGNAL_SCALE).min(1.0);

        let raw = trust_avg * 0.6 + alliance_bonus * 0.25 - conflict_penalty * 0.15
            + context_bonus * 0.1
            + pair_offset(a, b)
            + self.bump(a, b);
        Ok(raw.clamp(0.0, 1.0))
    }

    /// Recompute strengths for every unordered pair of `ids`
    ///
    /// `positive_signals` maps pair keys to this period's relevant
    /// positive signal counts; missing pairs count zero.
    pub fn strengths(
        &self,
        ids: &[String],
        trust: &TrustMatrix,
        ledger: &RelationshipLedger,
        positive_signals: &BTreeMap<String, u32>,
    ) -> Result<BTreeMap<String, f64>, SimulationError> {
        let mut out = BTreeMap::new();
        for (i, a) in ids.iter().enumerate() {
            for b in ids.iter().skip(i + 1) {
                let key = pair_key(a, b);
                let signals = positive_signals.get(&key).copied().unwrap_or(0);
                out.insert(key, self.strength(a, b, trust, ledger, signals)?);
            }
        }
        Ok(out)
    }
}
