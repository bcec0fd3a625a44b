//! Behavioral pattern tracking
//!
//! Classifies agent actions into a fixed set of behavior kinds, each
//! mapped to a social-capital bonus and an influence-index bonus that
//! feed the metrics aggregator.

pub mod tracker;

pub use tracker::{BehaviorBonus, BehaviorKind, PatternRecord, PatternTracker};
