//! Pairwise relationship state: directed trust, the append-only
//! conflict/alliance ledger, and derived social connection strengths.

pub mod connections;
pub mod ledger;
pub mod trust;

pub use connections::{pair_key, ConnectionTracker};
pub use ledger::{AllianceRecord, ConflictRecord, RelationshipLedger};
pub use trust::TrustMatrix;
