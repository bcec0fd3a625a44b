//! Resource accounting: per-agent money, reputation and time budgets,
//! the shared pool, and the append-only allocation history.

pub mod ledger;

pub use ledger::{
    involvement_multiplier, AllocationRecord, ResourceKind, ResourceLog, SharedPool,
    WEEKS_PER_PERIOD,
};
