//! Per-period metrics: snapshot computation, storage, and rankings.

pub mod aggregator;

pub use aggregator::{MetricKind, MonthlySnapshot, SnapshotStore};
