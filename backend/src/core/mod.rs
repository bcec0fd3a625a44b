//! Period management for the simulation
//!
//! The simulation advances in discrete periods ("months"). A period is
//! completed atomically: all of its admitted events are applied and a
//! checkpoint is written before the next period may begin.

pub mod period;

pub use period::PeriodClock;
