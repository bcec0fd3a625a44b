//! Deterministic random number generation
//!
//! Uses the xorshift64* algorithm. The engine's state updates are fully
//! deterministic and consume no randomness at all; the only consumer in
//! this crate is the extraction gateway, which jitters retry delays.

mod xorshift;

pub use xorshift::JitterRng;
