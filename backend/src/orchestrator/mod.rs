//! Orchestrator — period application and checkpointing
//!
//! The engine applies one period's admitted events to the experiment
//! state in a fixed order; the checkpoint manager persists the result
//! atomically so a run can resume exactly where it stopped.

pub mod checkpoint;
pub mod engine;

pub use checkpoint::{compute_config_hash, Checkpoint, CheckpointManager, CHECKPOINT_VERSION};
pub use engine::{
    AgentConfig, Engine, ExperimentConfig, Orchestrator, PeriodInputs, PeriodResult,
    SimulationError, Variant,
};
