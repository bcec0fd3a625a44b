//! Checkpoint — save/load experiment state
//!
//! One checkpoint file per completed period. Writes go to a temporary
//! sibling first and are renamed into place, so a crash mid-write never
//! leaves a corrupt or partial file as the latest checkpoint. Resume
//! picks the highest completed period, verifies the embedded config
//! hash against the running configuration, and validates the state
//! invariants before the engine accepts new events.
//!
//! # Critical Invariants
//!
//! - **Determinism**: re-running a period from the same checkpoint with
//!   the same events yields byte-identical state serialization
//! - **Config matching**: a checkpoint can only be loaded under the
//!   config that produced it
//! - **Durability**: a failed write never replaces the previous valid
//!   checkpoint

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::models::state::ExperimentState;
use crate::orchestrator::engine::{ExperimentConfig, SimulationError};

/// Bumped whenever the checkpoint layout changes incompatibly
pub const CHECKPOINT_VERSION: u32 = 1;

const FILE_PREFIX: &str = "state_period_";
const FILE_SUFFIX: &str = ".json";

/// On-disk checkpoint envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    /// Last completed period captured by this checkpoint
    pub period: u32,
    /// SHA-256 of the canonical config JSON
    pub config_hash: String,
    pub state: ExperimentState,
}

/// Compute deterministic SHA-256 hash of a config
///
/// Uses canonical JSON with recursively sorted object keys, so the hash
/// is independent of any map iteration order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config)
        .map_err(|e| SimulationError::Serialization(format!("config serialization failed: {e}")))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let canonical = canonicalize(value);
    let json = serde_json::to_string(&canonical)
        .map_err(|e| SimulationError::Serialization(format!("config serialization failed: {e}")))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Persists and restores experiment state, one file per period
#[derive(Debug)]
pub struct CheckpointManager {
    dir: PathBuf,
    config_hash: String,
}

impl CheckpointManager {
    /// Create a manager for `dir`, creating the directory if needed
    pub fn new(
        dir: impl Into<PathBuf>,
        config: &ExperimentConfig,
    ) -> Result<Self, SimulationError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| SimulationError::CheckpointIo(format!("create {}: {e}", dir.display())))?;
        let config_hash = compute_config_hash(config)?;
        Ok(Self { dir, config_hash })
    }

    /// Hash of the configuration this manager validates against
    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    fn path_for(&self, period: u32) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{period:03}{FILE_SUFFIX}"))
    }

    /// Persist the state's latest completed period atomically
    ///
    /// Validates invariants first; a state that fails validation is
    /// never written.
    pub fn save(&self, state: &ExperimentState) -> Result<PathBuf, SimulationError> {
        state.validate()?;
        let period = state.last_completed_period();
        let checkpoint = Checkpoint {
            version: CHECKPOINT_VERSION,
            period,
            config_hash: self.config_hash.clone(),
            state: state.clone(),
        };
        let bytes = serde_json::to_vec(&checkpoint)
            .map_err(|e| SimulationError::Serialization(format!("checkpoint encode: {e}")))?;

        let path = self.path_for(period);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)
            .map_err(|e| SimulationError::CheckpointIo(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path).map_err(|e| {
            // Leave no stray temporary behind on a failed rename.
            let _ = fs::remove_file(&tmp);
            SimulationError::CheckpointIo(format!("rename {}: {e}", path.display()))
        })?;

        info!(period, path = %path.display(), "checkpoint written");
        Ok(path)
    }

    /// Load the checkpoint for a specific period
    pub fn load(&self, period: u32) -> Result<ExperimentState, SimulationError> {
        let path = self.path_for(period);
        let bytes = fs::read(&path)
            .map_err(|e| SimulationError::CheckpointIo(format!("read {}: {e}", path.display())))?;
        let checkpoint: Checkpoint = serde_json::from_slice(&bytes)
            .map_err(|e| SimulationError::Serialization(format!("checkpoint decode: {e}")))?;

        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(SimulationError::CheckpointIo(format!(
                "unsupported checkpoint version {} in {}",
                checkpoint.version,
                path.display()
            )));
        }
        if checkpoint.config_hash != self.config_hash {
            return Err(SimulationError::ConfigMismatch {
                expected: self.config_hash.clone(),
                found: checkpoint.config_hash,
            });
        }
        if checkpoint.period != checkpoint.state.last_completed_period() {
            return Err(SimulationError::InvariantViolation(format!(
                "checkpoint period {} disagrees with state period {}",
                checkpoint.period,
                checkpoint.state.last_completed_period()
            )));
        }
        checkpoint.state.validate()?;
        Ok(checkpoint.state)
    }

    /// Highest period with a checkpoint on disk, if any
    pub fn latest_period(&self) -> Result<Option<u32>, SimulationError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            SimulationError::CheckpointIo(format!("read dir {}: {e}", self.dir.display()))
        })?;
        let mut latest: Option<u32> = None;
        for entry in entries {
            let entry = entry.map_err(|e| {
                SimulationError::CheckpointIo(format!("read dir {}: {e}", self.dir.display()))
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(period) = parse_period(name) {
                latest = Some(latest.map_or(period, |p| p.max(period)));
            } else if name.ends_with(".tmp") {
                warn!(file = name, "stray temporary checkpoint file");
            }
        }
        Ok(latest)
    }

    /// Load the highest completed checkpoint
    pub fn load_latest(&self) -> Result<ExperimentState, SimulationError> {
        match self.latest_period()? {
            Some(period) => self.load(period),
            None => Err(SimulationError::NoCheckpoint(
                self.dir.display().to_string(),
            )),
        }
    }
}

fn parse_period(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("state_period_003.json"), Some(3));
        assert_eq!(parse_period("state_period_042.json"), Some(42));
        assert_eq!(parse_period("state_period_003.json.tmp"), None);
        assert_eq!(parse_period("other.json"), None);
    }

    #[test]
    fn test_config_hash_deterministic() {
        #[derive(Serialize)]
        struct TestConfig {
            value: i32,
            name: String,
        }

        let a = TestConfig {
            value: 42,
            name: "test".to_string(),
        };
        let b = TestConfig {
            value: 42,
            name: "test".to_string(),
        };
        assert_eq!(
            compute_config_hash(&a).unwrap(),
            compute_config_hash(&b).unwrap()
        );
    }

    #[test]
    fn test_config_hash_differs_for_different_configs() {
        #[derive(Serialize)]
        struct TestConfig {
            value: i32,
        }

        let a = TestConfig { value: 42 };
        let b = TestConfig { value: 43 };
        assert_ne!(
            compute_config_hash(&a).unwrap(),
            compute_config_hash(&b).unwrap()
        );
    }
}
