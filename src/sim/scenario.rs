use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::time::SimTime;

/// Run configuration loaded from scenario.json (all fields optional).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Number of independent iterations to run.
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Base seed; iteration i runs with seed + i.
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: i64,
    /// Pre-pull lead-in before the fight starts (time runs from -prepull_ms).
    #[serde(default)]
    pub prepull_ms: i64,
    /// Interactive mode: threshold crossings do not drive the rotation.
    #[serde(default)]
    pub interactive: bool,
}

fn default_schema_version() -> u32 {
    1
}
fn default_iterations() -> u64 {
    1000
}
fn default_duration_ms() -> i64 {
    60_000
}

impl Default for ScenarioSpec {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            iterations: default_iterations(),
            seed: 0,
            duration_ms: default_duration_ms(),
            prepull_ms: 0,
            interactive: false,
        }
    }
}

impl ScenarioSpec {
    pub fn from_path(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn duration(&self) -> SimTime {
        SimTime::from_millis(self.duration_ms)
    }

    pub fn prepull(&self) -> SimTime {
        SimTime::from_millis(self.prepull_ms)
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse scenario json: {0}")]
    Parse(#[from] serde_json::Error),
}
