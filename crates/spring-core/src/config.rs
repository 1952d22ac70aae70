use crate::error::{Result, SolverError};
use crate::forces::pointer::PointerParams;
use serde::{Deserialize, Serialize};

/// Tunables for the fixed-step spring solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Fixed simulation rate. One step advances time by `1 / steps_per_second`.
    pub steps_per_second: u32,
    /// Lower clamp for the wall-clock frame delta, in seconds.
    pub min_frame_delta: f32,
    /// Upper clamp for the wall-clock frame delta, in seconds. Bounds catch-up.
    pub max_frame_delta: f32,
    /// Per-step decay applied to the force accumulator.
    pub damping: f32,
    /// Lower bound on spring length in the force kernel.
    pub spring_epsilon: f32,
    pub pointer: PointerParams,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            steps_per_second: 360,
            min_frame_delta: 0.0001,
            max_frame_delta: 1.0 / 60.0,
            damping: 0.998,
            spring_epsilon: 0.000001,
            pointer: PointerParams::default(),
        }
    }
}

impl SolverConfig {
    /// Parse a JSON document; missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SolverConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.steps_per_second == 0 {
            return Err(SolverError::InvalidConfig(
                "steps_per_second must be positive".into(),
            ));
        }
        if !(self.min_frame_delta > 0.0 && self.min_frame_delta <= self.max_frame_delta) {
            return Err(SolverError::InvalidConfig(format!(
                "frame delta clamp [{}, {}] is empty or non-positive",
                self.min_frame_delta, self.max_frame_delta
            )));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(SolverError::InvalidConfig(format!(
                "damping {} outside (0, 1]",
                self.damping
            )));
        }
        if !(self.spring_epsilon > 0.0) {
            return Err(SolverError::InvalidConfig(
                "spring_epsilon must be positive".into(),
            ));
        }
        Ok(())
    }
}
