use crate::config::SolverConfig;

/// Slack when comparing the carry against one step, so caller deltas that
/// are exact multiples of the step survive float rounding.
const STEP_TOLERANCE: f64 = 1.0e-7;

/// Fixed-step accumulator.
///
/// Each frame banks a clamped wall-clock delta and pays it out in whole
/// fixed steps; the remainder carries over to the next frame.
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    step: f64,
    min_delta: f32,
    max_delta: f32,
    carry: f64,
}

impl FixedStepClock {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            step: 1.0 / config.steps_per_second as f64,
            min_delta: config.min_frame_delta,
            max_delta: config.max_frame_delta,
            carry: 0.0,
        }
    }

    /// Length of one fixed step in seconds.
    pub fn step_interval(&self) -> f32 {
        self.step as f32
    }

    /// Length of one fixed step in seconds, at full precision.
    pub fn step_seconds(&self) -> f64 {
        self.step
    }

    /// Time banked but not yet simulated.
    pub fn carry(&self) -> f64 {
        self.carry
    }

    /// Bank `frame_delta` and return how many fixed steps are now due.
    pub fn advance(&mut self, frame_delta: f32) -> u32 {
        let delta = if frame_delta.is_finite() {
            frame_delta.clamp(self.min_delta, self.max_delta)
        } else {
            self.min_delta
        };
        if delta != frame_delta {
            log::trace!("frame delta {frame_delta} clamped to {delta}");
        }

        self.carry += delta as f64;
        let mut steps = 0;
        while self.carry + STEP_TOLERANCE >= self.step {
            self.carry -= self.step;
            steps += 1;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_deltas_accumulate() {
        let mut clock = FixedStepClock::new(&SolverConfig::default());
        // 0.5 steps per frame
        assert_eq!(clock.advance(1.0 / 720.0), 0);
        assert_eq!(clock.advance(1.0 / 720.0), 1);
        assert!(clock.carry().abs() < 1e-6);
    }

    #[test]
    fn test_large_delta_is_clamped() {
        let mut clock = FixedStepClock::new(&SolverConfig::default());
        // 1 second of stall pays out at most 1/60 s = 6 steps
        assert_eq!(clock.advance(1.0), 6);
    }

    #[test]
    fn test_non_finite_delta_uses_minimum() {
        let mut clock = FixedStepClock::new(&SolverConfig::default());
        assert_eq!(clock.advance(f32::NAN), 0);
        assert!((clock.carry() - 0.0001).abs() < 1e-9);
    }
}
