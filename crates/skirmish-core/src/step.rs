//! The simulation step passed to every update.

use serde::{Deserialize, Serialize};

/// One tick of simulated time.
///
/// `time` is derived from the tick number by the driver (`number * dt`), never
/// accumulated, so every peer computes the same value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationStep {
    /// Zero-based tick number.
    pub number: u64,
    /// Simulation time in seconds at the start of this tick.
    pub time: f64,
    /// Length of this tick in seconds.
    pub time_delta: f32,
}

impl SimulationStep {
    /// # Panics
    ///
    /// Panics if `time_delta` is negative or not finite.
    pub fn new(number: u64, time: f64, time_delta: f32) -> Self {
        assert!(
            time_delta >= 0.0 && time_delta.is_finite(),
            "time_delta must be non-negative and finite, got {time_delta}"
        );
        Self {
            number,
            time,
            time_delta,
        }
    }
}
