//! Numerical parameters of a run
//!
//! `Parameters` holds runtime settings:
//! - step size and end time,
//! - how often diagnostics and records are emitted,
//! - an optional wall-clock budget
//!
//! G and the softening length live in the `ParticleState` itself.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Parameters {
    pub t_end: f64, // time end
    pub dt: f64, // step size
    pub output_every: u64, // steps between diagnostics / records
    pub wall_clock_limit: Option<Duration>,
}

impl Parameters {
    /// Number of fixed steps needed to reach `t_end` from t = 0.
    pub fn total_steps(&self) -> u64 {
        if self.dt == 0.0 {
            return 0;
        }
        let ratio = self.t_end / self.dt;
        if ratio <= 0.0 || !ratio.is_finite() {
            return 0;
        }
        // 1.0 / 0.01 must give 100 steps, not 101
        let nearest = ratio.round();
        if (ratio - nearest).abs() < 1e-9 * nearest.max(1.0) {
            nearest as u64
        } else {
            ratio.ceil() as u64
        }
    }
}
