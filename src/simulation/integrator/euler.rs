//! Explicit Euler. First order, not symplectic; kept as the baseline.

use crate::simulation::forces::AccelSet;
use crate::simulation::integrator::Integrator;
use crate::simulation::states::ParticleState;

/// Advance by one explicit Euler step.
/// Positions move with the start-of-step velocities, velocities with the
/// start-of-step accelerations.
pub fn euler_step(state: &mut ParticleState, forces: &AccelSet, dt: f64) {
    if state.n() == 0 {
        state.t += dt;
        return;
    }

    // a_n from x_n
    let accel = forces.current_accels(state);

    let (positions, velocities) = state.kinematics_mut();
    for ((x, v), a) in positions.iter_mut().zip(velocities.iter_mut()).zip(accel.iter()) {
        // x_n+1 = x_n + dt v_n
        *x += dt * *v;
        // v_n+1 = v_n + dt a_n
        *v += dt * a;
    }

    state.t += dt;
}

pub struct EulerIntegrator {
    state: ParticleState,
    forces: AccelSet,
}

impl EulerIntegrator {
    pub fn new(state: ParticleState, forces: AccelSet) -> Self {
        Self { state, forces }
    }
}

impl Integrator for EulerIntegrator {
    fn name(&self) -> &'static str {
        "euler"
    }

    fn state(&self) -> &ParticleState {
        &self.state
    }

    fn advance(&mut self, dt: f64) {
        euler_step(&mut self.state, &self.forces, dt);
    }

    fn into_state(self: Box<Self>) -> ParticleState {
        self.state
    }
}
