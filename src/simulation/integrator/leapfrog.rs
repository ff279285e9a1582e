//! Leapfrog in kick-drift-kick (velocity-Verlet) form.
//!
//! Second order and symplectic. The acceleration evaluated at the end of a
//! step is cached in the state, so a following step from the same time and
//! positions needs only one force evaluation.

use crate::simulation::forces::AccelSet;
use crate::simulation::integrator::Integrator;
use crate::simulation::states::ParticleState;

/// Advance the system by one velocity-Verlet step of size `dt`.
/// Updates positions, velocities and `state.t` in place and leaves the new
/// acceleration in the state's cache.
pub fn leapfrog_step(state: &mut ParticleState, forces: &AccelSet, dt: f64) {
    if state.n() == 0 {
        state.t += dt;
        return;
    }

    let half_dt = 0.5 * dt;

    // a_n at x_n: cached from the previous step when still valid
    let a_old = forces.current_accels(state);

    let (positions, velocities) = state.kinematics_mut();
    for ((x, v), a) in positions.iter_mut().zip(velocities.iter_mut()).zip(a_old.iter()) {
        // Kick: v_n+1/2 = v_n + (dt/2) a_n
        *v += half_dt * a;
        // Drift: x_n+1 = x_n + dt v_n+1/2
        *x += dt * *v;
    }

    // a_n+1 from x_n+1
    let a_new = forces.accels(state);

    // Second kick: v_n+1 = v_n+1/2 + (dt/2) a_n+1
    for (v, a) in state.velocities_mut().iter_mut().zip(a_new.iter()) {
        *v += half_dt * a;
    }

    state.t += dt;
    state.store_accels(a_new);
}

pub struct LeapfrogIntegrator {
    state: ParticleState,
    forces: AccelSet,
}

impl LeapfrogIntegrator {
    pub fn new(state: ParticleState, forces: AccelSet) -> Self {
        Self { state, forces }
    }
}

impl Integrator for LeapfrogIntegrator {
    fn name(&self) -> &'static str {
        "leapfrog"
    }

    fn state(&self) -> &ParticleState {
        &self.state
    }

    fn advance(&mut self, dt: f64) {
        leapfrog_step(&mut self.state, &self.forces, dt);
    }

    fn into_state(self: Box<Self>) -> ParticleState {
        self.state
    }
}
