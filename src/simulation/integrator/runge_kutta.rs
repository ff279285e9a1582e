//! Explicit midpoint (RK2) and classical four-stage (RK4) schemes applied to
//! the first-order system `x' = v, v' = a(x)`.
//!
//! Neither is symplectic. Both are self-starting, which is what the
//! multistep schemes rely on while their history fills up.

use crate::simulation::forces::AccelSet;
use crate::simulation::integrator::Integrator;
use crate::simulation::states::{NVec3, ParticleState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RungeKuttaFlavor {
    Rk2,
    Rk4,
}

/// Overwrite the scratch positions with `f(i)` and evaluate accelerations there.
fn accels_at(
    forces: &AccelSet,
    scratch: &mut ParticleState,
    f: impl Fn(usize) -> NVec3,
) -> Vec<NVec3> {
    for (i, x) in scratch.positions_mut().iter_mut().enumerate() {
        *x = f(i);
    }
    forces.accels(scratch)
}

/// Explicit midpoint step: two force evaluations.
pub fn rk2_step(state: &mut ParticleState, forces: &AccelSet, dt: f64) {
    if state.n() == 0 {
        state.t += dt;
        return;
    }

    let half_dt = 0.5 * dt;
    let x0 = state.positions().to_vec();
    let v0 = state.velocities().to_vec();
    let mut scratch = state.kinematic_copy();

    let a0 = forces.current_accels(state);
    // midpoint: x_n + dt/2 v_n, v_n + dt/2 a_n
    let a_mid = accels_at(forces, &mut scratch, |i| x0[i] + half_dt * v0[i]);

    let (positions, velocities) = state.kinematics_mut();
    for i in 0..positions.len() {
        let v_mid = v0[i] + half_dt * a0[i];
        positions[i] = x0[i] + dt * v_mid;
        velocities[i] = v0[i] + dt * a_mid[i];
    }

    state.t += dt;
}

/// Classical RK4 step: four force evaluations.
pub fn rk4_step(state: &mut ParticleState, forces: &AccelSet, dt: f64) {
    if state.n() == 0 {
        state.t += dt;
        return;
    }

    let half_dt = 0.5 * dt;
    let x0 = state.positions().to_vec();
    let v0 = state.velocities().to_vec();
    let mut scratch = state.kinematic_copy();

    // stage 1: k1x = v0, k1v = a(x0)
    let a1 = forces.current_accels(state);
    // stage 2: k2x = v0 + dt/2 k1v, k2v = a(x0 + dt/2 k1x)
    let a2 = accels_at(forces, &mut scratch, |i| x0[i] + half_dt * v0[i]);
    // stage 3: k3x = v0 + dt/2 k2v, k3v = a(x0 + dt/2 k2x)
    let a3 = accels_at(forces, &mut scratch, |i| {
        x0[i] + half_dt * (v0[i] + half_dt * a1[i])
    });
    // stage 4: k4x = v0 + dt k3v, k4v = a(x0 + dt k3x)
    let a4 = accels_at(forces, &mut scratch, |i| {
        x0[i] + dt * (v0[i] + half_dt * a2[i])
    });

    let sixth_dt = dt / 6.0;
    let (positions, velocities) = state.kinematics_mut();
    for i in 0..positions.len() {
        let k2x = v0[i] + half_dt * a1[i];
        let k3x = v0[i] + half_dt * a2[i];
        let k4x = v0[i] + dt * a3[i];
        positions[i] = x0[i] + sixth_dt * (v0[i] + 2.0 * k2x + 2.0 * k3x + k4x);
        velocities[i] = v0[i] + sixth_dt * (a1[i] + 2.0 * a2[i] + 2.0 * a3[i] + a4[i]);
    }

    state.t += dt;
}

pub struct RungeKuttaIntegrator {
    state: ParticleState,
    forces: AccelSet,
    flavor: RungeKuttaFlavor,
}

impl RungeKuttaIntegrator {
    pub fn new(state: ParticleState, forces: AccelSet, flavor: RungeKuttaFlavor) -> Self {
        Self {
            state,
            forces,
            flavor,
        }
    }
}

impl Integrator for RungeKuttaIntegrator {
    fn name(&self) -> &'static str {
        match self.flavor {
            RungeKuttaFlavor::Rk2 => "rk2",
            RungeKuttaFlavor::Rk4 => "rk4",
        }
    }

    fn state(&self) -> &ParticleState {
        &self.state
    }

    fn advance(&mut self, dt: f64) {
        match self.flavor {
            RungeKuttaFlavor::Rk2 => rk2_step(&mut self.state, &self.forces, dt),
            RungeKuttaFlavor::Rk4 => rk4_step(&mut self.state, &self.forces, dt),
        }
    }

    fn into_state(self: Box<Self>) -> ParticleState {
        self.state
    }
}
