//! Energy and momentum diagnostics over a state snapshot.
//!
//! Read-only; nothing here feeds back into the integration.

use rayon::prelude::*;

use crate::simulation::states::{NVec3, ParticleState};

/// `0.5 * sum m_i |v_i|^2`
pub fn kinetic_energy(state: &ParticleState) -> f64 {
    let e: f64 = state
        .mass()
        .iter()
        .zip(state.velocities())
        .map(|(m, v)| m * v.norm_squared())
        .sum();
    0.5 * e
}

/// `-G * sum_{i<j} m_i m_j / sqrt(|r_j - r_i|^2 + eps^2)`
pub fn potential_energy(state: &ParticleState) -> f64 {
    let x = state.positions();
    let m = state.mass();
    let eps2 = state.eps * state.eps;
    let n = state.n();

    let sum: f64 = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut s = 0.0;
            for j in (i + 1)..n {
                let r = x[j] - x[i];
                s += m[i] * m[j] / (r.norm_squared() + eps2).sqrt();
            }
            s
        })
        .sum();

    -state.G * sum
}

pub fn total_energy(state: &ParticleState) -> f64 {
    kinetic_energy(state) + potential_energy(state)
}

pub fn total_momentum(state: &ParticleState) -> NVec3 {
    state
        .mass()
        .iter()
        .zip(state.velocities())
        .fold(NVec3::zeros(), |p, (m, v)| p + *m * v)
}

pub fn total_mass(state: &ParticleState) -> f64 {
    state.mass().iter().sum()
}

/// Mass-weighted mean position, `None` for a massless system.
pub fn centre_of_mass(state: &ParticleState) -> Option<NVec3> {
    let total = total_mass(state);
    if total == 0.0 {
        return None;
    }
    let weighted = state
        .mass()
        .iter()
        .zip(state.positions())
        .fold(NVec3::zeros(), |acc, (m, x)| acc + *m * x);
    Some(weighted / total)
}

/// Shift positions and velocities into the centre-of-mass frame.
pub fn to_com_frame(state: &mut ParticleState) {
    let total = total_mass(state);
    if total == 0.0 {
        return;
    }
    let Some(com) = centre_of_mass(state) else {
        return;
    };
    let vcom = total_momentum(state) / total;
    let (positions, velocities) = state.kinematics_mut();
    for x in positions.iter_mut() {
        *x -= com;
    }
    for v in velocities.iter_mut() {
        *v -= vcom;
    }
}

/// `|e - e0| / |e0|`, or the absolute difference when `e0` is zero.
pub fn relative_energy_error(e0: f64, e: f64) -> f64 {
    if e0 == 0.0 {
        (e - e0).abs()
    } else {
        ((e - e0) / e0).abs()
    }
}
