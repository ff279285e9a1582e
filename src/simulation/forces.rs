//! Force / acceleration contributors for the n-body engine
//!
//! `AccelSet` sums the contributions of its terms into one acceleration per
//! particle. The only physical term is direct-summation softened Newtonian
//! gravity, evaluated in parallel over particles with rayon.

use rayon::prelude::*;

use crate::simulation::states::{NVec3, ParticleState};

/// Collection of acceleration terms
/// Each term implements [`Acceleration`] and their contributions are summed
/// into a single acceleration vector per particle
pub struct AccelSet {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl AccelSet {
    /// Create an empty acceleration set
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// The standard set: softened Newtonian gravity only
    pub fn gravity() -> Self {
        Self::new().with(NewtonianGravity)
    }

    /// Add an acceleration term
    pub fn with(mut self, term: impl Acceleration + Send + Sync + 'static) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    /// Compute total accelerations for all particles in `state`
    /// - `out[i]` will be set to the sum of contributions from all terms
    pub fn accumulate_accels(&self, state: &ParticleState, out: &mut [NVec3]) {
        for a in out.iter_mut() {
            *a = NVec3::zeros();
        }
        for term in &self.terms {
            term.acceleration(state, out);
        }
    }

    /// Freshly allocated acceleration vector for `state`
    pub fn accels(&self, state: &ParticleState) -> Vec<NVec3> {
        let mut out = vec![NVec3::zeros(); state.n()];
        self.accumulate_accels(state, &mut out);
        out
    }

    /// Accelerations at the state's current time, reusing a valid cache when one exists
    pub fn current_accels(&self, state: &ParticleState) -> Vec<NVec3> {
        match state.cached_accels() {
            Some(cached) => cached.to_vec(),
            None => self.accels(state),
        }
    }
}

impl Default for AccelSet {
    fn default() -> Self {
        Self::gravity()
    }
}

/// Acceleration source operating on a [`ParticleState`]
/// Implementations add their contribution into `out[i]` for each particle and
/// must not mutate the state
pub trait Acceleration {
    fn acceleration(&self, state: &ParticleState, out: &mut [NVec3]);
}

/// Softened Newtonian gravity, direct O(N^2) sum.
///
/// `a_i = sum_{j != i} G m_j (r_j - r_i) / (|r_j - r_i|^2 + eps^2)^(3/2)`
///
/// G and eps are read from the state. With eps = 0 two coincident particles
/// produce inf/NaN; nothing guards against it.
pub struct NewtonianGravity;

impl Acceleration for NewtonianGravity {
    fn acceleration(&self, state: &ParticleState, out: &mut [NVec3]) {
        let positions = state.positions();
        let masses = state.mass();
        let g = state.G;
        let eps2 = state.eps * state.eps;

        // each worker owns out[i]; positions and masses are shared read-only
        out.par_iter_mut().enumerate().for_each(|(i, acc)| {
            let xi = positions[i];
            let mut sum = NVec3::zeros();
            for (j, (xj, mj)) in positions.iter().zip(masses.iter()).enumerate() {
                if j == i {
                    continue;
                }
                let r = xj - xi;
                let d2 = r.dot(&r) + eps2;
                let inv_d = d2.sqrt().recip();
                sum += (mj * inv_d * inv_d * inv_d) * r;
            }
            *acc += g * sum;
        });
    }
}

/// Acceleration on particle `i` due to particle `j` alone.
pub fn pair_acceleration(state: &ParticleState, i: usize, j: usize) -> NVec3 {
    let x = state.positions();
    let r = x[j] - x[i];
    let d2 = r.dot(&r) + state.eps * state.eps;
    let inv_d = d2.sqrt().recip();
    (state.G * state.mass()[j] * inv_d * inv_d * inv_d) * r
}
