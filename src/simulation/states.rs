//! Core state types for the N-body simulation.
//!
//! - `ParticleState` holds N, G, the softening length, the current time and
//!   the index-aligned mass / position / velocity arrays
//! - `AccelCache` is the leapfrog acceleration cache
//! - `AccelHistory` is the bounded acceleration history used by multistep schemes
//!
//! One record carries the optional caches; which ones are in use depends on
//! the integrator currently advancing the state.

use std::collections::VecDeque;

use nalgebra::Vector3;

use crate::error::SimError;

pub type NVec3 = Vector3<f64>;

/// Unit vector along `v`, or `None` when `v` has zero norm.
pub fn unit_vector(v: &NVec3) -> Option<NVec3> {
    v.try_normalize(0.0)
}

/// Accelerations computed for the positions held at time `t`, with the G and
/// softening they were evaluated under.
#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct AccelCache {
    pub t: f64,
    pub G: f64,
    pub eps: f64,
    pub accels: Vec<NVec3>,
}

/// Ring buffer of past accelerations, most recent first.
///
/// Depth is fixed at construction. Once full, every `push` evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct AccelHistory {
    depth: usize,
    dt: Option<f64>,
    slots: VecDeque<Vec<NVec3>>,
}

impl AccelHistory {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            dt: None,
            slots: VecDeque::with_capacity(depth),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.depth
    }

    /// Step size the history was recorded with, if any entry exists.
    pub fn dt(&self) -> Option<f64> {
        self.dt
    }

    pub fn push(&mut self, accels: Vec<NVec3>, dt: f64) {
        if self.depth == 0 {
            return;
        }
        if self.slots.len() == self.depth {
            self.slots.pop_back();
        }
        self.slots.push_front(accels);
        self.dt = Some(dt);
    }

    /// `back(1)` is the previous step's acceleration, `back(2)` two steps back, ...
    pub fn back(&self, k: usize) -> &[NVec3] {
        &self.slots[k - 1]
    }
}

#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct ParticleState {
    pub t: f64, // simulation time
    pub G: f64, // gravitational constant
    pub eps: f64, // softening length
    mass: Vec<f64>,
    position: Vec<NVec3>,
    velocity: Vec<NVec3>,
    pub(crate) accel_cache: Option<AccelCache>,
    pub(crate) history: Option<AccelHistory>,
}

#[allow(non_snake_case)]
impl ParticleState {
    /// Empty state at t = 0: unit masses, every particle at rest at the origin.
    pub fn new(n: usize, G: f64, eps: f64) -> Self {
        Self {
            t: 0.0,
            G,
            eps,
            mass: vec![1.0; n],
            position: vec![NVec3::zeros(); n],
            velocity: vec![NVec3::zeros(); n],
            accel_cache: None,
            history: None,
        }
    }

    /// Build a state from explicit arrays, which must share one length.
    pub fn from_parts(
        t: f64,
        G: f64,
        eps: f64,
        mass: Vec<f64>,
        position: Vec<NVec3>,
        velocity: Vec<NVec3>,
    ) -> Result<Self, SimError> {
        if position.len() != mass.len() || velocity.len() != mass.len() {
            return Err(SimError::Config(format!(
                "array lengths differ: {} masses, {} positions, {} velocities",
                mass.len(),
                position.len(),
                velocity.len()
            )));
        }
        Ok(Self {
            t,
            G,
            eps,
            mass,
            position,
            velocity,
            accel_cache: None,
            history: None,
        })
    }

    /// Deep copy of the kinematic arrays without the cache or the history.
    pub fn kinematic_copy(&self) -> Self {
        Self {
            t: self.t,
            G: self.G,
            eps: self.eps,
            mass: self.mass.clone(),
            position: self.position.clone(),
            velocity: self.velocity.clone(),
            accel_cache: None,
            history: None,
        }
    }

    /// Particle count.
    pub fn n(&self) -> usize {
        self.mass.len()
    }

    pub fn mass(&self) -> &[f64] {
        &self.mass
    }

    pub fn positions(&self) -> &[NVec3] {
        &self.position
    }

    pub fn velocities(&self) -> &[NVec3] {
        &self.velocity
    }

    pub fn mass_mut(&mut self) -> &mut [f64] {
        self.accel_cache = None;
        &mut self.mass
    }

    /// Mutable positions. Drops any cached acceleration.
    pub fn positions_mut(&mut self) -> &mut [NVec3] {
        self.accel_cache = None;
        &mut self.position
    }

    pub fn velocities_mut(&mut self) -> &mut [NVec3] {
        &mut self.velocity
    }

    /// Positions and velocities borrowed mutably together.
    pub fn kinematics_mut(&mut self) -> (&mut [NVec3], &mut [NVec3]) {
        self.accel_cache = None;
        (&mut self.position, &mut self.velocity)
    }

    /// Cached accelerations, if they were computed for the current time and particle count.
    pub fn cached_accels(&self) -> Option<&[NVec3]> {
        self.accel_cache
            .as_ref()
            .filter(|c| {
                c.t == self.t && c.G == self.G && c.eps == self.eps && c.accels.len() == self.n()
            })
            .map(|c| c.accels.as_slice())
    }

    pub fn store_accels(&mut self, accels: Vec<NVec3>) {
        self.accel_cache = Some(AccelCache {
            t: self.t,
            G: self.G,
            eps: self.eps,
            accels,
        });
    }

    pub fn history(&self) -> Option<&AccelHistory> {
        self.history.as_ref()
    }
}
