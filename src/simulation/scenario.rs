//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! `Scenario` containing:
//! - engine settings (`Engine`)
//! - numerical parameters (`Parameters`)
//! - the particle state at t = 0
//! - the active force set (`AccelSet`)
//!
//! Initial-condition generators receive an empty state with N, G and eps
//! already set and fill in masses, positions and velocities. A generator that
//! cannot honour the declared particle count fails instead of padding or
//! truncating.

use std::time::Duration;

use rand::prelude::*;

use crate::configuration::config::{BodyConfig, InitialKind, ScenarioConfig};
use crate::error::SimError;
use crate::simulation::diagnostics::to_com_frame;
use crate::simulation::engine::Engine;
use crate::simulation::forces::AccelSet;
use crate::simulation::integrator::{build_integrator, Integrator};
use crate::simulation::params::Parameters;
use crate::simulation::states::{unit_vector, NVec3, ParticleState};

/// Figure-eight choreography (Chenciner & Montgomery 2000), G = 1, unit masses.
const FIGURE_EIGHT_X: [f64; 2] = [0.970_004_36, -0.243_087_53];
const FIGURE_EIGHT_V3: [f64; 2] = [-0.932_407_37, -0.864_731_46];

/// Initial-condition generator selected by the scenario file
#[derive(Debug, Clone)]
pub enum InitialConditions {
    TwoBody,
    FigureEight,
    Ring,
    ColdCollapse { seed: u64 },
    Bodies(Vec<BodyConfig>),
}

impl InitialConditions {
    pub fn from_config(kind: InitialKind, seed: u64, bodies: &[BodyConfig]) -> Self {
        match kind {
            InitialKind::TwoBody => InitialConditions::TwoBody,
            InitialKind::FigureEight => InitialConditions::FigureEight,
            InitialKind::Ring => InitialConditions::Ring,
            InitialKind::ColdCollapse => InitialConditions::ColdCollapse { seed },
            InitialKind::Bodies => InitialConditions::Bodies(bodies.to_vec()),
        }
    }

    /// Fill masses, positions and velocities of `state`.
    pub fn populate(&self, state: &mut ParticleState) -> Result<(), SimError> {
        match self {
            InitialConditions::TwoBody => two_body(state),
            InitialConditions::FigureEight => figure_eight(state),
            InitialConditions::Ring => ring(state),
            InitialConditions::ColdCollapse { seed } => cold_collapse(state, *seed),
            InitialConditions::Bodies(bodies) => explicit_bodies(state, bodies),
        }
    }
}

fn require(state: &ParticleState, ok: bool, what: &str) -> Result<(), SimError> {
    if ok {
        Ok(())
    } else {
        Err(SimError::Config(format!("{what}, got n = {}", state.n())))
    }
}

/// Two unit masses at (-1,0,0) and (1,0,0) on a circular orbit around their
/// centre of mass. Further bodies are light satellites at rest on a quarter
/// arc of radius 2.
fn two_body(state: &mut ParticleState) -> Result<(), SimError> {
    require(state, state.n() >= 2, "two_body needs at least 2 bodies")?;
    let n = state.n();
    // v^2 / r = G m / d^2 with r = 1, d = 2
    let speed = 0.5 * state.G.sqrt();

    let masses = state.mass_mut();
    masses[0] = 1.0;
    masses[1] = 1.0;
    for m in masses.iter_mut().skip(2) {
        *m = 0.001;
    }

    let (positions, velocities) = state.kinematics_mut();
    positions[0] = NVec3::new(-1.0, 0.0, 0.0);
    velocities[0] = NVec3::new(0.0, -speed, 0.0);
    positions[1] = NVec3::new(1.0, 0.0, 0.0);
    velocities[1] = NVec3::new(0.0, speed, 0.0);
    for p in 2..n {
        let angle = p as f64 * 0.5 * std::f64::consts::PI / (n - 1) as f64;
        positions[p] = NVec3::new(2.0 * angle.sin(), 2.0 * angle.cos(), 0.0);
        velocities[p] = NVec3::zeros();
    }
    Ok(())
}

fn figure_eight(state: &mut ParticleState) -> Result<(), SimError> {
    require(state, state.n() == 3, "figure_eight needs exactly 3 bodies")?;
    // velocities scale with sqrt(G) for the same orbit shape
    let scale = state.G.sqrt();
    let x1 = NVec3::new(FIGURE_EIGHT_X[0], FIGURE_EIGHT_X[1], 0.0);
    let v3 = scale * NVec3::new(FIGURE_EIGHT_V3[0], FIGURE_EIGHT_V3[1], 0.0);

    state.mass_mut().fill(1.0);
    let (positions, velocities) = state.kinematics_mut();
    positions[0] = x1;
    positions[1] = -x1;
    positions[2] = NVec3::zeros();
    velocities[0] = -0.5 * v3;
    velocities[1] = -0.5 * v3;
    velocities[2] = v3;
    Ok(())
}

/// Equal masses evenly spaced on the unit circle in the xy-plane, each moving
/// with the circular speed for the (softened) pull of the others.
fn ring(state: &mut ParticleState) -> Result<(), SimError> {
    require(state, state.n() >= 2, "ring needs at least 2 bodies")?;
    let n = state.n();

    state.mass_mut().fill(1.0 / n as f64);
    for (k, x) in state.positions_mut().iter_mut().enumerate() {
        let phi = 2.0 * std::f64::consts::PI * k as f64 / n as f64;
        *x = NVec3::new(phi.cos(), phi.sin(), 0.0);
    }

    let accels = AccelSet::gravity().accels(state);
    let (positions, velocities) = state.kinematics_mut();
    for ((x, v), a) in positions.iter().zip(velocities.iter_mut()).zip(accels.iter()) {
        let speed = (a.norm() * x.norm()).sqrt();
        let tangent = unit_vector(&NVec3::new(-x.y, x.x, 0.0)).unwrap_or_else(NVec3::zeros);
        *v = speed * tangent;
    }
    Ok(())
}

/// Bodies uniformly distributed in the unit sphere, at rest, total mass 1.
fn cold_collapse(state: &mut ParticleState, seed: u64) -> Result<(), SimError> {
    require(state, state.n() >= 1, "cold_collapse needs at least 1 body")?;
    let n = state.n();
    let mut rng = StdRng::seed_from_u64(seed);

    state.mass_mut().fill(1.0 / n as f64);
    let (positions, velocities) = state.kinematics_mut();
    for (x, v) in positions.iter_mut().zip(velocities.iter_mut()) {
        *x = loop {
            let candidate = NVec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            if candidate.norm_squared() <= 1.0 {
                break candidate;
            }
        };
        *v = NVec3::zeros();
    }
    to_com_frame(state);
    Ok(())
}

fn explicit_bodies(state: &mut ParticleState, bodies: &[BodyConfig]) -> Result<(), SimError> {
    if bodies.len() != state.n() {
        return Err(SimError::Config(format!(
            "scenario declares n = {} but lists {} bodies",
            state.n(),
            bodies.len()
        )));
    }
    for (i, b) in bodies.iter().enumerate() {
        if b.x.len() != 3 || b.v.len() != 3 {
            return Err(SimError::Config(format!(
                "body {i}: position and velocity need 3 components"
            )));
        }
    }

    for (m, b) in state.mass_mut().iter_mut().zip(bodies) {
        *m = b.m;
    }
    let (positions, velocities) = state.kinematics_mut();
    for ((x, v), b) in positions.iter_mut().zip(velocities.iter_mut()).zip(bodies) {
        *x = NVec3::new(b.x[0], b.x[1], b.x[2]);
        *v = NVec3::new(b.v[0], b.v[1], b.v[2]);
    }
    Ok(())
}

/// Runtime bundle built from a [`ScenarioConfig`]: engine settings,
/// parameters, the state at t = 0 and the force set
pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    pub state: ParticleState,
    pub forces: AccelSet,
}

impl Scenario {
    pub fn build_scenario(cfg: &ScenarioConfig) -> Result<Self, SimError> {
        let p_cfg = &cfg.parameters;
        if p_cfg.output_every == 0 {
            return Err(SimError::Config("output_every must be at least 1".into()));
        }

        // Empty state with N, G, eps set; the generator fills in the rest
        let mut state = ParticleState::new(cfg.initial.n, p_cfg.G, p_cfg.eps);
        InitialConditions::from_config(cfg.initial.kind, cfg.initial.seed, &cfg.bodies)
            .populate(&mut state)?;

        let wall_clock_limit = p_cfg
            .wall_clock_limit
            .map(Duration::try_from_secs_f64)
            .transpose()
            .map_err(|_| {
                SimError::Config("wall_clock_limit must be a non-negative number of seconds".into())
            })?;

        let parameters = Parameters {
            t_end: p_cfg.t_end,
            dt: p_cfg.dt,
            output_every: p_cfg.output_every,
            wall_clock_limit,
        };

        let engine = Engine {
            integrator: cfg.engine.integrator,
        };

        Ok(Self {
            engine,
            parameters,
            state,
            forces: AccelSet::gravity(),
        })
    }

    /// Hand the state and forces to the configured integrator.
    pub fn into_integrator(self) -> (Box<dyn Integrator>, Parameters) {
        let integrator = build_integrator(self.engine.integrator, self.state, self.forces);
        (integrator, self.parameters)
    }
}
