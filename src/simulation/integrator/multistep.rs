//! Fixed-order multistep predictor schemes (orders 2, 4, 6, 8) and a
//! fourth-order predictor-corrector.
//!
//! The last `order - 1` accelerations are kept in the state's
//! [`AccelHistory`]. Each native step estimates the time derivatives of the
//! acceleration (jerk, snap, ...) by finite differences over the current
//! acceleration and the history, then advances with a truncated Taylor series
//!
//! ```text
//! x += v dt + dt^2 * sum_{m=0}^{k-2} d_m / (m+2)!
//! v +=        dt   * sum_{m=0}^{k-1} d_m / (m+1)!
//! ```
//!
//! where `d_m` is the m-th derivative times `dt^m` and `d_0` the acceleration.
//! The schemes are not self-starting: until the history is full every step
//! stores the current acceleration and falls back to a self-starting scheme.

use log::{debug, warn};
use rayon::prelude::*;

use crate::simulation::forces::AccelSet;
use crate::simulation::integrator::runge_kutta::{rk2_step, rk4_step};
use crate::simulation::integrator::yoshida::{yoshida_step, YoshidaOrder};
use crate::simulation::integrator::Integrator;
use crate::simulation::states::{AccelHistory, NVec3, ParticleState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiStepFlavor {
    Ms2,
    Ms4,
    Ms4pc,
    Ms6,
    Ms8,
}

/// One derivative estimate: `d_m = sum_j numer[j] * a_{n-j} / denom`.
struct DiffRow {
    numer: &'static [f64],
    denom: f64,
}

const MS2_TABLE: [DiffRow; 1] = [DiffRow { numer: &[1.0, -1.0], denom: 1.0 }];

const MS4_TABLE: [DiffRow; 3] = [
    DiffRow { numer: &[11.0, -18.0, 9.0, -2.0], denom: 6.0 },
    DiffRow { numer: &[2.0, -5.0, 4.0, -1.0], denom: 1.0 },
    DiffRow { numer: &[1.0, -3.0, 3.0, -1.0], denom: 1.0 },
];

const MS6_TABLE: [DiffRow; 5] = [
    DiffRow { numer: &[137.0, -300.0, 300.0, -200.0, 75.0, -12.0], denom: 60.0 },
    DiffRow { numer: &[45.0, -154.0, 214.0, -156.0, 61.0, -10.0], denom: 12.0 },
    DiffRow { numer: &[17.0, -71.0, 118.0, -98.0, 41.0, -7.0], denom: 4.0 },
    DiffRow { numer: &[3.0, -14.0, 26.0, -24.0, 11.0, -2.0], denom: 1.0 },
    DiffRow { numer: &[1.0, -5.0, 10.0, -10.0, 5.0, -1.0], denom: 1.0 },
];

const MS8_TABLE: [DiffRow; 7] = [
    DiffRow {
        numer: &[1089.0, -2940.0, 4410.0, -4900.0, 3675.0, -1764.0, 490.0, -60.0],
        denom: 420.0,
    },
    DiffRow {
        numer: &[938.0, -4014.0, 7911.0, -9490.0, 7380.0, -3618.0, 1019.0, -126.0],
        denom: 180.0,
    },
    DiffRow {
        numer: &[967.0, -5104.0, 11787.0, -15560.0, 12725.0, -6432.0, 1849.0, -232.0],
        denom: 120.0,
    },
    DiffRow {
        numer: &[56.0, -333.0, 852.0, -1219.0, 1056.0, -555.0, 164.0, -21.0],
        denom: 6.0,
    },
    DiffRow {
        numer: &[46.0, -295.0, 810.0, -1235.0, 1130.0, -621.0, 190.0, -25.0],
        denom: 6.0,
    },
    DiffRow {
        numer: &[4.0, -27.0, 78.0, -125.0, 120.0, -69.0, 22.0, -3.0],
        denom: 1.0,
    },
    DiffRow {
        numer: &[1.0, -7.0, 21.0, -35.0, 35.0, -21.0, 7.0, -1.0],
        denom: 1.0,
    },
];

/// Derivatives at t_n from samples `[a_{n+1}, a_n, a_{n-1}, a_{n-2}]`,
/// used by the corrector pass once the predicted acceleration is known.
const PC4_CORRECTOR_TABLE: [DiffRow; 3] = [
    DiffRow { numer: &[2.0, 3.0, -6.0, 1.0], denom: 6.0 },
    DiffRow { numer: &[1.0, -2.0, 1.0, 0.0], denom: 1.0 },
    DiffRow { numer: &[1.0, -3.0, 3.0, -1.0], denom: 1.0 },
];

/// 1/k! for k = 0..=9
const INV_FACTORIAL: [f64; 10] = [
    1.0,
    1.0,
    1.0 / 2.0,
    1.0 / 6.0,
    1.0 / 24.0,
    1.0 / 120.0,
    1.0 / 720.0,
    1.0 / 5040.0,
    1.0 / 40320.0,
    1.0 / 362880.0,
];

impl MultiStepFlavor {
    pub fn order(self) -> usize {
        match self {
            MultiStepFlavor::Ms2 => 2,
            MultiStepFlavor::Ms4 | MultiStepFlavor::Ms4pc => 4,
            MultiStepFlavor::Ms6 => 6,
            MultiStepFlavor::Ms8 => 8,
        }
    }

    /// Number of past accelerations the native formula needs.
    pub fn history_depth(self) -> usize {
        self.order() - 1
    }

    fn table(self) -> &'static [DiffRow] {
        match self {
            MultiStepFlavor::Ms2 => &MS2_TABLE,
            MultiStepFlavor::Ms4 | MultiStepFlavor::Ms4pc => &MS4_TABLE,
            MultiStepFlavor::Ms6 => &MS6_TABLE,
            MultiStepFlavor::Ms8 => &MS8_TABLE,
        }
    }

    /// Self-starting step of matching order used while the history fills up.
    fn warm_up_step(self, state: &mut ParticleState, forces: &AccelSet, dt: f64) {
        match self {
            MultiStepFlavor::Ms2 => rk2_step(state, forces, dt),
            MultiStepFlavor::Ms4 | MultiStepFlavor::Ms4pc => rk4_step(state, forces, dt),
            MultiStepFlavor::Ms6 => yoshida_step(state, forces, dt, YoshidaOrder::Six),
            MultiStepFlavor::Ms8 => yoshida_step(state, forces, dt, YoshidaOrder::Eight),
        }
    }
}

/// `[d_0, d_1, ..]` for one particle, with `sample(j)` returning `a_{n-j}`.
fn derivatives(table: &[DiffRow], first: NVec3, sample: impl Fn(usize) -> NVec3) -> Vec<NVec3> {
    let mut d = Vec::with_capacity(table.len() + 1);
    d.push(first);
    for row in table {
        let mut sum = NVec3::zeros();
        for (j, c) in row.numer.iter().enumerate() {
            if *c != 0.0 {
                sum += *c * sample(j);
            }
        }
        d.push(sum / row.denom);
    }
    d
}

/// Truncated Taylor displacement `dt^2 * sum_{m < terms} d_m / (m+2)!`.
fn position_series(d: &[NVec3], terms: usize, dt: f64) -> NVec3 {
    let mut s = NVec3::zeros();
    for (m, dm) in d.iter().take(terms).enumerate() {
        s += INV_FACTORIAL[m + 2] * dm;
    }
    dt * dt * s
}

/// Truncated Taylor velocity change `dt * sum_m d_m / (m+1)!`.
fn velocity_series(d: &[NVec3], dt: f64) -> NVec3 {
    let mut s = NVec3::zeros();
    for (m, dm) in d.iter().enumerate() {
        s += INV_FACTORIAL[m + 1] * dm;
    }
    dt * s
}

/// Native multistep step, history full. Pushes `a_n` into the history.
fn multistep_step(
    state: &mut ParticleState,
    forces: &AccelSet,
    history: &mut AccelHistory,
    table: &[DiffRow],
    dt: f64,
) {
    let a0 = forces.current_accels(state);
    let order = table.len() + 1;
    let hist: &AccelHistory = history;

    let (positions, velocities) = state.kinematics_mut();
    positions
        .par_iter_mut()
        .zip(velocities.par_iter_mut())
        .enumerate()
        .for_each(|(i, (x, v))| {
            let d = derivatives(table, a0[i], |j| {
                if j == 0 {
                    a0[i]
                } else {
                    hist.back(j)[i]
                }
            });
            *x += dt * *v + position_series(&d, order - 1, dt);
            *v += velocity_series(&d, dt);
        });

    history.push(a0, dt);
    state.t += dt;
}

/// Fourth-order predictor-corrector step, history full.
///
/// The predictor moves positions only (velocities untouched); after one more
/// force evaluation at the predicted positions the corrector recomputes the
/// derivatives at t_n with the predicted acceleration and redoes the update
/// from the start-of-step positions and velocities.
fn predictor_corrector_step(
    state: &mut ParticleState,
    forces: &AccelSet,
    history: &mut AccelHistory,
    dt: f64,
) {
    let a0 = forces.current_accels(state);
    let hist: &AccelHistory = history;
    let x0 = state.positions().to_vec();
    let v0 = state.velocities().to_vec();

    // predictor
    state
        .positions_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, x)| {
            let d = derivatives(&MS4_TABLE, a0[i], |j| {
                if j == 0 {
                    a0[i]
                } else {
                    hist.back(j)[i]
                }
            });
            *x = x0[i] + dt * v0[i] + position_series(&d, 3, dt);
        });

    let a_pred = forces.accels(state);

    // corrector: samples a_{n+1}(predicted), a_n, a_{n-1}, a_{n-2}
    let (positions, velocities) = state.kinematics_mut();
    positions
        .par_iter_mut()
        .zip(velocities.par_iter_mut())
        .enumerate()
        .for_each(|(i, (x, v))| {
            let d = derivatives(&PC4_CORRECTOR_TABLE, a0[i], |j| match j {
                0 => a_pred[i],
                1 => a0[i],
                _ => hist.back(j - 1)[i],
            });
            *x = x0[i] + dt * v0[i] + position_series(&d, 4, dt);
            *v = v0[i] + velocity_series(&d, dt);
        });

    history.push(a0, dt);
    state.t += dt;
}

pub struct MultiStepIntegrator {
    state: ParticleState,
    forces: AccelSet,
    flavor: MultiStepFlavor,
}

impl MultiStepIntegrator {
    pub fn new(mut state: ParticleState, forces: AccelSet, flavor: MultiStepFlavor) -> Self {
        state.history = Some(AccelHistory::new(flavor.history_depth()));
        Self {
            state,
            forces,
            flavor,
        }
    }

    pub fn flavor(&self) -> MultiStepFlavor {
        self.flavor
    }

    /// True until the history holds `order - 1` accelerations.
    pub fn is_warming_up(&self) -> bool {
        !self.state.history.as_ref().is_some_and(|h| h.is_full())
    }
}

impl Integrator for MultiStepIntegrator {
    fn name(&self) -> &'static str {
        match self.flavor {
            MultiStepFlavor::Ms2 => "ms2",
            MultiStepFlavor::Ms4 => "ms4",
            MultiStepFlavor::Ms4pc => "ms4pc",
            MultiStepFlavor::Ms6 => "ms6",
            MultiStepFlavor::Ms8 => "ms8",
        }
    }

    fn state(&self) -> &ParticleState {
        &self.state
    }

    fn advance(&mut self, dt: f64) {
        let depth = self.flavor.history_depth();
        let mut history = self
            .state
            .history
            .take()
            .unwrap_or_else(|| AccelHistory::new(depth));

        if self.state.n() == 0 {
            self.state.t += dt;
        } else if !history.is_full() {
            let a = self.forces.current_accels(&self.state);
            history.push(a, dt);
            self.flavor.warm_up_step(&mut self.state, &self.forces, dt);
            if history.is_full() {
                debug!(
                    "{}: history full at t = {}, switching to the native formula",
                    self.name(),
                    self.state.t
                );
            }
        } else {
            if history.dt() != Some(dt) {
                warn!(
                    "{}: step size {} differs from the history's {:?}",
                    self.name(),
                    dt,
                    history.dt()
                );
            }
            match self.flavor {
                MultiStepFlavor::Ms4pc => {
                    predictor_corrector_step(&mut self.state, &self.forces, &mut history, dt)
                }
                flavor => multistep_step(
                    &mut self.state,
                    &self.forces,
                    &mut history,
                    flavor.table(),
                    dt,
                ),
            }
        }

        self.state.history = Some(history);
    }

    fn into_state(self: Box<Self>) -> ParticleState {
        self.state
    }
}
