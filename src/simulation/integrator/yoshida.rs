//! Yoshida symplectic composition of leapfrog sub-steps.
//!
//! A step of size `dt` is a fixed sequence of leapfrog steps of size `d_k dt`
//! with signed coefficients summing to 1, arranged as a palindrome
//! `w_m .. w_1, w_0, w_1 .. w_m`, where `w_0 = 1 - 2 sum w_k`.
//! Coefficients: H. Yoshida, Phys. Lett. A 150 (1990) 262, solution A for
//! order 6 and solution D for order 8.

use crate::simulation::forces::AccelSet;
use crate::simulation::integrator::leapfrog::leapfrog_step;
use crate::simulation::integrator::Integrator;
use crate::simulation::states::ParticleState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YoshidaOrder {
    Four,
    Six,
    Eight,
}

const W6: [f64; 3] = [
    -1.177_679_984_178_87,
    0.235_573_213_359_357,
    0.784_513_610_477_560,
];

const W8: [f64; 7] = [
    0.102_799_849_391_985,
    -1.960_610_232_975_49,
    1.938_139_137_622_76,
    -0.158_240_635_368_243,
    -1.444_852_236_860_48,
    0.253_693_336_566_229,
    0.914_844_246_229_740,
];

/// Sub-step coefficients for one big step, in application order.
pub fn coefficients(order: YoshidaOrder) -> Vec<f64> {
    let outer: Vec<f64> = match order {
        YoshidaOrder::Four => {
            let cbrt2 = 2f64.cbrt();
            vec![1.0 / (2.0 - cbrt2)]
        }
        YoshidaOrder::Six => W6.to_vec(),
        YoshidaOrder::Eight => W8.to_vec(),
    };
    let w0 = 1.0 - 2.0 * outer.iter().sum::<f64>();

    let mut seq: Vec<f64> = outer.iter().rev().copied().collect();
    seq.push(w0);
    seq.extend(outer.iter().copied());
    seq
}

/// One composed step built from `coefficients(order)`.
/// Time advances by exactly `dt`; the final leapfrog cache is re-stamped with it.
pub fn yoshida_step(state: &mut ParticleState, forces: &AccelSet, dt: f64, order: YoshidaOrder) {
    let t0 = state.t;
    for d in coefficients(order) {
        leapfrog_step(state, forces, d * dt);
    }
    state.t = t0 + dt;
    if let Some(cache) = state.accel_cache.as_mut() {
        cache.t = state.t;
    }
}

pub struct YoshidaIntegrator {
    state: ParticleState,
    forces: AccelSet,
    order: YoshidaOrder,
}

impl YoshidaIntegrator {
    pub fn new(state: ParticleState, forces: AccelSet, order: YoshidaOrder) -> Self {
        Self {
            state,
            forces,
            order,
        }
    }
}

impl Integrator for YoshidaIntegrator {
    fn name(&self) -> &'static str {
        match self.order {
            YoshidaOrder::Four => "yoshida4",
            YoshidaOrder::Six => "yoshida6",
            YoshidaOrder::Eight => "yoshida8",
        }
    }

    fn state(&self) -> &ParticleState {
        &self.state
    }

    fn advance(&mut self, dt: f64) {
        yoshida_step(&mut self.state, &self.forces, dt, self.order);
    }

    fn into_state(self: Box<Self>) -> ParticleState {
        self.state
    }
}
