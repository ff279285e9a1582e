//! Fixed-step time integrators for the N-body system
//!
//! Every scheme is a free function `*_step(state, forces, dt)` that advances a
//! [`ParticleState`] in place, plus a struct owning the state and the force
//! set behind the common [`Integrator`] interface. The driver selects one
//! scheme through [`build_integrator`] and keeps it for the whole run.

pub mod euler;
pub mod leapfrog;
pub mod multistep;
pub mod runge_kutta;
pub mod yoshida;

use crate::configuration::config::IntegratorConfig;
use crate::error::SimError;
use crate::simulation::forces::AccelSet;
use crate::simulation::states::ParticleState;

pub use euler::{euler_step, EulerIntegrator};
pub use leapfrog::{leapfrog_step, LeapfrogIntegrator};
pub use multistep::{MultiStepFlavor, MultiStepIntegrator};
pub use runge_kutta::{rk2_step, rk4_step, RungeKuttaFlavor, RungeKuttaIntegrator};
pub use yoshida::{yoshida_step, YoshidaIntegrator, YoshidaOrder};

/// Common contract of all integrators.
///
/// An integrator holds exactly one state, the latest one. `step` mutates it
/// in place and advances its time by exactly `dt`; `dt` may be negative and
/// `dt == 0` leaves everything untouched.
pub trait Integrator: Send {
    fn name(&self) -> &'static str;

    /// The held state, whatever its time.
    fn state(&self) -> &ParticleState;

    /// Scheme-specific advance, only called with `dt != 0`.
    fn advance(&mut self, dt: f64);

    fn into_state(self: Box<Self>) -> ParticleState;

    fn current_time(&self) -> f64 {
        self.state().t
    }

    /// State at time `t`, which must be exactly the current time.
    fn current_state(&self, t: f64) -> Result<&ParticleState, SimError> {
        let state = self.state();
        if t != state.t {
            return Err(SimError::TimeUnavailable {
                requested: t,
                current: state.t,
            });
        }
        Ok(state)
    }

    fn step(&mut self, dt: f64) {
        if dt == 0.0 {
            return;
        }
        self.advance(dt);
    }
}

/// Wrap `state` in the integrator selected by `cfg`.
pub fn build_integrator(
    cfg: IntegratorConfig,
    state: ParticleState,
    forces: AccelSet,
) -> Box<dyn Integrator> {
    match cfg {
        IntegratorConfig::Euler => Box::new(EulerIntegrator::new(state, forces)),
        IntegratorConfig::Leapfrog => Box::new(LeapfrogIntegrator::new(state, forces)),
        IntegratorConfig::Rk2 => Box::new(RungeKuttaIntegrator::new(
            state,
            forces,
            RungeKuttaFlavor::Rk2,
        )),
        IntegratorConfig::Rk4 => Box::new(RungeKuttaIntegrator::new(
            state,
            forces,
            RungeKuttaFlavor::Rk4,
        )),
        IntegratorConfig::Yoshida4 => {
            Box::new(YoshidaIntegrator::new(state, forces, YoshidaOrder::Four))
        }
        IntegratorConfig::Yoshida6 => {
            Box::new(YoshidaIntegrator::new(state, forces, YoshidaOrder::Six))
        }
        IntegratorConfig::Yoshida8 => {
            Box::new(YoshidaIntegrator::new(state, forces, YoshidaOrder::Eight))
        }
        IntegratorConfig::Ms2 => Box::new(MultiStepIntegrator::new(
            state,
            forces,
            MultiStepFlavor::Ms2,
        )),
        IntegratorConfig::Ms4 => Box::new(MultiStepIntegrator::new(
            state,
            forces,
            MultiStepFlavor::Ms4,
        )),
        IntegratorConfig::Ms4pc => Box::new(MultiStepIntegrator::new(
            state,
            forces,
            MultiStepFlavor::Ms4pc,
        )),
        IntegratorConfig::Ms6 => Box::new(MultiStepIntegrator::new(
            state,
            forces,
            MultiStepFlavor::Ms6,
        )),
        IntegratorConfig::Ms8 => Box::new(MultiStepIntegrator::new(
            state,
            forces,
            MultiStepFlavor::Ms8,
        )),
    }
}
