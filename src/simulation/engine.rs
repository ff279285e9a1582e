//! High-level runtime engine: integrator selection and the driver loop
//!
//! The loop is strictly sequential. It checks a cooperative stop flag and the
//! optional wall-clock budget only between steps; a step itself always runs
//! to completion.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{info, trace, warn};

use crate::configuration::config::IntegratorConfig;
use crate::error::SimError;
use crate::output::record::write_record;
use crate::simulation::diagnostics::{kinetic_energy, potential_energy, relative_energy_error};
use crate::simulation::integrator::Integrator;
use crate::simulation::params::Parameters;

#[derive(Debug, Clone)]
pub struct Engine {
    pub integrator: IntegratorConfig, // scheme selected once for the whole run
}

/// What a finished (or stopped) run looked like.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: u64,
    pub final_time: f64,
    pub initial_energy: f64,
    pub final_energy: f64,
    /// Largest `|E - E0| / |E0|` over the sampled steps.
    pub max_relative_energy_error: f64,
    pub records_written: usize,
    pub stopped_early: bool,
}

/// Step `integrator` until `parameters.t_end`, sampling diagnostics every
/// `output_every` steps (and after the last one). Each sample is logged and,
/// when a sink is given, written as a text record. The initial state is
/// written first.
pub fn run(
    integrator: &mut dyn Integrator,
    parameters: &Parameters,
    mut sink: Option<&mut dyn Write>,
    stop: &AtomicBool,
) -> Result<RunSummary, SimError> {
    let total_steps = parameters.total_steps();
    let output_every = parameters.output_every.max(1);
    let started = Instant::now();

    let state = integrator.current_state(integrator.current_time())?;
    let e0 = kinetic_energy(state) + potential_energy(state);
    info!(
        "{}: N = {}, dt = {}, {} steps, E0 = {:.12e}",
        integrator.name(),
        state.n(),
        parameters.dt,
        total_steps,
        e0
    );

    let mut records_written = 0;
    if let Some(w) = sink.as_deref_mut() {
        write_record(w, state)?;
        records_written += 1;
    }

    let mut summary = RunSummary {
        steps: 0,
        final_time: state.t,
        initial_energy: e0,
        final_energy: e0,
        max_relative_energy_error: 0.0,
        records_written,
        stopped_early: false,
    };

    for step in 1..=total_steps {
        if stop.load(Ordering::Relaxed) {
            warn!("stop requested, ending run after {} steps", summary.steps);
            summary.stopped_early = true;
            break;
        }
        if let Some(limit) = parameters.wall_clock_limit {
            if started.elapsed() >= limit {
                warn!(
                    "wall-clock limit of {:.1} s reached after {} steps",
                    limit.as_secs_f64(),
                    summary.steps
                );
                summary.stopped_early = true;
                break;
            }
        }

        let step_start = Instant::now();
        integrator.step(parameters.dt);
        summary.steps = step;
        trace!(
            "step {}/{} in {:.3} ms",
            step,
            total_steps,
            step_start.elapsed().as_secs_f64() * 1000.0
        );

        if step % output_every == 0 || step == total_steps {
            let t = integrator.current_time();
            let state = integrator.current_state(t)?;
            let ekin = kinetic_energy(state);
            let epot = potential_energy(state);
            let etot = ekin + epot;
            let rel = relative_energy_error(e0, etot);
            summary.max_relative_energy_error = summary.max_relative_energy_error.max(rel);
            summary.final_energy = etot;

            info!(
                "t: {:.6} Ekin: {:.12e} Epot: {:.12e} Etot: {:.12e} dE/E: {:.3e}",
                t, ekin, epot, etot, rel
            );

            if let Some(w) = sink.as_deref_mut() {
                write_record(w, state)?;
                summary.records_written += 1;
            }
        }
    }

    summary.final_time = integrator.current_time();
    if let Some(w) = sink.as_deref_mut() {
        w.flush()?;
    }

    let elapsed = started.elapsed().as_secs_f64();
    info!(
        "run finished: {} steps in {:.3} s ({:.1} steps/s), max dE/E = {:.3e}",
        summary.steps,
        elapsed,
        if elapsed > 0.0 { summary.steps as f64 / elapsed } else { 0.0 },
        summary.max_relative_energy_error
    );

    Ok(summary)
}
