use std::time::Instant;

use crate::configuration::config::IntegratorConfig;
use crate::simulation::forces::AccelSet;
use crate::simulation::integrator::{build_integrator, Integrator};
use crate::simulation::states::{NVec3, ParticleState};

const BENCH_G: f64 = 0.1;
const BENCH_EPS: f64 = 0.01;

/// Deterministic state of size `n`: unit masses on a tangled curve, at rest
fn make_state(n: usize) -> ParticleState {
    let mut state = ParticleState::new(n, BENCH_G, BENCH_EPS);
    for (i, x) in state.positions_mut().iter_mut().enumerate() {
        let i_f = i as f64;
        *x = NVec3::new(
            (i_f * 0.37).sin() * 5.0,
            (i_f * 0.13).cos() * 5.0,
            (i_f * 0.07).sin() * 5.0,
        );
    }
    state
}

/// Time one force evaluation for a range of N
pub fn bench_kernel() {
    let ns = [200, 400, 800, 1600, 3200, 6400];
    let forces = AccelSet::gravity();

    for n in ns {
        let state = make_state(n);
        let mut out = vec![NVec3::zeros(); n];

        // Warm up
        forces.accumulate_accels(&state, &mut out);

        let t0 = Instant::now();
        forces.accumulate_accels(&state, &mut out);
        let elapsed = t0.elapsed().as_secs_f64();

        println!("N = {n:5}, kernel = {:8.6} s", elapsed);
    }
}

/// Per-step cost of every integrator at a fixed N.
/// Multistep schemes are warmed up first so their native step is measured.
pub fn bench_integrators() {
    let n = 1600;
    let steps = 4;
    let dt = 1.0e-3;

    for cfg in IntegratorConfig::ALL {
        let mut integrator = build_integrator(cfg, make_state(n), AccelSet::gravity());

        // Warm-up covers the deepest multistep history
        for _ in 0..8 {
            integrator.step(dt);
        }

        let t0 = Instant::now();
        for _ in 0..steps {
            integrator.step(dt);
        }
        let per_step = t0.elapsed().as_secs_f64() / steps as f64;

        println!("{:>9}: N = {}, step = {:8.6} s", cfg.name(), n, per_step);
    }
}

/// Kernel cost against N as CSV
/// Paste output directly into a spreadsheet to graph
pub fn bench_kernel_curve() {
    println!("N,kernel_ms,leapfrog_step_ms");

    let forces = AccelSet::gravity();
    for n in (200..=6400).step_by(200) {
        // Small n: average over a few evaluations to smooth noise
        let reps = if n <= 800 { 5 } else { 1 };

        let state = make_state(n);
        let mut out = vec![NVec3::zeros(); n];

        let t0 = Instant::now();
        for _ in 0..reps {
            forces.accumulate_accels(&state, &mut out);
        }
        let ms_kernel = t0.elapsed().as_secs_f64() * 1000.0 / reps as f64;

        let mut leapfrog = build_integrator(IntegratorConfig::Leapfrog, state, AccelSet::gravity());
        // first step fills the acceleration cache
        leapfrog.step(1.0e-3);
        let t1 = Instant::now();
        for _ in 0..reps {
            leapfrog.step(1.0e-3);
        }
        let ms_step = t1.elapsed().as_secs_f64() * 1000.0 / reps as f64;

        println!("{},{:.6},{:.6}", n, ms_kernel, ms_step);
    }
}
