use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use nbsim::configuration::config::ScenarioConfig;
use nbsim::output::record::{read_trajectory, write_record, RecordReader};
use nbsim::simulation::diagnostics::{relative_energy_error, total_energy, total_momentum};
use nbsim::simulation::forces::{pair_acceleration, AccelSet, Acceleration, NewtonianGravity};
use nbsim::simulation::integrator::multistep::{MultiStepFlavor, MultiStepIntegrator};
use nbsim::simulation::integrator::{build_integrator, leapfrog_step, Integrator, LeapfrogIntegrator};
use nbsim::simulation::scenario::Scenario;
use nbsim::simulation::states::{NVec3, ParticleState};
use nbsim::{run, IntegratorConfig, SimError};

/// Two bodies at rest, separated along the x-axis and centred on the origin
pub fn two_body_state(dist: f64, m1: f64, m2: f64, g: f64, eps: f64) -> ParticleState {
    ParticleState::from_parts(
        0.0,
        g,
        eps,
        vec![m1, m2],
        vec![NVec3::new(-dist / 2.0, 0.0, 0.0), NVec3::new(dist / 2.0, 0.0, 0.0)],
        vec![NVec3::zeros(), NVec3::zeros()],
    )
    .unwrap()
}

/// Unit masses at (-1,0,0) and (1,0,0) on a circular orbit, G = 1.
/// Body 0 follows (-cos(t/2), -sin(t/2), 0).
pub fn circular_pair() -> ParticleState {
    ParticleState::from_parts(
        0.0,
        1.0,
        0.0,
        vec![1.0, 1.0],
        vec![NVec3::new(-1.0, 0.0, 0.0), NVec3::new(1.0, 0.0, 0.0)],
        vec![NVec3::new(0.0, -0.5, 0.0), NVec3::new(0.0, 0.5, 0.0)],
    )
    .unwrap()
}

fn circular_orbit_error(state: &ParticleState) -> f64 {
    let t = state.t;
    let exact = NVec3::new(-(0.5 * t).cos(), -(0.5 * t).sin(), 0.0);
    (state.positions()[0] - exact).norm()
}

/// Small asymmetric cluster with non-zero total momentum
pub fn cluster_state() -> ParticleState {
    ParticleState::from_parts(
        0.0,
        1.0,
        0.05,
        vec![1.0, 0.5, 2.0, 0.3],
        vec![
            NVec3::new(0.0, 0.0, 0.0),
            NVec3::new(1.0, 0.2, -0.1),
            NVec3::new(-0.7, 0.9, 0.3),
            NVec3::new(0.4, -1.1, 0.6),
        ],
        vec![
            NVec3::new(0.1, 0.0, 0.0),
            NVec3::new(0.0, 0.6, 0.1),
            NVec3::new(-0.2, -0.1, 0.0),
            NVec3::new(0.3, 0.2, -0.4),
        ],
    )
    .unwrap()
}

fn scenario_from_yaml(text: &str) -> Result<Scenario, SimError> {
    let cfg = ScenarioConfig::from_yaml_str(text).unwrap();
    Scenario::build_scenario(&cfg)
}

/// Gravity wrapper counting how often the kernel runs
struct CountingGravity {
    calls: Arc<AtomicUsize>,
}

impl Acceleration for CountingGravity {
    fn acceleration(&self, state: &ParticleState, out: &mut [NVec3]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        NewtonianGravity.acceleration(state, out);
    }
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let state = two_body_state(1.0, 2.0, 3.0, 0.1, 0.0);
    let acc = AccelSet::gravity().accels(&state);

    let net = acc[0] * state.mass()[0] + acc[1] * state.mass()[1];
    assert!(net.norm() < 1e-12, "Net force not zero: {:?}", net);

    let f01 = pair_acceleration(&state, 0, 1) * state.mass()[0];
    let f10 = pair_acceleration(&state, 1, 0) * state.mass()[1];
    assert!((f01 + f10).norm() < 1e-12);
}

#[test]
fn gravity_third_law_holds_for_every_pair() {
    // softened, unequal masses
    let state = cluster_state();
    let m = state.mass();

    for i in 0..state.n() {
        for j in 0..state.n() {
            if i == j {
                continue;
            }
            let f_ij = m[i] * pair_acceleration(&state, i, j);
            let f_ji = m[j] * pair_acceleration(&state, j, i);
            assert!((f_ij + f_ji).norm() < 1e-14, "pair ({i}, {j}): {:?} vs {:?}", f_ij, f_ji);
        }
    }
}

#[test]
fn gravity_points_toward_other_body() {
    let state = two_body_state(2.0, 1.0, 1.0, 0.1, 0.0);
    let acc = AccelSet::gravity().accels(&state);

    let dx = state.positions()[1] - state.positions()[0];
    assert!(acc[0].dot(&dx) > 0.0, "Acceleration is not toward second body");
    assert!(acc[1].dot(&dx) < 0.0, "Acceleration is not toward first body");
}

#[test]
fn gravity_inverse_square_law() {
    let forces = AccelSet::gravity();
    let acc_r = forces.accels(&two_body_state(1.0, 1.0, 1.0, 0.1, 0.0));
    let acc_2r = forces.accels(&two_body_state(2.0, 1.0, 1.0, 0.1, 0.0));

    let ratio = acc_r[0].norm() / acc_2r[0].norm();
    assert!((ratio - 4.0).abs() < 1e-12, "Expected 4x, got {}", ratio);
}

#[test]
fn gravity_softening_prevents_blowup() {
    let state = two_body_state(1e-9, 1.0, 1.0, 0.1, 0.3);
    let acc = AccelSet::gravity().accels(&state);

    // bounded by G m d / eps^3
    assert!(acc[0].norm() < 1e-6, "Softening failed; acceleration too large");
    assert!(acc[0].iter().all(|c| c.is_finite()));
}

#[test]
fn gravity_parallel_sum_matches_pairwise() {
    let state = cluster_state();
    let acc = AccelSet::gravity().accels(&state);

    for i in 0..state.n() {
        let mut expected = NVec3::zeros();
        for j in 0..state.n() {
            if j != i {
                expected += pair_acceleration(&state, i, j);
            }
        }
        assert!((acc[i] - expected).norm() < 1e-12, "particle {i}: {:?} vs {:?}", acc[i], expected);
    }
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn zero_step_changes_nothing() {
    for cfg in IntegratorConfig::ALL {
        let start = cluster_state();
        let mut integrator = build_integrator(cfg, start.clone(), AccelSet::gravity());

        integrator.step(0.0);

        let state = integrator.current_state(0.0).unwrap();
        assert_eq!(state.t, 0.0, "{cfg}");
        assert_eq!(state.positions(), start.positions(), "{cfg}");
        assert_eq!(state.velocities(), start.velocities(), "{cfg}");
        if let Some(history) = state.history() {
            assert!(history.is_empty(), "{cfg}: zero step recorded history");
        }
    }
}

#[test]
fn every_integrator_conserves_momentum() {
    for cfg in IntegratorConfig::ALL {
        let start = cluster_state();
        let p0 = total_momentum(&start);
        let mut integrator = build_integrator(cfg, start, AccelSet::gravity());

        // long enough to leave every multistep warm-up
        for _ in 0..40 {
            integrator.step(0.001);
        }

        let p = total_momentum(integrator.state());
        assert!((p - p0).norm() < 1e-10, "{cfg}: momentum drifted by {:e}", (p - p0).norm());
        assert!((integrator.current_time() - 0.04).abs() < 1e-12, "{cfg}");
    }
}

#[test]
fn opposite_momenta_stay_zero_every_step() {
    for cfg in IntegratorConfig::ALL {
        let mut integrator = build_integrator(cfg, circular_pair(), AccelSet::gravity());
        assert!(total_momentum(integrator.state()).norm() < 1e-12);

        for step in 1..=50 {
            integrator.step(0.01);
            let p = total_momentum(integrator.state()).norm();
            assert!(p < 1e-12, "{cfg}: |p| = {p:e} after step {step}");
        }
    }
}

#[test]
fn leapfrog_single_step_by_hand() {
    let dt = 0.01;
    let mut integrator = LeapfrogIntegrator::new(two_body_state(2.0, 1.0, 1.0, 1.0, 0.0), AccelSet::gravity());
    integrator.step(dt);
    let state = integrator.state();

    // a = G m / d^2 = 1/4 toward the other body
    let v_half = 0.5 * dt * 0.25;
    let x0 = -1.0 + dt * v_half;
    let d = -2.0 * x0;
    let a_new = 1.0 / (d * d);
    let v0 = v_half + 0.5 * dt * a_new;

    assert!((state.positions()[0].x - x0).abs() < 1e-15);
    assert!((state.positions()[1].x + x0).abs() < 1e-15);
    assert!((state.velocities()[0].x - v0).abs() < 1e-15);
    assert!((state.velocities()[1].x + v0).abs() < 1e-15);
    assert_eq!(state.positions()[0].y, 0.0);
    assert_eq!(state.t, dt);
}

#[test]
fn leapfrog_circular_pair_step_by_hand() {
    let dt = 0.01;
    let mut integrator = LeapfrogIntegrator::new(circular_pair(), AccelSet::gravity());
    integrator.step(dt);
    let state = integrator.state();

    // body 0 at (-1, 0) moving (0, -0.5); body 1 mirrors it through the origin
    // a_0 = G m / d^2 = 1/4 along +x
    let vx_half = 0.5 * dt * 0.25;
    let vy_half = -0.5;
    let x = -1.0 + dt * vx_half;
    let y = dt * vy_half;

    // separation is (-2x, -2y), a_0 = G m r / |r|^3
    let (rx, ry) = (-2.0 * x, -2.0 * y);
    let d = (rx * rx + ry * ry).sqrt();
    let (ax, ay) = (rx / (d * d * d), ry / (d * d * d));
    let vx = vx_half + 0.5 * dt * ax;
    let vy = vy_half + 0.5 * dt * ay;

    let (p0, p1) = (state.positions()[0], state.positions()[1]);
    let (v0, v1) = (state.velocities()[0], state.velocities()[1]);
    assert!((p0.x - x).abs() < 1e-15 && (p0.y - y).abs() < 1e-15, "{:?}", p0);
    assert!((p1.x + x).abs() < 1e-15 && (p1.y + y).abs() < 1e-15, "{:?}", p1);
    assert!((v0.x - vx).abs() < 1e-15 && (v0.y - vy).abs() < 1e-15, "{:?}", v0);
    assert!((v1.x + vx).abs() < 1e-15 && (v1.y + vy).abs() < 1e-15, "{:?}", v1);
    assert_eq!(p0.z, 0.0);
    assert_eq!(v0.z, 0.0);
    assert_eq!(state.t, dt);
}

fn max_energy_error(cfg: IntegratorConfig, steps: usize, dt: f64) -> f64 {
    let start = circular_pair();
    let e0 = total_energy(&start);
    let mut integrator = build_integrator(cfg, start, AccelSet::gravity());
    let mut worst: f64 = 0.0;
    for _ in 0..steps {
        integrator.step(dt);
        worst = worst.max(relative_energy_error(e0, total_energy(integrator.state())));
    }
    worst
}

#[test]
fn symplectic_energy_error_stays_bounded() {
    for cfg in [
        IntegratorConfig::Leapfrog,
        IntegratorConfig::Yoshida4,
        IntegratorConfig::Yoshida6,
        IntegratorConfig::Yoshida8,
    ] {
        let err = max_energy_error(cfg, 10_000, 0.001);
        assert!(err < 1e-6, "{cfg}: relative energy error {err:e}");
    }
}

#[test]
fn euler_energy_error_grows() {
    let start = circular_pair();
    let e0 = total_energy(&start);
    let mut integrator = build_integrator(IntegratorConfig::Euler, start, AccelSet::gravity());

    let mut samples = Vec::new();
    for step in 1..=10_000 {
        integrator.step(0.001);
        if step % 1000 == 0 {
            samples.push(relative_energy_error(e0, total_energy(integrator.state())));
        }
    }

    for pair in samples.windows(2) {
        assert!(pair[1] > pair[0], "Euler error not growing: {:?}", samples);
    }
    assert!(samples[samples.len() - 1] > 100.0 * max_energy_error(IntegratorConfig::Leapfrog, 10_000, 0.001));
}

#[test]
fn figure_eight_stays_bounded_under_leapfrog() {
    let scenario = scenario_from_yaml(
        r#"
engine:
  integrator: "leapfrog"
parameters:
  t_end: 19.0
  dt: 0.001
  G: 1.0
initial:
  kind: "figure_eight"
  n: 3
"#,
    )
    .unwrap();
    let e0 = total_energy(&scenario.state);
    let (mut integrator, parameters) = scenario.into_integrator();

    // about three periods of 6.3259
    for _ in 0..parameters.total_steps() {
        integrator.step(parameters.dt);
        for x in integrator.state().positions() {
            assert!(x.norm() < 2.0, "body escaped at t = {}", integrator.current_time());
        }
    }
    assert!(relative_energy_error(e0, total_energy(integrator.state())) < 1e-4);
}

fn orbit_error_after_one_period(cfg: IntegratorConfig, dt: f64) -> f64 {
    let mut integrator = build_integrator(cfg, circular_pair(), AccelSet::gravity());
    let steps = (4.0 * std::f64::consts::PI / dt).round() as usize;
    for _ in 0..steps {
        integrator.step(dt);
    }
    circular_orbit_error(integrator.state())
}

#[test]
fn rk4_and_yoshida_follow_circular_orbit() {
    let rk4 = orbit_error_after_one_period(IntegratorConfig::Rk4, 0.01);
    let leapfrog = orbit_error_after_one_period(IntegratorConfig::Leapfrog, 0.01);
    let yoshida4 = orbit_error_after_one_period(IntegratorConfig::Yoshida4, 0.01);

    assert!(rk4 < 1e-6, "rk4 error {rk4:e}");
    assert!(yoshida4 < 1e-6, "yoshida4 error {yoshida4:e}");
    assert!(yoshida4 < leapfrog, "yoshida4 {yoshida4:e} not better than leapfrog {leapfrog:e}");
}

#[test]
fn multistep_schemes_follow_circular_orbit() {
    for cfg in [
        IntegratorConfig::Ms2,
        IntegratorConfig::Ms4,
        IntegratorConfig::Ms4pc,
        IntegratorConfig::Ms6,
        IntegratorConfig::Ms8,
    ] {
        let err = orbit_error_after_one_period(cfg, 0.01);
        assert!(err < 1e-3, "{cfg}: orbit error {err:e}");
    }
    let ms2 = orbit_error_after_one_period(IntegratorConfig::Ms2, 0.01);
    let ms4 = orbit_error_after_one_period(IntegratorConfig::Ms4, 0.01);
    assert!(ms4 < ms2, "ms4 {ms4:e} not better than ms2 {ms2:e}");
}

#[test]
fn multistep_warm_up_fills_history() {
    for (flavor, depth) in [
        (MultiStepFlavor::Ms2, 1),
        (MultiStepFlavor::Ms4, 3),
        (MultiStepFlavor::Ms4pc, 3),
        (MultiStepFlavor::Ms6, 5),
        (MultiStepFlavor::Ms8, 7),
    ] {
        let mut integrator = MultiStepIntegrator::new(circular_pair(), AccelSet::gravity(), flavor);
        assert!(integrator.is_warming_up());

        for k in 1..depth {
            integrator.step(0.01);
            assert!(integrator.is_warming_up(), "{flavor:?} left warm-up after {k} steps");
            assert_eq!(integrator.state().history().map(|h| h.len()), Some(k));
        }
        integrator.step(0.01);
        assert!(!integrator.is_warming_up(), "{flavor:?} still warming up");

        // steady state keeps the history at full depth
        integrator.step(0.01);
        integrator.step(0.01);
        assert!(!integrator.is_warming_up());
        assert_eq!(integrator.state().history().map(|h| h.len()), Some(depth));
    }
}

#[test]
fn leapfrog_reuses_cached_accelerations() {
    let calls = Arc::new(AtomicUsize::new(0));
    let forces = AccelSet::new().with(CountingGravity { calls: Arc::clone(&calls) });
    let mut integrator = LeapfrogIntegrator::new(cluster_state(), forces);

    for _ in 0..10 {
        integrator.step(0.001);
    }
    // one start-up evaluation, then one per step
    assert_eq!(calls.load(Ordering::SeqCst), 11);
}

#[test]
fn changing_g_forces_fresh_accelerations() {
    let calls = Arc::new(AtomicUsize::new(0));
    let forces = AccelSet::new().with(CountingGravity { calls: Arc::clone(&calls) });
    let mut state = cluster_state();

    leapfrog_step(&mut state, &forces, 0.001);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    state.G = 2.0;
    leapfrog_step(&mut state, &forces, 0.001);
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    // unchanged constants reuse the end-of-step cache again
    leapfrog_step(&mut state, &forces, 0.001);
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[test]
fn moving_positions_invalidates_cache() {
    let forces = AccelSet::gravity();
    let mut state = cluster_state();
    let a = forces.accels(&state);
    state.store_accels(a);
    assert!(state.cached_accels().is_some());

    state.positions_mut()[0].x += 0.5;
    assert!(state.cached_accels().is_none());
}

#[test]
fn state_at_other_time_is_unavailable() {
    let mut integrator = build_integrator(IntegratorConfig::Rk4, circular_pair(), AccelSet::gravity());
    integrator.step(0.1);

    assert!(integrator.current_state(0.1).is_ok());
    let err = integrator.current_state(0.0).unwrap_err();
    assert!(matches!(err, SimError::TimeUnavailable { .. }), "{err}");
}

#[test]
fn negative_step_runs_backwards() {
    let mut integrator = build_integrator(IntegratorConfig::Yoshida4, circular_pair(), AccelSet::gravity());
    for _ in 0..100 {
        integrator.step(0.01);
    }
    for _ in 0..100 {
        integrator.step(-0.01);
    }
    let state = integrator.state();
    assert!(state.t.abs() < 1e-12);
    assert!((state.positions()[0] - NVec3::new(-1.0, 0.0, 0.0)).norm() < 1e-9);
}

// ==================================================================================
// Record codec tests
// ==================================================================================

#[test]
fn record_round_trip_is_exact() {
    let mut state = cluster_state();
    state.t = 0.123_456_789_012_345_6;

    let mut buf = Vec::new();
    write_record(&mut buf, &state).unwrap();
    write_record(&mut buf, &state).unwrap();

    let records = read_trajectory(buf.as_slice());
    assert_eq!(records.len(), 2);
    let back = &records[1].state;
    assert_eq!(back.t, state.t);
    assert_eq!(back.G, state.G);
    assert_eq!(back.eps, state.eps);
    assert_eq!(back.mass(), state.mass());
    assert_eq!(back.positions(), state.positions());
    assert_eq!(back.velocities(), state.velocities());
    let stored = records[0].kinetic_energy + records[0].potential_energy;
    assert!((stored - total_energy(&state)).abs() < 1e-14 * stored.abs());
}

#[test]
fn record_reader_ignores_comments_and_blank_lines() {
    let text = "# header comment\n\
                0.5   # t\n\
                \n\
                1     # N\n\
                1.0\n\
                0.0\n\
                0.0\n\
                0.0\n\
                # masses follow\n\
                2.5\n\
                1 2 3   # position\n\
                -1 -2 -3\n";
    let mut reader = RecordReader::new(text.as_bytes());
    let record = reader.read_record().unwrap().unwrap();

    assert_eq!(record.state.t, 0.5);
    assert_eq!(record.state.mass(), &[2.5]);
    assert_eq!(record.state.positions()[0], NVec3::new(1.0, 2.0, 3.0));
    assert_eq!(record.state.velocities()[0], NVec3::new(-1.0, -2.0, -3.0));
    assert!(reader.read_record().unwrap().is_none());
}

#[test]
fn truncated_trailing_record_is_dropped() {
    let state = circular_pair();
    let mut buf = Vec::new();
    write_record(&mut buf, &state).unwrap();
    write_record(&mut buf, &state).unwrap();
    buf.extend_from_slice(b"0.5\n2\n1.0\n");

    let records = read_trajectory(buf.as_slice());
    assert_eq!(records.len(), 2);

    let mut reader = RecordReader::new(buf.as_slice());
    assert!(reader.next().unwrap().is_ok());
    assert!(reader.next().unwrap().is_ok());
    assert!(matches!(reader.next(), Some(Err(SimError::MalformedRecord { .. }))));
    assert!(reader.next().is_none());
}

#[test]
fn oversized_particle_count_ends_read_cleanly() {
    let state = circular_pair();
    let mut buf = Vec::new();
    write_record(&mut buf, &state).unwrap();
    buf.extend_from_slice(b"0.0\n18446744073709551615\n1.0\n0.0\n0.0\n0.0\n");

    let records = read_trajectory(buf.as_slice());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].state.positions(), state.positions());

    let mut reader = RecordReader::new(buf.as_slice());
    assert!(reader.next().unwrap().is_ok());
    match reader.next() {
        Some(Err(SimError::MalformedRecord { reason, .. })) => assert!(reason.contains("mass"), "{reason}"),
        other => panic!("expected a malformed record, got {:?}", other.map(|r| r.map(|rec| rec.state.t))),
    }
}

#[test]
fn non_numeric_field_reports_line() {
    let text = "0.0 # t\n1\n1.0\n0.0\n0.0\n0.0\n1.0\nabc 0 0\n0 0 0\n";
    let err = RecordReader::new(text.as_bytes()).read_record().unwrap_err();
    match err {
        SimError::MalformedRecord { line, .. } => assert_eq!(line, 8),
        other => panic!("unexpected error: {other}"),
    }
}

// ==================================================================================
// Scenario and run loop tests
// ==================================================================================

#[test]
fn figure_eight_rejects_wrong_count() {
    let result = scenario_from_yaml(
        r#"
engine:
  integrator: "leapfrog"
parameters:
  t_end: 1.0
  dt: 0.01
  G: 1.0
initial:
  kind: "figure_eight"
  n: 5
"#,
    );
    assert!(matches!(result, Err(SimError::Config(_))));
}

#[test]
fn negative_wall_clock_limit_is_rejected() {
    for limit in ["-1.0", ".nan"] {
        let result = scenario_from_yaml(&format!(
            r#"
engine:
  integrator: "leapfrog"
parameters:
  t_end: 1.0
  dt: 0.01
  G: 1.0
  wall_clock_limit: {limit}
initial:
  kind: "two_body"
  n: 2
"#
        ));
        assert!(matches!(result, Err(SimError::Config(_))), "limit {limit}");
    }
}

#[test]
fn bodies_list_must_match_count() {
    let result = scenario_from_yaml(
        r#"
engine:
  integrator: "rk4"
parameters:
  t_end: 1.0
  dt: 0.01
  G: 1.0
initial:
  kind: "bodies"
  n: 3
bodies:
  - { x: [0.0, 0.0, 0.0], v: [0.0, 0.0, 0.0], m: 1.0 }
  - { x: [1.0, 0.0, 0.0], v: [0.0, 1.0, 0.0], m: 0.001 }
"#,
    );
    assert!(matches!(result, Err(SimError::Config(_))));
}

#[test]
fn cold_collapse_is_seeded_and_centred() {
    let yaml = r#"
engine:
  integrator: "yoshida6"
parameters:
  t_end: 1.0
  dt: 0.01
  G: 1.0
  eps: 0.05
initial:
  kind: "cold_collapse"
  n: 64
  seed: 7
"#;
    let a = scenario_from_yaml(yaml).unwrap();
    let b = scenario_from_yaml(yaml).unwrap();
    assert_eq!(a.state.positions(), b.state.positions());

    let com: NVec3 = a
        .state
        .positions()
        .iter()
        .zip(a.state.mass())
        .map(|(x, m)| *x * *m)
        .sum();
    assert!(com.norm() < 1e-12);
}

const RUN_YAML: &str = r#"
engine:
  integrator: "leapfrog"
parameters:
  t_end: 0.1
  dt: 0.01
  G: 1.0
  output_every: 3
initial:
  kind: "two_body"
  n: 2
"#;

#[test]
fn run_writes_initial_periodic_and_final_records() {
    let (mut integrator, parameters) = scenario_from_yaml(RUN_YAML).unwrap().into_integrator();
    let mut buf: Vec<u8> = Vec::new();
    let stop = AtomicBool::new(false);

    let summary = run(integrator.as_mut(), &parameters, Some(&mut buf as &mut dyn Write), &stop).unwrap();

    // t = 0, steps 3, 6, 9 and the last step 10
    assert_eq!(summary.steps, 10);
    assert_eq!(summary.records_written, 5);
    assert!(!summary.stopped_early);
    assert!((summary.final_time - 0.1).abs() < 1e-12);

    let records = read_trajectory(buf.as_slice());
    assert_eq!(records.len(), 5);
    assert_eq!(records[0].state.t, 0.0);
    assert!((records[4].state.t - 0.1).abs() < 1e-12);
}

#[test]
fn run_honours_stop_flag() {
    let (mut integrator, parameters) = scenario_from_yaml(RUN_YAML).unwrap().into_integrator();
    let stop = AtomicBool::new(true);

    let summary = run(integrator.as_mut(), &parameters, None, &stop).unwrap();

    assert_eq!(summary.steps, 0);
    assert!(summary.stopped_early);
    assert_eq!(summary.final_time, 0.0);
}
