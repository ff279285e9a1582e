use nbsim::{ScenarioConfig, Scenario, IntegratorConfig};
use nbsim::{bench_kernel, bench_integrators, bench_kernel_curve};

use clap::Parser;
use anyhow::{bail, Context, Result};
use log::info;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

#[derive(Parser, Debug)]
#[command(about = "Direct-summation N-body integrator")]
struct Args {
    /// Scenario file, as given or under scenarios/
    #[arg(short, default_value = "figure_eight.yaml")]
    file_name: String,

    /// Override the scenario's integrator
    #[arg(short, long)]
    integrator: Option<IntegratorConfig>,

    /// Run a benchmark instead: kernel, integrators or curve
    #[arg(long)]
    bench: Option<String>,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let direct = PathBuf::from(file_name);
    let config_path = if direct.exists() {
        direct
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
    };
    ScenarioConfig::load(&config_path)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(which) = args.bench.as_deref() {
        match which {
            "kernel" => bench_kernel(),
            "integrators" => bench_integrators(),
            "curve" => bench_kernel_curve(),
            other => bail!("unknown benchmark '{other}' (kernel, integrators, curve)"),
        }
        return Ok(());
    }

    let mut scenario_cfg = load_scenario_from_yaml(&args.file_name)
        .context("failed to load scenario")?;
    if let Some(integrator) = args.integrator {
        scenario_cfg.engine.integrator = integrator;
    }

    let scenario = Scenario::build_scenario(&scenario_cfg)?;
    let (mut integrator, parameters) = scenario.into_integrator();

    let mut sink: Option<BufWriter<File>> = match &scenario_cfg.output.trajectory {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create trajectory file {path}"))?;
            Some(BufWriter::new(file))
        }
        None => None,
    };

    let stop = AtomicBool::new(false);
    let summary = nbsim::run(
        integrator.as_mut(),
        &parameters,
        sink.as_mut().map(|w| w as &mut dyn Write),
        &stop,
    )?;

    info!(
        "done: t = {:.6}, {} steps, {} records, E0 = {:.12e}, E = {:.12e}, max dE/E = {:.3e}{}",
        summary.final_time,
        summary.steps,
        summary.records_written,
        summary.initial_energy,
        summary.final_energy,
        summary.max_relative_energy_error,
        if summary.stopped_early { " (stopped early)" } else { "" }
    );

    Ok(())
}
