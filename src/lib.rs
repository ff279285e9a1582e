pub mod error;
pub mod simulation;
pub mod configuration;
pub mod output;
pub mod benchmark;

pub use error::SimError;

pub use simulation::states::{NVec3, ParticleState, AccelHistory};
pub use simulation::forces::{Acceleration, AccelSet, NewtonianGravity};
pub use simulation::diagnostics::{kinetic_energy, potential_energy, total_energy, total_momentum};
pub use simulation::integrator::{build_integrator, Integrator};
pub use simulation::engine::{run, RunSummary};
pub use simulation::scenario::Scenario;

pub use configuration::config::{IntegratorConfig, EngineConfig, ParametersConfig, BodyConfig, ScenarioConfig};

pub use output::record::{write_record, read_trajectory, Record, RecordReader};

pub use benchmark::benchmark::{bench_kernel, bench_integrators, bench_kernel_curve};
