//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]      – which integrator advances the state
//! - [`ParametersConfig`]  – step size, end time, physical constants, output cadence
//! - [`InitialConfig`]     – which initial-condition generator populates the state
//! - [`BodyConfig`]        – explicit initial state for each body (`kind: bodies`)
//! - [`OutputConfig`]      – where the trajectory records go
//! - [`ScenarioConfig`]    – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   integrator: "leapfrog"  # euler, leapfrog, rk2, rk4, yoshida4/6/8, ms2, ms4, ms4pc, ms6, ms8
//!
//! parameters:
//!   t_end: 12.5             # total simulation time
//!   dt: 0.001               # fixed step size
//!   G: 1.0                  # gravitational constant
//!   eps: 0.0                # softening length
//!   output_every: 50        # steps between diagnostics / records
//!   wall_clock_limit: 60.0  # optional, seconds
//!
//! initial:
//!   kind: "two_body"        # two_body, figure_eight, ring, cold_collapse, bodies
//!   n: 2
//!
//! output:
//!   trajectory: "two_body.txt"
//! ```
//!
//! With `kind: bodies` the state comes from the `bodies` list:
//!
//! ```yaml
//! bodies:
//!   - x: [ -1.0, 0.0, 0.0 ]
//!     v: [  0.0, -0.5, 0.0 ]
//!     m: 1.0
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Which integrator the engine uses
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorConfig {
    #[serde(rename = "euler")] // explicit Euler, first order, baseline only
    Euler,

    #[serde(rename = "leapfrog", alias = "verlet")] // kick-drift-kick, symplectic, second order
    Leapfrog,

    #[serde(rename = "rk2")] // explicit midpoint
    Rk2,

    #[serde(rename = "rk4")] // classical four-stage Runge-Kutta, not symplectic
    Rk4,

    #[serde(rename = "yoshida4")] // symplectic leapfrog compositions
    Yoshida4,

    #[serde(rename = "yoshida6")]
    Yoshida6,

    #[serde(rename = "yoshida8")]
    Yoshida8,

    #[serde(rename = "ms2")] // multistep predictors, need a warm-up phase
    Ms2,

    #[serde(rename = "ms4")]
    Ms4,

    #[serde(rename = "ms4pc")] // fourth-order predictor-corrector
    Ms4pc,

    #[serde(rename = "ms6")]
    Ms6,

    #[serde(rename = "ms8")]
    Ms8,
}

impl IntegratorConfig {
    pub const ALL: [IntegratorConfig; 12] = [
        IntegratorConfig::Euler,
        IntegratorConfig::Leapfrog,
        IntegratorConfig::Rk2,
        IntegratorConfig::Rk4,
        IntegratorConfig::Yoshida4,
        IntegratorConfig::Yoshida6,
        IntegratorConfig::Yoshida8,
        IntegratorConfig::Ms2,
        IntegratorConfig::Ms4,
        IntegratorConfig::Ms4pc,
        IntegratorConfig::Ms6,
        IntegratorConfig::Ms8,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IntegratorConfig::Euler => "euler",
            IntegratorConfig::Leapfrog => "leapfrog",
            IntegratorConfig::Rk2 => "rk2",
            IntegratorConfig::Rk4 => "rk4",
            IntegratorConfig::Yoshida4 => "yoshida4",
            IntegratorConfig::Yoshida6 => "yoshida6",
            IntegratorConfig::Yoshida8 => "yoshida8",
            IntegratorConfig::Ms2 => "ms2",
            IntegratorConfig::Ms4 => "ms4",
            IntegratorConfig::Ms4pc => "ms4pc",
            IntegratorConfig::Ms6 => "ms6",
            IntegratorConfig::Ms8 => "ms8",
        }
    }
}

impl fmt::Display for IntegratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IntegratorConfig {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "verlet" {
            return Ok(IntegratorConfig::Leapfrog);
        }
        IntegratorConfig::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| format!("unknown integrator '{s}'"))
    }
}

/// High-level engine configuration
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct EngineConfig {
    pub integrator: IntegratorConfig, // Time integrator used for advancing the state
}

/// Global numerical and physical parameters for a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ParametersConfig {
    pub t_end: f64, // time end
    pub dt: f64,    // fixed time step
    pub G: f64,     // gravitational constant
    #[serde(default)]
    pub eps: f64, // softening length
    #[serde(default = "default_output_every")]
    pub output_every: u64, // steps between diagnostics and records
    #[serde(default)]
    pub wall_clock_limit: Option<f64>, // seconds
}

fn default_output_every() -> u64 {
    1
}

/// Initial-condition generators
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InitialKind {
    TwoBody,     // two unit masses on a circular orbit, extra bodies as light satellites
    FigureEight, // three-body choreography, exactly 3 bodies
    Ring,        // equal masses on a circle with circular velocity
    ColdCollapse, // uniform sphere at rest
    Bodies,      // explicit `bodies` list
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct InitialConfig {
    pub kind: InitialKind,
    pub n: usize, // declared particle count
    #[serde(default)]
    pub seed: u64, // deterministic seed for random generators
}

/// Configuration for a single body's initial state
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: Vec<f64>, // Initial position
    pub v: Vec<f64>, // Initial velocity
    pub m: f64,      // Mass of the body
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub trajectory: Option<String>, // text record file, none = diagnostics only
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    pub parameters: ParametersConfig,
    pub initial: InitialConfig,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl ScenarioConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: ScenarioConfig = serde_yaml::from_str(text).context("invalid scenario YAML")?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario file {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {}", path.display()))
    }
}
