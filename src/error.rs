//! Error type shared by the state, integrator and record layers.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum SimError {
    /// Initial conditions or configuration inconsistent with the declared particle count.
    Config(String),
    /// An integrator was asked for a state at a time it does not hold.
    TimeUnavailable { requested: f64, current: f64 },
    /// A text record could not be parsed (1-based line number within the input).
    MalformedRecord { line: usize, reason: String },
    Io(io::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Config(msg) => write!(f, "configuration error: {msg}"),
            SimError::TimeUnavailable { requested, current } => write!(
                f,
                "no state for t = {requested}, integrator holds t = {current}"
            ),
            SimError::MalformedRecord { line, reason } => {
                write!(f, "malformed record at line {line}: {reason}")
            }
            SimError::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SimError {
    fn from(err: io::Error) -> Self {
        SimError::Io(err)
    }
}
