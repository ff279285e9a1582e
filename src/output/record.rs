//! Plain-text state records.
//!
//! One record per snapshot, one field per line, `#` starting a comment:
//!
//! ```text
//! <t>          # simulation time
//! <N>          # particle count
//! <G>          # gravitational constant
//! <eps>        # softening length
//! <Ekin>       # kinetic energy at write time
//! <Epot>       # potential energy at write time
//! <m_i>        N lines
//! <x y z>      N lines
//! <vx vy vz>   N lines
//! ```
//!
//! Records are concatenated into a trajectory. Floats are written in Rust's
//! shortest round-trip form, so reading a record back reproduces every value.

use std::io::{self, BufRead, Write};

use log::warn;

use crate::error::SimError;
use crate::simulation::diagnostics::{kinetic_energy, potential_energy};
use crate::simulation::states::{NVec3, ParticleState};

/// A parsed record: the state plus the energies cached at write time.
#[derive(Debug, Clone)]
pub struct Record {
    pub state: ParticleState,
    pub kinetic_energy: f64,
    pub potential_energy: f64,
}

/// Append one record for `state` to `w`.
pub fn write_record<W: Write + ?Sized>(w: &mut W, state: &ParticleState) -> io::Result<()> {
    let ekin = kinetic_energy(state);
    let epot = potential_energy(state);

    writeln!(w, "{}\t# t", state.t)?;
    writeln!(w, "{}\t# N", state.n())?;
    writeln!(w, "{}\t# G", state.G)?;
    writeln!(w, "{}\t# eps", state.eps)?;
    writeln!(w, "{}\t# Ekin", ekin)?;
    writeln!(w, "{}\t# Epot", epot)?;
    for m in state.mass() {
        writeln!(w, "{}", m)?;
    }
    for x in state.positions() {
        writeln!(w, "{} {} {}", x.x, x.y, x.z)?;
    }
    for v in state.velocities() {
        writeln!(w, "{} {} {}", v.x, v.y, v.z)?;
    }
    Ok(())
}

/// Text before the first `#`, trimmed.
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => line[..idx].trim(),
        None => line.trim(),
    }
}

fn parse_f64(line: usize, text: &str, what: &str) -> Result<f64, SimError> {
    text.parse::<f64>().map_err(|_| SimError::MalformedRecord {
        line,
        reason: format!("{what}: '{text}' is not a number"),
    })
}

fn parse_vec3(line: usize, text: &str, what: &str) -> Result<NVec3, SimError> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(SimError::MalformedRecord {
            line,
            reason: format!("{what}: expected 3 components, found {}", parts.len()),
        });
    }
    Ok(NVec3::new(
        parse_f64(line, parts[0], what)?,
        parse_f64(line, parts[1], what)?,
        parse_f64(line, parts[2], what)?,
    ))
}

/// Sequential reader over concatenated records.
///
/// As an iterator it yields records until the input ends cleanly or a record
/// fails to parse; after the first error it yields nothing more.
pub struct RecordReader<R> {
    lines: io::Lines<R>,
    line_no: usize,
    failed: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            failed: false,
        }
    }

    /// Next non-empty field with its line number, skipping blank and comment-only lines.
    fn next_field(&mut self) -> Result<Option<(usize, String)>, SimError> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            let field = strip_comment(&line);
            if !field.is_empty() {
                return Ok(Some((self.line_no, field.to_string())));
            }
        }
        Ok(None)
    }

    fn expect_field(&mut self, what: &str) -> Result<(usize, String), SimError> {
        self.next_field()?.ok_or_else(|| SimError::MalformedRecord {
            line: self.line_no,
            reason: format!("input ended while reading {what}"),
        })
    }

    /// Read one record. `Ok(None)` means the input ended before a new record began.
    pub fn read_record(&mut self) -> Result<Option<Record>, SimError> {
        let Some((line, text)) = self.next_field()? else {
            return Ok(None);
        };
        let t = parse_f64(line, &text, "t")?;

        let (line, text) = self.expect_field("N")?;
        let n: usize = text.parse().map_err(|_| SimError::MalformedRecord {
            line,
            reason: format!("N: '{text}' is not a particle count"),
        })?;

        let (line, text) = self.expect_field("G")?;
        let g = parse_f64(line, &text, "G")?;
        let (line, text) = self.expect_field("eps")?;
        let eps = parse_f64(line, &text, "eps")?;
        let (line, text) = self.expect_field("Ekin")?;
        let ekin = parse_f64(line, &text, "Ekin")?;
        let (line, text) = self.expect_field("Epot")?;
        let epot = parse_f64(line, &text, "Epot")?;

        // N is untrusted until the arrays are actually read
        let mut mass = Vec::new();
        for _ in 0..n {
            let (line, text) = self.expect_field("mass")?;
            mass.push(parse_f64(line, &text, "mass")?);
        }
        let mut position = Vec::new();
        for _ in 0..n {
            let (line, text) = self.expect_field("position")?;
            position.push(parse_vec3(line, &text, "position")?);
        }
        let mut velocity = Vec::new();
        for _ in 0..n {
            let (line, text) = self.expect_field("velocity")?;
            velocity.push(parse_vec3(line, &text, "velocity")?);
        }

        let state = ParticleState::from_parts(t, g, eps, mass, position, velocity)?;
        Ok(Some(Record {
            state,
            kinetic_energy: ekin,
            potential_energy: epot,
        }))
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record, SimError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Every complete record in `reader`. A truncated or corrupt record ends the
/// read; the records before it are kept.
pub fn read_trajectory<R: BufRead>(reader: R) -> Vec<Record> {
    let mut records = Vec::new();
    for item in RecordReader::new(reader) {
        match item {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!("stopping trajectory read after {} records: {}", records.len(), err);
                break;
            }
        }
    }
    records
}
