//! Validated simulation options (component M), covering the recognized
//! configuration options of the simulator. Loading these from a CLI or
//! config file is an external concern; this module only owns the
//! in-memory representation and its constructor-time invariants.

use crate::error::SimError;
use std::collections::BTreeSet;

/// Domain boundary applied once per macro-step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Boundary {
    /// No-op: particles may leave the simulated region freely.
    Open,
    /// Elastic reflection at `min_bound`/`max_bound` on every axis,
    /// without clamping position.
    Reflective { min_bound: f64, max_bound: f64 },
}

impl Boundary {
    /// One-letter tag used by [`crate::tag::SimulationTag`] (`O`/`R`).
    pub fn tag(self) -> char {
        match self {
            Boundary::Open => 'O',
            Boundary::Reflective { .. } => 'R',
        }
    }
}

/// The full set of recognized simulation options.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationOptions {
    /// Plummer softening length, applied to all direct leaf interactions.
    pub epsilon: f64,
    /// MAC parameter; 0 disables the multipole approximation entirely.
    pub theta: f64,
    /// Integrator macro-step size.
    pub dt: f64,
    /// Debye-sphere/circle population, used in acceleration normalization.
    pub nd: f64,
    /// `|q/m|` below which a particle is treated as immobile.
    pub qtom_cutoff: f64,
    pub boundary: Boundary,
    /// 1-based iteration indices at which a snapshot is written.
    pub output_steps: BTreeSet<usize>,
    /// Snapshot filename prefix (`<basename>-<iter>.txt`).
    pub output_basename: String,
    /// Whether written snapshots include the column-heading line.
    pub output_header: bool,
}

impl SimulationOptions {
    /// Validates the option invariants, rejecting out-of-domain values as
    /// `InvalidParameter`.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.epsilon > 0.0) {
            return Err(invalid("epsilon", format!("must be > 0, got {}", self.epsilon)));
        }
        if !(self.theta >= 0.0) {
            return Err(invalid("theta", format!("must be >= 0, got {}", self.theta)));
        }
        if !(self.dt > 0.0) {
            return Err(invalid("dt", format!("must be > 0, got {}", self.dt)));
        }
        if !(self.nd > 0.0) {
            return Err(invalid("nd", format!("must be > 0, got {}", self.nd)));
        }
        if let Boundary::Reflective { min_bound, max_bound } = self.boundary {
            if !(min_bound < max_bound) {
                return Err(invalid(
                    "min_bound",
                    format!("reflective boundary requires min_bound < max_bound, got {min_bound} >= {max_bound}"),
                ));
            }
        }
        if !self.output_steps.is_empty() && self.output_basename.is_empty() {
            return Err(invalid("output_basename", "must be non-empty when output_steps is non-empty".to_string()));
        }
        Ok(())
    }

    /// Whether iteration `iter` (1-based) should write a snapshot.
    pub fn should_snapshot(&self, iter: usize) -> bool {
        self.output_steps.contains(&iter)
    }
}

fn invalid(name: &'static str, reason: String) -> SimError {
    SimError::InvalidParameter { name, reason }
}

/// Applies the reflective-boundary constraint to one axis of one
/// particle's position/velocity: elastic reflection, no position
/// clamping, exact kinetic-energy preservation.
pub fn reflect_axis(r: f64, v: f64, min_bound: f64, max_bound: f64) -> f64 {
    if (r < min_bound && v < 0.0) || (r > max_bound && v > 0.0) {
        -v
    } else {
        v
    }
}
