//! Particle records (component B).
//!
//! A [`Particle`] is immutable in its charge and charge/mass ratio; only
//! its position and velocity are overwritten between integrator steps.

use crate::dim::Dim;
use crate::error::SimError;

/// A point charge: position, velocity, charge and charge/mass ratio.
///
/// `r` and `v` are overwritten every integrator step; `q` and `qtom` are
/// fixed at construction and never change afterward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle<Dm: Dim> {
    /// Position.
    pub r: Dm::Vector,
    /// Velocity.
    pub v: Dm::Vector,
    /// Charge (never zero).
    q: f64,
    /// Charge-to-mass ratio `q / m`.
    qtom: f64,
}

impl<Dm: Dim> Particle<Dm> {
    /// Constructs a particle from position, velocity, charge and mass.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidParameter`] if `m <= 0` or `q == 0`.
    pub fn new(r: Dm::Vector, v: Dm::Vector, q: f64, m: f64) -> Result<Self, SimError> {
        if !(m > 0.0) {
            return Err(SimError::InvalidParameter {
                name: "m",
                reason: format!("mass must be > 0, got {m}"),
            });
        }
        if q == 0.0 {
            return Err(SimError::InvalidParameter {
                name: "q",
                reason: "charge must be nonzero".to_string(),
            });
        }

        Ok(Self {
            r,
            v,
            q,
            qtom: q / m,
        })
    }

    /// The particle's charge.
    #[inline]
    pub fn q(&self) -> f64 {
        self.q
    }

    /// The particle's charge-to-mass ratio.
    #[inline]
    pub fn qtom(&self) -> f64 {
        self.qtom
    }

    /// The particle's mass, recovered from `q` and `qtom`.
    #[inline]
    pub fn mass(&self) -> f64 {
        self.q / self.qtom
    }
}
