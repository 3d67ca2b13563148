//! The simulation-type identifier tag: `<B><D><P><MAC><EF><PSH>`, e.g.
//! `O2QOPC21` = open, 2D, quadrupole, opening-angle MAC, Plummer softening,
//! order-2 composition. Used only for labeling snapshots and for
//! [`SimError::SimulationTypeUnknown`]; it does not gate which
//! `(dimension, order, MAC, composition)` combinations this library
//! compiles — all of them do, since this is a library, not the grounding
//! source's `teatree` binary with its `available_simulations` registry.

use crate::config::Boundary;
use crate::error::SimError;
use crate::integrator::CompositionOrder;
use crate::mac::Mac;
use crate::moments::MultipoleOrder;
use std::fmt;
use std::str::FromStr;

/// A parsed `<B><D><P><MAC><EF><PSH>` tag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationTag {
    pub boundary_open: bool,
    pub dim: usize,
    pub order: MultipoleOrder,
    pub mac_opening_angle: bool,
    pub composition: CompositionOrder,
}

impl SimulationTag {
    pub fn new(boundary: Boundary, dim: usize, order: MultipoleOrder, mac: Mac, composition: CompositionOrder) -> Self {
        Self {
            boundary_open: matches!(boundary, Boundary::Open),
            dim,
            order,
            mac_opening_angle: matches!(mac, Mac::OpeningAngle { .. }),
            composition,
        }
    }
}

impl fmt::Display for SimulationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = if self.boundary_open { 'O' } else { 'R' };
        let mac = if self.mac_opening_angle { 'O' } else { 'M' };
        write!(f, "{b}{}{}{mac}P{}", self.dim, self.order.tag(), self.composition.tag())
    }
}

impl FromStr for SimulationTag {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, SimError> {
        let bytes = s.as_bytes();
        // "B" "D" "P" "MAC" "EF" "PSH": 1+1+1+1+1+3 = 8 characters.
        if bytes.len() != 8 {
            return Err(unknown(s));
        }
        let boundary_open = match bytes[0] {
            b'O' => true,
            b'R' => false,
            _ => return Err(unknown(s)),
        };
        let dim = match bytes[1] {
            b'2' => 2,
            b'3' => 3,
            _ => return Err(unknown(s)),
        };
        let order = match bytes[2] {
            b'M' => MultipoleOrder::Monopole,
            b'D' => MultipoleOrder::Dipole,
            b'Q' => MultipoleOrder::Quadrupole,
            b'O' => MultipoleOrder::Octupole,
            _ => return Err(unknown(s)),
        };
        let mac_opening_angle = match bytes[3] {
            b'O' => true,
            b'M' => false,
            _ => return Err(unknown(s)),
        };
        if bytes[4] != b'P' {
            return Err(unknown(s));
        }
        let composition = match &s[5..8] {
            "C21" => CompositionOrder::Two,
            "C43" => CompositionOrder::Four,
            "C67" => CompositionOrder::Six,
            _ => return Err(unknown(s)),
        };

        Ok(Self { boundary_open, dim, order, mac_opening_angle, composition })
    }
}

fn unknown(s: &str) -> SimError {
    SimError::SimulationTypeUnknown { tag: s.to_string() }
}
