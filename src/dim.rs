//! Dimension markers tying together a [`VectorOps`] type and its
//! [`Moments`](crate::moments::Moments) type for 2D and 3D.
//!
//! The core algorithms (partitioning, tree construction, the visitor
//! framework, the integrator) are written once, generic over `Dm: Dim`;
//! only the moment-shift and field-evaluation formulas (genuinely
//! different polynomials per dimension) are implemented per concrete
//! dimension in [`crate::moments`] and [`crate::field`].

use crate::moments::{Moments, Moments2, Moments3};
use crate::vector::{Vector2, Vector3, VectorOps};

/// A spatial dimension (2 or 3) and the concrete types that go with it.
pub trait Dim: Copy + Clone + Send + Sync + std::fmt::Debug + 'static {
    /// Number of spatial dimensions.
    const D: usize;

    /// Number of orthants a branch subdivides into (`2^D`).
    const ORTHANTS: usize;

    /// The vector type used for positions, velocities and accelerations.
    type Vector: VectorOps;

    /// The multipole moment record for this dimension.
    type Moments: Moments<Vector = Self::Vector>;
}

/// The 2D instantiation of the simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct D2;

impl Dim for D2 {
    const D: usize = 2;
    const ORTHANTS: usize = 4;
    type Vector = Vector2;
    type Moments = Moments2;
}

/// The 3D instantiation of the simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct D3;

impl Dim for D3 {
    const D: usize = 3;
    const ORTHANTS: usize = 8;
    type Vector = Vector3;
    type Moments = Moments3;
}
