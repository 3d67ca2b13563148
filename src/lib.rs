//! # teatree
//!
//! An N-body electrostatic (Coulomb/Plummer) simulator for collisionless
//! plasmas of point charges in 2D or 3D, built around a Barnes–Hut
//! orthant-partitioned tree and multipole acceleration truncated at a
//! configurable order (monopole through octupole).
//!
//! The core is three tightly coupled subsystems:
//!
//! 1. The spatial tree ([`partition`], [`tree`]): orthant partitioning and
//!    a 2ᵈ-ary tree built fresh every sub-step from a [`bumpalo`] arena.
//! 2. Multipole aggregation ([`moments`]): upward-shifted monopole,
//!    dipole, quadrupole and octupole moments at every branch.
//! 3. Field evaluation and time integration ([`mac`], [`field`], [`accel`],
//!    [`integrator`]): a dual-dispatch visitor ([`visitor`]) traverses the
//!    tree, accepting branches whose multipole-acceptance criterion
//!    passes and falling back to a softened direct sum at leaves, and a
//!    symmetric composition position-Verlet integrator advances the
//!    system using the resulting field.
//!
//! [`config`], [`io`], [`tag`] and [`simulation`] wire these into a
//! runnable driver: validated options, the particle text I/O column
//! contract, the `<B><D><P><MAC><EF><PSH>` simulation-type tag, and a
//! thin `step`/`run` orchestration type.

#![warn(missing_docs)]

/// Acceleration pass: one tree build plus a parallel field sweep.
pub mod accel;

/// Validated simulation options.
pub mod config;

/// Dimension markers tying together a vector type and a moments type.
pub mod dim;

/// Error kinds for the simulator core.
pub mod error;

/// The field evaluator: a reducing tree visitor.
pub mod field;

/// The symmetric composition position-Verlet integrator.
pub mod integrator;

/// Particle text I/O.
pub mod io;

/// Multipole acceptance criteria.
pub mod mac;

/// Multipole moment records and upward moment-shift formulas.
pub mod moments;

/// Particle records (component B).
pub mod particle;

/// Axis-aligned bounding boxes and the orthant partitioner.
pub mod partition;

/// The simulation driver.
pub mod simulation;

/// The `<B><D><P><MAC><EF><PSH>` simulation-type identifier.
pub mod tag;

/// The Barnes–Hut tree and multipole aggregation.
pub mod tree;

/// Bespoke 2D/3D vector types.
pub mod vector;

/// The dual-dispatch visitor framework.
pub mod visitor;

/// Everything needed to drive a simulation.
pub mod prelude {
    pub use crate::accel::{AccelParams, AccelStats};
    pub use crate::config::{Boundary, SimulationOptions};
    pub use crate::dim::{Dim, D2, D3};
    pub use crate::error::SimError;
    pub use crate::integrator::CompositionOrder;
    pub use crate::io::{read_particles, snapshot_filename, write_particles};
    pub use crate::mac::Mac;
    pub use crate::moments::MultipoleOrder;
    pub use crate::particle::Particle;
    pub use crate::simulation::{IterationStats, Simulation};
    pub use crate::tag::SimulationTag;
}
