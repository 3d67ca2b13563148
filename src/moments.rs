//! Multipole moment records (component C) and the upward moment-shift
//! formulas used by tree construction (component G).
//!
//! Each `(dimension, order)` pair gets one plain record carrying exactly
//! the independent Cartesian components of the moment tensor through that
//! order, matching the grounding source's `particle_moments<Scalar, Dim,
//! MultP>` layout (flat scalar fields, diagonal-then-off-diagonal
//! ordering). Which fields a given pass touches is controlled by the
//! runtime [`MultipoleOrder`] selector rather than by a distinct type per
//! order, since Rust has no ergonomic way to vary a struct's field count
//! by a const generic without nightly features.

use crate::vector::{Vector2, Vector3, VectorOps};

/// Truncation order of a multipole expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MultipoleOrder {
    /// Net charge only.
    Monopole = 0,
    /// Charge + dipole.
    Dipole = 1,
    /// Charge + dipole + quadrupole.
    Quadrupole = 2,
    /// Charge + dipole + quadrupole + octupole.
    Octupole = 3,
}

impl MultipoleOrder {
    /// One-letter tag used by [`crate::tag::SimulationTag`] (`M`,`D`,`Q`,`O`).
    pub fn tag(self) -> char {
        match self {
            MultipoleOrder::Monopole => 'M',
            MultipoleOrder::Dipole => 'D',
            MultipoleOrder::Quadrupole => 'Q',
            MultipoleOrder::Octupole => 'O',
        }
    }
}

/// A dimension's multipole moment record.
///
/// Implementors carry every field through octupole order; [`MultipoleOrder`]
/// selects how many of them a given accumulation/shift/field pass uses.
pub trait Moments: Copy + Clone + Default + std::fmt::Debug + Send + Sync {
    /// The vector type of the owning dimension.
    type Vector: VectorOps;

    /// The monopole moment (net charge).
    fn monopole(&self) -> f64;

    /// Sets the monopole moment directly (computed as a signed sum of
    /// children, not via [`Moments::accumulate_shift`]).
    fn set_monopole(&mut self, m: f64);

    /// Folds `child`'s moments (already computed about the child's own
    /// center) into `self`, shifted by `r = self_center - child_center`,
    /// up through `order`. A particle leaf contributes a `child` with only
    /// `monopole` set (`Moments::from_point_charge`).
    fn accumulate_shift(&mut self, order: MultipoleOrder, child: &Self, r: Self::Vector);

    /// A moment record for a bare point charge (only the monopole is set).
    fn from_point_charge(q: f64) -> Self {
        let mut m = Self::default();
        m.set_monopole(q);
        m
    }

    /// The dipole moment as a vector (zero fields if unset).
    fn dipole(&self) -> Self::Vector;

    /// The quadrupole term of the field at separation `r`, already scaled
    /// by the appropriate `invR⁶`/`invR⁷` factor for this dimension.
    fn quadrupole_field(&self, r: Self::Vector) -> Self::Vector;

    /// The octupole term of the field at separation `r`. `None` where no
    /// octupole field formula is implemented for this dimension (3D — the
    /// grounding source has no 3D octupole field polynomial).
    fn octupole_field(&self, r: Self::Vector) -> Option<Self::Vector>;

    /// The Cartesian multipole field this moment record produces at
    /// separation `r = eval_point - source_center`, truncated at `order`.
    fn field_contribution(&self, order: MultipoleOrder, r: Self::Vector) -> Self::Vector {
        let r2 = r.norm2();
        if r2 == 0.0 {
            return Self::Vector::zero();
        }
        let d = Self::Vector::DIM as f64;
        let rnorm = r2.sqrt();
        let r_d = rnorm.powf(d);

        // Monopole: `M·R·invR^d` (`invR²` in 2D, `invR³` in 3D).
        let mut e = r * (self.monopole() / r_d);

        if order < MultipoleOrder::Dipole {
            return e;
        }
        // Dipole: `(d·(D·Rhat)·Rhat − D) · invR^d`, which expands to
        // exactly `(Dx(x²−y²) + 2Dy·xy)·invR⁴` in 2D and
        // `(3(R·D)R − D·|R|²)/|R|⁵` in 3D.
        let dipole = self.dipole();
        let rhat = r * (1.0 / rnorm);
        let dot = dipole.dot(rhat);
        e += (rhat * (dot * d) - dipole) * (1.0 / r_d);

        if order < MultipoleOrder::Quadrupole {
            return e;
        }
        e += self.quadrupole_field(r);

        if order < MultipoleOrder::Octupole {
            return e;
        }
        if let Some(oct) = self.octupole_field(r) {
            e += oct;
        }
        e
    }
}

/// 2D multipole moments: `M; Dx,Dy; Qxx,Qyy,Qxy; Oxxx,Oyyy,Oxxy,Oxyy`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments2 {
    pub m: f64,
    pub dx: f64,
    pub dy: f64,
    pub qxx: f64,
    pub qyy: f64,
    pub qxy: f64,
    pub oxxx: f64,
    pub oyyy: f64,
    pub oxxy: f64,
    pub oxyy: f64,
}

impl Moments for Moments2 {
    type Vector = Vector2;

    #[inline]
    fn monopole(&self) -> f64 {
        self.m
    }

    #[inline]
    fn set_monopole(&mut self, m: f64) {
        self.m = m;
    }

    fn accumulate_shift(&mut self, order: MultipoleOrder, d: &Self, r: Vector2) {
        if order < MultipoleOrder::Dipole {
            return;
        }
        self.dx += d.dx - r.x * d.m;
        self.dy += d.dy - r.y * d.m;

        if order < MultipoleOrder::Quadrupole {
            return;
        }
        self.qxx += d.qxx - 2.0 * r.x * d.dx + r.x * r.x * d.m;
        self.qyy += d.qyy - 2.0 * r.y * d.dy + r.y * r.y * d.m;
        self.qxy += d.qxy - r.x * d.dy - r.y * d.dx + r.x * r.y * d.m;

        if order < MultipoleOrder::Octupole {
            return;
        }
        self.oxxx += d.oxxx + r.x * (-3.0 * d.qxx + r.x * (3.0 * d.dx - r.x * d.m));
        self.oyyy += d.oyyy + r.y * (-3.0 * d.qyy + r.y * (3.0 * d.dy - r.y * d.m));
        self.oxxy +=
            d.oxxy - r.y * d.qxx + r.x * (-2.0 * d.qxy + 2.0 * r.y * d.dx + r.x * (d.dy - r.y * d.m));
        self.oxyy +=
            d.oxyy - r.x * d.qyy + r.y * (-2.0 * d.qxy + 2.0 * r.x * d.dy + r.y * (d.dx - r.x * d.m));
    }

    fn dipole(&self) -> Vector2 {
        Vector2::new(self.dx, self.dy)
    }

    /// `x(x²−3y²)(Qxx−Qyy) + y·Qxy·(6x²−2y²)`, `invR⁶`-scaled, and the
    /// `.yx()`-swapped y-component.
    fn quadrupole_field(&self, r: Vector2) -> Vector2 {
        let (x, y) = (r.x, r.y);
        let a = self.qxx - self.qyy;
        let inv_r6 = 1.0 / r.norm2().powi(3);
        let ex = (x * (x * x - 3.0 * y * y) * a + y * self.qxy * (6.0 * x * x - 2.0 * y * y)) * inv_r6;
        let ey = (y * (y * y - 3.0 * x * x) * -a + x * self.qxy * (6.0 * y * y - 2.0 * x * x)) * inv_r6;
        Vector2::new(ex, ey)
    }

    /// `(Oxxx−3·Oxyy)(y²−2xy−x²)(y²+2xy−x²) + 4xy(y²−x²)(Oyyy−3·Oxxy)`,
    /// `invR⁸`-scaled, and the `.yx()`-swapped y-component.
    fn octupole_field(&self, r: Vector2) -> Option<Vector2> {
        let (x, y) = (r.x, r.y);
        let (x2, y2) = (x * x, y * y);
        let a = self.oxxx - 3.0 * self.oxyy;
        let b = self.oyyy - 3.0 * self.oxxy;
        let inv_r8 = 1.0 / r.norm2().powi(4);
        let ex = (a * (y2 - 2.0 * x * y - x2) * (y2 + 2.0 * x * y - x2) + 4.0 * x * y * (y2 - x2) * b) * inv_r8;
        let ey = (b * (x2 - 2.0 * x * y - y2) * (x2 + 2.0 * x * y - y2) + 4.0 * x * y * (x2 - y2) * a) * inv_r8;
        Some(Vector2::new(ex, ey))
    }
}

/// 3D multipole moments through quadrupole; octupole fields are present
/// for API completeness but never populated (see `DESIGN.md`: the
/// grounding source has no 3D octupole shift/field formula, so `Octupole`
/// behaves as `Quadrupole` in 3D).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments3 {
    pub m: f64,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub qxx: f64,
    pub qyy: f64,
    pub qzz: f64,
    pub qxy: f64,
    pub qxz: f64,
    pub qyz: f64,
    pub oxxx: f64,
    pub oyyy: f64,
    pub ozzz: f64,
    pub oxyy: f64,
    pub oxzz: f64,
    pub oxyz: f64,
    pub oxxz: f64,
    pub oxxy: f64,
    pub oyyz: f64,
    pub oyzz: f64,
}

impl Moments for Moments3 {
    type Vector = Vector3;

    #[inline]
    fn monopole(&self) -> f64 {
        self.m
    }

    #[inline]
    fn set_monopole(&mut self, m: f64) {
        self.m = m;
    }

    fn accumulate_shift(&mut self, order: MultipoleOrder, d: &Self, r: Vector3) {
        if order < MultipoleOrder::Dipole {
            return;
        }
        self.dx += d.dx - r.x * d.m;
        self.dy += d.dy - r.y * d.m;
        self.dz += d.dz - r.z * d.m;

        // Order 3 (octupole) has no grounding-source formula in 3D; treat
        // it the same as Quadrupole.
        if order < MultipoleOrder::Quadrupole {
            return;
        }
        self.qxx += d.qxx - 2.0 * r.x * d.dx + r.x * r.x * d.m;
        self.qyy += d.qyy - 2.0 * r.y * d.dy + r.y * r.y * d.m;
        self.qzz += d.qzz - 2.0 * r.z * d.dz + r.z * r.z * d.m;
        self.qxy += d.qxy - r.x * d.dy - r.y * d.dx + r.x * r.y * d.m;
        self.qxz += d.qxz - r.x * d.dz - r.z * d.dx + r.x * r.z * d.m;
        self.qyz += d.qyz - r.y * d.dz - r.z * d.dy + r.y * r.z * d.m;
    }

    fn dipole(&self) -> Vector3 {
        Vector3::new(self.dx, self.dy, self.dz)
    }

    /// Standard trace-form quadrupole field `-QR/r⁵ + (5/2)(RᵀQR)R/r⁷`.
    fn quadrupole_field(&self, r: Vector3) -> Vector3 {
        let qr = Vector3::new(
            self.qxx * r.x + self.qxy * r.y + self.qxz * r.z,
            self.qxy * r.x + self.qyy * r.y + self.qyz * r.z,
            self.qxz * r.x + self.qyz * r.y + self.qzz * r.z,
        );
        let s = r.dot(qr);
        let r2 = r.norm2();
        let r5 = r2 * r2 * r2.sqrt();
        let r7 = r5 * r2;
        qr * (-1.0 / r5) + r * (2.5 * s / r7)
    }

    fn octupole_field(&self, _r: Vector3) -> Option<Vector3> {
        // No 3D octupole field formula in the grounding source:
        // `Octupole` behaves as `Quadrupole` for 3D field evaluation.
        None
    }
}
