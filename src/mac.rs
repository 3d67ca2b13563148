//! Multipole acceptance criteria (component H): is a branch "far enough"
//! from an evaluation point to be treated as a single pseudo-particle?

use crate::dim::Dim;
use crate::tree::Branch;
use crate::vector::VectorOps;

/// Selects which MAC predicate the field evaluator applies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mac {
    /// Barnes–Hut opening-angle criterion: accept when `size < d * theta`,
    /// compared as `size^2 < d^2 * theta^2` to avoid a square root.
    OpeningAngle { theta: f64 },
    /// Salmon–Warren minimum-distance criterion: accept when the
    /// evaluation point is farther than `size / theta` from the branch's
    /// *nearest* bounding-box surface, not just its center.
    MinDistance { theta: f64 },
}

impl Mac {
    /// One-letter tag used by [`crate::tag::SimulationTag`] (`O` or `M`).
    pub fn tag(self) -> char {
        match self {
            Mac::OpeningAngle { .. } => 'O',
            Mac::MinDistance { .. } => 'M',
        }
    }

    /// Whether `branch` may be treated as a single pseudo-particle when
    /// evaluating the field at `eval_point`. Both variants compare the
    /// branch's `size2 = |max - min|^2` against `d^2 * theta^2` for some
    /// characteristic squared distance `d^2` (§4.H).
    pub fn accepts<Dm: Dim>(self, branch: &Branch<'_, Dm>, eval_point: Dm::Vector) -> bool {
        let size2 = branch.bbox.size2();
        match self {
            Mac::OpeningAngle { theta } => {
                let d2 = (branch.center - eval_point).norm2();
                size2 < d2 * theta * theta
            }
            Mac::MinDistance { theta } => {
                let d2 = nearest_surface_distance2::<Dm>(branch, eval_point);
                size2 < d2 * theta * theta
            }
        }
    }
}

/// Squared closest distance from `eval_point` to `branch`'s bounding box
/// (zero if `eval_point` lies inside it), per §4.H's Salmon–Warren form:
/// `u = min(branch.min, eval_point)`, `v = max(branch.max, eval_point)`,
/// `d^2 = |branch.min - u|^2 + |v - branch.max|^2`.
fn nearest_surface_distance2<Dm: Dim>(branch: &Branch<'_, Dm>, eval_point: Dm::Vector) -> f64 {
    let bbox = &branch.bbox;
    let mut d2 = 0.0;
    for axis in 0..Dm::D {
        let p = eval_point.component(axis);
        let lo = bbox.min.component(axis);
        let hi = bbox.max.component(axis);
        let u = p.min(lo);
        let v = p.max(hi);
        let dlo = lo - u;
        let dhi = v - hi;
        d2 += dlo * dlo + dhi * dhi;
    }
    d2
}
