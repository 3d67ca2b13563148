//! Axis-aligned bounding boxes and the orthant partitioner (component D).
//!
//! The partitioner never moves particle records: it permutes a buffer of
//! indices in place via a two-pointer partition (the same shape as
//! `std::partition`), splitting one axis at a time around the bounding
//! box's midpoint. A `D`-dimensional split is `D` single-axis splits
//! composed, yielding `2^D` contiguous index ranges.

use crate::dim::Dim;
use crate::vector::VectorOps;
use std::ops::Range;

/// An axis-aligned bounding box over a [`Dim::Vector`](Dim).
#[derive(Clone, Copy, Debug)]
pub struct BoundingBox<Dm: Dim> {
    pub min: Dm::Vector,
    pub max: Dm::Vector,
}

impl<Dm: Dim> BoundingBox<Dm> {
    /// The empty box (identity element for [`BoundingBox::extend`]).
    pub fn empty() -> Self {
        Self {
            min: splat::<Dm>(f64::INFINITY),
            max: splat::<Dm>(f64::NEG_INFINITY),
        }
    }

    /// The smallest box containing every position in `positions`.
    pub fn containing(positions: impl Iterator<Item = Dm::Vector>) -> Self {
        let mut bbox = Self::empty();
        for p in positions {
            bbox.extend(p);
        }
        bbox
    }

    /// Grows the box to also contain `p`.
    pub fn extend(&mut self, p: Dm::Vector) {
        self.min = self.min.componentwise_min(p);
        self.max = self.max.componentwise_max(p);
    }

    /// The box's geometric midpoint — the partitioner's pivot, not the
    /// center of charge, and not a median of positions.
    pub fn center(&self) -> Dm::Vector {
        (self.min + self.max) * 0.5
    }

    /// Per-axis extent.
    pub fn size(&self) -> Dm::Vector {
        self.max - self.min
    }

    /// `size2 = |max - min|^2` (§3): the squared Euclidean length of the
    /// box's full diagonal, the characteristic size both MAC variants
    /// compare against a squared distance.
    pub fn size2(&self) -> f64 {
        self.size().norm2()
    }

    /// The sub-box for orthant `o` (bit `k` of `o` selects the upper half
    /// on axis `k`), matching the range order produced by
    /// [`partition_orthants`].
    pub fn orthant_bounds(&self, o: usize) -> Self {
        let center = self.center();
        let mut min = self.min;
        let mut max = self.max;
        for axis in 0..Dm::D {
            let c = center.component(axis);
            if o & (1 << axis) == 0 {
                max = max.with_component(axis, c);
            } else {
                min = min.with_component(axis, c);
            }
        }
        Self { min, max }
    }
}

fn splat<Dm: Dim>(v: f64) -> Dm::Vector {
    let mut out = Dm::Vector::zero();
    for axis in 0..Dm::D {
        out = out.with_component(axis, v);
    }
    out
}

/// Two-pointer in-place partition of `indices` by `positions[i].component(axis) <= pivot`.
/// Returns the split point: everything in `0..split` satisfies the
/// predicate, everything in `split..` does not.
pub fn partition_by<Dm: Dim>(
    indices: &mut [u32],
    positions: &[Dm::Vector],
    axis: usize,
    pivot: f64,
) -> usize {
    let mut i = 0usize;
    let mut j = indices.len();
    while i < j {
        if positions[indices[i] as usize].component(axis) <= pivot {
            i += 1;
        } else {
            j -= 1;
            indices.swap(i, j);
        }
    }
    i
}

/// Splits `indices` into `2^D` contiguous ranges around `bbox`'s midpoint,
/// one axis at a time. Range `o`'s particles lie in [`BoundingBox::orthant_bounds`]`(o)`.
pub fn partition_orthants<Dm: Dim>(
    indices: &mut [u32],
    positions: &[Dm::Vector],
    bbox: &BoundingBox<Dm>,
) -> Vec<Range<usize>> {
    let center = bbox.center();
    let mut ranges = vec![0..indices.len()];
    for axis in 0..Dm::D {
        let mut next = Vec::with_capacity(ranges.len() * 2);
        for r in &ranges {
            let pivot = center.component(axis);
            let split = partition_by::<Dm>(&mut indices[r.clone()], positions, axis, pivot);
            next.push(r.start..r.start + split);
            next.push(r.start + split..r.end);
        }
        ranges = next;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::D2;
    use crate::vector::Vector2;

    #[test]
    fn bbox_center_is_midpoint_not_centroid() {
        let bbox = BoundingBox::<D2> {
            min: Vector2::new(0.0, 0.0),
            max: Vector2::new(4.0, 2.0),
        };
        assert_eq!(bbox.center(), Vector2::new(2.0, 1.0));
    }

    #[test]
    fn partition_orthants_splits_into_four_contiguous_ranges() {
        let positions = vec![
            Vector2::new(-1.0, -1.0),
            Vector2::new(1.0, -1.0),
            Vector2::new(-1.0, 1.0),
            Vector2::new(1.0, 1.0),
        ];
        let mut indices: Vec<u32> = (0..positions.len() as u32).collect();
        let bbox = BoundingBox::<D2>::containing(positions.iter().copied());
        let ranges = partition_orthants::<D2>(&mut indices, &positions, &bbox);
        assert_eq!(ranges.len(), 4);
        let total: usize = ranges.iter().map(|r| r.len()).sum();
        assert_eq!(total, positions.len());
        for r in &ranges {
            assert_eq!(r.len(), 1, "each quadrant holds exactly one corner point");
        }
    }
}
