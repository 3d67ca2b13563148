//! The Barnes–Hut tree: branches and leaves (component E), pool-allocated
//! per build, and the two-pass multipole aggregation that follows
//! construction (component G).
//!
//! A tree is rebuilt from scratch every integrator sub-step and its
//! nodes borrow from a [`bumpalo::Bump`] owned by the caller: one arena
//! reset per step is far cheaper than one `Vec`/`Box` free per node.

use crate::dim::Dim;
use crate::error::SimError;
use crate::moments::{Moments, MultipoleOrder};
use crate::particle::Particle;
use crate::partition::{partition_orthants, BoundingBox};
use bumpalo::Bump;

/// Tree construction parameters.
#[derive(Clone, Copy, Debug)]
pub struct BuildOptions {
    /// Maximum particles a leaf may hold before it is split further.
    pub leaf_capacity: usize,
    /// Recursion depth bound; exceeding it with more than `leaf_capacity`
    /// particles still in range signals coincident (or near-coincident)
    /// positions the partitioner cannot separate (`SimError::DegenerateTree`).
    pub max_depth: usize,
    /// Multipole truncation order carried by every node's moments.
    pub order: MultipoleOrder,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            leaf_capacity: 1,
            max_depth: 64,
            order: MultipoleOrder::Quadrupole,
        }
    }
}

/// A leaf: the particle indices it covers (a copy, since the shared index
/// buffer keeps being permuted by sibling subtrees after this leaf is
/// built) with no further subdivision, plus its aggregated moments.
#[derive(Clone, Debug)]
pub struct Leaf<Dm: Dim> {
    pub indices: Vec<u32>,
    /// `|charge|`-weighted center of the particles this leaf covers —
    /// the point its moments are shifted to, per §3's `r` field. For the
    /// default single-particle leaf this is just that particle's position.
    pub center: Dm::Vector,
    pub bbox: BoundingBox<Dm>,
    /// Sum of `|q|` over the leaf's particles.
    pub abs_q: f64,
    pub moments: Dm::Moments,
}

/// A branch: up to `Dm::ORTHANTS` children, at most one per orthant.
///
/// The child slot array is always 8 wide (the 3D case) so `Branch` does
/// not need a const-generic width; 2D trees simply leave slots 4..8 `None`.
#[derive(Debug)]
pub struct Branch<'a, Dm: Dim> {
    pub children: [Option<&'a Node<'a, Dm>>; 8],
    /// `|charge|`-weighted center of the branch's aggregated particles
    /// (§3's `r`, §4.G's `sum_abs_q_r / sum_abs_q`) — not the bounding
    /// box's geometric midpoint used to pivot the partitioner.
    pub center: Dm::Vector,
    pub bbox: BoundingBox<Dm>,
    /// Sum of `|q|` over every particle the branch contains (§3's `abs_q`).
    pub abs_q: f64,
    pub moments: Dm::Moments,
}

/// A tree node: a dual-dispatch target for [`crate::visitor`].
#[derive(Debug)]
pub enum Node<'a, Dm: Dim> {
    Leaf(Leaf<Dm>),
    Branch(Branch<'a, Dm>),
}

impl<'a, Dm: Dim> Node<'a, Dm> {
    pub fn moments(&self) -> &Dm::Moments {
        match self {
            Node::Leaf(l) => &l.moments,
            Node::Branch(b) => &b.moments,
        }
    }

    /// The `|charge|`-weighted center this node's moments are shifted to.
    pub fn center(&self) -> Dm::Vector {
        match self {
            Node::Leaf(l) => l.center,
            Node::Branch(b) => b.center,
        }
    }

    pub fn bbox(&self) -> &BoundingBox<Dm> {
        match self {
            Node::Leaf(l) => &l.bbox,
            Node::Branch(b) => &b.bbox,
        }
    }

    /// Sum of `|q|` over every particle this node contains.
    pub fn abs_q(&self) -> f64 {
        match self {
            Node::Leaf(l) => l.abs_q,
            Node::Branch(b) => b.abs_q,
        }
    }
}

/// A built tree, together with the counters the acceleration pass
/// instruments into its tracing span.
pub struct Tree<'a, Dm: Dim> {
    pub root: Option<&'a Node<'a, Dm>>,
    pub leaves_built: usize,
    pub branches_built: usize,
}

/// Builds a tree over `particles[indices]`, permuting `indices` in place.
///
/// `indices` is typically `0..particles.len()` on the first call of a
/// step and is reused (re-sorted) on every subsequent one.
pub fn build<'a, Dm: Dim>(
    bump: &'a Bump,
    particles: &[Particle<Dm>],
    indices: &mut [u32],
    opts: &BuildOptions,
) -> Result<Tree<'a, Dm>, SimError> {
    let mut leaves_built = 0usize;
    let mut branches_built = 0usize;

    if indices.is_empty() {
        return Ok(Tree {
            root: None,
            leaves_built,
            branches_built,
        });
    }

    let positions: Vec<Dm::Vector> = particles.iter().map(|p| p.r).collect();
    let bbox = BoundingBox::<Dm>::containing(indices.iter().map(|&i| particles[i as usize].r));
    let root = build_node(
        bump,
        particles,
        &positions,
        indices,
        bbox,
        0,
        opts,
        &mut leaves_built,
        &mut branches_built,
    )?;

    Ok(Tree {
        root: Some(root),
        leaves_built,
        branches_built,
    })
}

fn build_node<'a, Dm: Dim>(
    bump: &'a Bump,
    particles: &[Particle<Dm>],
    positions: &[Dm::Vector],
    indices: &mut [u32],
    bbox: BoundingBox<Dm>,
    depth: usize,
    opts: &BuildOptions,
    leaves_built: &mut usize,
    branches_built: &mut usize,
) -> Result<&'a Node<'a, Dm>, SimError> {
    if indices.len() <= opts.leaf_capacity {
        *leaves_built += 1;
        return Ok(bump.alloc(Node::Leaf(build_leaf(particles, indices, bbox, opts.order))));
    }

    if depth >= opts.max_depth {
        return Err(SimError::DegenerateTree);
    }

    let ranges = partition_orthants::<Dm>(indices, positions, &bbox);

    let mut built: Vec<(usize, &'a Node<'a, Dm>)> = Vec::with_capacity(Dm::ORTHANTS);

    for (orthant, range) in ranges.into_iter().enumerate() {
        if range.is_empty() {
            continue;
        }
        let child_bbox = if range.len() == indices.len() {
            // All particles fell on one side of every axis split (e.g. a
            // shared coordinate): recurse with the orthant's geometric
            // sub-box rather than looping forever on an unchanged bbox.
            bbox.orthant_bounds(orthant)
        } else {
            BoundingBox::<Dm>::containing(
                indices[range.clone()].iter().map(|&i| particles[i as usize].r),
            )
        };

        let child = build_node(
            bump,
            particles,
            positions,
            &mut indices[range],
            child_bbox,
            depth + 1,
            opts,
            leaves_built,
            branches_built,
        )?;

        built.push((orthant, child));
    }

    // First pass (§4.G): sum_q, sum_abs_q, sum_abs_q_r, bbox union.
    let mut sum_q = 0.0;
    let mut sum_abs_q = 0.0;
    let mut sum_abs_q_r = Dm::Vector::zero();
    let mut union_bbox = BoundingBox::<Dm>::empty();
    for &(_, child) in &built {
        sum_q += child.moments().monopole();
        let abs_q = child.abs_q();
        sum_abs_q += abs_q;
        sum_abs_q_r += child.center() * abs_q;
        union_bbox.extend(child.bbox().min);
        union_bbox.extend(child.bbox().max);
    }
    let center = sum_abs_q_r / sum_abs_q;

    // Second pass: fold each child's moments, shifted to the now-known
    // charge-weighted center, into the parent's.
    let mut moments = Dm::Moments::default();
    for &(_, child) in &built {
        let r = center - child.center();
        moments.accumulate_shift(opts.order, child.moments(), r);
    }
    moments.set_monopole(sum_q);

    let mut children: [Option<&'a Node<'a, Dm>>; 8] = [None; 8];
    for (orthant, child) in built {
        children[orthant] = Some(child);
    }

    *branches_built += 1;

    Ok(bump.alloc(Node::Branch(Branch {
        children,
        center,
        bbox: union_bbox,
        abs_q: sum_abs_q,
        moments,
    })))
}

fn build_leaf<Dm: Dim>(
    particles: &[Particle<Dm>],
    indices: &[u32],
    bbox: BoundingBox<Dm>,
    order: MultipoleOrder,
) -> Leaf<Dm> {
    let mut sum_q = 0.0;
    let mut sum_abs_q = 0.0;
    let mut sum_abs_q_r = Dm::Vector::zero();
    for &i in indices {
        let p = &particles[i as usize];
        sum_q += p.q();
        sum_abs_q += p.q().abs();
        sum_abs_q_r += p.r * p.q().abs();
    }
    // `sum_abs_q > 0` always holds here: `indices` is non-empty (this is
    // only called for `indices.len() >= 1`) and every particle's charge
    // is nonzero by construction (`Particle::new`).
    let center = sum_abs_q_r / sum_abs_q;

    let mut moments = Dm::Moments::default();
    for &i in indices {
        let p = &particles[i as usize];
        let point = Dm::Moments::from_point_charge(p.q());
        let r = center - p.r;
        moments.accumulate_shift(order, &point, r);
    }
    moments.set_monopole(sum_q);

    Leaf {
        indices: indices.to_vec(),
        center,
        bbox,
        abs_q: sum_abs_q,
        moments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::D2;
    use crate::vector::Vector2;

    fn particle(x: f64, y: f64) -> Particle<D2> {
        Particle::new(Vector2::new(x, y), Vector2::zero(), 1.0, 1.0).unwrap()
    }

    #[test]
    fn single_particle_builds_a_leaf_root() {
        let particles = vec![particle(0.0, 0.0)];
        let mut indices: Vec<u32> = (0..particles.len() as u32).collect();
        let bump = Bump::new();
        let tree = build::<D2>(&bump, &particles, &mut indices, &BuildOptions::default()).unwrap();
        assert!(matches!(tree.root, Some(Node::Leaf(_))));
        assert_eq!(tree.leaves_built, 1);
        assert_eq!(tree.branches_built, 0);
    }

    #[test]
    fn branch_monopole_equals_sum_of_children() {
        let particles = vec![
            particle(-1.0, -1.0),
            particle(1.0, -1.0),
            particle(-1.0, 1.0),
            particle(1.0, 1.0),
        ];
        let mut indices: Vec<u32> = (0..particles.len() as u32).collect();
        let bump = Bump::new();
        let opts = BuildOptions {
            leaf_capacity: 1,
            ..BuildOptions::default()
        };
        let tree = build::<D2>(&bump, &particles, &mut indices, &opts).unwrap();
        let root = tree.root.unwrap();
        assert_eq!(root.moments().monopole(), 4.0);
        assert_eq!(root.abs_q(), 4.0);
        assert!(tree.branches_built >= 1);
    }

    #[test]
    fn branch_center_is_charge_weighted_not_bbox_midpoint() {
        // Three unit charges at x=0 and one at x=10: the bbox midpoint is
        // x=5, but the |q|-weighted center must sit at x=2.5.
        let particles = vec![
            particle(0.0, 0.0),
            particle(0.0, 1.0),
            particle(0.0, -1.0),
            particle(10.0, 0.0),
        ];
        let mut indices: Vec<u32> = (0..particles.len() as u32).collect();
        let bump = Bump::new();
        let opts = BuildOptions {
            leaf_capacity: 1,
            ..BuildOptions::default()
        };
        let tree = build::<D2>(&bump, &particles, &mut indices, &opts).unwrap();
        let root = tree.root.unwrap();
        assert!((root.center().x - 2.5).abs() < 1e-12, "center.x = {}", root.center().x);
        assert!(root.bbox().min.x <= root.center().x && root.center().x <= root.bbox().max.x);
    }

    #[test]
    fn coincident_particles_past_leaf_capacity_raise_degenerate_tree() {
        // Every particle sits at the exact same position, so no axis
        // split ever separates them: the partitioner keeps recursing on
        // an unchanged degenerate box until `max_depth` is exceeded.
        let particles: Vec<Particle<D2>> = (0..4).map(|_| particle(1.0, 1.0)).collect();
        let mut indices: Vec<u32> = (0..particles.len() as u32).collect();
        let bump = Bump::new();
        let opts = BuildOptions {
            leaf_capacity: 1,
            max_depth: 8,
            ..BuildOptions::default()
        };
        let err = build::<D2>(&bump, &particles, &mut indices, &opts).unwrap_err();
        assert_eq!(err, SimError::DegenerateTree);
    }

    #[test]
    fn empty_input_yields_no_root() {
        let particles: Vec<Particle<D2>> = vec![];
        let mut indices: Vec<u32> = vec![];
        let bump = Bump::new();
        let tree = build::<D2>(&bump, &particles, &mut indices, &BuildOptions::default()).unwrap();
        assert!(tree.root.is_none());
    }

    /// 3D moment exactness — the root branch's low moments must equal
    /// the direct sum over `q*R^i R^j...` (`R = r - root.r`) to within
    /// 1e-2 relative.
    #[test]
    fn root_moments_match_direct_sum_in_3d() {
        use crate::dim::D3;
        use crate::vector::Vector3;
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        let particles: Vec<Particle<D3>> = (0..5000)
            .map(|_| {
                let r = Vector3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
                let q = if rng.gen_bool(0.3) { -1.0 } else { 1.0 };
                Particle::new(r, Vector3::zero(), q, 1.0).unwrap()
            })
            .collect();

        let mut indices: Vec<u32> = (0..particles.len() as u32).collect();
        let bump = Bump::new();
        let opts = BuildOptions { order: MultipoleOrder::Quadrupole, ..BuildOptions::default() };
        let t = build::<D3>(&bump, &particles, &mut indices, &opts).unwrap();
        let root = t.root.unwrap();

        let center = root.center();
        let (mut m, mut dx, mut qxx, mut qxy) = (0.0, 0.0, 0.0, 0.0);
        for p in &particles {
            let r = p.r - center;
            m += p.q();
            dx += p.q() * r.x;
            qxx += p.q() * r.x * r.x;
            qxy += p.q() * r.x * r.y;
        }

        let moments = root.moments();
        let rel = |a: f64, b: f64| (a - b).abs() / b.abs().max(1.0);

        assert!(rel(moments.monopole(), m) < 1e-2, "M: {} vs {}", moments.monopole(), m);
        assert!(rel(moments.dipole().x, dx) < 1e-2, "Dx: {} vs {}", moments.dipole().x, dx);
        assert!(rel(moments.qxx, qxx) < 1e-2, "Qxx: {} vs {}", moments.qxx, qxx);
        assert!(rel(moments.qxy, qxy) < 1e-2, "Qxy: {} vs {}", moments.qxy, qxy);
    }
}
