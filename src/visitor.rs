//! The dual-dispatch visitor framework (component F).
//!
//! Every traversal over a [`Tree`](crate::tree::Tree) is one of two shapes:
//! a side-effecting walk that visits every node it descends into (used by
//! diagnostics and the moment-recomputation pass), or a reducing walk that
//! turns a subtree into a single accumulated value and may stop early at
//! an internal node it decides to treat as a pseudo-particle (used by the
//! field evaluator, component I). Both dispatch on the `Leaf`/`Branch` sum
//! type rather than on any form of runtime inheritance.

use crate::dim::Dim;
use crate::tree::{Branch, Leaf, Node};

/// A side-effecting visitor: runs on every leaf, and on every branch it
/// decides to descend into.
pub trait Visitor<Dm: Dim> {
    /// Called once per leaf.
    fn visit_leaf(&mut self, leaf: &Leaf<Dm>);

    /// Called once per branch, before its children (if any) are visited.
    /// Returning `false` prunes the subtree.
    fn visit_branch(&mut self, branch: &Branch<'_, Dm>) -> bool {
        let _ = branch;
        true
    }
}

/// Walks `node` with `visitor`, pruning subtrees whose branch visit
/// returns `false`.
pub fn walk<'a, Dm: Dim, V: Visitor<Dm>>(node: &'a Node<'a, Dm>, visitor: &mut V) {
    match node {
        Node::Leaf(leaf) => visitor.visit_leaf(leaf),
        Node::Branch(branch) => {
            if visitor.visit_branch(branch) {
                for child in branch.children.iter().flatten() {
                    walk(child, visitor);
                }
            }
        }
    }
}

/// Running totals kept by most [`Visitor`] and [`ReduceVisitor`]
/// implementations, surfaced in the acceleration pass's tracing span.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VisitCounts {
    pub leaves_visited: usize,
    pub branches_visited: usize,
    pub branches_accepted: usize,
}

impl VisitCounts {
    pub fn record_leaf(&mut self) {
        self.leaves_visited += 1;
    }

    pub fn record_branch(&mut self, accepted: bool) {
        self.branches_visited += 1;
        if accepted {
            self.branches_accepted += 1;
        }
    }
}

/// A value-returning visitor: folds a subtree into a single `Output`.
///
/// A branch is either accepted as a single pseudo-particle contribution
/// (`branch_value` returns `Some`) or descended into, in which case its
/// children's outputs are folded by [`ReduceVisitor::combine`] — `+` by
/// default, overridable for visitors that need another reduction (e.g. a
/// componentwise minimum).
pub trait ReduceVisitor<Dm: Dim> {
    type Output;

    /// The value contributed by a leaf (always a direct, per-particle
    /// contribution — a leaf is never treated as a pseudo-particle).
    fn leaf_value(&mut self, leaf: &Leaf<Dm>) -> Self::Output;

    /// The value contributed by a branch if it is accepted as a single
    /// pseudo-particle (the MAC test), or `None` to descend.
    fn branch_value(&mut self, branch: &Branch<'_, Dm>) -> Option<Self::Output>;

    /// Folds a descended branch's children's values into one. Override
    /// for a reduction other than `+`.
    fn combine(&mut self, values: Vec<Self::Output>) -> Self::Output
    where
        Self::Output: Default + std::iter::Sum,
    {
        values.into_iter().sum()
    }
}

/// Reduces `node` with `visitor`.
pub fn reduce<'a, Dm: Dim, V: ReduceVisitor<Dm>>(node: &'a Node<'a, Dm>, visitor: &mut V) -> V::Output {
    match node {
        Node::Leaf(leaf) => visitor.leaf_value(leaf),
        Node::Branch(branch) => match visitor.branch_value(branch) {
            Some(value) => value,
            None => {
                let values: Vec<V::Output> = branch.children.iter().flatten().map(|child| reduce(child, visitor)).collect();
                visitor.combine(values)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::D2;
    use crate::moments::MultipoleOrder;
    use crate::particle::Particle;
    use crate::tree::{build, BuildOptions};
    use crate::vector::Vector2;
    use bumpalo::Bump;

    struct CountingVisitor(VisitCounts);

    impl Visitor<D2> for CountingVisitor {
        fn visit_leaf(&mut self, _leaf: &Leaf<D2>) {
            self.0.record_leaf();
        }

        fn visit_branch(&mut self, _branch: &Branch<'_, D2>) -> bool {
            self.0.record_branch(false);
            true
        }
    }

    struct SumMonopole;

    impl ReduceVisitor<D2> for SumMonopole {
        type Output = f64;

        fn leaf_value(&mut self, leaf: &Leaf<D2>) -> f64 {
            leaf.moments.m
        }

        fn branch_value(&mut self, _branch: &Branch<'_, D2>) -> Option<f64> {
            None
        }
    }

    fn sample_tree(bump: &Bump) -> crate::tree::Tree<'_, D2> {
        let particles = vec![
            Particle::<D2>::new(Vector2::new(-1.0, -1.0), Vector2::zero(), 1.0, 1.0).unwrap(),
            Particle::<D2>::new(Vector2::new(1.0, -1.0), Vector2::zero(), 1.0, 1.0).unwrap(),
            Particle::<D2>::new(Vector2::new(-1.0, 1.0), Vector2::zero(), 1.0, 1.0).unwrap(),
            Particle::<D2>::new(Vector2::new(1.0, 1.0), Vector2::zero(), 1.0, 1.0).unwrap(),
        ];
        let mut indices: Vec<u32> = (0..particles.len() as u32).collect();
        let opts = BuildOptions {
            leaf_capacity: 1,
            max_depth: 64,
            order: MultipoleOrder::Quadrupole,
        };
        // Leaked into the caller's arena so the returned tree can borrow
        // from it; particles must outlive the tree too.
        let particles: &'static _ = Box::leak(Box::new(particles));
        build::<D2>(bump, particles, &mut indices, &opts).unwrap()
    }

    #[test]
    fn walk_visits_every_leaf_and_branch() {
        let bump = Bump::new();
        let tree = sample_tree(&bump);
        let mut visitor = CountingVisitor(VisitCounts::default());
        walk(tree.root.unwrap(), &mut visitor);
        assert_eq!(visitor.0.leaves_visited, tree.leaves_built);
        assert_eq!(visitor.0.branches_visited, tree.branches_built);
    }

    #[test]
    fn reduce_sums_leaf_monopoles_to_root_monopole() {
        let bump = Bump::new();
        let tree = sample_tree(&bump);
        let total = reduce(tree.root.unwrap(), &mut SumMonopole);
        assert_eq!(total, 4.0);
    }

    struct LeafCountVisitor;

    impl ReduceVisitor<D2> for LeafCountVisitor {
        type Output = u32;

        fn leaf_value(&mut self, _leaf: &Leaf<D2>) -> u32 {
            1
        }

        fn branch_value(&mut self, _branch: &Branch<'_, D2>) -> Option<u32> {
            None
        }
    }

    /// Tree-count visitor — a visitor returning 1 at each leaf and never
    /// accepting a branch, reduced by `+`, must return exactly N.
    #[test]
    fn leaf_counting_visitor_returns_particle_count() {
        let n = 37;
        let particles: Vec<Particle<D2>> = (0..n)
            .map(|i| Particle::new(Vector2::new(i as f64, (i * 7 % 13) as f64), Vector2::zero(), 1.0, 1.0).unwrap())
            .collect();
        let mut indices: Vec<u32> = (0..particles.len() as u32).collect();
        let bump = Bump::new();
        let t = build::<D2>(&bump, &particles, &mut indices, &BuildOptions::default()).unwrap();

        let total = reduce(t.root.unwrap(), &mut LeafCountVisitor);
        assert_eq!(total, n as u32);
    }

    struct MinPositionVisitor;

    impl ReduceVisitor<D2> for MinPositionVisitor {
        type Output = Vector2;

        fn leaf_value(&mut self, leaf: &Leaf<D2>) -> Vector2 {
            leaf.center
        }

        fn branch_value(&mut self, _branch: &Branch<'_, D2>) -> Option<Vector2> {
            None
        }

        fn combine(&mut self, values: Vec<Vector2>) -> Vector2 {
            values.into_iter().fold(
                Vector2::new(f64::INFINITY, f64::INFINITY),
                crate::vector::VectorOps::componentwise_min,
            )
        }
    }

    /// Min-visitor reduction — a visitor that never accepts a branch and
    /// returns `r` at leaves, reducing by componentwise min, must return
    /// `(min(x_i), min(y_i))` over all particles.
    #[test]
    fn componentwise_min_visitor_finds_the_lower_left_corner() {
        let positions = [(3.0, -2.0), (-1.0, 5.0), (4.0, 4.0), (-1.0, -7.0)];
        let particles: Vec<Particle<D2>> = positions
            .iter()
            .map(|&(x, y)| Particle::new(Vector2::new(x, y), Vector2::zero(), 1.0, 1.0).unwrap())
            .collect();
        let mut indices: Vec<u32> = (0..particles.len() as u32).collect();
        let bump = Bump::new();
        let opts = BuildOptions { leaf_capacity: 1, ..BuildOptions::default() };
        let t = build::<D2>(&bump, &particles, &mut indices, &opts).unwrap();

        let min = reduce(t.root.unwrap(), &mut MinPositionVisitor);
        assert_eq!(min, Vector2::new(-1.0, -7.0));
    }
}
