//! The field evaluator (component I): a [`ReduceVisitor`] that folds a
//! tree into the electrostatic field at a point, accepting MAC-passing
//! branches as single pseudo-particles and falling back to a softened
//! direct Coulomb sum at leaves.

use crate::dim::Dim;
use crate::mac::Mac;
use crate::moments::MultipoleOrder;
use crate::particle::Particle;
use crate::tree::{Branch, Leaf, Node};
use crate::vector::VectorOps;
use crate::visitor::{reduce, ReduceVisitor, VisitCounts};

/// Parameters governing a field evaluation pass.
#[derive(Clone, Copy, Debug)]
pub struct FieldParams {
    /// Plummer softening length `epsilon`: direct pairwise terms use
    /// `q*R / (|R|^2 + epsilon^2)^(D/2)` rather than the bare Coulomb
    /// kernel, so that coincident or near-coincident particles never
    /// produce an unbounded acceleration.
    pub softening: f64,
    /// Multipole truncation order for accepted branches.
    pub order: MultipoleOrder,
    /// The acceptance criterion gating multipole vs. direct evaluation.
    pub mac: Mac,
}

/// Evaluates the field at `eval_point` due to every particle in the tree
/// rooted at `root`, excluding `self_index` (the evaluation point's own
/// particle, if it is one of them — self-interaction is never counted).
///
/// Returns the field alongside the [`VisitCounts`] accumulated over this
/// one evaluation (leaves visited, branches visited/accepted), so callers
/// can report true per-sweep traversal statistics rather than one-time
/// tree-build counts.
pub fn evaluate<Dm: Dim>(
    root: Option<&Node<'_, Dm>>,
    particles: &[Particle<Dm>],
    eval_point: Dm::Vector,
    self_index: Option<usize>,
    params: FieldParams,
) -> (Dm::Vector, VisitCounts) {
    let Some(node) = root else {
        return (Dm::Vector::zero(), VisitCounts::default());
    };
    let mut visitor = FieldEvaluator {
        particles,
        eval_point,
        self_index,
        params,
        counts: VisitCounts::default(),
    };
    let value = reduce(node, &mut visitor);
    (value, visitor.counts)
}

struct FieldEvaluator<'p, Dm: Dim> {
    particles: &'p [Particle<Dm>],
    eval_point: Dm::Vector,
    self_index: Option<usize>,
    params: FieldParams,
    counts: VisitCounts,
}

impl<'p, Dm: Dim> ReduceVisitor<Dm> for FieldEvaluator<'p, Dm> {
    type Output = Dm::Vector;

    fn leaf_value(&mut self, leaf: &Leaf<Dm>) -> Dm::Vector {
        self.counts.record_leaf();
        let eps2 = self.params.softening * self.params.softening;
        let half_d = Dm::Vector::DIM as f64 / 2.0;

        leaf.indices
            .iter()
            .filter(|&&i| Some(i as usize) != self.self_index)
            .map(|&i| {
                let p = &self.particles[i as usize];
                let r = self.eval_point - p.r;
                let denom = (r.norm2() + eps2).powf(half_d);
                if denom == 0.0 {
                    Dm::Vector::zero()
                } else {
                    r * (p.q() / denom)
                }
            })
            .sum()
    }

    fn branch_value(&mut self, branch: &Branch<'_, Dm>) -> Option<Dm::Vector> {
        let accepted = self.params.mac.accepts(branch, self.eval_point);
        self.counts.record_branch(accepted);
        if !accepted {
            return None;
        }
        let r = self.eval_point - branch.center;
        Some(branch.moments.field_contribution(self.params.order, r))
    }
}
