//! The simulation driver (component O): wires the acceleration pass (J),
//! the composition integrator (K), and the boundary constraint into one
//! `step`/`run` API, with no CLI, file, or signal concerns.

use crate::accel::AccelParams;
use crate::config::{reflect_axis, Boundary, SimulationOptions};
use crate::dim::Dim;
use crate::error::SimError;
use crate::integrator::{CompositionOrder, Integrator};
use crate::mac::Mac;
use crate::moments::MultipoleOrder;
use crate::particle::Particle;
use crate::tree::BuildOptions;
use crate::vector::VectorOps;
use std::time::Instant;

/// One completed macro-step's statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IterationStats {
    pub tree_build_time_s: f64,
    pub eval_time_s: f64,
    pub other_time_s: f64,
    pub leaves_visited: usize,
    pub branches_visited: usize,
    pub accel_evals: usize,
}

/// Owns the particle array and drives it forward one macro-step at a time.
pub struct Simulation<Dm: Dim> {
    particles: Vec<Particle<Dm>>,
    indices: Vec<u32>,
    accel: Vec<Dm::Vector>,
    options: SimulationOptions,
    mac: Mac,
    order: MultipoleOrder,
    integrator: Integrator,
    time: f64,
    iteration: usize,
}

impl<Dm: Dim> Simulation<Dm> {
    /// Constructs a driver over `particles`, validating `options` first.
    pub fn new(
        particles: Vec<Particle<Dm>>,
        options: SimulationOptions,
        mac: Mac,
        order: MultipoleOrder,
        composition: CompositionOrder,
    ) -> Result<Self, SimError> {
        options.validate()?;
        let dt = options.dt;
        let indices = (0..particles.len() as u32).collect();
        let accel = vec![Dm::Vector::zero(); particles.len()];

        Ok(Self {
            particles,
            indices,
            accel,
            options,
            mac,
            order,
            integrator: Integrator::new(composition, dt),
            time: 0.0,
            iteration: 0,
        })
    }

    pub fn particles(&self) -> &[Particle<Dm>] {
        &self.particles
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// 1-based index of the last completed step.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Advances the simulation by exactly one macro-step.
    pub fn step(&mut self) -> Result<IterationStats, SimError> {
        let accel_params = AccelParams {
            softening: self.options.epsilon,
            mac: self.mac,
            order: self.order,
            nd: self.options.nd,
            qtom_cutoff: self.options.qtom_cutoff,
        };
        let build_opts = BuildOptions { order: self.order, ..BuildOptions::default() };

        let t0 = Instant::now();
        let stats = self.integrator.step(
            &mut self.particles,
            &mut self.indices,
            &mut self.accel,
            &build_opts,
            accel_params,
        )?;
        let total_time_s = t0.elapsed().as_secs_f64();

        if let Boundary::Reflective { min_bound, max_bound } = self.options.boundary {
            for p in self.particles.iter_mut() {
                for axis in 0..Dm::D {
                    let r = p.r.component(axis);
                    let v = p.v.component(axis);
                    let reflected = reflect_axis(r, v, min_bound, max_bound);
                    p.v = p.v.with_component(axis, reflected);
                }
            }
        }

        self.time += self.options.dt;
        self.iteration += 1;

        Ok(IterationStats {
            tree_build_time_s: stats.tree_build_time_s,
            eval_time_s: stats.eval_time_s,
            other_time_s: (total_time_s - stats.tree_build_time_s - stats.eval_time_s).max(0.0),
            leaves_visited: stats.leaves_visited,
            branches_visited: stats.branches_visited,
            accel_evals: stats.accel_evals,
        })
    }

    /// Runs `n_steps` macro-steps, calling `on_step(iteration, &stats)`
    /// after each one; stops early if it returns `true` ("request stop").
    /// Performs no I/O itself.
    pub fn run(&mut self, n_steps: usize, mut on_step: impl FnMut(usize, &IterationStats) -> bool) -> Result<(), SimError> {
        for _ in 0..n_steps {
            let stats = self.step()?;
            if on_step(self.iteration, &stats) {
                break;
            }
        }
        Ok(())
    }
}
