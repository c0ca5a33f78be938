//! Fixed-step simulation engine
//!
//! `Engine` owns the active force calculator and integrator and turns an
//! arbitrary frame delta into a whole number of fixed internal steps. The
//! bodies are borrowed per call and never retained.

use crate::simulation::forces::{BruteForce, ForceCalculator};
use crate::simulation::integrator::{Integrator, Verlet};
use crate::simulation::params::{clamp_timestep, DEFAULT_TIMESTEP};
use crate::simulation::states::{Body, NVec2};

/// Pairs closer than this are left out of the potential energy sum.
pub const ENERGY_MIN_DISTANCE: f64 = 1.0e-3;

pub type BoxedForceCalculator = Box<dyn ForceCalculator + Send + Sync>;
pub type BoxedIntegrator = Box<dyn Integrator + Send + Sync>;

pub struct Engine {
    force_calculator: Option<BoxedForceCalculator>,
    integrator: Option<BoxedIntegrator>,
    timestep: f64, // fixed internal step
    enabled: bool,
    accumulated_time: f64, // frame time not yet consumed by whole steps
}

impl Engine {
    /// Engine with the given strategies and internal step (clamped to
    /// `MIN_TIMESTEP`)
    pub fn new(force_calculator: BoxedForceCalculator, integrator: BoxedIntegrator, timestep: f64) -> Self {
        Self {
            force_calculator: Some(force_calculator),
            integrator: Some(integrator),
            timestep: clamp_timestep(timestep),
            enabled: true,
            accumulated_time: 0.0,
        }
    }

    /// Replace the force calculator. Body state is untouched.
    pub fn set_force_calculator(&mut self, force_calculator: BoxedForceCalculator) {
        self.force_calculator = Some(force_calculator);
    }

    /// Replace the integrator. The new one starts without any history.
    pub fn set_integrator(&mut self, integrator: BoxedIntegrator) {
        self.integrator = Some(integrator);
    }

    pub fn clear_force_calculator(&mut self) {
        self.force_calculator = None;
    }

    pub fn clear_integrator(&mut self) {
        self.integrator = None;
    }

    pub fn force_calculator(&self) -> Option<&(dyn ForceCalculator + Send + Sync)> {
        self.force_calculator.as_deref()
    }

    pub fn integrator(&self) -> Option<&(dyn Integrator + Send + Sync)> {
        self.integrator.as_deref()
    }

    pub fn set_timestep(&mut self, timestep: f64) {
        self.timestep = clamp_timestep(timestep);
    }

    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn accumulated_time(&self) -> f64 {
        self.accumulated_time
    }

    /// Advance `bodies` by `delta_time` worth of fixed steps.
    ///
    /// The delta is added to an accumulator; every whole internal step in it
    /// computes forces from the current positions, integrates once and
    /// consumes one step. Leftover time carries over to the next call.
    ///
    /// Nothing happens (and nothing accumulates) while the engine is
    /// disabled or lacks a calculator or an integrator. Returns the number
    /// of internal steps taken.
    pub fn update(&mut self, bodies: &mut [Body], delta_time: f64) -> usize {
        if !self.enabled {
            return 0;
        }
        let (Some(force_calculator), Some(integrator)) =
            (self.force_calculator.as_ref(), self.integrator.as_mut())
        else {
            return 0;
        };

        self.accumulated_time += delta_time;

        let mut steps = 0;
        while self.accumulated_time >= self.timestep {
            let forces = force_calculator.calculate_forces(bodies);
            integrator.integrate(bodies, &forces, self.timestep);
            self.accumulated_time -= self.timestep;
            steps += 1;
        }

        log::trace!(
            "engine update: {steps} step(s) of {} with {}/{}, {} carried over",
            self.timestep,
            force_calculator.name(),
            integrator.name(),
            self.accumulated_time
        );
        steps
    }

    /// Total mechanical energy: sum of 1/2 m v² plus -G m_i m_j / r over
    /// unordered pairs.
    ///
    /// Diagnostic only. Pairs closer than [`ENERGY_MIN_DISTANCE`] are
    /// skipped. G comes from the active force calculator; without one the
    /// potential term is left out.
    pub fn total_energy(&self, bodies: &[Body]) -> f64 {
        let kinetic: f64 = bodies.iter().map(Body::kinetic_energy).sum();

        let Some(force_calculator) = self.force_calculator.as_ref() else {
            return kinetic;
        };
        let g = force_calculator.gravitational_constant();

        let mut potential = 0.0;
        for (i, bi) in bodies.iter().enumerate() {
            for bj in &bodies[i + 1..] {
                let distance = bi.distance_to(bj);
                if distance > ENERGY_MIN_DISTANCE {
                    potential -= g * bi.m * bj.m / distance;
                }
            }
        }

        kinetic + potential
    }

    /// Field at `point` from the active calculator, zero when there is none
    pub fn field_at(&self, point: NVec2, bodies: &[Body]) -> NVec2 {
        match &self.force_calculator {
            Some(fc) => fc.field_at(point, bodies),
            None => NVec2::zeros(),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Box::new(BruteForce::default()), Box::new(Verlet::new()), DEFAULT_TIMESTEP)
    }
}
