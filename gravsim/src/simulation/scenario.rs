//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a runtime `Scenario`
//! containing:
//! - numerical parameters (`Parameters`)
//! - system state (`System` with bodies at t = 0)
//! - the stepping engine (`Engine`) with its active force calculator and
//!   integrator
//!
//! The scenario owns the body collection and is the place where strategies
//! are switched and parameters changed at runtime.

use crate::configuration::config::{ConfigError, ForceConfig, IntegratorConfig, ScenarioConfig};
use crate::simulation::engine::{BoxedForceCalculator, BoxedIntegrator, Engine};
use crate::simulation::forces::{BarnesHut, BruteForce};
use crate::simulation::integrator::{Euler, Verlet};
use crate::simulation::params::{clamp_timestep, Parameters};
use crate::simulation::states::{Body, NVec2, System};

/// Runtime bundle constructed from a [`ScenarioConfig`]
///
/// Bodies live in `system`; the engine only borrows them during an update.
pub struct Scenario {
    pub parameters: Parameters,
    pub system: System,
    engine: Engine,
    force: ForceConfig, // active calculator kind
    integrator: IntegratorConfig, // active integrator kind
}

impl Scenario {
    /// Validates `cfg` first, since it may have been built by hand rather
    /// than loaded through `ScenarioConfig::from_yaml_*`.
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;

        // Bodies: map `BodyConfig` -> runtime `Body` using nalgebra vectors
        let bodies = cfg
            .bodies
            .iter()
            .enumerate()
            .map(|(i, bc)| bc.to_body(i))
            .collect::<Result<Vec<Body>, _>>()?;

        // Initial system state: bodies at t = 0
        let system = System::new(bodies);

        let parameters = cfg.parameters();
        let force = cfg.engine.force;
        let integrator = cfg.engine.integrator;

        let mut engine = Engine::new(
            make_force_calculator(force, &parameters),
            make_integrator(integrator),
            parameters.timestep,
        );
        engine.set_enabled(cfg.engine.enabled.unwrap_or(true));

        log::info!(
            "built scenario: {} bodies, {:?} forces, {:?} integrator, timestep {}",
            system.len(),
            force,
            integrator,
            engine.timestep()
        );

        Ok(Self {
            parameters,
            system,
            engine,
            force,
            integrator,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn bodies(&self) -> &[Body] {
        &self.system.bodies
    }

    pub fn len(&self) -> usize {
        self.system.len()
    }

    pub fn is_empty(&self) -> bool {
        self.system.is_empty()
    }

    pub fn force_kind(&self) -> ForceConfig {
        self.force
    }

    pub fn integrator_kind(&self) -> IntegratorConfig {
        self.integrator
    }

    pub fn add_body(&mut self, body: Body) {
        self.system.add_body(body);
        self.restart_integrator();
    }

    /// Remove the body at `index`. Later bodies shift down by one.
    pub fn remove_body(&mut self, index: usize) -> Option<Body> {
        let removed = self.system.remove_body(index)?;
        self.restart_integrator();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.system.clear();
        self.restart_integrator();
    }

    /// Feed one frame delta to the engine.
    ///
    /// The delta is clamped to `[0, max_frame_dt]` so a stalled frame cannot
    /// queue an unbounded number of steps. Returns the steps taken.
    pub fn update_physics(&mut self, frame_dt: f64) -> usize {
        if self.system.is_empty() {
            return 0;
        }

        // NaN becomes 0 through f64::max
        let dt = frame_dt.max(0.0).min(self.parameters.max_frame_dt);
        if dt != frame_dt {
            log::debug!("frame delta {frame_dt} clamped to {dt}");
        }

        let steps = self.engine.update(&mut self.system.bodies, dt);
        self.system.t += steps as f64 * self.engine.timestep();
        steps
    }

    pub fn switch_to_brute_force(&mut self) {
        self.force = ForceConfig::BruteForce;
        self.rebuild_force_calculator();
        log::info!("switched to brute force");
    }

    pub fn switch_to_barnes_hut(&mut self) {
        self.force = ForceConfig::BarnesHut;
        self.rebuild_force_calculator();
        log::info!("switched to Barnes-Hut (theta = {})", self.parameters.theta);
    }

    pub fn switch_to_euler(&mut self) {
        self.integrator = IntegratorConfig::Euler;
        self.restart_integrator();
        log::info!("switched to Euler integrator");
    }

    pub fn switch_to_verlet(&mut self) {
        self.integrator = IntegratorConfig::Verlet;
        self.restart_integrator();
        log::info!("switched to Verlet integrator");
    }

    pub fn set_theta(&mut self, theta: f64) {
        self.parameters.theta = theta.max(0.0);
        self.rebuild_force_calculator();
    }

    pub fn set_softening(&mut self, softening: f64) {
        self.parameters.softening = softening.max(0.0);
        self.rebuild_force_calculator();
    }

    pub fn set_gravitational_constant(&mut self, g: f64) {
        self.parameters.g = g;
        self.rebuild_force_calculator();
    }

    pub fn set_timestep(&mut self, timestep: f64) {
        self.parameters.timestep = clamp_timestep(timestep);
        self.engine.set_timestep(self.parameters.timestep);
    }

    pub fn set_physics_enabled(&mut self, enabled: bool) {
        self.engine.set_enabled(enabled);
        log::info!("physics {}", if enabled { "enabled" } else { "paused" });
    }

    pub fn total_energy(&self) -> f64 {
        self.engine.total_energy(&self.system.bodies)
    }

    pub fn field_at(&self, point: NVec2) -> NVec2 {
        self.engine.field_at(point, &self.system.bodies)
    }

    fn rebuild_force_calculator(&mut self) {
        self.engine
            .set_force_calculator(make_force_calculator(self.force, &self.parameters));
    }

    // Stored Verlet accelerations are keyed by index, so any change to the
    // body list starts the integrator over.
    fn restart_integrator(&mut self) {
        self.engine.set_integrator(make_integrator(self.integrator));
    }
}

fn make_force_calculator(kind: ForceConfig, p: &Parameters) -> BoxedForceCalculator {
    match kind {
        ForceConfig::BruteForce => Box::new(BruteForce::new(p.g).with_softening(p.softening)),
        ForceConfig::BarnesHut => Box::new(BarnesHut::new(p.g, p.theta, p.softening)),
    }
}

fn make_integrator(kind: IntegratorConfig) -> BoxedIntegrator {
    match kind {
        IntegratorConfig::Euler => Box::new(Euler),
        IntegratorConfig::Verlet => Box::new(Verlet::new()),
    }
}
