//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – force calculator, integrator, theta, internal step
//! - [`ParametersConfig`] – physical constants and the frame delta cap
//! - [`BodyConfig`]       – initial state for each body
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! An example scenario YAML matching these types:
//!
//! ```yaml
//! engine:
//!   force: "barnes_hut"     # or "brute_force"
//!   integrator: "verlet"    # or "euler"
//!   theta: 0.5              # optional
//!   timestep: 1.0e-4        # optional, internal fixed step
//!   enabled: true           # optional
//!
//! parameters:               # optional section
//!   G: 39.478               # gravitational constant
//!   softening: 1.0e-3       # minimum interaction distance
//!   max_frame_dt: 0.1       # largest frame delta handed to the engine
//!
//! bodies:
//!   - x: [ 0.0, 0.0 ]
//!     m: 1.0
//!   - x: [ 1.0, 0.0 ]
//!     v: [ 0.0, 6.28 ]      # optional, defaults to rest
//!     m: 3.0e-6
//! ```
//!
//! Loading always validates, so a [`ScenarioConfig`] obtained through
//! [`ScenarioConfig::from_yaml_str`] or [`ScenarioConfig::from_yaml_file`]
//! maps cleanly onto runtime bodies.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::simulation::params::{
    clamp_timestep, Parameters, DEFAULT_G, DEFAULT_MAX_FRAME_DT, DEFAULT_SOFTENING, DEFAULT_THETA,
    DEFAULT_TIMESTEP,
};
use crate::simulation::states::{Body, NVec2};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid body {index}: {reason}")]
    InvalidBody { index: usize, reason: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Which force calculator the engine starts with
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceConfig {
    #[serde(rename = "brute_force")] // Direct pairwise sum, exact up to softening
    BruteForce,

    #[serde(rename = "barnes_hut")] // Quadtree approximation controlled by theta
    BarnesHut,
}

/// Which integrator the engine starts with
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorConfig {
    #[serde(rename = "euler")] // First order, cheap
    Euler,

    #[serde(rename = "verlet")] // Velocity Verlet with stored previous accelerations
    Verlet,
}

/// Engine-level configuration
#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    pub force: ForceConfig,
    pub integrator: IntegratorConfig,
    pub theta: Option<f64>, // Barnes-Hut opening threshold
    pub timestep: Option<f64>, // fixed internal step
    pub enabled: Option<bool>, // start with physics running
}

/// Global physical parameters for a scenario
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ParametersConfig {
    #[serde(rename = "G")]
    pub g: Option<f64>, // gravitational constant
    pub softening: Option<f64>, // minimum interaction distance
    pub max_frame_dt: Option<f64>, // cap on a single frame delta
}

/// Configuration for a single body's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: Vec<f64>, // Initial position [x, y]
    #[serde(default)]
    pub v: Option<Vec<f64>>, // Initial velocity [vx, vy], at rest when omitted
    pub m: f64, // Mass, strictly positive
}

impl BodyConfig {
    /// Runtime body for entry `index` of the scenario
    pub fn to_body(&self, index: usize) -> Result<Body, ConfigError> {
        self.validate(index)?;
        let v = self.v.as_deref().map_or(NVec2::zeros(), vec2_from);
        Ok(Body::with_velocity(self.m, vec2_from(&self.x), v))
    }

    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBody { index, reason };

        if self.x.len() != 2 {
            return Err(invalid(format!("position needs 2 components, got {}", self.x.len())));
        }
        if let Some(v) = &self.v {
            if v.len() != 2 {
                return Err(invalid(format!("velocity needs 2 components, got {}", v.len())));
            }
        }
        let mut components = self.x.iter().chain(self.v.iter().flatten());
        if components.any(|c| !c.is_finite()) {
            return Err(invalid("position and velocity must be finite".to_string()));
        }
        if !(self.m.is_finite() && self.m > 0.0) {
            return Err(invalid(format!("mass must be positive and finite, got {}", self.m)));
        }
        Ok(())
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig, // Engine strategies and stepping
    #[serde(default)]
    pub parameters: ParametersConfig, // Physical constants
    pub bodies: Vec<BodyConfig>, // Initial state of the system, in index order
}

impl ScenarioConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let cfg: ScenarioConfig = serde_yaml::from_str(yaml)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let cfg: ScenarioConfig = serde_yaml::from_reader(reader)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every value the solver assumes without checking
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.parameters();

        check_parameter("G", p.g, |g| g >= 0.0)?;
        check_parameter("softening", p.softening, |s| s >= 0.0)?;
        check_parameter("theta", p.theta, |t| t >= 0.0)?;
        check_parameter("max_frame_dt", p.max_frame_dt, |dt| dt > 0.0)?;
        if let Some(timestep) = self.engine.timestep {
            check_parameter("timestep", timestep, |dt| dt > 0.0)?;
        }

        for (index, body) in self.bodies.iter().enumerate() {
            body.validate(index)?;
        }
        Ok(())
    }

    /// Runtime parameters with defaults filled in
    pub fn parameters(&self) -> Parameters {
        Parameters {
            g: self.parameters.g.unwrap_or(DEFAULT_G),
            softening: self.parameters.softening.unwrap_or(DEFAULT_SOFTENING),
            theta: self.engine.theta.unwrap_or(DEFAULT_THETA),
            timestep: clamp_timestep(self.engine.timestep.unwrap_or(DEFAULT_TIMESTEP)),
            max_frame_dt: self.parameters.max_frame_dt.unwrap_or(DEFAULT_MAX_FRAME_DT),
        }
    }
}

// Arity is checked by `BodyConfig::validate`
fn vec2_from(components: &[f64]) -> NVec2 {
    NVec2::new(components[0], components[1])
}

fn check_parameter(name: &str, value: f64, accept: impl Fn(f64) -> bool) -> Result<(), ConfigError> {
    if value.is_finite() && accept(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter(format!("{name} = {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_BODY: &str = r#"
engine:
  force: barnes_hut
  integrator: euler
  theta: 0.3
  timestep: 0.01
parameters:
  G: 1.0
  softening: 0.0001
bodies:
  - x: [-1.0, 0.0]
    m: 1.0
  - x: [1.0, 0.0]
    v: [0.0, 0.5]
    m: 2.0
"#;

    #[test]
    fn parses_full_scenario() {
        let cfg = ScenarioConfig::from_yaml_str(TWO_BODY).expect("valid scenario");

        assert_eq!(cfg.engine.force, ForceConfig::BarnesHut);
        assert_eq!(cfg.engine.integrator, IntegratorConfig::Euler);
        assert_eq!(cfg.bodies.len(), 2);

        let p = cfg.parameters();
        assert_eq!(p.g, 1.0);
        assert_eq!(p.theta, 0.3);
        assert_eq!(p.timestep, 0.01);
        assert_eq!(p.max_frame_dt, DEFAULT_MAX_FRAME_DT);

        let b = cfg.bodies[1].to_body(1).expect("valid body");
        assert_eq!(b.x, NVec2::new(1.0, 0.0));
        assert_eq!(b.v, NVec2::new(0.0, 0.5));
        assert_eq!(cfg.bodies[0].to_body(0).expect("valid body").v, NVec2::zeros());
    }

    #[test]
    fn missing_parameters_use_defaults() {
        let yaml = "engine: { force: brute_force, integrator: verlet }\nbodies: []\n";
        let cfg = ScenarioConfig::from_yaml_str(yaml).expect("valid scenario");

        assert_eq!(cfg.parameters(), Parameters::default());
        assert_eq!(cfg.engine.enabled, None);
    }

    #[test]
    fn tiny_timestep_is_clamped() {
        let yaml = "engine: { force: brute_force, integrator: verlet, timestep: 1.0e-9 }\nbodies: []\n";
        let cfg = ScenarioConfig::from_yaml_str(yaml).expect("valid scenario");
        assert_eq!(cfg.parameters().timestep, crate::simulation::params::MIN_TIMESTEP);
    }

    #[test]
    fn rejects_three_component_position() {
        let yaml = "engine: { force: brute_force, integrator: verlet }\nbodies:\n  - { x: [0.0, 0.0, 0.0], m: 1.0 }\n";
        let err = ScenarioConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBody { index: 0, .. }), "{err}");
    }

    #[test]
    fn hand_built_short_position_is_an_error() {
        let bc = BodyConfig {
            x: vec![1.0],
            v: None,
            m: 1.0,
        };
        let err = bc.to_body(3).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBody { index: 3, .. }), "{err}");
    }

    #[test]
    fn rejects_non_positive_mass() {
        let yaml = "engine: { force: brute_force, integrator: verlet }\nbodies:\n  - { x: [0.0, 0.0], m: 1.0 }\n  - { x: [1.0, 0.0], m: 0.0 }\n";
        let err = ScenarioConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBody { index: 1, .. }), "{err}");
    }

    #[test]
    fn rejects_negative_softening() {
        let yaml = "engine: { force: brute_force, integrator: verlet }\nparameters: { softening: -1.0 }\nbodies: []\n";
        let err = ScenarioConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter(_)), "{err}");
    }

    #[test]
    fn rejects_unknown_integrator() {
        let yaml = "engine: { force: brute_force, integrator: rk4 }\nbodies: []\n";
        let err = ScenarioConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)), "{err}");
    }
}
