//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - gravitational constant and softening length (`g`, `softening`),
//! - Barnes–Hut accuracy parameter `theta`,
//! - fixed internal step size and the per-frame delta cap
//!
//! Defaults use astronomical units: distances in AU, masses in solar
//! masses, time in years, so G = 4π².

/// G in AU^3 / (Msun * yr^2)
pub const DEFAULT_G: f64 = 39.478;

/// 0.001 AU, roughly 150,000 km
pub const DEFAULT_SOFTENING: f64 = 1.0e-3;

pub const DEFAULT_THETA: f64 = 0.5;

/// 1e-4 yr, a little under an hour
pub const DEFAULT_TIMESTEP: f64 = 1.0e-4;

/// Lower clamp for the internal step. Keeps the fixed-step loop finite.
pub const MIN_TIMESTEP: f64 = 1.0e-5;

pub const DEFAULT_MAX_FRAME_DT: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub g: f64, // gravitational constant
    pub softening: f64, // minimum interaction distance
    pub theta: f64, // barnes-hut opening threshold
    pub timestep: f64, // fixed internal step size
    pub max_frame_dt: f64, // largest frame delta fed to the engine
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            g: DEFAULT_G,
            softening: DEFAULT_SOFTENING,
            theta: DEFAULT_THETA,
            timestep: DEFAULT_TIMESTEP,
            max_frame_dt: DEFAULT_MAX_FRAME_DT,
        }
    }
}

/// Clamp a requested internal step to the supported minimum.
pub fn clamp_timestep(timestep: f64) -> f64 {
    // f64::max drops NaN in favour of the floor
    timestep.max(MIN_TIMESTEP)
}
