//! Core state types for the 2D N-body simulation.
//!
//! Defines the point-mass `Body` and the `System` that owns them:
//! - `Body` carries mass, position, velocity and the last integrated acceleration
//! - `System` holds the ordered body collection and the elapsed simulation time `t`
//!
//! Insertion order of `System::bodies` is the canonical index order. Force
//! arrays produced by the calculators are co-indexed with it.

use nalgebra::Vector2;
pub type NVec2 = Vector2<f64>;

/// A point mass in the plane.
///
/// Mass must be strictly positive. This is a caller contract: the solver
/// divides by it without checking.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub m: f64, // mass
    pub x: NVec2, // position
    pub v: NVec2, // velocity
    pub a: NVec2, // acceleration from the last integration step
}

impl Body {
    /// Body at rest at `x`
    pub fn new(m: f64, x: NVec2) -> Self {
        Self::with_velocity(m, x, NVec2::zeros())
    }

    pub fn with_velocity(m: f64, x: NVec2, v: NVec2) -> Self {
        Self {
            m,
            x,
            v,
            a: NVec2::zeros(),
        }
    }

    pub fn mass(&self) -> f64 {
        self.m
    }

    pub fn position(&self) -> NVec2 {
        self.x
    }

    pub fn velocity(&self) -> NVec2 {
        self.v
    }

    pub fn acceleration(&self) -> NVec2 {
        self.a
    }

    /// Kinetic energy 1/2 m |v|^2
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.m * self.v.norm_squared()
    }

    pub fn distance_to(&self, other: &Body) -> f64 {
        (other.x - self.x).norm()
    }
}

#[derive(Debug, Clone, Default)]
pub struct System {
    pub bodies: Vec<Body>, // 2d collection of bodies
    pub t: f64, // time
}

impl System {
    pub fn new(bodies: Vec<Body>) -> Self {
        Self { bodies, t: 0.0 }
    }

    pub fn add_body(&mut self, body: Body) {
        self.bodies.push(body);
    }

    /// Remove the body at `index`, shifting later bodies down by one.
    /// Out-of-range indices are ignored.
    pub fn remove_body(&mut self, index: usize) -> Option<Body> {
        if index < self.bodies.len() {
            Some(self.bodies.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.m).sum()
    }

    /// Total linear momentum sum(m v)
    pub fn momentum(&self) -> NVec2 {
        self.bodies
            .iter()
            .fold(NVec2::zeros(), |p, b| p + b.v * b.m)
    }
}
