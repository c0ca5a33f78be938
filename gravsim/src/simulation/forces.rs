//! Force calculators for the n-body engine
//!
//! Defines the [`ForceCalculator`] strategy and its two implementations:
//! direct pairwise Newtonian gravity ([`BruteForce`]) and the quadtree-backed
//! Barnes–Hut approximation ([`BarnesHut`]). Both use the same softened
//! inverse-square law, [`gravitational_pull`].

use crate::simulation::barnes_hut::QuadTree;
use crate::simulation::params::{DEFAULT_G, DEFAULT_SOFTENING, DEFAULT_THETA};
use crate::simulation::states::{Body, NVec2};

/// Pull exerted at `at` by a mass `mass` located at `source`, per unit
/// mass at `at`.
///
/// direction = normalize(source - at)
/// magnitude = G * mass / max(|source - at|, softening)^2
///
/// Softening caps the magnitude at close range instead of letting it
/// diverge. Coincident points have no direction and give zero.
pub fn gravitational_pull(at: NVec2, source: NVec2, mass: f64, g: f64, softening: f64) -> NVec2 {
    let r = source - at;
    let dist = r.norm();
    let soft_dist = dist.max(softening);
    if dist == 0.0 || soft_dist <= 0.0 {
        return NVec2::zeros();
    }
    let magnitude = g * mass / (soft_dist * soft_dist);
    r * (magnitude / dist)
}

/// Strategy for computing the net gravitational force on every body.
///
/// Implementations never mutate the bodies. The returned vector has the
/// same length and order as the input; an empty input gives an empty output.
pub trait ForceCalculator {
    fn name(&self) -> &str;

    fn gravitational_constant(&self) -> f64;

    fn softening(&self) -> f64;

    /// Net force on each body, co-indexed with `bodies`
    fn calculate_forces(&self, bodies: &[Body]) -> Vec<NVec2>;

    /// Gravitational field (force per unit mass) at an arbitrary point.
    /// A body sitting exactly on `point` contributes nothing.
    fn field_at(&self, point: NVec2, bodies: &[Body]) -> NVec2;
}

/// Direct O(n²) Newtonian gravity with distance-floor softening.
///
/// This is the reference implementation the approximate method is checked
/// against.
#[derive(Debug, Clone, PartialEq)]
pub struct BruteForce {
    pub g: f64, // gravitational constant
    pub softening: f64, // minimum interaction distance
}

impl BruteForce {
    pub fn new(g: f64) -> Self {
        Self {
            g,
            softening: DEFAULT_SOFTENING,
        }
    }

    pub fn with_softening(mut self, softening: f64) -> Self {
        self.softening = softening;
        self
    }
}

impl Default for BruteForce {
    fn default() -> Self {
        Self::new(DEFAULT_G)
    }
}

impl ForceCalculator for BruteForce {
    fn name(&self) -> &str {
        "brute force"
    }

    fn gravitational_constant(&self) -> f64 {
        self.g
    }

    fn softening(&self) -> f64 {
        self.softening
    }

    fn calculate_forces(&self, bodies: &[Body]) -> Vec<NVec2> {
        let n = bodies.len();
        let mut out = vec![NVec2::zeros(); n];

        // Loop over each unordered pair (i, j) with i < j
        for i in 0..n {
            let bi = &bodies[i];

            for j in (i + 1)..n {
                let bj = &bodies[j];

                // Force on i due to j: pull of j at i, scaled by i's mass
                let f = gravitational_pull(bi.x, bj.x, bj.m, self.g, self.softening) * bi.m;

                // Equal and opposite
                out[i] += f;
                out[j] -= f;
            }
        }

        out
    }

    fn field_at(&self, point: NVec2, bodies: &[Body]) -> NVec2 {
        bodies.iter().fold(NVec2::zeros(), |field, b| {
            field + gravitational_pull(point, b.x, b.m, self.g, self.softening)
        })
    }
}

/// Newtonian gravity evaluated via a Barnes–Hut quadtree
///
/// Builds a fresh [`QuadTree`] on every call and gets approximate
/// O(N log N) forces controlled by `theta` (opening threshold) and
/// `softening`.
#[derive(Debug, Clone, PartialEq)]
pub struct BarnesHut {
    pub g: f64,
    pub theta: f64,
    pub softening: f64,
}

impl BarnesHut {
    pub fn new(g: f64, theta: f64, softening: f64) -> Self {
        Self { g, theta, softening }
    }
}

impl Default for BarnesHut {
    fn default() -> Self {
        Self::new(DEFAULT_G, DEFAULT_THETA, DEFAULT_SOFTENING)
    }
}

impl ForceCalculator for BarnesHut {
    fn name(&self) -> &str {
        "Barnes-Hut"
    }

    fn gravitational_constant(&self) -> f64 {
        self.g
    }

    fn softening(&self) -> f64 {
        self.softening
    }

    fn calculate_forces(&self, bodies: &[Body]) -> Vec<NVec2> {
        if bodies.is_empty() {
            return Vec::new();
        }

        let tree = QuadTree::build(bodies);
        bodies
            .iter()
            .map(|b| tree.force_at(b.x, self.theta, self.g, self.softening) * b.m)
            .collect()
    }

    fn field_at(&self, point: NVec2, bodies: &[Body]) -> NVec2 {
        if bodies.is_empty() {
            return NVec2::zeros();
        }
        QuadTree::build(bodies).force_at(point, self.theta, self.g, self.softening)
    }
}
