//! Fixed-step time integrators for the N-body system
//!
//! Provides explicit Euler and velocity Verlet behind the [`Integrator`]
//! strategy. Both consume a force array already computed by a
//! `ForceCalculator` and advance the bodies in place, index by index.

use super::states::{Body, NVec2};

/// Strategy for advancing body state by one step given the net forces.
///
/// `forces` must be co-indexed with `bodies` and of equal length. Bodies are
/// never reordered. Masses must be strictly positive; a zero mass yields
/// infinite or NaN state and is not guarded against.
pub trait Integrator {
    fn name(&self) -> &str;

    fn integrate(&mut self, bodies: &mut [Body], forces: &[NVec2], dt: f64);
}

/// Explicit first-order Euler
///
/// a = F / m
/// v_n+1 = v_n + a dt
/// x_n+1 = x_n + v_n+1 dt
#[derive(Debug, Clone, Default)]
pub struct Euler;

impl Integrator for Euler {
    fn name(&self) -> &str {
        "Euler"
    }

    fn integrate(&mut self, bodies: &mut [Body], forces: &[NVec2], dt: f64) {
        debug_assert_eq!(bodies.len(), forces.len(), "forces must be co-indexed with bodies");

        for (b, f) in bodies.iter_mut().zip(forces.iter()) {
            let a = *f / b.m;
            b.v += a * dt;
            b.x += b.v * dt;
            b.a = a;
        }
    }
}

/// Velocity Verlet driven by one force evaluation per step
///
/// Keeps the acceleration of the previous call for every body:
///
/// x_n+1 = x_n + v_n dt + a_prev dt²/2
/// v_n+1 = v_n + (a_prev + a_cur) dt/2
///
/// where `a_cur = F / m` from this call's forces. `a_cur` then becomes
/// `a_prev` for the next call.
///
/// The stored accelerations start at zero and are reset to zero whenever
/// the body count changes, since they can no longer be matched to bodies.
#[derive(Debug, Clone, Default)]
pub struct Verlet {
    previous: Vec<NVec2>,
}

impl Verlet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all stored accelerations
    pub fn reset(&mut self, body_count: usize) {
        self.previous.clear();
        self.previous.resize(body_count, NVec2::zeros());
    }

    /// Accelerations carried over from the last call
    pub fn previous_accelerations(&self) -> &[NVec2] {
        &self.previous
    }
}

impl Integrator for Verlet {
    fn name(&self) -> &str {
        "Verlet"
    }

    fn integrate(&mut self, bodies: &mut [Body], forces: &[NVec2], dt: f64) {
        debug_assert_eq!(bodies.len(), forces.len(), "forces must be co-indexed with bodies");

        if self.previous.len() != bodies.len() {
            self.reset(bodies.len());
        }

        let half_dt = 0.5 * dt;
        let half_dt2 = 0.5 * dt * dt;

        for ((b, f), a_prev) in bodies.iter_mut().zip(forces.iter()).zip(self.previous.iter_mut()) {
            let a_cur = *f / b.m;

            // Drift with last step's acceleration
            b.x += b.v * dt + *a_prev * half_dt2;

            // Kick with the average of last and current acceleration
            b.v += (*a_prev + a_cur) * half_dt;

            b.a = a_cur;
            *a_prev = a_cur;
        }
    }
}
