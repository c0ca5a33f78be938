use std::time::Instant;

use crate::simulation::engine::Engine;
use crate::simulation::forces::{BarnesHut, BruteForce, ForceCalculator};
use crate::simulation::integrator::{Euler, Verlet};
use crate::simulation::states::{Body, NVec2};

const G: f64 = 0.1;
const SOFTENING: f64 = 1.0e-2;
const THETA: f64 = 0.7;

/// Helper to build `n` unit-mass bodies on a deterministic point set
fn make_bodies(n: usize) -> Vec<Body> {
    (0..n)
        .map(|i| {
            let i_f = i as f64;
            // deterministic positions, no rand needed
            let x = NVec2::new((i_f * 0.37).sin() * 5.0, (i_f * 0.13).cos() * 5.0);
            Body::new(1.0, x)
        })
        .collect()
}

/// Time one force evaluation of brute force against Barnes-Hut for growing N
pub fn bench_forces() {
    let ns = [200, 400, 800, 1600, 3200, 6400];

    let direct = BruteForce::new(G).with_softening(SOFTENING);
    let bh = BarnesHut::new(G, THETA, SOFTENING);

    for n in ns {
        let bodies = make_bodies(n);

        // Warm up
        let _ = direct.calculate_forces(&bodies);
        let _ = bh.calculate_forces(&bodies);

        // Time direct
        let t0 = Instant::now();
        let f_direct = direct.calculate_forces(&bodies);
        let dt_direct = t0.elapsed().as_secs_f64();

        // Time barnes-hut
        let t1 = Instant::now();
        let f_bh = bh.calculate_forces(&bodies);
        let dt_bh = t1.elapsed().as_secs_f64();

        // Mean relative error of the approximation
        let err = f_direct
            .iter()
            .zip(&f_bh)
            .map(|(d, b)| (d - b).norm() / d.norm().max(f64::EPSILON))
            .sum::<f64>()
            / n as f64;

        println!("N = {n:5}, direct = {dt_direct:8.6} s, BH = {dt_bh:8.6} s, mean rel err = {err:.2e}");
    }
}

/// Relative energy drift of Euler vs Verlet on a two-body circular orbit
pub fn bench_energy_drift() {
    let step_counts = [100, 1000, 10000];
    let dt = 1.0e-3;

    println!("steps,euler_drift,verlet_drift");

    for steps in step_counts {
        let euler = run_orbit(Engine::new(Box::new(orbit_forces()), Box::new(Euler), dt), steps, dt);
        let verlet = run_orbit(Engine::new(Box::new(orbit_forces()), Box::new(Verlet::new()), dt), steps, dt);

        println!("{steps},{euler:.6e},{verlet:.6e}");
    }
}

fn orbit_forces() -> BruteForce {
    BruteForce::new(1.0).with_softening(1.0e-3)
}

/// Heavy body at the origin, light body on a unit circular orbit.
/// Returns |E_end - E_start| / |E_start|.
fn run_orbit(mut engine: Engine, steps: usize, dt: f64) -> f64 {
    let light = 1.0e-3;
    let mut bodies = vec![
        Body::with_velocity(1.0, NVec2::zeros(), NVec2::new(0.0, -light)),
        Body::with_velocity(light, NVec2::new(1.0, 0.0), NVec2::new(0.0, 1.0)),
    ];

    let e0 = engine.total_energy(&bodies);
    for _ in 0..steps {
        engine.update(&mut bodies, dt);
    }
    let e1 = engine.total_energy(&bodies);

    ((e1 - e0) / e0).abs()
}
