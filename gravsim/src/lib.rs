pub mod simulation;
pub mod configuration;
pub mod visualization;
pub mod benchmark;

pub use simulation::states::{Body, System, NVec2};
pub use simulation::params::Parameters;
pub use simulation::barnes_hut::{Aabb, QuadNode, QuadTree};
pub use simulation::forces::{gravitational_pull, ForceCalculator, BruteForce, BarnesHut};
pub use simulation::integrator::{Integrator, Euler, Verlet};
pub use simulation::engine::Engine;
pub use simulation::scenario::Scenario;

pub use configuration::config::{ConfigError, ForceConfig, IntegratorConfig, EngineConfig, ParametersConfig, BodyConfig, ScenarioConfig};

pub use visualization::field_grid::{FieldGrid, FieldSample};

pub use benchmark::benchmark::{bench_forces, bench_energy_drift};
