use gravsim::{bench_energy_drift, bench_forces};
use gravsim::{FieldGrid, Scenario, ScenarioConfig};

use anyhow::{Context, Result};
use clap::Parser;

use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Headless 2D gravity simulation")]
struct Args {
    /// Scenario file, looked up as given and then under scenarios/
    #[arg(short, default_value = "test_file.yaml")]
    file_name: String,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: usize,

    /// Wall-clock delta handed to the engine per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    frame_dt: f64,

    /// Log energy drift every K frames
    #[arg(long, default_value_t = 60)]
    report_every: usize,

    /// Run the benchmark reports instead of a scenario
    #[arg(long)]
    bench: bool,

    /// Print the field on a (2N+1)^2 grid as CSV after the run
    #[arg(long)]
    field_grid: Option<usize>,

    #[arg(long, default_value_t = 1.0)]
    field_spacing: f64,
}

fn resolve_scenario_path(file_name: &str) -> PathBuf {
    let given = PathBuf::from(file_name);
    if given.exists() {
        return given;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.bench {
        bench_forces();
        bench_energy_drift();
        return Ok(());
    }

    let config_path = resolve_scenario_path(&args.file_name);
    let scenario_cfg = ScenarioConfig::from_yaml_file(&config_path)
        .with_context(|| format!("failed to load scenario {}", config_path.display()))?;

    let mut scenario = Scenario::build_scenario(scenario_cfg)?;

    let e0 = scenario.total_energy();
    let mut steps = 0;

    for frame in 1..=args.frames {
        steps += scenario.update_physics(args.frame_dt);

        if args.report_every > 0 && frame % args.report_every == 0 {
            let e = scenario.total_energy();
            let drift = if e0 != 0.0 { ((e - e0) / e0).abs() } else { (e - e0).abs() };
            log::info!(
                "frame {frame:6}, t = {:10.5}, steps = {steps:8}, E = {e:.8e}, drift = {drift:.3e}",
                scenario.system.t
            );
        }
    }

    log::info!(
        "done: {} frames, {steps} steps, t = {}",
        args.frames,
        scenario.system.t
    );

    if let Some(half_cells) = args.field_grid {
        let grid = FieldGrid::sample(scenario.engine(), scenario.bodies(), half_cells, args.field_spacing);
        log::info!("field grid peak magnitude {:.6e}", grid.peak_magnitude());
        grid.write_csv(io::stdout().lock())?;
    }

    Ok(())
}
