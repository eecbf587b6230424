//! Headless stable-fluids runner
//!
//! Drives the simulation with a scripted pointer (a circular stroke that
//! injects velocity, density and temperature) and prints periodic field
//! statistics.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package demo-headless -- --ticks 600 --params params.json
//! ```

use clap::Parser;
use fluid_sim_core::solver::{BackendPreference, FieldId, QualityPreset};
use fluid_sim_core::{Grid, PointerSample, Simulation, SimulationParams};
use nalgebra::Vector2;
use std::f32::consts::TAU;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Stable-fluids headless demo
#[derive(Parser, Debug)]
#[command(name = "fluid-sim-headless")]
#[command(about = "Run the stable-fluids simulation without a window", long_about = None)]
struct Args {
    /// Display width the grid is derived from, in pixels
    #[arg(long, default_value_t = 1366)]
    display_width: u32,

    /// Display height the grid is derived from, in pixels
    #[arg(long, default_value_t = 768)]
    display_height: u32,

    /// Grid quality (ultra, high, medium, low)
    #[arg(short, long, default_value = "medium")]
    quality: String,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 300)]
    ticks: u64,

    /// Print statistics every N ticks
    #[arg(short, long, default_value_t = 50)]
    report_interval: u64,

    /// JSON file with simulation parameters (missing keys take defaults)
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Print the default parameters as JSON and exit
    #[arg(long)]
    dump_params: bool,

    /// Force the CPU backend
    #[arg(long)]
    cpu: bool,

    /// Pointer stroke radius as a fraction of the grid height
    #[arg(long, default_value_t = 0.25)]
    stroke: f32,

    /// Ticks per full revolution of the stroke
    #[arg(long, default_value_t = 120)]
    period: u64,

    /// Pause the simulation for this many ticks halfway through
    #[arg(long, default_value_t = 0)]
    pause_ticks: u64,

    /// Run the built-in checks instead of the scripted stroke
    #[arg(short, long)]
    validate: bool,
}

/// Per-report field summary
struct FieldStats {
    max_speed: f32,
    total_density: f32,
    max_temperature: f32,
    max_divergence: f32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.dump_params {
        return match serde_json::to_string_pretty(&SimulationParams::default()) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to serialize parameters: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let params = match load_params(args.params.as_ref()) {
        Ok(params) => params,
        Err(message) => {
            error!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    if args.validate {
        return if run_validation_checks(&params) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    match run(&args, params) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn parse_quality(name: &str) -> QualityPreset {
    match name.to_lowercase().as_str() {
        "ultra" => QualityPreset::Ultra,
        "high" => QualityPreset::High,
        "medium" => QualityPreset::Medium,
        "low" => QualityPreset::Low,
        _ => {
            println!("Unknown quality '{}', using recommended", name);
            QualityPreset::recommended()
        }
    }
}

fn load_params(path: Option<&PathBuf>) -> Result<SimulationParams, String> {
    let Some(path) = path else {
        return Ok(SimulationParams::default());
    };
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let params: SimulationParams = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
    info!("Loaded parameters from {}", path.display());
    Ok(params)
}

fn run(args: &Args, params: SimulationParams) -> Result<(), String> {
    let preset = parse_quality(&args.quality);
    let grid = Grid::from_display(
        args.display_width,
        args.display_height,
        preset,
        params.grid_scale,
    )
    .map_err(|e| e.to_string())?;
    let backend = if args.cpu {
        BackendPreference::Cpu
    } else {
        BackendPreference::Auto
    };
    let mut sim = Simulation::with_backend(grid.width(), grid.height(), params, backend)
        .map_err(|e| e.to_string())?;

    println!("=== Stable Fluids Demo ===\n");
    println!(
        "Grid: {}x{} ({:?} quality from {}x{} display), backend: {}",
        grid.width(),
        grid.height(),
        preset,
        args.display_width,
        args.display_height,
        if sim.is_gpu_accelerated() { "GPU" } else { "CPU" }
    );
    println!("Running {} ticks...\n", args.ticks);
    println!("  Tick | Max Speed | Total Density | Max Temp | Max |div| | Tick (ms)");
    println!("-------|-----------|---------------|----------|-----------|----------");

    let pause_at = args.ticks / 2;
    for tick in 0..args.ticks {
        if args.pause_ticks > 0 && tick == pause_at {
            sim.toggle_pause();
        }
        if args.pause_ticks > 0 && tick == pause_at + args.pause_ticks {
            sim.toggle_pause();
        }

        sim.tick(&stroke_sample(&grid, tick, args.stroke, args.period));

        if args.report_interval > 0 && (tick + 1) % args.report_interval == 0 {
            let stats = field_stats(&sim).map_err(|e| e.to_string())?;
            println!(
                "{:6} | {:9.3} | {:13.3} | {:8.4} | {:9.5} | {:8.3}{}",
                tick + 1,
                stats.max_speed,
                stats.total_density,
                stats.max_temperature,
                stats.max_divergence,
                sim.timer().last_frame_time_ms(),
                if sim.is_paused() { "  (paused)" } else { "" }
            );
        }
    }

    let stats = field_stats(&sim).map_err(|e| e.to_string())?;
    let summary = serde_json::json!({
        "grid": { "width": grid.width(), "height": grid.height() },
        "gpu": sim.is_gpu_accelerated(),
        "ticks": sim.ticks(),
        "mean_tick_ms": sim.timer().mean_frame_time_ms(),
        "max_speed": stats.max_speed,
        "total_density": stats.total_density,
        "max_temperature": stats.max_temperature,
        "max_divergence": stats.max_divergence,
    });

    println!("\n=== Simulation Complete ===");
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?
    );
    Ok(())
}

/// Pointer on a circle around the grid centre, primary and secondary held
fn stroke_sample(grid: &Grid, tick: u64, stroke: f32, period: u64) -> PointerSample {
    let angle = (tick % period.max(1)) as f32 / period.max(1) as f32 * TAU;
    let radius = stroke * grid.height() as f32;
    let position = grid.center() + Vector2::new(angle.cos(), angle.sin()) * radius;
    PointerSample::at(position, true, true)
}

fn field_stats(sim: &Simulation) -> Result<FieldStats, fluid_sim_core::SolverError> {
    let velocity = sim.read_field(FieldId::Velocity)?;
    let max_speed = velocity
        .chunks_exact(2)
        .map(|v| (v[0] * v[0] + v[1] * v[1]).sqrt())
        .fold(0.0_f32, f32::max);

    let total_density = sim.read_field(FieldId::Density)?.iter().sum();
    let max_temperature = sim
        .read_field(FieldId::Temperature)?
        .iter()
        .fold(0.0_f32, |acc, t| acc.max(*t));
    let max_divergence = sim
        .read_field(FieldId::Divergence)?
        .iter()
        .fold(0.0_f32, |acc, d| acc.max(d.abs()));

    Ok(FieldStats {
        max_speed,
        total_density,
        max_temperature,
        max_divergence,
    })
}

/// Quick behavioural checks on the CPU backend
fn run_validation_checks(params: &SimulationParams) -> bool {
    println!("\n=== Running Validation Checks ===\n");
    let mut passed = true;

    let new_sim = || {
        Simulation::with_backend(96, 64, params.clone(), BackendPreference::Cpu)
            .map_err(|e| e.to_string())
    };

    println!("Check 1: Pause freezes fields");
    let result = new_sim().and_then(|mut sim| {
        sim.tick(&PointerSample::at(Vector2::new(40.0, 30.0), false, true));
        let before = sim.read_field(FieldId::Density).map_err(|e| e.to_string())?.into_owned();
        sim.toggle_pause();
        sim.tick(&PointerSample::at(Vector2::new(44.0, 30.0), true, true));
        let after = sim.read_field(FieldId::Density).map_err(|e| e.to_string())?;
        Ok(before.as_slice() == after.as_ref())
    });
    passed &= report(result);

    println!("\nCheck 2: Reset clears every field");
    let result = new_sim().and_then(|mut sim| {
        sim.tick(&PointerSample::at(Vector2::new(40.0, 30.0), true, true));
        sim.tick(&PointerSample::at(Vector2::new(46.0, 34.0), true, true));
        sim.reset();
        let mut clear = true;
        for field in FieldId::ALL {
            let data = sim.read_field(field).map_err(|e| e.to_string())?;
            clear &= data.iter().all(|v| *v == 0.0);
        }
        Ok(clear)
    });
    passed &= report(result);

    println!("\nCheck 3: Velocity edges mirror their neighbours");
    let result = new_sim().and_then(|mut sim| {
        for i in 0..10 {
            let x = 30.0 + i as f32 * 3.0;
            sim.tick(&PointerSample::at(Vector2::new(x, 20.0), true, true));
        }
        let grid = sim.grid();
        let velocity = sim.read_field(FieldId::Velocity).map_err(|e| e.to_string())?;
        let left = velocity[grid.index(0, 20) * 2];
        let inner = velocity[grid.index(1, 20) * 2];
        println!("  Edge u: {:.5}, inward u: {:.5}", left, inner);
        Ok(left == -inner)
    });
    passed &= report(result);

    println!("\n=== Validation Complete ===");
    passed
}

fn report(result: Result<bool, String>) -> bool {
    match result {
        Ok(true) => {
            println!("  ✓ PASS");
            true
        }
        Ok(false) => {
            println!("  ✗ FAIL");
            false
        }
        Err(e) => {
            println!("  ✗ ERROR: {}", e);
            false
        }
    }
}
