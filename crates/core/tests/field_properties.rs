//! Field-level invariants of the stable-fluids pipeline
//!
//! Every scenario runs on the CPU backend so results are reproducible on
//! machines without a GPU.

use approx::assert_relative_eq;
use fluid_sim_core::solver::{
    BackendPreference, CpuFluidSolver, FieldId, FluidSolver, Operator, Slot,
};
use fluid_sim_core::{Grid, PointerSample, Simulation, SimulationParams, TickOutcome};
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn cpu_simulation(width: u32, height: u32, params: SimulationParams) -> Simulation {
    Simulation::with_backend(width, height, params, BackendPreference::Cpu).unwrap()
}

fn random_field(rng: &mut StdRng, len: usize, range: std::ops::Range<f32>) -> Vec<f32> {
    (0..len).map(|_| rng.random_range(range.clone())).collect()
}

fn seed_fields(sim: &mut Simulation, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let cells = sim.grid().cell_count();
    sim.write_field(FieldId::Velocity, &random_field(&mut rng, cells * 2, -2.0..2.0))
        .unwrap();
    sim.write_field(FieldId::Density, &random_field(&mut rng, cells, 0.0..1.0))
        .unwrap();
    sim.write_field(FieldId::Temperature, &random_field(&mut rng, cells, 0.0..1.0))
        .unwrap();
}

fn max_value(sim: &Simulation, field: FieldId) -> f32 {
    sim.read_field(field)
        .unwrap()
        .iter()
        .fold(f32::MIN, |acc, v| acc.max(*v))
}

/// Assert `edge = scale × inward neighbour` on every edge cell
fn assert_edges(sim: &Simulation, field: FieldId, scale: f32) {
    let grid = sim.grid();
    let (w, h) = (grid.width(), grid.height());
    let channels = field.channels();
    let data = sim.read_field(field).unwrap();

    for y in 0..h {
        for x in 0..w {
            let nx = x.clamp(1, w - 2);
            let ny = y.clamp(1, h - 2);
            if nx == x && ny == y {
                continue;
            }
            for c in 0..channels {
                let edge = data[grid.index(x, y) * channels + c];
                let inner = data[grid.index(nx, ny) * channels + c];
                assert_eq!(
                    edge,
                    scale * inner,
                    "{field} channel {c} at ({x}, {y}) breaks the boundary condition"
                );
            }
        }
    }
}

#[test]
fn test_boundary_sign_after_tick() {
    let mut sim = cpu_simulation(40, 30, SimulationParams::default());
    seed_fields(&mut sim, 7);

    for _ in 0..3 {
        sim.tick(&PointerSample::idle());
    }

    assert_edges(&sim, FieldId::Velocity, -1.0);
    assert_edges(&sim, FieldId::Pressure, 1.0);
}

#[test]
fn test_dissipation_keeps_scalars_bounded() {
    let mut sim = cpu_simulation(48, 48, SimulationParams::default());
    seed_fields(&mut sim, 11);

    let mut density_max = max_value(&sim, FieldId::Density);
    let mut temperature_max = max_value(&sim, FieldId::Temperature);
    for tick in 0..20 {
        sim.tick(&PointerSample::idle());
        let density = max_value(&sim, FieldId::Density);
        let temperature = max_value(&sim, FieldId::Temperature);
        assert!(density <= density_max, "density grew on tick {tick}");
        assert!(temperature <= temperature_max, "temperature grew on tick {tick}");
        density_max = density;
        temperature_max = temperature;
    }
}

#[test]
fn test_dissipation_scales_still_fluid() {
    let mut params = SimulationParams::default();
    params.features.buoyancy = false;
    params.features.vorticity = false;
    let mut sim = cpu_simulation(16, 16, params);

    let density = vec![0.5; 16 * 16];
    sim.write_field(FieldId::Density, &density).unwrap();
    sim.tick(&PointerSample::idle());

    let after = sim.read_field(FieldId::Density).unwrap();
    for value in after.iter() {
        assert_relative_eq!(*value, 0.5 * 0.998, epsilon = 1e-6);
    }
}

#[test]
fn test_reset_is_idempotent() {
    let mut sim = cpu_simulation(32, 24, SimulationParams::default());
    seed_fields(&mut sim, 3);
    sim.tick(&PointerSample::at(Vector2::new(10.0, 10.0), true, true));
    sim.tick(&PointerSample::at(Vector2::new(14.0, 12.0), true, true));

    let slots: Vec<Slot> = FieldId::ALL
        .iter()
        .map(|f| sim.solver().current_slot(*f))
        .collect();

    sim.reset();
    for field in FieldId::ALL {
        assert!(
            sim.read_field(field).unwrap().iter().all(|v| *v == 0.0),
            "{field} not cleared"
        );
    }
    let after_first: Vec<Slot> = FieldId::ALL
        .iter()
        .map(|f| sim.solver().current_slot(*f))
        .collect();
    assert_eq!(slots, after_first, "reset must not move selectors");

    sim.reset();
    for field in FieldId::ALL {
        assert!(sim.read_field(field).unwrap().iter().all(|v| *v == 0.0));
    }
}

#[test]
fn test_splat_is_local() {
    let params = SimulationParams::default();
    let grid = Grid::new(256, 192, params.grid_scale).unwrap();
    let mut solver = CpuFluidSolver::new(grid);

    solver.apply(
        &Operator::Splat {
            field: FieldId::Density,
            point: Vector2::new(100.0, 50.0),
            color: Vector2::new(1.0, 0.0),
            radius: 0.01,
        },
        &params,
    );

    let density = solver.read_field(FieldId::Density).unwrap();
    assert_relative_eq!(density[grid.index(100, 50)], 1.0);
    for (x, y) in [(99, 50), (101, 50), (100, 49), (100, 51)] {
        assert!(density[grid.index(x, y)] < 1e-30);
    }
    let far: f32 = (0..grid.height())
        .flat_map(|y| (0..grid.width()).map(move |x| (x, y)))
        .filter(|&(x, y)| x.abs_diff(100) > 1 || y.abs_diff(50) > 1)
        .map(|(x, y)| density[grid.index(x, y)])
        .sum();
    assert_eq!(far, 0.0);
}

#[test]
fn test_selector_tracks_latest_write() {
    let params = SimulationParams::default();
    let grid = Grid::new(8, 8, params.grid_scale).unwrap();
    let mut solver = CpuFluidSolver::new(grid);
    let splat = Operator::Splat {
        field: FieldId::Density,
        point: Vector2::new(4.0, 4.0),
        color: Vector2::new(1.0, 0.0),
        radius: 1.0,
    };

    solver.apply(&splat, &params);
    assert_eq!(solver.current_slot(FieldId::Density), Slot::B);
    let first = solver.read_field(FieldId::Density).unwrap().into_owned();
    assert!(solver
        .store()
        .target_of(FieldId::Density)
        .as_slice()
        .iter()
        .all(|v| *v == 0.0));

    solver.apply(&splat, &params);
    assert_eq!(solver.current_slot(FieldId::Density), Slot::A);
    // The slot written first is now the target and still holds its result
    assert_eq!(
        solver.store().target_of(FieldId::Density).as_slice(),
        first.as_slice()
    );
    let second = solver.read_field(FieldId::Density).unwrap();
    assert_relative_eq!(second[grid.index(4, 4)], 2.0);
}

#[test]
fn test_pause_freezes_every_field() {
    let mut sim = cpu_simulation(24, 24, SimulationParams::default());
    seed_fields(&mut sim, 21);
    sim.tick(&PointerSample::idle());

    let before: Vec<Vec<f32>> = FieldId::ALL
        .iter()
        .map(|f| sim.read_field(*f).unwrap().into_owned())
        .collect();

    sim.toggle_pause();
    for step in 0..10 {
        let position = Vector2::new(5.0 + step as f32, 5.0);
        assert_eq!(
            sim.tick(&PointerSample::at(position, true, true)),
            TickOutcome::Paused
        );
    }

    for (field, expected) in FieldId::ALL.iter().zip(&before) {
        assert_eq!(
            sim.read_field(*field).unwrap().as_ref(),
            expected.as_slice(),
            "{field} changed while paused"
        );
    }
}
