//! Pressure projection validation
//!
//! Checks that the divergence / Jacobi / gradient sequence removes the
//! divergent part of a smooth velocity field, and that the Jacobi kernel on
//! its own spreads a point source symmetrically.

use approx::assert_relative_eq;
use fluid_sim_core::solver::{CpuFluidSolver, FieldId, FluidSolver, Operator};
use fluid_sim_core::{Grid, SimulationParams};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Radial outflow `(x - c) · exp(-r² / 2σ²)` centred on the grid
fn radial_outflow(grid: &Grid, sigma: f32) -> Vec<f32> {
    let center = grid.center();
    let mut velocity = vec![0.0; grid.cell_count() * 2];
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let dx = x as f32 - center.x;
            let dy = y as f32 - center.y;
            let falloff = (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp();
            let i = grid.index(x, y) * 2;
            velocity[i] = dx * falloff;
            velocity[i + 1] = dy * falloff;
        }
    }
    velocity
}

/// L2 norm of the divergence over cells at least two away from the edge
fn divergence_norm(solver: &mut CpuFluidSolver, params: &SimulationParams) -> f32 {
    solver.apply(&Operator::Divergence, params);
    let grid = solver.grid();
    let divergence = solver.read_field(FieldId::Divergence).unwrap();

    let mut sum = 0.0;
    for y in 2..grid.height() - 2 {
        for x in 2..grid.width() - 2 {
            let d = divergence[grid.index(x, y)];
            sum += d * d;
        }
    }
    sum.sqrt()
}

/// The projection half of a tick
fn project(solver: &mut CpuFluidSolver, params: &SimulationParams, iterations: u32) {
    let (alpha, beta) = params.pressure_coefficients();
    solver.apply(&Operator::Divergence, params);
    solver.clear(FieldId::Pressure);
    for _ in 0..iterations {
        solver.apply(
            &Operator::JacobiScalar {
                x: FieldId::Pressure,
                b: FieldId::Divergence,
                alpha,
                beta,
            },
            params,
        );
    }
    solver.apply(&Operator::Gradient, params);
}

fn projected_divergence(iterations: u32) -> (f32, f32) {
    let params = SimulationParams::default();
    let grid = Grid::new(64, 64, params.grid_scale).unwrap();
    let mut solver = CpuFluidSolver::new(grid);
    solver
        .write_field(FieldId::Velocity, &radial_outflow(&grid, 3.0))
        .unwrap();

    let before = divergence_norm(&mut solver, &params);
    project(&mut solver, &params, iterations);
    let after = divergence_norm(&mut solver, &params);
    (before, after)
}

#[test]
fn test_projection_reduces_divergence() {
    let (before, after) = projected_divergence(50);
    assert!(before > 1.0, "initial field should diverge: {before}");
    assert!(
        after < 0.5 * before,
        "projection should remove most divergence: before={before}, after={after}"
    );
}

#[test]
fn test_more_iterations_reduce_divergence_further() {
    let (_, few) = projected_divergence(5);
    let (_, many) = projected_divergence(80);
    assert!(
        many < few,
        "80 iterations ({many}) should beat 5 iterations ({few})"
    );
}

#[test]
fn test_jacobi_impulse_is_symmetric_and_decays() {
    let params = SimulationParams::default();
    let grid = Grid::new(65, 65, params.grid_scale).unwrap();
    let mut solver = CpuFluidSolver::new(grid);

    let mut divergence = vec![0.0; grid.cell_count()];
    divergence[grid.index(32, 32)] = 1.0;
    solver.write_field(FieldId::Divergence, &divergence).unwrap();

    let (alpha, beta) = params.pressure_coefficients();
    for _ in 0..params.jacobi_iterations {
        solver.apply(
            &Operator::JacobiScalar {
                x: FieldId::Pressure,
                b: FieldId::Divergence,
                alpha,
                beta,
            },
            &params,
        );
    }

    let pressure = solver.read_field(FieldId::Pressure).unwrap();
    let p = |x: u32, y: u32| pressure[grid.index(x, y)];

    assert!(p(32, 32) < 0.0, "positive divergence gives a pressure sink");
    for d in 1..=12 {
        let reference = p(32 + d, 32);
        for value in [p(32 - d, 32), p(32, 32 + d), p(32, 32 - d)] {
            assert_relative_eq!(value, reference, max_relative = 1e-4);
        }
        assert!(
            p(32 + d, 32).abs() < p(32 + d - 1, 32).abs(),
            "|p| should decrease with distance at r={d}"
        );
    }
}
