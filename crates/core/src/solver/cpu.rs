//! CPU-based fluid solver implementation
//!
//! This module provides a CPU implementation of the `FluidSolver` trait using
//! `Vec<f32>` fields and Rayon for parallelism. This backend is always available
//! and serves as a fallback when GPU acceleration is not available.

use super::advection::advect_cpu;
use super::boundary::boundary_cpu;
use super::fields::{FieldData, FieldId};
use super::forces::{buoyancy_cpu, splat_cpu, vorticity_cpu, vorticity_force_cpu};
use super::operator::{Operator, PassUniforms};
use super::projection::{divergence_cpu, gradient_cpu, jacobi_cpu};
use super::r#trait::check_field_len;
use super::store::{FieldStore, Slot};
use super::FluidSolver;
use crate::error::SolverError;
use crate::grid::Grid;
use std::borrow::Cow;

/// CPU-based fluid solver using Rayon for parallelism
///
/// Each pass moves the target buffer out of the store, fills it from the
/// committed buffers and commits it back.
pub struct CpuFluidSolver {
    store: FieldStore<FieldData>,
    grid: Grid,
}

impl CpuFluidSolver {
    /// Create a CPU solver with every field zeroed
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        let (width, height) = (grid.width() as usize, grid.height() as usize);
        let store = FieldStore::new(|field, _| FieldData::for_field(field, width, height));
        Self { store, grid }
    }

    /// Underlying double-buffered store
    #[must_use]
    pub fn store(&self) -> &FieldStore<FieldData> {
        &self.store
    }
}

impl FluidSolver for CpuFluidSolver {
    fn dispatch(&mut self, op: &Operator, uniforms: &PassUniforms) {
        let op = *op;
        self.store.write_pass(op.target(), |store, out| {
            let read = move |field| store.previous_of(field);
            match op {
                Operator::Advect { quantity, .. } => {
                    advect_cpu(read(FieldId::Velocity), read(quantity), out, uniforms);
                }
                Operator::Splat { field, .. } => splat_cpu(read(field), out, uniforms),
                Operator::Buoyancy => buoyancy_cpu(
                    read(FieldId::Velocity),
                    read(FieldId::Density),
                    read(FieldId::Temperature),
                    out,
                    uniforms,
                ),
                Operator::Vorticity => vorticity_cpu(read(FieldId::Velocity), out, uniforms),
                Operator::VorticityForce => vorticity_force_cpu(
                    read(FieldId::Velocity),
                    read(FieldId::Vorticity),
                    out,
                    uniforms,
                ),
                Operator::Divergence => divergence_cpu(read(FieldId::Velocity), out, uniforms),
                Operator::JacobiScalar { x, b, .. } | Operator::JacobiVector { x, b, .. } => {
                    jacobi_cpu(read(x), read(b), out, uniforms);
                }
                Operator::Gradient => gradient_cpu(
                    read(FieldId::Velocity),
                    read(FieldId::Pressure),
                    out,
                    uniforms,
                ),
                Operator::Boundary { field, .. } => boundary_cpu(read(field), out, uniforms),
                Operator::Copy { source, .. } => out.copy_channels_from(read(source)),
            }
        });
    }

    fn clear(&mut self, field: FieldId) {
        for buffer in self.store.slots_mut(field) {
            buffer.fill(0.0);
        }
    }

    fn read_field(&self, field: FieldId) -> Result<Cow<'_, [f32]>, SolverError> {
        Ok(Cow::Borrowed(self.store.current_of(field).as_slice()))
    }

    fn write_field(&mut self, field: FieldId, data: &[f32]) -> Result<(), SolverError> {
        check_field_len(&self.grid, field, data.len())?;
        self.store
            .current_mut(field)
            .as_mut_slice()
            .copy_from_slice(data);
        Ok(())
    }

    fn current_slot(&self, field: FieldId) -> Slot {
        self.store.current_slot(field)
    }

    fn grid(&self) -> Grid {
        self.grid
    }

    fn is_gpu_accelerated(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationParams;
    use nalgebra::Vector2;

    fn solver() -> CpuFluidSolver {
        CpuFluidSolver::new(Grid::new(16, 12, 1.0).unwrap())
    }

    #[test]
    fn test_new_solver_is_zeroed() {
        let solver = solver();
        for field in FieldId::ALL {
            let data = solver.read_field(field).unwrap();
            assert_eq!(data.len(), 16 * 12 * field.channels());
            assert!(data.iter().all(|&v| v == 0.0));
        }
        assert!(!solver.is_gpu_accelerated());
    }

    #[test]
    fn test_dispatch_commits_target_only() {
        let mut solver = solver();
        let params = SimulationParams::default();
        solver.apply(
            &Operator::Splat {
                field: FieldId::Density,
                point: Vector2::new(8.0, 6.0),
                color: Vector2::new(1.0, 0.0),
                radius: 2.0,
            },
            &params,
        );
        assert_eq!(solver.current_slot(FieldId::Density), Slot::B);
        assert_eq!(solver.current_slot(FieldId::Velocity), Slot::A);

        let density = solver.read_field(FieldId::Density).unwrap();
        assert!((density[6 * 16 + 8] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_velocity_write_runs_boundary_pass() {
        let mut solver = solver();
        let params = SimulationParams::default();
        solver.apply(
            &Operator::Splat {
                field: FieldId::Velocity,
                point: Vector2::new(1.0, 6.0),
                color: Vector2::new(3.0, 0.0),
                radius: 4.0,
            },
            &params,
        );
        // Splat plus boundary: two commits
        assert_eq!(solver.current_slot(FieldId::Velocity), Slot::A);

        let store = solver.store();
        let v = store.current_of(FieldId::Velocity);
        assert_eq!(v.get(0, 6, 0), -v.get(1, 6, 0));
    }

    #[test]
    fn test_boundaries_can_be_disabled() {
        let mut solver = solver();
        let mut params = SimulationParams::default();
        params.features.boundaries = false;
        solver.apply(&Operator::Gradient, &params);
        assert_eq!(solver.current_slot(FieldId::Velocity), Slot::B);
    }

    #[test]
    fn test_write_field_checks_length() {
        let mut solver = solver();
        let err = solver.write_field(FieldId::Velocity, &[0.0; 10]).unwrap_err();
        assert_eq!(
            err,
            SolverError::FieldSize {
                field: FieldId::Velocity,
                expected: 16 * 12 * 2,
                actual: 10
            }
        );

        let data = vec![0.5; 16 * 12];
        solver.write_field(FieldId::Pressure, &data).unwrap();
        assert_eq!(solver.read_field(FieldId::Pressure).unwrap().as_ref(), &data[..]);
    }

    #[test]
    fn test_clear_keeps_selector() {
        let mut solver = solver();
        solver.write_field(FieldId::Density, &[1.0; 16 * 12]).unwrap();
        solver.dispatch(
            &Operator::Copy {
                source: FieldId::Density,
                target: FieldId::Snapshot,
            },
            &PassUniforms::default(),
        );
        assert_eq!(solver.current_slot(FieldId::Snapshot), Slot::B);

        solver.clear_all();
        assert_eq!(solver.current_slot(FieldId::Snapshot), Slot::B);
        assert!(solver
            .read_field(FieldId::Snapshot)
            .unwrap()
            .iter()
            .all(|&v| v == 0.0));
    }
}
