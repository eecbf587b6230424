//! Fluid solver trait definition
//!
//! This module defines the `FluidSolver` trait, the backend-agnostic
//! interface over the double-buffered field store. Both the CPU and the GPU
//! implementation run the same operators with the same uniform blocks.

use super::boundary;
use super::fields::FieldId;
use super::operator::{Operator, PassUniforms};
use super::store::Slot;
use crate::config::SimulationParams;
use crate::error::SolverError;
use crate::grid::Grid;
use std::borrow::Cow;

/// Backend-agnostic interface for the stable-fluids pipeline
///
/// A backend owns one field store sized to its grid. Every call completes
/// its pass before returning, so passes never overlap.
pub trait FluidSolver: Send + Sync {
    /// Run one operator over every cell and commit its target field
    ///
    /// Does not apply boundary conditions; use [`FluidSolver::apply`].
    fn dispatch(&mut self, op: &Operator, uniforms: &PassUniforms);

    /// Zero both buffers of `field`, leaving its selector untouched
    fn clear(&mut self, field: FieldId);

    /// Zero every field
    fn clear_all(&mut self) {
        for field in FieldId::ALL {
            self.clear(field);
        }
    }

    /// Read the committed buffer of a field
    ///
    /// Values are row-major with interleaved channels. The CPU backend
    /// borrows its buffer, the GPU backend returns an owned copy.
    ///
    /// # Errors
    ///
    /// [`SolverError::Readback`] if the GPU buffer could not be mapped.
    fn read_field(&self, field: FieldId) -> Result<Cow<'_, [f32]>, SolverError>;

    /// Overwrite the committed buffer of a field
    ///
    /// # Errors
    ///
    /// [`SolverError::FieldSize`] if `data` is not `cells × channels` long.
    fn write_field(&mut self, field: FieldId, data: &[f32]) -> Result<(), SolverError>;

    /// Slot currently selected for `field`
    fn current_slot(&self, field: FieldId) -> Slot;

    /// Grid this solver was allocated for
    fn grid(&self) -> Grid;

    /// Check if this is the GPU backend
    fn is_gpu_accelerated(&self) -> bool;

    /// Run `op` and, when it wrote velocity or pressure, the boundary pass
    /// on the buffer it just committed
    fn apply(&mut self, op: &Operator, params: &SimulationParams) {
        let grid = self.grid();
        self.dispatch(op, &op.uniforms(&grid, params));

        if params.features.boundaries {
            if let Some(edge) = boundary::enforce_after(op) {
                self.dispatch(&edge, &edge.uniforms(&grid, params));
            }
        }
    }
}

/// Check an upload against the field's shape on `grid`
pub(crate) fn check_field_len(grid: &Grid, field: FieldId, len: usize) -> Result<(), SolverError> {
    let expected = grid.cell_count() * field.channels();
    if len == expected {
        Ok(())
    } else {
        Err(SolverError::FieldSize {
            field,
            expected,
            actual: len,
        })
    }
}
