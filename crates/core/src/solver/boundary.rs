//! Boundary enforcement
//!
//! After every write to velocity or pressure the edge cells are rebuilt
//! from their inward neighbours: negated for velocity (solid wall), copied
//! for pressure (zero normal gradient). Corners take the diagonal neighbour.

use super::fields::{FieldData, FieldId};
use super::operator::{Operator, PassUniforms};

/// Edge multiplier for `field`, `None` if the field has no boundary condition
#[must_use]
pub const fn boundary_scale(field: FieldId) -> Option<f32> {
    match field {
        FieldId::Velocity => Some(-1.0),
        FieldId::Pressure => Some(1.0),
        FieldId::Density
        | FieldId::Temperature
        | FieldId::Divergence
        | FieldId::Vorticity
        | FieldId::Snapshot => None,
    }
}

/// Boundary pass that must follow `op`, if any
#[must_use]
pub fn enforce_after(op: &Operator) -> Option<Operator> {
    if matches!(op, Operator::Boundary { .. }) {
        return None;
    }
    let field = op.target();
    boundary_scale(field).map(|scale| Operator::Boundary { field, scale })
}

/// Inward neighbour of a cell; interior cells map to themselves
#[inline]
#[must_use]
pub fn inward_neighbour(x: usize, y: usize, width: usize, height: usize) -> (usize, usize) {
    (x.clamp(1, width - 2), y.clamp(1, height - 2))
}

/// Copy interior cells of `field` and set edges to `scale ×` their inward neighbour
pub fn boundary_cpu(field: &FieldData, out: &mut FieldData, u: &PassUniforms) {
    let (width, height) = (field.width, field.height);

    out.par_for_each_cell(|x, y, cell| {
        let (nx, ny) = inward_neighbour(x, y, width, height);
        let factor = if (nx, ny) == (x, y) { 1.0 } else { u.scale };
        for (channel, value) in cell.iter_mut().enumerate() {
            *value = factor * field.get(nx, ny, channel);
        }
    });
}
