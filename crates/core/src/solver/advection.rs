//! Semi-Lagrangian advection
//!
//! Each cell traces backwards along the velocity field for one timestep and
//! takes the bilinearly interpolated quantity found there. Unconditionally
//! stable for any timestep, at the cost of numerical smoothing.

use super::fields::FieldData;
use super::operator::PassUniforms;
use nalgebra::Vector2;

/// Advect `quantity` by `velocity` into `out` (CPU implementation)
///
/// # Arguments
///
/// * `velocity` - Committed velocity field (2 channels)
/// * `quantity` - Committed field being transported, may be `velocity` itself
/// * `out` - Target buffer of the transported field
/// * `u` - Pass uniforms; uses `timestep`, `grid_scale` and `dissipation`
///
/// The source position is `cell − velocity(cell) · timestep / grid_scale`,
/// clamped to the grid by the sampler.
pub fn advect_cpu(velocity: &FieldData, quantity: &FieldData, out: &mut FieldData, u: &PassUniforms) {
    let step = u.timestep / u.grid_scale;

    out.par_for_each_cell(|x, y, cell| {
        let here = Vector2::new(x as f32, y as f32);
        let source = here - velocity.fetch_vector(x as i64, y as i64) * step;

        for (channel, value) in cell.iter_mut().enumerate() {
            *value = quantity.sample_bilinear(source, channel) * u.dissipation;
        }
    });
}
