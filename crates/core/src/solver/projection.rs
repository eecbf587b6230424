//! Pressure projection kernels
//!
//! Divergence of velocity, Jacobi relaxation of the Poisson equation and
//! subtraction of the pressure gradient. The Jacobi kernel also serves the
//! implicit diffusion solves, with different `alpha`/`beta`.

use super::fields::FieldData;
use super::operator::PassUniforms;

/// `(∂v_x/∂x + ∂v_y/∂y) / (2·grid_scale)` on interior cells, edges zero
pub fn divergence_cpu(velocity: &FieldData, out: &mut FieldData, u: &PassUniforms) {
    let half_inv = 0.5 / u.grid_scale;
    let (width, height) = (out.width, out.height);

    out.par_for_each_cell(|x, y, cell| {
        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
            cell[0] = 0.0;
            return;
        }
        let (xi, yi) = (x as i64, y as i64);
        let dvx = velocity.fetch(xi + 1, yi, 0) - velocity.fetch(xi - 1, yi, 0);
        let dvy = velocity.fetch(xi, yi + 1, 1) - velocity.fetch(xi, yi - 1, 1);
        cell[0] = (dvx + dvy) * half_inv;
    });
}

/// One Jacobi relaxation step
///
/// `x'[cell] = (x_L + x_R + x_B + x_T + alpha · b[cell]) / beta` per channel
/// of `out`, neighbours clamped to the grid.
///
/// # Arguments
///
/// * `x` - Committed iterate
/// * `b` - Right-hand side; may carry more channels than `x`
/// * `out` - Target buffer of `x`
/// * `u` - Pass uniforms; uses `alpha` and `beta`
pub fn jacobi_cpu(x: &FieldData, b: &FieldData, out: &mut FieldData, u: &PassUniforms) {
    let inv_beta = 1.0 / u.beta;

    out.par_for_each_cell(|cx, cy, cell| {
        let (xi, yi) = (cx as i64, cy as i64);
        for (channel, value) in cell.iter_mut().enumerate() {
            let neighbours = x.fetch(xi - 1, yi, channel)
                + x.fetch(xi + 1, yi, channel)
                + x.fetch(xi, yi - 1, channel)
                + x.fetch(xi, yi + 1, channel);
            *value = (neighbours + u.alpha * b.fetch(xi, yi, channel)) * inv_beta;
        }
    });
}

/// Subtract `∇p` (central differences over `2·grid_scale`) from velocity
pub fn gradient_cpu(velocity: &FieldData, pressure: &FieldData, out: &mut FieldData, u: &PassUniforms) {
    let half_inv = 0.5 / u.grid_scale;

    out.par_for_each_cell(|x, y, cell| {
        let (xi, yi) = (x as i64, y as i64);
        let dp_dx = (pressure.fetch(xi + 1, yi, 0) - pressure.fetch(xi - 1, yi, 0)) * half_inv;
        let dp_dy = (pressure.fetch(xi, yi + 1, 0) - pressure.fetch(xi, yi - 1, 0)) * half_inv;
        cell[0] = velocity.fetch(xi, yi, 0) - dp_dx;
        cell[1] = velocity.fetch(xi, yi, 1) - dp_dy;
    });
}
