//! Force injection kernels
//!
//! Pointer splats, buoyancy and vorticity confinement. All of them add to
//! the committed value of their target field except [`vorticity_cpu`], which
//! computes the curl into its own field.

use super::fields::FieldData;
use super::operator::PassUniforms;
use nalgebra::Vector2;

/// Guards the normalisation of the vorticity gradient where it vanishes
pub const CONFINEMENT_EPSILON: f32 = 1e-5;

/// Add a Gaussian impulse centred on `(point_x, point_y)`
///
/// `out = field + color · exp(−|cell − point|² / radius)` per channel,
/// distances in cells.
pub fn splat_cpu(field: &FieldData, out: &mut FieldData, u: &PassUniforms) {
    let point = Vector2::new(u.point_x, u.point_y);

    out.par_for_each_cell(|x, y, cell| {
        let offset = Vector2::new(x as f32, y as f32) - point;
        let falloff = (-offset.norm_squared() / u.radius).exp();
        for (channel, value) in cell.iter_mut().enumerate() {
            *value = field.fetch(x as i64, y as i64, channel) + u.color(channel) * falloff;
        }
    });
}

/// Add density/temperature lift to the vertical velocity component
pub fn buoyancy_cpu(
    velocity: &FieldData,
    density: &FieldData,
    temperature: &FieldData,
    out: &mut FieldData,
    u: &PassUniforms,
) {
    out.par_for_each_cell(|x, y, cell| {
        let (xi, yi) = (x as i64, y as i64);
        let d = density.fetch(xi, yi, 0);
        let t = temperature.fetch(xi, yi, 0);
        let lift = u.buoyancy_factor * d - u.buoyancy_k * (t - u.ambient_temperature);

        cell[0] = velocity.fetch(xi, yi, 0);
        cell[1] = velocity.fetch(xi, yi, 1) + u.timestep * lift;
    });
}

/// Scalar curl `(∂v_y/∂x − ∂v_x/∂y) / (2·grid_scale)` on interior cells
///
/// Edge cells are written as zero.
pub fn vorticity_cpu(velocity: &FieldData, out: &mut FieldData, u: &PassUniforms) {
    let half_inv = 0.5 / u.grid_scale;
    let (width, height) = (out.width, out.height);

    out.par_for_each_cell(|x, y, cell| {
        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
            cell[0] = 0.0;
            return;
        }
        let (xi, yi) = (x as i64, y as i64);
        let dvy_dx = velocity.fetch(xi + 1, yi, 1) - velocity.fetch(xi - 1, yi, 1);
        let dvx_dy = velocity.fetch(xi, yi + 1, 0) - velocity.fetch(xi, yi - 1, 0);
        cell[0] = (dvy_dx - dvx_dy) * half_inv;
    });
}

/// Vorticity confinement
///
/// `η = ∇|ω| / (2·grid_scale)`, `N = η / (|η| + ε)` and the velocity gains
/// `timestep · curl · ω · (N_y, −N_x)`.
pub fn vorticity_force_cpu(
    velocity: &FieldData,
    vorticity: &FieldData,
    out: &mut FieldData,
    u: &PassUniforms,
) {
    let half_inv = 0.5 / u.grid_scale;

    out.par_for_each_cell(|x, y, cell| {
        let (xi, yi) = (x as i64, y as i64);
        let magnitude = |dx: i64, dy: i64| vorticity.fetch(xi + dx, yi + dy, 0).abs();

        let eta = Vector2::new(
            magnitude(1, 0) - magnitude(-1, 0),
            magnitude(0, 1) - magnitude(0, -1),
        ) * half_inv;
        let n = eta / (eta.norm() + CONFINEMENT_EPSILON);

        let omega = vorticity.fetch(xi, yi, 0);
        let force = Vector2::new(n.y, -n.x) * (u.curl * omega);
        let v = velocity.fetch_vector(xi, yi) + force * u.timestep;

        cell[0] = v.x;
        cell[1] = v.y;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_splat_peak_and_falloff() {
        let field = FieldData::new(16, 16, 2);
        let mut out = FieldData::new(16, 16, 2);
        let u = PassUniforms {
            point_x: 8.0,
            point_y: 8.0,
            color_x: 2.0,
            color_y: -1.0,
            radius: 4.0,
            ..Default::default()
        };
        splat_cpu(&field, &mut out, &u);

        assert_relative_eq!(out.get(8, 8, 0), 2.0);
        assert_relative_eq!(out.get(8, 8, 1), -1.0);
        assert_relative_eq!(out.get(10, 8, 0), 2.0 * (-1.0_f32).exp(), epsilon = 1e-6);
        assert!(out.get(0, 0, 0).abs() < 1e-6);
    }

    #[test]
    fn test_splat_adds_to_existing_value() {
        let field = FieldData::with_value(8, 8, 1, 3.0);
        let mut out = FieldData::new(8, 8, 1);
        let u = PassUniforms {
            point_x: 2.0,
            point_y: 2.0,
            color_x: 1.0,
            radius: 1.0,
            ..Default::default()
        };
        splat_cpu(&field, &mut out, &u);
        assert_relative_eq!(out.get(2, 2, 0), 4.0);
        assert_relative_eq!(out.get(7, 7, 0), 3.0);
    }

    #[test]
    fn test_buoyancy_lifts_dense_cells() {
        let velocity = FieldData::new(4, 4, 2);
        let mut density = FieldData::new(4, 4, 1);
        density.set(1, 1, 0, 2.0);
        let mut temperature = FieldData::new(4, 4, 1);
        temperature.set(2, 2, 0, 4.0);
        let mut out = FieldData::new(4, 4, 2);

        let u = PassUniforms {
            timestep: 0.5,
            buoyancy_factor: 1.0,
            buoyancy_k: 0.25,
            ambient_temperature: 0.0,
            ..Default::default()
        };
        buoyancy_cpu(&velocity, &density, &temperature, &mut out, &u);

        assert_relative_eq!(out.get(1, 1, 1), 1.0);
        assert_relative_eq!(out.get(2, 2, 1), -0.5);
        assert_eq!(out.get(1, 1, 0), 0.0);
        assert_eq!(out.get(3, 3, 1), 0.0);
    }

    #[test]
    fn test_vorticity_of_rigid_rotation() {
        let mut velocity = FieldData::new(9, 9, 2);
        velocity.par_for_each_cell(|x, y, cell| {
            cell[0] = -(y as f32 - 4.0);
            cell[1] = x as f32 - 4.0;
        });
        let mut out = FieldData::new(9, 9, 1);
        let u = PassUniforms {
            grid_scale: 1.0,
            ..Default::default()
        };
        vorticity_cpu(&velocity, &mut out, &u);

        for y in 1..8 {
            for x in 1..8 {
                assert_relative_eq!(out.get(x, y, 0), 2.0);
            }
        }
        assert_eq!(out.get(0, 4, 0), 0.0);
        assert_eq!(out.get(4, 8, 0), 0.0);
    }

    #[test]
    fn test_vorticity_force_is_perpendicular_to_gradient() {
        let velocity = FieldData::new(8, 8, 2);
        let mut vorticity = FieldData::new(8, 8, 1);
        vorticity.par_for_each_cell(|x, _, cell| cell[0] = x as f32);
        let mut out = FieldData::new(8, 8, 2);

        let u = PassUniforms {
            grid_scale: 1.0,
            timestep: 1.0,
            curl: 1.0,
            ..Default::default()
        };
        vorticity_force_cpu(&velocity, &vorticity, &mut out, &u);

        // ∇|ω| points along +x, so the force is ω · (0, −1)
        assert_relative_eq!(out.get(3, 4, 0), 0.0);
        assert_relative_eq!(out.get(3, 4, 1), -3.0, epsilon = 1e-3);
    }

    #[test]
    fn test_vorticity_force_vanishes_without_curl() {
        let mut velocity = FieldData::new(6, 6, 2);
        velocity.fill(1.0);
        let vorticity = FieldData::new(6, 6, 1);
        let mut out = FieldData::new(6, 6, 2);
        let u = PassUniforms {
            grid_scale: 1.0,
            timestep: 1.0,
            curl: 5.0,
            ..Default::default()
        };
        vorticity_force_cpu(&velocity, &vorticity, &mut out, &u);
        assert_eq!(out, velocity);
    }
}
