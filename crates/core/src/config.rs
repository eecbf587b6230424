//! Simulation parameters
//!
//! Every coefficient of the operator pipeline lives here rather than in the
//! kernels, including the toggles for the optional passes. The defaults are
//! representative values; hosts are expected to tune them.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Runtime switches for the optional passes of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    /// Edge enforcement after every velocity/pressure write
    pub boundaries: bool,
    /// Density/temperature coupling into vertical velocity
    pub buoyancy: bool,
    /// Vorticity confinement
    pub vorticity: bool,
    /// Implicit viscous diffusion of velocity
    pub viscous_diffusion: bool,
    /// Implicit diffusion of density and temperature
    pub scalar_diffusion: bool,
    /// Constant density/temperature source at the grid centre
    pub permanent_source: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            boundaries: true,
            buoyancy: true,
            vorticity: true,
            viscous_diffusion: false,
            scalar_diffusion: false,
            permanent_source: false,
        }
    }
}

/// Coefficients for one simulation
///
/// Distances are in grid cells unless stated otherwise; `grid_scale` converts
/// cells into world units for every finite difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Integration timestep applied by every pass
    pub timestep: f32,
    /// World size of one cell
    pub grid_scale: f32,
    /// Multiplicative decay during velocity self-advection, in `[0, 1]`
    pub velocity_dissipation: f32,
    /// Multiplicative decay during density advection, in `[0, 1]`
    pub density_dissipation: f32,
    /// Multiplicative decay during temperature advection, in `[0, 1]`
    pub temperature_dissipation: f32,
    /// Jacobi relaxation steps of the pressure solve
    pub jacobi_iterations: u32,
    /// Vorticity confinement strength
    pub curl: f32,
    /// Lift per unit density
    pub buoyancy_factor: f32,
    /// Coupling of temperature above ambient into the vertical force
    pub buoyancy_k: f32,
    /// Temperature with no buoyant effect
    pub ambient_temperature: f32,
    /// Kinematic viscosity for the viscous diffusion pass
    pub viscosity: f32,
    /// Diffusion rate for density and temperature
    pub diffusion: f32,
    /// Jacobi steps of each diffusion solve
    pub diffusion_iterations: u32,
    /// Gaussian denominator of pointer splats, in cells²
    pub splat_radius: f32,
    /// Velocity injected per cell of pointer drag
    pub splat_force: f32,
    /// Density injected by the secondary button
    pub density_color: f32,
    /// Temperature injected by the secondary button
    pub temperature_color: f32,
    /// Gaussian denominator of the permanent source, in cells²
    pub source_radius: f32,
    /// Density added by the permanent source each tick
    pub source_density: f32,
    /// Temperature added by the permanent source each tick
    pub source_temperature: f32,
    /// Optional passes
    pub features: FeatureToggles,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            timestep: 0.125,
            grid_scale: 1.0,
            velocity_dissipation: 1.0,
            density_dissipation: 0.998,
            temperature_dissipation: 0.998,
            jacobi_iterations: 50,
            curl: 0.35,
            buoyancy_factor: 1.0,
            buoyancy_k: 0.25,
            ambient_temperature: 0.0,
            viscosity: 0.001,
            diffusion: 0.0001,
            diffusion_iterations: 20,
            splat_radius: 40.0,
            splat_force: 8.0,
            density_color: 1.0,
            temperature_color: 1.0,
            source_radius: 12.0,
            source_density: 0.05,
            source_temperature: 0.05,
            features: FeatureToggles::default(),
        }
    }
}

impl SimulationParams {
    /// Check every constraint the pipeline relies on
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("timestep", self.timestep)?;
        require_positive("grid_scale", self.grid_scale)?;
        require_unit_interval("velocity_dissipation", self.velocity_dissipation)?;
        require_unit_interval("density_dissipation", self.density_dissipation)?;
        require_unit_interval("temperature_dissipation", self.temperature_dissipation)?;
        if self.jacobi_iterations == 0 {
            return Err(ConfigError::ZeroIterations {
                name: "jacobi_iterations",
            });
        }
        require_positive("splat_radius", self.splat_radius)?;

        if self.features.viscous_diffusion {
            require_positive("viscosity", self.viscosity)?;
        }
        if self.features.scalar_diffusion {
            require_positive("diffusion", self.diffusion)?;
        }
        if (self.features.viscous_diffusion || self.features.scalar_diffusion)
            && self.diffusion_iterations == 0
        {
            return Err(ConfigError::ZeroIterations {
                name: "diffusion_iterations",
            });
        }
        if self.features.permanent_source {
            require_positive("source_radius", self.source_radius)?;
        }
        Ok(())
    }

    /// Jacobi `(alpha, beta)` for the pressure Poisson solve
    #[must_use]
    pub fn pressure_coefficients(&self) -> (f32, f32) {
        (-self.grid_scale * self.grid_scale, 4.0)
    }

    /// Jacobi `(alpha, beta)` for an implicit diffusion solve with `rate`
    #[must_use]
    pub fn diffusion_coefficients(&self, rate: f32) -> (f32, f32) {
        let alpha = self.grid_scale * self.grid_scale / (rate * self.timestep);
        (alpha, 4.0 + alpha)
    }
}

fn require_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

fn require_unit_interval(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::DissipationOutOfRange { name, value })
    }
}
