//! Operator set
//!
//! One variant per per-cell kernel. An operator names the fields it reads
//! and the single field it writes; both backends turn it into the same
//! [`PassUniforms`] block and run the matching kernel over every cell.

use super::fields::FieldId;
use crate::config::SimulationParams;
use crate::grid::Grid;
use nalgebra::Vector2;

/// A single write pass over one field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operator {
    /// Semi-Lagrangian transport of `quantity` by velocity, scaled by `dissipation`
    Advect {
        quantity: FieldId,
        dissipation: f32,
    },
    /// Gaussian impulse `color · exp(−|cell − point|² / radius)` added to `field`
    Splat {
        field: FieldId,
        point: Vector2<f32>,
        color: Vector2<f32>,
        radius: f32,
    },
    /// Density/temperature lift added to vertical velocity
    Buoyancy,
    /// Curl of velocity into the vorticity field
    Vorticity,
    /// Vorticity confinement force added to velocity
    VorticityForce,
    /// Divergence of velocity
    Divergence,
    /// One Jacobi step on a scalar field
    JacobiScalar {
        x: FieldId,
        b: FieldId,
        alpha: f32,
        beta: f32,
    },
    /// One Jacobi step on a vector field
    JacobiVector {
        x: FieldId,
        b: FieldId,
        alpha: f32,
        beta: f32,
    },
    /// Pressure gradient subtracted from velocity
    Gradient,
    /// Edge cells set to `scale ×` their inward neighbour
    Boundary { field: FieldId, scale: f32 },
    /// Channel copy from `source` into `target`
    Copy { source: FieldId, target: FieldId },
}

/// Compiled kernel behind an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    Advect,
    Splat,
    Buoyancy,
    Vorticity,
    VorticityForce,
    Divergence,
    Jacobi,
    Gradient,
    Boundary,
    Copy,
}

impl Kernel {
    /// Every kernel, in pipeline-table order
    pub const ALL: [Self; 10] = [
        Self::Advect,
        Self::Splat,
        Self::Buoyancy,
        Self::Vorticity,
        Self::VorticityForce,
        Self::Divergence,
        Self::Jacobi,
        Self::Gradient,
        Self::Boundary,
        Self::Copy,
    ];

    /// WGSL entry point name
    #[must_use]
    pub const fn entry_point(self) -> &'static str {
        match self {
            Self::Advect => "advect",
            Self::Splat => "splat",
            Self::Buoyancy => "buoyancy",
            Self::Vorticity => "vorticity",
            Self::VorticityForce => "vorticity_force",
            Self::Divergence => "divergence",
            Self::Jacobi => "jacobi",
            Self::Gradient => "gradient",
            Self::Boundary => "boundary",
            Self::Copy => "copy",
        }
    }

    /// Position in [`Kernel::ALL`]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl Operator {
    #[must_use]
    pub const fn kernel(&self) -> Kernel {
        match self {
            Self::Advect { .. } => Kernel::Advect,
            Self::Splat { .. } => Kernel::Splat,
            Self::Buoyancy => Kernel::Buoyancy,
            Self::Vorticity => Kernel::Vorticity,
            Self::VorticityForce => Kernel::VorticityForce,
            Self::Divergence => Kernel::Divergence,
            Self::JacobiScalar { .. } | Self::JacobiVector { .. } => Kernel::Jacobi,
            Self::Gradient => Kernel::Gradient,
            Self::Boundary { .. } => Kernel::Boundary,
            Self::Copy { .. } => Kernel::Copy,
        }
    }

    /// The one field this operator writes
    #[must_use]
    pub const fn target(&self) -> FieldId {
        match *self {
            Self::Advect { quantity, .. } => quantity,
            Self::Splat { field, .. } | Self::Boundary { field, .. } => field,
            Self::Buoyancy | Self::VorticityForce | Self::Gradient => FieldId::Velocity,
            Self::Vorticity => FieldId::Vorticity,
            Self::Divergence => FieldId::Divergence,
            Self::JacobiScalar { x, .. } | Self::JacobiVector { x, .. } => x,
            Self::Copy { target, .. } => target,
        }
    }

    /// Fields read by the kernel, in binding order
    #[must_use]
    pub const fn sources(&self) -> [Option<FieldId>; 3] {
        match *self {
            Self::Advect { quantity, .. } => [Some(FieldId::Velocity), Some(quantity), None],
            Self::Splat { field, .. } | Self::Boundary { field, .. } => [Some(field), None, None],
            Self::Buoyancy => [
                Some(FieldId::Velocity),
                Some(FieldId::Density),
                Some(FieldId::Temperature),
            ],
            Self::Vorticity | Self::Divergence => [Some(FieldId::Velocity), None, None],
            Self::VorticityForce => [Some(FieldId::Velocity), Some(FieldId::Vorticity), None],
            Self::JacobiScalar { x, b, .. } | Self::JacobiVector { x, b, .. } => {
                [Some(x), Some(b), None]
            }
            Self::Gradient => [Some(FieldId::Velocity), Some(FieldId::Pressure), None],
            Self::Copy { source, .. } => [Some(source), None, None],
        }
    }

    /// Build the uniform block for this pass
    ///
    /// Fields irrelevant to the kernel keep their defaults; the global
    /// coefficients are always filled so every kernel sees the same layout.
    #[must_use]
    pub fn uniforms(&self, grid: &Grid, params: &SimulationParams) -> PassUniforms {
        let mut u = PassUniforms {
            width: grid.width(),
            height: grid.height(),
            channels: self.target().channels() as u32,
            grid_scale: grid.scale(),
            timestep: params.timestep,
            curl: params.curl,
            buoyancy_factor: params.buoyancy_factor,
            buoyancy_k: params.buoyancy_k,
            ambient_temperature: params.ambient_temperature,
            ..PassUniforms::default()
        };
        match *self {
            Self::Advect { dissipation, .. } => u.dissipation = dissipation,
            Self::Splat {
                point,
                color,
                radius,
                ..
            } => {
                u.point_x = point.x;
                u.point_y = point.y;
                u.color_x = color.x;
                u.color_y = color.y;
                u.radius = radius;
            }
            Self::JacobiScalar { alpha, beta, .. } | Self::JacobiVector { alpha, beta, .. } => {
                u.alpha = alpha;
                u.beta = beta;
            }
            Self::Boundary { scale, .. } => u.scale = scale,
            Self::Buoyancy
            | Self::Vorticity
            | Self::VorticityForce
            | Self::Divergence
            | Self::Gradient
            | Self::Copy { .. } => {}
        }
        u
    }
}

/// Per-pass parameter block, shared bit-for-bit by CPU kernels and WGSL
///
/// Must match `PassUniforms` in `shaders/fluid.wgsl` (80 bytes, five rows
/// of four 32-bit values).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "gpu", derive(bytemuck::Pod, bytemuck::Zeroable))]
pub struct PassUniforms {
    pub width: u32,
    pub height: u32,
    /// Channel count of the written field
    pub channels: u32,
    pub _pad0: u32,

    pub grid_scale: f32,
    pub timestep: f32,
    pub alpha: f32,
    pub beta: f32,

    pub dissipation: f32,
    pub radius: f32,
    /// Boundary multiplier
    pub scale: f32,
    pub curl: f32,

    pub point_x: f32,
    pub point_y: f32,
    pub color_x: f32,
    pub color_y: f32,

    pub buoyancy_factor: f32,
    pub buoyancy_k: f32,
    pub ambient_temperature: f32,
    pub _pad1: f32,
}

impl PassUniforms {
    /// Splat colour for one channel
    #[inline]
    #[must_use]
    pub fn color(&self, channel: usize) -> f32 {
        if channel == 0 {
            self.color_x
        } else {
            self.color_y
        }
    }
}
