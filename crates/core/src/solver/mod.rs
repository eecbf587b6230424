//! Stable-fluids solver module
//!
//! This module provides a unified GPU/CPU abstraction over the fluid
//! pipeline. The core abstraction is the `FluidSolver` trait, which owns a
//! double-buffered [`FieldStore`] and runs [`Operator`] passes over it.
//!
//! # Feature Flags
//!
//! - `gpu` (default): Enables GPU acceleration via wgpu. Disable with `--no-default-features`
//!   for environments without GPU access.
//!
//! # Backend Selection
//!
//! With [`BackendPreference::Auto`] the best available backend is used:
//! 1. Try GPU (if `gpu` feature enabled and hardware available)
//! 2. Fall back to CPU (always available)
//!
//! # Example
//!
//! ```rust,ignore
//! use fluid_sim_core::grid::Grid;
//! use fluid_sim_core::solver::{create_fluid_solver, BackendPreference};
//!
//! let grid = Grid::new(683, 384, 1.0)?;
//! let solver = create_fluid_solver(grid, BackendPreference::Auto);
//! ```

mod advection;
mod boundary;
mod context;
mod cpu;
mod fields;
mod forces;
mod operator;
pub mod profiler;
mod projection;
mod quality;
mod store;
#[allow(clippy::module_name_repetitions)]
mod r#trait;

#[cfg(feature = "gpu")]
mod gpu;

// Re-exports
pub use advection::advect_cpu;
pub use boundary::{boundary_cpu, boundary_scale, enforce_after, inward_neighbour};
pub use context::GpuInitResult;
pub use cpu::CpuFluidSolver;
pub use fields::{Arity, FieldData, FieldId};
pub use forces::{buoyancy_cpu, splat_cpu, vorticity_cpu, vorticity_force_cpu, CONFINEMENT_EPSILON};
pub use operator::{Kernel, Operator, PassUniforms};
pub use profiler::{FrameTimer, ProfilerScope};
pub use projection::{divergence_cpu, gradient_cpu, jacobi_cpu};
pub use quality::QualityPreset;
pub use r#trait::FluidSolver;
pub use store::{FieldStore, Slot};

#[cfg(feature = "gpu")]
pub use context::GpuContext;
#[cfg(feature = "gpu")]
pub use gpu::GpuFluidSolver;

use crate::grid::Grid;
use tracing::{info, warn};

/// Which backend [`create_fluid_solver`] should build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendPreference {
    /// GPU when available, CPU otherwise
    #[default]
    Auto,
    /// Always the CPU backend
    Cpu,
    /// GPU if possible; falls back to CPU with a warning
    Gpu,
}

/// Create a fluid solver for `grid`
///
/// Unless `preference` is [`BackendPreference::Cpu`], this tries to use GPU
/// acceleration first and falls back to the CPU backend when no adapter is
/// found, device creation fails or the grid does not fit the device limits.
///
/// # Returns
///
/// A boxed `FluidSolver` trait object using the selected backend
pub fn create_fluid_solver(grid: Grid, preference: BackendPreference) -> Box<dyn FluidSolver> {
    if preference == BackendPreference::Cpu {
        info!(
            "CPU backend requested ({}x{} grid)",
            grid.width(),
            grid.height()
        );
        return Box::new(CpuFluidSolver::new(grid));
    }

    #[cfg(feature = "gpu")]
    {
        match GpuContext::new() {
            GpuInitResult::Success(gpu_context) => {
                let (width, height) = (grid.width(), grid.height());
                if gpu_context.can_allocate(width, height) {
                    info!(
                        "Using GPU backend: {} ({}x{} grid)",
                        gpu_context.adapter_name(),
                        width,
                        height
                    );
                    return Box::new(GpuFluidSolver::new(gpu_context, grid));
                }
                warn!(
                    "GPU cannot hold a {}x{} grid, falling back to CPU",
                    width, height
                );
            }
            GpuInitResult::NoGpuFound => {
                info!("No GPU found, using CPU backend");
            }
            GpuInitResult::InitFailed {
                adapter_name,
                error,
            } => {
                warn!(
                    "GPU '{}' found but failed to initialize: {}. Falling back to CPU.",
                    adapter_name, error
                );
            }
        }
    }

    #[cfg(not(feature = "gpu"))]
    info!("GPU feature disabled, using CPU backend");

    if preference == BackendPreference::Gpu {
        warn!("GPU backend requested but unavailable, running on CPU");
    }

    Box::new(CpuFluidSolver::new(grid))
}
