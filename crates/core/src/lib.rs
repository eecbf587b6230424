//! Stable-Fluids Simulation Core Library
//!
//! A real-time, grid-based incompressible fluid simulator after Stam's
//! "stable fluids". Velocity, density and temperature live in
//! double-buffered 2D fields; every tick runs a fixed sequence of per-cell
//! operators over them (advection, splats, buoyancy, vorticity confinement,
//! Jacobi pressure projection) with boundary enforcement after every
//! velocity or pressure write.
//!
//! ## Backends
//!
//! - GPU: WGSL compute kernels through wgpu (`gpu` feature, default)
//! - CPU: Rayon-parallel reference kernels, always available
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fluid_sim_core::{DisplayField, PointerSample, Simulation, SimulationParams};
//!
//! let mut sim = Simulation::new(683, 384, SimulationParams::default())?;
//! sim.tick(&PointerSample::idle());
//! let frame = sim.frame(DisplayField::Density, (1366, 768))?;
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod grid;
pub mod simulation;
pub mod solver;

pub use config::{FeatureToggles, SimulationParams};
pub use display::{DisplayField, DisplayFrame};
pub use error::{ConfigError, SolverError};
pub use grid::{Grid, MIN_GRID_DIMENSION};
pub use simulation::{
    Action, Injection, PointerSample, PointerState, RunState, Simulation, Step, TickOutcome,
};
pub use solver::{
    create_fluid_solver, BackendPreference, CpuFluidSolver, FieldData, FieldId, FluidSolver,
    Operator, QualityPreset,
};

#[cfg(feature = "gpu")]
pub use solver::GpuFluidSolver;
