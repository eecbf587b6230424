//! Step scheduler
//!
//! [`Simulation`] owns a solver backend and runs the fixed per-tick operator
//! sequence over it. It also holds the Running/Paused state machine and the
//! pointer state that turns host input into splats.

mod input;

pub use input::{Action, Injection, PointerSample, PointerState};

use crate::config::SimulationParams;
use crate::display::{DisplayField, DisplayFrame};
use crate::error::{ConfigError, SolverError};
use crate::grid::Grid;
use crate::solver::{
    create_fluid_solver, BackendPreference, FieldId, FluidSolver, FrameTimer, Operator,
    ProfilerScope,
};
use nalgebra::Vector2;
use std::borrow::Cow;
use tracing::{debug, info, trace};

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Running,
    Paused,
}

/// Result of [`Simulation::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The operator sequence ran
    Advanced,
    /// Paused: no field was touched
    Paused,
}

/// One entry of a tick's execution plan
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Run an operator, followed by its boundary pass when it writes
    /// velocity or pressure
    Apply(Operator),
    /// Zero both buffers of a field
    Clear(FieldId),
}

/// Stable-fluids simulation driven one tick at a time
pub struct Simulation {
    solver: Box<dyn FluidSolver>,
    params: SimulationParams,
    state: RunState,
    pointer: PointerState,
    ticks: u64,
    timer: FrameTimer,
}

impl Simulation {
    /// Create a simulation on the best available backend
    ///
    /// # Arguments
    ///
    /// * `width`, `height` - Grid size in cells
    /// * `params` - Coefficients; `params.grid_scale` fixes the grid scale
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the grid or the parameters are invalid.
    pub fn new(width: u32, height: u32, params: SimulationParams) -> Result<Self, ConfigError> {
        Self::with_backend(width, height, params, BackendPreference::Auto)
    }

    /// Create a simulation with an explicit backend preference
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the grid or the parameters are invalid.
    pub fn with_backend(
        width: u32,
        height: u32,
        params: SimulationParams,
        preference: BackendPreference,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        let grid = Grid::new(width, height, params.grid_scale)?;
        Self::with_solver(create_fluid_solver(grid, preference), params)
    }

    /// Wrap an already constructed solver
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the parameters are invalid or their `grid_scale`
    /// differs from the solver's grid.
    pub fn with_solver(
        solver: Box<dyn FluidSolver>,
        params: SimulationParams,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        let grid = solver.grid();
        check_scale(&grid, &params)?;

        info!(
            "Simulation initialized: {}x{} grid, grid_scale={:.3}, GPU={}",
            grid.width(),
            grid.height(),
            grid.scale(),
            solver.is_gpu_accelerated()
        );

        Ok(Self {
            solver,
            params,
            state: RunState::Running,
            pointer: PointerState::default(),
            ticks: 0,
            timer: FrameTimer::new(),
        })
    }

    /// Apply a host action
    pub fn handle(&mut self, action: Action) {
        match action {
            Action::TogglePause => self.toggle_pause(),
            Action::Reset => self.reset(),
        }
    }

    /// Flip between Running and Paused
    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            RunState::Running => RunState::Paused,
            RunState::Paused => RunState::Running,
        };
        debug!("Simulation {:?} after {} ticks", self.state, self.ticks);
    }

    /// Zero every field and resume
    pub fn reset(&mut self) {
        self.solver.clear_all();
        self.state = RunState::Running;
        debug!("Simulation reset after {} ticks", self.ticks);
    }

    /// Sample the pointer and, when running, advance one tick
    pub fn tick(&mut self, sample: &PointerSample) -> TickOutcome {
        self.pointer.sample(sample);
        if self.state == RunState::Paused {
            return TickOutcome::Paused;
        }

        let scope = ProfilerScope::new("simulation_tick");
        let injection = self.pointer.injection(&self.params);
        let steps = self.plan(injection.as_ref());
        for step in &steps {
            match step {
                Step::Apply(op) => self.solver.apply(op, &self.params),
                Step::Clear(field) => self.solver.clear(*field),
            }
        }
        let elapsed_ms = scope.elapsed_ms();
        drop(scope);

        self.timer.record(elapsed_ms);
        self.ticks += 1;
        trace!(
            tick = self.ticks,
            steps = steps.len(),
            elapsed_ms,
            "tick complete"
        );
        TickOutcome::Advanced
    }

    /// Steps one tick would execute with this injection
    ///
    /// Boundary passes are not listed; [`FluidSolver::apply`] adds them
    /// after every velocity or pressure write.
    #[must_use]
    pub fn plan(&self, injection: Option<&Injection>) -> Vec<Step> {
        let params = &self.params;
        let features = &params.features;
        let mut steps = Vec::new();

        steps.push(Step::Apply(Operator::Advect {
            quantity: FieldId::Velocity,
            dissipation: params.velocity_dissipation,
        }));

        if features.viscous_diffusion {
            push_diffusion(
                &mut steps,
                FieldId::Velocity,
                params.diffusion_coefficients(params.viscosity),
                params.diffusion_iterations,
            );
        }

        if let Some(injection) = injection {
            if let Some(velocity) = injection.velocity {
                steps.push(Step::Apply(Operator::Splat {
                    field: FieldId::Velocity,
                    point: injection.point,
                    color: velocity,
                    radius: params.splat_radius,
                }));
            }
            if injection.scalars {
                push_scalar_splats(
                    &mut steps,
                    injection.point,
                    params.splat_radius,
                    params.density_color,
                    params.temperature_color,
                );
            }
        }

        if features.buoyancy {
            steps.push(Step::Apply(Operator::Buoyancy));
        }
        if features.vorticity {
            steps.push(Step::Apply(Operator::Vorticity));
            steps.push(Step::Apply(Operator::VorticityForce));
        }

        steps.push(Step::Apply(Operator::Divergence));
        steps.push(Step::Clear(FieldId::Pressure));
        let (alpha, beta) = params.pressure_coefficients();
        for _ in 0..params.jacobi_iterations {
            steps.push(Step::Apply(Operator::JacobiScalar {
                x: FieldId::Pressure,
                b: FieldId::Divergence,
                alpha,
                beta,
            }));
        }
        steps.push(Step::Apply(Operator::Gradient));

        steps.push(Step::Apply(Operator::Advect {
            quantity: FieldId::Density,
            dissipation: params.density_dissipation,
        }));
        steps.push(Step::Apply(Operator::Advect {
            quantity: FieldId::Temperature,
            dissipation: params.temperature_dissipation,
        }));

        if features.scalar_diffusion {
            let coefficients = params.diffusion_coefficients(params.diffusion);
            for field in [FieldId::Density, FieldId::Temperature] {
                push_diffusion(&mut steps, field, coefficients, params.diffusion_iterations);
            }
        }

        if features.permanent_source {
            let center = self.solver.grid().center();
            push_scalar_splats(
                &mut steps,
                center,
                params.source_radius,
                params.source_density,
                params.source_temperature,
            );
        }

        steps
    }

    /// Snapshot the committed buffer of `field` for presentation
    ///
    /// # Errors
    ///
    /// [`SolverError::Readback`] if the backend could not read the buffer.
    pub fn frame(
        &self,
        field: DisplayField,
        output: (usize, usize),
    ) -> Result<DisplayFrame, SolverError> {
        let grid = self.solver.grid();
        let data = self.solver.read_field(field.field_id())?.into_owned();
        Ok(DisplayFrame::new(
            field,
            grid.width() as usize,
            grid.height() as usize,
            data,
            output,
        ))
    }

    /// Committed buffer of a field, row-major with interleaved channels
    ///
    /// # Errors
    ///
    /// [`SolverError::Readback`] if the backend could not read the buffer.
    pub fn read_field(&self, field: FieldId) -> Result<Cow<'_, [f32]>, SolverError> {
        self.solver.read_field(field)
    }

    /// Overwrite the committed buffer of a field
    ///
    /// # Errors
    ///
    /// [`SolverError::FieldSize`] if `data` has the wrong length.
    pub fn write_field(&mut self, field: FieldId, data: &[f32]) -> Result<(), SolverError> {
        self.solver.write_field(field, data)
    }

    /// Replace the parameters between ticks
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the new parameters are invalid or change
    /// `grid_scale`. The current parameters stay in place on error.
    pub fn set_params(&mut self, params: SimulationParams) -> Result<(), ConfigError> {
        params.validate()?;
        check_scale(&self.solver.grid(), &params)?;
        debug!("Simulation parameters updated: {:?}", params);
        self.params = params;
        Ok(())
    }

    #[must_use]
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state == RunState::Paused
    }

    #[must_use]
    pub fn grid(&self) -> Grid {
        self.solver.grid()
    }

    /// Ticks advanced since creation (paused ticks excluded)
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    #[must_use]
    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    #[must_use]
    pub fn solver(&self) -> &dyn FluidSolver {
        self.solver.as_ref()
    }

    #[must_use]
    pub fn is_gpu_accelerated(&self) -> bool {
        self.solver.is_gpu_accelerated()
    }
}

fn check_scale(grid: &Grid, params: &SimulationParams) -> Result<(), ConfigError> {
    if (grid.scale() - params.grid_scale).abs() > f32::EPSILON {
        return Err(ConfigError::GridScaleChanged {
            current: grid.scale(),
            requested: params.grid_scale,
        });
    }
    Ok(())
}

/// Snapshot `field` and relax it towards the implicit diffusion solution
fn push_diffusion(steps: &mut Vec<Step>, field: FieldId, coefficients: (f32, f32), iterations: u32) {
    let (alpha, beta) = coefficients;
    steps.push(Step::Apply(Operator::Copy {
        source: field,
        target: FieldId::Snapshot,
    }));
    for _ in 0..iterations {
        let op = if field.channels() == 2 {
            Operator::JacobiVector {
                x: field,
                b: FieldId::Snapshot,
                alpha,
                beta,
            }
        } else {
            Operator::JacobiScalar {
                x: field,
                b: FieldId::Snapshot,
                alpha,
                beta,
            }
        };
        steps.push(Step::Apply(op));
    }
}

fn push_scalar_splats(
    steps: &mut Vec<Step>,
    point: Vector2<f32>,
    radius: f32,
    density: f32,
    temperature: f32,
) {
    steps.push(Step::Apply(Operator::Splat {
        field: FieldId::Density,
        point,
        color: Vector2::new(density, 0.0),
        radius,
    }));
    steps.push(Step::Apply(Operator::Splat {
        field: FieldId::Temperature,
        point,
        color: Vector2::new(temperature, 0.0),
        radius,
    }));
}
