//! GPU-based fluid solver implementation
//!
//! This module provides a GPU implementation of the `FluidSolver` trait using
//! wgpu compute shaders and storage buffers. This backend is only available when the
//! `gpu` feature is enabled.
//!
//! # Shader Files
//!
//! Every kernel lives in `shaders/fluid.wgsl`, one entry point per
//! [`Kernel`]. All kernels share a single bind group layout:
//!
//! | binding | contents                              |
//! |---------|---------------------------------------|
//! | 0       | `PassUniforms`                        |
//! | 1..=3   | committed source fields (read-only)   |
//! | 4       | target slot of the written field      |
//!
//! # Implementation
//!
//! Fields are `array<vec2<f32>>` storage buffers regardless of arity; scalar
//! fields keep their second channel at zero. Each pass is encoded and
//! submitted on its own so the next pass observes its writes.

use super::context::{GpuContext, FIELD_CELL_BYTES, WORKGROUP_SIZE};
use super::fields::FieldId;
use super::operator::{Kernel, Operator, PassUniforms};
use super::r#trait::check_field_len;
use super::store::{FieldStore, Slot};
use super::FluidSolver;
use crate::error::SolverError;
use crate::grid::Grid;
use std::borrow::Cow;
use tracing::{debug, warn};

/// Storage-buffer binding entry for the shared layout
fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// GPU-based fluid solver using wgpu compute shaders
pub struct GpuFluidSolver {
    context: GpuContext,
    grid: Grid,

    // Two storage buffers per field
    store: FieldStore<wgpu::Buffer>,

    // Bound to source slots an operator leaves empty
    placeholder: wgpu::Buffer,

    // CPU readback
    staging: wgpu::Buffer,

    uniform_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,

    // Indexed by `Kernel::index`
    pipelines: Vec<wgpu::ComputePipeline>,
}

impl GpuFluidSolver {
    /// Create a new GPU fluid solver
    ///
    /// Allocates zeroed field buffers, loads the shader module and creates
    /// one compute pipeline per kernel.
    #[must_use]
    pub fn new(context: GpuContext, grid: Grid) -> Self {
        let device = context.device();
        let buffer_size = grid.cell_count() as u64 * FIELD_CELL_BYTES;

        let store = FieldStore::new(|field, slot| {
            let label = format!("{field} {slot:?}");
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&label),
                size: buffer_size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let placeholder = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Unused Source"),
            size: FIELD_CELL_BYTES * 2,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Field Staging"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pass Uniforms"),
            size: std::mem::size_of::<PassUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::include_wgsl!("shaders/fluid.wgsl"));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Fluid Bind Group Layout"),
            entries: &[
                // params (binding 0)
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, true),
                // dst (binding 4)
                storage_entry(4, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Fluid Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipelines = Kernel::ALL
            .iter()
            .map(|kernel| {
                debug!("Creating compute pipeline '{}'", kernel.entry_point());
                device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(kernel.entry_point()),
                    layout: Some(&pipeline_layout),
                    module: &shader,
                    entry_point: kernel.entry_point(),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    cache: None,
                })
            })
            .collect();

        Self {
            context,
            grid,
            store,
            placeholder,
            staging,
            uniform_buffer,
            bind_group_layout,
            pipelines,
        }
    }

    /// Name of the adapter running the kernels
    #[must_use]
    pub fn adapter_name(&self) -> &str {
        self.context.adapter_name()
    }

    fn workgroup_count(&self) -> (u32, u32) {
        (
            self.grid.width().div_ceil(WORKGROUP_SIZE),
            self.grid.height().div_ceil(WORKGROUP_SIZE),
        )
    }

    fn field_bytes(&self) -> u64 {
        self.grid.cell_count() as u64 * FIELD_CELL_BYTES
    }

    /// Bind committed sources and the target slot of `op`
    fn create_bind_group(&self, op: &Operator) -> wgpu::BindGroup {
        let sources = op
            .sources()
            .map(|source| source.map_or(&self.placeholder, |field| self.store.previous_of(field)));
        let target = self.store.target_of(op.target());

        self.context
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Fluid Bind Group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: sources[0].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: sources[1].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: sources[2].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: target.as_entire_binding(),
                    },
                ],
            })
    }

    fn readback_error(field: FieldId, message: impl ToString) -> SolverError {
        let message = message.to_string();
        warn!("Readback of {} failed: {}", field, message);
        SolverError::Readback { field, message }
    }
}

impl FluidSolver for GpuFluidSolver {
    fn dispatch(&mut self, op: &Operator, uniforms: &PassUniforms) {
        let device = self.context.device();
        let queue = self.context.queue();

        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
        let bind_group = self.create_bind_group(op);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Fluid Pass Encoder"),
        });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(op.kernel().entry_point()),
                timestamp_writes: None,
            });

            compute_pass.set_pipeline(&self.pipelines[op.kernel().index()]);
            compute_pass.set_bind_group(0, &bind_group, &[]);

            let (wg_x, wg_y) = self.workgroup_count();
            compute_pass.dispatch_workgroups(wg_x, wg_y, 1);
        }

        queue.submit(std::iter::once(encoder.finish()));

        self.store.commit(op.target());
    }

    fn clear(&mut self, field: FieldId) {
        let mut encoder =
            self.context
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Clear Encoder"),
                });
        for buffer in self.store.slots_mut(field).iter() {
            encoder.clear_buffer(buffer, 0, None);
        }
        self.context
            .queue()
            .submit(std::iter::once(encoder.finish()));
    }

    fn read_field(&self, field: FieldId) -> Result<Cow<'_, [f32]>, SolverError> {
        let device = self.context.device();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Field Readback Encoder"),
        });
        encoder.copy_buffer_to_buffer(
            self.store.current_of(field),
            0,
            &self.staging,
            0,
            self.field_bytes(),
        );
        self.context
            .queue()
            .submit(std::iter::once(encoder.finish()));

        // Map and read
        let buffer_slice = self.staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        let _ = device.poll(wgpu::Maintain::Wait);
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Self::readback_error(field, e)),
            Err(e) => return Err(Self::readback_error(field, e)),
        }

        let data = buffer_slice.get_mapped_range();
        let cells = bytemuck::cast_slice::<u8, f32>(&data);
        let result: Vec<f32> = match field.channels() {
            2 => cells.to_vec(),
            _ => cells.iter().step_by(2).copied().collect(),
        };
        drop(data);
        self.staging.unmap();

        Ok(Cow::Owned(result))
    }

    fn write_field(&mut self, field: FieldId, data: &[f32]) -> Result<(), SolverError> {
        check_field_len(&self.grid, field, data.len())?;

        // Scalars are widened to vec2 with a zero second channel
        let widened: Cow<'_, [f32]> = match field.channels() {
            2 => Cow::Borrowed(data),
            _ => Cow::Owned(data.iter().flat_map(|&v| [v, 0.0]).collect()),
        };
        self.context.queue().write_buffer(
            self.store.current_of(field),
            0,
            bytemuck::cast_slice::<f32, u8>(&widened),
        );
        Ok(())
    }

    fn current_slot(&self, field: FieldId) -> Slot {
        self.store.current_slot(field)
    }

    fn grid(&self) -> Grid {
        self.grid
    }

    fn is_gpu_accelerated(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationParams;
    use crate::solver::GpuInitResult;
    use nalgebra::Vector2;

    fn try_solver(width: u32, height: u32) -> Option<GpuFluidSolver> {
        match GpuContext::new() {
            GpuInitResult::Success(ctx) => {
                Some(GpuFluidSolver::new(ctx, Grid::new(width, height, 1.0).ok()?))
            }
            _ => None,
        }
    }

    #[test]
    fn test_gpu_fields_start_zeroed() {
        let Some(solver) = try_solver(20, 10) else {
            return;
        };
        for field in FieldId::ALL {
            let data = solver.read_field(field).unwrap();
            assert_eq!(data.len(), 200 * field.channels());
            assert!(data.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_gpu_write_read_scalar() {
        let Some(mut solver) = try_solver(8, 8) else {
            return;
        };
        let data: Vec<f32> = (0..64).map(|i| i as f32).collect();
        solver.write_field(FieldId::Density, &data).unwrap();
        assert_eq!(solver.read_field(FieldId::Density).unwrap().as_ref(), &data[..]);
    }

    #[test]
    fn test_gpu_splat_commits() {
        let Some(mut solver) = try_solver(16, 16) else {
            return;
        };
        let params = SimulationParams::default();
        solver.apply(
            &Operator::Splat {
                field: FieldId::Temperature,
                point: Vector2::new(8.0, 8.0),
                color: Vector2::new(2.0, 0.0),
                radius: 3.0,
            },
            &params,
        );
        assert_eq!(solver.current_slot(FieldId::Temperature), Slot::B);
        let t = solver.read_field(FieldId::Temperature).unwrap();
        assert!((t[8 * 16 + 8] - 2.0).abs() < 1e-5);
    }
}
