//! Field identifiers and the CPU field container
//!
//! Every simulated quantity is a 2D grid of one or two channels. On the CPU a
//! field is a flat `Vec<f32>` with interleaved channels; on the GPU it is a
//! storage buffer of `vec2<f32>` regardless of arity.

use nalgebra::Vector2;
use rayon::prelude::*;
use std::fmt;

/// Number of channels per cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// One value per cell
    Scalar,
    /// Two values per cell
    Vector,
}

impl Arity {
    /// Channel count for this arity
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector => 2,
        }
    }
}

/// Simulated quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    /// Fluid velocity in cells per unit time
    Velocity,
    /// Passive dye carried by the flow
    Density,
    /// Heat, drives buoyancy
    Temperature,
    /// Velocity divergence, right-hand side of the pressure solve
    Divergence,
    /// Scalar curl of velocity
    Vorticity,
    /// Pressure from the Jacobi solve
    Pressure,
    /// Fixed right-hand side of a diffusion solve
    Snapshot,
}

impl FieldId {
    /// Number of fields in the store
    pub const COUNT: usize = 7;

    /// Every field, in storage order
    pub const ALL: [Self; Self::COUNT] = [
        Self::Velocity,
        Self::Density,
        Self::Temperature,
        Self::Divergence,
        Self::Vorticity,
        Self::Pressure,
        Self::Snapshot,
    ];

    /// Position in [`FieldId::ALL`]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn arity(self) -> Arity {
        match self {
            Self::Velocity | Self::Snapshot => Arity::Vector,
            Self::Density
            | Self::Temperature
            | Self::Divergence
            | Self::Vorticity
            | Self::Pressure => Arity::Scalar,
        }
    }

    #[must_use]
    pub const fn channels(self) -> usize {
        self.arity().channels()
    }

    /// Lowercase name used in logs and error messages
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Velocity => "velocity",
            Self::Density => "density",
            Self::Temperature => "temperature",
            Self::Divergence => "divergence",
            Self::Vorticity => "vorticity",
            Self::Pressure => "pressure",
            Self::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field data container for the CPU backend
///
/// Values are stored row-major with interleaved channels:
/// `data[(y * width + x) * channels + c]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldData {
    /// Field values
    pub data: Vec<f32>,
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Values per cell (1 or 2)
    pub channels: usize,
}

impl FieldData {
    /// Create a zeroed field
    ///
    /// # Arguments
    ///
    /// * `width` - Grid width in cells
    /// * `height` - Grid height in cells
    /// * `channels` - Values per cell
    #[must_use]
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self::with_value(width, height, channels, 0.0)
    }

    /// Create a field with every channel of every cell set to `value`
    #[must_use]
    pub fn with_value(width: usize, height: usize, channels: usize, value: f32) -> Self {
        Self {
            data: vec![value; width * height * channels],
            width,
            height,
            channels,
        }
    }

    /// Zeroed field shaped for `field` on a `width × height` grid
    #[must_use]
    pub fn for_field(field: FieldId, width: usize, height: usize) -> Self {
        Self::new(width, height, field.channels())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Get one channel at a grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates or channel are out of bounds
    #[must_use]
    pub fn get(&self, x: usize, y: usize, channel: usize) -> f32 {
        assert!(
            x < self.width && y < self.height && channel < self.channels,
            "Coordinates out of bounds"
        );
        self.data[(y * self.width + x) * self.channels + channel]
    }

    /// Set one channel at a grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates or channel are out of bounds
    pub fn set(&mut self, x: usize, y: usize, channel: usize, value: f32) {
        assert!(
            x < self.width && y < self.height && channel < self.channels,
            "Coordinates out of bounds"
        );
        self.data[(y * self.width + x) * self.channels + channel] = value;
    }

    /// Read a channel with coordinates clamped into the grid
    ///
    /// Channels past the field's arity read as zero, so a scalar field can
    /// stand in wherever a vector is expected.
    #[inline]
    #[must_use]
    pub fn fetch(&self, x: i64, y: i64, channel: usize) -> f32 {
        if channel >= self.channels {
            return 0.0;
        }
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.data[(y * self.width + x) * self.channels + channel]
    }

    /// Both channels of a cell as a vector, with clamped coordinates
    #[inline]
    #[must_use]
    pub fn fetch_vector(&self, x: i64, y: i64) -> Vector2<f32> {
        Vector2::new(self.fetch(x, y, 0), self.fetch(x, y, 1))
    }

    /// Bilinear sample at a continuous position
    ///
    /// Cell `(x, y)` sits at the integer coordinate `(x, y)`. The position is
    /// clamped to `[0, width-1] × [0, height-1]` first, so samples outside the
    /// grid return edge values.
    #[must_use]
    pub fn sample_bilinear(&self, position: Vector2<f32>, channel: usize) -> f32 {
        let px = position.x.clamp(0.0, (self.width - 1) as f32);
        let py = position.y.clamp(0.0, (self.height - 1) as f32);

        let x0 = px.floor();
        let y0 = py.floor();
        let tx = px - x0;
        let ty = py - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let bottom = lerp(
            self.fetch(x0, y0, channel),
            self.fetch(x0 + 1, y0, channel),
            tx,
        );
        let top = lerp(
            self.fetch(x0, y0 + 1, channel),
            self.fetch(x0 + 1, y0 + 1, channel),
            tx,
        );
        lerp(bottom, top, ty)
    }

    /// Run `kernel(x, y, cell)` for every cell in parallel, rows split across
    /// the Rayon pool. `cell` is the mutable channel slice of that cell.
    pub fn par_for_each_cell<F>(&mut self, kernel: F)
    where
        F: Fn(usize, usize, &mut [f32]) + Sync + Send,
    {
        let width = self.width;
        let channels = self.channels;
        self.data
            .par_chunks_mut(width * channels)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, cell) in row.chunks_mut(channels).enumerate() {
                    kernel(x, y, cell);
                }
            });
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Overwrite every cell with the matching channels of `source`
    ///
    /// Channels `source` lacks are zeroed.
    pub fn copy_channels_from(&mut self, source: &FieldData) {
        self.par_for_each_cell(|x, y, cell| {
            for (channel, value) in cell.iter_mut().enumerate() {
                *value = source.fetch(x as i64, y as i64, channel);
            }
        });
    }

    /// Largest absolute value over all channels
    #[must_use]
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0_f32, |acc, v| acc.max(v.abs()))
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
