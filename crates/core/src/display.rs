//! Display adapter
//!
//! A [`DisplayFrame`] is a snapshot of the committed buffer of one field,
//! together with the 4×4 matrix that maps its channels `(c0, c1, 0, 1)` to
//! RGBA. Hosts upscale it to their output resolution with nearest-neighbour
//! sampling; row 0 of the output is the top of the grid.

use crate::solver::FieldId;
use nalgebra::{Matrix4, Vector4};
use std::fmt;

/// Field shown by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayField {
    Velocity,
    #[default]
    Density,
    Temperature,
    Pressure,
    Divergence,
}

impl DisplayField {
    /// Every displayable field, in selection order
    pub const ALL: [Self; 5] = [
        Self::Velocity,
        Self::Density,
        Self::Temperature,
        Self::Pressure,
        Self::Divergence,
    ];

    #[must_use]
    pub const fn field_id(self) -> FieldId {
        match self {
            Self::Velocity => FieldId::Velocity,
            Self::Density => FieldId::Density,
            Self::Temperature => FieldId::Temperature,
            Self::Pressure => FieldId::Pressure,
            Self::Divergence => FieldId::Divergence,
        }
    }

    /// Channel remapping applied to `(c0, c1, 0, 1)`
    ///
    /// Velocity maps its components around mid-grey, scalar quantities are
    /// shown as greyscale, signed fields are shifted so zero is mid-grey.
    #[must_use]
    pub fn channel_matrix(self) -> Matrix4<f32> {
        match self {
            Self::Velocity => Matrix4::new(
                0.1, 0.0, 0.0, 0.5, //
                0.0, 0.1, 0.0, 0.5, //
                0.0, 0.0, 0.0, 0.5, //
                0.0, 0.0, 0.0, 1.0,
            ),
            Self::Density | Self::Temperature => Matrix4::new(
                1.0, 0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ),
            Self::Pressure | Self::Divergence => Matrix4::new(
                0.5, 0.0, 0.0, 0.5, //
                0.5, 0.0, 0.0, 0.5, //
                0.5, 0.0, 0.0, 0.5, //
                0.0, 0.0, 0.0, 1.0,
            ),
        }
    }

    /// The following field, wrapping around
    #[must_use]
    pub fn next(self) -> Self {
        let position = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(position + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.field_id().name()
    }
}

impl fmt::Display for DisplayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Snapshot of one field ready for presentation
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    /// Field the data was read from
    pub field: DisplayField,
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Channels per cell in `data`
    pub channels: usize,
    /// Row-major cell values, bottom row first
    pub data: Vec<f32>,
    /// Channel remapping
    pub matrix: Matrix4<f32>,
    /// Output width in pixels
    pub output_width: usize,
    /// Output height in pixels
    pub output_height: usize,
}

impl DisplayFrame {
    /// Wrap field data read from a solver
    ///
    /// # Arguments
    ///
    /// * `field` - Displayed field
    /// * `width`, `height` - Grid size in cells
    /// * `data` - Committed buffer, `width × height × channels` values
    /// * `output` - Output `(width, height)` in pixels
    #[must_use]
    pub fn new(
        field: DisplayField,
        width: usize,
        height: usize,
        data: Vec<f32>,
        output: (usize, usize),
    ) -> Self {
        Self {
            field,
            width,
            height,
            channels: field.field_id().channels(),
            data,
            matrix: field.channel_matrix(),
            output_width: output.0,
            output_height: output.1,
        }
    }

    /// RGBA of grid cell `(x, y)`, each component clamped to `[0, 1]`
    ///
    /// # Panics
    ///
    /// Panics if the cell lies outside the grid.
    #[must_use]
    pub fn color_at(&self, x: usize, y: usize) -> [f32; 4] {
        assert!(x < self.width && y < self.height, "Coordinates out of bounds");
        let base = (y * self.width + x) * self.channels;
        let c0 = self.data[base];
        let c1 = if self.channels > 1 {
            self.data[base + 1]
        } else {
            0.0
        };

        let rgba = self.matrix * Vector4::new(c0, c1, 0.0, 1.0);
        [
            rgba.x.clamp(0.0, 1.0),
            rgba.y.clamp(0.0, 1.0),
            rgba.z.clamp(0.0, 1.0),
            rgba.w.clamp(0.0, 1.0),
        ]
    }

    /// Grid cell under output pixel `(px, py)`, origin top-left
    #[must_use]
    pub fn output_to_cell(&self, px: usize, py: usize) -> (usize, usize) {
        let out_w = self.output_width.max(1);
        let out_h = self.output_height.max(1);
        let x = (px * self.width / out_w).min(self.width - 1);
        let row_from_top = (py * self.height / out_h).min(self.height - 1);
        (x, self.height - 1 - row_from_top)
    }

    /// RGBA of output pixel `(px, py)` by nearest-neighbour lookup
    #[must_use]
    pub fn sample_output(&self, px: usize, py: usize) -> [f32; 4] {
        let (x, y) = self.output_to_cell(px, py);
        self.color_at(x, y)
    }

    /// Render the whole frame into 8-bit RGBA at the output resolution
    #[must_use]
    pub fn upscale(&self) -> Vec<[u8; 4]> {
        let mut pixels = Vec::with_capacity(self.output_width * self.output_height);
        for py in 0..self.output_height {
            for px in 0..self.output_width {
                let rgba = self.sample_output(px, py);
                pixels.push(rgba.map(|c| (c * 255.0).round() as u8));
            }
        }
        pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_density_is_greyscale() {
        let frame = DisplayFrame::new(DisplayField::Density, 2, 2, vec![0.25, 0.0, 0.0, 2.0], (2, 2));
        assert_eq!(frame.color_at(0, 0), [0.25, 0.25, 0.25, 1.0]);
        assert_eq!(frame.color_at(1, 1), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_signed_fields_centre_on_grey() {
        let frame =
            DisplayFrame::new(DisplayField::Pressure, 3, 1, vec![-1.0, 0.0, 0.5], (3, 1));
        assert_relative_eq!(frame.color_at(0, 0)[0], 0.0);
        assert_relative_eq!(frame.color_at(1, 0)[0], 0.5);
        assert_relative_eq!(frame.color_at(2, 0)[0], 0.75);
    }

    #[test]
    fn test_velocity_channels_map_to_red_green() {
        let frame = DisplayFrame::new(DisplayField::Velocity, 1, 1, vec![2.0, -3.0], (1, 1));
        let rgba = frame.color_at(0, 0);
        assert_relative_eq!(rgba[0], 0.7, epsilon = 1e-6);
        assert_relative_eq!(rgba[1], 0.2, epsilon = 1e-6);
        assert_relative_eq!(rgba[2], 0.5);
        assert_relative_eq!(rgba[3], 1.0);
    }

    #[test]
    fn test_output_is_flipped_and_upscaled() {
        // Bottom row dark, top row bright
        let frame = DisplayFrame::new(DisplayField::Density, 2, 2, vec![0.0, 0.0, 1.0, 1.0], (4, 4));
        assert_eq!(frame.output_to_cell(0, 0), (0, 1));
        assert_eq!(frame.output_to_cell(3, 3), (1, 0));

        let pixels = frame.upscale();
        assert_eq!(pixels.len(), 16);
        assert_eq!(pixels[0], [255, 255, 255, 255]);
        assert_eq!(pixels[15], [0, 0, 0, 255]);
    }

    #[test]
    fn test_next_cycles_through_every_field() {
        let mut field = DisplayField::default();
        assert_eq!(field, DisplayField::Density);
        for _ in 0..DisplayField::ALL.len() {
            field = field.next();
        }
        assert_eq!(field, DisplayField::Density);
        assert_eq!(DisplayField::Divergence.next(), DisplayField::Velocity);
    }
}
