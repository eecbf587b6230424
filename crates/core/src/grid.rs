//! Simulation grid geometry
//!
//! Cell `(x, y)` is centred on the integer coordinate `(x, y)` and `y = 0` is
//! the bottom row. Display space has its origin at the top-left, so the Y
//! axis is flipped on the way in (pointer input) and on the way out (frames).

use crate::error::ConfigError;
use crate::solver::QualityPreset;
use nalgebra::Vector2;

/// Smallest width or height that still leaves an interior cell next to
/// every edge cell
pub const MIN_GRID_DIMENSION: u32 = 3;

/// Immutable grid dimensions and world scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    width: u32,
    height: u32,
    scale: f32,
}

impl Grid {
    /// Create a grid of `width × height` cells, each `scale` world units wide
    ///
    /// # Errors
    ///
    /// [`ConfigError::GridTooSmall`] if either dimension is below
    /// [`MIN_GRID_DIMENSION`], [`ConfigError::NonPositive`] if `scale` is not
    /// a positive finite number.
    pub fn new(width: u32, height: u32, scale: f32) -> Result<Self, ConfigError> {
        if width < MIN_GRID_DIMENSION || height < MIN_GRID_DIMENSION {
            return Err(ConfigError::GridTooSmall { width, height });
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "grid_scale",
                value: scale,
            });
        }
        Ok(Self {
            width,
            height,
            scale,
        })
    }

    /// Size the grid from a display resolution with a quality preset
    ///
    /// # Errors
    ///
    /// Same as [`Grid::new`].
    pub fn from_display(
        display_width: u32,
        display_height: u32,
        preset: QualityPreset,
        scale: f32,
    ) -> Result<Self, ConfigError> {
        let (width, height) = preset.grid_dimensions(display_width, display_height);
        Self::new(width, height, scale)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// World size of one cell
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Row-major index of cell `(x, y)`
    #[must_use]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Centre of the grid in cell coordinates
    #[must_use]
    pub fn center(&self) -> Vector2<f32> {
        Vector2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Convert a display-space position into grid space
    ///
    /// # Arguments
    ///
    /// * `screen` - Position in display pixels, origin top-left
    /// * `display` - Display `(width, height)` in pixels
    #[must_use]
    pub fn screen_to_grid(&self, screen: Vector2<f32>, display: (f32, f32)) -> Vector2<f32> {
        let (display_w, display_h) = display;
        Vector2::new(
            screen.x / display_w * self.width as f32,
            (display_h - screen.y) / display_h * self.height as f32,
        )
    }
}
