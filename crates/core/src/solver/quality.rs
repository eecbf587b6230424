//! Quality presets for grid resolution
//!
//! The simulation grid is sized as a fraction of the display resolution.
//! Finer grids resolve smaller eddies at a quadratic cost per pass.

/// Quality preset determining grid resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityPreset {
    /// One cell per display pixel
    Ultra,
    /// One cell per 2×2 display pixels
    High,
    /// One cell per 4×4 display pixels
    Medium,
    /// One cell per 8×8 display pixels
    Low,
}

impl QualityPreset {
    /// Display pixels per grid cell along each axis
    #[must_use]
    pub const fn downsample(&self) -> u32 {
        match self {
            Self::Ultra => 1,
            Self::High => 2,
            Self::Medium => 4,
            Self::Low => 8,
        }
    }

    /// Calculate grid dimensions for a display resolution
    ///
    /// # Arguments
    ///
    /// * `display_width` - Display width in pixels
    /// * `display_height` - Display height in pixels
    ///
    /// # Returns
    ///
    /// `(width, height)` in cells, clamped to `16..=4096`
    #[must_use]
    pub fn grid_dimensions(&self, display_width: u32, display_height: u32) -> (u32, u32) {
        let factor = self.downsample();

        let width = display_width.div_ceil(factor);
        let height = display_height.div_ceil(factor);

        // Clamp to reasonable limits
        (width.clamp(16, 4096), height.clamp(16, 4096))
    }

    /// Recommended preset: half the display resolution
    #[must_use]
    pub fn recommended() -> Self {
        Self::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downsample_factors() {
        assert_eq!(QualityPreset::Ultra.downsample(), 1);
        assert_eq!(QualityPreset::High.downsample(), 2);
        assert_eq!(QualityPreset::Medium.downsample(), 4);
        assert_eq!(QualityPreset::Low.downsample(), 8);
    }

    #[test]
    fn test_grid_dimensions() {
        assert_eq!(QualityPreset::High.grid_dimensions(1366, 768), (683, 384));
        assert_eq!(QualityPreset::Medium.grid_dimensions(1366, 768), (342, 192));
        assert_eq!(QualityPreset::Ultra.grid_dimensions(800, 600), (800, 600));
    }

    #[test]
    fn test_grid_dimensions_clamping() {
        assert_eq!(QualityPreset::Low.grid_dimensions(40, 40), (16, 16));
        assert_eq!(QualityPreset::Ultra.grid_dimensions(10000, 9000), (4096, 4096));
    }

    #[test]
    fn test_recommended_is_half_resolution() {
        assert_eq!(QualityPreset::recommended(), QualityPreset::High);
    }
}
