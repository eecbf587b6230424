//! Pointer input and host actions
//!
//! Hosts convert their window events into one [`PointerSample`] per tick
//! (already in grid space, see [`Grid::screen_to_grid`]) plus discrete
//! [`Action`]s.
//!
//! [`Grid::screen_to_grid`]: crate::grid::Grid::screen_to_grid

use crate::config::SimulationParams;
use nalgebra::Vector2;

/// Discrete host commands applied between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Running ↔ Paused
    TogglePause,
    /// Zero every field and resume
    Reset,
}

/// Pointer state observed by the host for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    /// Grid-space position, `None` while the pointer is outside the view
    pub position: Option<Vector2<f32>>,
    /// Primary button held: inject velocity
    pub primary: bool,
    /// Secondary button held: inject density and temperature
    pub secondary: bool,
}

impl PointerSample {
    /// No pointer, no buttons
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn at(position: Vector2<f32>, primary: bool, secondary: bool) -> Self {
        Self {
            position: Some(position),
            primary,
            secondary,
        }
    }
}

/// What a tick injects at the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Injection {
    /// Grid-space splat centre
    pub point: Vector2<f32>,
    /// Velocity impulse, `None` when the primary button is up or the
    /// pointer did not move
    pub velocity: Option<Vector2<f32>>,
    /// Whether density and temperature are injected
    pub scalars: bool,
}

/// Last sampled pointer and the drag since the sample before it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    position: Option<Vector2<f32>>,
    drag: Vector2<f32>,
    primary: bool,
    secondary: bool,
}

impl PointerState {
    /// Record this tick's sample
    ///
    /// The drag is the movement since the previous sample; it is zero on
    /// the first sample and whenever either sample has no position.
    pub fn sample(&mut self, sample: &PointerSample) {
        self.drag = match (sample.position, self.position) {
            (Some(now), Some(before)) => now - before,
            _ => Vector2::zeros(),
        };
        self.position = sample.position;
        self.primary = sample.primary;
        self.secondary = sample.secondary;
    }

    #[must_use]
    pub fn position(&self) -> Option<Vector2<f32>> {
        self.position
    }

    #[must_use]
    pub fn drag(&self) -> Vector2<f32> {
        self.drag
    }

    /// Injection implied by the current buttons, if any
    #[must_use]
    pub fn injection(&self, params: &SimulationParams) -> Option<Injection> {
        let point = self.position?;
        let velocity = (self.primary && self.drag != Vector2::zeros())
            .then(|| self.drag * params.splat_force);

        if velocity.is_none() && !self.secondary {
            return None;
        }
        Some(Injection {
            point,
            velocity,
            scalars: self.secondary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_has_no_drag() {
        let mut pointer = PointerState::default();
        pointer.sample(&PointerSample::at(Vector2::new(5.0, 5.0), true, false));
        assert_eq!(pointer.drag(), Vector2::zeros());
        assert_eq!(pointer.injection(&SimulationParams::default()), None);
    }

    #[test]
    fn test_drag_is_delta_between_samples() {
        let mut pointer = PointerState::default();
        pointer.sample(&PointerSample::at(Vector2::new(5.0, 5.0), true, false));
        pointer.sample(&PointerSample::at(Vector2::new(7.0, 4.0), true, false));
        assert_eq!(pointer.drag(), Vector2::new(2.0, -1.0));

        let params = SimulationParams {
            splat_force: 10.0,
            ..Default::default()
        };
        let injection = pointer.injection(&params).unwrap();
        assert_eq!(injection.point, Vector2::new(7.0, 4.0));
        assert_eq!(injection.velocity, Some(Vector2::new(20.0, -10.0)));
        assert!(!injection.scalars);
    }

    #[test]
    fn test_leaving_view_resets_drag() {
        let mut pointer = PointerState::default();
        pointer.sample(&PointerSample::at(Vector2::new(1.0, 1.0), true, false));
        pointer.sample(&PointerSample::idle());
        pointer.sample(&PointerSample::at(Vector2::new(9.0, 9.0), true, false));
        assert_eq!(pointer.drag(), Vector2::zeros());
    }

    #[test]
    fn test_secondary_injects_scalars_without_motion() {
        let mut pointer = PointerState::default();
        pointer.sample(&PointerSample::at(Vector2::new(3.0, 2.0), false, true));
        let injection = pointer.injection(&SimulationParams::default()).unwrap();
        assert_eq!(injection.velocity, None);
        assert!(injection.scalars);
    }
}
