//! Error types for configuration and backend failures.

use crate::solver::FieldId;
use std::error::Error;
use std::fmt;

/// Rejected configuration.
///
/// Raised when a grid or parameter set is constructed or replaced, never
/// in the middle of a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Grid width or height below the minimum that leaves an interior cell
    GridTooSmall {
        /// Requested width in cells
        width: u32,
        /// Requested height in cells
        height: u32,
    },
    /// A parameter that must be strictly positive and finite was not
    NonPositive {
        /// Parameter name as it appears in `SimulationParams`
        name: &'static str,
        /// Offending value
        value: f32,
    },
    /// A dissipation factor outside `[0, 1]`
    DissipationOutOfRange {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f32,
    },
    /// An iteration count of zero where at least one pass is required
    ZeroIterations {
        /// Parameter name
        name: &'static str,
    },
    /// `grid_scale` changed on a simulation whose grid is already allocated
    GridScaleChanged {
        /// Scale the grid was built with
        current: f32,
        /// Scale that was requested
        requested: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GridTooSmall { width, height } => write!(
                f,
                "grid {width}x{height} is too small: both dimensions must be at least {}",
                crate::grid::MIN_GRID_DIMENSION
            ),
            Self::NonPositive { name, value } => {
                write!(f, "{name} must be positive and finite, got {value}")
            }
            Self::DissipationOutOfRange { name, value } => {
                write!(f, "{name} must lie in [0, 1], got {value}")
            }
            Self::ZeroIterations { name } => write!(f, "{name} must be at least 1"),
            Self::GridScaleChanged { current, requested } => write!(
                f,
                "grid_scale is fixed at {current} for the lifetime of the grid, cannot change to {requested}"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Failure reported by a solver backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// Uploaded data does not match the field's cell count × channel count
    FieldSize {
        /// Field being written
        field: FieldId,
        /// Expected number of floats
        expected: usize,
        /// Number of floats supplied
        actual: usize,
    },
    /// Copying a GPU buffer back to host memory failed
    Readback {
        /// Field being read
        field: FieldId,
        /// Backend error message
        message: String,
    },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldSize {
                field,
                expected,
                actual,
            } => write!(
                f,
                "field {field} expects {expected} values, got {actual}"
            ),
            Self::Readback { field, message } => {
                write!(f, "readback of field {field} failed: {message}")
            }
        }
    }
}

impl Error for SolverError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::NonPositive {
            name: "timestep",
            value: 0.0,
        };
        assert_eq!(err.to_string(), "timestep must be positive and finite, got 0");

        let err = ConfigError::GridTooSmall {
            width: 0,
            height: 10,
        };
        assert!(err.to_string().contains("0x10"));
    }

    #[test]
    fn test_solver_error_names_field() {
        let err = SolverError::FieldSize {
            field: FieldId::Velocity,
            expected: 8,
            actual: 4,
        };
        assert_eq!(err.to_string(), "field velocity expects 8 values, got 4");
    }
}
