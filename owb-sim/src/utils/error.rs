//! Error type for the simulator core.
//!
//! Every error is returned to the caller of the operation that detected it.
//! Nothing in the core retries or recovers.

use core::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, KinematicsError>;

/// Errors raised by the kinematic model and the trajectory recorder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KinematicsError {
    /// The forward matrix cannot be inverted for the requested geometry.
    SingularGeometry {
        /// Determinant of the forward matrix.
        determinant: f64,
    },
    /// A time step that is zero, negative, or not finite.
    InvalidTimestep(f64),
    /// A velocity, geometry value, pose, or duration outside its valid range.
    InvalidInput(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::SingularGeometry { determinant } => write!(
                f,
                "Singular geometry: forward matrix is not invertible (det = {:e})",
                determinant
            ),
            KinematicsError::InvalidTimestep(dt) => {
                write!(f, "Invalid time step: {} (must be finite and positive)", dt)
            }
            KinematicsError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
