//! Utility re-exports for the Omni-Wheel Bot simulator.
//!
//! - `error`: the error type returned by every fallible operation
//! - `math`: forward/inverse kinematics and pose integration
//! - `simulation`: trajectory recording and simulation configuration

pub mod error;
pub mod math;
pub mod simulation;

pub use error::KinematicsError;
pub use math::kinematics::{BodyVelocity, Geometry, KinematicModel, Pose, WheelSpeeds};
pub use simulation::{config::SimConfig, recorder::TrajectoryRecorder};
