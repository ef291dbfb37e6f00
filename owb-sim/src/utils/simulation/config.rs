//! Simulation parameters.
//!
//! Every field has a default, so a partial table (or none at all) deserializes
//! into a usable configuration:
//!
//! ```toml
//! [robot]
//! wheel_radius = 0.1
//! wheel_distance = 0.2
//!
//! [simulation]
//! dt = 0.1
//!
//! [initial_pose]
//! x = 0.0
//! y = 0.0
//! theta = 0.0
//! ```

use serde::{Deserialize, Serialize};

use crate::utils::{
    error::{KinematicsError, Result},
    math::kinematics::{Geometry, KinematicModel, Pose},
    simulation::recorder::{TrajectoryRecorder, DEFAULT_DT},
};

/// Top-level simulation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub robot: Geometry,
    pub simulation: StepConfig,
    pub initial_pose: Pose,
}

/// Integration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Fixed time step (s).
    pub dt: f64,
}

impl Default for StepConfig {
    fn default() -> Self {
        StepConfig { dt: DEFAULT_DT }
    }
}

impl SimConfig {
    /// Check every value without building anything.
    pub fn validate(&self) -> Result<()> {
        self.robot.validate()?;
        if !self.initial_pose.is_finite() {
            return Err(KinematicsError::InvalidInput("initial pose must be finite"));
        }
        let dt = self.simulation.dt;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(KinematicsError::InvalidTimestep(dt));
        }
        Ok(())
    }

    /// Build a recorder around a fresh model at the configured initial pose.
    pub fn build(&self) -> Result<TrajectoryRecorder> {
        self.validate()?;
        let model = KinematicModel::new(self.initial_pose, self.robot)?;
        TrajectoryRecorder::new(model, self.simulation.dt)
    }
}
