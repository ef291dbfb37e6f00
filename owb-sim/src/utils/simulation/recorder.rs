//! Fixed-step trajectory recorder.
//!
//! `TrajectoryRecorder` owns a `KinematicModel`, advances it by a constant
//! time step, and appends every resulting pose to an append-only history.
//! `step` is the only primitive that mutates state; `run` and `run_with` are
//! loops over it.

use alloc::vec::Vec;

use crate::utils::{
    error::{KinematicsError, Result},
    math::kinematics::{BodyVelocity, KinematicModel, Pose, WheelSpeeds},
};

/// Default simulation time step (s).
pub const DEFAULT_DT: f64 = 0.1;

/// Drives a `KinematicModel` and keeps the pose history.
#[derive(Debug, Clone)]
pub struct TrajectoryRecorder {
    model: KinematicModel,
    dt: f64,
    steps: usize,
    history: Vec<Pose>,
}

impl TrajectoryRecorder {
    /// Wrap `model` with a fixed step `dt`.
    ///
    /// # Errors
    ///
    /// `InvalidTimestep` if `dt` is not finite and strictly positive.
    pub fn new(
        model: KinematicModel,
        dt: f64,
    ) -> Result<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(KinematicsError::InvalidTimestep(dt));
        }
        Ok(Self::init(model, dt))
    }

    /// Wrap `model` with the default step of 0.1 s.
    pub fn with_default_dt(model: KinematicModel) -> Self {
        Self::init(model, DEFAULT_DT)
    }

    fn init(
        model: KinematicModel,
        dt: f64,
    ) -> Self {
        tracing::debug!(dt, pose = ?model.get_pose(), "trajectory recorder initialized");
        TrajectoryRecorder {
            model,
            dt,
            steps: 0,
            history: Vec::new(),
        }
    }

    /// Advance the model by one step and append the resulting pose.
    ///
    /// On error the pose, simulated time and history are unchanged.
    pub fn step(
        &mut self,
        wheels: WheelSpeeds,
    ) -> Result<Pose> {
        let pose = self.model.integrate_step(wheels, self.dt)?;
        self.steps += 1;
        self.history.push(pose);
        tracing::trace!(step = self.steps, x = pose.x, y = pose.y, theta = pose.theta);
        Ok(pose)
    }

    /// Convert a body velocity to wheel speeds and take one step.
    pub fn step_body(
        &mut self,
        body: BodyVelocity,
    ) -> Result<Pose> {
        let wheels = self.model.forward_kinematics(body)?;
        self.step(wheels)
    }

    /// Number of steps `run` takes for `duration`: `floor(duration / dt)`.
    pub fn step_count(
        &self,
        duration: f64,
    ) -> Result<usize> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(KinematicsError::InvalidInput(
                "duration must be finite and non-negative",
            ));
        }
        let count = libm::floor(duration / self.dt);
        if count >= usize::MAX as f64 {
            return Err(KinematicsError::InvalidInput(
                "duration needs more steps than can be counted",
            ));
        }
        Ok(count as usize)
    }

    /// Step count for `duration`, with history room for every sample reserved.
    fn reserve_run(
        &mut self,
        duration: f64,
    ) -> Result<usize> {
        let count = self.step_count(duration)?;
        self.history.try_reserve(count).map_err(|_| {
            KinematicsError::InvalidInput("duration needs more samples than fit in memory")
        })?;
        Ok(count)
    }

    /// Step `floor(duration / dt)` times with constant wheel speeds.
    ///
    /// Either every step succeeds or the recorder is restored to its state
    /// before the call. Returns the number of steps taken.
    pub fn run(
        &mut self,
        wheels: WheelSpeeds,
        duration: f64,
    ) -> Result<usize> {
        if !wheels.is_finite() {
            return Err(KinematicsError::InvalidInput("wheel speeds must be finite"));
        }
        let count = self.reserve_run(duration)?;
        tracing::debug!(steps = count, %wheels, "running constant wheel speeds");

        let (model, steps, len) = (self.model.clone(), self.steps, self.history.len());
        for _ in 0..count {
            if let Err(e) = self.step(wheels) {
                tracing::debug!(step = self.steps, error = %e, "run aborted, rolling back");
                self.model = model;
                self.steps = steps;
                self.history.truncate(len);
                return Err(e);
            }
        }

        tracing::debug!(time = self.time(), pose = %self.pose(), "run complete");
        Ok(count)
    }

    /// Step `floor(duration / dt)` times, asking `generator` for the body
    /// velocity at the start time of each tick.
    ///
    /// Stops at the first failing step; steps already taken stay in history.
    pub fn run_with<F>(
        &mut self,
        duration: f64,
        mut generator: F,
    ) -> Result<usize>
    where
        F: FnMut(f64) -> BodyVelocity,
    {
        let count = self.reserve_run(duration)?;
        tracing::debug!(steps = count, "running generated body velocities");

        for _ in 0..count {
            let body = generator(self.time());
            self.step_body(body)?;
        }

        tracing::debug!(time = self.time(), pose = %self.pose(), "run complete");
        Ok(count)
    }

    /// Recorded poses in time order.
    pub fn history(&self) -> &[Pose] {
        &self.history
    }

    /// Recorded poses paired with their time stamps.
    ///
    /// The k-th sample (counting from 1) is stamped `k * dt`.
    pub fn samples(&self) -> impl Iterator<Item = (f64, Pose)> + '_ {
        let dt = self.dt;
        self.history
            .iter()
            .enumerate()
            .map(move |(i, &pose)| ((i + 1) as f64 * dt, pose))
    }

    /// Simulated time elapsed (s).
    pub fn time(&self) -> f64 {
        self.steps as f64 * self.dt
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn pose(&self) -> Pose {
        self.model.get_pose()
    }

    pub fn model(&self) -> &KinematicModel {
        &self.model
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Consume the recorder and return its history.
    pub fn into_history(self) -> Vec<Pose> {
        self.history
    }
}
