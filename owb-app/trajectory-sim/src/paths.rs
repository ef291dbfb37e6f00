//! Path generators that feed body velocities to the recorder.
//!
//! Each generator is a pure function of time. Circle and spiral return the
//! time derivative of the world-frame curve, so the recorder traces the curve
//! from the robot's starting pose without turning the chassis.

use anyhow::ensure;
use owb_sim::utils::BodyVelocity;

/// Source of a body velocity for every tick of a simulation.
pub trait PathGenerator {
    /// Body velocity to apply at time `t` (s).
    fn velocity(&self, t: f64) -> BodyVelocity;
}

/// Constant body velocity.
#[derive(Debug, Clone, Copy)]
pub struct Line {
    velocity: BodyVelocity,
}

impl Line {
    pub fn new(x_dot: f64, y_dot: f64, theta_dot: f64) -> Self {
        Line {
            velocity: BodyVelocity::new(theta_dot, x_dot, y_dot),
        }
    }
}

impl PathGenerator for Line {
    fn velocity(&self, _t: f64) -> BodyVelocity {
        self.velocity
    }
}

/// Circle of fixed radius travelled at constant speed, counter-clockwise.
///
/// The circle starts at the robot's position heading +y, so its centre sits
/// `radius` to the robot's -x side.
#[derive(Debug, Clone, Copy)]
pub struct Circle {
    speed: f64,
    rate: f64,
}

impl Circle {
    pub fn new(radius: f64, speed: f64) -> anyhow::Result<Self> {
        ensure!(radius.is_finite() && radius > 0.0, "circle radius must be positive, got {radius}");
        ensure!(speed.is_finite(), "circle speed must be finite, got {speed}");
        Ok(Circle {
            speed,
            rate: speed / radius,
        })
    }
}

impl PathGenerator for Circle {
    fn velocity(&self, t: f64) -> BodyVelocity {
        let phi = self.rate * t;
        BodyVelocity::new(0.0, -self.speed * phi.sin(), self.speed * phi.cos())
    }
}

/// Archimedean spiral `r(t) = start_radius + growth * t` swept at a constant
/// angular rate.
#[derive(Debug, Clone, Copy)]
pub struct Spiral {
    start_radius: f64,
    growth: f64,
    angular_rate: f64,
}

impl Spiral {
    pub fn new(start_radius: f64, growth: f64, angular_rate: f64) -> anyhow::Result<Self> {
        ensure!(
            start_radius.is_finite() && start_radius >= 0.0,
            "spiral start radius must be non-negative, got {start_radius}"
        );
        ensure!(growth.is_finite(), "spiral growth must be finite, got {growth}");
        ensure!(angular_rate.is_finite(), "spiral angular rate must be finite, got {angular_rate}");
        Ok(Spiral {
            start_radius,
            growth,
            angular_rate,
        })
    }

    /// Offset of the spiral point at `t` from its starting point.
    pub fn displacement(&self, t: f64) -> (f64, f64) {
        let r = self.start_radius + self.growth * t;
        let phi = self.angular_rate * t;
        (r * phi.cos() - self.start_radius, r * phi.sin())
    }
}

impl PathGenerator for Spiral {
    fn velocity(&self, t: f64) -> BodyVelocity {
        let r = self.start_radius + self.growth * t;
        let phi = self.angular_rate * t;
        let (sin, cos) = phi.sin_cos();
        BodyVelocity::new(
            0.0,
            self.growth * cos - r * self.angular_rate * sin,
            self.growth * sin + r * self.angular_rate * cos,
        )
    }
}
