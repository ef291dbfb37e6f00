//! Kinematics for the three-wheeled omni-wheel chassis.
//!
//! `KinematicModel` holds the chassis geometry, the forward matrix `H` that
//! maps a body velocity `(θ̇, ẋ, ẏ)` to wheel speeds `(v, w, z)`, its inverse,
//! and the current pose. Each integration step recovers the body velocity from
//! wheel speeds and advances the pose with a first-order (forward-Euler) update.
//! Euler integration is only accurate for small `dt`; no higher-order scheme or
//! error control is applied.
//!
//! # Example
//! ```rust
//! use owb_sim::utils::math::kinematics::{BodyVelocity, Geometry, KinematicModel, Pose};
//! let mut model = KinematicModel::new(Pose::default(), Geometry::default()).unwrap();
//! let wheels = model.forward_kinematics(BodyVelocity::new(0.0, 1.0, 0.0)).unwrap();
//! let pose = model.integrate_step(wheels, 0.1).unwrap();
//! assert!((pose.x - 0.1).abs() < 1e-9);
//! ```

use core::{
    fmt,
    ops::{Add, Mul},
};

use serde::{Deserialize, Serialize};

use crate::utils::error::{KinematicsError, Result};

/// Default wheel radius (m).
pub const DEFAULT_WHEEL_RADIUS: f64 = 0.1;
/// Default centroid-to-wheel distance (m).
pub const DEFAULT_WHEEL_DISTANCE: f64 = 0.2;

/// Relative determinant below which the forward matrix counts as singular.
const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Row-major 3×3 matrix.
pub type Matrix3 = [[f64; 3]; 3];

/// Position and heading of the chassis centroid in the world frame.
///
/// `theta` is in radians and never wrapped; it accumulates continuously.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    /// World-frame x position (m).
    pub x: f64,
    /// World-frame y position (m).
    pub y: f64,
    /// Heading (rad).
    pub theta: f64,
}

impl Pose {
    pub const fn new(
        x: f64,
        y: f64,
        theta: f64,
    ) -> Self {
        Pose { x, y, theta }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.theta.is_finite()
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.3}, y: {:.3}, θ: {:.3} rad)", self.x, self.y, self.theta)
    }
}

/// Body-frame velocity, ordered `(θ̇, ẋ, ẏ)` to match the columns of `H`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyVelocity {
    /// Angular rate (rad/s).
    pub theta_dot: f64,
    /// Velocity along x (m/s).
    pub x_dot: f64,
    /// Velocity along y (m/s).
    pub y_dot: f64,
}

impl BodyVelocity {
    pub const fn new(
        theta_dot: f64,
        x_dot: f64,
        y_dot: f64,
    ) -> Self {
        BodyVelocity {
            theta_dot,
            x_dot,
            y_dot,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.theta_dot.is_finite() && self.x_dot.is_finite() && self.y_dot.is_finite()
    }

    fn to_array(self) -> [f64; 3] {
        [self.theta_dot, self.x_dot, self.y_dot]
    }

    fn from_array(a: [f64; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }
}

impl Add for BodyVelocity {
    type Output = Self;

    fn add(
        self,
        rhs: Self,
    ) -> Self {
        Self::new(
            self.theta_dot + rhs.theta_dot,
            self.x_dot + rhs.x_dot,
            self.y_dot + rhs.y_dot,
        )
    }
}

impl Mul<f64> for BodyVelocity {
    type Output = Self;

    fn mul(
        self,
        k: f64,
    ) -> Self {
        Self::new(self.theta_dot * k, self.x_dot * k, self.y_dot * k)
    }
}

impl fmt::Display for BodyVelocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(θ̇: {:.3} rad/s, ẋ: {:.3} m/s, ẏ: {:.3} m/s)",
            self.theta_dot, self.x_dot, self.y_dot
        )
    }
}

/// Speeds of the three wheels, in the row order of `H`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelSpeeds {
    pub v: f64,
    pub w: f64,
    pub z: f64,
}

impl WheelSpeeds {
    pub const fn new(
        v: f64,
        w: f64,
        z: f64,
    ) -> Self {
        WheelSpeeds { v, w, z }
    }

    pub fn is_finite(&self) -> bool {
        self.v.is_finite() && self.w.is_finite() && self.z.is_finite()
    }

    fn to_array(self) -> [f64; 3] {
        [self.v, self.w, self.z]
    }

    fn from_array(a: [f64; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }
}

impl Add for WheelSpeeds {
    type Output = Self;

    fn add(
        self,
        rhs: Self,
    ) -> Self {
        Self::new(self.v + rhs.v, self.w + rhs.w, self.z + rhs.z)
    }
}

impl Mul<f64> for WheelSpeeds {
    type Output = Self;

    fn mul(
        self,
        k: f64,
    ) -> Self {
        Self::new(self.v * k, self.w * k, self.z * k)
    }
}

impl fmt::Display for WheelSpeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(v: {:.3}, w: {:.3}, z: {:.3})", self.v, self.w, self.z)
    }
}

/// Chassis geometry: an equilateral triangle with a tangential wheel at each
/// vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    /// Radius of each omni-wheel (m).
    pub wheel_radius: f64,
    /// Distance from the centroid to each wheel's mounting point (m).
    pub wheel_distance: f64,
}

impl Geometry {
    pub const fn new(
        wheel_radius: f64,
        wheel_distance: f64,
    ) -> Self {
        Geometry {
            wheel_radius,
            wheel_distance,
        }
    }

    /// Check that both values are finite, the wheel radius is positive and the
    /// wheel distance is not negative.
    ///
    /// A zero `wheel_distance` passes here and is rejected later as singular.
    pub fn validate(&self) -> Result<()> {
        if !self.wheel_radius.is_finite() || self.wheel_radius <= 0.0 {
            return Err(KinematicsError::InvalidInput(
                "wheel_radius must be finite and positive",
            ));
        }
        if !self.wheel_distance.is_finite() || self.wheel_distance < 0.0 {
            return Err(KinematicsError::InvalidInput(
                "wheel_distance must be finite and non-negative",
            ));
        }
        Ok(())
    }

    /// Build the forward matrix `H` such that wheels = H · [θ̇, ẋ, ẏ].
    pub fn forward_matrix(&self) -> Matrix3 {
        let k = 1.0 / self.wheel_radius;
        let d = self.wheel_distance;
        let s = libm::sqrt(3.0) / 2.0;
        [
            [-d * k, k, 0.0],
            [d * k, -0.5 * k, -s * k],
            [d * k, -0.5 * k, s * k],
        ]
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(DEFAULT_WHEEL_RADIUS, DEFAULT_WHEEL_DISTANCE)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Geometry (r: {:.3} m, d: {:.3} m)",
            self.wheel_radius, self.wheel_distance
        )
    }
}

/// Kinematic model of the three-wheeled omni-wheel robot.
///
/// Geometry and both matrices are fixed at construction; only the pose (and
/// the body velocity of the last step) change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicModel {
    geometry: Geometry,
    forward: Matrix3,
    inverse: Matrix3,
    pose: Pose,
    body_velocity: BodyVelocity,
}

impl KinematicModel {
    /// Create a model at `pose` with the given geometry.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a non-finite pose or invalid geometry values,
    /// `SingularGeometry` when `H` cannot be inverted (e.g. zero wheel distance).
    pub fn new(
        pose: Pose,
        geometry: Geometry,
    ) -> Result<Self> {
        geometry.validate()?;
        if !pose.is_finite() {
            return Err(KinematicsError::InvalidInput("initial pose must be finite"));
        }

        let forward = geometry.forward_matrix();
        let inverse = invert_3x3(forward)?;
        tracing::debug!(
            wheel_radius = geometry.wheel_radius,
            wheel_distance = geometry.wheel_distance,
            "kinematic model initialized"
        );

        Ok(KinematicModel {
            geometry,
            forward,
            inverse,
            pose,
            body_velocity: BodyVelocity::default(),
        })
    }

    /// Create a model at the origin with the given geometry.
    pub fn with_geometry(geometry: Geometry) -> Result<Self> {
        Self::new(Pose::default(), geometry)
    }

    /// Wheel speeds required for the body velocity `body` (`H · body`).
    pub fn forward_kinematics(
        &self,
        body: BodyVelocity,
    ) -> Result<WheelSpeeds> {
        if !body.is_finite() {
            return Err(KinematicsError::InvalidInput("body velocity must be finite"));
        }
        Ok(WheelSpeeds::from_array(mat_vec(&self.forward, body.to_array())))
    }

    /// Body velocity produced by the wheel speeds `wheels` (`H⁻¹ · wheels`).
    pub fn body_velocity(
        &self,
        wheels: WheelSpeeds,
    ) -> Result<BodyVelocity> {
        if !wheels.is_finite() {
            return Err(KinematicsError::InvalidInput("wheel speeds must be finite"));
        }
        Ok(BodyVelocity::from_array(mat_vec(&self.inverse, wheels.to_array())))
    }

    /// Advance the pose by one forward-Euler step of length `dt`.
    ///
    /// The pose is left untouched when an error is returned.
    pub fn integrate_step(
        &mut self,
        wheels: WheelSpeeds,
        dt: f64,
    ) -> Result<Pose> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(KinematicsError::InvalidTimestep(dt));
        }
        let body = self.body_velocity(wheels)?;

        let next = Pose {
            x: self.pose.x + body.x_dot * dt,
            y: self.pose.y + body.y_dot * dt,
            theta: self.pose.theta + body.theta_dot * dt,
        };
        if !next.is_finite() {
            return Err(KinematicsError::InvalidInput("integrated pose is not finite"));
        }

        self.pose = next;
        self.body_velocity = body;
        Ok(next)
    }

    pub fn get_pose(&self) -> Pose {
        self.pose
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn forward_matrix(&self) -> &Matrix3 {
        &self.forward
    }

    pub fn inverse_matrix(&self) -> &Matrix3 {
        &self.inverse
    }

    /// Body velocity applied by the last successful step, zero before any step.
    pub fn last_body_velocity(&self) -> BodyVelocity {
        self.body_velocity
    }
}

impl fmt::Display for KinematicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KinematicModel {} at {}", self.geometry, self.pose)
    }
}

fn mat_vec(
    m: &Matrix3,
    v: [f64; 3],
) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (o, row) in out.iter_mut().zip(m) {
        *o = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
    }
    out
}

fn row_norm(row: &[f64; 3]) -> f64 {
    libm::sqrt(row[0] * row[0] + row[1] * row[1] + row[2] * row[2])
}

/// Invert a 3×3 matrix using cofactor expansion.
///
/// The determinant is compared against the product of the row norms (its
/// Hadamard bound), so the check does not depend on the matrix scale.
fn invert_3x3(m: Matrix3) -> Result<Matrix3> {
    let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
    let bound = row_norm(&m[0]) * row_norm(&m[1]) * row_norm(&m[2]);
    if !det.is_finite() || libm::fabs(det) <= SINGULARITY_TOLERANCE * bound {
        return Err(KinematicsError::SingularGeometry { determinant: det });
    }

    let inv_det = 1.0 / det;
    let inv = [
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            -(m[0][1] * m[2][2] - m[0][2] * m[2][1]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            -(m[1][0] * m[2][2] - m[1][2] * m[2][0]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            -(m[0][0] * m[1][2] - m[0][2] * m[1][0]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            -(m[0][0] * m[2][1] - m[0][1] * m[2][0]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ];
    if inv.iter().flatten().any(|v| !v.is_finite()) {
        return Err(KinematicsError::SingularGeometry { determinant: det });
    }
    Ok(inv)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn default_model() -> KinematicModel {
        KinematicModel::new(Pose::default(), Geometry::default()).unwrap()
    }

    fn mat_mul(
        a: &Matrix3,
        b: &Matrix3,
    ) -> Matrix3 {
        let mut out = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                out[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
            }
        }
        out
    }

    #[test]
    fn test_invert_3x3_identity() {
        let id = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let inv = invert_3x3(id).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (inv[i][j] - id[i][j]).abs() < EPSILON,
                    "inv != id at {}:{}",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn test_invert_3x3_rejects_zero_matrix() {
        let result = invert_3x3([[0.0; 3]; 3]);
        assert!(matches!(result, Err(KinematicsError::SingularGeometry { .. })));
    }

    #[test]
    fn test_forward_matrix_default_geometry() {
        let h = Geometry::default().forward_matrix();
        let s = 3.0_f64.sqrt() / 2.0;
        let expected = [
            [-2.0, 10.0, 0.0],
            [2.0, -5.0, -10.0 * s],
            [2.0, -5.0, 10.0 * s],
        ];
        for i in 0..3 {
            for j in 0..3 {
                assert!((h[i][j] - expected[i][j]).abs() < EPSILON);
            }
        }
    }

    #[test]
    fn test_inverse_times_forward_is_identity() {
        let model = KinematicModel::with_geometry(Geometry::new(0.148, 0.195)).unwrap();
        let product = mat_mul(model.inverse_matrix(), model.forward_matrix());
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((product[i][j] - expected).abs() < EPSILON);
            }
        }
    }

    #[test]
    fn test_zero_wheel_distance_is_singular() {
        for r in [0.05, 0.1, 3.0] {
            let result = KinematicModel::with_geometry(Geometry::new(r, 0.0));
            assert!(matches!(result, Err(KinematicsError::SingularGeometry { .. })));
        }
    }

    #[test]
    fn test_invalid_geometry_values() {
        for g in [
            Geometry::new(0.0, 0.2),
            Geometry::new(-0.1, 0.2),
            Geometry::new(f64::NAN, 0.2),
            Geometry::new(0.1, f64::INFINITY),
        ] {
            let result = KinematicModel::with_geometry(g);
            assert!(matches!(result, Err(KinematicsError::InvalidInput(_))), "{:?}", g);
        }
    }

    #[test]
    fn test_negative_wheel_distance_is_rejected() {
        let result = KinematicModel::with_geometry(Geometry::new(0.1, -0.2));
        assert!(matches!(result, Err(KinematicsError::InvalidInput(_))));
        assert!(Geometry::new(0.1, -0.2).validate().is_err());
        assert!(Geometry::new(0.1, 0.0).validate().is_ok());
    }

    #[test]
    fn test_overflowing_step_leaves_pose() {
        let mut model = default_model();
        let wheels = WheelSpeeds::new(1e307, -1e307, -1e307);
        let mut last = model.get_pose();
        let err = loop {
            match model.integrate_step(wheels, 1.0) {
                Ok(pose) => last = pose,
                Err(e) => break e,
            }
        };
        assert!(matches!(err, KinematicsError::InvalidInput(_)));
        assert_eq!(model.get_pose(), last);
        assert!(last.is_finite());
    }

    #[test]
    fn test_non_finite_initial_pose() {
        let result = KinematicModel::new(Pose::new(f64::NAN, 0.0, 0.0), Geometry::default());
        assert!(matches!(result, Err(KinematicsError::InvalidInput(_))));
    }

    #[test]
    fn test_forward_kinematics_values() {
        let model = default_model();
        // θ̇ = 0, ẋ = 1, ẏ = 0 => (1/r) * [1, -0.5, -0.5]
        let wheels = model.forward_kinematics(BodyVelocity::new(0.0, 1.0, 0.0)).unwrap();
        assert!((wheels.v - 10.0).abs() < EPSILON);
        assert!((wheels.w + 5.0).abs() < EPSILON);
        assert!((wheels.z + 5.0).abs() < EPSILON);

        // pure rotation => (d/r) * [-1, 1, 1]
        let wheels = model.forward_kinematics(BodyVelocity::new(1.0, 0.0, 0.0)).unwrap();
        assert!((wheels.v + 2.0).abs() < EPSILON);
        assert!((wheels.w - 2.0).abs() < EPSILON);
        assert!((wheels.z - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_round_trip_body_velocity() {
        let model = default_model();
        let body = BodyVelocity::new(0.7, -1.3, 2.25);
        let wheels = model.forward_kinematics(body).unwrap();
        let back = model.body_velocity(wheels).unwrap();
        assert!((back.theta_dot - body.theta_dot).abs() < EPSILON);
        assert!((back.x_dot - body.x_dot).abs() < EPSILON);
        assert!((back.y_dot - body.y_dot).abs() < EPSILON);
    }

    #[test]
    fn test_forward_kinematics_is_linear() {
        let model = default_model();
        let (a, b) = (2.5, -0.75);
        let u = BodyVelocity::new(0.3, 1.0, -0.4);
        let v = BodyVelocity::new(-1.2, 0.5, 2.0);

        let lhs = model.forward_kinematics(u * a + v * b).unwrap();
        let rhs = model.forward_kinematics(u).unwrap() * a + model.forward_kinematics(v).unwrap() * b;
        assert!((lhs.v - rhs.v).abs() < EPSILON);
        assert!((lhs.w - rhs.w).abs() < EPSILON);
        assert!((lhs.z - rhs.z).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_step_records_body_velocity() {
        let mut model = default_model();
        assert_eq!(model.last_body_velocity(), BodyVelocity::default());

        let wheels = model.forward_kinematics(BodyVelocity::new(0.5, 0.0, 1.0)).unwrap();
        let pose = model.integrate_step(wheels, 0.2).unwrap();
        assert!((pose.x - 0.0).abs() < EPSILON);
        assert!((pose.y - 0.2).abs() < EPSILON);
        assert!((pose.theta - 0.1).abs() < EPSILON);
        assert_eq!(model.get_pose(), pose);
        assert!((model.last_body_velocity().y_dot - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_zero_wheel_speeds_keep_pose() {
        let start = Pose::new(1.5, -2.0, 0.3);
        let mut model = KinematicModel::new(start, Geometry::default()).unwrap();
        for dt in [1e-6, 0.1, 10.0] {
            let pose = model.integrate_step(WheelSpeeds::default(), dt).unwrap();
            assert_eq!(pose, start);
        }
    }

    #[test]
    fn test_invalid_timestep_leaves_pose() {
        let mut model = default_model();
        let wheels = WheelSpeeds::new(1.0, -1.0, 1.0);
        for dt in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let result = model.integrate_step(wheels, dt);
            assert!(matches!(result, Err(KinematicsError::InvalidTimestep(_))));
        }
        assert_eq!(model.get_pose(), Pose::default());
    }

    #[test]
    fn test_non_finite_wheel_speeds_leave_pose() {
        let mut model = default_model();
        let result = model.integrate_step(WheelSpeeds::new(f64::NAN, 0.0, 0.0), 0.1);
        assert!(matches!(result, Err(KinematicsError::InvalidInput(_))));
        assert_eq!(model.get_pose(), Pose::default());

        let result = model.forward_kinematics(BodyVelocity::new(0.0, f64::INFINITY, 0.0));
        assert!(matches!(result, Err(KinematicsError::InvalidInput(_))));
    }

    #[test]
    fn test_heading_is_not_wrapped() {
        let mut model = default_model();
        let wheels = model.forward_kinematics(BodyVelocity::new(1.0, 0.0, 0.0)).unwrap();
        for _ in 0..10 {
            model.integrate_step(wheels, 1.0).unwrap();
        }
        assert!((model.get_pose().theta - 10.0).abs() < 1e-6);
    }
}
