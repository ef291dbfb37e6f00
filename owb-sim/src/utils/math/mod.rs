//! Math utilities for the Omni-Wheel Bot simulator.
//!
//! This module provides the kinematic model of the three-wheeled chassis.

pub mod kinematics;
