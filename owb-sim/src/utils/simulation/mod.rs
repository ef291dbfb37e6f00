//! Simulation drivers built on top of the kinematic model.
//!
//! - `recorder`: fixed-step driver that accumulates a pose history
//! - `config`: deserializable simulation parameters with defaults

pub mod config;
pub mod recorder;
