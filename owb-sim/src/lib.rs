//! Kinematic model and trajectory recorder for the three-wheeled Omni-Wheel Bot.
//!
//! The crate is `no_std` and only needs `alloc` for the pose history. For a
//! runnable driver that exports trajectories, see `owb-app/trajectory-sim`.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod utils;
