//! # VOXBOX Shared
//!
//! Math types and default constants used by the simulator, the mesher and
//! the game shell.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on `wgpu` or any window-related crate.
//! If you need graphics types, put them in `voxbox_rendering`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{
    COMMAND_QUEUE_CAPACITY, CULL_ANGLE_DEGREES, DEFAULT_ROOM_SIZE, DEFAULT_VIEW_SIZE,
    MARK_INTERVAL, STEP_INTERVAL,
};
pub use math::{Mat4, Vec3};
