//! # Defaults
//!
//! Values used when no configuration overrides them.

use std::time::Duration;

// =============================================================================
// ROOM
// =============================================================================

/// Default room extent `[x, y, z]`; `y` is the vertical axis.
pub const DEFAULT_ROOM_SIZE: [i32; 3] = [128, 64, 128];

/// Interval between two attachment (mark) passes.
pub const MARK_INTERVAL: Duration = Duration::from_millis(500);

/// Interval between two gravity (step) passes.
pub const STEP_INTERVAL: Duration = Duration::from_millis(50);

/// Capacity of the room command queue. Senders block once it is full.
pub const COMMAND_QUEUE_CAPACITY: usize = 128;

// =============================================================================
// VIEW
// =============================================================================

/// Default snapshot extent `[x, y, z]`. Each axis must fit a vertex byte.
pub const DEFAULT_VIEW_SIZE: [i32; 3] = [128, 64, 128];

/// Face groups whose normal is further than this from the viewer are culled.
pub const CULL_ANGLE_DEGREES: f32 = 60.0;
