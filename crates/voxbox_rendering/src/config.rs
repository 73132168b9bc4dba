//! View settings, read from the `[view]` table of the config file.

use serde::{Deserialize, Serialize};

use voxbox_shared::constants::{CULL_ANGLE_DEGREES, DEFAULT_VIEW_SIZE};

/// Mesher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Snapshot extent `[x, y, z]`, each within `1..=255`.
    pub size: [i32; 3],
    /// Skip face groups that point away from the camera.
    pub back_face_culling: bool,
    /// A group is culled when its normal is more than this many degrees
    /// away from the direction towards the camera.
    pub cull_angle_degrees: f32,
    /// Rebuild surviving face groups on one thread each.
    pub parallel_rebuild: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_VIEW_SIZE,
            back_face_culling: false,
            cull_angle_degrees: CULL_ANGLE_DEGREES,
            parallel_rebuild: false,
        }
    }
}
