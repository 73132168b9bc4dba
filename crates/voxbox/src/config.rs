//! # Configuration
//!
//! `voxbox.toml` layout:
//!
//! ```toml
//! [renderer]
//! window_divisor = 2
//! vsync = false
//! debug = false
//!
//! [room]
//! size = [128, 64, 128]
//! step_interval_ms = 50
//! mark_interval_ms = 500
//! queue_capacity = 128
//!
//! [view]
//! size = [128, 64, 128]
//! back_face_culling = false
//! cull_angle_degrees = 60.0
//! parallel_rebuild = false
//!
//! [play]
//! demo_scene = true
//! player_model = "data/player.vox"
//! frames = 600
//!
//! [[play.models]]
//! path = "data/castle.vox"
//! at = [10, 0, 10]
//! flags = "attached"
//! ```
//!
//! Every key is optional.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use voxbox_core::{CellFlags, RoomConfig};
use voxbox_rendering::ViewConfig;

use crate::error::{GameError, GameResult};

/// Full configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxboxConfig {
    /// Window and presentation settings.
    pub renderer: RendererConfig,
    /// Room simulator settings.
    pub room: RoomConfig,
    /// Mesher settings.
    pub view: ViewConfig,
    /// Play state content.
    pub play: PlayConfig,
}

/// Window and presentation settings, passed through to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Window size is the display size divided by this.
    pub window_divisor: u32,
    /// Wait for vertical sync on present.
    pub vsync: bool,
    /// Enable backend validation.
    pub debug: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_divisor: 2,
            vsync: false,
            debug: false,
        }
    }
}

/// What the play state puts in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayConfig {
    /// Models loaded into the room on enter, in order.
    pub models: Vec<ModelPlacement>,
    /// Model overlaid as the player.
    pub player_model: Option<PathBuf>,
    /// Drop a block of loose voxels into the room.
    pub demo_scene: bool,
    /// Stop after this many frames.
    pub frames: Option<u64>,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            player_model: None,
            demo_scene: true,
            frames: None,
        }
    }
}

/// One model to load into the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPlacement {
    /// `.vox` file.
    pub path: PathBuf,
    /// Room position of the model origin.
    #[serde(default)]
    pub at: [i32; 3],
    /// Initial cell state of every voxel.
    #[serde(default)]
    pub flags: LoadFlags,
}

/// Cell state written by a model load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadFlags {
    /// Loose; settles on the next mark pass.
    #[default]
    None,
    /// Supported.
    Attached,
    /// In free fall.
    Falling,
}

impl LoadFlags {
    /// Matching cell flags.
    #[must_use]
    pub const fn cell_flags(self) -> CellFlags {
        match self {
            Self::None => CellFlags::empty(),
            Self::Attached => CellFlags::ATTACHED,
            Self::Falling => CellFlags::FALLING,
        }
    }
}

impl VoxboxConfig {
    /// Reads `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Config`] if the file cannot be read or is not
    /// valid TOML for this layout.
    pub fn load(path: impl AsRef<Path>) -> GameResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => {
                let config = Self::parse(&text).map_err(|reason| GameError::Config {
                    path: path.display().to_string(),
                    reason,
                })?;
                tracing::info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(GameError::Config {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns the parser message on failure.
    pub fn parse(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = VoxboxConfig::parse("").unwrap();
        assert_eq!(config, VoxboxConfig::default());
        assert_eq!(config.renderer.window_divisor, 2);
        assert_eq!(config.room.step_interval_ms, 50);
        assert_eq!(config.room.mark_interval_ms, 500);
        assert_eq!(config.room.queue_capacity, 128);
        assert!((config.view.cull_angle_degrees - 60.0).abs() < f32::EPSILON);
        assert!(config.play.demo_scene);
    }

    #[test]
    fn test_partial_sections() {
        let config = VoxboxConfig::parse(
            r#"
            [room]
            size = [16, 8, 16]

            [view]
            back_face_culling = true

            [[play.models]]
            path = "a.vox"
            at = [1, 2, 3]
            flags = "attached"

            [[play.models]]
            path = "b.vox"
            "#,
        )
        .unwrap();
        assert_eq!(config.room.size, [16, 8, 16]);
        assert_eq!(config.room.step_interval_ms, 50);
        assert!(config.view.back_face_culling);
        assert_eq!(config.play.models.len(), 2);
        assert_eq!(config.play.models[0].flags.cell_flags(), CellFlags::ATTACHED);
        assert_eq!(config.play.models[1].at, [0, 0, 0]);
        assert_eq!(config.play.models[1].flags, LoadFlags::None);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let err = VoxboxConfig::parse("[[play.models]]\npath = \"a.vox\"\nflags = \"sticky\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = VoxboxConfig::load("definitely/not/here/voxbox.toml").unwrap();
        assert_eq!(config, VoxboxConfig::default());
    }
}
