//! # VOXBOX Core
//!
//! Voxel storage and the room automaton.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐ set_bounds / set_palette / set_voxel ┌──────────────────┐
//! │ ModelLoader  │─────────────────────────────────────>│ VoxelSink        │
//! │ (.vox)       │                                      │  PalettedVolume  │
//! └──────────────┘                                      │  room LoadTarget │
//!                                                       └──────────────────┘
//! ┌───────────────────────────┐  blit_to_view   ┌──────────────────────┐
//! │ RoomSimulator (worker)    │────────────────>│ any Volume (snapshot)│
//! │  mark / step / commands   │                 └──────────────────────┘
//! └───────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `volume`: points, regions, the `Volume`/`VoxelSink` traits and `blit`
//! - `palette`: 256-entry color tables
//! - `model`: `.vox` decoding (and a small encoder)
//! - `room`: cell flags, the automaton and the threaded simulator

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod model;
pub mod palette;
pub mod room;
pub mod volume;

pub use error::{RoomError, RoomResult, VoxError, VoxResult};
pub use model::{ModelInfo, ModelLoader, ModelWriter};
pub use palette::{Palette, Rgba};
pub use room::{CellFlags, Completion, LoadContext, RoomConfig, RoomGrid, RoomSimulator, COLOR_MASK};
pub use volume::{blit, blit_with, copy_solid, AxisOrder, PalettedVolume, Point, Region, Volume, VoxelSink};
