//! # VOXBOX Rendering
//!
//! Turns room snapshots into per-face vertex streams and draws them.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐ refresh_from ┌──────────────────────┐ prepare/draw ┌──────────────┐
//! │ RoomSimulator  │─────────────>│ View                 │─────────────>│ ViewRenderer │
//! │ (voxbox_core)  │              │  snapshot            │              │  (wgpu)      │
//! └────────────────┘              │  6 × FaceBuffer      │              └──────────────┘
//!                                 │  PaletteImage        │
//!                                 └──────────────────────┘
//! ```
//!
//! The CPU side (`View`) has no GPU dependency and is fully testable
//! headless; `ViewRenderer` only uploads and draws what it produced.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]

pub mod config;
pub mod error;
pub mod gpu;
pub mod palette;
pub mod view;

pub use config::ViewConfig;
pub use error::{RenderError, RenderResult};
pub use gpu::{ViewRenderer, DEPTH_FORMAT};
pub use palette::PaletteImage;
pub use view::{BuildStats, Face, FaceBuffer, FaceVertex, View, MAX_VIEW_EXTENT};
