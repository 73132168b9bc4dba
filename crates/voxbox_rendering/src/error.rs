//! # Rendering Error Types

use thiserror::Error;

use voxbox_core::{Point, RoomError};

/// Errors raised by the view and the GPU renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Snapshot extent outside `1..=255` on some axis.
    #[error("view size {0:?} must be within 1..=255 on every axis")]
    InvalidViewSize(Point),

    /// More palettes than the palette image has rows.
    #[error("{0} palettes exceed the limit of 256")]
    TooManyPalettes(usize),

    /// GPU resource creation failed validation.
    #[error("gpu setup failed: {0}")]
    Gpu(String),

    /// The room could not produce a snapshot.
    #[error(transparent)]
    Room(#[from] RoomError),
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
