//! # Game Error Types

use thiserror::Error;

use voxbox_core::{RoomError, VoxError};
use voxbox_rendering::RenderError;

/// Errors surfaced by the game shell and its states.
#[derive(Error, Debug)]
pub enum GameError {
    /// `switch_state` named a state that was never registered.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// `update` or `render` ran before any state was entered.
    #[error("no active state")]
    NoActiveState,

    /// The configuration file could not be read or parsed.
    #[error("configuration error in {path}: {reason}")]
    Config {
        /// File that was read.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// Room simulator failure.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// View or renderer failure.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Model decode failure outside the room (player model).
    #[error("model decode failed: {0}")]
    Decode(#[from] VoxError),
}

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;
