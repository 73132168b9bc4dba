//! # Core Error Types
//!
//! Decode failures and room command failures.

use std::io;

use thiserror::Error;

use crate::room::CellFlags;

/// Errors produced while decoding a `.vox` model.
#[derive(Error, Debug)]
pub enum VoxError {
    /// Underlying reader failed.
    #[error("i/o error: {0}")]
    Io(#[source] io::Error),

    /// The stream does not start with `VOX `.
    #[error("invalid magic {0:?}, expected \"VOX \"")]
    InvalidMagic([u8; 4]),

    /// File version outside the supported range.
    #[error("unsupported vox version {0}")]
    UnsupportedVersion(u32),

    /// A required chunk never appeared.
    #[error("missing required chunk {0}")]
    MissingChunk(&'static str),

    /// A chunk's contents are inconsistent.
    #[error("invalid chunk {id}: {reason}")]
    InvalidChunk {
        /// Four-character chunk id.
        id: String,
        /// What was wrong.
        reason: String,
    },

    /// The stream ended inside a chunk.
    #[error("unexpected end of data")]
    Truncated,
}

impl From<io::Error> for VoxError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(e)
        }
    }
}

/// Result type for model decoding.
pub type VoxResult<T> = Result<T, VoxError>;

/// Errors surfaced by the room simulator.
#[derive(Error, Debug)]
pub enum RoomError {
    /// A load asked for `ATTACHED` and `FALLING` at once.
    #[error("illegal load flags {0:?}: attached and falling are exclusive")]
    IllegalFlags(CellFlags),

    /// The model could not be decoded.
    #[error("model decode failed: {0}")]
    Decode(#[from] VoxError),

    /// The model file could not be opened.
    #[error("cannot open model {path}: {source}")]
    Open {
        /// Path that was requested.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The worker stopped before the command ran.
    #[error("room simulator stopped")]
    Stopped,

    /// `start` was called twice.
    #[error("room simulator already started")]
    AlreadyStarted,

    /// The worker thread could not be spawned.
    #[error("cannot spawn room worker: {0}")]
    Spawn(#[source] io::Error),

    /// Rejected room configuration.
    #[error("invalid room configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for room operations.
pub type RoomResult<T> = Result<T, RoomError>;
