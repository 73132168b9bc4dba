//! # Room Simulator
//!
//! A dense voxel room that settles like sand on its own thread.
//!
//! ```text
//!   update / render thread                 room worker thread
//!  ┌──────────────────────┐   bounded    ┌────────────────────────────┐
//!  │ send(f)      ────────┼──── FIFO ───>│ select! {                  │
//!  │ blit_to_view ────────┼──────────────│   mark tick → mark_phase   │
//!  │ load_model   ────────┼──────────────│   step tick → step_phase   │
//!  │                      │              │   command   → f(&mut grid) │
//!  │ Completion::wait <───┼── bounded(1)─│ }                          │
//!  └──────────────────────┘              └────────────────────────────┘
//! ```
//!
//! The worker is the only writer of the grid. Commands, mark passes and
//! step passes never overlap.

mod grid;
mod simulator;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub use grid::{LoadContext, LoadTarget, RoomGrid, SLIDE_SEED};
pub use simulator::{Completion, RoomConfig, RoomSimulator};

/// Bits of a room cell holding the color index.
pub const COLOR_MASK: u8 = 0x3F;

bitflags! {
    /// State bits stored above the color index of a room cell.
    ///
    /// `ATTACHED` and `FALLING` are never both set on a cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CellFlags: u8 {
        /// Supported by the floor or by an attached neighbour.
        const ATTACHED = 0x40;
        /// Moved by gravity during the last step pass.
        const FALLING = 0x80;
    }
}

impl CellFlags {
    /// Extracts the flags of a raw cell byte.
    #[inline]
    #[must_use]
    pub const fn of(cell: u8) -> Self {
        Self::from_bits_truncate(cell)
    }

    /// False for the forbidden `ATTACHED | FALLING` combination.
    #[inline]
    #[must_use]
    pub fn is_legal(self) -> bool {
        !self.contains(Self::ATTACHED | Self::FALLING)
    }
}
