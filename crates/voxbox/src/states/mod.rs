//! Game states.

mod menu;
mod play;

pub use menu::MenuState;
pub use play::{PlayState, PlayStats, PlayStatsHandle};
