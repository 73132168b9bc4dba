//! # VOXBOX
//!
//! The game crate: a state machine shell around the room simulator and its
//! view.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ Game<Platform>                                                │
//! │   ├─ "menu" ── enter ──> switch_state("play")                 │
//! │   └─ "play"                                                   │
//! │        ├─ RoomSimulator (worker thread)    voxbox_core        │
//! │        ├─ View + face buffers              voxbox_rendering   │
//! │        └─ Player overlay                                      │
//! │ Presenter: clear → update → title → render → present          │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: `voxbox.toml`
//! - `game`: `Game`, `GameState`, `GameControl`
//! - `platform`: events, presenters, clocks, headless backend
//! - `player`: player overlay
//! - `states`: `menu` and `play`

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod game;
pub mod platform;
pub mod player;
pub mod states;

pub use voxbox_core as core;
pub use voxbox_rendering as rendering;

pub use config::{LoadFlags, ModelPlacement, PlayConfig, RendererConfig, VoxboxConfig};
pub use error::{GameError, GameResult};
pub use game::{Game, GameControl, GameState};
pub use platform::{
    ButtonAction, Clock, Event, HeadlessPlatform, HeadlessPresenter, Key, ManualClock, Platform, Presenter,
    SystemClock,
};
pub use player::Player;
pub use states::{MenuState, PlayState, PlayStats, PlayStatsHandle};
