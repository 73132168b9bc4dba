//! # VOXBOX
//!
//! Runs the sandbox headless for a fixed number of frames.
//!
//! ```bash
//! RUST_LOG=info voxbox [path/to/voxbox.toml]
//! ```
//!
//! Without an argument `voxbox.toml` in the working directory is used; a
//! missing file means defaults.

use std::process::ExitCode;

use voxbox::{Game, GameResult, HeadlessPlatform, HeadlessPresenter, MenuState, PlayState, VoxboxConfig};

/// Frame limit when the configuration sets none.
const DEFAULT_HEADLESS_FRAMES: u64 = 600;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "voxbox.toml".to_string());
    match run(&path) {
        Ok(frames) => {
            tracing::info!("Ran {} frames", frames);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("voxbox failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str) -> GameResult<u64> {
    let config = VoxboxConfig::load(path)?;

    let mut game = Game::new(HeadlessPlatform::new());
    game.add_state(Box::new(MenuState::new()));
    game.add_state(Box::new(PlayState::new(config.clone())));
    game.switch_state(MenuState::NAME)?;

    let mut presenter = HeadlessPresenter::new(config.renderer.clone());
    let max = config.play.frames.unwrap_or(DEFAULT_HEADLESS_FRAMES);
    let frames = game.run(&mut presenter, Some(max));
    game.shutdown()?;
    frames
}
