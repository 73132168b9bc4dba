use crate::error::GameResult;
use crate::game::{GameControl, GameState};

/// Entry state. Forwards straight to `play`.
#[derive(Debug, Default)]
pub struct MenuState;

impl MenuState {
    /// Registry name.
    pub const NAME: &'static str = "menu";

    /// Creates the state.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl GameState for MenuState {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn enter(&mut self, _from: Option<&str>, ctl: &mut dyn GameControl) -> GameResult<()> {
        ctl.switch_state(super::PlayState::NAME)
    }

    fn exit(&mut self, _to: Option<&str>) -> GameResult<()> {
        Ok(())
    }

    fn update(&mut self, ctl: &mut dyn GameControl) -> GameResult<()> {
        ctl.poll_all();
        Ok(())
    }

    fn render(&mut self) -> GameResult<()> {
        Ok(())
    }
}
