//! # Game Shell
//!
//! Named states driven once per frame.
//!
//! ```text
//! Frame:
//! ┌──────────────────────────────────────────────────┐
//! │ presenter.clear()                                │
//! │ game.update()   ── timing, state.update(ctl)     │
//! │                 ── apply requested state switch  │
//! │ title "Voxbox - {fps} fps"                       │
//! │ game.render()   ── state.render()                │
//! │ presenter.present()                              │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! States reach the shell through [`GameControl`]. A switch requested from
//! inside a state call is validated immediately and applied as soon as that
//! call returns, so `enter` may forward to another state.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{GameError, GameResult};
use crate::platform::{Clock, Event, Key, Platform, Presenter, SystemClock};

/// Window over which the frame rate is counted.
const FPS_WINDOW: Duration = Duration::from_secs(1);

/// One named state of the game.
pub trait GameState {
    /// Registry name.
    fn name(&self) -> &str;

    /// Called when the state becomes current. `from` is the previous state.
    fn enter(&mut self, from: Option<&str>, ctl: &mut dyn GameControl) -> GameResult<()>;

    /// Called when the state stops being current. `to` is `None` at shutdown.
    fn exit(&mut self, to: Option<&str>) -> GameResult<()>;

    /// Advances one frame.
    fn update(&mut self, ctl: &mut dyn GameControl) -> GameResult<()>;

    /// Draws the current frame.
    fn render(&mut self) -> GameResult<()>;
}

/// What a state may ask of the shell.
pub trait GameControl {
    /// Requests a switch to the state registered as `to`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if no such state exists.
    fn switch_state(&mut self, to: &str) -> GameResult<()>;

    /// Name of the current state, empty before the first switch.
    fn current_state_name(&self) -> &str;

    /// `(dt, tick, fps)`: time since the previous frame, time since the
    /// clock epoch, and frames counted over the last full second.
    fn timing(&self) -> (Duration, Duration, u32);

    /// Drains all pending input.
    fn poll_all(&mut self);

    /// Next event for the state. `Quit` and `Esc` stop the game and are
    /// not returned.
    fn poll_event(&mut self) -> Option<Event>;

    /// Stops the game after the current frame.
    fn terminate(&mut self);
}

/// Shell state reachable from inside state calls.
struct Control<P> {
    platform: P,
    clock: Box<dyn Clock>,
    names: Vec<String>,
    current: String,
    pending: Option<String>,
    running: bool,
    last_frame: Duration,
    fps_mark: Duration,
    frames_in_window: u32,
    dt: Duration,
    tick: Duration,
    fps: u32,
}

impl<P: Platform> GameControl for Control<P> {
    fn switch_state(&mut self, to: &str) -> GameResult<()> {
        if !self.names.iter().any(|n| n == to) {
            return Err(GameError::InvalidState(to.to_string()));
        }
        self.pending = Some(to.to_string());
        Ok(())
    }

    fn current_state_name(&self) -> &str {
        &self.current
    }

    fn timing(&self) -> (Duration, Duration, u32) {
        (self.dt, self.tick, self.fps)
    }

    fn poll_all(&mut self) {
        while self.poll_event().is_some() {}
    }

    fn poll_event(&mut self) -> Option<Event> {
        loop {
            match self.platform.poll_event()? {
                Event::Quit | Event::KeyDown { key: Key::Esc, .. } => {
                    if self.running {
                        tracing::info!("Quit requested");
                    }
                    self.running = false;
                }
                event => return Some(event),
            }
        }
    }

    fn terminate(&mut self) {
        self.running = false;
    }
}

/// The state machine and its frame timing.
pub struct Game<P> {
    states: HashMap<String, Box<dyn GameState>>,
    current: Option<String>,
    control: Control<P>,
}

impl<P: Platform> Game<P> {
    /// Creates a running game with no states, timed by the wall clock.
    pub fn new(platform: P) -> Self {
        Self::with_clock(platform, Box::new(SystemClock::new()))
    }

    /// Creates a running game timed by `clock`.
    pub fn with_clock(platform: P, clock: Box<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            states: HashMap::new(),
            current: None,
            control: Control {
                platform,
                clock,
                names: Vec::new(),
                current: String::new(),
                pending: None,
                running: true,
                last_frame: now,
                fps_mark: now,
                frames_in_window: 0,
                dt: Duration::ZERO,
                tick: now,
                fps: 0,
            },
        }
    }

    /// Registers `state` under its name, replacing any earlier one.
    pub fn add_state(&mut self, state: Box<dyn GameState>) {
        let name = state.name().to_string();
        if !self.control.names.contains(&name) {
            self.control.names.push(name.clone());
        }
        self.states.insert(name, state);
    }

    /// Switches to `to`, running `exit` on the current state and `enter` on
    /// the new one, then any switch `enter` requested.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] for an unknown name, or the
    /// first error from `exit`/`enter`.
    pub fn switch_state(&mut self, to: &str) -> GameResult<()> {
        self.control.switch_state(to)?;
        self.apply_pending()
    }

    fn apply_pending(&mut self) -> GameResult<()> {
        while let Some(to) = self.control.pending.take() {
            let mut next = self
                .states
                .remove(&to)
                .ok_or_else(|| GameError::InvalidState(to.clone()))?;

            let from = self.current.take();
            if let Some(name) = from.as_deref() {
                tracing::info!("Exiting state: {}", name);
                let exited = if name == to {
                    next.exit(Some(&to))
                } else {
                    self.states.get_mut(name).map_or(Ok(()), |s| s.exit(Some(&to)))
                };
                if let Err(e) = exited {
                    self.current = from;
                    self.states.insert(to, next);
                    return Err(e);
                }
            }

            tracing::info!("Enter state: {}", to);
            self.control.current.clone_from(&to);
            let entered = next.enter(from.as_deref(), &mut self.control);
            self.states.insert(to.clone(), next);
            self.current = Some(to);
            entered?;
        }
        Ok(())
    }

    /// Advances timing and updates the current state.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoActiveState`] before the first switch, or
    /// whatever the state returns.
    pub fn update(&mut self) -> GameResult<()> {
        let name = self.current.clone().ok_or(GameError::NoActiveState)?;

        let c = &mut self.control;
        let now = c.clock.now();
        c.dt = now.saturating_sub(c.last_frame);
        c.tick = now;
        c.last_frame = now;

        let state = self.states.get_mut(&name).ok_or(GameError::NoActiveState)?;
        state.update(&mut self.control)?;

        let c = &mut self.control;
        c.frames_in_window += 1;
        let now = c.clock.now();
        if now.saturating_sub(c.fps_mark) >= FPS_WINDOW {
            c.fps = c.frames_in_window;
            c.fps_mark = now;
            c.frames_in_window = 0;
        }

        self.apply_pending()
    }

    /// Renders the current state.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoActiveState`] before the first switch, or
    /// whatever the state returns.
    pub fn render(&mut self) -> GameResult<()> {
        let name = self.current.as_deref().ok_or(GameError::NoActiveState)?;
        self.states.get_mut(name).ok_or(GameError::NoActiveState)?.render()
    }

    /// Runs frames until the game stops or `max_frames` were run. Returns
    /// the number of frames run.
    ///
    /// # Errors
    ///
    /// Stops at the first error from `update` or `render`.
    pub fn run<R: Presenter>(&mut self, presenter: &mut R, max_frames: Option<u64>) -> GameResult<u64> {
        let mut frames = 0;
        while self.is_running() && max_frames.map_or(true, |max| frames < max) {
            presenter.clear();
            self.update()?;
            let (_, _, fps) = self.timing();
            presenter.set_window_title(&format!("Voxbox - {fps} fps"));
            self.render()?;
            presenter.present();
            frames += 1;
        }
        tracing::info!("Game loop finished after {} frames", frames);
        Ok(frames)
    }

    /// Exits the current state with no successor.
    ///
    /// # Errors
    ///
    /// Returns the state's `exit` error.
    pub fn shutdown(&mut self) -> GameResult<()> {
        if let Some(name) = self.current.take() {
            tracing::info!("Exiting state: {}", name);
            if let Some(state) = self.states.get_mut(&name) {
                state.exit(None)?;
            }
        }
        self.control.current.clear();
        self.control.running = false;
        Ok(())
    }

    /// False once `Quit`, `Esc` or `terminate` was seen.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.control.running
    }

    /// See [`GameControl::timing`].
    #[must_use]
    pub fn timing(&self) -> (Duration, Duration, u32) {
        self.control.timing()
    }

    /// Name of the current state, empty before the first switch.
    #[must_use]
    pub fn current_state_name(&self) -> &str {
        self.control.current_state_name()
    }

    /// The platform, e.g. to script more input.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.control.platform
    }
}
