//! # Platform
//!
//! Input events, frame presentation and time, behind small traits so the
//! game shell runs the same against a window or a scripted headless
//! backend.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::RendererConfig;

/// Keys the game reacts to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Key {
    /// Any other key.
    #[default]
    Unknown,
    /// Arrow up
    Up,
    /// Arrow down
    Down,
    /// Arrow left
    Left,
    /// Arrow right
    Right,
    /// Escape
    Esc,
    /// Return
    Return,
}

/// Mouse button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonAction {
    /// Pressed
    Down,
    /// Released
    Up,
}

/// One input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The window was closed.
    Quit,
    /// A key was pressed.
    KeyDown {
        /// Text produced by the key, if any.
        rune: Option<char>,
        /// Key code.
        key: Key,
    },
    /// A key was released.
    KeyUp {
        /// Text produced by the key, if any.
        rune: Option<char>,
        /// Key code.
        key: Key,
    },
    /// Wheel scrolled.
    MouseWheel {
        /// Horizontal amount
        x: i32,
        /// Vertical amount
        y: i32,
    },
    /// Pointer moved.
    MouseMotion {
        /// Position x
        x: i32,
        /// Position y
        y: i32,
        /// Relative x
        xrel: i32,
        /// Relative y
        yrel: i32,
    },
    /// Button pressed or released.
    MouseButton {
        /// Position x
        x: i32,
        /// Position y
        y: i32,
        /// Button number, starting at 1.
        button: u8,
        /// Transition.
        action: ButtonAction,
    },
}

impl Event {
    /// Key press without text.
    #[must_use]
    pub const fn key_down(key: Key) -> Self {
        Self::KeyDown { rune: None, key }
    }
}

/// Source of input events.
pub trait Platform {
    /// Next pending event, if any.
    fn poll_event(&mut self) -> Option<Event>;
}

/// Frame output.
pub trait Presenter {
    /// Starts a frame.
    fn clear(&mut self);
    /// Sets the window title.
    fn set_window_title(&mut self, title: &str);
    /// Finishes a frame.
    fn present(&mut self);
}

/// Monotonic time since a fixed epoch owned by the clock.
pub trait Clock {
    /// Time since the epoch.
    fn now(&self) -> Duration;
}

/// Wall clock starting at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Starts the clock.
    #[must_use]
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Clock advanced by hand; clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward by `d`.
    pub fn advance(&self, d: Duration) {
        *self.now.lock() += d;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

// =============================================================================
// HEADLESS
// =============================================================================

/// Platform fed from a scripted event queue.
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    events: VecDeque<Event>,
}

impl HeadlessPlatform {
    /// Platform with no pending events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform that will yield `events` in order.
    #[must_use]
    pub fn scripted(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Queues one more event.
    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Events not yet polled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.events.len()
    }
}

impl Platform for HeadlessPlatform {
    fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }
}

/// Presenter that records what a window would show.
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    config: RendererConfig,
    titles: Vec<String>,
    frames: u64,
    in_frame: bool,
}

impl HeadlessPresenter {
    /// Creates a presenter for `config`.
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        tracing::info!(
            "Headless presenter: divisor {}, vsync {}, debug {}",
            config.window_divisor,
            config.vsync,
            config.debug
        );
        Self {
            config,
            ..Self::default()
        }
    }

    /// Settings in use.
    #[must_use]
    pub const fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Every title set so far.
    #[must_use]
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Frames presented.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

impl Presenter for HeadlessPresenter {
    fn clear(&mut self) {
        self.in_frame = true;
    }

    fn set_window_title(&mut self, title: &str) {
        if self.titles.last().map(String::as_str) != Some(title) {
            tracing::debug!("Window title: {}", title);
        }
        self.titles.push(title.to_string());
    }

    fn present(&mut self) {
        if self.in_frame {
            self.frames += 1;
            self.in_frame = false;
        }
    }
}
