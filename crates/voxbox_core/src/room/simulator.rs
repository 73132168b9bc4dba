//! Worker thread, command queue and completions.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, never, select, tick, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use voxbox_shared::constants::{COMMAND_QUEUE_CAPACITY, DEFAULT_ROOM_SIZE, MARK_INTERVAL, STEP_INTERVAL};

use crate::error::{RoomError, RoomResult, VoxResult};
use crate::model::{ModelInfo, ModelLoader};
use crate::volume::{blit, Point, Region, Volume};

use super::grid::{log_loaded, LoadContext, RoomGrid};
use super::CellFlags;

/// A closure run on the worker with exclusive grid access.
type Command = Box<dyn FnOnce(&mut RoomGrid) + Send>;

// =============================================================================
// CONFIG
// =============================================================================

/// Room settings, usually read from the `[room]` table of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Extent `[x, y, z]`; `y` is up.
    pub size: [i32; 3],
    /// Milliseconds between step passes. `0` disables the step timer.
    pub step_interval_ms: u64,
    /// Milliseconds between mark passes. `0` disables the mark timer.
    pub mark_interval_ms: u64,
    /// Commands that may wait in the queue before `send` blocks.
    pub queue_capacity: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_ROOM_SIZE,
            step_interval_ms: STEP_INTERVAL.as_millis() as u64,
            mark_interval_ms: MARK_INTERVAL.as_millis() as u64,
            queue_capacity: COMMAND_QUEUE_CAPACITY,
        }
    }
}

impl RoomConfig {
    /// Checks extents and queue capacity.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::InvalidConfig`] for a non-positive extent or a
    /// zero queue capacity.
    pub fn validate(&self) -> RoomResult<()> {
        if self.size.iter().any(|&s| s <= 0) {
            return Err(RoomError::InvalidConfig(format!("size {:?} must be positive", self.size)));
        }
        if self.queue_capacity == 0 {
            return Err(RoomError::InvalidConfig("queue_capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn interval(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

// =============================================================================
// COMPLETION
// =============================================================================

/// Result of a queued command.
///
/// Resolves once the command ran. Dropping it is fine; the command still
/// runs. If the room stops before the command runs, waiting yields
/// [`RoomError::Stopped`].
pub struct Completion<T> {
    rx: Receiver<T>,
}

impl<T> Completion<T> {
    /// Blocks until the command ran.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::Stopped`] if the command was dropped unexecuted.
    pub fn wait(self) -> RoomResult<T> {
        self.rx.recv().map_err(|_| RoomError::Stopped)
    }

    /// Blocks for at most `timeout`. `None` if the command has not run yet.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<RoomResult<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(v) => Some(Ok(v)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(RoomError::Stopped)),
        }
    }

    /// Non-blocking poll. `None` if the command has not run yet.
    pub fn try_take(&self) -> Option<RoomResult<T>> {
        match self.rx.try_recv() {
            Ok(v) => Some(Ok(v)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(RoomError::Stopped)),
        }
    }
}

// =============================================================================
// SIMULATOR
// =============================================================================

/// State held between construction and `start`.
struct Idle {
    grid: RoomGrid,
    commands: Receiver<Command>,
}

/// Owns a [`RoomGrid`] and runs the automaton on a dedicated thread.
///
/// All methods take `&self`; the simulator can be shared with scoped
/// threads. `destroy` must not race with other callers.
pub struct RoomSimulator {
    size: Point,
    step_interval: Option<Duration>,
    mark_interval: Option<Duration>,
    capacity: usize,
    commands: Sender<Command>,
    idle: Mutex<Option<Idle>>,
    stop: Mutex<Option<Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RoomSimulator {
    /// Creates a stopped room of `size` stepping every `step_interval`,
    /// with the default mark interval and queue capacity.
    ///
    /// # Panics
    ///
    /// Panics if any extent of `size` is not positive.
    #[must_use]
    pub fn new(size: Point, step_interval: Duration) -> Self {
        Self::build(
            RoomGrid::new(size),
            (!step_interval.is_zero()).then_some(step_interval),
            Some(MARK_INTERVAL),
            COMMAND_QUEUE_CAPACITY,
        )
    }

    /// Creates a stopped room from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::InvalidConfig`] if the configuration is rejected
    /// by [`RoomConfig::validate`].
    pub fn with_config(config: &RoomConfig) -> RoomResult<Self> {
        config.validate()?;
        Ok(Self::build(
            RoomGrid::new(Point::from_array(config.size)),
            interval(config.step_interval_ms),
            interval(config.mark_interval_ms),
            config.queue_capacity,
        ))
    }

    fn build(
        grid: RoomGrid,
        step_interval: Option<Duration>,
        mark_interval: Option<Duration>,
        capacity: usize,
    ) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            size: grid.size(),
            step_interval,
            mark_interval,
            capacity,
            commands: tx,
            idle: Mutex::new(Some(Idle { grid, commands: rx })),
            stop: Mutex::new(None),
            worker: Mutex::new(None),
        }
    }

    /// Room extent. Fixed for the lifetime of the simulator.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> Region {
        Region::from_size(self.size)
    }

    /// True between `start` and `destroy`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.stop.lock().is_some()
    }

    /// Spawns the worker. Commands sent earlier run first, in order.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::AlreadyStarted`] if the room was started or
    /// destroyed before, or [`RoomError::Spawn`] if the thread cannot be
    /// created.
    pub fn start(&self) -> RoomResult<()> {
        let Some(Idle { grid, commands }) = self.idle.lock().take() else {
            return Err(RoomError::AlreadyStarted);
        };

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let mark = self.mark_interval.map_or_else(never, tick);
        let step = self.step_interval.map_or_else(never, tick);

        let handle = thread::Builder::new()
            .name("voxbox-room".to_string())
            .spawn(move || run(grid, &commands, &stop_rx, &mark, &step))
            .map_err(RoomError::Spawn)?;

        *self.stop.lock() = Some(stop_tx);
        *self.worker.lock() = Some(handle);

        tracing::info!(
            "Room simulator started: size {:?}, step {:?}, mark {:?}, queue capacity {}",
            self.size,
            self.step_interval,
            self.mark_interval,
            self.capacity
        );
        Ok(())
    }

    /// Queues `f` to run on the worker with exclusive grid access.
    ///
    /// Blocks while the queue is full. Commands from one caller run in the
    /// order they were sent.
    pub fn send<F, R>(&self, f: F) -> Completion<R>
    where
        F: FnOnce(&mut RoomGrid) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let command: Command = Box::new(move |grid| {
            // The caller may have dropped the completion.
            let _ = tx.send(f(grid));
        });
        if self.commands.send(command).is_err() {
            tracing::debug!("Command dropped: room simulator stopped");
        }
        Completion { rx }
    }

    /// Queues a flag-free copy of `src_region` into `dst` at `dst_origin`.
    ///
    /// `dst` moves to the worker and comes back through the completion, so
    /// it is never aliased while the copy runs.
    pub fn blit_to_view<V>(&self, dst: V, dst_origin: Point, src_region: Region) -> Completion<V>
    where
        V: Volume + Send + 'static,
    {
        self.send(move |grid| {
            let mut dst = dst;
            blit(&mut dst, &*grid, dst_origin, src_region);
            dst
        })
    }

    /// Queues decoding of a `.vox` model into the room.
    ///
    /// Model axes are swapped so the model's Z becomes the room's Y; the
    /// model origin lands on `at` and every voxel is tagged with `flags`.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::IllegalFlags`] for `ATTACHED | FALLING`; nothing
    /// is queued in that case. Decode errors arrive through the completion.
    pub fn load_model<R>(&self, reader: R, at: Point, flags: CellFlags) -> RoomResult<Completion<VoxResult<ModelInfo>>>
    where
        R: Read + Send + 'static,
    {
        if !flags.is_legal() {
            return Err(RoomError::IllegalFlags(flags));
        }
        let ctx = LoadContext::new(at, flags);
        Ok(self.send(move |grid| -> VoxResult<ModelInfo> {
            let info = ModelLoader::decode(reader, &mut grid.load_target(ctx))?;
            log_loaded(&info, &ctx);
            Ok(info)
        }))
    }

    /// Opens `path` and queues it like [`RoomSimulator::load_model`].
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::IllegalFlags`] or [`RoomError::Open`].
    pub fn load_model_file<P>(&self, path: P, at: Point, flags: CellFlags) -> RoomResult<Completion<VoxResult<ModelInfo>>>
    where
        P: AsRef<Path>,
    {
        if !flags.is_legal() {
            return Err(RoomError::IllegalFlags(flags));
        }
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| RoomError::Open {
            path: path.display().to_string(),
            source,
        })?;
        self.load_model(BufReader::new(file), at, flags)
    }

    /// Queues zeroing of the whole room.
    pub fn clear(&self) -> Completion<()> {
        self.send(RoomGrid::clear)
    }

    /// Stops the worker and waits for it to exit. Queued commands that have
    /// not run are dropped. Calling it again does nothing.
    pub fn destroy(&self) {
        let stop = self.stop.lock().take();
        let idle = self.idle.lock().take();
        if let Some(stop) = stop {
            let _ = stop.send(());
        }
        if let Some(idle) = idle {
            discard_pending(&idle.commands);
        }

        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                tracing::error!("Room worker panicked");
            } else {
                tracing::info!("Room simulator stopped");
            }
        }
    }
}

impl Drop for RoomSimulator {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn run(
    mut grid: RoomGrid,
    commands: &Receiver<Command>,
    stop: &Receiver<()>,
    mark: &Receiver<Instant>,
    step: &Receiver<Instant>,
) {
    loop {
        select! {
            recv(stop) -> _ => break,
            recv(mark) -> _ => grid.mark_phase(),
            recv(step) -> _ => grid.step_phase(),
            recv(commands) -> command => match command {
                Ok(command) => command(&mut grid),
                Err(_) => break,
            },
        }
    }
    discard_pending(commands);
}

/// Drops queued commands so their completions resolve as stopped.
fn discard_pending(commands: &Receiver<Command>) {
    let dropped = commands.try_iter().count();
    if dropped > 0 {
        tracing::debug!("Discarded {} queued room commands", dropped);
    }
}
