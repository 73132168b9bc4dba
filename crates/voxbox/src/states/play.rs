//! The sandbox: a simulated room, its view, and an optional player.

use std::sync::Arc;

use parking_lot::Mutex;

use voxbox_core::{Palette, Point, Region, RoomGrid, RoomSimulator, Volume};
use voxbox_rendering::{BuildStats, View};
use voxbox_shared::{Mat4, Vec3};

use crate::config::VoxboxConfig;
use crate::error::{GameError, GameResult};
use crate::game::{GameControl, GameState};
use crate::platform::{Event, Key};
use crate::player::Player;

/// Vertical field of view of the camera.
const FOV_Y_DEGREES: f32 = 60.0;

/// Counters published by the play state every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayStats {
    /// Frames updated since the last enter.
    pub frames: u64,
    /// Result of the last `build_buffers`.
    pub last_build: BuildStats,
    /// Non-empty snapshot cells in the last frame.
    pub voxels_in_view: usize,
    /// Whether the player is still drawn.
    pub player_alive: bool,
    /// Frames that rebuilt the face buffers.
    pub builds: u64,
}

/// Shared handle to [`PlayStats`].
pub type PlayStatsHandle = Arc<Mutex<PlayStats>>;

/// Everything that lives between `enter` and `exit`.
struct Session {
    room: RoomSimulator,
    view: View,
    player: Option<Player>,
    projection: Mat4,
    camera: Mat4,
    /// Snapshot bytes behind the current face buffers.
    built: Option<Vec<u8>>,
}

impl Session {
    fn handle(&mut self, event: Event) {
        let Event::KeyDown { key, .. } = event else {
            return;
        };
        let Some(player) = self.player.as_mut() else {
            return;
        };
        match key {
            Key::Up => player.translate(Point::new(0, 0, -1)),
            Key::Down => player.translate(Point::new(0, 0, 1)),
            Key::Left => player.translate(Point::new(-1, 0, 0)),
            Key::Right => player.translate(Point::new(1, 0, 0)),
            Key::Return => player.die(&self.room),
            Key::Esc | Key::Unknown => {}
        }
    }
}

/// Runs the room and rebuilds the view whenever the snapshot changes.
pub struct PlayState {
    config: VoxboxConfig,
    session: Option<Session>,
    stats: PlayStatsHandle,
}

impl PlayState {
    /// Registry name.
    pub const NAME: &'static str = "play";

    /// Creates the state; nothing is allocated until `enter`.
    #[must_use]
    pub fn new(config: VoxboxConfig) -> Self {
        Self {
            config,
            session: None,
            stats: Arc::new(Mutex::new(PlayStats::default())),
        }
    }

    /// Shared view of the per-frame counters.
    #[must_use]
    pub fn stats_handle(&self) -> PlayStatsHandle {
        Arc::clone(&self.stats)
    }

    fn open_session(&self) -> GameResult<Session> {
        let play = &self.config.play;
        let room = RoomSimulator::with_config(&self.config.room)?;
        // Running first, so loads beyond the queue capacity drain instead of blocking.
        room.start()?;

        let mut loads = Vec::with_capacity(play.models.len());
        for model in &play.models {
            let at = Point::from_array(model.at);
            let done = room.load_model_file(&model.path, at, model.flags.cell_flags())?;
            loads.push((model.path.display().to_string(), done));
        }
        if play.demo_scene {
            let _ = room.send(demo_scene);
        }
        for (path, done) in loads {
            let info = done.wait()??;
            tracing::info!("Loaded {} ({} voxels)", path, info.voxel_count);
        }

        let mut view = View::new(self.config.view.clone())?;
        view.set_palettes(&[Palette::default()])?;

        let size = view.bounds().size();
        let player = match &play.player_model {
            Some(path) => {
                let mut player = Player::from_file(path)?;
                player.translate(Point::new(size.x / 2, 0, size.z / 2));
                Some(player)
            }
            None => None,
        };

        let (w, h, d) = (size.x as f32, size.y as f32, size.z as f32);
        let projection = Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), 16.0 / 9.0, 0.1, 4.0 * (w + h + d));
        let camera = Mat4::look_at_rh(
            Vec3::new(w * 0.5, h * 1.5, d * 2.0),
            Vec3::new(w * 0.5, 0.0, d * 0.5),
            Vec3::Y,
        );

        Ok(Session {
            room,
            view,
            player,
            projection,
            camera,
            built: None,
        })
    }
}

impl GameState for PlayState {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn enter(&mut self, from: Option<&str>, _ctl: &mut dyn GameControl) -> GameResult<()> {
        tracing::debug!("Play entered from {:?}", from);
        if let Some(old) = self.session.take() {
            old.room.destroy();
        }
        let session = self.open_session()?;
        *self.stats.lock() = PlayStats {
            player_alive: session.player.is_some(),
            ..PlayStats::default()
        };
        self.session = Some(session);
        Ok(())
    }

    fn exit(&mut self, _to: Option<&str>) -> GameResult<()> {
        if let Some(session) = self.session.take() {
            session.room.destroy();
        }
        Ok(())
    }

    fn update(&mut self, ctl: &mut dyn GameControl) -> GameResult<()> {
        let s = self.session.as_mut().ok_or(GameError::NoActiveState)?;
        while let Some(event) = ctl.poll_event() {
            s.handle(event);
        }

        let region = s.room.bounds();
        s.view.refresh_from(&s.room, Point::ZERO, region)?;
        if let Some(player) = &s.player {
            player.render(&mut s.view);
        }
        let cells = s.view.snapshot().as_slice();
        let changed = s.built.as_deref() != Some(cells);
        if changed {
            s.built = Some(cells.to_vec());
        }
        let build = changed.then(|| s.view.build_buffers(&s.projection, &s.camera));

        let mut stats = self.stats.lock();
        stats.frames += 1;
        if let Some(build) = build {
            stats.last_build = build;
            stats.builds += 1;
        }
        stats.voxels_in_view = s.view.snapshot().count_voxels();
        stats.player_alive = s.player.as_ref().is_some_and(Player::is_alive);
        Ok(())
    }

    fn render(&mut self) -> GameResult<()> {
        let stats = *self.stats.lock();
        tracing::trace!(
            "Frame {}: {} quads in {} groups",
            stats.frames,
            stats.last_build.quads,
            stats.last_build.rebuilt
        );
        Ok(())
    }
}

/// Drops a block of loose voxels into the upper middle of the room.
fn demo_scene(grid: &mut RoomGrid) {
    let size = grid.size();
    let side = (size.x.min(size.z) / 4).max(1);
    let height = (size.y / 4).max(1);
    let min = Point::new((size.x - side) / 2, size.y - height, (size.z - side) / 2);
    let block = Region::new(min, min.add(Point::new(side, height, side)));
    block.for_each(|p| {
        let color = (p.x + p.y + p.z).rem_euclid(63) + 1;
        grid.set(p, color as u8);
    });
    tracing::debug!("Demo scene: {} loose voxels", block.volume());
}
