//! Player model overlaid on the view, and dropped into the room on death.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use voxbox_core::{blit_with, copy_solid, AxisOrder, ModelLoader, PalettedVolume, Point, RoomSimulator, Volume};
use voxbox_rendering::View;

use crate::error::{GameError, GameResult};

/// A voxel model drawn over the room snapshot while alive.
#[derive(Debug, Clone)]
pub struct Player {
    image: PalettedVolume,
    position: Point,
    alive: bool,
}

impl Player {
    /// Decodes a Z-up `.vox` model; its Z axis becomes Y.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Decode`] if the model is malformed.
    pub fn from_reader<R: Read>(reader: R) -> GameResult<Self> {
        let mut image = PalettedVolume::with_axis(AxisOrder::SwapYZ);
        let info = ModelLoader::decode(reader, &mut image)?;
        tracing::info!("Player model {:?}, {} voxels", image.size(), info.voxel_count);
        Ok(Self {
            image,
            position: Point::ZERO,
            alive: true,
        })
    }

    /// Opens and decodes `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Config`] if the file cannot be opened, or
    /// [`GameError::Decode`].
    pub fn from_file(path: impl AsRef<Path>) -> GameResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| GameError::Config {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// The decoded model.
    #[must_use]
    pub const fn image(&self) -> &PalettedVolume {
        &self.image
    }

    /// Where the model origin is drawn.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Moves the model by `delta`.
    pub fn translate(&mut self, delta: Point) {
        self.position = self.position.add(delta);
    }

    /// False after [`Player::die`].
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Copies the non-empty model cells into the view snapshot.
    pub fn render(&self, view: &mut View) {
        if self.alive {
            let region = self.image.bounds();
            blit_with(view.snapshot_mut(), &self.image, self.position, region, copy_solid);
        }
    }

    /// Queues the model into the room as loose voxels and stops drawing
    /// it. The copy is not awaited. Does nothing once dead.
    pub fn die(&mut self, room: &RoomSimulator) {
        if !self.alive {
            return;
        }
        self.alive = false;
        tracing::info!("Player died at {:?}", self.position);

        let image = self.image.clone();
        let at = self.position;
        let _ = room.send(move |grid| {
            let region = image.bounds();
            blit_with(grid, &image, at, region, copy_solid);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxbox_core::{ModelWriter, RoomConfig};
    use voxbox_rendering::ViewConfig;

    fn player() -> Player {
        // Two voxels stacked along model z.
        let bytes = ModelWriter::new(1, 1, 2).voxel(0, 0, 0, 6).voxel(0, 0, 1, 7).to_bytes();
        Player::from_reader(bytes.as_slice()).unwrap()
    }

    #[test]
    fn test_model_is_z_up() {
        let p = player();
        assert_eq!(p.image().size(), Point::new(1, 2, 1));
        assert_eq!(p.image().get(Point::new(0, 1, 0)), 7);
    }

    #[test]
    fn test_render_keeps_background() {
        let mut view = View::new(ViewConfig {
            size: [4, 4, 4],
            ..ViewConfig::default()
        })
        .unwrap();
        view.clear(2);
        let mut p = player();
        p.translate(Point::new(1, 0, 1));
        p.render(&mut view);
        assert_eq!(view.get(Point::new(1, 0, 1)), 6);
        assert_eq!(view.get(Point::new(1, 1, 1)), 7);
        assert_eq!(view.get(Point::new(0, 0, 0)), 2);
    }

    #[test]
    fn test_die_drops_model_into_room_once() {
        let room = RoomSimulator::with_config(&RoomConfig {
            size: [4, 4, 4],
            step_interval_ms: 0,
            mark_interval_ms: 0,
            queue_capacity: 4,
        })
        .unwrap();
        room.start().unwrap();

        let mut p = player();
        p.die(&room);
        p.die(&room);
        assert!(!p.is_alive());
        let count = room.send(|g| g.count_voxels()).wait().unwrap();
        assert_eq!(count, 2);
    }
}
