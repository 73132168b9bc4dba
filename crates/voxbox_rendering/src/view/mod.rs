//! # View
//!
//! Render-side snapshot of the room and its visible faces.
//!
//! ```text
//! RoomSimulator ──blit_to_view──> snapshot (PalettedVolume)
//!                                     │
//!                       build_buffers │  per face group:
//!                                     │   culled? ── yes ──> untouched
//!                                     │     │ no
//!                                     ▼     ▼
//!                        [+X] [-X] [-Y] [+Y] [+Z] [-Z]   FaceBuffer × 6
//! ```
//!
//! The snapshot is owned by the render thread and only handed to the room
//! worker for the duration of a blit.

mod face;

pub use face::{is_exposed, Face, FaceBuffer, FaceVertex};

use std::thread;

use voxbox_core::{PalettedVolume, Palette, Point, Region, RoomSimulator, Volume};
use voxbox_shared::{Mat4, Vec3};

use crate::config::ViewConfig;
use crate::error::{RenderError, RenderResult};
use crate::palette::PaletteImage;

/// Largest snapshot extent per axis; vertex coordinates are bytes.
pub const MAX_VIEW_EXTENT: i32 = 255;

/// Outcome of one `build_buffers` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Face groups rebuilt.
    pub rebuilt: usize,
    /// Face groups skipped by culling.
    pub culled: usize,
    /// Quads across all rebuilt groups.
    pub quads: usize,
}

/// Snapshot volume, face buffers and palettes.
pub struct View {
    snapshot: PalettedVolume,
    faces: [FaceBuffer; 6],
    culled: [bool; 6],
    palettes: PaletteImage,
    config: ViewConfig,
    model: Mat4,
    mvp: Mat4,
}

impl View {
    /// Creates an empty view.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidViewSize`] if an axis of
    /// `config.size` is outside `1..=255`.
    pub fn new(config: ViewConfig) -> RenderResult<Self> {
        let size = Point::from_array(config.size);
        if config.size.iter().any(|&s| !(1..=MAX_VIEW_EXTENT).contains(&s)) {
            return Err(RenderError::InvalidViewSize(size));
        }
        Ok(Self {
            snapshot: PalettedVolume::new(size),
            faces: Face::ALL.map(FaceBuffer::new),
            culled: [false; 6],
            palettes: PaletteImage::default(),
            config,
            model: Mat4::IDENTITY,
            mvp: Mat4::IDENTITY,
        })
    }

    /// Settings in use.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Snapshot extent.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Region {
        self.snapshot.bounds()
    }

    /// Packs `palettes` into the palette image.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::TooManyPalettes`] for more than 256 palettes.
    pub fn set_palettes(&mut self, palettes: &[Palette]) -> RenderResult<()> {
        self.palettes.set_palettes(palettes)
    }

    /// The packed palette image.
    #[inline]
    #[must_use]
    pub const fn palette_image(&self) -> &PaletteImage {
        &self.palettes
    }

    /// Fills the snapshot with `value`.
    pub fn clear(&mut self, value: u8) {
        self.snapshot.fill(value);
    }

    /// Writes a snapshot cell.
    #[inline]
    pub fn set(&mut self, p: Point, value: u8) {
        self.snapshot.set(p, value);
    }

    /// Reads a snapshot cell.
    #[inline]
    #[must_use]
    pub fn get(&self, p: Point) -> u8 {
        self.snapshot.get(p)
    }

    /// The snapshot volume.
    #[inline]
    #[must_use]
    pub const fn snapshot(&self) -> &PalettedVolume {
        &self.snapshot
    }

    /// Mutable snapshot access, e.g. for overlay blits.
    #[inline]
    pub fn snapshot_mut(&mut self) -> &mut PalettedVolume {
        &mut self.snapshot
    }

    /// Replaces the snapshot with `src_region` of the room placed at
    /// `dst_origin`, blocking until the room worker has copied it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Room`] if the room stopped; the snapshot is
    /// then empty.
    pub fn refresh_from(&mut self, room: &RoomSimulator, dst_origin: Point, src_region: Region) -> RenderResult<()> {
        let size = self.snapshot.size();
        let mut snapshot = std::mem::take(&mut self.snapshot);
        snapshot.fill(0);
        match room.blit_to_view(snapshot, dst_origin, src_region).wait() {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                Ok(())
            }
            Err(e) => {
                self.snapshot = PalettedVolume::new(size);
                Err(e.into())
            }
        }
    }

    /// Model transform applied before the view matrix.
    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
    }

    /// `projection * view * model` from the last build.
    #[inline]
    #[must_use]
    pub const fn mvp(&self) -> Mat4 {
        self.mvp
    }

    /// Buffer of `face`.
    #[inline]
    #[must_use]
    pub fn face(&self, face: Face) -> &FaceBuffer {
        &self.faces[face.index()]
    }

    /// All face buffers in [`Face::ALL`] order.
    #[inline]
    #[must_use]
    pub fn faces(&self) -> &[FaceBuffer; 6] {
        &self.faces
    }

    /// True if `face` was skipped by the last build.
    #[inline]
    #[must_use]
    pub fn is_culled(&self, face: Face) -> bool {
        self.culled[face.index()]
    }

    /// Rebuilds the face buffers from the snapshot.
    ///
    /// Culled groups keep their old contents and are not drawn.
    pub fn build_buffers(&mut self, projection: &Mat4, view: &Mat4) -> BuildStats {
        let model_view = *view * self.model;
        self.mvp = *projection * model_view;

        let row = model_view.row(2);
        let forward = -Vec3::new(row[0], row[1], row[2]).normalize();
        for face in Face::ALL {
            self.culled[face.index()] = self.config.back_face_culling
                && facing_angle(face.normal(), forward) > self.config.cull_angle_degrees.to_radians();
        }

        let snapshot = &self.snapshot;
        let culled = self.culled;
        let live = self.faces.iter_mut().filter(|b| !culled[b.face().index()]);

        if self.config.parallel_rebuild {
            thread::scope(|s| {
                for buffer in live {
                    s.spawn(move || buffer.rebuild(snapshot));
                }
            });
        } else {
            for buffer in live {
                buffer.rebuild(snapshot);
            }
        }

        let stats = BuildStats {
            rebuilt: culled.iter().filter(|&&c| !c).count(),
            culled: culled.iter().filter(|&&c| c).count(),
            quads: self
                .faces
                .iter()
                .filter(|b| !culled[b.face().index()])
                .map(FaceBuffer::quad_count)
                .sum(),
        };
        tracing::trace!(
            "View rebuilt {} face groups ({} culled), {} quads",
            stats.rebuilt,
            stats.culled,
            stats.quads
        );
        stats
    }
}

/// Angle between `normal` and the direction back towards the viewer.
fn facing_angle(normal: Vec3, forward: Vec3) -> f32 {
    normal.dot(-forward).clamp(-1.0, 1.0).acos()
}
