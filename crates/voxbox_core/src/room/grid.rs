//! The room's cell array and the two automaton passes.
//!
//! ```text
//! cell byte:  F A c c c c c c
//!             │ │ └─────────┴── color index (0 = empty)
//!             │ └────────────── ATTACHED
//!             └──────────────── FALLING
//! ```

use crate::model::ModelInfo;
use crate::palette::Palette;
use crate::volume::{AxisOrder, Point, Region, Volume, VoxelSink};

use super::{CellFlags, COLOR_MASK};

/// Diagonal-down slide targets as `(dx, dz)`; `dy` is always `-1`.
const SLIDE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Seed the slide generator starts from at the beginning of every step pass.
pub const SLIDE_SEED: u32 = 0;

/// Linear congruential generator picking slide directions.
#[derive(Debug, Clone, Copy)]
struct SlideRng {
    seed: u32,
}

impl SlideRng {
    const fn new(seed: u32) -> Self {
        Self { seed }
    }

    #[inline]
    fn next_slot(&mut self) -> usize {
        self.seed = self.seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        ((self.seed >> 24) % 8) as usize
    }
}

/// Dense room storage with flag bits.
///
/// Only the room worker thread ever holds a `&mut RoomGrid` once the
/// simulator is started; everything else reaches it through commands.
#[derive(Debug, Clone)]
pub struct RoomGrid {
    size: Point,
    data: Vec<u8>,
}

impl RoomGrid {
    /// Allocates a zeroed grid.
    ///
    /// # Panics
    ///
    /// Panics if any extent is not positive.
    #[must_use]
    pub fn new(size: Point) -> Self {
        assert!(
            size.x > 0 && size.y > 0 && size.z > 0,
            "room size must be positive, got {size:?}"
        );
        let len = size.x as usize * size.y as usize * size.z as usize;
        Self {
            size,
            data: vec![0; len],
        }
    }

    /// Extent of the grid.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Point {
        self.size
    }

    /// Full cell byte including flags.
    ///
    /// # Panics
    ///
    /// Panics if `p` is outside the grid.
    #[inline]
    #[must_use]
    pub fn raw(&self, p: Point) -> u8 {
        self.data[self.checked_offset(p)]
    }

    /// Writes a full cell byte including flags.
    ///
    /// # Panics
    ///
    /// Panics if `p` is outside the grid.
    #[inline]
    pub fn set_raw(&mut self, p: Point, value: u8) {
        let i = self.checked_offset(p);
        self.data[i] = value;
    }

    /// Flags of the cell at `p`.
    #[inline]
    #[must_use]
    pub fn flags(&self, p: Point) -> CellFlags {
        CellFlags::of(self.raw(p))
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn count_voxels(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Raw cells in `z, y, x` order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    // =========================================================================
    // MARK
    // =========================================================================

    /// Recomputes `ATTACHED` for every occupied cell.
    ///
    /// Floor cells are always attached. Falling cells are left alone. Any
    /// other cell is attached iff one of its six neighbours is attached.
    /// Cells are updated in place in `z, y, x` order, so support may travel
    /// further than one cell along the scan direction in a single pass.
    pub fn mark_phase(&mut self) {
        let (sx, sy, sz) = self.dims();
        let attached = CellFlags::ATTACHED.bits();
        let falling = CellFlags::FALLING.bits();

        for z in 0..sz {
            for y in 0..sy {
                for x in 0..sx {
                    let i = self.offset(x, y, z);
                    let v = self.data[i];
                    if v == 0 {
                        continue;
                    }
                    if y == 0 {
                        self.data[i] = (v & !falling) | attached;
                        continue;
                    }
                    if v & falling != 0 {
                        continue;
                    }
                    let mut nv = v & !attached;
                    if self.has_attached_neighbour(x, y, z) {
                        nv |= attached;
                    }
                    self.data[i] = nv;
                }
            }
        }
    }

    fn has_attached_neighbour(&self, x: usize, y: usize, z: usize) -> bool {
        let (sx, sy, sz) = self.dims();
        let attached = CellFlags::ATTACHED.bits();
        let probe = |nx: usize, ny: usize, nz: usize| self.data[self.offset(nx, ny, nz)] & attached != 0;

        (x > 0 && probe(x - 1, y, z))
            || (x + 1 < sx && probe(x + 1, y, z))
            || (y > 0 && probe(x, y - 1, z))
            || (y + 1 < sy && probe(x, y + 1, z))
            || (z > 0 && probe(x, y, z - 1))
            || (z + 1 < sz && probe(x, y, z + 1))
    }

    // =========================================================================
    // STEP
    // =========================================================================

    /// Moves every loose cell one step under gravity.
    ///
    /// Rows are scanned bottom-up from `y = 1`. A loose cell drops into an
    /// empty cell below; otherwise it tries one pseudo-randomly chosen
    /// diagonal-down neighbour; otherwise it rests and inherits the
    /// attachment state of the cell below. The slide generator restarts from
    /// [`SLIDE_SEED`] on every call, so a pass is a pure function of the grid.
    pub fn step_phase(&mut self) {
        let (sx, sy, sz) = self.dims();
        let state = (CellFlags::ATTACHED | CellFlags::FALLING).bits();
        let attached = CellFlags::ATTACHED.bits();
        let falling = CellFlags::FALLING.bits();
        let mut rng = SlideRng::new(SLIDE_SEED);

        for y in 1..sy {
            for z in 0..sz {
                for x in 0..sx {
                    let i = self.offset(x, y, z);
                    let v = self.data[i];
                    if v == 0 || v & attached != 0 {
                        continue;
                    }

                    let below = self.offset(x, y - 1, z);
                    let nv = self.data[below];
                    if nv == 0 {
                        self.data[below] = v | falling;
                        self.data[i] = 0;
                        continue;
                    }

                    let (dx, dz) = SLIDE_OFFSETS[rng.next_slot()];
                    let target = self.slide_target(x, y - 1, z, dx, dz);
                    if let Some(j) = target.filter(|&j| self.data[j] == 0) {
                        self.data[j] = v | falling;
                        self.data[i] = 0;
                        continue;
                    }

                    self.data[i] = (v & !state) | (nv & state);
                }
            }
        }
    }

    fn slide_target(&self, x: usize, y: usize, z: usize, dx: i32, dz: i32) -> Option<usize> {
        let (sx, _, sz) = self.dims();
        let nx = x.checked_add_signed(dx as isize).filter(|&n| n < sx)?;
        let nz = z.checked_add_signed(dz as isize).filter(|&n| n < sz)?;
        Some(self.offset(nx, y, nz))
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Sink that writes decoded model voxels through `ctx`.
    #[must_use]
    pub fn load_target(&mut self, ctx: LoadContext) -> LoadTarget<'_> {
        LoadTarget { grid: self, ctx }
    }

    /// Writes one model voxel: model axes mapped by `ctx.axis`, offset by
    /// `ctx.at`, color masked to six bits and tagged with `ctx.flags`.
    /// Points outside the grid are dropped.
    pub fn write_loaded(&mut self, ctx: &LoadContext, p: Point, index: u8) {
        let q = ctx.axis.apply(p).add(ctx.at);
        let Some(i) = self.offset_of(q) else {
            return;
        };
        let color = index & COLOR_MASK;
        self.data[i] = if color == 0 { 0 } else { color | ctx.flags.bits() };
    }

    // =========================================================================
    // INDEXING
    // =========================================================================

    #[inline]
    fn dims(&self) -> (usize, usize, usize) {
        (self.size.x as usize, self.size.y as usize, self.size.z as usize)
    }

    #[inline]
    fn offset(&self, x: usize, y: usize, z: usize) -> usize {
        let (sx, sy, _) = self.dims();
        z * sx * sy + y * sx + x
    }

    #[inline]
    fn offset_of(&self, p: Point) -> Option<usize> {
        if !Region::from_size(self.size).contains(p) {
            return None;
        }
        Some(self.offset(p.x as usize, p.y as usize, p.z as usize))
    }

    #[inline]
    fn checked_offset(&self, p: Point) -> usize {
        match self.offset_of(p) {
            Some(i) => i,
            None => panic!("cell {p:?} outside room of size {:?}", self.size),
        }
    }
}

impl Volume for RoomGrid {
    fn bounds(&self) -> Region {
        Region::from_size(self.size)
    }

    /// Color index only; flag bits never leave the room.
    #[inline]
    fn get(&self, p: Point) -> u8 {
        self.offset_of(p).map_or(0, |i| self.data[i] & COLOR_MASK)
    }

    /// Writes a loose cell (no flags).
    #[inline]
    fn set(&mut self, p: Point, value: u8) {
        if let Some(i) = self.offset_of(p) {
            self.data[i] = value & COLOR_MASK;
        }
    }
}

// =============================================================================
// LOAD CONTEXT
// =============================================================================

/// Placement of a model being loaded into the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadContext {
    /// Room position of the model origin.
    pub at: Point,
    /// Axis mapping from model to room space.
    pub axis: AxisOrder,
    /// Flags every written voxel receives.
    pub flags: CellFlags,
}

impl LoadContext {
    /// Context for a Z-up model placed at `at`.
    #[must_use]
    pub const fn new(at: Point, flags: CellFlags) -> Self {
        Self {
            at,
            axis: AxisOrder::SwapYZ,
            flags,
        }
    }
}

/// [`VoxelSink`] writing into a [`RoomGrid`] through a [`LoadContext`].
pub struct LoadTarget<'a> {
    grid: &'a mut RoomGrid,
    ctx: LoadContext,
}

impl VoxelSink for LoadTarget<'_> {
    fn set_bounds(&mut self, bounds: Region) {
        let extent = self.ctx.axis.apply(bounds.size());
        let placed = Region::new(self.ctx.at, self.ctx.at.add(extent));
        if placed.intersect(&self.grid.bounds()) != placed {
            tracing::warn!("Model at {:?} extends past the room; outside voxels are dropped", placed);
        }
    }

    fn set_palette(&mut self, _palette: &Palette) {}

    fn set_voxel(&mut self, p: Point, index: u8) {
        self.grid.write_loaded(&self.ctx, p, index);
    }
}

/// Log line for a finished load.
pub(crate) fn log_loaded(info: &ModelInfo, ctx: &LoadContext) {
    tracing::info!(
        "Loaded model {:?} ({} voxels) at {:?} with flags {:?}",
        info.size,
        info.voxel_count,
        ctx.at,
        ctx.flags
    );
}
