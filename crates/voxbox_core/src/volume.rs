//! # Dense Voxel Volumes
//!
//! A volume is a box of byte cells addressed by integer points. Cell `0`
//! means "no voxel"; any other value is a palette index (possibly carrying
//! flag bits, see [`crate::room::CellFlags`]).
//!
//! ```text
//!        y (up)
//!        │
//!        │   z
//!        │  ╱
//!        │ ╱
//!        └──────── x        index = z * X * Y + y * X + x
//! ```
//!
//! Two traits split the surface:
//! - [`Volume`]: bounds + random access (`get` / `set`), used by [`blit`].
//! - [`VoxelSink`]: the write-only decode target of the model loader.

use crate::palette::Palette;

// =============================================================================
// GEOMETRY
// =============================================================================

/// Integer cell coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    /// X coordinate
    pub x: i32,
    /// Y coordinate (vertical)
    pub y: i32,
    /// Z coordinate
    pub z: i32,
}

impl Point {
    /// Origin
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Creates a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Creates a point from `[x, y, z]`.
    #[inline]
    #[must_use]
    pub const fn from_array(a: [i32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    /// Component-wise sum.
    #[inline]
    #[must_use]
    pub const fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    /// Component-wise difference.
    #[inline]
    #[must_use]
    pub const fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }

    /// Exchanges the Y and Z components.
    #[inline]
    #[must_use]
    pub const fn swap_yz(self) -> Self {
        Self::new(self.x, self.z, self.y)
    }
}

/// Axis-aligned box of cells. `min` is inclusive, `max` exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    /// Inclusive lower corner
    pub min: Point,
    /// Exclusive upper corner
    pub max: Point,
}

impl Region {
    /// Creates a region from its corners.
    #[inline]
    #[must_use]
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Region `[0, size)`.
    #[inline]
    #[must_use]
    pub const fn from_size(size: Point) -> Self {
        Self::new(Point::ZERO, size)
    }

    /// Extent along each axis (zero or negative when empty).
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Point {
        self.max.sub(self.min)
    }

    /// True if the region holds no cells.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y || self.min.z >= self.max.z
    }

    /// Number of cells (zero when empty).
    #[must_use]
    pub fn volume(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let s = self.size();
        s.x as usize * s.y as usize * s.z as usize
    }

    /// True if `p` lies inside.
    #[inline]
    #[must_use]
    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x
            && p.y >= self.min.y
            && p.z >= self.min.z
            && p.x < self.max.x
            && p.y < self.max.y
            && p.z < self.max.z
    }

    /// Overlap of two regions (possibly empty).
    #[must_use]
    pub fn intersect(&self, o: &Self) -> Self {
        Self::new(
            Point::new(
                self.min.x.max(o.min.x),
                self.min.y.max(o.min.y),
                self.min.z.max(o.min.z),
            ),
            Point::new(
                self.max.x.min(o.max.x),
                self.max.y.min(o.max.y),
                self.max.z.min(o.max.z),
            ),
        )
    }

    /// Region shifted by `d`.
    #[inline]
    #[must_use]
    pub const fn translate(&self, d: Point) -> Self {
        Self::new(self.min.add(d), self.max.add(d))
    }

    /// Visits every point in `z`, `y`, `x` nesting order.
    pub fn for_each(&self, mut f: impl FnMut(Point)) {
        for z in self.min.z..self.max.z {
            for y in self.min.y..self.max.y {
                for x in self.min.x..self.max.x {
                    f(Point::new(x, y, z));
                }
            }
        }
    }
}

// =============================================================================
// TRAITS
// =============================================================================

/// Random-access voxel storage.
pub trait Volume {
    /// The addressable cells.
    fn bounds(&self) -> Region;

    /// Reads a cell. Points outside the bounds read as `0`.
    fn get(&self, p: Point) -> u8;

    /// Writes a cell. Points outside the bounds are ignored.
    fn set(&mut self, p: Point, value: u8);
}

/// Write target for decoded voxel models.
///
/// Decoders call `set_bounds` first, then `set_palette`, then `set_voxel`
/// once per voxel.
pub trait VoxelSink {
    /// Announces the model's extent.
    fn set_bounds(&mut self, bounds: Region);

    /// Announces the model's palette.
    fn set_palette(&mut self, palette: &Palette);

    /// Writes one voxel in model coordinates.
    fn set_voxel(&mut self, p: Point, index: u8);
}

// =============================================================================
// BLIT
// =============================================================================

/// Copies `src_region` of `src` into `dst` so that `src_region.min` lands
/// on `dst_origin`. The copy is clipped against both volumes.
pub fn blit<D, S>(dst: &mut D, src: &S, dst_origin: Point, src_region: Region)
where
    D: Volume + ?Sized,
    S: Volume + ?Sized,
{
    blit_with(dst, src, dst_origin, src_region, |d, s, dp, sp| {
        d.set(dp, s.get(sp));
    });
}

/// Like [`blit`], but calls `op(dst, src, dst_point, src_point)` for each
/// overlapping cell instead of copying.
pub fn blit_with<D, S, F>(dst: &mut D, src: &S, dst_origin: Point, src_region: Region, mut op: F)
where
    D: Volume + ?Sized,
    S: Volume + ?Sized,
    F: FnMut(&mut D, &S, Point, Point),
{
    let offset = dst_origin.sub(src_region.min);
    let clipped = src_region
        .intersect(&src.bounds())
        .translate(offset)
        .intersect(&dst.bounds());
    clipped.for_each(|dp| op(dst, src, dp, dp.sub(offset)));
}

/// Blit operator that skips empty source cells.
pub fn copy_solid<D, S>(dst: &mut D, src: &S, dp: Point, sp: Point)
where
    D: Volume + ?Sized,
    S: Volume + ?Sized,
{
    let v = src.get(sp);
    if v != 0 {
        dst.set(dp, v);
    }
}

// =============================================================================
// PALETTED VOLUME
// =============================================================================

/// Axis mapping applied to points written through a [`VoxelSink`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AxisOrder {
    /// Model axes are used unchanged.
    #[default]
    Identity,
    /// Model Z becomes volume Y (MagicaVoxel models are Z-up).
    SwapYZ,
}

impl AxisOrder {
    /// Maps a model point into volume space.
    #[inline]
    #[must_use]
    pub const fn apply(self, p: Point) -> Point {
        match self {
            Self::Identity => p,
            Self::SwapYZ => p.swap_yz(),
        }
    }
}

/// Plain in-memory volume with its own palette.
#[derive(Clone, Debug, Default)]
pub struct PalettedVolume {
    size: Point,
    data: Vec<u8>,
    palette: Palette,
    axis: AxisOrder,
}

impl PalettedVolume {
    /// Creates a zeroed volume of `size`.
    ///
    /// # Panics
    ///
    /// Panics if any component of `size` is negative.
    #[must_use]
    pub fn new(size: Point) -> Self {
        let mut v = Self::default();
        v.resize(size);
        v
    }

    /// Creates an empty decode target that maps sink writes through `axis`.
    #[must_use]
    pub fn with_axis(axis: AxisOrder) -> Self {
        Self {
            axis,
            ..Self::default()
        }
    }

    /// Current extent.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Point {
        self.size
    }

    /// The palette set by the last decode (default palette otherwise).
    #[inline]
    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Replaces the palette.
    pub fn set_palette_colors(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Raw cells in `z, y, x` order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Fills every cell with `value`.
    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn count_voxels(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Resolves the color of the cell at `p` through the palette.
    #[must_use]
    pub fn color_at(&self, p: Point) -> Option<crate::palette::Rgba> {
        match self.get(p) {
            0 => None,
            i => Some(self.palette.get(i)),
        }
    }

    fn resize(&mut self, size: Point) {
        assert!(
            size.x >= 0 && size.y >= 0 && size.z >= 0,
            "negative volume size {size:?}"
        );
        self.size = size;
        self.data.clear();
        self.data
            .resize(size.x as usize * size.y as usize * size.z as usize, 0);
    }

    #[inline]
    fn index(&self, p: Point) -> Option<usize> {
        if !Region::from_size(self.size).contains(p) {
            return None;
        }
        let (sx, sy) = (self.size.x as usize, self.size.y as usize);
        Some(p.z as usize * sx * sy + p.y as usize * sx + p.x as usize)
    }
}

impl Volume for PalettedVolume {
    fn bounds(&self) -> Region {
        Region::from_size(self.size)
    }

    #[inline]
    fn get(&self, p: Point) -> u8 {
        self.index(p).map_or(0, |i| self.data[i])
    }

    #[inline]
    fn set(&mut self, p: Point, value: u8) {
        if let Some(i) = self.index(p) {
            self.data[i] = value;
        }
    }
}

impl VoxelSink for PalettedVolume {
    fn set_bounds(&mut self, bounds: Region) {
        let s = self.axis.apply(bounds.max);
        self.resize(Point::new(s.x.max(0), s.y.max(0), s.z.max(0)));
    }

    fn set_palette(&mut self, palette: &Palette) {
        self.palette = palette.clone();
    }

    fn set_voxel(&mut self, p: Point, index: u8) {
        let q = self.axis.apply(p);
        Volume::set(self, q, index);
    }
}
