//! Cube faces and their vertex streams.
//!
//! ```text
//!     3 ──────── 2          corners (x, y, z)
//!     │╲         │╲         0 (0,0,1)   4 (0,0,0)
//!     │ 7 ──────── 6        1 (1,0,1)   5 (1,0,0)
//!     0 │─────── 1 │        2 (1,1,1)   6 (1,1,0)
//!      ╲│         ╲│        3 (0,1,1)   7 (0,1,0)
//!       4 ──────── 5
//! ```

use bytemuck::{Pod, Zeroable};

use voxbox_core::{Point, Volume};
use voxbox_shared::Vec3;

/// Unit cube corners.
const CUBE_CORNERS: [[u8; 3]; 8] = [
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
];

/// Direction of a face group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// +X
    PosX,
    /// -X
    NegX,
    /// -Y
    NegY,
    /// +Y
    PosY,
    /// +Z
    PosZ,
    /// -Z
    NegZ,
}

impl Face {
    /// All faces, in draw order.
    pub const ALL: [Self; 6] = [Self::PosX, Self::NegX, Self::NegY, Self::PosY, Self::PosZ, Self::NegZ];

    /// Position in [`Face::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Integer outward normal.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> Point {
        match self {
            Self::PosX => Point::new(1, 0, 0),
            Self::NegX => Point::new(-1, 0, 0),
            Self::NegY => Point::new(0, -1, 0),
            Self::PosY => Point::new(0, 1, 0),
            Self::PosZ => Point::new(0, 0, 1),
            Self::NegZ => Point::new(0, 0, -1),
        }
    }

    /// Outward unit normal.
    #[must_use]
    pub fn normal(self) -> Vec3 {
        let o = self.offset();
        Vec3::new(o.x as f32, o.y as f32, o.z as f32)
    }

    /// Corner indices of the two triangles of this face.
    #[must_use]
    pub const fn corners(self) -> [usize; 6] {
        match self {
            Self::PosX => [1, 5, 6, 6, 2, 1],
            Self::NegX => [4, 0, 3, 3, 7, 4],
            Self::NegY => [4, 5, 1, 1, 0, 4],
            Self::PosY => [3, 2, 6, 6, 7, 3],
            Self::PosZ => [0, 1, 2, 2, 3, 0],
            Self::NegZ => [7, 6, 5, 5, 4, 7],
        }
    }
}

/// One vertex: corner position plus the palette index of its voxel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct FaceVertex {
    /// X
    pub x: u8,
    /// Y
    pub y: u8,
    /// Z
    pub z: u8,
    /// Palette index
    pub color: u8,
}

/// Vertex stream of one face group.
#[derive(Debug, Clone)]
pub struct FaceBuffer {
    face: Face,
    vertices: Vec<FaceVertex>,
}

impl FaceBuffer {
    /// Empty buffer for `face`.
    #[must_use]
    pub const fn new(face: Face) -> Self {
        Self {
            face,
            vertices: Vec::new(),
        }
    }

    /// Face this buffer holds.
    #[inline]
    #[must_use]
    pub const fn face(&self) -> Face {
        self.face
    }

    /// Vertices, six per quad.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[FaceVertex] {
        &self.vertices
    }

    /// Number of quads.
    #[inline]
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 6
    }

    /// Drops all vertices, keeping the allocation.
    pub fn reset(&mut self) {
        self.vertices.clear();
    }

    /// Appends the quad for the voxel at `(x, y, z)`.
    pub fn append(&mut self, x: u8, y: u8, z: u8, color: u8) {
        for corner in self.face.corners() {
            let [cx, cy, cz] = CUBE_CORNERS[corner];
            self.vertices.push(FaceVertex {
                x: x + cx,
                y: y + cy,
                z: z + cz,
                color,
            });
        }
    }

    /// Resets and refills from every exposed face of `volume`, scanning in
    /// `z, y, x` order.
    ///
    /// Coordinates must fit `u8` after adding one; the view checks this.
    pub fn rebuild<V: Volume + ?Sized>(&mut self, volume: &V) {
        self.reset();
        let normal = self.face.offset();
        volume.bounds().for_each(|p| {
            let color = volume.get(p);
            if color == 0 || !is_exposed(volume, p, normal) {
                return;
            }
            // Bounds are validated to 0..=254 per axis.
            self.append(p.x as u8, p.y as u8, p.z as u8, color);
        });
    }
}

/// True if the neighbour of `p` along `normal` is outside or empty.
#[inline]
pub fn is_exposed<V: Volume + ?Sized>(volume: &V, p: Point, normal: Point) -> bool {
    let n = p.add(normal);
    !volume.bounds().contains(n) || volume.get(n) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_has_six_vertices() {
        let mut b = FaceBuffer::new(Face::PosX);
        b.append(2, 3, 4, 9);
        assert_eq!(b.vertices().len(), 6);
        assert_eq!(b.quad_count(), 1);
        // +X face lies on x + 1.
        assert!(b.vertices().iter().all(|v| v.x == 3 && v.color == 9));
    }

    #[test]
    fn test_face_corners_lie_on_their_plane() {
        for face in Face::ALL {
            let o = face.offset();
            let mut b = FaceBuffer::new(face);
            b.append(0, 0, 0, 1);
            for v in b.vertices() {
                let pos = [i32::from(v.x), i32::from(v.y), i32::from(v.z)];
                let (axis, side) = match (o.x, o.y, o.z) {
                    (1, _, _) => (0, 1),
                    (-1, _, _) => (0, 0),
                    (_, 1, _) => (1, 1),
                    (_, -1, _) => (1, 0),
                    (_, _, 1) => (2, 1),
                    _ => (2, 0),
                };
                assert_eq!(pos[axis], side, "{face:?}");
            }
        }
    }

    #[test]
    fn test_reset_keeps_face() {
        let mut b = FaceBuffer::new(Face::NegZ);
        b.append(0, 0, 0, 1);
        b.reset();
        assert!(b.vertices().is_empty());
        assert_eq!(b.face(), Face::NegZ);
    }

    #[test]
    fn test_vertex_is_four_bytes() {
        assert_eq!(std::mem::size_of::<FaceVertex>(), 4);
    }
}
