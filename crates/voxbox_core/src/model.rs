//! # MagicaVoxel Model Loader
//!
//! Streaming decoder for `.vox` files. Decoded data is pushed into any
//! [`VoxelSink`], so the same loader fills a plain [`PalettedVolume`] or
//! the live room grid.
//!
//! ```text
//! "VOX " (4 bytes)  magic
//! version (u32)     150
//! MAIN
//! ├── SIZE          x, y, z (u32 each)
//! ├── XYZI          n (u32), then n × [x, y, z, index]
//! └── RGBA          256 × [r, g, b, a]   (optional)
//! ```
//!
//! Only the first model of a multi-model file is decoded; other chunks are
//! skipped without seeking, so any `Read` works as a source. Voxels are
//! buffered until the end of `MAIN` so the sink always sees
//! `set_bounds` → `set_palette` → `set_voxel`*.
//!
//! [`PalettedVolume`]: crate::volume::PalettedVolume

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::error::{VoxError, VoxResult};
use crate::palette::{Palette, Rgba};
use crate::volume::{Point, Region, VoxelSink};

/// File magic.
const VOX_MAGIC: [u8; 4] = *b"VOX ";

/// Version written by current MagicaVoxel releases.
pub const VOX_VERSION: u32 = 150;

/// Largest extent MagicaVoxel produces along one axis.
pub const MAX_MODEL_EXTENT: u32 = 256;

/// Summary of a decoded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    /// Extent in model coordinates.
    pub size: Point,
    /// Voxels pushed into the sink.
    pub voxel_count: usize,
}

/// `.vox` decoder.
pub struct ModelLoader;

impl ModelLoader {
    /// Decodes a model from `reader` into `sink`.
    ///
    /// # Errors
    ///
    /// Returns a [`VoxError`] for bad magic, unsupported versions, truncated
    /// data, inconsistent chunks or a missing `SIZE`/`XYZI` chunk. Nothing is
    /// written to the sink unless the whole `MAIN` chunk decoded.
    pub fn decode<R, S>(mut reader: R, sink: &mut S) -> VoxResult<ModelInfo>
    where
        R: Read,
        S: VoxelSink + ?Sized,
    {
        let raw = Self::parse(&mut reader)?;

        sink.set_bounds(Region::from_size(raw.size));
        sink.set_palette(&raw.palette);
        for v in &raw.voxels {
            sink.set_voxel(Point::new(i32::from(v[0]), i32::from(v[1]), i32::from(v[2])), v[3]);
        }

        Ok(ModelInfo {
            size: raw.size,
            voxel_count: raw.voxels.len(),
        })
    }

    /// Opens `path` and decodes it into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`VoxError::Io`] if the file cannot be opened, otherwise the
    /// errors of [`ModelLoader::decode`].
    pub fn decode_file<P, S>(path: P, sink: &mut S) -> VoxResult<ModelInfo>
    where
        P: AsRef<Path>,
        S: VoxelSink + ?Sized,
    {
        let file = File::open(path).map_err(VoxError::Io)?;
        Self::decode(BufReader::new(file), sink)
    }

    fn parse<R: Read>(reader: &mut R) -> VoxResult<RawModel> {
        let magic = read_id(reader)?;
        if magic != VOX_MAGIC {
            return Err(VoxError::InvalidMagic(magic));
        }

        let version = read_u32(reader)?;
        if !(VOX_VERSION..=200).contains(&version) {
            return Err(VoxError::UnsupportedVersion(version));
        }

        let main = ChunkHeader::read(reader)?;
        if main.id != *b"MAIN" {
            return Err(invalid(main.id, "expected MAIN as the root chunk"));
        }
        skip(reader, u64::from(main.content))?;

        let mut size = None;
        let mut voxels = None;
        let mut palette = Palette::default();
        let mut remaining = u64::from(main.children);

        while remaining > 0 {
            let chunk = ChunkHeader::read(reader)?;
            let total = ChunkHeader::LEN + u64::from(chunk.content) + u64::from(chunk.children);
            if total > remaining {
                return Err(invalid(chunk.id, "chunk overruns MAIN"));
            }
            remaining -= total;

            match &chunk.id {
                b"SIZE" if size.is_none() => {
                    size = Some(read_size(reader, &chunk)?);
                }
                b"XYZI" if voxels.is_none() => {
                    let bounds = size.ok_or(VoxError::MissingChunk("SIZE"))?;
                    voxels = Some(read_voxels(reader, &chunk, bounds)?);
                }
                b"RGBA" => {
                    palette = read_palette(reader, &chunk)?;
                }
                _ => {
                    skip(reader, u64::from(chunk.content) + u64::from(chunk.children))?;
                }
            }
        }

        Ok(RawModel {
            size: size.ok_or(VoxError::MissingChunk("SIZE"))?,
            voxels: voxels.ok_or(VoxError::MissingChunk("XYZI"))?,
            palette,
        })
    }
}

struct RawModel {
    size: Point,
    voxels: Vec<[u8; 4]>,
    palette: Palette,
}

struct ChunkHeader {
    id: [u8; 4],
    content: u32,
    children: u32,
}

impl ChunkHeader {
    const LEN: u64 = 12;

    fn read<R: Read>(reader: &mut R) -> VoxResult<Self> {
        Ok(Self {
            id: read_id(reader)?,
            content: read_u32(reader)?,
            children: read_u32(reader)?,
        })
    }
}

fn read_size<R: Read>(reader: &mut R, chunk: &ChunkHeader) -> VoxResult<Point> {
    if chunk.content < 12 {
        return Err(invalid(chunk.id, "SIZE content shorter than 12 bytes"));
    }
    let x = read_u32(reader)?;
    let y = read_u32(reader)?;
    let z = read_u32(reader)?;
    skip(reader, u64::from(chunk.content - 12) + u64::from(chunk.children))?;

    for extent in [x, y, z] {
        if extent == 0 || extent > MAX_MODEL_EXTENT {
            return Err(invalid(chunk.id, format!("extent {extent} outside 1..={MAX_MODEL_EXTENT}")));
        }
    }
    // Bounded by MAX_MODEL_EXTENT above.
    Ok(Point::new(x as i32, y as i32, z as i32))
}

fn read_voxels<R: Read>(reader: &mut R, chunk: &ChunkHeader, bounds: Point) -> VoxResult<Vec<[u8; 4]>> {
    if chunk.content < 4 {
        return Err(invalid(chunk.id, "XYZI content shorter than 4 bytes"));
    }
    let count = read_u32(reader)?;
    if u64::from(count) * 4 + 4 != u64::from(chunk.content) {
        return Err(invalid(chunk.id, format!("{count} voxels do not fill {} bytes", chunk.content)));
    }

    let region = Region::from_size(bounds);
    // The header count is untrusted until the data is read.
    let cells = region.volume();
    let mut voxels = Vec::with_capacity((count as usize).min(cells));
    for _ in 0..count {
        let mut v = [0u8; 4];
        reader.read_exact(&mut v)?;
        let p = Point::new(i32::from(v[0]), i32::from(v[1]), i32::from(v[2]));
        if !region.contains(p) {
            return Err(invalid(chunk.id, format!("voxel {p:?} outside model bounds {bounds:?}")));
        }
        voxels.push(v);
    }
    skip(reader, u64::from(chunk.children))?;
    Ok(voxels)
}

fn read_palette<R: Read>(reader: &mut R, chunk: &ChunkHeader) -> VoxResult<Palette> {
    if chunk.content != 256 * 4 {
        return Err(invalid(chunk.id, format!("expected 1024 bytes, got {}", chunk.content)));
    }
    let mut palette = Palette::default();
    // Entry i of the chunk describes color index i + 1; the last entry is unused.
    for index in 1..=255u8 {
        let mut c = [0u8; 4];
        reader.read_exact(&mut c)?;
        palette.set(index, Rgba::new(c[0], c[1], c[2], c[3]));
    }
    skip(reader, 4 + u64::from(chunk.children))?;
    Ok(palette)
}

fn read_id<R: Read>(reader: &mut R) -> VoxResult<[u8; 4]> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_u32<R: Read>(reader: &mut R) -> VoxResult<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn skip<R: Read>(reader: &mut R, n: u64) -> VoxResult<()> {
    if n == 0 {
        return Ok(());
    }
    let copied = io::copy(&mut reader.take(n), &mut io::sink())?;
    if copied < n {
        return Err(VoxError::Truncated);
    }
    Ok(())
}

fn invalid(id: [u8; 4], reason: impl Into<String>) -> VoxError {
    VoxError::InvalidChunk {
        id: String::from_utf8_lossy(&id).into_owned(),
        reason: reason.into(),
    }
}

// =============================================================================
// WRITER
// =============================================================================

/// Minimal `.vox` encoder (single model, optional palette).
///
/// Used to produce fixtures and to export room contents.
#[derive(Debug, Clone, Default)]
pub struct ModelWriter {
    size: [u32; 3],
    voxels: Vec<[u8; 4]>,
    palette: Option<Palette>,
}

impl ModelWriter {
    /// Starts a model of the given extent (model coordinates, Z-up).
    #[must_use]
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self {
            size: [x, y, z],
            ..Self::default()
        }
    }

    /// Adds one voxel.
    #[must_use]
    pub fn voxel(mut self, x: u8, y: u8, z: u8, index: u8) -> Self {
        self.voxels.push([x, y, z, index]);
        self
    }

    /// Emits an `RGBA` chunk with `palette`.
    #[must_use]
    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Serializes the model.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut children = Vec::new();

        push_chunk(&mut children, b"SIZE", |b| {
            for s in self.size {
                b.extend_from_slice(&s.to_le_bytes());
            }
        });
        push_chunk(&mut children, b"XYZI", |b| {
            b.extend_from_slice(&(self.voxels.len() as u32).to_le_bytes());
            for v in &self.voxels {
                b.extend_from_slice(v);
            }
        });
        if let Some(palette) = &self.palette {
            push_chunk(&mut children, b"RGBA", |b| {
                for index in 1..=255u8 {
                    let c = palette.get(index);
                    b.extend_from_slice(&[c.r, c.g, c.b, c.a]);
                }
                b.extend_from_slice(&[0; 4]);
            });
        }

        let mut out = Vec::with_capacity(20 + children.len());
        out.extend_from_slice(&VOX_MAGIC);
        out.extend_from_slice(&VOX_VERSION.to_le_bytes());
        out.extend_from_slice(b"MAIN");
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(children.len() as u32).to_le_bytes());
        out.extend_from_slice(&children);
        out
    }
}

fn push_chunk(out: &mut Vec<u8>, id: &[u8; 4], fill: impl FnOnce(&mut Vec<u8>)) {
    let mut content = Vec::new();
    fill(&mut content);
    out.extend_from_slice(id);
    out.extend_from_slice(&(content.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&content);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::{AxisOrder, PalettedVolume, Volume};

    /// Records sink calls in order.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl VoxelSink for Recorder {
        fn set_bounds(&mut self, bounds: Region) {
            self.calls.push(format!("bounds {:?}", bounds.max));
        }
        fn set_palette(&mut self, _palette: &Palette) {
            self.calls.push("palette".to_string());
        }
        fn set_voxel(&mut self, p: Point, index: u8) {
            self.calls.push(format!("set {} {} {} {index}", p.x, p.y, p.z));
        }
    }

    fn two_voxels() -> Vec<u8> {
        ModelWriter::new(2, 3, 4).voxel(0, 0, 0, 1).voxel(1, 2, 3, 9).to_bytes()
    }

    #[test]
    fn test_sink_call_order() {
        let mut rec = Recorder::default();
        let info = ModelLoader::decode(two_voxels().as_slice(), &mut rec).unwrap();
        assert_eq!(info.voxel_count, 2);
        assert_eq!(info.size, Point::new(2, 3, 4));
        assert_eq!(
            rec.calls,
            vec![
                "bounds Point { x: 2, y: 3, z: 4 }".to_string(),
                "palette".to_string(),
                "set 0 0 0 1".to_string(),
                "set 1 2 3 9".to_string(),
            ]
        );
    }

    #[test]
    fn test_decode_into_swapped_volume() {
        let mut vol = PalettedVolume::with_axis(AxisOrder::SwapYZ);
        ModelLoader::decode(two_voxels().as_slice(), &mut vol).unwrap();
        assert_eq!(vol.size(), Point::new(2, 4, 3));
        assert_eq!(vol.get(Point::new(1, 3, 2)), 9);
        assert_eq!(vol.count_voxels(), 2);
    }

    #[test]
    fn test_custom_palette_is_shifted_by_one() {
        let mut palette = Palette::default();
        palette.set(1, Rgba::new(10, 20, 30, 255));
        let bytes = ModelWriter::new(1, 1, 1).voxel(0, 0, 0, 1).palette(palette).to_bytes();

        let mut vol = PalettedVolume::default();
        ModelLoader::decode(bytes.as_slice(), &mut vol).unwrap();
        assert_eq!(vol.palette().get(1), Rgba::new(10, 20, 30, 255));
        assert_eq!(vol.color_at(Point::ZERO), Some(Rgba::new(10, 20, 30, 255)));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = two_voxels();
        bytes[0] = b'X';
        let err = ModelLoader::decode(bytes.as_slice(), &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, VoxError::InvalidMagic(_)));
    }

    #[test]
    fn test_truncated_leaves_sink_untouched() {
        let bytes = two_voxels();
        let mut rec = Recorder::default();
        let err = ModelLoader::decode(&bytes[..bytes.len() - 3], &mut rec).unwrap_err();
        assert!(matches!(err, VoxError::Truncated));
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_huge_voxel_count_is_truncated() {
        let mut bytes = ModelWriter::new(1, 1, 1).voxel(0, 0, 0, 1).to_bytes();
        bytes.truncate(60);
        let count: u32 = 1 << 28;
        let content = count * 4 + 4;
        bytes[16..20].copy_from_slice(&(24 + 12 + content).to_le_bytes());
        bytes[48..52].copy_from_slice(&content.to_le_bytes());
        bytes[56..60].copy_from_slice(&count.to_le_bytes());

        let err = ModelLoader::decode(bytes.as_slice(), &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, VoxError::Truncated));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = two_voxels();
        bytes[4..8].copy_from_slice(&90u32.to_le_bytes());
        let err = ModelLoader::decode(bytes.as_slice(), &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, VoxError::UnsupportedVersion(90)));
    }

    #[test]
    fn test_zero_extent_is_invalid() {
        let bytes = ModelWriter::new(0, 1, 1).to_bytes();
        let err = ModelLoader::decode(bytes.as_slice(), &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, VoxError::InvalidChunk { .. }));
    }

    #[test]
    fn test_voxel_outside_bounds_is_invalid() {
        let bytes = ModelWriter::new(1, 1, 1).voxel(1, 0, 0, 3).to_bytes();
        let err = ModelLoader::decode(bytes.as_slice(), &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, VoxError::InvalidChunk { .. }));
    }

    #[test]
    fn test_missing_xyzi() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"VOX ");
        bytes.extend_from_slice(&150u32.to_le_bytes());
        let mut children = Vec::new();
        push_chunk(&mut children, b"SIZE", |b| {
            for s in [1u32, 1, 1] {
                b.extend_from_slice(&s.to_le_bytes());
            }
        });
        bytes.extend_from_slice(b"MAIN");
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&(children.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&children);

        let err = ModelLoader::decode(bytes.as_slice(), &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, VoxError::MissingChunk("XYZI")));
    }

    #[test]
    fn test_unknown_chunks_are_skipped() {
        let model = two_voxels();
        // Splice a "nTRN" chunk in front of SIZE.
        let mut extra = Vec::new();
        push_chunk(&mut extra, b"nTRN", |b| b.extend_from_slice(&[7; 10]));
        let children_len = u32::from_le_bytes([model[16], model[17], model[18], model[19]]);

        let mut bytes = model[..16].to_vec();
        bytes.extend_from_slice(&(children_len + extra.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&extra);
        bytes.extend_from_slice(&model[20..]);

        let mut vol = PalettedVolume::default();
        let info = ModelLoader::decode(bytes.as_slice(), &mut vol).unwrap();
        assert_eq!(info.voxel_count, 2);
    }

    #[test]
    fn test_decode_file_missing_path() {
        let err = ModelLoader::decode_file("/nonexistent/voxbox/model.vox", &mut Recorder::default())
            .unwrap_err();
        assert!(matches!(err, VoxError::Io(_)));
    }
}
