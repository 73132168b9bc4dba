//! CPU side of the palette texture.
//!
//! ```text
//!            color index 0 ........... 255
//! palette 0  [r g b][r g b] ... [r g b]      row = 256 × 3 bytes
//! palette 1  ...
//!   ...
//! palette 255
//! ```

use voxbox_core::Palette;

use crate::error::{RenderError, RenderResult};

/// Palettes per image (texture rows).
pub const MAX_PALETTES: usize = 256;

/// Colors per palette (texture columns).
pub const PALETTE_COLORS: usize = 256;

/// Packed RGB table of up to 256 palettes.
#[derive(Debug, Clone)]
pub struct PaletteImage {
    data: Vec<u8>,
    count: usize,
}

impl Default for PaletteImage {
    fn default() -> Self {
        Self {
            data: vec![0; MAX_PALETTES * PALETTE_COLORS * 3],
            count: 0,
        }
    }
}

impl PaletteImage {
    /// Byte offset of `color` in `palette`.
    #[inline]
    #[must_use]
    pub const fn offset(palette: usize, color: usize) -> usize {
        palette * PALETTE_COLORS * 3 + color * 3
    }

    /// Replaces the image contents with `palettes`; unused rows are black.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::TooManyPalettes`] for more than 256 palettes.
    pub fn set_palettes(&mut self, palettes: &[Palette]) -> RenderResult<()> {
        if palettes.len() > MAX_PALETTES {
            return Err(RenderError::TooManyPalettes(palettes.len()));
        }
        self.data.fill(0);
        for (p, palette) in palettes.iter().enumerate() {
            for (c, color) in palette.colors().iter().enumerate() {
                let at = Self::offset(p, c);
                self.data[at..at + 3].copy_from_slice(&color.rgb());
            }
        }
        self.count = palettes.len();
        Ok(())
    }

    /// Number of palettes set.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// True if no palette was set.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `[r, g, b]` of `color` in `palette`.
    #[must_use]
    pub fn rgb(&self, palette: usize, color: u8) -> [u8; 3] {
        let at = Self::offset(palette, usize::from(color));
        [self.data[at], self.data[at + 1], self.data[at + 2]]
    }

    /// Raw RGB bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// RGBA copy for texture upload (alpha = 255).
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            .flat_map(|c| [c[0], c[1], c[2], 255])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxbox_core::Rgba;

    #[test]
    fn test_layout_offsets() {
        assert_eq!(PaletteImage::offset(0, 0), 0);
        assert_eq!(PaletteImage::offset(0, 1), 3);
        assert_eq!(PaletteImage::offset(2, 5), 2 * 768 + 15);
    }

    #[test]
    fn test_second_palette_lands_on_second_row() {
        let mut second = Palette::default();
        second.set(7, Rgba::new(1, 2, 3, 255));
        let mut image = PaletteImage::default();
        image
            .set_palettes(&[Palette::default(), second])
            .unwrap();
        assert_eq!(image.len(), 2);
        assert_eq!(image.rgb(1, 7), [1, 2, 3]);
        assert_eq!(image.rgb(0, 1), [255, 255, 255]);
        assert_eq!(image.rgb(2, 1), [0, 0, 0]);
    }

    #[test]
    fn test_too_many_palettes() {
        let palettes = vec![Palette::default(); 257];
        let mut image = PaletteImage::default();
        assert!(matches!(
            image.set_palettes(&palettes),
            Err(RenderError::TooManyPalettes(257))
        ));
    }

    #[test]
    fn test_rgba_expansion() {
        let image = PaletteImage::default();
        assert_eq!(image.to_rgba8().len(), 256 * 256 * 4);
    }
}
