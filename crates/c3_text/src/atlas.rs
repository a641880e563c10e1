//! Glyph atlas
//!
//! Packs glyph cells into a fixed-size 8-bit coverage image using shelves.
//! Glyph bitmaps are copied into their cells as they are allocated.

use crate::{Result, TextError};

/// Region in the atlas texture
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AtlasRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRegion {
    /// UV bounds `[u_min, v_min, u_max, v_max]` for an atlas of the given size
    pub fn uv_bounds(&self, atlas_width: u32, atlas_height: u32) -> [f32; 4] {
        let w = atlas_width as f32;
        let h = atlas_height as f32;
        [
            self.x as f32 / w,
            self.y as f32 / h,
            (self.x + self.width) as f32 / w,
            (self.y + self.height) as f32 / h,
        ]
    }
}

#[derive(Debug)]
struct Shelf {
    y: u32,
    height: u32,
    x: u32,
}

/// Shelf-packed glyph atlas
pub struct GlyphAtlas {
    width: u32,
    height: u32,
    shelves: Vec<Shelf>,
    padding: u32,
    allocated: usize,
    /// Coverage, one byte per pixel, top row first
    pixels: Vec<u8>,
}

impl GlyphAtlas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            shelves: Vec::new(),
            padding: 1,
            allocated: 0,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of non-empty regions handed out
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Number of pixels with any coverage
    pub fn coverage(&self) -> usize {
        self.pixels.iter().filter(|&&p| p > 0).count()
    }

    /// Allocate a cell for a `width` x `height` bitmap and copy it in
    ///
    /// `bitmap` is row-major; a short bitmap leaves the rest of the cell blank.
    pub fn insert(&mut self, width: u32, height: u32, bitmap: &[u8]) -> Result<AtlasRegion> {
        let region = self.allocate(width, height)?;
        if region.width == 0 {
            return Ok(region);
        }
        let stride = self.width as usize;
        for (row, src) in bitmap.chunks(width as usize).take(height as usize).enumerate() {
            let start = (region.y as usize + row) * stride + region.x as usize;
            self.pixels[start..start + src.len()].copy_from_slice(src);
        }
        Ok(region)
    }

    /// Fill a `width` x `height` cell with full coverage
    pub fn insert_solid(&mut self, width: u32, height: u32) -> Result<AtlasRegion> {
        let bitmap = vec![u8::MAX; width as usize * height as usize];
        self.insert(width, height, &bitmap)
    }

    /// Reserve a `width` x `height` cell
    ///
    /// Empty cells (whitespace glyphs) get a zero region and use no space.
    pub fn allocate(&mut self, width: u32, height: u32) -> Result<AtlasRegion> {
        if width == 0 || height == 0 {
            return Ok(AtlasRegion::default());
        }
        let padded_width = width + self.padding;
        let padded_height = height + self.padding;
        if padded_width > self.width {
            return Err(TextError::AtlasFull);
        }

        // lowest shelf tall enough with room left
        let fit = self
            .shelves
            .iter_mut()
            .filter(|s| s.height >= padded_height && s.x + padded_width <= self.width)
            .min_by_key(|s| s.y);

        if let Some(shelf) = fit {
            let region = AtlasRegion {
                x: shelf.x,
                y: shelf.y,
                width,
                height,
            };
            shelf.x += padded_width;
            self.allocated += 1;
            return Ok(region);
        }

        let y = self.shelves.last().map(|s| s.y + s.height).unwrap_or(0);
        if y + padded_height > self.height {
            return Err(TextError::AtlasFull);
        }
        self.shelves.push(Shelf {
            y,
            height: padded_height,
            x: padded_width,
        });
        self.allocated += 1;

        Ok(AtlasRegion {
            x: 0,
            y,
            width,
            height,
        })
    }
}

impl std::fmt::Debug for GlyphAtlas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphAtlas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("allocated", &self.allocated)
            .finish()
    }
}
