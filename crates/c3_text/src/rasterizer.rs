//! Glyph rasterization using swash
//!
//! Renders glyph outlines to 8-bit coverage bitmaps for the glyph atlas.

use crate::font::FontFace;
use crate::{Result, TextError};
use swash::scale::{Render, ScaleContext, Source};
use swash::zeno::Format;

/// Coverage bitmap of one glyph, top row first
#[derive(Debug, Clone, Default)]
pub struct RasterizedGlyph {
    pub bitmap: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Offset from the pen position to the left edge
    pub left: i32,
    /// Offset from the baseline up to the top edge
    pub top: i32,
}

pub struct GlyphRasterizer {
    scale_context: ScaleContext,
}

impl GlyphRasterizer {
    pub fn new() -> Self {
        Self {
            scale_context: ScaleContext::new(),
        }
    }

    /// Rasterize `glyph_id` of `font` at `font_size` pixels
    ///
    /// Glyphs without an outline (whitespace) come back empty.
    pub fn rasterize(
        &mut self,
        font: &FontFace,
        glyph_id: u16,
        font_size: f32,
    ) -> Result<RasterizedGlyph> {
        let swash_font = swash::FontRef::from_index(font.data(), font.face_index() as usize)
            .ok_or_else(|| TextError::FontParse(font.family_name().to_string()))?;
        let mut scaler = self
            .scale_context
            .builder(swash_font)
            .size(font_size)
            .build();

        let mut render = Render::new(&[Source::Outline]);
        render.format(Format::Alpha);

        Ok(match render.render(&mut scaler, glyph_id) {
            Some(img) => RasterizedGlyph {
                bitmap: img.data,
                width: img.placement.width,
                height: img.placement.height,
                left: img.placement.left,
                top: img.placement.top,
            },
            None => RasterizedGlyph::default(),
        })
    }
}

impl Default for GlyphRasterizer {
    fn default() -> Self {
        Self::new()
    }
}
