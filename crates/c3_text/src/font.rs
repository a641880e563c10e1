//! Font loading and glyph metrics
//!
//! Provides font parsing via ttf-parser and the per-size glyph tables used by
//! text layout.

use crate::atlas::GlyphAtlas;
use crate::rasterizer::GlyphRasterizer;
use crate::{Result, TextError};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Characters whose glyphs are laid out in the atlas when a font is created
pub const PRELOAD_CHARSET: &str = " !\"#$%&'()*+,-./0123456789:;<=>?\
                                   @ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_\
                                   `abcdefghijklmnopqrstuvwxyz{|}~";

/// Atlas edge length used for a font's glyph cells
pub const DEFAULT_ATLAS_SIZE: u32 = 512;

/// Metrics of one glyph at a given pixel size
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlyphInfo {
    /// Horizontal advance to the next pen position
    pub advance: f32,
    /// Ink box width
    pub width: f32,
    /// Ink box height
    pub height: f32,
    /// Offset from the pen position to the left edge
    pub bearing_x: f32,
    /// Offset from the baseline up to the top edge
    pub bearing_y: f32,
    /// Atlas UV bounds `[u_min, v_min, u_max, v_max]`
    pub uv: [f32; 4],
}

/// Glyph metrics lookup used by text layout
pub trait GlyphMetrics: Send + Sync + std::fmt::Debug {
    /// Metrics for `ch`, or `None` when the font has no glyph for it
    fn glyph(&self, ch: char) -> Option<GlyphInfo>;

    /// Pen adjustment between two consecutive characters
    fn kerning(&self, left: char, right: char) -> f32;
}

/// A parsed font face
pub struct FontFace {
    /// Raw font data (kept alive for ttf-parser)
    data: Arc<Vec<u8>>,
    face_index: u32,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    family_name: String,
}

impl FontFace {
    /// Load a font from raw TTF/OTF data (face index 0)
    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        Self::from_data_with_index(data, 0)
    }

    pub fn from_data_with_index(data: Vec<u8>, face_index: u32) -> Result<Self> {
        let data = Arc::new(data);

        let face = ttf_parser::Face::parse(&data, face_index)
            .map_err(|e| TextError::FontParse(format!("{:?}", e)))?;

        let family_name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::FAMILY)
            .and_then(|n| n.to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();

        Ok(Self {
            data,
            face_index,
            units_per_em,
            ascender,
            descender,
            family_name,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| TextError::FontLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_data(data)
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    /// Re-parse the face for glyph queries; parsing only reads table offsets
    pub(crate) fn as_ttf_face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.face_index).ok()
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family_name", &self.family_name)
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

/// A face instantiated at one pixel size
pub struct Font {
    name: String,
    size: f32,
    face: Option<FontFace>,
    scale: f32,
    line_height: f32,
    glyphs: FxHashMap<char, GlyphInfo>,
    atlas: GlyphAtlas,
}

impl Font {
    /// Load `path` at `size` pixels
    pub fn load(path: impl AsRef<Path>, size: f32) -> Result<Self> {
        let path = path.as_ref();
        let face = FontFace::from_file(path)?;
        Self::from_face(path.to_string_lossy().into_owned(), face, size)
    }

    /// Instantiate `face` at `size` pixels, rasterizing [`PRELOAD_CHARSET`]
    /// into the atlas
    pub fn from_face(name: impl Into<String>, face: FontFace, size: f32) -> Result<Self> {
        let name = name.into();
        let ttf = face
            .as_ttf_face()
            .ok_or_else(|| TextError::FontParse(name.clone()))?;
        let scale = size / face.units_per_em.max(1) as f32;
        let mut atlas = GlyphAtlas::new(DEFAULT_ATLAS_SIZE, DEFAULT_ATLAS_SIZE);
        let (aw, ah) = atlas.dimensions();
        let mut rasterizer = GlyphRasterizer::new();
        let mut glyphs = FxHashMap::default();

        for ch in PRELOAD_CHARSET.chars() {
            let Some(id) = ttf.glyph_index(ch) else {
                debug!("{}: no glyph for {:?}", name, ch);
                continue;
            };
            let advance = ttf.glyph_hor_advance(id).unwrap_or(0) as f32 * scale;
            let bitmap = rasterizer.rasterize(&face, id.0, size)?;
            let region = atlas.insert(bitmap.width, bitmap.height, &bitmap.bitmap)?;
            glyphs.insert(
                ch,
                GlyphInfo {
                    advance,
                    width: bitmap.width as f32,
                    height: bitmap.height as f32,
                    bearing_x: bitmap.left as f32,
                    bearing_y: bitmap.top as f32,
                    uv: region.uv_bounds(aw, ah),
                },
            );
        }
        let line_height = (face.ascender - face.descender) as f32 * scale;
        debug!(
            "font {} at {}px: {} glyphs, {} px of coverage",
            name,
            size,
            glyphs.len(),
            atlas.coverage()
        );

        Ok(Self {
            name,
            size,
            face: Some(face),
            scale,
            line_height,
            glyphs,
            atlas,
        })
    }

    /// Fixed-pitch box font covering [`PRELOAD_CHARSET`]
    ///
    /// Used when a font file cannot be loaded. Every glyph is a solid cell.
    pub fn monospace_fallback(size: f32) -> Self {
        let mut atlas = GlyphAtlas::new(DEFAULT_ATLAS_SIZE, DEFAULT_ATLAS_SIZE);
        let (aw, ah) = atlas.dimensions();
        let cell_w = size * 0.5;
        let cell_h = size * 0.7;
        let mut glyphs = FxHashMap::default();
        for ch in PRELOAD_CHARSET.chars() {
            let (width, height) = if ch == ' ' { (0.0, 0.0) } else { (cell_w, cell_h) };
            let uv = atlas
                .insert_solid(width.ceil() as u32, height.ceil() as u32)
                .map(|r| r.uv_bounds(aw, ah))
                .unwrap_or_default();
            glyphs.insert(
                ch,
                GlyphInfo {
                    advance: size * 0.6,
                    width,
                    height,
                    bearing_x: 0.0,
                    bearing_y: height,
                    uv,
                },
            );
        }
        Self {
            name: format!("<fallback {}>", size),
            size,
            face: None,
            scale: 1.0,
            line_height: size,
            glyphs,
            atlas,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    pub fn face(&self) -> Option<&FontFace> {
        self.face.as_ref()
    }
}

impl GlyphMetrics for Font {
    fn glyph(&self, ch: char) -> Option<GlyphInfo> {
        self.glyphs.get(&ch).copied()
    }

    fn kerning(&self, left: char, right: char) -> f32 {
        let Some(ttf) = self.face.as_ref().and_then(|f| f.as_ttf_face()) else {
            return 0.0;
        };
        let (Some(l), Some(r)) = (ttf.glyph_index(left), ttf.glyph_index(right)) else {
            return 0.0;
        };
        let Some(kern) = ttf.tables().kern else {
            return 0.0;
        };
        kern.subtables
            .into_iter()
            .filter(|st| st.horizontal && !st.variable)
            .find_map(|st| st.glyphs_kerning(l, r))
            .map(|k| k as f32 * self.scale)
            .unwrap_or(0.0)
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("glyphs", &self.glyphs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_covers_charset() {
        let font = Font::monospace_fallback(20.0);
        assert_eq!(font.glyph_count(), PRELOAD_CHARSET.chars().count());
        let a = font.glyph('A').unwrap();
        assert_eq!(a.advance, 12.0);
        assert_eq!(a.width, 10.0);
        assert!(font.glyph('\u{00e9}').is_none());
        assert_eq!(font.kerning('A', 'V'), 0.0);
    }

    #[test]
    fn test_fallback_space_has_no_ink() {
        let font = Font::monospace_fallback(20.0);
        let space = font.glyph(' ').unwrap();
        assert_eq!(space.width, 0.0);
        assert!(space.advance > 0.0);
    }

    #[test]
    fn test_fallback_atlas_has_coverage() {
        let font = Font::monospace_fallback(20.0);
        let (aw, ah) = font.atlas().dimensions();
        assert_eq!(font.atlas().pixels().len(), (aw * ah) as usize);
        let a = font.glyph('A').unwrap();
        let cell = (a.width.ceil() * a.height.ceil()) as usize;
        let ink = PRELOAD_CHARSET.chars().filter(|&c| c != ' ').count();
        assert_eq!(font.atlas().coverage(), ink * cell);

        let x = (a.uv[0] * aw as f32) as usize;
        let y = (a.uv[1] * ah as f32) as usize;
        assert_eq!(font.atlas().pixels()[y * aw as usize + x], u8::MAX);
    }

    #[test]
    fn test_parse_garbage_fails() {
        let err = FontFace::from_data(vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, TextError::FontParse(_)));
    }

    #[test]
    fn test_missing_file_fails() {
        let err = Font::load("/nonexistent/c3/font.ttf", 12.0).unwrap_err();
        assert!(matches!(err, TextError::FontLoad(_)));
    }
}
