//! Text support for the c3 scene graph
//!
//! This crate provides:
//! - Font loading and glyph metrics (TTF/OTF via ttf-parser)
//! - Glyph rasterization (swash) into a luminance atlas
//! - Single-line text run layout with kerning and alignment
//! - A shared font cache with deterministic release

pub mod atlas;
pub mod cache;
pub mod font;
pub mod layout;
pub mod rasterizer;

pub use atlas::{AtlasRegion, GlyphAtlas};
pub use cache::FontCache;
pub use font::{Font, FontFace, GlyphInfo, GlyphMetrics};
pub use layout::{layout_run, GlyphQuad, TextAlign, TextRun};
pub use rasterizer::{GlyphRasterizer, RasterizedGlyph};

use thiserror::Error;

/// Text errors
#[derive(Error, Debug)]
pub enum TextError {
    #[error("Failed to load font: {0}")]
    FontLoad(String),

    #[error("Failed to parse font: {0}")]
    FontParse(String),

    #[error("Text has no renderable glyphs")]
    EmptyText,

    #[error("Atlas is full, cannot allocate glyph")]
    AtlasFull,
}

pub type Result<T> = std::result::Result<T, TextError>;
