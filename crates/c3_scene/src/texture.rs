//! Textures and the shared texture cache

use crate::error::Result;
use c3_core::Color;
use c3_text::Font;
use image::{DynamicImage, GenericImageView};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pixel layout of a decoded texture
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    #[default]
    Rgba,
    Rgb,
    Luminance,
    /// Alpha channel only, used for masks such as the line texture
    Alpha,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba => 4,
            PixelFormat::Rgb => 3,
            PixelFormat::Luminance | PixelFormat::Alpha => 1,
        }
    }
}

/// Decoded texture pixels, top row first
#[derive(Clone, PartialEq)]
pub struct Texture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pixels: Vec<u8>,
}

impl Texture {
    /// Decode the image at `path` into `format`
    pub fn load(path: impl AsRef<Path>, format: PixelFormat) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let img = image::load_from_memory(&bytes)?;
        Ok(Self::from_image(path.to_string_lossy(), &img, format))
    }

    pub fn from_image(name: impl Into<String>, img: &DynamicImage, format: PixelFormat) -> Self {
        let (width, height) = img.dimensions();
        let pixels = match format {
            PixelFormat::Rgba => img.to_rgba8().into_raw(),
            PixelFormat::Rgb => img.to_rgb8().into_raw(),
            PixelFormat::Luminance => img.to_luma8().into_raw(),
            PixelFormat::Alpha => img.to_rgba8().pixels().map(|p| p.0[3]).collect(),
        };
        Self {
            name: name.into(),
            width,
            height,
            format,
            pixels,
        }
    }

    /// Luminance texture of a font's glyph atlas
    pub fn glyph_atlas(font: &Font) -> Self {
        let (width, height) = font.atlas().dimensions();
        Self {
            name: Self::glyph_atlas_name(font),
            width,
            height,
            format: PixelFormat::Luminance,
            pixels: font.atlas().pixels().to_vec(),
        }
    }

    pub fn glyph_atlas_name(font: &Font) -> String {
        format!("font:{}@{}", font.name(), font.size())
    }

    /// 1x1 RGBA texture of `color`
    pub fn solid(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            width: 1,
            height: 1,
            format: PixelFormat::Rgba,
            pixels: color.to_rgba8().to_vec(),
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .finish()
    }
}

/// Textures shared between geometries, keyed by name
#[derive(Debug, Default)]
pub struct TextureCache {
    textures: FxHashMap<String, Arc<Texture>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (or reuse) the texture at `path`
    ///
    /// A file that cannot be read or decoded is logged and yields `None`.
    pub fn load(&mut self, path: impl AsRef<Path>, format: PixelFormat) -> Option<Arc<Texture>> {
        let path = path.as_ref();
        let name = path.to_string_lossy().into_owned();
        if let Some(tex) = self.textures.get(&name) {
            return Some(Arc::clone(tex));
        }
        match Texture::load(path, format) {
            Ok(tex) => {
                debug!("texture {}: {}x{} {:?}", name, tex.width, tex.height, format);
                let tex = Arc::new(tex);
                self.textures.insert(name, Arc::clone(&tex));
                Some(tex)
            }
            Err(e) => {
                warn!("texture {} not loaded: {}", name, e);
                None
            }
        }
    }

    /// Share `texture`, keeping an existing entry of the same name
    pub fn insert(&mut self, texture: Texture) -> Arc<Texture> {
        Arc::clone(
            self.textures
                .entry(texture.name.clone())
                .or_insert_with(|| Arc::new(texture)),
        )
    }

    /// Share the atlas texture of `font`, building it on first use
    pub fn glyph_atlas(&mut self, font: &Font) -> Arc<Texture> {
        match self.get(&Texture::glyph_atlas_name(font)) {
            Some(tex) => tex,
            None => self.insert(Texture::glyph_atlas(font)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Texture>> {
        self.textures.get(name).cloned()
    }

    /// Give back a handle; the entry goes once nothing else holds it
    pub fn release(&mut self, texture: Arc<Texture>) -> bool {
        let name = texture.name.clone();
        drop(texture);
        let unused = self
            .textures
            .get(&name)
            .is_some_and(|t| Arc::strong_count(t) == 1);
        if unused {
            self.textures.remove(&name);
        }
        unused
    }

    pub fn purge_unused(&mut self) -> usize {
        let before = self.textures.len();
        self.textures.retain(|_, t| Arc::strong_count(t) > 1);
        before - self.textures.len()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
    }
}
