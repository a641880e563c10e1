//! Shared font cache
//!
//! Fonts are keyed by name and pixel size and handed out as `Arc<Font>`.
//! The cache holds one reference itself; an entry is freed as soon as the
//! cache is its only owner and a release or purge runs.

use crate::font::Font;
use crate::Result;
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    name: String,
    size_bits: u32,
}

impl FontKey {
    fn new(name: &str, size: f32) -> Self {
        Self {
            name: name.to_string(),
            size_bits: size.to_bits(),
        }
    }
}

/// Fonts shared between text geometries
#[derive(Debug, Default)]
pub struct FontCache {
    fonts: IndexMap<FontKey, Arc<Font>>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the font loaded from `path` at `size`, loading it on first use
    pub fn acquire(&mut self, path: impl AsRef<Path>, size: f32) -> Result<Arc<Font>> {
        let path = path.as_ref();
        let key = FontKey::new(&path.to_string_lossy(), size);
        if let Some(font) = self.fonts.get(&key) {
            return Ok(Arc::clone(font));
        }
        let font = Arc::new(Font::load(path, size)?);
        debug!("font cache: loaded {} at {}", key.name, size);
        self.fonts.insert(key, Arc::clone(&font));
        Ok(font)
    }

    /// Share an already built font, returning the cached copy if one exists
    pub fn insert(&mut self, font: Font) -> Arc<Font> {
        let key = FontKey::new(font.name(), font.size());
        Arc::clone(
            self.fonts
                .entry(key)
                .or_insert_with(|| Arc::new(font)),
        )
    }

    /// Give back a handle; frees the entry when no other owner remains
    ///
    /// Returns `true` when the font was evicted.
    pub fn release(&mut self, font: Arc<Font>) -> bool {
        let key = FontKey::new(font.name(), font.size());
        drop(font);
        let unused = self
            .fonts
            .get(&key)
            .is_some_and(|f| Arc::strong_count(f) == 1);
        if unused {
            self.fonts.shift_remove(&key);
            debug!("font cache: released {}", key.name);
        }
        unused
    }

    /// Drop every font nothing else references, returns how many went
    pub fn purge_unused(&mut self) -> usize {
        let before = self.fonts.len();
        self.fonts.retain(|key, font| {
            let keep = Arc::strong_count(font) > 1;
            if !keep {
                debug!("font cache: purged {}", key.name);
            }
            keep
        });
        before - self.fonts.len()
    }

    pub fn contains(&self, name: &str, size: f32) -> bool {
        self.fonts.contains_key(&FontKey::new(name, size))
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn clear(&mut self) {
        self.fonts.clear();
    }
}
