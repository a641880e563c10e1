//! Text geometry
//!
//! A text geometry carries its string, origin and font in [`TextState`]. The
//! vertex buffers hold one quad per glyph and are rebuilt by
//! [`Geometry::set_text`].

use crate::error::{Result, SceneError};
use crate::geometry::{Geometry, GeometryKind, Material};
use c3_core::{Color, Vec2, Vec3};
use c3_text::{layout_run, Font, TextAlign};
use std::sync::Arc;
use tracing::trace;

/// Default colour of newly created text
pub const TEXT_COLOR: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

#[derive(Clone, Debug, Default)]
pub struct TextState {
    pub text: String,
    /// Baseline start, in the owning object's space
    pub origin: Vec2,
    pub align: TextAlign,
    pub font: Option<Arc<Font>>,
    /// Laid out width of the current text
    pub width: f32,
}

impl Geometry {
    /// Empty text geometry, drawn in [`TEXT_COLOR`] unless told otherwise
    pub fn text(align: TextAlign) -> Self {
        let state = TextState {
            align,
            ..TextState::default()
        };
        Self::new(GeometryKind::Text(state)).with_material(Material::colored(TEXT_COLOR))
    }

    /// Swap the font of a text geometry, returning the previous one
    pub fn set_font(&mut self, font: Arc<Font>) -> Result<Option<Arc<Font>>> {
        match &mut self.kind {
            GeometryKind::Text(state) => Ok(state.font.replace(font)),
            _ => Err(SceneError::NotText),
        }
    }

    /// Lay out `text` at `origin` and rebuild the glyph quads
    ///
    /// Empty text (or text with no drawable glyph) leaves the buffers empty
    /// and reports [`c3_text::TextError::EmptyText`].
    pub fn set_text(&mut self, origin: Vec2, text: &str) -> Result<()> {
        let GeometryKind::Text(state) = &mut self.kind else {
            return Err(SceneError::NotText);
        };
        let font = state.font.clone().ok_or(SceneError::NoFont)?;
        state.text = text.to_string();
        state.origin = origin;
        state.width = 0.0;
        let align = state.align;

        self.vertices.clear();
        self.texcoords.clear();
        self.colors.clear();
        self.normals.clear();
        self.indices.clear();

        let laid_out = layout_run(font.as_ref(), origin, text, align);
        let run = match laid_out {
            Ok(run) => run,
            Err(e) => {
                self.update_bounds();
                return Err(e.into());
            }
        };

        let color = self.material.color;
        for quad in &run.quads {
            let base = self.vertices.len() as u32;
            let (x0, y0, x1, y1) = (quad.min.x, quad.min.y, quad.max.x, quad.max.y);
            let [s0, t0, s1, t1] = quad.uv;
            self.vertices.extend([
                Vec3::new(x0, y0, 0.0),
                Vec3::new(x0, y1, 0.0),
                Vec3::new(x1, y1, 0.0),
                Vec3::new(x1, y0, 0.0),
            ]);
            self.texcoords.extend([
                Vec2::new(s0, t0),
                Vec2::new(s0, t1),
                Vec2::new(s1, t1),
                Vec2::new(s1, t0),
            ]);
            self.colors.extend([color; 4]);
            self.indices
                .extend([0, 1, 2, 0, 2, 3].into_iter().map(|i| base + i));
        }
        if let GeometryKind::Text(state) = &mut self.kind {
            state.width = run.width;
        }
        trace!("text {:?}: {} glyphs, width {}", text, run.quads.len(), run.width);
        self.update_bounds();
        Ok(())
    }
}
