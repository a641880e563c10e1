//! Single-line text run layout

use crate::font::GlyphMetrics;
use crate::{Result, TextError};
use c3_core::Vec2;
use tracing::trace;

/// Horizontal alignment of a run relative to its origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Horizontal shift applied to a run of `width`
    pub fn offset(self, width: f32) -> f32 {
        match self {
            TextAlign::Left => 0.0,
            TextAlign::Center => -width / 2.0,
            TextAlign::Right => -width,
        }
    }
}

/// One positioned glyph cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    pub ch: char,
    /// Top-left corner (y grows downward)
    pub min: Vec2,
    pub max: Vec2,
    pub uv: [f32; 4],
}

/// Result of laying out a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRun {
    pub quads: Vec<GlyphQuad>,
    /// Kerning-adjusted advances plus the last glyph's width
    pub width: f32,
    /// Alignment shift already applied to every quad
    pub offset: f32,
}

/// Lay out `text` on the baseline through `origin`
///
/// Characters without a glyph are skipped. A run that ends up with no glyph
/// at all is [`TextError::EmptyText`].
pub fn layout_run<M: GlyphMetrics + ?Sized>(
    metrics: &M,
    origin: Vec2,
    text: &str,
    align: TextAlign,
) -> Result<TextRun> {
    let mut pen = origin.x;
    let mut prev: Option<char> = None;
    let mut last_width = None;
    let mut quads = Vec::with_capacity(text.len());

    for ch in text.chars() {
        let Some(glyph) = metrics.glyph(ch) else {
            trace!("no glyph for {:?}, skipped", ch);
            continue;
        };
        if let Some(p) = prev {
            pen += metrics.kerning(p, ch);
        }
        let x0 = pen + glyph.bearing_x;
        let y0 = origin.y - glyph.bearing_y;
        quads.push(GlyphQuad {
            ch,
            min: Vec2::new(x0, y0),
            max: Vec2::new(x0 + glyph.width, y0 + glyph.height),
            uv: glyph.uv,
        });
        pen += glyph.advance;
        prev = Some(ch);
        last_width = Some(glyph.width);
    }

    let last_width = last_width.ok_or(TextError::EmptyText)?;
    let width = pen + last_width - origin.x;
    let offset = align.offset(width);
    if offset != 0.0 {
        for q in &mut quads {
            q.min.x += offset;
            q.max.x += offset;
        }
    }

    Ok(TextRun {
        quads,
        width,
        offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::GlyphInfo;

    /// 'i' is narrow, 'm' is wide, '!' kerns against 'i'
    #[derive(Debug)]
    struct FixedMetrics {
        kern: f32,
    }

    impl GlyphMetrics for FixedMetrics {
        fn glyph(&self, ch: char) -> Option<GlyphInfo> {
            let (advance, width) = match ch {
                'i' => (4.0, 2.0),
                'm' => (10.0, 9.0),
                '!' => (5.0, 3.0),
                _ => return None,
            };
            Some(GlyphInfo {
                advance,
                width,
                height: 8.0,
                bearing_x: 0.5,
                bearing_y: 8.0,
                uv: [0.0, 0.0, 1.0, 1.0],
            })
        }

        fn kerning(&self, left: char, right: char) -> f32 {
            if left == 'i' && right == '!' {
                self.kern
            } else {
                0.0
            }
        }
    }

    #[test]
    fn test_width_is_advances_plus_last_width() {
        let m = FixedMetrics { kern: 0.0 };
        let run = layout_run(&m, Vec2::ZERO, "mim", TextAlign::Left).unwrap();
        assert_eq!(run.quads.len(), 3);
        assert_eq!(run.width, 10.0 + 4.0 + 10.0 + 9.0);
        assert_eq!(run.offset, 0.0);
    }

    #[test]
    fn test_center_offset_is_half_width() {
        let m = FixedMetrics { kern: 0.0 };
        let left = layout_run(&m, Vec2::new(5.0, 20.0), "mi", TextAlign::Left).unwrap();
        let center = layout_run(&m, Vec2::new(5.0, 20.0), "mi", TextAlign::Center).unwrap();
        assert_eq!(center.offset, -left.width / 2.0);
        assert_eq!(center.quads[0].min.x, left.quads[0].min.x - left.width / 2.0);
    }

    #[test]
    fn test_right_offset_is_full_width() {
        let m = FixedMetrics { kern: 0.0 };
        let run = layout_run(&m, Vec2::ZERO, "m", TextAlign::Right).unwrap();
        assert_eq!(run.offset, -run.width);
        assert_eq!(run.quads[0].min.x, 0.5 - 19.0);
    }

    #[test]
    fn test_kerning_moves_pen() {
        let m = FixedMetrics { kern: -1.5 };
        let run = layout_run(&m, Vec2::ZERO, "i!", TextAlign::Left).unwrap();
        assert_eq!(run.quads[1].min.x, 4.0 - 1.5 + 0.5);
        assert_eq!(run.width, 4.0 - 1.5 + 5.0 + 3.0);
    }

    #[test]
    fn test_quads_hang_from_baseline() {
        let m = FixedMetrics { kern: 0.0 };
        let run = layout_run(&m, Vec2::new(1.0, 20.0), "i", TextAlign::Left).unwrap();
        let q = run.quads[0];
        assert_eq!(q.min, Vec2::new(1.5, 12.0));
        assert_eq!(q.max, Vec2::new(3.5, 20.0));
    }

    #[test]
    fn test_unknown_glyphs_are_skipped() {
        let m = FixedMetrics { kern: 0.0 };
        let run = layout_run(&m, Vec2::ZERO, "?i?", TextAlign::Left).unwrap();
        assert_eq!(run.quads.len(), 1);
        assert_eq!(run.width, 4.0 + 2.0);
    }

    #[test]
    fn test_empty_text_is_an_error() {
        let m = FixedMetrics { kern: 0.0 };
        assert!(matches!(
            layout_run(&m, Vec2::ZERO, "", TextAlign::Left),
            Err(TextError::EmptyText)
        ));
        assert!(matches!(
            layout_run(&m, Vec2::ZERO, "???", TextAlign::Center),
            Err(TextError::EmptyText)
        ));
    }
}
