//! Rendering context: a scene, its views and a driver
//!
//! Each frame the application picks a view with [`Context::set_current`] and
//! calls [`Context::draw`]. Projection runs lazily: the tree is re-projected
//! only when something in it changed, and a view re-gathers and re-sorts its
//! geometry only when it (or the tree) is dirty.

use crate::depth::sort_by_depth;
use crate::driver::{DrawItem, RenderDriver};
use crate::error::{Result, SceneError};
use crate::graph::{GeometryKey, ObjectKey, SceneGraph};
use crate::texture::TextureCache;
use crate::view::{View, ViewMask};
use c3_core::{Mat4, Vec2};
use c3_text::{Font, FontCache};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// What one [`Context::project`] call did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProjectStats {
    /// Objects whose world matrix was recomputed
    pub transformed: usize,
    /// Views gathered and sorted (0 or 1)
    pub sorted: usize,
    /// Geometries in the current view's draw list
    pub geometries: usize,
}

pub struct Context<D: RenderDriver> {
    scene: SceneGraph,
    views: Vec<View>,
    current: usize,
    driver: D,
    textures: TextureCache,
    fonts: Option<FontCache>,
}

impl<D: RenderDriver> Context<D> {
    /// New context with one eye view of `width` x `height`, made current
    pub fn new(width: u32, height: u32, driver: D) -> Self {
        Self {
            scene: SceneGraph::new(),
            views: vec![View::eye(Vec2::new(width as f32, height as f32))],
            current: 0,
            driver,
            textures: TextureCache::new(),
            fonts: None,
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn root(&self) -> ObjectKey {
        self.scene.root()
    }

    /// Append a view, returning its index
    /// Append a view, returning its index
    pub fn add_view(&mut self, view: View) -> Result<usize> {
        if self.views.len() >= ViewMask::CAPACITY {
            return Err(SceneError::TooManyViews(ViewMask::CAPACITY));
        }
        self.views.push(view);
        Ok(self.views.len() - 1)
    }

    pub fn view(&self, index: usize) -> Option<&View> {
        self.views.get(index)
    }

    pub fn view_mut(&mut self, index: usize) -> Option<&mut View> {
        self.views.get_mut(index)
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_view(&self) -> &View {
        &self.views[self.current]
    }

    pub fn current_view_mut(&mut self) -> &mut View {
        &mut self.views[self.current]
    }

    pub fn set_current(&mut self, index: usize) -> Result<()> {
        if index >= self.views.len() {
            return Err(SceneError::InvalidView {
                index,
                count: self.views.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    /// Force the whole tree (and so every view) to be projected again
    pub fn mark_dirty(&mut self) {
        let root = self.scene.root();
        self.scene.mark_dirty(root);
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureCache {
        &mut self.textures
    }

    /// Font cache, created on first use
    pub fn fonts_mut(&mut self) -> &mut FontCache {
        self.fonts.get_or_insert_with(FontCache::new)
    }

    /// Load `path` at `size` through the font cache and use it for `geometry`
    pub fn set_text_font(&mut self, geometry: GeometryKey, path: impl AsRef<Path>, size: f32) -> Result<()> {
        self.ensure_text(geometry)?;
        let font = self.fonts_mut().acquire(path, size)?;
        self.set_font(geometry, font)
    }

    /// Give `geometry` a font and its glyph atlas texture, releasing the
    /// ones it had
    pub fn set_font(&mut self, geometry: GeometryKey, font: Arc<Font>) -> Result<()> {
        self.ensure_text(geometry)?;
        let atlas = self.textures.glyph_atlas(&font);
        let (previous, old_atlas) = self.scene.update_geometry(geometry, |g| {
            let previous = g.set_font(font)?;
            Ok::<_, SceneError>((previous, g.material.texture.replace(atlas)))
        })??;
        if let Some(old) = old_atlas {
            let name = old.name.clone();
            if self.textures.release(old) {
                debug!("texture {} no longer used", name);
            }
        }
        if let Some(old) = previous {
            let name = old.name().to_string();
            if self.fonts_mut().release(old) {
                debug!("font {} no longer used", name);
            }
        }
        Ok(())
    }

    /// Lay out `text` in a text geometry
    pub fn set_text(&mut self, geometry: GeometryKey, origin: Vec2, text: &str) -> Result<()> {
        self.scene
            .update_geometry(geometry, |g| g.set_text(origin, text))?
    }

    fn ensure_text(&self, geometry: GeometryKey) -> Result<()> {
        let g = self
            .scene
            .geometry(geometry)
            .ok_or(SceneError::UnknownGeometry(geometry))?;
        if g.text_state().is_none() {
            return Err(SceneError::NotText);
        }
        Ok(())
    }

    /// Remove an object subtree; every view re-gathers on its next projection
    pub fn remove_object(&mut self, key: ObjectKey) -> Result<()> {
        let removed = self.scene.remove_object(key)?;
        for view in &mut self.views {
            view.projected.retain(|k| !removed.contains(k));
            view.mark_dirty();
        }
        Ok(())
    }

    /// Bring the current view's draw list up to date
    pub fn project(&mut self) -> ProjectStats {
        let mut stats = ProjectStats::default();
        if self.scene.is_dirty() {
            for view in &mut self.views {
                view.mark_dirty();
            }
            stats.transformed = self.scene.project(&Mat4::IDENTITY);
        }

        let index = self.current;
        let view = &mut self.views[index];
        if view.dirty {
            let mut keys = std::mem::take(&mut view.projected);
            keys.clear();
            self.scene.gather(index, &mut keys);
            let range = sort_by_depth(&mut keys, &self.scene, view.camera.eye);
            view.z = range.resolve();

            if !range.is_sentinel() && view.camera.fov > 0.0 {
                view.camera.update_matrix();
                let near = view.z.min.max(View::MIN_NEAR);
                let far = view.z.max.max(near * 2.0);
                view.projection = Mat4::perspective(view.camera.fov, view.aspect(), near, far);
            }
            stats.sorted = 1;
            view.projected = keys;
            view.dirty = false;
            trace!(
                "view {}: {} geometries, z {:.2}..{:.2}",
                index,
                view.projected.len(),
                view.z.min,
                view.z.max
            );
        }
        stats.geometries = self.views[index].projected.len();
        stats
    }

    /// Project, then feed the current view and its sorted geometry to the driver
    pub fn draw(&mut self) -> ProjectStats {
        let stats = self.project();
        let index = self.current;
        let view = &self.views[index];
        self.driver.begin_view(index, view);
        for &key in &view.projected {
            let Some(geometry) = self.scene.geometry(key) else {
                continue;
            };
            let world = geometry
                .object()
                .and_then(|o| self.scene.object(o))
                .map(|o| *o.world())
                .unwrap_or(Mat4::IDENTITY);
            self.driver.draw_geometry(&DrawItem {
                key,
                geometry,
                world: &world,
            });
        }
        stats
    }

    /// Tear everything down and hand back the driver
    pub fn dispose(mut self) -> D {
        for view in &mut self.views {
            view.projected.clear();
        }
        let objects = self.scene.object_count();
        self.scene.clear();
        let textures = self.textures.len();
        self.textures.clear();
        let fonts = self.fonts.as_ref().map_or(0, FontCache::len);
        if let Some(cache) = self.fonts.as_mut() {
            cache.clear();
        }
        debug!(
            "context disposed: {} objects, {} textures, {} fonts",
            objects, textures, fonts
        );
        self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverCommand, RecordingDriver};
    use crate::geometry::Geometry;
    use crate::primitives::{self, CubeFaces};
    use crate::texture::PixelFormat;
    use crate::view::ZRange;
    use c3_core::{Color, Vec3};
    use c3_text::TextAlign;

    fn context() -> Context<RecordingDriver> {
        Context::new(800, 600, RecordingDriver::new())
    }

    #[test]
    fn test_view_count_is_capped_by_mask() {
        let mut c3 = context();
        for i in 1..ViewMask::CAPACITY {
            assert_eq!(c3.add_view(View::light(Vec2::new(8.0, 8.0))).unwrap(), i);
        }
        assert!(matches!(
            c3.add_view(View::light(Vec2::new(8.0, 8.0))),
            Err(SceneError::TooManyViews(32))
        ));
        assert_eq!(c3.view_count(), ViewMask::CAPACITY);
    }

    #[test]
    fn test_empty_scene_keeps_sentinel() {
        let mut c3 = context();
        let stats = c3.project();
        assert_eq!(stats.sorted, 1);
        assert_eq!(stats.geometries, 0);
        assert_eq!(c3.current_view().z, ZRange::SENTINEL);
        assert_eq!(c3.current_view().projection, Mat4::IDENTITY);
    }

    #[test]
    fn test_project_is_idempotent() {
        let mut c3 = context();
        let root = c3.root();
        c3.scene_mut()
            .add_geometry(root, primitives::cube(Vec3::ZERO, Vec3::ONE, CubeFaces::ALL))
            .unwrap();
        c3.scene_mut()
            .add_geometry(root, primitives::light(0))
            .unwrap();

        let first = c3.project();
        assert!(first.transformed > 0);
        assert_eq!(first.geometries, 2);
        let order = c3.current_view().projected().to_vec();
        let projection = c3.current_view().projection;

        let second = c3.project();
        assert_eq!(second.transformed, 0);
        assert_eq!(second.sorted, 0);
        assert_eq!(c3.current_view().projected(), order.as_slice());
        assert_eq!(c3.current_view().projection, projection);
    }

    #[test]
    fn test_draw_order_lights_opaque_translucent() {
        let mut c3 = context();
        let root = c3.root();
        let scene = c3.scene_mut();
        let glass = scene
            .add_geometry(
                root,
                primitives::cube(Vec3::new(0.0, 0.0, 8.0), Vec3::ONE, CubeFaces::ALL)
                    .with_color(Color::rgba(1.0, 1.0, 1.0, 0.5)),
            )
            .unwrap();
        let floor = scene
            .add_geometry(root, primitives::cube(Vec3::ZERO, Vec3::splat(4.0), CubeFaces::ALL))
            .unwrap();
        let l1 = scene.add_geometry(root, primitives::light(1)).unwrap();
        let l0 = scene.add_geometry(root, primitives::light(0)).unwrap();

        c3.draw();
        assert_eq!(c3.driver().drawn(), vec![l0, l1, floor, glass]);
        assert!(matches!(
            c3.driver().commands[0],
            DriverCommand::BeginView { index: 0, .. }
        ));
    }

    #[test]
    fn test_perspective_follows_geometry() {
        let mut c3 = context();
        let root = c3.root();
        c3.scene_mut()
            .add_geometry(root, primitives::cube(Vec3::ZERO, Vec3::ONE, CubeFaces::ALL))
            .unwrap();
        c3.project();
        let view = c3.current_view();
        assert!(view.z.min > 0.0 && view.z.min < view.z.max);
        assert_ne!(view.projection, Mat4::IDENTITY);
    }

    #[test]
    fn test_near_plane_clamped() {
        let mut c3 = context();
        let root = c3.root();
        // geometry right at the eye
        let obj = c3.scene_mut().add_object(root).unwrap();
        c3.scene_mut()
            .set_transform(obj, Mat4::translation(Vec3::new(0.0, 0.0, 10.0)))
            .unwrap();
        c3.scene_mut().add_geometry(obj, primitives::light(0)).unwrap();
        c3.project();
        let view = c3.current_view();
        assert_eq!(view.z.min, 0.0);
        assert!(view.projection.to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_views_gather_independently() {
        let mut c3 = context();
        let light = c3.add_view(View::light(Vec2::new(1024.0, 1024.0))).unwrap();
        let root = c3.root();
        let bulb = c3
            .scene_mut()
            .add_geometry(
                root,
                primitives::uv_sphere(Vec3::ZERO, 3.0, 10, 10).hidden_from(ViewMask::of(light)),
            )
            .unwrap();
        c3.project();
        assert_eq!(c3.current_view().projected(), &[bulb]);

        c3.set_current(light).unwrap();
        let stats = c3.project();
        assert_eq!(stats.sorted, 1);
        assert!(c3.current_view().projected().is_empty());

        assert!(matches!(
            c3.set_current(5),
            Err(SceneError::InvalidView { index: 5, count: 2 })
        ));
    }

    #[test]
    fn test_text_through_context() {
        let mut c3 = context();
        let root = c3.root();
        let text = c3
            .scene_mut()
            .add_geometry(root, Geometry::text(TextAlign::Left))
            .unwrap();
        let small = c3.fonts_mut().insert(Font::monospace_fallback(12.0));
        c3.set_font(text, small).unwrap();
        c3.set_text(text, Vec2::new(1.0, 20.0), "Hello").unwrap();
        assert_eq!(c3.scene().geometry(text).unwrap().vertices.len(), 20);

        let large = c3.fonts_mut().insert(Font::monospace_fallback(18.0));
        c3.set_font(text, large).unwrap();
        let fonts = c3.fonts_mut();
        assert_eq!(fonts.len(), 1);
        assert!(fonts.contains("<fallback 18>", 18.0));
        assert_eq!(c3.textures().len(), 1);
        assert!(c3.textures().get("font:<fallback 18>@18").is_some());
    }

    #[test]
    fn test_text_samples_glyph_atlas() {
        let mut c3 = context();
        let root = c3.root();
        let text = c3
            .scene_mut()
            .add_geometry(root, Geometry::text(TextAlign::Left))
            .unwrap();
        let font = c3.fonts_mut().insert(Font::monospace_fallback(16.0));
        c3.set_font(text, font).unwrap();
        c3.set_text(text, Vec2::new(1.0, 20.0), "Hi").unwrap();

        let g = c3.scene().geometry(text).unwrap();
        let atlas = g.material.texture.as_ref().unwrap();
        assert_eq!(atlas.format, PixelFormat::Luminance);
        let (w, h) = (atlas.width as f32, atlas.height as f32);
        // every glyph quad corner samples an inked cell
        for uv in g.texcoords.iter().step_by(4) {
            let (x, y) = ((uv.x * w) as usize, (uv.y * h) as usize);
            assert!(atlas.pixels()[y * atlas.width as usize + x] > 0);
        }
    }

    #[test]
    fn test_text_errors_through_context() {
        let mut c3 = context();
        let root = c3.root();
        let cube = c3
            .scene_mut()
            .add_geometry(root, primitives::cube(Vec3::ZERO, Vec3::ONE, CubeFaces::ALL))
            .unwrap();
        assert!(matches!(
            c3.set_text_font(cube, "/nonexistent/VeraMono.ttf", 18.0),
            Err(SceneError::NotText)
        ));
        let text = c3
            .scene_mut()
            .add_geometry(root, Geometry::text(TextAlign::Left))
            .unwrap();
        assert!(matches!(
            c3.set_text_font(text, "/nonexistent/VeraMono.ttf", 18.0),
            Err(SceneError::Text(_))
        ));
        assert!(matches!(
            c3.set_text(text, Vec2::ZERO, "x"),
            Err(SceneError::NoFont)
        ));
    }

    #[test]
    fn test_remove_object_dirties_views() {
        let mut c3 = context();
        let root = c3.root();
        let obj = c3.scene_mut().add_object(root).unwrap();
        c3.scene_mut()
            .add_geometry(obj, primitives::light(0))
            .unwrap();
        c3.project();
        assert_eq!(c3.current_view().projected().len(), 1);
        c3.remove_object(obj).unwrap();
        assert!(c3.current_view().dirty);
        assert!(c3.current_view().projected().is_empty());
        c3.draw();
        assert!(c3.driver().drawn().is_empty());
    }

    #[test]
    fn test_dispose_returns_driver() {
        let mut c3 = context();
        let root = c3.root();
        c3.scene_mut().add_geometry(root, primitives::light(0)).unwrap();
        c3.draw();
        let driver = c3.dispose();
        assert_eq!(driver.drawn().len(), 1);
    }
}
