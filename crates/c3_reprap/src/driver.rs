//! Headless trace backend
//!
//! Stands in for a GL backend: it keeps the state a real backend would
//! upload (view uniforms, cull mode, render target) and logs every call.

use c3_scene::{DrawItem, Mat4, RenderDriver, RenderTarget, View, ViewKind, ViewUniform};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Face culling a backend would enable for a view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CullFace {
    Back,
    /// Light views render back faces into the shadow map
    Front,
}

impl CullFace {
    pub fn for_view(kind: ViewKind) -> Self {
        match kind {
            ViewKind::Eye => CullFace::Back,
            ViewKind::Light => CullFace::Front,
        }
    }
}

#[derive(Debug, Default)]
pub struct TraceDriver {
    label: &'static str,
    shadow: Option<Mat4>,
    last_uniform: Option<ViewUniform>,
    cull: Option<CullFace>,
    target: Option<RenderTarget>,
    draws: BTreeMap<&'static str, u64>,
    views: u64,
}

impl TraceDriver {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    /// Shadow matrix applied to the next eye views
    pub fn set_shadow_matrix(&mut self, shadow: Mat4) {
        self.shadow = Some(shadow);
    }

    pub fn last_uniform(&self) -> Option<&ViewUniform> {
        self.last_uniform.as_ref()
    }

    pub fn cull_face(&self) -> Option<CullFace> {
        self.cull
    }

    pub fn target(&self) -> Option<RenderTarget> {
        self.target
    }

    /// Draw calls so far, per geometry kind label
    pub fn draw_counts(&self) -> &BTreeMap<&'static str, u64> {
        &self.draws
    }

    pub fn total_draws(&self) -> u64 {
        self.draws.values().sum()
    }

    pub fn views_begun(&self) -> u64 {
        self.views
    }
}

impl RenderDriver for TraceDriver {
    fn begin_view(&mut self, index: usize, view: &View) {
        let cull = CullFace::for_view(view.kind);
        let shadow = match view.kind {
            ViewKind::Eye => self.shadow.unwrap_or(Mat4::IDENTITY),
            ViewKind::Light => Mat4::IDENTITY,
        };
        self.last_uniform = Some(ViewUniform::new(view, &shadow));
        self.cull = Some(cull);
        self.target = Some(view.target);
        self.views += 1;
        debug!(
            "{}: view {} {:?} target {} cull {:?}, {} geometries, z {:.2}..{:.2}",
            self.label,
            index,
            view.kind,
            view.target.0,
            cull,
            view.projected().len(),
            view.z.min,
            view.z.max
        );
    }

    fn draw_geometry(&mut self, item: &DrawItem<'_>) {
        let kind = item.geometry.kind.label();
        *self.draws.entry(kind).or_insert(0) += 1;
        trace!(
            "{}: draw {} '{}' {} vertices",
            self.label,
            kind,
            item.geometry.name,
            item.geometry.vertices.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c3_scene::{primitives, Context, CubeFaces, Vec2, Vec3};

    #[test]
    fn test_counts_draws_per_kind() {
        let mut c3 = Context::new(100, 100, TraceDriver::new("test"));
        let root = c3.root();
        let cube = primitives::cube(Vec3::ZERO, Vec3::ONE, CubeFaces::ALL);
        c3.scene_mut().add_geometry(root, cube).unwrap();
        c3.scene_mut().add_geometry(root, primitives::light(0)).unwrap();
        c3.draw();
        c3.draw();
        let driver = c3.driver();
        assert_eq!(driver.views_begun(), 2);
        assert_eq!(driver.total_draws(), 4);
        assert_eq!(driver.draw_counts().get("light"), Some(&2));
        assert_eq!(driver.cull_face(), Some(CullFace::Back));
    }

    #[test]
    fn test_light_view_culls_front_faces() {
        let mut c3 = Context::new(100, 100, TraceDriver::new("test"));
        let light = c3
            .add_view(View::light(Vec2::new(64.0, 64.0)).with_target(RenderTarget(7)))
            .unwrap();
        c3.set_current(light).unwrap();
        c3.draw();
        assert_eq!(c3.driver().cull_face(), Some(CullFace::Front));
        assert_eq!(c3.driver().target(), Some(RenderTarget(7)));
    }

    #[test]
    fn test_eye_uniform_carries_shadow_matrix() {
        let mut c3 = Context::new(100, 100, TraceDriver::new("test"));
        let shadow = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        c3.driver_mut().set_shadow_matrix(shadow);
        c3.draw();
        let uniform = c3.driver().last_uniform().unwrap();
        assert_eq!(uniform.shadow, shadow.to_cols_array());
    }
}
