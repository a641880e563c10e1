//! Views: one camera, one render target and a cached draw order

use crate::camera::Camera;
use crate::graph::GeometryKey;
use c3_core::{Mat4, Vec2};

/// Bitmask of view indices, bit `i` standing for view `i`
///
/// Holds views `0..ViewMask::CAPACITY`; a context refuses views beyond that.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ViewMask(pub u32);

impl ViewMask {
    pub const NONE: ViewMask = ViewMask(0);
    pub const ALL: ViewMask = ViewMask(u32::MAX);
    pub const CAPACITY: usize = u32::BITS as usize;

    /// Mask holding only `view`; empty for views past [`Self::CAPACITY`]
    pub const fn of(view: usize) -> Self {
        if view < Self::CAPACITY {
            ViewMask(1 << view)
        } else {
            ViewMask::NONE
        }
    }

    pub fn with(self, view: usize) -> Self {
        ViewMask(self.0 | Self::of(view).0)
    }

    pub fn contains(self, view: usize) -> bool {
        self.0 & Self::of(view).0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// What a view renders
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewKind {
    /// Perspective view seen by the user
    #[default]
    Eye,
    /// View from a light source, rendered into a shadow map
    Light,
}

/// Backend render-target handle (framebuffer id or similar)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RenderTarget(pub u64);

impl RenderTarget {
    /// The window's own framebuffer
    pub const SCREEN: RenderTarget = RenderTarget(0);
}

/// Near/far distance bounds derived from visible geometry
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZRange {
    pub min: f32,
    pub max: f32,
}

impl ZRange {
    /// Values held before any geometry contributed
    pub const SENTINEL: ZRange = ZRange {
        min: 1_000_000_000.0,
        max: -1_000_000_000.0,
    };

    /// Near bound scale applied after the square root
    pub const NEAR_MARGIN: f32 = 0.8;

    /// Widen with a (min, max) pair of squared distances
    pub fn include(&mut self, d2min: f32, d2max: f32) {
        self.min = self.min.min(d2min);
        self.max = self.max.max(d2max);
    }

    /// True while no geometry has contributed
    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    /// Convert squared distances to the final near/far bounds
    ///
    /// A range nothing contributed to stays at the sentinel values.
    pub fn resolve(self) -> ZRange {
        if self.is_sentinel() {
            return self;
        }
        ZRange {
            min: self.min.max(0.0).sqrt() * Self::NEAR_MARGIN,
            max: self.max.max(0.0).sqrt(),
        }
    }
}

impl Default for ZRange {
    fn default() -> Self {
        Self::SENTINEL
    }
}

/// A camera, its projection and the sorted geometry it last saw
#[derive(Clone, Debug)]
pub struct View {
    pub kind: ViewKind,
    /// Viewport size in pixels
    pub size: Vec2,
    pub camera: Camera,
    pub projection: Mat4,
    pub z: ZRange,
    pub dirty: bool,
    pub target: RenderTarget,
    pub(crate) projected: Vec<GeometryKey>,
}

impl View {
    /// Smallest near plane handed to a perspective projection
    pub const MIN_NEAR: f32 = 0.01;

    pub fn new(kind: ViewKind, size: Vec2) -> Self {
        Self {
            kind,
            size,
            camera: Camera::new(),
            projection: Mat4::IDENTITY,
            z: ZRange::SENTINEL,
            dirty: true,
            target: RenderTarget::SCREEN,
            projected: Vec::new(),
        }
    }

    pub fn eye(size: Vec2) -> Self {
        Self::new(ViewKind::Eye, size)
    }

    pub fn light(size: Vec2) -> Self {
        Self::new(ViewKind::Light, size)
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_target(mut self, target: RenderTarget) -> Self {
        self.target = target;
        self
    }

    /// Width over height; a zero height counts as 1
    pub fn aspect(&self) -> f32 {
        if self.size.y > 0.0 {
            self.size.x / self.size.y
        } else {
            self.size.x
        }
    }

    /// Force a re-gather and re-sort on the next projection
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Geometry in draw order, as of the last projection
    pub fn projected(&self) -> &[GeometryKey] {
        &self.projected
    }

    /// Orthographic overlay view in window pixels (y down)
    pub fn screen_overlay(size: Vec2) -> Self {
        let mut view = Self::eye(size);
        view.camera.fov = 0.0;
        view.camera.mtx = Mat4::IDENTITY;
        view.projection = Mat4::screen_ortho(0.0, size.x, 0.0, size.y, 0.0, 10.0);
        view
    }

    /// Resize the viewport; overlays get their pixel projection rebuilt
    pub fn resize(&mut self, size: Vec2) {
        self.size = size;
        if self.camera.is_orthographic() {
            self.projection = Mat4::screen_ortho(0.0, size.x, 0.0, size.y, 0.0, 10.0);
        }
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_mask() {
        let m = ViewMask::of(1);
        assert!(m.contains(1));
        assert!(!m.contains(0));
        assert!(m.with(0).contains(0));
        assert!(ViewMask::ALL.contains(5));
        assert!(ViewMask::NONE.is_empty());
    }

    #[test]
    fn test_view_mask_does_not_wrap() {
        let last = ViewMask::CAPACITY - 1;
        assert!(ViewMask::of(last).contains(last));
        assert!(ViewMask::of(ViewMask::CAPACITY).is_empty());
        assert!(!ViewMask::of(0).contains(ViewMask::CAPACITY));
    }

    #[test]
    fn test_zrange_resolve() {
        let mut z = ZRange::SENTINEL;
        z.include(100.0, 400.0);
        z.include(25.0, 225.0);
        let r = z.resolve();
        assert_eq!(r.min, 5.0 * 0.8);
        assert_eq!(r.max, 20.0);
    }

    #[test]
    fn test_zrange_sentinel_survives() {
        assert_eq!(ZRange::SENTINEL.resolve(), ZRange::SENTINEL);
    }

    #[test]
    fn test_new_view_is_dirty() {
        let v = View::light(Vec2::new(1024.0, 1024.0));
        assert!(v.dirty);
        assert_eq!(v.kind, ViewKind::Light);
        assert_eq!(v.aspect(), 1.0);
        assert!(v.projected().is_empty());
    }

    #[test]
    fn test_screen_overlay_is_orthographic() {
        let v = View::screen_overlay(Vec2::new(800.0, 600.0));
        assert!(v.camera.is_orthographic());
        assert_eq!(v.camera.mtx, Mat4::IDENTITY);
        assert_ne!(v.projection, Mat4::IDENTITY);
    }
}
