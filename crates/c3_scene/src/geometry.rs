//! Geometry: typed vertex buffers plus a material
//!
//! A geometry belongs to exactly one [`SceneObject`](crate::SceneObject) and is
//! positioned by that object's world matrix. Bounds are kept in the
//! geometry's local space; the world box is refreshed during projection.

use crate::depth::DrawTier;
use crate::graph::ObjectKey;
use crate::text::TextState;
use crate::texture::Texture;
use crate::view::ViewMask;
use c3_core::{BoundingBox, Color, Vec2, Vec3, Vec4};
use std::sync::Arc;

/// Backend shader program handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Point light parameters
#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    /// Lights are drawn (enabled) in ascending id order
    pub id: u32,
    /// Homogeneous position, w = 0 for a directional light
    pub position: Vec4,
    pub ambient: Color,
    pub specular: Color,
}

impl Light {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            position: Vec4::new(0.0, 0.0, 0.0, 1.0),
            ambient: Color::rgb(0.2, 0.2, 0.2),
            specular: Color::WHITE,
        }
    }
}

/// What the buffers of a geometry describe
#[derive(Clone, Debug)]
pub enum GeometryKind {
    Triangles,
    /// Line segments expanded to quads of `width`
    Lines { width: f32 },
    Text(TextState),
    /// Screen-aligned textured quad
    Sprite { size: Vec2 },
    Light(Light),
}

impl GeometryKind {
    /// Short label used in logs and driver statistics
    pub fn label(&self) -> &'static str {
        match self {
            GeometryKind::Triangles => "triangles",
            GeometryKind::Lines { .. } => "lines",
            GeometryKind::Text(_) => "text",
            GeometryKind::Sprite { .. } => "sprite",
            GeometryKind::Light(_) => "light",
        }
    }
}

/// Surface appearance
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: Color,
    pub texture: Option<Arc<Texture>>,
    pub program: Option<ProgramId>,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            texture: None,
            program: None,
            shininess: 0.0,
        }
    }
}

impl Material {
    pub fn colored(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }
}

/// Renderable buffers owned by a scene object
#[derive(Clone, Debug)]
pub struct Geometry {
    pub name: String,
    pub kind: GeometryKind,
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub colors: Vec<Color>,
    pub indices: Vec<u32>,
    /// Local-space bounds of `vertices`
    pub bbox: BoundingBox,
    pub material: Material,
    /// Views this geometry is never drawn in
    pub hidden: ViewMask,
    pub(crate) world_bbox: BoundingBox,
    pub(crate) dirty: bool,
    pub(crate) object: Option<ObjectKey>,
}

impl Geometry {
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            name: String::new(),
            kind,
            vertices: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            colors: Vec::new(),
            indices: Vec::new(),
            bbox: BoundingBox::empty(),
            material: Material::default(),
            hidden: ViewMask::NONE,
            world_bbox: BoundingBox::empty(),
            dirty: true,
            object: None,
        }
    }

    pub fn triangles() -> Self {
        Self::new(GeometryKind::Triangles)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.material.color = color;
        self
    }

    pub fn hidden_from(mut self, mask: ViewMask) -> Self {
        self.hidden = mask;
        self
    }

    /// Object owning this geometry, `None` until attached
    pub fn object(&self) -> Option<ObjectKey> {
        self.object
    }

    /// Bounds in world space, as of the last projection
    pub fn world_bbox(&self) -> &BoundingBox {
        &self.world_bbox
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Recompute the local bounds from the vertices
    pub fn update_bounds(&mut self) {
        self.bbox = if self.vertices.is_empty() {
            BoundingBox::point(Vec3::ZERO)
        } else {
            BoundingBox::from_points(&self.vertices)
        };
    }

    /// Optional buffers match the vertex count and indices stay in range
    pub fn buffers_consistent(&self) -> bool {
        let n = self.vertices.len();
        let parallel = |len: usize| len == 0 || len == n;
        parallel(self.normals.len())
            && parallel(self.texcoords.len())
            && parallel(self.colors.len())
            && self.indices.iter().all(|&i| (i as usize) < n)
    }

    pub fn is_translucent(&self) -> bool {
        !self.material.color.is_opaque()
    }

    pub fn light_id(&self) -> Option<u32> {
        match &self.kind {
            GeometryKind::Light(light) => Some(light.id),
            _ => None,
        }
    }

    /// Lights, and anything with vertices
    ///
    /// A text geometry whose last layout failed has nothing to draw and no
    /// place in a view's depth range.
    pub fn has_content(&self) -> bool {
        self.light_id().is_some() || !self.vertices.is_empty()
    }

    /// Coarse draw ordering class
    pub fn draw_tier(&self) -> DrawTier {
        match self.light_id() {
            Some(id) => DrawTier::Light { id },
            None if self.is_translucent() => DrawTier::Translucent,
            None => DrawTier::Opaque,
        }
    }

    pub fn is_hidden_from(&self, view: usize) -> bool {
        self.hidden.contains(view)
    }

    pub fn text_state(&self) -> Option<&TextState> {
        match &self.kind {
            GeometryKind::Text(state) => Some(state),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Geometry {
        let mut g = Geometry::triangles();
        g.vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 1.0),
            Vec3::new(0.0, 3.0, -1.0),
        ];
        g
    }

    #[test]
    fn test_bounds_from_vertices() {
        let mut g = triangle();
        g.update_bounds();
        assert_eq!(g.bbox.min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(g.bbox.max, Vec3::new(2.0, 3.0, 1.0));
    }

    #[test]
    fn test_vertexless_bounds_are_a_point() {
        let mut g = Geometry::new(GeometryKind::Light(Light::new(0)));
        g.update_bounds();
        assert_eq!(g.bbox, BoundingBox::point(Vec3::ZERO));
        assert!(!g.bbox.is_empty());
    }

    #[test]
    fn test_buffers_consistent() {
        let mut g = triangle();
        assert!(g.buffers_consistent());
        g.indices = vec![0, 1, 2];
        assert!(g.buffers_consistent());
        g.normals = vec![Vec3::Z];
        assert!(!g.buffers_consistent());
        g.normals.clear();
        g.indices.push(3);
        assert!(!g.buffers_consistent());
    }

    #[test]
    fn test_draw_tier() {
        let light = Geometry::new(GeometryKind::Light(Light::new(2)));
        assert_eq!(light.draw_tier(), DrawTier::Light { id: 2 });
        assert_eq!(light.light_id(), Some(2));

        let opaque = triangle();
        assert_eq!(opaque.draw_tier(), DrawTier::Opaque);

        let glass = triangle().with_color(Color::rgba(0.0, 0.0, 0.0, 0.9));
        assert!(glass.is_translucent());
        assert_eq!(glass.draw_tier(), DrawTier::Translucent);
    }

    #[test]
    fn test_hidden_mask() {
        let g = triangle().hidden_from(ViewMask::of(1));
        assert!(g.is_hidden_from(1));
        assert!(!g.is_hidden_from(0));
        assert!(Geometry::triangles().hidden_from(ViewMask::ALL).is_hidden_from(0));
    }
}
