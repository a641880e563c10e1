//! c3 scene graph
//!
//! A tree of transformable objects owning typed geometries, viewed through
//! one or more cameras. Each frame a [`Context`] projects the tree (transform
//! propagation, gathering and depth sorting per view) and hands the sorted
//! geometry to a pluggable [`RenderDriver`].
//!
//! ```ignore
//! use c3_scene::prelude::*;
//!
//! let mut c3 = Context::new(800, 600, NullDriver);
//! let root = c3.scene().root();
//! c3.scene_mut().add_geometry(root, primitives::cube(Vec3::ZERO, Vec3::ONE, CubeFaces::ALL))?;
//! c3.draw();
//! ```

pub mod camera;
pub mod context;
pub mod depth;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod loader;
pub mod primitives;
pub mod text;
pub mod texture;
pub mod view;

pub use camera::Camera;
pub use context::{Context, ProjectStats};
pub use depth::{DepthKey, DrawTier};
pub use driver::{
    shadow_matrix, DrawItem, DriverCommand, NullDriver, RecordingDriver, RenderDriver, ViewUniform,
};
pub use error::{Result, SceneError};
pub use geometry::{Geometry, GeometryKind, Light, Material, ProgramId};
pub use graph::{GeometryKey, ObjectKey, SceneGraph, SceneObject, Visibility};
pub use loader::{load_obj, LoadError, ObjLoader};
pub use primitives::CubeFaces;
pub use text::{TextState, TEXT_COLOR};
pub use texture::{PixelFormat, Texture, TextureCache};
pub use view::{RenderTarget, View, ViewKind, ViewMask, ZRange};

pub use c3_core::{BoundingBox, Color, Mat4, Vec2, Vec3, Vec4};
pub use c3_text::TextAlign;

/// Common imports
pub mod prelude {
    pub use crate::primitives;
    pub use crate::{
        Camera, Color, Context, CubeFaces, Geometry, GeometryKey, GeometryKind, Mat4, Material,
        NullDriver, ObjectKey, RenderDriver, SceneGraph, Vec2, Vec3, View, ViewKind, ViewMask,
        Visibility,
    };
}
