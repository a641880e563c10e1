//! Render driver seam
//!
//! The scene never talks to a graphics API. A [`RenderDriver`] receives each
//! view once, followed by its sorted geometry.

use crate::geometry::Geometry;
use crate::graph::GeometryKey;
use crate::view::{View, ViewKind, ZRange};
use bytemuck::{Pod, Zeroable};
use c3_core::Mat4;

/// One geometry ready to draw
#[derive(Clone, Copy, Debug)]
pub struct DrawItem<'a> {
    pub key: GeometryKey,
    pub geometry: &'a Geometry,
    /// World matrix of the owning object
    pub world: &'a Mat4,
}

/// Backend receiving views and draw calls
pub trait RenderDriver {
    /// Called once per draw, before any geometry of `view`
    fn begin_view(&mut self, index: usize, view: &View);

    fn draw_geometry(&mut self, item: &DrawItem<'_>);
}

impl RenderDriver for Box<dyn RenderDriver> {
    fn begin_view(&mut self, index: usize, view: &View) {
        (**self).begin_view(index, view)
    }

    fn draw_geometry(&mut self, item: &DrawItem<'_>) {
        (**self).draw_geometry(item)
    }
}

/// Driver that draws nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDriver;

impl RenderDriver for NullDriver {
    fn begin_view(&mut self, _index: usize, _view: &View) {}

    fn draw_geometry(&mut self, _item: &DrawItem<'_>) {}
}

/// What a [`RecordingDriver`] saw
#[derive(Clone, Debug, PartialEq)]
pub enum DriverCommand {
    BeginView {
        index: usize,
        kind: ViewKind,
        z: ZRange,
    },
    Draw {
        key: GeometryKey,
        kind: &'static str,
        world: Mat4,
    },
}

/// Driver storing every call, for inspection
#[derive(Clone, Debug, Default)]
pub struct RecordingDriver {
    pub commands: Vec<DriverCommand>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys of drawn geometry, in call order
    pub fn drawn(&self) -> Vec<GeometryKey> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DriverCommand::Draw { key, .. } => Some(*key),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl RenderDriver for RecordingDriver {
    fn begin_view(&mut self, index: usize, view: &View) {
        self.commands.push(DriverCommand::BeginView {
            index,
            kind: view.kind,
            z: view.z,
        });
    }

    fn draw_geometry(&mut self, item: &DrawItem<'_>) {
        self.commands.push(DriverCommand::Draw {
            key: item.key,
            kind: item.geometry.kind.label(),
            world: *item.world,
        });
    }
}

/// Maps clip space [-1, 1] to texture space [0, 1]
pub const SHADOW_BIAS: Mat4 = Mat4::from_cols([
    [0.5, 0.0, 0.0, 0.0],
    [0.0, 0.5, 0.0, 0.0],
    [0.0, 0.0, 0.5, 0.0],
    [0.5, 0.5, 0.5, 1.0],
]);

/// Matrix taking world positions to shadow-map texture coordinates
pub fn shadow_matrix(light: &View) -> Mat4 {
    SHADOW_BIAS * light.projection * light.camera.mtx
}

/// Per-view uniform block for GPU backends
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ViewUniform {
    pub projection: [f32; 16],
    pub view: [f32; 16],
    pub shadow: [f32; 16],
    /// Eye position, w = 1
    pub eye: [f32; 4],
}

impl ViewUniform {
    pub fn new(view: &View, shadow: &Mat4) -> Self {
        Self {
            projection: view.projection.to_cols_array(),
            view: view.camera.mtx.to_cols_array(),
            shadow: shadow.to_cols_array(),
            eye: view.camera.eye.extend(1.0).to_array(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
