//! c3 core algebra
//!
//! This crate provides the foundation types shared by every other c3 crate:
//! - 2D/3D/4D vectors
//! - Column-major 4x4 matrices with camera helpers (look-at, perspective,
//!   orthographic, inverse)
//! - Axis-aligned bounding boxes
//! - Linear RGBA colors

pub mod bounds;
pub mod color;
pub mod matrix;
pub mod vector;

pub use bounds::BoundingBox;
pub use color::Color;
pub use matrix::Mat4;
pub use vector::{Vec2, Vec3, Vec4};
