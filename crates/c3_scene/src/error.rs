//! Error types for the scene graph

use crate::graph::{GeometryKey, ObjectKey};
use thiserror::Error;

/// Errors raised by scene graph operations
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Unknown object {0:?}")]
    UnknownObject(ObjectKey),

    #[error("Unknown geometry {0:?}")]
    UnknownGeometry(GeometryKey),

    #[error("The root object cannot be removed or moved")]
    RootRemoval,

    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { child: ObjectKey, parent: ObjectKey },

    #[error("View index {index} out of range ({count} views)")]
    InvalidView { index: usize, count: usize },

    #[error("A context holds at most {0} views")]
    TooManyViews(usize),

    #[error("Geometry is not a text geometry")]
    NotText,

    #[error("Text geometry has no font")]
    NoFont,

    #[error("Text error: {0}")]
    Text(#[from] c3_text::TextError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for scene graph operations
pub type Result<T> = std::result::Result<T, SceneError>;
