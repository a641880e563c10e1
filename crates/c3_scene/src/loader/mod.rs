//! Model import

mod obj;

pub use obj::{load_obj, ObjGroup, ObjLoader, ObjModel};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading a model file
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Model not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No faces in {}", .0.display())]
    Parse(PathBuf),

    #[error("Scene error: {0}")]
    Scene(#[from] crate::SceneError),
}
