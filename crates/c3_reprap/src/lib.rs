//! simreprap internals
//!
//! The printer scene, overlay, input handling and frame loop behind the
//! `simreprap` binary.

pub mod app;
pub mod config;
pub mod controls;
pub mod driver;
pub mod hud;
pub mod scene;

pub use app::{App, FrameStats};
pub use config::AppConfig;
