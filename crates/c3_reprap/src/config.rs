//! simreprap configuration
//!
//! Settings live in `simreprap.toml`. Every field has a default, so a missing
//! file or a file naming only a few keys is valid.

use anyhow::{Context, Result};
use c3_core::Vec3;
use c3_feed::PrinterConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "simreprap.toml";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub light: LightConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub sim: PrinterConfig,
}

// =============================================================================
// [window]
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

// =============================================================================
// [camera]
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CameraConfig {
    #[serde(default = "default_eye")]
    pub eye: Vec3,
    #[serde(default = "default_lookat")]
    pub lookat: Vec3,
    #[serde(default = "default_fov_degrees")]
    pub fov_degrees: f32,
}

fn default_eye() -> Vec3 {
    Vec3::new(100.0, -100.0, 100.0)
}

fn default_lookat() -> Vec3 {
    Vec3::new(100.0, 100.0, 0.0)
}

fn default_fov_degrees() -> f32 {
    45.0
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: default_eye(),
            lookat: default_lookat(),
            fov_degrees: default_fov_degrees(),
        }
    }
}

// =============================================================================
// [light]
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LightConfig {
    #[serde(default = "default_light_position")]
    pub position: Vec3,
    /// Shadow map edge in pixels
    #[serde(default = "default_shadow_size")]
    pub shadow_size: u32,
}

fn default_light_position() -> Vec3 {
    Vec3::new(-50.0, -50.0, 200.0)
}

fn default_shadow_size() -> u32 {
    1024
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: default_light_position(),
            shadow_size: default_shadow_size(),
        }
    }
}

// =============================================================================
// [assets]
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AssetsConfig {
    #[serde(default = "default_hotbed_texture")]
    pub hotbed_texture: PathBuf,
    #[serde(default = "default_brass_texture")]
    pub brass_texture: PathBuf,
    /// Soft round mask applied across line quads
    #[serde(default = "default_line_texture")]
    pub line_texture: PathBuf,
    #[serde(default = "default_nozzle_model")]
    pub nozzle_model: PathBuf,
    #[serde(default = "default_font")]
    pub font: PathBuf,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

fn default_hotbed_texture() -> PathBuf {
    PathBuf::from("gfx/hb.png")
}

fn default_brass_texture() -> PathBuf {
    PathBuf::from("gfx/brass.png")
}

fn default_line_texture() -> PathBuf {
    PathBuf::from("gfx/BlurryCircle.png")
}

fn default_nozzle_model() -> PathBuf {
    PathBuf::from("gfx/buserror-nozzle-model.obj")
}

fn default_font() -> PathBuf {
    PathBuf::from("gfx/VeraMono.ttf")
}

fn default_font_size() -> f32 {
    18.0
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            hotbed_texture: default_hotbed_texture(),
            brass_texture: default_brass_texture(),
            line_texture: default_line_texture(),
            nozzle_model: default_nozzle_model(),
            font: default_font(),
            font_size: default_font_size(),
        }
    }
}

// =============================================================================
// [frame]
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FrameConfig {
    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,
    /// Stop after this many frames, 0 runs until quit
    #[serde(default)]
    pub max_frames: u64,
}

fn default_rate_hz() -> u32 {
    24
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
            max_frames: 0,
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] when none is given
    ///
    /// An explicit path must exist; the default file may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_from_file(path)
                } else {
                    tracing::debug!("{} not found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    pub fn fov_radians(&self) -> f32 {
        self.camera.fov_degrees.to_radians()
    }

    /// Real time between two frames
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_nanos(1_000_000_000 / u64::from(self.frame.rate_hz.max(1)))
    }
}
