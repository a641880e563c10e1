//! Heads-up overlay
//!
//! A second context drawn over the printer scene in window pixels. It holds
//! the full-screen anti-aliasing pass, a divider line, the shadow map decal
//! and the status text.

use crate::config::AppConfig;
use crate::driver::TraceDriver;
use anyhow::Result;
use c3_feed::MachineSnapshot;
use c3_scene::{
    primitives, Color, Context, GeometryKey, Mat4, Material, PixelFormat, ProgramId, Vec2, Vec3,
    View, ViewMask,
};
use c3_scene::{Geometry, TextAlign};
use c3_text::Font;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shader program of the anti-aliasing pass
pub const FXAA_PROGRAM: ProgramId = ProgramId(1);

const LINE_COLOR: Color = Color::rgba(0.5, 0.5, 1.0, 0.3);
const LINE_WIDTH: f32 = 10.0;
const TEXT_COLOR: Color = Color::rgba(0.5, 0.5, 0.5, 1.0);
const TEXT_ORIGIN: Vec2 = Vec2::new(1.0, 20.0);
const DECAL_SIZE: f32 = 256.0;

pub struct Hud {
    pub c3: Context<TraceDriver>,
    pub fxaa: GeometryKey,
    pub status: GeometryKey,
    pub decal: GeometryKey,
}

impl Hud {
    pub fn build(config: &AppConfig) -> Result<Self> {
        let (w, h) = (config.window.width, config.window.height);
        let size = Vec2::new(w as f32, h as f32);
        let mut c3 = Context::new(w, h, TraceDriver::new("hud"));
        *c3.current_view_mut() = View::screen_overlay(size);
        let root = c3.root();

        // the 3D scene is rendered into a buffer, then resolved through this quad
        let mut fxaa = primitives::sprite(size).with_name("fxaa");
        fxaa.material.program = Some(FXAA_PROGRAM);
        let fxaa = c3.scene_mut().add_geometry(root, fxaa)?;

        let mut material = Material::colored(LINE_COLOR);
        material.texture = c3
            .textures_mut()
            .load(&config.assets.line_texture, PixelFormat::Alpha);
        let line = primitives::lines(
            &[
                Vec3::new(10.0, 10.0, 0.0),
                Vec3::new(size.x - 10.0, 10.0, 0.0),
            ],
            LINE_WIDTH,
        )
        .with_name("divider")
        .with_material(material);
        c3.scene_mut().add_geometry(root, line)?;

        let hook = c3.scene_mut().add_object(root)?;
        c3.scene_mut().set_name(hook, "decal hook")?;
        c3.scene_mut()
            .set_transform(hook, Mat4::translation(Vec3::new(1.0, 100.0, 0.0)))?;
        let decal = primitives::sprite(Vec2::new(DECAL_SIZE, DECAL_SIZE))
            .with_name("shadow decal")
            .hidden_from(ViewMask::ALL);
        let decal = c3.scene_mut().add_geometry(hook, decal)?;

        let text = Geometry::text(TextAlign::Left)
            .with_name("status")
            .with_color(TEXT_COLOR);
        let status = c3.scene_mut().add_geometry(root, text)?;
        if let Err(e) = c3.set_text_font(status, &config.assets.font, config.assets.font_size) {
            warn!("{}, using the built-in monospace font", e);
            c3.set_font(status, Arc::new(Font::monospace_fallback(config.assets.font_size)))?;
        }

        let mut hud = Self {
            c3,
            fxaa,
            status,
            decal,
        };
        hud.update_status(&MachineSnapshot::default())?;
        Ok(hud)
    }

    /// Refresh the status text from a feed snapshot
    pub fn update_status(&mut self, snapshot: &MachineSnapshot) -> Result<()> {
        let line = snapshot.status_line();
        self.c3.set_text(self.status, TEXT_ORIGIN, &line)?;
        Ok(())
    }

    pub fn fxaa_enabled(&self) -> bool {
        self.c3
            .scene()
            .geometry(self.fxaa)
            .is_some_and(|g| g.material.program == Some(FXAA_PROGRAM))
    }

    /// Switch the anti-aliasing pass on the full-screen quad; returns
    /// whether it is now enabled
    pub fn toggle_fxaa(&mut self) -> Result<bool> {
        let enabled = !self.fxaa_enabled();
        let program = enabled.then_some(FXAA_PROGRAM);
        self.c3
            .scene_mut()
            .update_geometry(self.fxaa, |g| g.material.program = program)?;
        debug!("fxaa {}", if enabled { "on" } else { "off" });
        Ok(enabled)
    }

    pub fn decal_visible(&self) -> bool {
        self.c3
            .scene()
            .geometry(self.decal)
            .is_some_and(|g| g.hidden.is_empty())
    }

    /// Show or hide the shadow map decal; returns the new visibility
    pub fn toggle_decal(&mut self) -> Result<bool> {
        let visible = !self.decal_visible();
        let mask = if visible { ViewMask::NONE } else { ViewMask::ALL };
        self.c3
            .scene_mut()
            .update_geometry(self.decal, |g| g.hidden = mask)?;
        self.c3.mark_dirty();
        debug!("decal {}", if visible { "shown" } else { "hidden" });
        Ok(visible)
    }
}
