//! Printer scene
//!
//! Builds the 3D view of the machine: a lit hotbed with a millimetre grid,
//! the nozzle model carried by a head object, and a light that also renders
//! a shadow view.

use crate::config::AppConfig;
use crate::driver::TraceDriver;
use anyhow::{Context as _, Result};
use c3_scene::{
    primitives, Camera, Color, Context, CubeFaces, GeometryKind, Mat4, Material,
    ObjectKey, PixelFormat, RenderTarget, Texture, Vec2, Vec3, View, ViewMask, Visibility,
};
use serde::Serialize;
use tracing::{info, warn};

/// Eye view index
pub const EYE_VIEW: usize = 0;
/// Light (shadow) view index
pub const LIGHT_VIEW: usize = 1;

/// Render target of the shadow map
pub const SHADOW_TARGET: RenderTarget = RenderTarget(1);

const GRID_COLOR: Color = Color::rgba(0.0, 0.0, 0.0, 0.9);
const GRID_WIDTH: f32 = 0.18;
/// Grid lines every 10 mm, 1..20
const GRID_STEPS: u32 = 20;
const GRID_PITCH: f32 = 10.0;

pub struct PrinterScene {
    pub c3: Context<TraceDriver>,
    /// Object moved to the head position every frame
    pub head: ObjectKey,
    /// Carries the light and its bulb
    pub light_hook: ObjectKey,
    /// Nozzle model, when it loaded
    pub nozzle: Option<ObjectKey>,
}

impl PrinterScene {
    pub fn build(config: &AppConfig) -> Result<Self> {
        let mut c3 = Context::new(
            config.window.width,
            config.window.height,
            TraceDriver::new("scene"),
        );
        let root = c3.root();

        {
            let mut camera = Camera::looking(config.camera.eye, config.camera.lookat, Vec3::Z);
            camera.fov = config.fov_radians();
            let eye = c3.current_view_mut();
            eye.camera = camera;
            eye.mark_dirty();
        }

        let white = c3
            .textures_mut()
            .insert(Texture::solid("white", Color::WHITE));

        // light, with its bulb, riding on a hook object
        let light_hook = c3.scene_mut().add_object(root)?;
        c3.scene_mut().set_name(light_hook, "light hook")?;
        c3.scene_mut()
            .set_transform(light_hook, Mat4::translation(config.light.position))?;
        let mut light = primitives::light(0).hidden_from(ViewMask::of(LIGHT_VIEW));
        if let GeometryKind::Light(l) = &mut light.kind {
            l.ambient = Color::rgb(0.5, 0.5, 0.5);
            l.specular = Color::rgb(0.5, 0.5, 0.5);
        }
        c3.scene_mut().add_geometry(light_hook, light)?;
        let bulb = primitives::uv_sphere(Vec3::ZERO, 3.0, 10, 10)
            .with_name("light bulb")
            .with_material(Material::colored(Color::YELLOW).with_texture(white))
            .hidden_from(ViewMask::of(LIGHT_VIEW));
        c3.scene_mut().add_geometry(light_hook, bulb)?;

        let size = config.light.shadow_size as f32;
        let light_view = View::light(Vec2::new(size, size))
            .with_camera(Camera::looking(
                config.light.position,
                config.camera.lookat,
                Vec3::Z,
            ))
            .with_target(SHADOW_TARGET);
        let index = c3.add_view(light_view)?;
        if index != LIGHT_VIEW {
            anyhow::bail!("light view landed at index {}", index);
        }

        // hotbed
        let hb_texture = c3
            .textures_mut()
            .load(&config.assets.hotbed_texture, PixelFormat::Rgb);
        let mut material = Material::colored(Color::WHITE);
        material.texture = hb_texture;
        let bed = primitives::cube(
            Vec3::new(100.0, 100.0, -1.0),
            Vec3::new(200.0, 200.0, 2.0),
            CubeFaces::CENTER | CubeFaces::ALL,
        )
        .with_name("hotbed")
        .with_material(material);
        c3.scene_mut().add_geometry(root, bed)?;

        // grid, not casting shadows
        let grid = c3.scene_mut().add_object(root)?;
        c3.scene_mut().set_name(grid, "grid")?;
        c3.scene_mut()
            .set_visibility(grid, Visibility::HiddenFrom(ViewMask::of(LIGHT_VIEW)))?;
        let mut material = Material::colored(GRID_COLOR);
        material.texture = c3
            .textures_mut()
            .load(&config.assets.line_texture, PixelFormat::Alpha);
        let lines = primitives::lines(&grid_points(), GRID_WIDTH)
            .with_name("grid lines")
            .with_material(material);
        c3.scene_mut().add_geometry(grid, lines)?;

        // head and nozzle
        let head = c3.scene_mut().add_object(root)?;
        c3.scene_mut().set_name(head, "head")?;
        let nozzle = c3_scene::load_obj(&config.assets.nozzle_model, c3.scene_mut(), head);
        match nozzle {
            Some(nozzle) => {
                let brass = c3
                    .textures_mut()
                    .load(&config.assets.brass_texture, PixelFormat::Rgba);
                let keys = c3.scene().geometries_of(nozzle).to_vec();
                for key in keys {
                    let brass = brass.clone();
                    c3.scene_mut().update_geometry(key, |g| {
                        g.material.texture = brass;
                        g.material.shininess = 5.0;
                    })?;
                }
            }
            None => warn!("no nozzle model, the head is empty"),
        }

        info!(
            "printer scene: {} objects, {} geometries, {} textures",
            c3.scene().object_count(),
            c3.scene().geometry_count(),
            c3.textures().len()
        );
        Ok(Self {
            c3,
            head,
            light_hook,
            nozzle,
        })
    }

    /// Move the head to a machine position in millimetres
    pub fn set_head_position(&mut self, position: [f32; 3]) -> Result<()> {
        let [x, y, z] = position;
        self.c3
            .scene_mut()
            .set_transform(self.head, Mat4::translation(Vec3::new(x, y, z)))
            .context("moving head")
    }

    /// Swap the light view between the shadow map and the screen
    pub fn toggle_light_target(&mut self) -> RenderTarget {
        match self.c3.view_mut(LIGHT_VIEW) {
            Some(view) => {
                view.target = if view.target == SHADOW_TARGET {
                    RenderTarget::SCREEN
                } else {
                    SHADOW_TARGET
                };
                view.mark_dirty();
                view.target
            }
            None => RenderTarget::SCREEN,
        }
    }

    /// Projected geometry of the light view, in draw order
    pub fn light_view_dump(&self) -> Vec<DumpEntry> {
        let scene = self.c3.scene();
        let Some(view) = self.c3.view(LIGHT_VIEW) else {
            return Vec::new();
        };
        view.projected()
            .iter()
            .filter_map(|&key| scene.geometry(key))
            .map(|g| DumpEntry {
                name: g.name.clone(),
                kind: g.kind.label(),
                min: g.world_bbox().min.to_array(),
                max: g.world_bbox().max.to_array(),
            })
            .collect()
    }
}

/// One line of a view dump
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DumpEntry {
    pub name: String,
    pub kind: &'static str,
    pub min: [f32; 3],
    pub max: [f32; 3],
}

/// A cross of lines at every grid step, across the whole bed
fn grid_points() -> Vec<Vec3> {
    let extent = GRID_STEPS as f32 * GRID_PITCH;
    let mut points = Vec::with_capacity((GRID_STEPS as usize - 1) * 4);
    for step in 1..GRID_STEPS {
        let at = step as f32 * GRID_PITCH;
        points.push(Vec3::new(at, 0.0, 0.0));
        points.push(Vec3::new(at, extent, 0.0));
        points.push(Vec3::new(0.0, at, 0.0));
        points.push(Vec3::new(extent, at, 0.0));
    }
    points
}
