//! Application state and the fixed-rate frame loop

use crate::config::AppConfig;
use crate::controls::{self, Command, InputEvent};
use crate::hud::Hud;
use crate::scene::{DumpEntry, PrinterScene, EYE_VIEW, LIGHT_VIEW};
use anyhow::{Context as _, Result};
use c3_feed::{FeedHandle, MachineSnapshot, MachineState, SyntheticPrinter};
use c3_scene::shadow_matrix;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Per-frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Geometry drawn across both scene views
    pub scene_geometries: usize,
    pub hud_geometries: usize,
}

pub struct App {
    pub config: AppConfig,
    pub scene: PrinterScene,
    pub hud: Hud,
    state: Arc<MachineState>,
    feed: Option<FeedHandle>,
    frames: u64,
    quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let scene = PrinterScene::build(&config).context("building printer scene")?;
        let hud = Hud::build(&config).context("building overlay")?;
        Ok(Self {
            config,
            scene,
            hud,
            state: Arc::new(MachineState::new()),
            feed: None,
            frames: 0,
            quit: false,
        })
    }

    /// Start the synthetic printer thread
    pub fn start_feed(&mut self) -> Result<()> {
        if self.feed.is_none() {
            let printer = SyntheticPrinter::new(self.config.sim.clone());
            let handle = printer
                .spawn(Arc::clone(&self.state))
                .context("starting printer feed")?;
            info!("printer feed started");
            self.feed = Some(handle);
        }
        Ok(())
    }

    pub fn state(&self) -> &Arc<MachineState> {
        &self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Render one frame from the latest machine state
    pub fn frame(&mut self) -> Result<FrameStats> {
        let snapshot = self.state.sample();
        self.scene.set_head_position(snapshot.position())?;
        self.hud.update_status(&snapshot)?;

        let mut stats = FrameStats::default();
        let c3 = &mut self.scene.c3;
        for index in [LIGHT_VIEW, EYE_VIEW] {
            c3.set_current(index)?;
            c3.project();
            if index == EYE_VIEW {
                if let Some(light) = c3.view(LIGHT_VIEW) {
                    let shadow = shadow_matrix(light);
                    c3.driver_mut().set_shadow_matrix(shadow);
                }
            }
            stats.scene_geometries += c3.draw().geometries;
        }
        stats.hud_geometries = self.hud.c3.draw().geometries;

        self.frames += 1;
        debug!(
            "frame {}: {} scene, {} overlay geometries",
            self.frames, stats.scene_geometries, stats.hud_geometries
        );
        Ok(stats)
    }

    /// Apply one input event
    pub fn handle(&mut self, event: InputEvent) -> Result<()> {
        if let InputEvent::Key(key) = event {
            match Command::from_key(key) {
                Some(command) => self.command(command)?,
                None => debug!("unbound key {:?}", key),
            }
            return Ok(());
        }
        let eye = self
            .scene
            .c3
            .view_mut(EYE_VIEW)
            .context("eye view missing")?;
        if controls::apply_camera(&mut eye.camera, event) {
            eye.mark_dirty();
        }
        Ok(())
    }

    fn command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Quit => self.quit = true,
            Command::ToggleDecal => {
                self.hud.toggle_decal()?;
                self.scene.c3.mark_dirty();
            }
            Command::ToggleShadowTarget => {
                let target = self.scene.toggle_light_target();
                info!("light view target {}", target.0);
            }
            Command::ToggleFxaa => {
                let enabled = self.hud.toggle_fxaa()?;
                info!("fxaa {}", if enabled { "on" } else { "off" });
            }
            Command::DumpLightView => {
                for entry in self.dump() {
                    info!(
                        "{} {}: {:?} - {:?}",
                        entry.kind, entry.name, entry.min, entry.max
                    );
                }
            }
        }
        Ok(())
    }

    /// Light view geometry as of the last projection
    pub fn dump(&self) -> Vec<DumpEntry> {
        self.scene.light_view_dump()
    }

    /// Project the light view once and dump it
    pub fn project_and_dump(&mut self) -> Result<Vec<DumpEntry>> {
        let c3 = &mut self.scene.c3;
        c3.set_current(LIGHT_VIEW)?;
        c3.project();
        c3.set_current(EYE_VIEW)?;
        Ok(self.dump())
    }

    /// Run frames at the configured rate
    ///
    /// `script` events are fed one per frame, see [`InputEvent::from_script`]. Stops after `max_frames` frames
    /// (0 for no limit) or on quit.
    pub fn run(&mut self, max_frames: u64, script: &str) -> Result<u64> {
        let interval = self.config.frame_interval();
        let mut events: VecDeque<InputEvent> = script.chars().map(InputEvent::from_script).collect();
        let mut next = Instant::now();
        while !self.quit && (max_frames == 0 || self.frames < max_frames) {
            if let Some(event) = events.pop_front() {
                self.handle(event)?;
                if self.quit {
                    break;
                }
            }
            self.frame()?;
            next += interval;
            let now = Instant::now();
            if next > now {
                std::thread::sleep(next - now);
            } else {
                next = now;
            }
        }
        info!("{} frames rendered", self.frames);
        Ok(self.frames)
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        self.state.sample()
    }

    /// Stop the feed and tear both contexts down
    pub fn shutdown(mut self) {
        if let Some(feed) = self.feed.take() {
            feed.stop();
        }
        let scene = self.scene.c3.dispose();
        let hud = self.hud.c3.dispose();
        info!(
            "shutdown: {} scene draws, {} overlay draws",
            scene.total_draws(),
            hud.total_draws()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c3_feed::{Axis, Heater};
    use c3_scene::{RenderTarget, ViewKind};
    use crate::controls::MouseButton;
    use crate::driver::CullFace;

    /// No assets, a fast frame rate and an unheated printer
    fn fast_config() -> AppConfig {
        let mut config = AppConfig::default();
        let missing = std::path::PathBuf::from("/nonexistent/c3_reprap");
        config.assets.hotbed_texture = missing.join("hb.png");
        config.assets.brass_texture = missing.join("brass.png");
        config.assets.line_texture = missing.join("line.png");
        config.assets.nozzle_model = missing.join("nozzle.obj");
        config.assets.font = missing.join("font.ttf");
        config.frame.rate_hz = 1000;
        config.sim.tick_ms = 1;
        config.sim.wait_for_heat = false;
        config
    }

    #[test]
    fn test_frame_follows_state() {
        let mut app = App::new(fast_config()).unwrap();
        app.state().publish_axis(Axis::X, 50.0);
        app.state().publish_axis(Axis::Y, 60.0);
        app.state().publish_temperature(Heater::Hotend, 200.0);
        let stats = app.frame().unwrap();
        // hotbed in the light view; light, bulb, hotbed, grid in the eye view
        assert_eq!(stats.scene_geometries, 5);
        let head = app.scene.c3.scene().world_transform(app.scene.head).unwrap();
        assert_eq!(head.position().x, 50.0);
        let status = app.hud.c3.scene().geometry(app.hud.status).unwrap();
        assert!(status.text_state().unwrap().text.contains("T:200.0C"));
    }

    #[test]
    fn test_frame_ends_on_eye_view() {
        let mut app = App::new(fast_config()).unwrap();
        app.frame().unwrap();
        let driver = app.scene.c3.driver();
        assert_eq!(driver.views_begun(), 2);
        assert_eq!(driver.cull_face(), Some(CullFace::Back));
        assert_eq!(app.scene.c3.current_view().kind, ViewKind::Eye);
        assert_ne!(driver.last_uniform().unwrap().shadow, c3_scene::Mat4::IDENTITY.to_cols_array());
    }

    #[test]
    fn test_keys_drive_commands() {
        let mut app = App::new(fast_config()).unwrap();
        app.handle(InputEvent::Key('m')).unwrap();
        assert!(app.hud.decal_visible());
        app.handle(InputEvent::Key('d')).unwrap();
        assert_eq!(
            app.scene.c3.view(LIGHT_VIEW).unwrap().target,
            RenderTarget::SCREEN
        );
        app.handle(InputEvent::Key('1')).unwrap();
        assert!(!app.hud.fxaa_enabled());
        app.handle(InputEvent::Key('q')).unwrap();
        assert!(app.should_quit());
    }

    #[test]
    fn test_drag_dirties_eye_view() {
        let mut app = App::new(fast_config()).unwrap();
        app.frame().unwrap();
        assert!(!app.scene.c3.view(EYE_VIEW).unwrap().dirty);
        app.handle(InputEvent::Drag {
            button: MouseButton::Left,
            dx: 8.0,
            dy: 0.0,
        })
        .unwrap();
        assert!(app.scene.c3.view(EYE_VIEW).unwrap().dirty);
    }

    #[test]
    fn test_project_and_dump() {
        let mut app = App::new(fast_config()).unwrap();
        let dump = app.project_and_dump().unwrap();
        assert_eq!(dump.len(), 1);
        assert_eq!(dump[0].name, "hotbed");
    }

    #[test]
    fn test_run_with_feed_and_script() {
        let mut app = App::new(fast_config()).unwrap();
        app.start_feed().unwrap();
        assert_eq!(app.run(3, "").unwrap(), 3);
        assert_eq!(app.run(10, "mq").unwrap(), 4);
        assert!(app.should_quit());
        app.shutdown();
    }
}
