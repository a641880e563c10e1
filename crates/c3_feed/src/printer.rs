//! Synthetic printer
//!
//! Drives the machine state the way a running print would: heat both pots
//! to temperature, then raster the head back and forth over a square,
//! one layer at a time.

use crate::heatpot::{HeatPot, TallySource};
use crate::state::{Axis, Heater, MachineState};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info};

/// Synthetic print job settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PrinterConfig {
    /// Head speed along the raster, mm/s
    #[serde(default = "default_feed_rate")]
    pub feed_rate: f32,
    #[serde(default = "default_hotend_ambient")]
    pub hotend_ambient: f32,
    #[serde(default = "default_hotbed_ambient")]
    pub hotbed_ambient: f32,
    #[serde(default = "default_hotend_target")]
    pub hotend_target: f32,
    #[serde(default = "default_hotbed_target")]
    pub hotbed_target: f32,
    /// Corner of the printed square nearest the origin, mm
    #[serde(default = "default_print_min")]
    pub print_min: [f32; 2],
    #[serde(default = "default_print_max")]
    pub print_max: [f32; 2],
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f32,
    #[serde(default = "default_layer_height")]
    pub layer_height: f32,
    /// Filament pushed per mm of printed line
    #[serde(default = "default_extrusion")]
    pub extrusion: f32,
    /// Real time between two simulation steps
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Simulated seconds per real second
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,
    /// Hold the head until both heaters reach their targets
    #[serde(default = "default_wait_for_heat")]
    pub wait_for_heat: bool,
}

fn default_feed_rate() -> f32 {
    60.0
}

fn default_hotend_ambient() -> f32 {
    28.0
}

fn default_hotbed_ambient() -> f32 {
    25.0
}

fn default_hotend_target() -> f32 {
    210.0
}

fn default_hotbed_target() -> f32 {
    60.0
}

fn default_print_min() -> [f32; 2] {
    [70.0, 70.0]
}

fn default_print_max() -> [f32; 2] {
    [130.0, 130.0]
}

fn default_line_spacing() -> f32 {
    2.0
}

fn default_layer_height() -> f32 {
    0.3
}

fn default_extrusion() -> f32 {
    0.05
}

fn default_tick_ms() -> u64 {
    10
}

fn default_time_scale() -> f32 {
    1.0
}

fn default_wait_for_heat() -> bool {
    true
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            feed_rate: default_feed_rate(),
            hotend_ambient: default_hotend_ambient(),
            hotbed_ambient: default_hotbed_ambient(),
            hotend_target: default_hotend_target(),
            hotbed_target: default_hotbed_target(),
            print_min: default_print_min(),
            print_max: default_print_max(),
            line_spacing: default_line_spacing(),
            layer_height: default_layer_height(),
            extrusion: default_extrusion(),
            tick_ms: default_tick_ms(),
            time_scale: default_time_scale(),
            wait_for_heat: default_wait_for_heat(),
        }
    }
}

/// Serpentine head path over a rectangle, layer after layer
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    min: [f32; 2],
    max: [f32; 2],
    spacing: f32,
    layer_height: f32,
    extrusion: f32,
    /// x, y, z, e
    pos: [f32; 4],
    target: [f32; 2],
    printing: bool,
    layer: u32,
}

impl Raster {
    /// Waypoints closer than this count as reached
    const EPSILON: f32 = 1e-4;

    pub fn new(config: &PrinterConfig) -> Self {
        let min = config.print_min;
        let max = [
            config.print_max[0].max(min[0]),
            config.print_max[1].max(min[1]),
        ];
        Self {
            min,
            max,
            spacing: config.line_spacing.max(0.01),
            layer_height: config.layer_height,
            extrusion: config.extrusion,
            pos: [min[0], min[1], config.layer_height, 0.0],
            target: [max[0], min[1]],
            printing: true,
            layer: 0,
        }
    }

    pub fn position(&self) -> [f32; 4] {
        self.pos
    }

    pub fn layer(&self) -> u32 {
        self.layer
    }

    /// Move up to `distance` mm along the path
    pub fn advance(&mut self, distance: f32) -> [f32; 4] {
        let mut budget = distance;
        // each waypoint consumes at least one pass, cap runaway loops on tiny areas
        for _ in 0..1024 {
            if budget <= 0.0 {
                break;
            }
            let dx = self.target[0] - self.pos[0];
            let dy = self.target[1] - self.pos[1];
            let d = (dx * dx + dy * dy).sqrt();
            let travel = d.min(budget);
            if d > Self::EPSILON {
                self.pos[0] += dx / d * travel;
                self.pos[1] += dy / d * travel;
            }
            if self.printing {
                self.pos[3] += travel * self.extrusion;
            }
            budget -= travel;
            if d - travel <= Self::EPSILON {
                self.pos[0] = self.target[0];
                self.pos[1] = self.target[1];
                self.next_waypoint();
            }
        }
        self.pos
    }

    fn next_waypoint(&mut self) {
        let [x, y] = self.target;
        if self.printing {
            let ny = y + self.spacing;
            if ny > self.max[1] + Self::EPSILON {
                self.layer += 1;
                self.pos[2] += self.layer_height;
                self.target = [self.min[0], self.min[1]];
                debug!("raster: layer {} at z {:.2}", self.layer, self.pos[2]);
            } else {
                self.target = [x, ny];
            }
            self.printing = false;
        } else {
            let nx = if (x - self.min[0]).abs() <= Self::EPSILON {
                self.max[0]
            } else {
                self.min[0]
            };
            self.target = [nx, y];
            self.printing = true;
        }
    }
}

/// Thermal model plus head path, stepped in simulated time
#[derive(Clone, Debug)]
pub struct SyntheticPrinter {
    config: PrinterConfig,
    raster: Raster,
    hotend: HeatPot,
    hotbed: HeatPot,
    heated: bool,
}

impl SyntheticPrinter {
    pub fn new(config: PrinterConfig) -> Self {
        Self {
            raster: Raster::new(&config),
            hotend: HeatPot::hotend().at_ambient(config.hotend_ambient),
            hotbed: HeatPot::hotbed().at_ambient(config.hotbed_ambient),
            heated: !config.wait_for_heat,
            config,
        }
    }

    pub fn hotend(&self) -> &HeatPot {
        &self.hotend
    }

    pub fn hotbed(&self) -> &HeatPot {
        &self.hotbed
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn is_heated(&self) -> bool {
        self.heated
    }

    /// Advance by `dt` of simulated time and publish the result
    pub fn step(&mut self, dt: Duration, state: &MachineState) {
        let end_on = self.hotend.current < self.config.hotend_target;
        let bed_on = self.hotbed.current < self.config.hotbed_target;
        let fan = self.raster.layer() > 0;
        let on = |enabled: bool, cost: f32| if enabled { cost } else { 0.0 };
        self.hotend
            .tally(TallySource::HotendPwm, on(end_on, HeatPot::HOTEND_PWM));
        self.hotend
            .tally(TallySource::HotendFan, on(fan, HeatPot::HOTEND_FAN));
        self.hotbed.tally(TallySource::Hotbed, on(bed_on, HeatPot::HOTBED));
        self.hotend.advance(dt);
        self.hotbed.advance(dt);

        if !self.heated && !end_on && !bed_on {
            self.heated = true;
            info!(
                "printer heated: hotend {:.1}C, hotbed {:.1}C",
                self.hotend.current, self.hotbed.current
            );
        }
        let pos = if self.heated {
            self.raster.advance(self.config.feed_rate * dt.as_secs_f32())
        } else {
            self.raster.position()
        };

        for (axis, value) in Axis::ALL.into_iter().zip(pos) {
            state.publish_axis(axis, value);
        }
        state.publish_temperature(Heater::Hotend, self.hotend.current);
        state.publish_temperature(Heater::Hotbed, self.hotbed.current);
    }

    /// Run on a background thread until the handle is stopped
    pub fn spawn(mut self, state: Arc<MachineState>) -> std::io::Result<FeedHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let tick = Duration::from_millis(self.config.tick_ms.max(1));
        let sim_dt = tick.mul_f32(self.config.time_scale.max(0.0));
        let thread = std::thread::Builder::new()
            .name("c3-feed".to_string())
            .spawn(move || {
                debug!("feed thread started, tick {:?}", tick);
                while !flag.load(Ordering::Acquire) {
                    self.step(sim_dt, &state);
                    std::thread::sleep(tick);
                }
                debug!("feed thread stopped");
            })?;
        Ok(FeedHandle {
            stop,
            thread: Some(thread),
        })
    }
}

/// Owner of the feed thread; stopping joins it
#[derive(Debug)]
pub struct FeedHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl FeedHandle {
    /// Signal the thread and wait for it to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("feed thread panicked");
            }
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
