//! Lumped thermal model
//!
//! A heat pot holds one running temperature. Sources register a signed
//! per-sample cost in a tally slot; on every resample the slot costs are
//! summed into the temperature, which never drops below ambient. With only
//! the (negative) ambient drift registered the pot settles at ambient.

use std::time::Duration;
use tracing::trace;

/// Simulated time between two resamples
pub const RESAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Tally slots, one per heat source or sink
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TallySource {
    /// Constant drift toward ambient
    Ambient = 0,
    HotendPwm = 1,
    HotendFan = 2,
    Hotbed = 3,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeatPot {
    pub name: String,
    pub ambient: f32,
    pub current: f32,
    tally: [f32; 4],
    pending: Duration,
}

impl HeatPot {
    /// Hotend heater cost per resample while on
    pub const HOTEND_PWM: f32 = 2.0;
    /// Hotbed heater cost per resample while on
    pub const HOTBED: f32 = 1.6;
    /// Hotend fan cost per resample while on
    pub const HOTEND_FAN: f32 = -0.05;

    /// Pot starting at `ambient` with nothing registered
    pub fn new(name: impl Into<String>, ambient: f32) -> Self {
        Self {
            name: name.into(),
            ambient,
            current: ambient,
            tally: [0.0; 4],
            pending: Duration::ZERO,
        }
    }

    /// Hotend pot: 28 C ambient, drifting -0.5 per resample
    pub fn hotend() -> Self {
        let mut pot = Self::new("hotend", 28.0);
        pot.tally(TallySource::Ambient, -0.5);
        pot
    }

    /// Hotbed pot: 25 C ambient, drifting -0.3 per resample
    pub fn hotbed() -> Self {
        let mut pot = Self::new("hotbed", 25.0);
        pot.tally(TallySource::Ambient, -0.3);
        pot
    }

    /// Same pot with a different ambient, restarted at it
    pub fn at_ambient(mut self, ambient: f32) -> Self {
        self.ambient = ambient;
        self.current = ambient;
        self
    }

    /// Set the per-resample cost of `source`
    pub fn tally(&mut self, source: TallySource, cost: f32) {
        self.tally[source as usize] = cost;
    }

    pub fn tally_sum(&self) -> f32 {
        self.tally.iter().sum()
    }

    /// Apply one interval's worth of tallies
    pub fn resample(&mut self) {
        self.current = (self.current + self.tally_sum()).max(self.ambient);
        trace!("{}: {:.2}C", self.name, self.current);
    }

    /// Let `dt` of simulated time pass, resampling once per interval
    ///
    /// Returns the number of resamples run.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.pending += dt;
        let mut count = 0;
        while self.pending >= RESAMPLE_INTERVAL {
            self.pending -= RESAMPLE_INTERVAL;
            self.resample();
            count += 1;
        }
        count
    }
}
