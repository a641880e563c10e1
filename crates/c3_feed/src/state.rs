//! Shared machine state
//!
//! Values are f32 bit patterns in atomics. Each field is read and written
//! on its own with relaxed ordering, so a sample may mix values from two
//! publishes. That is fine for display.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    /// Extruder filament position
    E,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Z, Axis::E];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heater {
    Hotend,
    Hotbed,
}

impl Heater {
    fn index(self) -> usize {
        self as usize
    }
}

/// Latest published printer values
#[derive(Debug, Default)]
pub struct MachineState {
    axes: [AtomicU32; 4],
    temperatures: [AtomicU32; 2],
    sequence: AtomicU64,
}

impl MachineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an axis position in millimetres
    pub fn publish_axis(&self, axis: Axis, mm: f32) {
        self.axes[axis.index()].store(mm.to_bits(), Ordering::Relaxed);
        self.sequence.fetch_add(1, Ordering::Relaxed);
    }

    /// Store a heater temperature in degrees Celsius
    pub fn publish_temperature(&self, heater: Heater, celsius: f32) {
        self.temperatures[heater.index()].store(celsius.to_bits(), Ordering::Relaxed);
        self.sequence.fetch_add(1, Ordering::Relaxed);
    }

    pub fn axis(&self, axis: Axis) -> f32 {
        f32::from_bits(self.axes[axis.index()].load(Ordering::Relaxed))
    }

    pub fn temperature(&self, heater: Heater) -> f32 {
        f32::from_bits(self.temperatures[heater.index()].load(Ordering::Relaxed))
    }

    /// Number of publishes so far
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    pub fn sample(&self) -> MachineSnapshot {
        MachineSnapshot {
            x: self.axis(Axis::X),
            y: self.axis(Axis::Y),
            z: self.axis(Axis::Z),
            e: self.axis(Axis::E),
            hotend: self.temperature(Heater::Hotend),
            hotbed: self.temperature(Heater::Hotbed),
            sequence: self.sequence(),
        }
    }
}

/// Copy of the machine state taken at one instant
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub e: f32,
    pub hotend: f32,
    pub hotbed: f32,
    pub sequence: u64,
}

impl MachineSnapshot {
    /// Head position in millimetres
    pub fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// One-line status shown in the overlay
    pub fn status_line(&self) -> String {
        format!(
            "X:{:6.2} Y:{:6.2} Z:{:5.2} E:{:7.2}  T:{:5.1}C B:{:5.1}C",
            self.x, self.y, self.z, self.e, self.hotend, self.hotbed
        )
    }
}
