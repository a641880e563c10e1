//! Printer simulation feed
//!
//! The renderer reads machine state once per frame from a [`MachineState`]
//! that a simulation thread keeps publishing to. Reads never block and never
//! write back: the feed flows one way, from simulation to display.
//!
//! [`SyntheticPrinter`] stands in for a firmware simulation. It rasters the
//! head over the bed and runs two [`HeatPot`] thermal models toward their
//! targets.

pub mod heatpot;
pub mod printer;
pub mod state;

pub use heatpot::{HeatPot, TallySource, RESAMPLE_INTERVAL};
pub use printer::{FeedHandle, PrinterConfig, Raster, SyntheticPrinter};
pub use state::{Axis, Heater, MachineSnapshot, MachineState};
