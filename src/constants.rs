//! Default tuning constants and the action IDs of the built-in experiment.
//!
//! ## Defaults
//!
//! The numeric defaults describe a bench-scale RC circuit: a 1000 µF
//! electrolytic discharged through a 5 kΩ resistor (τ = 5 s), charged from
//! a 0-12 V bench supply. Distances are in bench units (the same units the
//! presentation layer uses for world positions).

use crate::math::Scalar;

/// Radius within which a released wire end snaps onto a connection point.
pub const DEFAULT_SNAP_RADIUS: Scalar = 0.5;

/// Linear charging rate in volts per second.
pub const DEFAULT_CHARGE_RATE: Scalar = 2.0;
/// A capacitor holding more than this starts discharging when power is lost.
pub const DEFAULT_DISCHARGE_THRESHOLD: Scalar = 0.1;
/// Voltage at which a discharge is considered finished.
pub const DEFAULT_DISCHARGE_FLOOR: Scalar = 0.3;
/// Upper bound on the length of one discharge, in seconds.
pub const DEFAULT_MAX_DISCHARGE_TIME: Scalar = 40.0;
/// Interval between recorded discharge samples, in seconds.
pub const DEFAULT_SAMPLE_INTERVAL: Scalar = 0.5;
/// Voltage mapped to full indicator brightness.
pub const DEFAULT_REFERENCE_VOLTAGE: Scalar = 12.0;

/// Default capacitance in farads.
pub const DEFAULT_CAPACITANCE: Scalar = 1.0e-3;
/// Default discharge resistance in ohms.
pub const DEFAULT_RESISTANCE: Scalar = 5.0e3;

/// Lowest selectable supply voltage.
pub const DEFAULT_SUPPLY_MIN: Scalar = 0.0;
/// Highest selectable supply voltage.
pub const DEFAULT_SUPPLY_MAX: Scalar = 12.0;
/// Voltage change per knob detent.
pub const DEFAULT_SUPPLY_STEP: Scalar = 0.5;
/// Supply voltage selected at power-up.
pub const DEFAULT_SUPPLY_VOLTAGE: Scalar = 6.0;

/// Action IDs reported by the built-in capacitor experiment.
pub mod actions {
    /// Every required wire of the charging circuit is connected.
    pub const CIRCUIT_COMPLETE: &str = "circuit_complete";
    /// The circuit is complete and its switch is closed.
    pub const CIRCUIT_ACTIVE: &str = "circuit_active";
    /// The capacitor reached the supply voltage.
    pub const CAPACITOR_CHARGED: &str = "capacitor_charged";
    /// The capacitor started discharging.
    pub const DISCHARGE_STARTED: &str = "discharge_started";
    /// A discharge ran to its floor or time bound.
    pub const DISCHARGE_COMPLETE: &str = "discharge_complete";
}
