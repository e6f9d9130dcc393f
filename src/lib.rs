#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::all, clippy::cargo, clippy::nursery, missing_docs)]
#![doc = include_str!("../README.md")]

/// Default tuning constants and built-in action ids.
pub mod constants;
/// Strongly typed unit helpers and quantity abstractions.
pub mod units;
/// Shared numerical utilities (scalars, bench positions, tolerances).
pub mod math;
/// Publish/subscribe notification lists.
pub mod events;
/// Enable/disable capability of interactive elements.
pub mod interaction;
/// Wires, connection points, switches and circuit aggregation.
pub mod circuits;
/// Capacitor charge/discharge engine and discharge recording.
pub mod simulation;
/// Step definitions and the experiment state machine.
pub mod experiment;
/// Per-frame driver and the built-in capacitor experiment.
pub mod lab;
/// Closed-form RC curves and derived quantities.
pub mod analysis;
/// Error types shared between submodules.
pub mod errors;

/// Common exports for downstream crates.
pub mod prelude;
