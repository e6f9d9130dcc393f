//! Interactive circuit elements and the connectivity model built from them.

/// Typed sockets and wire color tags.
pub mod point;
/// Colored leads anchored at source points.
pub mod wire;
/// Switches, lamps, supply controls and the RC parameter carriers.
pub mod component;
/// Arena owning every element of one bench and all link mutations.
pub mod board;
/// Aggregate complete/active detection over required elements.
pub mod manager;

pub use board::{BoardEvents, CircuitBoard, WireLink};
pub use component::{Capacitor, Knob, Lamp, LampId, PowerSupply, PushButton, Resistor, Switch, SwitchId};
pub use manager::{CircuitEvent, CircuitManager};
pub use point::{ConnectionPoint, PointId, WireColor};
pub use wire::{Wire, WireId};
