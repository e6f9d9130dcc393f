//! Convenience re-exports for building circuit experiments.

pub use crate::analysis::{brightness, discharge_curve, discharge_voltage, floor_crossing_time, linspace};
pub use crate::circuits::{
    BoardEvents, Capacitor, CircuitBoard, CircuitEvent, CircuitManager, ConnectionPoint, Knob, Lamp, LampId,
    PointId, PowerSupply, PushButton, Resistor, Switch, SwitchId, Wire, WireColor, WireId, WireLink,
};
pub use crate::constants::actions;
pub use crate::errors::LabError;
pub use crate::events::{Signal, SubscriptionId};
pub use crate::experiment::{ActionSink, Experiment, ExperimentEvents, ExperimentStep, Progress, StepDefinition};
pub use crate::interaction::Interactable;
pub use crate::lab::{CapacitorBench, Lab, LabConfig};
pub use crate::math::{Scalar, P2};
pub use crate::simulation::{
    write_samples_csv, CapacitorConfig, CapacitorEvents, CapacitorMode, CapacitorSim, ConfigError, DischargeEnd,
    DischargeRecorder, DischargeSample, SupplyConfig, SupplyState,
};
pub use crate::units::{Capacitance, Farad, Ohm, Quantity, Resistance, Unit};
