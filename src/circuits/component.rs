use tracing::debug;

use crate::experiment::ActionSink;
use crate::interaction::Interactable;
use crate::math::Scalar;
use crate::simulation::SupplyConfig;
use crate::units::{Capacitance, Quantity, Resistance};

/// Index of a switch on its [`CircuitBoard`](super::board::CircuitBoard).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SwitchId(pub(crate) usize);

/// Index of a lamp on its [`CircuitBoard`](super::board::CircuitBoard).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LampId(pub(crate) usize);

/// Lumped resistor model.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Resistor {
    name: String,
    resistance: Resistance<Scalar>,
}

impl Resistor {
    /// Creates a resistor.
    #[must_use]
    pub fn new(name: impl Into<String>, resistance_ohms: Scalar) -> Self {
        Self {
            name: name.into(),
            resistance: Quantity::new(resistance_ohms),
        }
    }

    /// Human-readable identifier (e.g. `R1`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resistance magnitude in ohms.
    #[must_use]
    pub fn resistance(&self) -> Scalar {
        self.resistance.value()
    }
}

/// Lumped capacitor model (ideal).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Capacitor {
    name: String,
    capacitance: Capacitance<Scalar>,
}

impl Capacitor {
    /// Creates a capacitor.
    #[must_use]
    pub fn new(name: impl Into<String>, capacitance_f: Scalar) -> Self {
        Self {
            name: name.into(),
            capacitance: Quantity::new(capacitance_f),
        }
    }

    /// Human-readable identifier (e.g. `C1`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the capacitance magnitude in farads.
    #[must_use]
    pub fn capacitance(&self) -> Scalar {
        self.capacitance.value()
    }

    /// RC time constant τ = R·C in seconds when discharged through `resistor`.
    #[must_use]
    pub fn time_constant(&self, resistor: &Resistor) -> Scalar {
        resistor.resistance() * self.capacitance()
    }
}

/// Two-state toggle switch.
#[derive(Debug, Clone)]
pub struct Switch {
    label: String,
    on: bool,
    interactable: bool,
}

impl Switch {
    /// Creates an open (off) switch.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            on: false,
            interactable: true,
        }
    }

    /// Human-readable identifier.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the switch is closed.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Flips the switch. Returns false if the switch is not interactable.
    pub fn toggle(&mut self) -> bool {
        let target = !self.on;
        self.set_on(target)
    }

    /// Moves the switch to `on`. Returns false if the switch is not interactable.
    pub fn set_on(&mut self, on: bool) -> bool {
        if !self.interactable {
            debug!(switch = %self.label, "switch is not interactable");
            return false;
        }
        self.on = on;
        true
    }

    /// Opens the switch regardless of interactability.
    pub fn reset(&mut self) {
        self.on = false;
    }
}

impl Interactable for Switch {
    fn set_interactable(&mut self, interactable: bool) {
        self.interactable = interactable;
    }

    fn can_interact(&self) -> bool {
        self.interactable
    }
}

/// Indicator lamp with an on/off state and a continuous brightness.
#[derive(Debug, Clone, Default)]
pub struct Lamp {
    label: String,
    lit: bool,
    brightness: Scalar,
}

impl Lamp {
    /// Creates a dark lamp.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Human-readable identifier.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the lamp is switched on.
    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Switches the lamp; an unlit lamp always reads zero brightness.
    pub fn set_lit(&mut self, lit: bool) {
        self.lit = lit;
        self.brightness = if lit { 1.0 } else { 0.0 };
    }

    /// Brightness in [0, 1].
    #[must_use]
    pub fn brightness(&self) -> Scalar {
        self.brightness
    }

    /// Sets brightness (clamped to [0, 1]); the lamp counts as lit when above zero.
    pub fn set_brightness(&mut self, brightness: Scalar) {
        self.brightness = brightness.clamp(0.0, 1.0);
        self.lit = self.brightness > 0.0;
    }
}

/// Stepped rotary control over a closed range.
#[derive(Debug, Clone)]
pub struct Knob {
    value: Scalar,
    min: Scalar,
    max: Scalar,
    step: Scalar,
    interactable: bool,
}

impl Knob {
    /// Creates a knob; `initial` is clamped into `[min, max]`.
    #[must_use]
    pub fn new(min: Scalar, max: Scalar, step: Scalar, initial: Scalar) -> Self {
        Self {
            value: initial.clamp(min, max),
            min,
            max,
            step,
            interactable: true,
        }
    }

    /// Current setting.
    #[must_use]
    pub fn value(&self) -> Scalar {
        self.value
    }

    /// Rotates by `detents` (negative turns down) and returns the new value.
    pub fn turn(&mut self, detents: i32) -> Scalar {
        if !self.interactable {
            debug!("knob is not interactable");
            return self.value;
        }
        self.value = (self.value + Scalar::from(detents) * self.step).clamp(self.min, self.max);
        self.value
    }
}

impl Interactable for Knob {
    fn set_interactable(&mut self, interactable: bool) {
        self.interactable = interactable;
    }

    fn can_interact(&self) -> bool {
        self.interactable
    }
}

/// Bench supply with a power button and a voltage knob.
#[derive(Debug, Clone)]
pub struct PowerSupply {
    name: String,
    on: bool,
    knob: Knob,
    interactable: bool,
}

impl PowerSupply {
    /// Creates a switched-off supply from `config`.
    #[must_use]
    pub fn new(name: impl Into<String>, config: &SupplyConfig) -> Self {
        Self {
            name: name.into(),
            on: false,
            knob: Knob::new(config.min_voltage, config.max_voltage, config.step, config.initial_voltage),
            interactable: true,
        }
    }

    /// Human-readable identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the output is enabled.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Selected voltage (independent of the power state).
    #[must_use]
    pub fn voltage(&self) -> Scalar {
        self.knob.value()
    }

    /// Voltage present at the terminals: the selected voltage when on, else zero.
    #[must_use]
    pub fn output_voltage(&self) -> Scalar {
        if self.on {
            self.voltage()
        } else {
            0.0
        }
    }

    /// Toggles the output. Returns false if the supply is not interactable.
    pub fn press_power(&mut self) -> bool {
        if !self.interactable {
            debug!(supply = %self.name, "power button is not interactable");
            return false;
        }
        self.on = !self.on;
        true
    }

    /// Turns the voltage knob and returns the new setting.
    pub fn turn_knob(&mut self, detents: i32) -> Scalar {
        self.knob.turn(detents)
    }

    /// Read access to the voltage knob.
    #[must_use]
    pub fn knob(&self) -> &Knob {
        &self.knob
    }

    /// Switches the output off regardless of interactability.
    pub fn power_off(&mut self) {
        self.on = false;
    }
}

impl Interactable for PowerSupply {
    fn set_interactable(&mut self, interactable: bool) {
        self.interactable = interactable;
        self.knob.set_interactable(interactable);
    }

    fn can_interact(&self) -> bool {
        self.interactable
    }
}

/// Momentary button that reports an action each time it is pressed.
#[derive(Debug, Clone)]
pub struct PushButton {
    label: String,
    action_id: String,
    presses: u32,
    interactable: bool,
}

impl PushButton {
    /// Creates a button reporting `action_id`.
    #[must_use]
    pub fn new(label: impl Into<String>, action_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action_id: action_id.into(),
            presses: 0,
            interactable: true,
        }
    }

    /// Human-readable identifier.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of accepted presses.
    #[must_use]
    pub fn presses(&self) -> u32 {
        self.presses
    }

    /// Presses the button. Returns false if the button is not interactable.
    pub fn press(&mut self, sink: &mut dyn ActionSink) -> bool {
        if !self.interactable {
            debug!(button = %self.label, "button is not interactable");
            return false;
        }
        self.presses += 1;
        sink.register_action(&self.action_id);
        true
    }
}

impl Interactable for PushButton {
    fn set_interactable(&mut self, interactable: bool) {
        self.interactable = interactable;
    }

    fn can_interact(&self) -> bool {
        self.interactable
    }
}
