//! Per-frame driver tying the board, circuit, supply, capacitor and
//! experiment together.
//!
//! Within one call every effect is visible before its dependents read it:
//! the circuit aggregate is recomputed before the capacitor looks at the
//! supply, and actions reach the experiment synchronously, so a step's
//! completion check always sees the actions reported in the same tick.

use tracing::{debug, info, trace};

use crate::circuits::{
    Capacitor, CircuitBoard, CircuitManager, LampId, PointId, PowerSupply, Resistor, SwitchId, WireColor, WireId,
};
use crate::constants::{actions, DEFAULT_CAPACITANCE, DEFAULT_RESISTANCE, DEFAULT_SNAP_RADIUS};
use crate::errors::LabError;
use crate::experiment::{Experiment, ExperimentStep};
use crate::math::{Scalar, P2};
use crate::simulation::{CapacitorConfig, CapacitorSim, ConfigError, SupplyConfig, SupplyState};

/// Everything needed to build the built-in experiment.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct LabConfig {
    /// Snap radius for released wire ends.
    pub snap_radius: Scalar,
    /// Capacitance in farads.
    pub capacitance: Scalar,
    /// Discharge resistance in ohms.
    pub resistance: Scalar,
    /// Bench supply range.
    pub supply: SupplyConfig,
    /// Capacitor engine tuning.
    pub capacitor: CapacitorConfig,
}

impl LabConfig {
    /// Sets the RC pair.
    #[must_use]
    pub fn with_rc(mut self, capacitance: Scalar, resistance: Scalar) -> Self {
        self.capacitance = capacitance;
        self.resistance = resistance;
        self
    }

    /// Replaces the capacitor tuning.
    #[must_use]
    pub fn with_capacitor(mut self, capacitor: CapacitorConfig) -> Self {
        self.capacitor = capacitor;
        self
    }

    /// Checks every nested bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("snap_radius", self.snap_radius),
            ("capacitance", self.capacitance),
            ("resistance", self.resistance),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NotPositive(name));
            }
        }
        self.supply.validate()?;
        self.capacitor.validate()
    }
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            snap_radius: DEFAULT_SNAP_RADIUS,
            capacitance: DEFAULT_CAPACITANCE,
            resistance: DEFAULT_RESISTANCE,
            supply: SupplyConfig::default(),
            capacitor: CapacitorConfig::default().with_actions(
                Some(actions::CAPACITOR_CHARGED),
                Some(actions::DISCHARGE_STARTED),
                Some(actions::DISCHARGE_COMPLETE),
            ),
        }
    }
}

/// Handles to the elements of the built-in experiment's bench.
#[derive(Debug, Clone, Copy)]
pub struct CapacitorBench {
    /// Lead from the supply's positive terminal.
    pub red_wire: WireId,
    /// Lead from the supply's negative terminal.
    pub black_wire: WireId,
    /// Capacitor positive terminal (takes red).
    pub capacitor_positive: PointId,
    /// Capacitor negative terminal (takes black).
    pub capacitor_negative: PointId,
    /// Probe socket that takes neither lead.
    pub probe_socket: PointId,
    /// Charging switch.
    pub switch: SwitchId,
    /// Lamp that lights while the circuit is active.
    pub active_indicator: LampId,
    /// LED whose brightness follows the capacitor voltage.
    pub voltage_led: LampId,
}

/// One live experiment session.
#[derive(Debug)]
pub struct Lab {
    experiment: Experiment,
    board: CircuitBoard,
    circuit: CircuitManager,
    supply: PowerSupply,
    capacitor: CapacitorSim,
    voltage_led: Option<LampId>,
    armed_step: Option<usize>,
}

impl Lab {
    /// Assembles a session from its parts.
    #[must_use]
    pub fn new(
        experiment: Experiment,
        board: CircuitBoard,
        circuit: CircuitManager,
        supply: PowerSupply,
        capacitor: CapacitorSim,
    ) -> Self {
        Self {
            experiment,
            board,
            circuit,
            supply,
            capacitor,
            voltage_led: None,
            armed_step: None,
        }
    }

    /// Drives `lamp`'s brightness from the capacitor voltage.
    #[must_use]
    pub fn with_voltage_led(mut self, lamp: LampId) -> Self {
        self.voltage_led = Some(lamp);
        self
    }

    /// Builds the standard charge/discharge experiment.
    pub fn capacitor_experiment(config: &LabConfig) -> Result<(Self, CapacitorBench), LabError> {
        config.validate()?;

        let mut board = CircuitBoard::new(config.snap_radius);
        let supply_positive = board.add_source_point("PSU+", WireColor::Red, P2::new(0.0, 0.0));
        let supply_negative = board.add_source_point("PSU-", WireColor::Black, P2::new(0.0, -2.0));
        let capacitor_positive = board.add_point("C1+", WireColor::Red, P2::new(6.0, 0.0));
        let capacitor_negative = board.add_point("C1-", WireColor::Black, P2::new(6.0, -2.0));
        let probe_socket = board.add_point("PROBE", WireColor::Blue, P2::new(6.0, 2.0));
        let red_wire = board.add_wire("red lead", WireColor::Red, supply_positive)?;
        let black_wire = board.add_wire("black lead", WireColor::Black, supply_negative)?;
        let switch = board.add_switch("S1");
        let active_indicator = board.add_lamp("ACTIVE");
        let voltage_led = board.add_lamp("LED");

        let circuit = CircuitManager::new("charging circuit", vec![red_wire, black_wire], vec![switch])
            .with_complete_action(actions::CIRCUIT_COMPLETE)
            .with_active_action(actions::CIRCUIT_ACTIVE)
            .with_controlled_lamps(vec![active_indicator]);

        let experiment = Experiment::new("capacitor charge and discharge", capacitor_steps())?;
        let supply = PowerSupply::new("bench supply", &config.supply);
        let capacitor = CapacitorSim::new(
            Capacitor::new("C1", config.capacitance),
            Resistor::new("R1", config.resistance),
            config.capacitor.clone(),
        )?;

        let lab = Self::new(experiment, board, circuit, supply, capacitor).with_voltage_led(voltage_led);
        let bench = CapacitorBench {
            red_wire,
            black_wire,
            capacitor_positive,
            capacitor_negative,
            probe_socket,
            switch,
            active_indicator,
            voltage_led,
        };
        Ok((lab, bench))
    }

    /// The step state machine.
    #[must_use]
    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    /// Mutable state machine access, e.g. to subscribe.
    pub fn experiment_mut(&mut self) -> &mut Experiment {
        &mut self.experiment
    }

    /// The bench.
    #[must_use]
    pub fn board(&self) -> &CircuitBoard {
        &self.board
    }

    /// Mutable bench access, e.g. to subscribe or lock elements.
    pub fn board_mut(&mut self) -> &mut CircuitBoard {
        &mut self.board
    }

    /// The circuit aggregate.
    #[must_use]
    pub fn circuit(&self) -> &CircuitManager {
        &self.circuit
    }

    /// Mutable circuit access, e.g. to subscribe.
    pub fn circuit_mut(&mut self) -> &mut CircuitManager {
        &mut self.circuit
    }

    /// The bench supply.
    #[must_use]
    pub fn supply(&self) -> &PowerSupply {
        &self.supply
    }

    /// Mutable supply access, e.g. to lock its controls.
    pub fn supply_mut(&mut self) -> &mut PowerSupply {
        &mut self.supply
    }

    /// The capacitor engine.
    #[must_use]
    pub fn capacitor(&self) -> &CapacitorSim {
        &self.capacitor
    }

    /// Mutable capacitor access, e.g. to subscribe.
    pub fn capacitor_mut(&mut self) -> &mut CapacitorSim {
        &mut self.capacitor
    }

    /// Starts (or restarts) the experiment.
    ///
    /// The bench is left as it is, but every one-shot report is re-armed, so
    /// the next connection, activation and discharge completion count again.
    pub fn start(&mut self) {
        info!(experiment = %self.experiment.name(), "lab session starting");
        self.circuit.rearm();
        self.capacitor.rearm_completion();
        self.armed_step = None;
        self.experiment.start();
        self.refresh();
    }

    /// Picks up a wire's free end.
    pub fn begin_drag(&mut self, wire: WireId) -> bool {
        let picked = self.board.begin_drag(wire);
        self.refresh();
        picked
    }

    /// Moves a dragged wire's free end.
    pub fn drag_wire(&mut self, wire: WireId, position: P2) {
        self.board.drag_wire(wire, position);
    }

    /// Drops a wire's free end at `position`.
    pub fn release_wire(&mut self, wire: WireId, position: P2) -> bool {
        let connected = self.board.release_wire(wire, position);
        self.refresh();
        connected
    }

    /// Unplugs a wire.
    pub fn disconnect_wire(&mut self, wire: WireId) -> bool {
        let unplugged = self.board.disconnect_wire(wire);
        self.refresh();
        unplugged
    }

    /// Flips a switch.
    pub fn toggle_switch(&mut self, switch: SwitchId) -> bool {
        let toggled = self.board.toggle_switch(switch);
        self.refresh();
        toggled
    }

    /// Presses the supply's power button.
    pub fn press_power(&mut self) -> bool {
        let pressed = self.supply.press_power();
        self.refresh();
        pressed
    }

    /// Turns the supply's voltage knob.
    pub fn turn_knob(&mut self, detents: i32) -> Scalar {
        let volts = self.supply.turn_knob(detents);
        self.refresh();
        volts
    }

    /// Reports an action from an element outside the lab.
    pub fn register_action(&mut self, action_id: &str) {
        self.experiment.register_action(action_id);
        self.track_step();
    }

    /// Manual "next" confirmation.
    pub fn confirm_next(&mut self) -> bool {
        let advanced = self.experiment.confirm_next();
        self.track_step();
        advanced
    }

    /// Jumps the experiment to `index`.
    pub fn jump_to(&mut self, index: usize) -> bool {
        let jumped = self.experiment.jump_to(index);
        self.track_step();
        jumped
    }

    /// Unplugs every required wire, opens the switches and re-arms the
    /// circuit's one-shot reports.
    pub fn reset_circuit(&mut self) {
        self.circuit.reset(&mut self.board, &mut self.experiment);
        self.refresh();
    }

    /// Advances the session by `dt` seconds.
    pub fn tick(&mut self, dt: Scalar) {
        self.refresh();
        self.capacitor.tick(dt, &mut self.experiment);
        self.track_step();
        self.update_voltage_led();
        trace!(dt, volts = self.capacitor.voltage(), "lab tick");
    }

    fn supply_state(&self) -> SupplyState {
        SupplyState {
            powered: self.supply.is_on(),
            circuit_complete: self.circuit.is_active(),
            voltage: self.supply.voltage(),
        }
    }

    fn refresh(&mut self) {
        self.circuit.refresh(&mut self.board, &mut self.experiment);
        let supply = self.supply_state();
        self.capacitor.sync_supply(supply, &mut self.experiment);
        self.track_step();
        self.update_voltage_led();
    }

    /// Re-arms the capacitor's one-shot completion report whenever a step
    /// that waits for it is entered.
    fn track_step(&mut self) {
        let current = self.experiment.current_index();
        if current == self.armed_step {
            return;
        }
        self.armed_step = current;
        let action = self.capacitor.config().discharge_complete_action.as_deref();
        let waits_for_discharge = match (self.experiment.current_step(), action) {
            (Some(step), Some(action)) => step.requires(action),
            _ => false,
        };
        if waits_for_discharge {
            debug!(step = ?current, "re-arming discharge completion report");
            self.capacitor.rearm_completion();
        }
    }

    fn update_voltage_led(&mut self) {
        let brightness = self.capacitor.brightness();
        if let Some(lamp) = self.voltage_led.and_then(|id| self.board.lamp_mut(id)) {
            lamp.set_brightness(brightness);
        }
    }
}

fn capacitor_steps() -> Vec<ExperimentStep> {
    vec![
        ExperimentStep::new("introduction")
            .instruction("A capacitor stores charge. Press next to build a circuit that charges one.")
            .with_next_button(true),
        ExperimentStep::new("wire_circuit")
            .instruction("Drag the red lead to the capacitor's + terminal and the black lead to its - terminal.")
            .require(actions::CIRCUIT_COMPLETE),
        ExperimentStep::new("close_switch")
            .instruction("Close switch S1 to complete the charging path.")
            .require(actions::CIRCUIT_ACTIVE),
        ExperimentStep::new("charge")
            .instruction("Turn on the supply and wait for the capacitor to reach the supply voltage.")
            .require(actions::CAPACITOR_CHARGED),
        ExperimentStep::new("discharge")
            .instruction("Turn the supply off and watch the voltage decay through the resistor.")
            .require(actions::DISCHARGE_STARTED)
            .require(actions::DISCHARGE_COMPLETE),
        ExperimentStep::new("summary")
            .instruction("The voltage fell by about 63% every time constant (τ = R·C).")
            .with_next_button(true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::CapacitorMode;

    fn lab() -> (Lab, CapacitorBench) {
        Lab::capacitor_experiment(&LabConfig::default()).expect("default lab builds")
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = LabConfig::default().with_rc(0.0, 5.0e3);
        let err = Lab::capacitor_experiment(&config).unwrap_err();
        assert!(matches!(err, LabError::Config(ConfigError::NotPositive("capacitance"))));
    }

    #[test]
    fn wiring_in_any_order_cascades_through_steps() {
        let (mut lab, bench) = lab();
        lab.start();
        assert!(lab.confirm_next());
        assert!(lab.experiment().is_current_step("wire_circuit"));

        // Closing the switch first means both circuit actions land together.
        assert!(lab.toggle_switch(bench.switch));
        assert!(lab.release_wire(bench.red_wire, P2::new(6.1, 0.1)));
        assert!(lab.release_wire(bench.black_wire, P2::new(5.9, -2.0)));

        assert!(lab.circuit().is_active());
        assert!(lab.experiment().is_current_step("charge"));
        assert!(lab.board().lamp(bench.active_indicator).unwrap().is_lit());
    }

    #[test]
    fn power_without_closed_circuit_does_not_charge() {
        let (mut lab, bench) = lab();
        lab.start();
        assert!(lab.release_wire(bench.red_wire, P2::new(6.0, 0.0)));
        assert!(lab.press_power());
        lab.tick(1.0);
        assert_eq!(lab.capacitor().mode(), CapacitorMode::Idle);
        assert_eq!(lab.capacitor().voltage(), 0.0);
    }

    #[test]
    fn knob_retargets_charging() {
        let (mut lab, bench) = lab();
        lab.start();
        lab.release_wire(bench.red_wire, P2::new(6.0, 0.0));
        lab.release_wire(bench.black_wire, P2::new(6.0, -2.0));
        lab.toggle_switch(bench.switch);
        lab.press_power();
        assert_eq!(lab.capacitor().target_voltage(), 6.0);
        assert_eq!(lab.turn_knob(4), 8.0);
        assert_eq!(lab.capacitor().target_voltage(), 8.0);
    }

    #[test]
    fn led_follows_capacitor_voltage() {
        let (mut lab, bench) = lab();
        lab.start();
        lab.release_wire(bench.red_wire, P2::new(6.0, 0.0));
        lab.release_wire(bench.black_wire, P2::new(6.0, -2.0));
        lab.toggle_switch(bench.switch);
        lab.press_power();
        for _ in 0..6 {
            lab.tick(0.5);
        }
        let led = lab.board().lamp(bench.voltage_led).unwrap();
        assert!((led.brightness() - 0.5).abs() < 1.0e-12);
        assert!(led.is_lit());
    }
}
