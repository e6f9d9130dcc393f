//! Tick-driven RC capacitor model.
//!
//! Charging is a linear ramp toward the supply voltage. Discharging follows
//! the closed form `V0 · e^(−t/τ)` with τ = R·C, evaluated from the time the
//! discharge started rather than integrated, so the curve does not depend on
//! the driver's frame rate. A discharge ends at whichever comes first of the
//! voltage floor and the maximum discharge time.

use tracing::{debug, info, trace};

use crate::circuits::component::{Capacitor, Resistor};
use crate::events::Signal;
use crate::experiment::ActionSink;
use crate::math::{approx_eq, unit_ratio, Scalar, VOLTAGE_EPSILON};

use super::recorder::DischargeRecorder;
use super::{CapacitorConfig, ConfigError};

/// What the capacitor is currently doing.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacitorMode {
    /// Voltage holds.
    Idle,
    /// Ramping toward the target voltage.
    Charging,
    /// Decaying exponentially toward the floor.
    Discharging,
}

/// Why a discharge ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DischargeEnd {
    /// The voltage reached the configured floor.
    Floor,
    /// The maximum discharge time elapsed first.
    TimeLimit,
}

/// Supply conditions seen by the capacitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplyState {
    /// Supply output enabled.
    pub powered: bool,
    /// Every wire of the charging circuit is connected.
    pub circuit_complete: bool,
    /// Selected supply voltage.
    pub voltage: Scalar,
}

/// Notifications emitted by a [`CapacitorSim`].
#[derive(Debug, Default)]
pub struct CapacitorEvents {
    /// The voltage changed; carries the new value.
    pub voltage_changed: Signal<Scalar>,
    /// The mode changed.
    pub mode_changed: Signal<CapacitorMode>,
    /// Charging reached its target; carries the target.
    pub fully_charged: Signal<Scalar>,
    /// A discharge began; carries the initial voltage.
    pub discharge_started: Signal<Scalar>,
    /// A discharge ended.
    pub discharge_complete: Signal<DischargeEnd>,
}

/// Charge/discharge engine for one capacitor and its discharge resistor.
#[derive(Debug)]
pub struct CapacitorSim {
    capacitor: Capacitor,
    resistor: Resistor,
    config: CapacitorConfig,
    voltage: Scalar,
    mode: CapacitorMode,
    target_voltage: Scalar,
    clock: Scalar,
    discharge_start_time: Scalar,
    initial_discharge_voltage: Scalar,
    discharge_complete_reported: bool,
    last_supply: Option<SupplyState>,
    recorder: DischargeRecorder,
    events: CapacitorEvents,
}

impl CapacitorSim {
    /// Creates an uncharged, idle engine.
    pub fn new(capacitor: Capacitor, resistor: Resistor, config: CapacitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if capacitor.capacitance().is_nan() || capacitor.capacitance() <= 0.0 {
            return Err(ConfigError::NotPositive("capacitance"));
        }
        if resistor.resistance().is_nan() || resistor.resistance() <= 0.0 {
            return Err(ConfigError::NotPositive("resistance"));
        }
        let recorder = DischargeRecorder::new(config.sample_interval);
        Ok(Self {
            capacitor,
            resistor,
            config,
            voltage: 0.0,
            mode: CapacitorMode::Idle,
            target_voltage: 0.0,
            clock: 0.0,
            discharge_start_time: 0.0,
            initial_discharge_voltage: 0.0,
            discharge_complete_reported: false,
            last_supply: None,
            recorder,
            events: CapacitorEvents::default(),
        })
    }

    /// Present voltage across the capacitor.
    #[must_use]
    pub fn voltage(&self) -> Scalar {
        self.voltage
    }

    /// Present mode.
    #[must_use]
    pub fn mode(&self) -> CapacitorMode {
        self.mode
    }

    /// Charging ceiling captured when charging last started.
    #[must_use]
    pub fn target_voltage(&self) -> Scalar {
        self.target_voltage
    }

    /// τ = R·C in seconds.
    #[must_use]
    pub fn time_constant(&self) -> Scalar {
        self.capacitor.time_constant(&self.resistor)
    }

    /// Simulated seconds since construction.
    #[must_use]
    pub fn clock(&self) -> Scalar {
        self.clock
    }

    /// Seconds since the current discharge started, if discharging.
    #[must_use]
    pub fn discharge_elapsed(&self) -> Option<Scalar> {
        (self.mode == CapacitorMode::Discharging).then(|| self.clock - self.discharge_start_time)
    }

    /// Voltage at the start of the latest discharge.
    #[must_use]
    pub fn initial_discharge_voltage(&self) -> Scalar {
        self.initial_discharge_voltage
    }

    /// Indicator brightness, `voltage / reference_voltage` clamped to [0, 1].
    #[must_use]
    pub fn brightness(&self) -> Scalar {
        unit_ratio(self.voltage, self.config.reference_voltage)
    }

    /// Engine tuning.
    #[must_use]
    pub fn config(&self) -> &CapacitorConfig {
        &self.config
    }

    /// The capacitor being simulated.
    #[must_use]
    pub fn capacitor(&self) -> &Capacitor {
        &self.capacitor
    }

    /// The discharge resistor.
    #[must_use]
    pub fn resistor(&self) -> &Resistor {
        &self.resistor
    }

    /// The discharge series of the latest discharge.
    #[must_use]
    pub fn recorder(&self) -> &DischargeRecorder {
        &self.recorder
    }

    /// Mutable recorder access, e.g. to subscribe to samples.
    pub fn recorder_mut(&mut self) -> &mut DischargeRecorder {
        &mut self.recorder
    }

    /// Subscription access to notifications.
    pub fn events_mut(&mut self) -> &mut CapacitorEvents {
        &mut self.events
    }

    /// Forces the stored voltage, e.g. to start from a pre-charged state.
    pub fn preload(&mut self, voltage: Scalar) {
        self.set_voltage(voltage.max(0.0));
    }

    /// Reacts to a change in supply conditions.
    ///
    /// Repeating an unchanged state is a no-op, so drivers may call this on
    /// every tick.
    pub fn sync_supply(&mut self, supply: SupplyState, sink: &mut dyn ActionSink) {
        if self.last_supply == Some(supply) {
            return;
        }
        self.last_supply = Some(supply);

        if supply.powered && supply.circuit_complete {
            self.start_charging(supply);
        } else if self.mode != CapacitorMode::Discharging {
            if self.voltage > self.config.discharge_threshold {
                self.start_discharging(sink);
            } else {
                self.set_mode(CapacitorMode::Idle);
            }
        }
    }

    /// Starts ramping toward the supply voltage.
    ///
    /// Ignored unless the supply is on, the circuit is complete and the
    /// supply voltage is positive.
    pub fn start_charging(&mut self, supply: SupplyState) -> bool {
        if !supply.powered || !supply.circuit_complete || supply.voltage <= 0.0 {
            debug!(
                powered = supply.powered,
                complete = supply.circuit_complete,
                volts = supply.voltage,
                "charge ignored: supply not connected"
            );
            return false;
        }
        if self.mode == CapacitorMode::Discharging {
            self.recorder.stop();
        }
        self.target_voltage = supply.voltage;
        info!(target = supply.voltage, from = self.voltage, "charging");
        self.set_mode(CapacitorMode::Charging);
        true
    }

    /// Starts an exponential discharge from the present voltage.
    ///
    /// Ignored when already discharging or when the voltage does not exceed
    /// the discharge threshold.
    pub fn start_discharging(&mut self, sink: &mut dyn ActionSink) -> bool {
        if self.mode == CapacitorMode::Discharging {
            return false;
        }
        if self.voltage <= self.config.discharge_threshold {
            debug!(volts = self.voltage, "discharge ignored: capacitor is empty");
            return false;
        }
        self.initial_discharge_voltage = self.voltage;
        self.discharge_start_time = self.clock;
        info!(v0 = self.voltage, tau = self.time_constant(), "discharging");
        self.set_mode(CapacitorMode::Discharging);
        self.recorder.begin(self.voltage);
        self.events.discharge_started.emit(&self.voltage);
        if let Some(action) = &self.config.discharge_started_action {
            sink.register_action(action);
        }
        true
    }

    /// Halts any charge or discharge in progress; the voltage holds.
    pub fn stop(&mut self) {
        self.recorder.stop();
        self.set_mode(CapacitorMode::Idle);
    }

    /// Empties the capacitor and re-arms the one-shot completion report.
    pub fn reset(&mut self) {
        self.stop();
        self.set_voltage(0.0);
        self.target_voltage = 0.0;
        self.discharge_complete_reported = false;
        self.last_supply = None;
    }

    /// Re-arms the one-shot "discharge complete" report without touching
    /// the stored voltage.
    pub fn rearm_completion(&mut self) {
        self.discharge_complete_reported = false;
    }

    /// Advances the model by `dt` seconds.
    pub fn tick(&mut self, dt: Scalar, sink: &mut dyn ActionSink) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        self.clock += dt;
        match self.mode {
            CapacitorMode::Idle => {}
            CapacitorMode::Charging => self.tick_charging(dt, sink),
            CapacitorMode::Discharging => self.tick_discharging(sink),
        }
        trace!(clock = self.clock, volts = self.voltage, mode = ?self.mode, "capacitor tick");
    }

    fn tick_charging(&mut self, dt: Scalar, sink: &mut dyn ActionSink) {
        let target = self.target_voltage;
        let next = (self.voltage + self.config.charge_rate * dt).min(target);
        if approx_eq(next, target, VOLTAGE_EPSILON) {
            self.set_voltage(target);
            info!(volts = target, "fully charged");
            self.set_mode(CapacitorMode::Idle);
            self.events.fully_charged.emit(&target);
            if let Some(action) = &self.config.charged_action {
                sink.register_action(action);
            }
        } else {
            self.set_voltage(next);
        }
    }

    fn tick_discharging(&mut self, sink: &mut dyn ActionSink) {
        let elapsed = self.clock - self.discharge_start_time;
        let v0 = self.initial_discharge_voltage;
        let tau = self.time_constant();
        let curve = move |t: Scalar| v0 * (-t / tau).exp();

        let floor = self.config.discharge_floor;
        let max_time = self.config.max_discharge_time;
        let voltage = curve(elapsed);
        if voltage > floor && elapsed < max_time {
            self.recorder.observe(elapsed, curve);
            self.set_voltage(voltage);
            return;
        }

        let floor_time = floor_crossing_time(v0, floor, tau);
        let (end_time, end_voltage, reason) = if floor_time <= max_time {
            (floor_time, floor.min(v0), DischargeEnd::Floor)
        } else {
            (max_time, curve(max_time), DischargeEnd::TimeLimit)
        };
        self.recorder.observe(end_time, curve);
        self.recorder.finish(end_time, end_voltage);
        self.set_voltage(end_voltage);
        info!(?reason, at = end_time, volts = end_voltage, "discharge complete");
        self.set_mode(CapacitorMode::Idle);
        self.events.discharge_complete.emit(&reason);

        if !self.discharge_complete_reported {
            self.discharge_complete_reported = true;
            if let Some(action) = &self.config.discharge_complete_action {
                sink.register_action(action);
            }
        }
    }

    fn set_voltage(&mut self, voltage: Scalar) {
        if voltage != self.voltage {
            self.voltage = voltage;
            self.events.voltage_changed.emit(&voltage);
        }
    }

    fn set_mode(&mut self, mode: CapacitorMode) {
        if mode != self.mode {
            self.mode = mode;
            self.events.mode_changed.emit(&mode);
        }
    }
}

/// Seconds for `v0 · e^(−t/τ)` to fall to `floor`; zero if already there and
/// infinite for a zero floor.
#[must_use]
pub fn floor_crossing_time(v0: Scalar, floor: Scalar, tau: Scalar) -> Scalar {
    if v0 <= floor {
        0.0
    } else if floor <= 0.0 {
        Scalar::INFINITY
    } else {
        tau * (v0 / floor).ln()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    const POWERED: SupplyState = SupplyState {
        powered: true,
        circuit_complete: true,
        voltage: 6.0,
    };
    const UNPOWERED: SupplyState = SupplyState {
        powered: false,
        circuit_complete: true,
        voltage: 6.0,
    };

    fn sim(config: CapacitorConfig) -> CapacitorSim {
        CapacitorSim::new(Capacitor::new("C1", 1.0e-3), Resistor::new("R1", 5.0e3), config)
            .expect("valid configuration")
    }

    fn run(sim: &mut CapacitorSim, seconds: Scalar, dt: Scalar, log: &mut Vec<String>) {
        let steps = (seconds / dt).round() as usize;
        for _ in 0..steps {
            sim.tick(dt, log);
        }
    }

    #[test]
    fn invalid_components_are_rejected() {
        let err = CapacitorSim::new(Capacitor::new("C", 0.0), Resistor::new("R", 1.0), CapacitorConfig::default());
        assert!(matches!(err, Err(ConfigError::NotPositive("capacitance"))));
    }

    #[test]
    fn charges_linearly_then_idles_at_target() {
        let config = CapacitorConfig::default()
            .with_charge_rate(2.0)
            .with_actions(Some("charged"), None, None);
        let mut c = sim(config);
        let mut log = Vec::new();
        c.sync_supply(POWERED, &mut log);
        assert_eq!(c.mode(), CapacitorMode::Charging);

        run(&mut c, 2.0, 0.5, &mut log);
        assert_relative_eq!(c.voltage(), 4.0);
        assert_eq!(c.mode(), CapacitorMode::Charging);

        run(&mut c, 1.0, 0.5, &mut log);
        assert_relative_eq!(c.voltage(), 6.0);
        assert_eq!(c.mode(), CapacitorMode::Idle);
        assert_eq!(log, vec!["charged".to_string()]);
    }

    #[test]
    fn charging_at_frame_rate_lands_exactly_on_target() {
        let mut c = sim(CapacitorConfig::default().with_charge_rate(2.0));
        let mut log = Vec::new();
        c.sync_supply(POWERED, &mut log);
        run(&mut c, 3.5, 1.0 / 60.0, &mut log);
        assert_eq!(c.voltage(), 6.0);
        assert_eq!(c.mode(), CapacitorMode::Idle);
    }

    #[test]
    fn unchanged_supply_does_not_restart_charging() {
        let mut c = sim(CapacitorConfig::default());
        let mut log = Vec::new();
        c.sync_supply(POWERED, &mut log);
        run(&mut c, 4.0, 0.5, &mut log);
        assert_eq!(c.mode(), CapacitorMode::Idle);
        c.sync_supply(POWERED, &mut log);
        assert_eq!(c.mode(), CapacitorMode::Idle);
    }

    #[test]
    fn charge_requests_without_supply_are_ignored() {
        let mut c = sim(CapacitorConfig::default());
        assert!(!c.start_charging(UNPOWERED));
        assert!(!c.start_charging(SupplyState { circuit_complete: false, ..POWERED }));
        assert_eq!(c.mode(), CapacitorMode::Idle);

        let mut log = Vec::new();
        assert!(!c.start_discharging(&mut log));
        assert!(c.recorder().samples().is_empty());
    }

    #[test]
    fn discharge_follows_exponential_and_stops_at_floor() {
        let config = CapacitorConfig::default()
            .with_discharge_bounds(0.3, 40.0)
            .with_actions(None, Some("started"), Some("done"));
        let mut c = sim(config);
        let mut log = Vec::new();
        c.preload(6.0);
        c.sync_supply(UNPOWERED, &mut log);
        assert_eq!(c.mode(), CapacitorMode::Discharging);
        assert_relative_eq!(c.time_constant(), 5.0, epsilon = 1.0e-12);

        run(&mut c, 5.0, 0.01, &mut log);
        assert_relative_eq!(c.voltage(), 6.0 * (-1.0_f64).exp(), epsilon = 1.0e-9);
        assert_abs_diff_eq!(c.voltage(), 2.207, epsilon = 1.0e-3);

        run(&mut c, 11.0, 0.01, &mut log);
        assert_eq!(c.mode(), CapacitorMode::Idle);
        assert_eq!(c.voltage(), 0.3);

        let samples = c.recorder().samples();
        let last = samples.last().expect("final sample");
        assert_relative_eq!(last.time, 5.0 * 20.0_f64.ln(), epsilon = 1.0e-9);
        assert_eq!(last.voltage, 0.3);
        assert_eq!(samples[0].time, 0.0);
        assert_eq!(samples[0].voltage, 6.0);
        for s in &samples[..samples.len() - 1] {
            assert_relative_eq!(s.voltage, 6.0 * (-s.time / 5.0).exp(), epsilon = 1.0e-9);
        }
        assert_eq!(log, vec!["started".to_string(), "done".to_string()]);
    }

    #[test]
    fn time_bound_ends_discharge_above_floor() {
        let config = CapacitorConfig::default().with_discharge_bounds(0.3, 2.0);
        let mut c = sim(config);
        let mut log = Vec::new();
        c.preload(6.0);
        let ended = Rc::new(RefCell::new(Vec::new()));
        let e = Rc::clone(&ended);
        c.events_mut()
            .discharge_complete
            .subscribe(move |reason: &DischargeEnd| e.borrow_mut().push(*reason));

        assert!(c.start_discharging(&mut log));
        run(&mut c, 3.0, 0.25, &mut log);
        assert_eq!(c.mode(), CapacitorMode::Idle);
        assert_relative_eq!(c.voltage(), 6.0 * (-2.0_f64 / 5.0).exp(), epsilon = 1.0e-12);
        assert_relative_eq!(c.recorder().samples().last().unwrap().time, 2.0);
        assert_eq!(*ended.borrow(), vec![DischargeEnd::TimeLimit]);
    }

    #[test]
    fn discharge_complete_action_is_reported_once() {
        let config = CapacitorConfig::default().with_actions(None, Some("started"), Some("done"));
        let mut c = sim(config);
        let mut log = Vec::new();
        for _ in 0..2 {
            c.preload(6.0);
            assert!(c.start_discharging(&mut log));
            run(&mut c, 20.0, 0.1, &mut log);
        }
        assert_eq!(log, vec!["started", "done", "started"]);

        c.reset();
        c.preload(6.0);
        assert!(c.start_discharging(&mut log));
        run(&mut c, 20.0, 0.1, &mut log);
        assert_eq!(log.iter().filter(|a| *a == "done").count(), 2);
    }

    #[test]
    fn rearmed_completion_reports_again_and_keeps_voltage() {
        let config = CapacitorConfig::default().with_actions(None, None, Some("done"));
        let mut c = sim(config);
        let mut log = Vec::new();
        c.preload(6.0);
        assert!(c.start_discharging(&mut log));
        run(&mut c, 20.0, 0.1, &mut log);
        assert_eq!(log, vec!["done"]);

        c.preload(6.0);
        c.rearm_completion();
        assert_eq!(c.voltage(), 6.0);
        assert!(c.start_discharging(&mut log));
        run(&mut c, 20.0, 0.1, &mut log);
        assert_eq!(log, vec!["done", "done"]);
    }

    #[test]
    fn small_residual_voltage_just_idles_on_power_loss() {
        let mut c = sim(CapacitorConfig::default());
        let mut log = Vec::new();
        c.preload(0.05);
        c.sync_supply(POWERED, &mut log);
        c.sync_supply(UNPOWERED, &mut log);
        assert_eq!(c.mode(), CapacitorMode::Idle);
        assert!(c.recorder().samples().is_empty());
    }

    #[test]
    fn recharging_mid_discharge_stops_the_recording() {
        let mut c = sim(CapacitorConfig::default());
        let mut log = Vec::new();
        c.preload(6.0);
        c.sync_supply(UNPOWERED, &mut log);
        run(&mut c, 1.0, 0.1, &mut log);
        c.sync_supply(POWERED, &mut log);
        assert_eq!(c.mode(), CapacitorMode::Charging);
        assert!(!c.recorder().is_recording());
    }

    #[test]
    fn brightness_tracks_voltage() {
        let mut c = sim(CapacitorConfig::default());
        c.preload(6.0);
        assert_relative_eq!(c.brightness(), 0.5);
        c.preload(30.0);
        assert_relative_eq!(c.brightness(), 1.0);
    }

    #[test]
    fn floor_crossing_matches_closed_form() {
        assert_relative_eq!(floor_crossing_time(6.0, 0.3, 5.0), 14.978_661, epsilon = 1.0e-6);
        assert_eq!(floor_crossing_time(0.2, 0.3, 5.0), 0.0);
        assert!(floor_crossing_time(6.0, 0.0, 5.0).is_infinite());
    }
}
