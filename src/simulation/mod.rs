//! Capacitor charge/discharge simulation and its configuration.

/// Linear-charge / exponential-discharge engine.
pub mod capacitor;
/// Discharge time-series capture and export.
pub mod recorder;

pub use capacitor::{floor_crossing_time, CapacitorEvents, CapacitorMode, CapacitorSim, DischargeEnd, SupplyState};
pub use recorder::{write_samples_csv, DischargeRecorder, DischargeSample};

use crate::constants::*;
use crate::math::Scalar;

/// Errors raised while validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A parameter that must be strictly positive was not.
    #[error("{0} must be > 0")]
    NotPositive(&'static str),
    /// The discharge floor cannot be negative.
    #[error("discharge floor {0} must be >= 0")]
    NegativeFloor(Scalar),
    /// Supply range is empty or inverted, or the initial voltage lies outside it.
    #[error("supply range [{min}, {max}] with initial {initial} is invalid")]
    SupplyRange {
        /// Lower bound.
        min: Scalar,
        /// Upper bound.
        max: Scalar,
        /// Initial setting.
        initial: Scalar,
    },
}

/// Tuning of the capacitor engine.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct CapacitorConfig {
    /// Linear charging rate in V/s.
    pub charge_rate: Scalar,
    /// Losing power above this voltage starts a discharge.
    pub discharge_threshold: Scalar,
    /// A discharge ends once the voltage falls to this floor.
    pub discharge_floor: Scalar,
    /// A discharge ends after this many seconds at the latest.
    pub max_discharge_time: Scalar,
    /// Voltage corresponding to full indicator brightness.
    pub reference_voltage: Scalar,
    /// Seconds between recorded discharge samples.
    pub sample_interval: Scalar,
    /// Reported whenever charging reaches the target.
    pub charged_action: Option<String>,
    /// Reported whenever a discharge starts.
    pub discharge_started_action: Option<String>,
    /// Reported the first time a discharge completes.
    pub discharge_complete_action: Option<String>,
}

impl CapacitorConfig {
    /// Sets the charging rate.
    #[must_use]
    pub fn with_charge_rate(mut self, volts_per_second: Scalar) -> Self {
        self.charge_rate = volts_per_second;
        self
    }

    /// Sets both discharge termination bounds.
    #[must_use]
    pub fn with_discharge_bounds(mut self, floor: Scalar, max_time: Scalar) -> Self {
        self.discharge_floor = floor;
        self.max_discharge_time = max_time;
        self
    }

    /// Sets the recorder sample interval.
    #[must_use]
    pub fn with_sample_interval(mut self, seconds: Scalar) -> Self {
        self.sample_interval = seconds;
        self
    }

    /// Sets the action ids reported by the engine.
    #[must_use]
    pub fn with_actions(
        mut self,
        charged: Option<&str>,
        discharge_started: Option<&str>,
        discharge_complete: Option<&str>,
    ) -> Self {
        self.charged_action = charged.map(str::to_owned);
        self.discharge_started_action = discharge_started.map(str::to_owned);
        self.discharge_complete_action = discharge_complete.map(str::to_owned);
        self
    }

    /// Checks every numeric bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positives = [
            ("charge_rate", self.charge_rate),
            ("discharge_threshold", self.discharge_threshold),
            ("max_discharge_time", self.max_discharge_time),
            ("reference_voltage", self.reference_voltage),
            ("sample_interval", self.sample_interval),
        ];
        for (name, value) in positives {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NotPositive(name));
            }
        }
        if self.discharge_floor.is_nan() || self.discharge_floor < 0.0 {
            return Err(ConfigError::NegativeFloor(self.discharge_floor));
        }
        Ok(())
    }
}

impl Default for CapacitorConfig {
    fn default() -> Self {
        Self {
            charge_rate: DEFAULT_CHARGE_RATE,
            discharge_threshold: DEFAULT_DISCHARGE_THRESHOLD,
            discharge_floor: DEFAULT_DISCHARGE_FLOOR,
            max_discharge_time: DEFAULT_MAX_DISCHARGE_TIME,
            reference_voltage: DEFAULT_REFERENCE_VOLTAGE,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            charged_action: None,
            discharge_started_action: None,
            discharge_complete_action: None,
        }
    }
}

/// Range and resolution of the bench supply.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SupplyConfig {
    /// Lowest selectable voltage.
    pub min_voltage: Scalar,
    /// Highest selectable voltage.
    pub max_voltage: Scalar,
    /// Voltage change per knob detent.
    pub step: Scalar,
    /// Voltage selected at power-up.
    pub initial_voltage: Scalar,
}

impl SupplyConfig {
    /// Checks the range and step.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step.is_nan() || self.step <= 0.0 {
            return Err(ConfigError::NotPositive("supply step"));
        }
        if self.min_voltage < 0.0
            || self.min_voltage >= self.max_voltage
            || !(self.min_voltage..=self.max_voltage).contains(&self.initial_voltage)
        {
            return Err(ConfigError::SupplyRange {
                min: self.min_voltage,
                max: self.max_voltage,
                initial: self.initial_voltage,
            });
        }
        Ok(())
    }
}

impl Default for SupplyConfig {
    fn default() -> Self {
        Self {
            min_voltage: DEFAULT_SUPPLY_MIN,
            max_voltage: DEFAULT_SUPPLY_MAX,
            step: DEFAULT_SUPPLY_STEP,
            initial_voltage: DEFAULT_SUPPLY_VOLTAGE,
        }
    }
}
