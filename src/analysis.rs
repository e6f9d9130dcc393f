//! Closed-form RC helpers for plotting and checking recorded data.

use crate::math::{unit_ratio, Scalar};
use crate::simulation::DischargeSample;

pub use crate::simulation::floor_crossing_time;

/// Generates `n` linearly spaced samples in [start, stop].
#[must_use]
pub fn linspace(start: Scalar, stop: Scalar, n: usize) -> Vec<Scalar> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n as Scalar - 1.0);
            (0..n).map(|i| start + step * i as Scalar).collect()
        }
    }
}

/// Voltage of an ideal RC discharge `t` seconds after it started at `v0`.
#[must_use]
pub fn discharge_voltage(v0: Scalar, tau: Scalar, t: Scalar) -> Scalar {
    v0 * (-t / tau).exp()
}

/// Evaluates the ideal discharge curve at each time in `times`.
#[must_use]
pub fn discharge_curve<I>(v0: Scalar, tau: Scalar, times: I) -> Vec<DischargeSample>
where
    I: IntoIterator<Item = Scalar>,
{
    times
        .into_iter()
        .map(|time| DischargeSample {
            time,
            voltage: discharge_voltage(v0, tau, time),
        })
        .collect()
}

/// Brightness of an indicator driven by `voltage`, clamped to [0, 1].
#[must_use]
pub fn brightness(voltage: Scalar, reference_max: Scalar) -> Scalar {
    unit_ratio(voltage, reference_max)
}

/// Largest absolute deviation of `samples` from the ideal curve.
#[must_use]
pub fn max_deviation(samples: &[DischargeSample], v0: Scalar, tau: Scalar) -> Scalar {
    samples
        .iter()
        .map(|s| (s.voltage - discharge_voltage(v0, tau, s.time)).abs())
        .fold(0.0, Scalar::max)
}
