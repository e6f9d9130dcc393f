//! Time-series capture of a discharge for external plotting.
//!
//! The recorder performs no control logic. The capacitor engine opens a
//! recording when a discharge begins, feeds it the analytic voltage curve as
//! simulated time advances, and closes it with the exact termination sample.

use std::io::{self, Write};

use crate::events::Signal;
use crate::math::Scalar;

const TIME_EPSILON: Scalar = 1.0e-9;

/// One `(elapsed time, voltage)` point of a discharge curve.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DischargeSample {
    /// Seconds since the discharge started.
    pub time: Scalar,
    /// Capacitor voltage at that instant.
    pub voltage: Scalar,
}

/// Append-only discharge series sampled on a fixed time grid.
#[derive(Debug)]
pub struct DischargeRecorder {
    interval: Scalar,
    samples: Vec<DischargeSample>,
    recording: bool,
    next_due: Scalar,
    sample_added: Signal<DischargeSample>,
}

impl DischargeRecorder {
    /// Creates an idle recorder sampling every `interval` seconds.
    #[must_use]
    pub fn new(interval: Scalar) -> Self {
        Self {
            interval,
            samples: Vec::new(),
            recording: false,
            next_due: 0.0,
            sample_added: Signal::new(),
        }
    }

    /// Clears the previous series and records the t = 0 sample.
    pub fn begin(&mut self, initial_voltage: Scalar) {
        self.samples.clear();
        self.recording = true;
        self.next_due = self.interval;
        self.push(0.0, initial_voltage);
    }

    /// Records every grid point up to `elapsed`, reading voltages from `curve`.
    pub fn observe<F>(&mut self, elapsed: Scalar, curve: F)
    where
        F: Fn(Scalar) -> Scalar,
    {
        if !self.recording {
            return;
        }
        while self.next_due <= elapsed + TIME_EPSILON {
            let t = self.next_due;
            self.push(t, curve(t));
            self.next_due += self.interval;
        }
    }

    /// Records the termination sample and closes the recording.
    ///
    /// A grid sample already taken at the same instant is overwritten.
    pub fn finish(&mut self, elapsed: Scalar, voltage: Scalar) {
        if !self.recording {
            return;
        }
        self.recording = false;
        match self.samples.last_mut() {
            Some(last) if (last.time - elapsed).abs() <= TIME_EPSILON => {
                last.voltage = voltage;
                let sample = *last;
                self.sample_added.emit(&sample);
            }
            _ => self.push(elapsed, voltage),
        }
    }

    /// Closes the recording without a final sample.
    pub fn stop(&mut self) {
        self.recording = false;
    }

    fn push(&mut self, time: Scalar, voltage: Scalar) {
        let sample = DischargeSample { time, voltage };
        self.samples.push(sample);
        self.sample_added.emit(&sample);
    }

    /// True between `begin` and `finish`/`stop`.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Seconds between grid samples.
    #[must_use]
    pub fn interval(&self) -> Scalar {
        self.interval
    }

    /// Samples of the latest recording.
    #[must_use]
    pub fn samples(&self) -> &[DischargeSample] {
        &self.samples
    }

    /// Subscription access to per-sample notifications.
    pub fn sample_added_mut(&mut self) -> &mut Signal<DischargeSample> {
        &mut self.sample_added
    }
}

/// Writes a discharge series as CSV with a `time,voltage` header.
pub fn write_samples_csv<W: Write>(mut w: W, samples: &[DischargeSample]) -> io::Result<()> {
    writeln!(w, "time,voltage")?;
    for s in samples {
        writeln!(w, "{:.6},{:.6}", s.time, s.voltage)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn samples_land_on_the_grid_and_end_exactly() {
        let mut rec = DischargeRecorder::new(1.0);
        rec.begin(6.0);
        rec.observe(0.4, |t| 6.0 - t);
        assert_eq!(rec.samples().len(), 1);
        rec.observe(2.7, |t| 6.0 - t);
        rec.finish(2.9, 3.1);

        let times: Vec<_> = rec.samples().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0, 2.9]);
        assert_relative_eq!(rec.samples()[2].voltage, 4.0);
        assert!(!rec.is_recording());

        rec.observe(10.0, |_| 0.0);
        assert_eq!(rec.samples().len(), 4);
    }

    #[test]
    fn final_sample_on_a_grid_point_is_not_duplicated() {
        let mut rec = DischargeRecorder::new(0.5);
        rec.begin(1.0);
        rec.observe(1.0, |_| 0.8);
        rec.finish(1.0, 0.75);
        assert_eq!(rec.samples().len(), 3);
        assert_relative_eq!(rec.samples()[2].voltage, 0.75);
    }

    #[test]
    fn begin_clears_previous_recording() {
        let mut rec = DischargeRecorder::new(0.5);
        rec.begin(1.0);
        rec.observe(3.0, |_| 0.5);
        rec.stop();
        rec.begin(2.0);
        assert_eq!(rec.samples(), [DischargeSample { time: 0.0, voltage: 2.0 }]);
    }

    #[test]
    fn csv_has_header_and_rows() {
        let samples = [
            DischargeSample { time: 0.0, voltage: 6.0 },
            DischargeSample { time: 0.5, voltage: 5.5 },
        ];
        let mut out = Vec::new();
        write_samples_csv(&mut out, &samples).expect("write to vec");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "time,voltage\n0.000000,6.000000\n0.500000,5.500000\n");
    }
}
