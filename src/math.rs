//! Shared numerical primitives anchored on `nalgebra`.

use nalgebra::Point2;

/// Primary scalar type used across the crate.
pub type Scalar = f64;
/// World-space position on the experiment bench.
pub type P2 = Point2<Scalar>;

/// Absolute tolerance used when comparing simulated voltages.
pub const VOLTAGE_EPSILON: Scalar = 1.0e-9;

/// Euclidean distance between two bench positions.
#[inline]
#[must_use]
pub fn distance(a: &P2, b: &P2) -> Scalar {
    nalgebra::distance(a, b)
}

/// Returns true when `a` and `b` differ by at most `tolerance`.
#[inline]
#[must_use]
pub fn approx_eq(a: Scalar, b: Scalar, tolerance: Scalar) -> bool {
    (a - b).abs() <= tolerance
}

/// Clamps `value / reference` to the unit interval.
///
/// A non-positive reference yields zero rather than dividing by it.
#[inline]
#[must_use]
pub fn unit_ratio(value: Scalar, reference: Scalar) -> Scalar {
    if reference <= 0.0 {
        return 0.0;
    }
    (value / reference).clamp(0.0, 1.0)
}
