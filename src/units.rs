//! Strongly typed quantities for component parameters.
//!
//! A [`Quantity`] is a plain number tagged with a zero-sized unit marker so
//! that a capacitance can never be handed to something expecting a
//! resistance. Arithmetic is deliberately minimal: callers extract the raw
//! value with [`Quantity::value`] for computation.

use std::fmt;
use std::marker::PhantomData;

use crate::math::Scalar;

/// Marker trait implemented by every unit tag.
pub trait Unit: Copy + fmt::Debug + Default + PartialEq {
    /// SI symbol used when formatting.
    const SYMBOL: &'static str;
}

macro_rules! unit_marker {
    ($(#[$meta:meta])* $name:ident, $symbol:literal) => {
        $(#[$meta])*
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl Unit for $name {
            const SYMBOL: &'static str = $symbol;
        }
    };
}

unit_marker!(
    /// Resistance in ohms.
    Ohm,
    "Ω"
);
unit_marker!(
    /// Capacitance in farads.
    Farad,
    "F"
);

/// A scalar tagged with a unit.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quantity<T, U> {
    value: T,
    unit: PhantomData<U>,
}

impl<T: Copy, U: Unit> Quantity<T, U> {
    /// Wraps a raw value.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            value,
            unit: PhantomData,
        }
    }

    /// Returns the raw value.
    #[must_use]
    pub fn value(&self) -> T {
        self.value
    }
}

impl<U: Unit> fmt::Display for Quantity<Scalar, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, U::SYMBOL)
    }
}

/// Resistance.
pub type Resistance<T> = Quantity<T, Ohm>;
/// Capacitance.
pub type Capacitance<T> = Quantity<T, Farad>;
