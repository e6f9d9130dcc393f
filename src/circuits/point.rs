use std::fmt;

use crate::math::P2;

use super::wire::WireId;

/// Index of a connection point on its [`CircuitBoard`](super::board::CircuitBoard).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(pub(crate) usize);

impl PointId {
    /// Position of the point in board insertion order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Color tag shared by wires and the sockets that accept them.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireColor {
    /// Positive lead.
    Red,
    /// Negative / ground lead.
    Black,
    /// Signal lead.
    Blue,
    /// Signal lead.
    Yellow,
    /// Signal lead.
    Green,
}

impl fmt::Display for WireColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Red => "red",
            Self::Black => "black",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Green => "green",
        };
        f.write_str(name)
    }
}

/// A typed socket holding at most one wire.
///
/// Source points are wire anchors: they never accept a connection. The
/// occupying wire is only ever set by the owning board, which keeps the
/// point and wire sides of a link in step.
#[derive(Debug, Clone)]
pub struct ConnectionPoint {
    id: PointId,
    label: String,
    accepted_color: WireColor,
    is_source: bool,
    position: P2,
    pub(crate) wire: Option<WireId>,
}

impl ConnectionPoint {
    pub(crate) fn new(
        id: PointId,
        label: impl Into<String>,
        accepted_color: WireColor,
        is_source: bool,
        position: P2,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            accepted_color,
            is_source,
            position,
            wire: None,
        }
    }

    /// Board index.
    #[must_use]
    pub fn id(&self) -> PointId {
        self.id
    }

    /// Human-readable identifier (e.g. `C1+`).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The only wire color this point is compatible with.
    #[must_use]
    pub fn accepted_color(&self) -> WireColor {
        self.accepted_color
    }

    /// Whether this point anchors wires instead of accepting them.
    #[must_use]
    pub fn is_source(&self) -> bool {
        self.is_source
    }

    /// World position of the socket.
    #[must_use]
    pub fn position(&self) -> P2 {
        self.position
    }

    /// True iff a wire currently occupies this point.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.wire.is_some()
    }

    /// The wire currently occupying this point.
    #[must_use]
    pub fn connected_wire(&self) -> Option<WireId> {
        self.wire
    }

    /// True iff the point is free, is not a source, and takes `color`.
    #[must_use]
    pub fn can_accept(&self, color: WireColor) -> bool {
        !self.is_source && !self.is_connected() && color == self.accepted_color
    }
}
