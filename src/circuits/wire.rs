use crate::interaction::Interactable;
use crate::math::P2;

use super::point::{PointId, WireColor};

/// Index of a wire on its [`CircuitBoard`](super::board::CircuitBoard).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId(pub(crate) usize);

impl WireId {
    /// Position of the wire in board insertion order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A colored lead anchored at a source point with one free end.
///
/// The free end is either resting at the anchor, being dragged, or pinned to
/// the target point it is connected to.
#[derive(Debug, Clone)]
pub struct Wire {
    id: WireId,
    label: String,
    color: WireColor,
    source: PointId,
    anchor: P2,
    pub(crate) target: Option<PointId>,
    pub(crate) free_end: P2,
    pub(crate) dragging: bool,
    interactable: bool,
}

impl Wire {
    pub(crate) fn new(
        id: WireId,
        label: impl Into<String>,
        color: WireColor,
        source: PointId,
        anchor: P2,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            color,
            source,
            anchor,
            target: None,
            free_end: anchor,
            dragging: false,
            interactable: true,
        }
    }

    /// Board index.
    #[must_use]
    pub fn id(&self) -> WireId {
        self.id
    }

    /// Human-readable identifier.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Fixed color tag.
    #[must_use]
    pub fn color(&self) -> WireColor {
        self.color
    }

    /// Source point this wire is anchored to.
    #[must_use]
    pub fn source(&self) -> PointId {
        self.source
    }

    /// World position of the anchor.
    #[must_use]
    pub fn anchor(&self) -> P2 {
        self.anchor
    }

    /// Point the free end is plugged into, if any.
    #[must_use]
    pub fn target(&self) -> Option<PointId> {
        self.target
    }

    /// True iff the free end is plugged into a point.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.target.is_some()
    }

    /// Current world position of the free end.
    #[must_use]
    pub fn free_end(&self) -> P2 {
        self.free_end
    }

    /// True between `begin_drag` and `release_wire`.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub(crate) fn snap_to_anchor(&mut self) {
        self.free_end = self.anchor;
    }
}

impl Interactable for Wire {
    fn set_interactable(&mut self, interactable: bool) {
        self.interactable = interactable;
        if !interactable && self.dragging {
            self.dragging = false;
            if self.target.is_none() {
                self.snap_to_anchor();
            }
        }
    }

    fn can_interact(&self) -> bool {
        self.interactable
    }
}
