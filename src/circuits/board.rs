//! Arena owning every point, wire, switch and lamp of one bench.
//!
//! All link mutations go through the board so the point side and the wire
//! side of a connection are always updated together: after any call,
//! `wire.target == Some(p)` holds exactly when `point[p].wire == Some(wire)`.

use tracing::{debug, trace};

use crate::errors::LabError;
use crate::events::Signal;
use crate::interaction::Interactable;
use crate::math::{distance, Scalar, P2};

use super::component::{Lamp, LampId, Switch, SwitchId};
use super::point::{ConnectionPoint, PointId, WireColor};
use super::wire::{Wire, WireId};

/// Endpoints of a single wire link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireLink {
    /// The wire that was plugged or unplugged.
    pub wire: WireId,
    /// The point on the other end.
    pub point: PointId,
}

/// Notifications emitted by a [`CircuitBoard`].
#[derive(Debug, Default)]
pub struct BoardEvents {
    /// A wire was plugged into a point.
    pub wire_connected: Signal<WireLink>,
    /// A wire was unplugged from a point.
    pub wire_disconnected: Signal<WireLink>,
    /// A switch changed position.
    pub switch_toggled: Signal<(SwitchId, bool)>,
}

/// Bench holding the interactive circuit elements.
#[derive(Debug)]
pub struct CircuitBoard {
    points: Vec<ConnectionPoint>,
    wires: Vec<Wire>,
    switches: Vec<Switch>,
    lamps: Vec<Lamp>,
    snap_radius: Scalar,
    events: BoardEvents,
}

impl CircuitBoard {
    /// Creates an empty board with the given snap radius.
    #[must_use]
    pub fn new(snap_radius: Scalar) -> Self {
        Self {
            points: Vec::new(),
            wires: Vec::new(),
            switches: Vec::new(),
            lamps: Vec::new(),
            snap_radius,
            events: BoardEvents::default(),
        }
    }

    /// Radius within which released wire ends look for points.
    #[must_use]
    pub fn snap_radius(&self) -> Scalar {
        self.snap_radius
    }

    /// Subscription access to board notifications.
    pub fn events_mut(&mut self) -> &mut BoardEvents {
        &mut self.events
    }

    /// Adds a socket accepting wires of `color`.
    pub fn add_point(&mut self, label: impl Into<String>, color: WireColor, position: P2) -> PointId {
        self.push_point(label, color, false, position)
    }

    /// Adds an anchor point for wires of `color`.
    pub fn add_source_point(&mut self, label: impl Into<String>, color: WireColor, position: P2) -> PointId {
        self.push_point(label, color, true, position)
    }

    fn push_point(&mut self, label: impl Into<String>, color: WireColor, is_source: bool, position: P2) -> PointId {
        let id = PointId(self.points.len());
        self.points.push(ConnectionPoint::new(id, label, color, is_source, position));
        id
    }

    /// Adds a wire of `color` anchored at the source point `source`.
    pub fn add_wire(&mut self, label: impl Into<String>, color: WireColor, source: PointId) -> Result<WireId, LabError> {
        let anchor = self.points.get(source.0).ok_or(LabError::UnknownPoint(source.0))?;
        if !anchor.is_source() {
            return Err(LabError::NotASource(anchor.label().to_owned()));
        }
        let position = anchor.position();
        let id = WireId(self.wires.len());
        self.wires.push(Wire::new(id, label, color, source, position));
        Ok(id)
    }

    /// Adds an open switch.
    pub fn add_switch(&mut self, label: impl Into<String>) -> SwitchId {
        let id = SwitchId(self.switches.len());
        self.switches.push(Switch::new(label));
        id
    }

    /// Adds a dark lamp.
    pub fn add_lamp(&mut self, label: impl Into<String>) -> LampId {
        let id = LampId(self.lamps.len());
        self.lamps.push(Lamp::new(label));
        id
    }

    /// Returns a point.
    #[must_use]
    pub fn point(&self, id: PointId) -> Option<&ConnectionPoint> {
        self.points.get(id.0)
    }

    /// Returns a wire.
    #[must_use]
    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(id.0)
    }

    /// Mutable wire access, e.g. to toggle interactability.
    pub fn wire_mut(&mut self, id: WireId) -> Option<&mut Wire> {
        self.wires.get_mut(id.0)
    }

    /// Returns a switch.
    #[must_use]
    pub fn switch(&self, id: SwitchId) -> Option<&Switch> {
        self.switches.get(id.0)
    }

    /// Mutable switch access, e.g. to toggle interactability.
    pub fn switch_mut(&mut self, id: SwitchId) -> Option<&mut Switch> {
        self.switches.get_mut(id.0)
    }

    /// Returns a lamp.
    #[must_use]
    pub fn lamp(&self, id: LampId) -> Option<&Lamp> {
        self.lamps.get(id.0)
    }

    /// Mutable lamp access.
    pub fn lamp_mut(&mut self, id: LampId) -> Option<&mut Lamp> {
        self.lamps.get_mut(id.0)
    }

    /// All points in insertion order.
    #[must_use]
    pub fn points(&self) -> &[ConnectionPoint] {
        &self.points
    }

    /// All wires in insertion order.
    #[must_use]
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// True iff the wire exists and is plugged in.
    #[must_use]
    pub fn is_wire_connected(&self, id: WireId) -> bool {
        self.wire(id).is_some_and(Wire::is_connected)
    }

    /// True iff the switch exists and is closed.
    #[must_use]
    pub fn is_switch_on(&self, id: SwitchId) -> bool {
        self.switch(id).is_some_and(Switch::is_on)
    }

    /// Points within the snap radius of `position`, in insertion order.
    pub fn candidates_near(&self, position: P2) -> impl Iterator<Item = &ConnectionPoint> + '_ {
        let radius = self.snap_radius;
        self.points
            .iter()
            .filter(move |p| distance(&p.position(), &position) <= radius)
    }

    /// Plugs `wire` into `point`.
    ///
    /// Fails without mutation when the point is a source, already occupied
    /// or takes a different color. A wire already plugged elsewhere is moved.
    pub fn try_connect(&mut self, wire: WireId, point: PointId) -> bool {
        let (Some(w), Some(p)) = (self.wires.get(wire.0), self.points.get(point.0)) else {
            debug!(?wire, ?point, "connect refused: unknown wire or point");
            return false;
        };
        if !p.can_accept(w.color()) {
            debug!(
                wire = %w.label(),
                point = %p.label(),
                color = %w.color(),
                accepted = %p.accepted_color(),
                occupied = p.is_connected(),
                "connect refused"
            );
            return false;
        }
        if w.is_connected() {
            self.unlink(wire);
        }

        let position = self.points[point.0].position();
        self.points[point.0].wire = Some(wire);
        let w = &mut self.wires[wire.0];
        w.target = Some(point);
        w.free_end = position;
        trace!(wire = %w.label(), point = %self.points[point.0].label(), "wire connected");

        self.events.wire_connected.emit(&WireLink { wire, point });
        true
    }

    /// Unplugs whatever wire occupies `point`. Returns false if it was free.
    pub fn disconnect_point(&mut self, point: PointId) -> bool {
        match self.points.get(point.0).and_then(ConnectionPoint::connected_wire) {
            Some(wire) => self.disconnect_wire(wire),
            None => false,
        }
    }

    /// Unplugs `wire` and returns its free end to the anchor.
    ///
    /// Returns false if the wire was not plugged in; the end is still reset.
    pub fn disconnect_wire(&mut self, wire: WireId) -> bool {
        if wire.0 >= self.wires.len() {
            return false;
        }
        let unlinked = self.unlink(wire);
        self.wires[wire.0].snap_to_anchor();
        unlinked
    }

    fn unlink(&mut self, wire: WireId) -> bool {
        let Some(point) = self.wires[wire.0].target.take() else {
            return false;
        };
        self.points[point.0].wire = None;
        trace!(wire = %self.wires[wire.0].label(), point = %self.points[point.0].label(), "wire disconnected");
        self.events.wire_disconnected.emit(&WireLink { wire, point });
        true
    }

    /// Picks up the free end of `wire`, unplugging it if needed.
    pub fn begin_drag(&mut self, wire: WireId) -> bool {
        match self.wires.get(wire.0) {
            Some(w) if w.can_interact() => {}
            _ => return false,
        }
        self.unlink(wire);
        self.wires[wire.0].dragging = true;
        true
    }

    /// Moves the free end of a wire being dragged.
    pub fn drag_wire(&mut self, wire: WireId, position: P2) {
        if let Some(w) = self.wires.get_mut(wire.0) {
            if w.dragging && w.can_interact() {
                w.free_end = position;
            }
        }
    }

    /// Drops the free end of `wire` at `position`.
    ///
    /// Among points within the snap radius that accept the wire, the nearest
    /// one is chosen; equidistant candidates resolve to the earliest added
    /// point. On failure the free end returns to the anchor.
    pub fn release_wire(&mut self, wire: WireId, position: P2) -> bool {
        match self.wires.get(wire.0) {
            Some(w) if w.can_interact() => {}
            _ => return false,
        }
        if self.wires[wire.0].is_connected() {
            self.unlink(wire);
        }
        self.wires[wire.0].dragging = false;

        let color = self.wires[wire.0].color();
        let mut best: Option<(PointId, Scalar)> = None;
        for p in self.candidates_near(position).filter(|p| p.can_accept(color)) {
            let d = distance(&p.position(), &position);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((p.id(), d));
            }
        }

        if let Some((point, _)) = best {
            if self.try_connect(wire, point) {
                return true;
            }
        }
        debug!(wire = %self.wires[wire.0].label(), "no compatible point in range, returning to anchor");
        self.wires[wire.0].snap_to_anchor();
        false
    }

    /// Flips a switch. Returns false if it is unknown or not interactable.
    pub fn toggle_switch(&mut self, id: SwitchId) -> bool {
        let Some(switch) = self.switches.get_mut(id.0) else {
            return false;
        };
        if !switch.toggle() {
            return false;
        }
        let on = switch.is_on();
        self.events.switch_toggled.emit(&(id, on));
        true
    }

    /// Opens a switch regardless of interactability.
    pub fn reset_switch(&mut self, id: SwitchId) {
        if let Some(switch) = self.switches.get_mut(id.0) {
            let was_on = switch.is_on();
            switch.reset();
            if was_on {
                self.events.switch_toggled.emit(&(id, false));
            }
        }
    }
}

impl Default for CircuitBoard {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_SNAP_RADIUS)
    }
}
