//! Aggregate "complete" / "active" state over a set of required elements.

use tracing::{debug, info};

use crate::events::Signal;
use crate::experiment::ActionSink;

use super::board::CircuitBoard;
use super::component::{LampId, SwitchId};
use super::wire::WireId;

/// Edge notifications emitted by a [`CircuitManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitEvent {
    /// Every required wire became connected.
    Complete,
    /// A required wire was disconnected.
    Incomplete,
    /// Complete and every required switch closed.
    Active,
    /// No longer active.
    Inactive,
}

/// Derives circuit completeness from required wires and switches.
///
/// The first transition into complete (and into active) over the
/// manager's lifetime reports the configured action once; only
/// [`reset`](Self::reset) and [`rearm`](Self::rearm) re-arm those reports. Controlled lamps follow
/// every active edge.
#[derive(Debug)]
pub struct CircuitManager {
    name: String,
    required_wires: Vec<WireId>,
    required_switches: Vec<SwitchId>,
    controlled_lamps: Vec<LampId>,
    complete_action: Option<String>,
    active_action: Option<String>,
    complete: bool,
    active: bool,
    registered_complete: bool,
    registered_active: bool,
    events: Signal<CircuitEvent>,
}

impl CircuitManager {
    /// Creates a manager over the given required wires and switches.
    #[must_use]
    pub fn new(name: impl Into<String>, required_wires: Vec<WireId>, required_switches: Vec<SwitchId>) -> Self {
        Self {
            name: name.into(),
            required_wires,
            required_switches,
            controlled_lamps: Vec::new(),
            complete_action: None,
            active_action: None,
            complete: false,
            active: false,
            registered_complete: false,
            registered_active: false,
            events: Signal::new(),
        }
    }

    /// Action reported the first time the circuit becomes complete.
    #[must_use]
    pub fn with_complete_action(mut self, action_id: impl Into<String>) -> Self {
        self.complete_action = Some(action_id.into());
        self
    }

    /// Action reported the first time the circuit becomes active.
    #[must_use]
    pub fn with_active_action(mut self, action_id: impl Into<String>) -> Self {
        self.active_action = Some(action_id.into());
        self
    }

    /// Lamps switched on and off with the active state.
    #[must_use]
    pub fn with_controlled_lamps(mut self, lamps: Vec<LampId>) -> Self {
        self.controlled_lamps = lamps;
        self
    }

    /// Human-readable identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every required wire is connected.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Complete, and every required switch is on.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Subscription access to edge notifications.
    pub fn events_mut(&mut self) -> &mut Signal<CircuitEvent> {
        &mut self.events
    }

    /// Recomputes both aggregates from the board and fires edge effects.
    pub fn refresh(&mut self, board: &mut CircuitBoard, sink: &mut dyn ActionSink) {
        let complete = self.required_wires.iter().all(|&w| board.is_wire_connected(w));
        let active = complete && self.required_switches.iter().all(|&s| board.is_switch_on(s));

        if complete != self.complete {
            self.complete = complete;
            if complete {
                info!(circuit = %self.name, "circuit complete");
                self.events.emit(&CircuitEvent::Complete);
                if !self.registered_complete {
                    self.registered_complete = true;
                    if let Some(action) = &self.complete_action {
                        sink.register_action(action);
                    }
                }
            } else {
                debug!(circuit = %self.name, "circuit incomplete");
                self.events.emit(&CircuitEvent::Incomplete);
            }
        }

        if active != self.active {
            self.active = active;
            for &lamp in &self.controlled_lamps {
                if let Some(lamp) = board.lamp_mut(lamp) {
                    lamp.set_lit(active);
                }
            }
            if active {
                info!(circuit = %self.name, "circuit active");
                self.events.emit(&CircuitEvent::Active);
                if !self.registered_active {
                    self.registered_active = true;
                    if let Some(action) = &self.active_action {
                        sink.register_action(action);
                    }
                }
            } else {
                debug!(circuit = %self.name, "circuit inactive");
                self.events.emit(&CircuitEvent::Inactive);
            }
        }
    }

    /// Re-arms the one-shot reports, leaving wires and switches as they are.
    ///
    /// The next transition into complete or active reports again; the
    /// present state does not count as a transition.
    pub fn rearm(&mut self) {
        self.registered_complete = false;
        self.registered_active = false;
    }

    /// Unplugs every required wire, opens every required switch, re-arms
    /// the one-shot reports and recomputes.
    pub fn reset(&mut self, board: &mut CircuitBoard, sink: &mut dyn ActionSink) {
        for &wire in &self.required_wires {
            board.disconnect_wire(wire);
        }
        for &switch in &self.required_switches {
            board.reset_switch(switch);
        }
        self.rearm();
        self.refresh(board, sink);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::circuits::point::{PointId, WireColor};
    use crate::math::P2;

    struct Rig {
        board: CircuitBoard,
        wires: [WireId; 2],
        sockets: [PointId; 2],
        switch: SwitchId,
        lamp: LampId,
        manager: CircuitManager,
    }

    fn rig() -> Rig {
        let mut board = CircuitBoard::new(0.5);
        let plus = board.add_source_point("+", WireColor::Red, P2::new(0.0, 0.0));
        let minus = board.add_source_point("-", WireColor::Black, P2::new(0.0, 1.0));
        let a = board.add_point("A", WireColor::Red, P2::new(4.0, 0.0));
        let b = board.add_point("B", WireColor::Black, P2::new(4.0, 1.0));
        let red = board.add_wire("red", WireColor::Red, plus).unwrap();
        let black = board.add_wire("black", WireColor::Black, minus).unwrap();
        let switch = board.add_switch("S1");
        let lamp = board.add_lamp("L1");
        let manager = CircuitManager::new("rc", vec![red, black], vec![switch])
            .with_complete_action("complete")
            .with_active_action("active")
            .with_controlled_lamps(vec![lamp]);
        Rig { board, wires: [red, black], sockets: [a, b], switch, lamp, manager }
    }

    impl Rig {
        fn connect_all(&mut self, log: &mut Vec<String>) {
            for (w, p) in self.wires.into_iter().zip(self.sockets) {
                assert!(self.board.try_connect(w, p));
                self.manager.refresh(&mut self.board, log);
            }
        }

        fn toggle(&mut self, log: &mut Vec<String>) {
            assert!(self.board.toggle_switch(self.switch));
            self.manager.refresh(&mut self.board, log);
        }
    }

    #[test]
    fn wires_complete_and_switch_activates() {
        let mut r = rig();
        let mut log = Vec::new();
        r.manager.refresh(&mut r.board, &mut log);
        assert!(!r.manager.is_complete());

        r.connect_all(&mut log);
        assert!(r.manager.is_complete());
        assert!(!r.manager.is_active());

        r.toggle(&mut log);
        assert!(r.manager.is_active());
        assert!(r.board.lamp(r.lamp).unwrap().is_lit());
        assert_eq!(log, vec!["complete".to_string(), "active".to_string()]);
    }

    #[test]
    fn active_action_is_one_shot_until_reset() {
        let mut r = rig();
        let mut log = Vec::new();
        r.connect_all(&mut log);
        for _ in 0..4 {
            r.toggle(&mut log);
        }
        assert_eq!(log.iter().filter(|a| *a == "active").count(), 1);
        assert!(!r.board.lamp(r.lamp).unwrap().is_lit());

        r.manager.reset(&mut r.board, &mut log);
        assert!(!r.manager.is_complete());
        assert!(r.board.wires().iter().all(|w| !w.is_connected()));
        assert!(!r.board.is_switch_on(r.switch));

        r.connect_all(&mut log);
        r.toggle(&mut log);
        assert_eq!(log.iter().filter(|a| *a == "active").count(), 2);
        assert_eq!(log.iter().filter(|a| *a == "complete").count(), 2);
    }

    #[test]
    fn rearm_keeps_the_board_and_waits_for_the_next_edge() {
        let mut r = rig();
        let mut log = Vec::new();
        r.connect_all(&mut log);
        r.toggle(&mut log);
        assert_eq!(log, vec!["complete", "active"]);

        r.manager.rearm();
        r.manager.refresh(&mut r.board, &mut log);
        assert!(r.manager.is_active());
        assert_eq!(log.len(), 2);

        assert!(r.board.disconnect_wire(r.wires[0]));
        r.manager.refresh(&mut r.board, &mut log);
        assert!(r.board.try_connect(r.wires[0], r.sockets[0]));
        r.manager.refresh(&mut r.board, &mut log);
        assert_eq!(log, vec!["complete", "active", "complete", "active"]);
    }

    #[test]
    fn edges_fire_only_on_transitions() {
        let mut r = rig();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        r.manager.events_mut().subscribe(move |e: &CircuitEvent| sink.borrow_mut().push(*e));
        let mut log = Vec::new();

        r.connect_all(&mut log);
        r.manager.refresh(&mut r.board, &mut log);
        r.toggle(&mut log);
        r.manager.refresh(&mut r.board, &mut log);
        assert!(r.board.disconnect_wire(r.wires[0]));
        r.manager.refresh(&mut r.board, &mut log);

        assert_eq!(
            *events.borrow(),
            vec![
                CircuitEvent::Complete,
                CircuitEvent::Active,
                CircuitEvent::Incomplete,
                CircuitEvent::Inactive,
            ]
        );
    }

    #[test]
    fn empty_requirements_are_vacuously_active() {
        let mut board = CircuitBoard::default();
        let mut manager = CircuitManager::new("empty", Vec::new(), Vec::new()).with_active_action("on");
        let mut log = Vec::new();
        manager.refresh(&mut board, &mut log);
        assert!(manager.is_complete());
        assert!(manager.is_active());
        assert_eq!(log, vec!["on".to_string()]);
    }
}
