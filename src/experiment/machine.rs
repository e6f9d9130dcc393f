//! Step progression gated on named actions.

use std::collections::HashSet;

use tracing::{debug, info, trace};

use crate::errors::LabError;
use crate::events::Signal;

use super::step::ExperimentStep;

/// Receiver of action reports.
///
/// Interactive elements are handed a sink at the call site instead of
/// looking up a global orchestrator.
pub trait ActionSink {
    /// Reports that the learner accomplished `action_id`.
    fn register_action(&mut self, action_id: &str);
}

/// Collects reported actions in order; useful for headless runs and tests.
impl ActionSink for Vec<String> {
    fn register_action(&mut self, action_id: &str) {
        self.push(action_id.to_owned());
    }
}

/// Where the run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// `start` has not been called.
    NotStarted,
    /// The step at this index is current.
    Active(usize),
    /// Every step has been left.
    Finished,
}

/// Notifications emitted by an [`Experiment`].
#[derive(Debug, Default)]
pub struct ExperimentEvents {
    /// A new step became current; carries its index.
    pub step_changed: Signal<usize>,
    /// The last step was left.
    pub completed: Signal<()>,
}

/// Ordered list of steps plus the live run state.
///
/// `completed_actions` only ever describes the current step: it is cleared
/// on every transition.
#[derive(Debug)]
pub struct Experiment {
    name: String,
    steps: Vec<ExperimentStep>,
    progress: Progress,
    completed_actions: HashSet<String>,
    events: ExperimentEvents,
}

impl Experiment {
    /// Creates an experiment. Step ids must be unique.
    pub fn new(name: impl Into<String>, steps: Vec<ExperimentStep>) -> Result<Self, LabError> {
        {
            let mut seen = HashSet::new();
            if let Some(dup) = steps.iter().find(|s| !seen.insert(s.id())) {
                return Err(LabError::DuplicateStep(dup.id().to_owned()));
            }
        }
        Ok(Self {
            name: name.into(),
            steps,
            progress: Progress::NotStarted,
            completed_actions: HashSet::new(),
            events: ExperimentEvents::default(),
        })
    }

    /// Human-readable identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscription access to notifications.
    pub fn events_mut(&mut self) -> &mut ExperimentEvents {
        &mut self.events
    }

    /// Resets the run and enters the first step.
    ///
    /// With no steps the run finishes immediately.
    pub fn start(&mut self) {
        info!(experiment = %self.name, steps = self.steps.len(), "experiment starting");
        self.progress = Progress::NotStarted;
        self.completed_actions.clear();
        self.advance();
    }

    /// Leaves the current step and enters the next one.
    ///
    /// No-op once the run has finished.
    pub fn advance(&mut self) {
        let next = match self.progress {
            Progress::NotStarted => 0,
            Progress::Active(index) => {
                self.fire_on_complete(index);
                index + 1
            }
            Progress::Finished => {
                trace!("advance ignored: experiment finished");
                return;
            }
        };
        self.enter(next);
    }

    /// Advances a step that has no required actions and shows its next button.
    pub fn confirm_next(&mut self) -> bool {
        match self.current_step() {
            Some(step) if step.shows_next_button() && step.required_actions().is_empty() => {
                self.advance();
                true
            }
            _ => {
                debug!("next confirmation ignored");
                false
            }
        }
    }

    /// Jumps straight to `index`.
    ///
    /// The step actually being left runs its completion hook; steps skipped
    /// over run no hooks at all. Out-of-range indices are rejected.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.steps.len() {
            debug!(index, steps = self.steps.len(), "jump rejected: index out of range");
            return false;
        }
        if let Progress::Active(current) = self.progress {
            self.fire_on_complete(current);
        }
        info!(index, "jumping to step");
        self.enter(index);
        true
    }

    /// Records `action_id` for the current step and auto-advances when every
    /// required action has been seen. Empty ids, and reports arriving while no
    /// step is active, are ignored.
    pub fn register_action(&mut self, action_id: &str) {
        if action_id.is_empty() {
            debug!("empty action id ignored");
            return;
        }
        if self.current_step().is_none() {
            debug!(action = action_id, "action ignored: no active step");
            return;
        }
        if self.completed_actions.insert(action_id.to_owned()) {
            debug!(action = action_id, "action registered");
        }
        self.evaluate_completion();
    }

    fn enter(&mut self, index: usize) {
        self.completed_actions.clear();
        if index >= self.steps.len() {
            self.progress = Progress::Finished;
            info!(experiment = %self.name, "experiment complete");
            self.events.completed.emit(&());
            return;
        }

        self.progress = Progress::Active(index);
        let step = &mut self.steps[index];
        info!(index, step = %step.id, "step entered");
        if let Some(hook) = step.on_enter.as_mut() {
            hook(index, &step.id);
        }
        if step.required_actions.is_empty() && !step.show_next_button {
            step.show_next_button = true;
        }
        self.events.step_changed.emit(&index);
        self.evaluate_completion();
    }

    fn fire_on_complete(&mut self, index: usize) {
        if let Some(step) = self.steps.get_mut(index) {
            if let Some(hook) = step.on_complete.as_mut() {
                hook(index, &step.id);
            }
        }
    }

    fn evaluate_completion(&mut self) {
        let Some(step) = self.current_step() else {
            return;
        };
        if step.required_actions.is_empty() {
            return;
        }
        if step.required_actions.iter().all(|a| self.completed_actions.contains(a)) {
            debug!(step = %step.id, "all required actions satisfied");
            self.advance();
        }
    }

    /// Run position.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Index of the current step, if one is active.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        match self.progress {
            Progress::Active(index) => Some(index),
            _ => None,
        }
    }

    /// The current step, if one is active.
    #[must_use]
    pub fn current_step(&self) -> Option<&ExperimentStep> {
        self.current_index().and_then(|i| self.steps.get(i))
    }

    /// True once every step has been left.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.progress == Progress::Finished
    }

    /// True if the step at `index` is current.
    #[must_use]
    pub fn is_current_index(&self, index: usize) -> bool {
        self.current_index() == Some(index)
    }

    /// True if the step named `step_id` is current.
    #[must_use]
    pub fn is_current_step(&self, step_id: &str) -> bool {
        self.current_step().is_some_and(|s| s.id() == step_id)
    }

    /// True if the current step requires `action_id`.
    #[must_use]
    pub fn is_action_required(&self, action_id: &str) -> bool {
        self.current_step().is_some_and(|s| s.requires(action_id))
    }

    /// True if `action_id` has been reported during the current step.
    #[must_use]
    pub fn is_action_completed(&self, action_id: &str) -> bool {
        self.current_step().is_some() && self.completed_actions.contains(action_id)
    }

    /// Required actions of the current step not reported yet, in declaration order.
    #[must_use]
    pub fn outstanding_actions(&self) -> Vec<&str> {
        self.current_step()
            .map(|s| {
                s.required_actions()
                    .iter()
                    .filter(|a| !self.completed_actions.contains(*a))
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Actions reported during the current step.
    #[must_use]
    pub fn completed_actions(&self) -> &HashSet<String> {
        &self.completed_actions
    }

    /// Fraction of steps left behind, in [0, 1].
    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        match self.progress {
            Progress::NotStarted => 0.0,
            Progress::Finished => 1.0,
            Progress::Active(index) => index as f64 / self.steps.len() as f64,
        }
    }

    /// Number of steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// All steps in order.
    #[must_use]
    pub fn steps(&self) -> &[ExperimentStep] {
        &self.steps
    }

    /// Looks up a step index by id.
    #[must_use]
    pub fn index_of(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id() == step_id)
    }
}

impl ActionSink for Experiment {
    fn register_action(&mut self, action_id: &str) {
        Experiment::register_action(self, action_id);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    fn hooked(id: &str, log: &Log) -> ExperimentStep {
        let enter = Rc::clone(log);
        let leave = Rc::clone(log);
        ExperimentStep::new(id)
            .on_enter(move |i, id| enter.borrow_mut().push(format!("enter {i} {id}")))
            .on_complete(move |i, id| leave.borrow_mut().push(format!("complete {i} {id}")))
    }

    fn experiment(steps: Vec<ExperimentStep>) -> Experiment {
        Experiment::new("test", steps).expect("unique step ids")
    }

    #[test]
    fn duplicate_step_ids_are_rejected() {
        let err = Experiment::new("dup", vec![ExperimentStep::new("a"), ExperimentStep::new("a")]);
        assert!(matches!(err, Err(LabError::DuplicateStep(id)) if id == "a"));
    }

    #[test]
    fn all_required_actions_gate_advancement() {
        let mut exp = experiment(vec![
            ExperimentStep::new("first").require("a").require("b"),
            ExperimentStep::new("second").require("c"),
        ]);
        exp.start();
        assert!(exp.is_current_index(0));

        exp.register_action("a");
        assert!(exp.is_current_index(0));
        assert_eq!(exp.outstanding_actions(), vec!["b"]);

        exp.register_action("b");
        assert!(exp.is_current_step("second"));
        assert!(exp.completed_actions().is_empty());
    }

    #[test]
    fn registration_is_idempotent_and_unrequired_ids_are_kept() {
        let mut exp = experiment(vec![ExperimentStep::new("s").require("a").require("b")]);
        exp.start();
        exp.register_action("a");
        exp.register_action("a");
        exp.register_action("noise");
        exp.register_action("");
        assert_eq!(exp.completed_actions().len(), 2);
        assert!(exp.is_action_completed("noise"));
        assert!(exp.is_action_required("b"));
        assert!(!exp.is_action_required("noise"));
    }

    #[test]
    fn actions_from_a_previous_step_do_not_carry_over() {
        let mut exp = experiment(vec![
            ExperimentStep::new("one").require("a"),
            ExperimentStep::new("two").require("a").require("b"),
        ]);
        exp.start();
        exp.register_action("b");
        exp.register_action("a");
        assert!(exp.is_current_index(1));
        assert!(!exp.is_action_completed("b"));
        exp.register_action("b");
        assert!(exp.is_current_index(1));
        exp.register_action("a");
        assert!(exp.is_finished());
    }

    #[test]
    fn empty_step_forces_next_button_and_needs_confirmation() {
        let mut exp = experiment(vec![ExperimentStep::new("intro"), ExperimentStep::new("work").require("x")]);
        exp.start();
        assert!(exp.is_current_index(0));
        assert!(exp.current_step().unwrap().shows_next_button());

        exp.register_action("anything");
        assert!(exp.is_current_index(0));

        assert!(exp.confirm_next());
        assert!(exp.is_current_index(1));
        // Steps with required actions cannot be confirmed manually.
        assert!(!exp.confirm_next());
        assert!(exp.is_current_index(1));
    }

    #[test]
    fn required_step_with_next_button_still_refuses_confirmation() {
        let mut exp = experiment(vec![ExperimentStep::new("s").require("x").with_next_button(true)]);
        exp.start();
        assert!(!exp.confirm_next());
        assert!(exp.is_current_index(0));
    }

    #[test]
    fn hooks_and_notifications_follow_transitions() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut exp = experiment(vec![hooked("a", &log).require("go"), hooked("b", &log).require("go")]);
        let changed = Rc::clone(&log);
        exp.events_mut()
            .step_changed
            .subscribe(move |i: &usize| changed.borrow_mut().push(format!("changed {i}")));
        let done = Rc::clone(&log);
        exp.events_mut()
            .completed
            .subscribe(move |_| done.borrow_mut().push("done".to_owned()));

        exp.start();
        exp.register_action("go");
        exp.register_action("go");
        exp.advance();

        assert_eq!(
            *log.borrow(),
            vec![
                "enter 0 a",
                "changed 0",
                "complete 0 a",
                "enter 1 b",
                "changed 1",
                "complete 1 b",
                "done",
            ]
        );
        assert!(exp.is_finished());
        assert!(exp.current_step().is_none());
    }

    #[test]
    fn empty_experiment_finishes_on_start() {
        let mut exp = experiment(Vec::new());
        let fired = Rc::new(RefCell::new(0));
        let f = Rc::clone(&fired);
        exp.events_mut().completed.subscribe(move |_| *f.borrow_mut() += 1);
        exp.start();
        exp.advance();
        assert!(exp.is_finished());
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn jump_fires_only_the_left_step_and_the_target() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let steps = ["s0", "s1", "s2", "s3"].iter().map(|id| hooked(id, &log).require("x")).collect();
        let mut exp = experiment(steps);
        exp.start();
        log.borrow_mut().clear();

        assert!(exp.jump_to(3));
        assert_eq!(*log.borrow(), vec!["complete 0 s0", "enter 3 s3"]);
        assert!(exp.is_current_index(3));

        assert!(!exp.jump_to(4));
        assert!(exp.is_current_index(3));
    }

    #[test]
    fn jump_clears_completed_actions() {
        let mut exp = experiment(vec![
            ExperimentStep::new("a").require("x").require("y"),
            ExperimentStep::new("b").require("x").require("y"),
        ]);
        exp.start();
        exp.register_action("x");
        assert!(exp.jump_to(1));
        assert!(!exp.is_action_completed("x"));
        assert!((exp.progress_fraction() - 0.5).abs() < 1.0e-12);
    }

    #[test]
    fn queries_are_neutral_outside_a_step() {
        let mut exp = experiment(vec![ExperimentStep::new("a").require("x")]);
        assert_eq!(exp.progress(), Progress::NotStarted);
        assert!(!exp.is_action_required("x"));
        assert!(exp.outstanding_actions().is_empty());
        exp.register_action("x");
        assert!(!exp.is_action_completed("x"));
        assert!(!exp.confirm_next());
        assert_eq!(exp.index_of("a"), Some(0));
    }
}
