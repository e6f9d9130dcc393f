use std::fmt;

/// Callback invoked with the step index and id.
pub type StepHook = Box<dyn FnMut(usize, &str)>;

/// Plain-data description of a step, as supplied by a UI or config layer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepDefinition {
    /// Unique step id.
    pub id: String,
    /// Instruction text shown while the step is active.
    #[cfg_attr(feature = "serde", serde(default))]
    pub instruction: String,
    /// Actions that must all be reported before the step auto-advances.
    #[cfg_attr(feature = "serde", serde(default))]
    pub required_actions: Vec<String>,
    /// Whether the UI should offer a manual "next" control.
    #[cfg_attr(feature = "serde", serde(default))]
    pub show_next_button: bool,
}

/// One unit of a scripted experiment.
pub struct ExperimentStep {
    pub(crate) id: String,
    pub(crate) instruction: String,
    pub(crate) required_actions: Vec<String>,
    pub(crate) show_next_button: bool,
    pub(crate) on_enter: Option<StepHook>,
    pub(crate) on_complete: Option<StepHook>,
}

impl ExperimentStep {
    /// Creates a step with no required actions and no next button.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            instruction: String::new(),
            required_actions: Vec::new(),
            show_next_button: false,
            on_enter: None,
            on_complete: None,
        }
    }

    /// Sets the instruction text.
    #[must_use]
    pub fn instruction(mut self, text: impl Into<String>) -> Self {
        self.instruction = text.into();
        self
    }

    /// Adds a required action. Duplicates and empty ids are ignored.
    #[must_use]
    pub fn require(mut self, action_id: impl Into<String>) -> Self {
        let action_id = action_id.into();
        if !action_id.is_empty() && !self.required_actions.contains(&action_id) {
            self.required_actions.push(action_id);
        }
        self
    }

    /// Sets the next-button flag.
    #[must_use]
    pub fn with_next_button(mut self, show: bool) -> Self {
        self.show_next_button = show;
        self
    }

    /// Hook run when the step becomes current.
    #[must_use]
    pub fn on_enter<F>(mut self, hook: F) -> Self
    where
        F: FnMut(usize, &str) + 'static,
    {
        self.on_enter = Some(Box::new(hook));
        self
    }

    /// Hook run when the step is left.
    #[must_use]
    pub fn on_complete<F>(mut self, hook: F) -> Self
    where
        F: FnMut(usize, &str) + 'static,
    {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// Unique step id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Instruction text.
    #[must_use]
    pub fn instruction_text(&self) -> &str {
        &self.instruction
    }

    /// Required action ids in declaration order.
    #[must_use]
    pub fn required_actions(&self) -> &[String] {
        &self.required_actions
    }

    /// True if `action_id` gates this step.
    #[must_use]
    pub fn requires(&self, action_id: &str) -> bool {
        self.required_actions.iter().any(|a| a == action_id)
    }

    /// Whether the manual next control is shown.
    #[must_use]
    pub fn shows_next_button(&self) -> bool {
        self.show_next_button
    }
}

impl From<StepDefinition> for ExperimentStep {
    fn from(def: StepDefinition) -> Self {
        def.required_actions
            .into_iter()
            .fold(Self::new(def.id).instruction(def.instruction), Self::require)
            .with_next_button(def.show_next_button)
    }
}

impl fmt::Debug for ExperimentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExperimentStep")
            .field("id", &self.id)
            .field("required_actions", &self.required_actions)
            .field("show_next_button", &self.show_next_button)
            .field("on_enter", &self.on_enter.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_actions_are_unique_and_non_empty() {
        let step = ExperimentStep::new("s").require("a").require("").require("a").require("b");
        assert_eq!(step.required_actions(), ["a", "b"]);
        assert!(step.requires("b"));
        assert!(!step.requires("c"));
    }

    #[test]
    fn definition_converts_into_step() {
        let def = StepDefinition {
            id: "wire".into(),
            instruction: "Connect both leads".into(),
            required_actions: vec!["x".into(), "x".into(), "y".into()],
            show_next_button: true,
        };
        let step = ExperimentStep::from(def);
        assert_eq!(step.id(), "wire");
        assert_eq!(step.instruction_text(), "Connect both leads");
        assert_eq!(step.required_actions(), ["x", "y"]);
        assert!(step.shows_next_button());
    }
}
