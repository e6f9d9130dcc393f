//! Enable/disable capability shared by everything a learner can touch.

/// An element the learner can operate (wire, switch, knob, button).
///
/// While an element cannot be interacted with, user-facing operations on it
/// are absorbed as no-ops. Simulation-side resets still apply.
pub trait Interactable {
    /// Enables or disables user interaction.
    fn set_interactable(&mut self, interactable: bool);

    /// Whether user interaction is currently accepted.
    fn can_interact(&self) -> bool;
}
