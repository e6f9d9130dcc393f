//! Scripted experiment steps and the state machine that walks them.

/// Step definitions and their builder.
pub mod step;
/// The progression state machine and the action-reporting seam.
pub mod machine;

pub use machine::{ActionSink, Experiment, ExperimentEvents, Progress};
pub use step::{ExperimentStep, StepDefinition, StepHook};
