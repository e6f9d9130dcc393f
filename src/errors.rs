//! Shared error types used across submodules.
//!
//! Only construction and configuration can fail. Runtime operations absorb
//! invalid preconditions as no-ops and report them through their return
//! values instead.

use thiserror::Error;

use crate::simulation::ConfigError;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum LabError {
    /// Wraps configuration validation errors.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A point index does not exist on the board.
    #[error("unknown connection point #{0}")]
    UnknownPoint(usize),
    /// Wires can only be anchored to source points.
    #[error("connection point `{0}` is not a source and cannot anchor a wire")]
    NotASource(String),
    /// Two steps in one experiment share an id.
    #[error("duplicate step id `{0}`")]
    DuplicateStep(String),
}
