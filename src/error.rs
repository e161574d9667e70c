//! Error types for the Ampere circuit solver.
//!
//! This module provides a unified error type [`AmpereError`] that covers
//! all error conditions that can occur during circuit construction and
//! solving.

use thiserror::Error;

use crate::circuit::Label;

/// Result type alias using [`AmpereError`].
pub type Result<T> = std::result::Result<T, AmpereError>;

/// Unified error type for all Ampere operations.
#[derive(Error, Debug)]
pub enum AmpereError {
    // ============ Topology Errors ============
    /// Duplicate node label in the circuit description
    #[error("node \"{label}\" is already in the circuit graph")]
    DuplicateNode { label: Label },

    /// Edge endpoint referencing an unknown node
    #[error("node \"{label}\" is not a node of the graph")]
    NodeNotFound { label: Label },

    /// A source element on a branch was given without a reference polarity
    #[error("{kind} on branch \"{edge}\" requires a direction")]
    MissingDirection { kind: &'static str, edge: Label },

    // ============ Solving Errors ============
    /// A pivot vanished during LU decomposition
    #[error("singular system - circuit has no unique solution")]
    SingularSystem,

    /// The circuit is structurally degenerate
    #[error("unsolvable circuit: {message}")]
    UnsolvableCircuit { message: String },

    // ============ Boundary Errors ============
    /// Malformed wire payload
    #[error("invalid circuit description: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reading a circuit file (CLI only)
    #[error("failed to read circuit file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AmpereError {
    /// Create an unsolvable-circuit error.
    pub fn unsolvable(message: impl Into<String>) -> Self {
        Self::UnsolvableCircuit {
            message: message.into(),
        }
    }
}
