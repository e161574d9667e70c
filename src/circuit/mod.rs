//! Circuit graph representation.
//!
//! This module provides the internal representation of a circuit: an
//! arena-based graph of [`Node`]s joined by [`Edge`]s (branches), each branch
//! owning the elements placed on it together with their aggregated
//! resistance/voltage/current sums.

mod graph;
mod types;

pub use graph::{CircuitGraph, Edge, Node};
pub use types::{Direction, EdgeId, Label, NodeId};
