//! Core types for circuit representation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique identifier for a node in the circuit.
///
/// Doubles as the node's row/column index in the nodal system matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// A unique identifier for an edge (branch) in the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Caller-assigned identity of a node or branch.
///
/// Wire payloads use either integers or strings for ids; both are preserved
/// verbatim and echoed back unchanged in the solution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    /// Numeric identity, as sent by graphical front ends
    Integer(i64),
    /// Named identity
    Text(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Integer(n) => write!(f, "{}", n),
            Label::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Label {
    fn from(n: i64) -> Self {
        Label::Integer(n)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Text(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::Text(s)
    }
}

/// An ordered node pair defining a reference polarity.
///
/// A branch whose `current_direction` is `start -> end` carries positive
/// current when it flows from `start` to `end`; the same convention gives
/// each source its sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction {
    pub start: NodeId,
    pub end: NodeId,
}

impl Direction {
    /// Create a direction from `start` to `end`.
    pub fn new(start: NodeId, end: NodeId) -> Self {
        Self { start, end }
    }

    /// The same pair with the polarity inverted.
    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }

    /// The endpoint opposite to `node`.
    ///
    /// Callers must pass one of the two endpoints.
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.start == node {
            self.end
        } else {
            self.start
        }
    }
}
