//! Circuit graph structure.
//!
//! Nodes and edges live in arenas owned by [`CircuitGraph`] and reference
//! each other through [`NodeId`]/[`EdgeId`] indices, so the mutual
//! node/branch adjacency never forms an ownership cycle. A graph is built
//! once per solve request, mutated in place while solving (potentials,
//! currents, re-oriented branch directions), and then discarded.

use std::collections::HashMap;

use super::types::{Direction, EdgeId, Label, NodeId};
use crate::elements::{sum_contributions, Element};
use crate::error::{AmpereError, Result};

/// An electrical junction.
#[derive(Debug, Clone)]
pub struct Node {
    /// Caller-assigned identity
    pub label: Label,
    /// Adjacent (node, branch) pairs, in insertion order
    pub neighbors: Vec<(NodeId, EdgeId)>,
    /// Potential in volts, set by a nodal-analysis solve
    pub potential: Option<f64>,
}

/// A branch between two nodes, carrying its elements in series.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Caller-assigned identity
    pub label: Label,
    /// Reference polarity for the branch current. Re-oriented after solving
    /// so it always points the way current actually flows.
    pub direction: Direction,
    /// Elements placed on this branch
    pub elements: Vec<Element>,
    /// Sum of all resistor values on the branch
    pub resistance_sum: f64,
    /// Signed sum of voltage source values, relative to `direction`
    pub voltage_sum: f64,
    /// Signed sum of current source values, relative to `direction`
    pub current_sum: f64,
    /// Spanning-tree weight: 1/resistance_sum, or +inf for a zero sum
    pub weight: f64,
    /// Current magnitude in amperes, set by a solve (never negative)
    pub current: Option<f64>,
}

impl Edge {
    fn new(label: Label, direction: Direction, elements: Vec<Element>) -> Self {
        let sums = sum_contributions(&elements, direction);
        let weight = if sums.resistance != 0.0 {
            1.0 / sums.resistance
        } else {
            f64::INFINITY
        };
        Self {
            label,
            direction,
            elements,
            resistance_sum: sums.resistance,
            voltage_sum: sums.voltage,
            current_sum: sums.current,
            weight,
            current: None,
        }
    }

    /// Whether this branch is specific (degenerate): no resistor element at
    /// all, so its conductance is undefined and it must be handled as a
    /// constraint instead of an ordinary Kirchhoff term.
    pub fn is_specific(&self) -> bool {
        !self.elements.iter().any(Element::is_resistor)
    }

    /// The branch's Kirchhoff-current-law contribution as a row fragment.
    ///
    /// Returns `(phi, c)` where `phi` is a length-`n` vector with
    /// `+1/R` at the direction start index and `-1/R` at the end index, and
    /// `c = voltage_sum/R + current_sum`. A specific branch has its
    /// resistance treated as 1 to keep the division defined; its real
    /// contribution is overridden by the constraint row.
    pub fn form_phi_equation(&self, n: usize) -> (Vec<f64>, f64) {
        let mut phi = vec![0.0; n];
        let denominator = if self.resistance_sum == 0.0 {
            1.0
        } else {
            self.resistance_sum
        };
        phi[self.direction.start.0] += 1.0 / denominator;
        phi[self.direction.end.0] -= 1.0 / denominator;
        let c = self.voltage_sum / denominator + self.current_sum;
        (phi, c)
    }

    /// Store a signed solved current: magnitude into `current`, sign into
    /// the branch direction (flipped when negative).
    pub fn store_signed_current(&mut self, value: f64) {
        if value < 0.0 {
            self.direction = self.direction.reversed();
        }
        self.current = Some(value.abs());
    }
}

/// A passive linear circuit as a graph of nodes and branches.
///
/// Connectivity is a construction contract: callers must not submit
/// disconnected graphs.
#[derive(Debug, Clone, Default)]
pub struct CircuitGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_map: HashMap<Label, NodeId>,
    /// Elements of the topology-free single-loop form
    flat_elements: Vec<Element>,
}

impl CircuitGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a topology-free circuit from a flat element list.
    ///
    /// Such a circuit is a single implied loop and is only solvable via
    /// Ohm's law.
    pub fn from_elements(elements: Vec<Element>) -> Self {
        Self {
            flat_elements: elements,
            ..Self::default()
        }
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges (branches).
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Add a node. Fails on a duplicate label.
    pub fn add_node(&mut self, label: Label) -> Result<NodeId> {
        if self.node_map.contains_key(&label) {
            return Err(AmpereError::DuplicateNode { label });
        }
        let id = NodeId(self.nodes.len());
        self.node_map.insert(label.clone(), id);
        self.nodes.push(Node {
            label,
            neighbors: Vec::new(),
            potential: None,
        });
        Ok(id)
    }

    /// Add a branch between two existing nodes.
    ///
    /// The branch direction runs `from -> to`. Fails if either endpoint is
    /// unknown or if a source element carries no polarity.
    pub fn add_edge(
        &mut self,
        label: Label,
        from: &Label,
        to: &Label,
        elements: Vec<Element>,
    ) -> Result<EdgeId> {
        let start = self.find_node(from).ok_or_else(|| AmpereError::NodeNotFound {
            label: from.clone(),
        })?;
        let end = self.find_node(to).ok_or_else(|| AmpereError::NodeNotFound {
            label: to.clone(),
        })?;

        for element in &elements {
            let needs_polarity = !element.is_resistor();
            if needs_polarity && element.polarity().is_none() {
                return Err(AmpereError::MissingDirection {
                    kind: element.kind(),
                    edge: label,
                });
            }
        }

        let id = EdgeId(self.edges.len());
        self.edges
            .push(Edge::new(label, Direction::new(start, end), elements));
        self.nodes[start.0].neighbors.push((end, id));
        self.nodes[end.0].neighbors.push((start, id));
        Ok(id)
    }

    /// Look up a node id by label.
    pub fn find_node(&self, label: &Label) -> Option<NodeId> {
        self.node_map.get(label).copied()
    }

    /// Access a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Mutable access to a node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Access an edge.
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    /// Mutable access to an edge.
    pub fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.0]
    }

    /// All node ids, in insertion (= matrix index) order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// All edge ids, in insertion order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len()).map(EdgeId)
    }

    /// Every branch with no resistor element, in insertion order.
    ///
    /// Each branch is visited exactly once however many nodes reference it.
    pub fn specific_edges(&self) -> Vec<EdgeId> {
        self.edge_ids()
            .filter(|id| self.edge(*id).is_specific())
            .collect()
    }

    /// Every element in the circuit: the flat list for the topology-free
    /// form, the branch-owned elements otherwise.
    pub fn all_elements(&self) -> impl Iterator<Item = &Element> {
        self.flat_elements
            .iter()
            .chain(self.edges.iter().flat_map(|e| e.elements.iter()))
    }
}
