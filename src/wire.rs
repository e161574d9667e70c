//! Wire representation: circuit descriptions in, solution payloads out.
//!
//! The boundary layer (whatever transport carries the JSON) deserializes a
//! [`CircuitDescription`], hands it to [`solve_description`], and serializes
//! the [`SolutionResult`] back. Nothing here persists between requests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::circuit::{CircuitGraph, Direction, Label};
use crate::elements::Element;
use crate::error::{AmpereError, Result};
use crate::solver::{self, BranchCurrent, Solution};

/// A circuit as submitted by a client.
///
/// Either a full topology (nodes plus branches), or - for the single-loop
/// Ohm's-law shortcut - a flat element list with no topology at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CircuitDescription {
    /// Nodes and the branches connecting them
    Graph {
        nodes: Vec<Label>,
        edges: Vec<EdgeDescription>,
    },
    /// A bare element list forming one implied loop
    Elements { elements: Vec<ElementDescription> },
}

/// One branch of the submitted topology.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeDescription {
    pub id: Label,
    pub from: Label,
    pub to: Label,
    pub elements: Vec<ElementDescription>,
}

/// One element of a branch (or of the flat list).
///
/// A resistor never carries a direction; sources placed on a branch must
/// carry one.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementDescription {
    Resistor {
        value: f64,
    },
    VoltageSource {
        value: f64,
        direction: Option<DirectionDescription>,
    },
    CurrentSource {
        value: f64,
        direction: Option<DirectionDescription>,
    },
}

/// A source polarity, by node label.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionDescription {
    pub from: Label,
    pub to: Label,
}

/// The solved circuit, tagged by the strategy that produced it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method")]
pub enum SolutionResult {
    #[serde(rename = "Ohm's law")]
    OhmsLaw { current: f64 },
    #[serde(rename = "modified nodal analysis")]
    NodalAnalysis {
        node_potentials: BTreeMap<String, f64>,
        branch_currents: Vec<BranchCurrent>,
    },
    #[serde(rename = "mesh current analysis")]
    MeshAnalysis { branch_currents: Vec<BranchCurrent> },
}

impl From<Solution> for SolutionResult {
    fn from(solution: Solution) -> Self {
        match solution {
            Solution::OhmsLaw { current } => SolutionResult::OhmsLaw { current },
            Solution::NodalAnalysis {
                node_potentials,
                branch_currents,
            } => SolutionResult::NodalAnalysis {
                node_potentials: node_potentials
                    .into_iter()
                    .map(|(label, potential)| (label.to_string(), potential))
                    .collect(),
                branch_currents,
            },
            Solution::MeshAnalysis { branch_currents } => {
                SolutionResult::MeshAnalysis { branch_currents }
            }
        }
    }
}

/// Build a circuit graph from a description.
pub fn build_graph(description: &CircuitDescription) -> Result<CircuitGraph> {
    match description {
        CircuitDescription::Elements { elements } => {
            let elements = elements.iter().map(free_element).collect();
            Ok(CircuitGraph::from_elements(elements))
        }
        CircuitDescription::Graph { nodes, edges } => {
            let mut graph = CircuitGraph::new();
            for label in nodes {
                graph.add_node(label.clone())?;
            }
            for edge in edges {
                let elements = edge
                    .elements
                    .iter()
                    .map(|element| resolve_element(&graph, element))
                    .collect::<Result<Vec<_>>>()?;
                graph.add_edge(edge.id.clone(), &edge.from, &edge.to, elements)?;
            }
            Ok(graph)
        }
    }
}

/// Build the graph and solve it.
pub fn solve_description(description: &CircuitDescription) -> Result<SolutionResult> {
    let mut graph = build_graph(description)?;
    let solution = solver::solve(&mut graph)?;
    Ok(solution.into())
}

/// JSON string in, JSON string out. Convenience for boundary layers.
pub fn solve_json(input: &str) -> Result<String> {
    let description: CircuitDescription = serde_json::from_str(input)?;
    let result = solve_description(&description)?;
    Ok(serde_json::to_string(&result)?)
}

/// Element of the flat form: no topology, so polarities stay unresolved.
fn free_element(description: &ElementDescription) -> Element {
    match description {
        ElementDescription::Resistor { value } => Element::resistor(*value),
        ElementDescription::VoltageSource { value, .. } => Element::voltage_source(*value, None),
        ElementDescription::CurrentSource { value, .. } => Element::current_source(*value, None),
    }
}

/// Element of the graph form: polarities resolve to node ids.
fn resolve_element(graph: &CircuitGraph, description: &ElementDescription) -> Result<Element> {
    match description {
        ElementDescription::Resistor { value } => Ok(Element::resistor(*value)),
        ElementDescription::VoltageSource { value, direction } => {
            let polarity = direction
                .as_ref()
                .map(|d| resolve_direction(graph, d))
                .transpose()?;
            Ok(Element::voltage_source(*value, polarity))
        }
        ElementDescription::CurrentSource { value, direction } => {
            let polarity = direction
                .as_ref()
                .map(|d| resolve_direction(graph, d))
                .transpose()?;
            Ok(Element::current_source(*value, polarity))
        }
    }
}

fn resolve_direction(graph: &CircuitGraph, description: &DirectionDescription) -> Result<Direction> {
    let start = graph
        .find_node(&description.from)
        .ok_or_else(|| AmpereError::NodeNotFound {
            label: description.from.clone(),
        })?;
    let end = graph
        .find_node(&description.to)
        .ok_or_else(|| AmpereError::NodeNotFound {
            label: description.to.clone(),
        })?;
    Ok(Direction::new(start, end))
}
