//! Circuit solving strategies.
//!
//! Three strategies cover every topology:
//!
//! - **Ohm's law** for a single-loop circuit: one division, no matrices.
//! - **Nodal analysis** ([`nodal`]) when the node count is smaller than the
//!   independent loop count: solve for node potentials, derive currents.
//! - **Mesh analysis** ([`mesh`]) otherwise: solve for loop currents.
//!
//! Both matrix strategies build a dense system and hand it to the same
//! no-pivot LU decomposition ([`LinearSystem`]). The dispatcher picks
//! whichever system is smaller.

pub mod lu;
pub mod mesh;
pub mod nodal;

pub use lu::LinearSystem;

use serde::Serialize;
use tracing::debug;

use crate::circuit::{CircuitGraph, Label};
use crate::elements::{total_resistance, total_voltage};
use crate::error::{AmpereError, Result};

/// A solved branch: identity, final flow direction, current magnitude.
///
/// `from`/`to` are the endpoints of the re-oriented branch direction, so the
/// current always flows `from -> to` and is never negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchCurrent {
    pub id: Label,
    pub from: Label,
    pub to: Label,
    pub current: f64,
}

/// The outcome of a solve, tagged by the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    /// Single-loop circuit: one current through the whole loop
    OhmsLaw { current: f64 },
    /// Nodal analysis: per-node potentials plus per-branch currents
    NodalAnalysis {
        node_potentials: Vec<(Label, f64)>,
        branch_currents: Vec<BranchCurrent>,
    },
    /// Mesh analysis: per-branch currents only
    MeshAnalysis { branch_currents: Vec<BranchCurrent> },
}

/// Solve a circuit with whichever strategy fits its topology.
pub fn solve(graph: &mut CircuitGraph) -> Result<Solution> {
    let independent_loops = graph.num_edges() as i64 - graph.num_nodes() as i64 + 1;

    if independent_loops == 1 {
        let current = solve_ohms_law(graph)?;
        debug!(current, "solved single-loop circuit by Ohm's law");
        return Ok(Solution::OhmsLaw { current });
    }

    if (graph.num_nodes() as i64) < independent_loops {
        debug!(
            nodes = graph.num_nodes(),
            loops = independent_loops,
            "dispatching to nodal analysis"
        );
        nodal::solve(graph)?;
        Ok(Solution::NodalAnalysis {
            node_potentials: collect_potentials(graph),
            branch_currents: collect_currents(graph),
        })
    } else {
        debug!(
            nodes = graph.num_nodes(),
            loops = independent_loops,
            "dispatching to mesh analysis"
        );
        mesh::solve(graph)?;
        Ok(Solution::MeshAnalysis {
            branch_currents: collect_currents(graph),
        })
    }
}

/// Single-loop shortcut: total source voltage over total resistance, raw
/// element values.
fn solve_ohms_law(graph: &CircuitGraph) -> Result<f64> {
    let resistance = total_resistance(graph.all_elements());
    if resistance == 0.0 {
        return Err(AmpereError::unsolvable(
            "single-loop circuit has no resistance",
        ));
    }
    Ok(total_voltage(graph.all_elements()) / resistance)
}

fn collect_potentials(graph: &CircuitGraph) -> Vec<(Label, f64)> {
    graph
        .node_ids()
        .map(|id| {
            let node = graph.node(id);
            (node.label.clone(), node.potential.unwrap_or(0.0))
        })
        .collect()
}

fn collect_currents(graph: &CircuitGraph) -> Vec<BranchCurrent> {
    graph
        .edge_ids()
        .map(|id| {
            let edge = graph.edge(id);
            BranchCurrent {
                id: edge.label.clone(),
                from: graph.node(edge.direction.start).label.clone(),
                to: graph.node(edge.direction.end).label.clone(),
                current: edge.current.unwrap_or(0.0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Direction, EdgeId, NodeId};
    use crate::elements::Element;
    use approx::assert_relative_eq;

    fn label(s: &str) -> Label {
        Label::from(s)
    }

    /// Two-node, three-branch circuit: 10 ohm + 5V branch with two 10 ohm
    /// return paths.
    fn parallel_circuit() -> CircuitGraph {
        let mut graph = CircuitGraph::new();
        graph.add_node(label("A")).unwrap();
        graph.add_node(label("B")).unwrap();
        let a = graph.find_node(&label("A")).unwrap();
        let b = graph.find_node(&label("B")).unwrap();
        graph
            .add_edge(
                label("e1"),
                &label("A"),
                &label("B"),
                vec![
                    Element::resistor(10.0),
                    Element::voltage_source(5.0, Some(Direction::new(a, b))),
                ],
            )
            .unwrap();
        graph
            .add_edge(label("e2"), &label("A"), &label("B"), vec![Element::resistor(10.0)])
            .unwrap();
        graph
            .add_edge(label("e3"), &label("A"), &label("B"), vec![Element::resistor(10.0)])
            .unwrap();
        graph
    }

    /// Five-branch bridge over four nodes, one source.
    fn bridge_circuit() -> CircuitGraph {
        let mut graph = CircuitGraph::new();
        for name in ["A", "B", "C", "D"] {
            graph.add_node(label(name)).unwrap();
        }
        let a = graph.find_node(&label("A")).unwrap();
        let b = graph.find_node(&label("B")).unwrap();
        graph
            .add_edge(
                label("ab"),
                &label("A"),
                &label("B"),
                vec![
                    Element::resistor(1.0),
                    Element::voltage_source(10.0, Some(Direction::new(a, b))),
                ],
            )
            .unwrap();
        graph
            .add_edge(label("ac"), &label("A"), &label("C"), vec![Element::resistor(2.0)])
            .unwrap();
        graph
            .add_edge(label("bc"), &label("B"), &label("C"), vec![Element::resistor(3.0)])
            .unwrap();
        graph
            .add_edge(label("bd"), &label("B"), &label("D"), vec![Element::resistor(4.0)])
            .unwrap();
        graph
            .add_edge(label("cd"), &label("C"), &label("D"), vec![Element::resistor(5.0)])
            .unwrap();
        graph
    }

    /// Resistor triangle with a source on one edge.
    fn triangle_circuit() -> CircuitGraph {
        let mut graph = CircuitGraph::new();
        for name in ["A", "B", "C"] {
            graph.add_node(label(name)).unwrap();
        }
        let a = graph.find_node(&label("A")).unwrap();
        let b = graph.find_node(&label("B")).unwrap();
        graph
            .add_edge(
                label("ab"),
                &label("A"),
                &label("B"),
                vec![
                    Element::resistor(10.0),
                    Element::voltage_source(6.0, Some(Direction::new(a, b))),
                ],
            )
            .unwrap();
        graph
            .add_edge(label("bc"), &label("B"), &label("C"), vec![Element::resistor(20.0)])
            .unwrap();
        graph
            .add_edge(label("ca"), &label("C"), &label("A"), vec![Element::resistor(30.0)])
            .unwrap();
        graph
    }

    /// Signed current of a branch along a fixed reference direction.
    fn current_along(graph: &CircuitGraph, edge: EdgeId, direction: Direction) -> f64 {
        let solved = graph.edge(edge);
        let current = solved.current.unwrap_or(0.0);
        if solved.direction == direction {
            current
        } else {
            -current
        }
    }

    #[test]
    fn test_ohms_law_for_flat_description() {
        // One voltage source, one resistor: 5V / 10 ohms = 0.5 A
        let mut graph = CircuitGraph::from_elements(vec![
            Element::resistor(10.0),
            Element::voltage_source(5.0, None),
        ]);
        match solve(&mut graph).unwrap() {
            Solution::OhmsLaw { current } => assert_relative_eq!(current, 0.5),
            other => panic!("expected Ohm's law solution, got {:?}", other),
        }
    }

    #[test]
    fn test_ohms_law_for_single_loop_topology() {
        // Two branches between two nodes form exactly one loop
        let mut graph = CircuitGraph::new();
        graph.add_node(label("A")).unwrap();
        graph.add_node(label("B")).unwrap();
        let a = graph.find_node(&label("A")).unwrap();
        let b = graph.find_node(&label("B")).unwrap();
        graph
            .add_edge(
                label("e1"),
                &label("A"),
                &label("B"),
                vec![
                    Element::resistor(10.0),
                    Element::voltage_source(5.0, Some(Direction::new(a, b))),
                ],
            )
            .unwrap();
        graph
            .add_edge(label("e2"), &label("A"), &label("B"), vec![Element::resistor(10.0)])
            .unwrap();

        match solve(&mut graph).unwrap() {
            Solution::OhmsLaw { current } => assert_relative_eq!(current, 0.25),
            other => panic!("expected Ohm's law solution, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_resistance_single_loop_is_unsolvable() {
        let mut graph =
            CircuitGraph::from_elements(vec![Element::voltage_source(5.0, None)]);
        let err = solve(&mut graph).unwrap_err();
        assert!(matches!(err, AmpereError::UnsolvableCircuit { .. }));
    }

    #[test]
    fn test_dispatch_prefers_smaller_system() {
        // 3 branches, 2 nodes: 2 loops, nodes not smaller -> mesh analysis
        let mut graph = parallel_circuit();
        let solution = solve(&mut graph).unwrap();
        assert!(matches!(solution, Solution::MeshAnalysis { .. }));

        // 4 branches, 2 nodes: 3 loops, 2 < 3 -> nodal analysis
        let mut graph = parallel_circuit();
        graph
            .add_edge(label("e4"), &label("A"), &label("B"), vec![Element::resistor(10.0)])
            .unwrap();
        let solution = solve(&mut graph).unwrap();
        match solution {
            Solution::NodalAnalysis {
                node_potentials, ..
            } => {
                assert_eq!(node_potentials.len(), 2);
                assert_eq!(node_potentials[0].0, label("A"));
            }
            other => panic!("expected nodal analysis, got {:?}", other),
        }
    }

    #[test]
    fn test_nodal_and_mesh_agree() {
        // Cross-validation: both engines must produce the same branch
        // currents for the same circuit, flow direction included.
        for build in [parallel_circuit, triangle_circuit, bridge_circuit] {
            let mut by_nodal = build();
            let mut by_mesh = build();
            nodal::solve(&mut by_nodal).unwrap();
            mesh::solve(&mut by_mesh).unwrap();

            for index in 0..by_nodal.num_edges() {
                let edge_id = EdgeId(index);
                let reference = by_nodal.edge(edge_id).direction;
                assert_relative_eq!(
                    current_along(&by_nodal, edge_id, reference),
                    current_along(&by_mesh, edge_id, reference),
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_conservation_at_every_node() {
        let mut graph = bridge_circuit();
        mesh::solve(&mut graph).unwrap();

        for index in 0..graph.num_nodes() {
            let node = NodeId(index);
            let mut sum = 0.0;
            for &(_, edge_id) in &graph.node(node).neighbors {
                let edge = graph.edge(edge_id);
                let current = edge.current.unwrap_or(0.0);
                if edge.direction.end == node {
                    sum += current;
                } else {
                    sum -= current;
                }
            }
            assert_relative_eq!(sum, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_result_reports_flipped_directions() {
        let mut graph = parallel_circuit();
        let solution = solve(&mut graph).unwrap();
        let currents = match solution {
            Solution::MeshAnalysis { branch_currents } => branch_currents,
            other => panic!("expected mesh analysis, got {:?}", other),
        };

        // The source branch flows A -> B, the return paths B -> A
        assert_eq!(currents[0].from, label("A"));
        assert_eq!(currents[0].to, label("B"));
        assert_eq!(currents[1].from, label("B"));
        assert_eq!(currents[1].to, label("A"));
        assert!(currents.iter().all(|c| c.current >= 0.0));
    }
}
