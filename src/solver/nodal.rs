//! Nodal analysis: node potentials via Kirchhoff's current law.
//!
//! One row of `A x = b` per node. A reference node is pinned to zero
//! potential; every other node gets either an ordinary current-law row or,
//! when a resistor-free branch constrains it, a row encoding that branch's
//! constraint. After the solve, potentials are written back onto the nodes
//! and every branch current is recovered from them.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::lu::LinearSystem;
use crate::circuit::{CircuitGraph, EdgeId, NodeId};
use crate::error::{AmpereError, Result};

/// Solve the graph in place: potentials onto nodes, currents onto edges.
pub fn solve(graph: &mut CircuitGraph) -> Result<()> {
    let n = graph.num_nodes();
    let mut system = LinearSystem::new(n);

    // Specific (resistor-free) branches split two ways. A branch whose
    // current is fixed by its own current sources contributes a constant to
    // its endpoints' current-law rows and needs nothing else. Any other
    // specific branch (a voltage source, or a bare wire) pins the potential
    // difference across it and must anchor a constraint row.
    let specific = graph.specific_edges();
    let constrained: Vec<EdgeId> = specific
        .iter()
        .copied()
        .filter(|id| !is_current_defined(graph, *id))
        .collect();
    let constrained_set: HashSet<EdgeId> = constrained.iter().copied().collect();
    let mut anchored: HashSet<EdgeId> = HashSet::new();

    // The reference node is pinned to potential zero. When a constraining
    // branch exists, one of its endpoints becomes the reference and the
    // branch itself is anchored, so the far endpoint's row can use it
    // directly. Lowest arena index wins; the choice only offsets potentials.
    let reference = match constrained.first() {
        Some(&edge_id) => {
            anchored.insert(edge_id);
            graph.edge(edge_id).direction.start
        }
        None => NodeId(0),
    };
    system.add(reference.0, reference.0, 1.0);
    graph.node_mut(reference).potential = Some(0.0);

    let mut constrained_at: HashMap<NodeId, Vec<EdgeId>> = HashMap::new();
    for &edge_id in &constrained {
        let direction = graph.edge(edge_id).direction;
        constrained_at.entry(direction.start).or_default().push(edge_id);
        constrained_at.entry(direction.end).or_default().push(edge_id);
    }

    for index in 0..n {
        let node = NodeId(index);
        if node == reference {
            continue;
        }

        // A node touching an already-anchored constraining branch takes that
        // branch's equation: its potential equals the far endpoint's plus the
        // branch's fixed voltage.
        let mut has_constraint_row = false;
        if let Some(edges) = constrained_at.get(&node) {
            for &edge_id in edges {
                if anchored.contains(&edge_id) {
                    has_constraint_row = true;
                    let (phi, c) = graph.edge(edge_id).form_phi_equation(n);
                    system.add_row(index, &phi, 1.0);
                    system.add_rhs(index, -c);
                }
            }
        }
        if has_constraint_row {
            continue;
        }

        // Ordinary current-law row. An unanchored constraining branch has no
        // conductance term; its unknown current is expressed through the rest
        // of the network by walking out from its far endpoint.
        for &(_, edge_id) in &graph.node(node).neighbors {
            let (phi, c) = if constrained_set.contains(&edge_id) {
                let far = graph.edge(edge_id).direction.other(node);
                let fragment = current_through_constrained(
                    graph,
                    far,
                    &constrained_set,
                    edge_id,
                    graph.num_edges(),
                )?;
                anchored.insert(edge_id);
                fragment
            } else {
                kcl_fragment(graph, edge_id)
            };
            let sign = if graph.edge(edge_id).direction.end == node {
                1.0
            } else {
                -1.0
            };
            system.add_row(index, &phi, sign);
            system.add_rhs(index, -sign * c);
        }
    }

    debug!(
        nodes = n,
        specific = specific.len(),
        "assembled nodal system"
    );
    let potentials = system.decompose_and_solve()?;
    for index in 0..n {
        graph.node_mut(NodeId(index)).potential = Some(potentials[index]);
    }

    recover_currents(graph, &potentials)
}

/// Whether a specific branch's current is fixed by its own sources: only
/// current sources, no voltage sources, no resistors.
fn is_current_defined(graph: &CircuitGraph, edge_id: EdgeId) -> bool {
    use crate::elements::Element;
    let edge = graph.edge(edge_id);
    edge.is_specific()
        && edge
            .elements
            .iter()
            .any(|e| matches!(e, Element::CurrentSource(_)))
        && !edge
            .elements
            .iter()
            .any(|e| matches!(e, Element::VoltageSource(_)))
}

/// A branch's contribution to a current-law row.
fn kcl_fragment(graph: &CircuitGraph, edge_id: EdgeId) -> (Vec<f64>, f64) {
    if is_current_defined(graph, edge_id) {
        // Known current: a constant injection, no conductance terms.
        (
            vec![0.0; graph.num_nodes()],
            graph.edge(edge_id).current_sum,
        )
    } else {
        graph.edge(edge_id).form_phi_equation(graph.num_nodes())
    }
}

/// Express the current through a constraining branch in terms of the rest of
/// the network: Kirchhoff's current law at `node` (the branch's far
/// endpoint), accumulated over every other incident branch and continued
/// recursively through chains of constraining branches.
///
/// The sign flips whenever the visited branch shares an orientation-defining
/// endpoint with `through`. Recursion depth is capped at the branch count: a
/// loop made entirely of resistor-free branches never terminates and is
/// physically degenerate.
fn current_through_constrained(
    graph: &CircuitGraph,
    node: NodeId,
    constrained: &HashSet<EdgeId>,
    through: EdgeId,
    depth: usize,
) -> Result<(Vec<f64>, f64)> {
    if depth == 0 {
        return Err(AmpereError::unsolvable(
            "loop of resistor-free branches has no current equation",
        ));
    }

    let n = graph.num_nodes();
    let mut phis = vec![0.0; n];
    let mut constant = 0.0;
    let through_direction = graph.edge(through).direction;

    for &(_, edge_id) in &graph.node(node).neighbors {
        if edge_id == through {
            continue;
        }
        let (phi, c) = if constrained.contains(&edge_id) {
            let far = graph.edge(edge_id).direction.other(node);
            current_through_constrained(graph, far, constrained, edge_id, depth - 1)?
        } else {
            kcl_fragment(graph, edge_id)
        };
        let direction = graph.edge(edge_id).direction;
        let sign = if direction.start == through_direction.start
            || direction.end == through_direction.end
        {
            -1.0
        } else {
            1.0
        };
        for (total, value) in phis.iter_mut().zip(phi.iter()) {
            *total += sign * value;
        }
        constant += sign * c;
    }

    Ok((phis, constant))
}

/// Derive every branch current from the solved potentials.
fn recover_currents(graph: &mut CircuitGraph, potentials: &[f64]) -> Result<()> {
    let mut in_progress = HashSet::new();
    for index in 0..graph.num_edges() {
        branch_current(graph, EdgeId(index), potentials, &mut in_progress)?;
    }
    Ok(())
}

/// Compute and store one branch's current, recursing into neighbors whose
/// currents are still unknown when the branch itself has no resistance.
fn branch_current(
    graph: &mut CircuitGraph,
    edge_id: EdgeId,
    potentials: &[f64],
    in_progress: &mut HashSet<EdgeId>,
) -> Result<()> {
    if graph.edge(edge_id).current.is_some() {
        return Ok(());
    }

    let direction = graph.edge(edge_id).direction;
    let resistance_sum = graph.edge(edge_id).resistance_sum;
    let voltage_sum = graph.edge(edge_id).voltage_sum;
    let current_sum = graph.edge(edge_id).current_sum;

    let raw = if resistance_sum != 0.0 {
        let drop = potentials[direction.start.0] - potentials[direction.end.0];
        (drop + voltage_sum) / resistance_sum + current_sum
    } else if is_current_defined(graph, edge_id) {
        current_sum
    } else {
        // No resistance and no fixed current: whatever Kirchhoff's current
        // law at the end node leaves for this branch to carry.
        if !in_progress.insert(edge_id) {
            return Err(AmpereError::unsolvable(
                "currents in a loop of resistor-free branches are not determined",
            ));
        }
        let node = direction.end;
        let neighbors = graph.node(node).neighbors.clone();
        let mut into_node = 0.0;
        for (_, other_id) in neighbors {
            if other_id == edge_id {
                continue;
            }
            branch_current(graph, other_id, potentials, in_progress)?;
            let other = graph.edge(other_id);
            let magnitude = other.current.unwrap_or(0.0);
            if other.direction.end == node {
                into_node += magnitude;
            } else {
                into_node -= magnitude;
            }
        }
        in_progress.remove(&edge_id);
        -into_node
    };

    graph.edge_mut(edge_id).store_signed_current(raw);
    Ok(())
}
