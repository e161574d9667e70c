//! Mesh current analysis: loop currents via Kirchhoff's voltage law.
//!
//! A maximum spanning tree (by branch weight, so resistor-free branches are
//! pulled into the tree first and stay out of the loops whenever the
//! structure permits) yields one independent loop per remaining chord. The
//! mesh system solves for one circulating current per loop; branch currents
//! are the signed sums of the loop currents passing through them.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::debug;

use super::lu::LinearSystem;
use crate::circuit::{CircuitGraph, EdgeId, NodeId};
use crate::elements::Element;
use crate::error::Result;

/// One step of a loop traversal: the branch taken and the node it arrives at.
type LoopStep = (NodeId, EdgeId);

/// Frontier entry for the greedy tree growth. Highest weight wins; ties go
/// to the lowest edge id so tree construction is reproducible.
#[derive(Debug, Clone, Copy)]
struct FrontierEdge {
    weight: f64,
    edge: EdgeId,
}

impl PartialEq for FrontierEdge {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEdge {}

impl PartialOrd for FrontierEdge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEdge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| other.edge.cmp(&self.edge))
    }
}

/// Solve the graph in place: currents onto edges (potentials stay unset).
pub fn solve(graph: &mut CircuitGraph) -> Result<()> {
    let loops = independent_loops(graph);
    debug!(loops = loops.len(), "derived independent loops");

    let mut system = assemble(graph, &loops);
    let loop_currents = system.decompose_and_solve()?;
    apply_loop_currents(graph, &loops, &loop_currents);
    Ok(())
}

/// Grow a maximum spanning tree from the first node, best frontier branch
/// first.
fn maximum_spanning_tree(graph: &CircuitGraph) -> HashSet<EdgeId> {
    let mut tree = HashSet::new();
    if graph.num_nodes() == 0 {
        return tree;
    }

    let start = NodeId(0);
    let mut used: HashSet<NodeId> = HashSet::new();
    used.insert(start);
    let mut frontier = BinaryHeap::new();
    for &(_, edge_id) in &graph.node(start).neighbors {
        frontier.push(FrontierEdge {
            weight: graph.edge(edge_id).weight,
            edge: edge_id,
        });
    }

    while let Some(FrontierEdge { edge: edge_id, .. }) = frontier.pop() {
        let direction = graph.edge(edge_id).direction;
        let to = if used.contains(&direction.start) {
            direction.end
        } else {
            direction.start
        };

        if used.insert(to) {
            tree.insert(edge_id);
            for &(neighbor, next_edge) in &graph.node(to).neighbors {
                if !used.contains(&neighbor) {
                    frontier.push(FrontierEdge {
                        weight: graph.edge(next_edge).weight,
                        edge: next_edge,
                    });
                }
            }
        }
    }

    tree
}

/// The unique tree path between two nodes, as (arrival node, branch) steps.
fn path_in_tree(
    graph: &CircuitGraph,
    from: NodeId,
    to: NodeId,
    tree: &HashSet<EdgeId>,
) -> Option<Vec<LoopStep>> {
    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(from);
    dfs(graph, from, to, tree, &mut visited)
}

fn dfs(
    graph: &CircuitGraph,
    current: NodeId,
    target: NodeId,
    tree: &HashSet<EdgeId>,
    visited: &mut HashSet<NodeId>,
) -> Option<Vec<LoopStep>> {
    if current == target {
        return Some(Vec::new());
    }
    for &(child, edge_id) in &graph.node(current).neighbors {
        if tree.contains(&edge_id) && visited.insert(child) {
            if let Some(mut path) = dfs(graph, child, target, tree, visited) {
                path.insert(0, (child, edge_id));
                return Some(path);
            }
        }
    }
    None
}

/// One loop per non-tree chord: the tree path between the chord's endpoints,
/// closed by the chord itself.
fn independent_loops(graph: &CircuitGraph) -> Vec<Vec<LoopStep>> {
    let tree = maximum_spanning_tree(graph);
    let mut seen: HashSet<EdgeId> = HashSet::new();
    let mut loops = Vec::new();

    for index in 0..graph.num_nodes() {
        let node = NodeId(index);
        for &(child, edge_id) in &graph.node(node).neighbors {
            if !tree.contains(&edge_id) && seen.insert(edge_id) {
                if let Some(mut path) = path_in_tree(graph, node, child, &tree) {
                    path.push((node, edge_id));
                    loops.push(path);
                }
            }
        }
    }

    loops
}

/// Build the mesh system: loop resistances on the diagonal, signed shared
/// resistances off it, signed voltage-source sums on the right-hand side.
fn assemble(graph: &CircuitGraph, loops: &[Vec<LoopStep>]) -> LinearSystem {
    let mut system = LinearSystem::new(loops.len());

    // Arrival node of each branch, per loop: two loops traverse a shared
    // branch in the same orientation iff they arrive at the same node.
    let arrivals: Vec<HashMap<EdgeId, NodeId>> = loops
        .iter()
        .map(|steps| steps.iter().map(|&(node, edge)| (edge, node)).collect())
        .collect();

    for (i, steps) in loops.iter().enumerate() {
        for &(arrival, edge_id) in steps {
            let edge = graph.edge(edge_id);
            system.add(i, i, edge.resistance_sum);

            for element in &edge.elements {
                if let Element::VoltageSource(source) = element {
                    let sign = match source.polarity {
                        Some(polarity) if polarity.end == arrival => 1.0,
                        _ => -1.0,
                    };
                    system.add_rhs(i, sign * source.voltage);
                }
            }
        }

        for j in 0..i {
            for (&edge_id, &arrival_i) in &arrivals[i] {
                if let Some(&arrival_j) = arrivals[j].get(&edge_id) {
                    let orientation = if arrival_i == arrival_j { 1.0 } else { -1.0 };
                    let shared = orientation * graph.edge(edge_id).resistance_sum;
                    system.add(i, j, shared);
                    system.add(j, i, shared);
                }
            }
        }
    }

    system
}

/// Sum each branch's signed loop currents and store the result.
fn apply_loop_currents(graph: &mut CircuitGraph, loops: &[Vec<LoopStep>], currents: &[f64]) {
    let mut totals: HashMap<EdgeId, f64> = HashMap::new();
    for (steps, current) in loops.iter().zip(currents) {
        for &(arrival, edge_id) in steps {
            let sign = if graph.edge(edge_id).direction.end == arrival {
                1.0
            } else {
                -1.0
            };
            *totals.entry(edge_id).or_insert(0.0) += sign * current;
        }
    }

    for index in 0..graph.num_edges() {
        let edge_id = EdgeId(index);
        let total = totals.get(&edge_id).copied().unwrap_or(0.0);
        graph.edge_mut(edge_id).store_signed_current(total);
    }
}
