use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::graph::NodeIndex;

use crate::foundation::error::{GraphIntegrityReport, GraphViolation, RegError, RegResult};
use crate::graph::builder::TransformGraph;

/// Produce a total execution order consistent with the dependency edges.
///
/// Kahn's algorithm with a min-heap ready set: since vertices are inserted
/// in lexicographic `(channel, depth, time)` order, draining the smallest
/// node handle first yields the lexicographic tie-break among independent
/// vertices, keeping the schedule (and thus the transform log) byte-identical
/// across runs.
pub fn topological_order(graph: &TransformGraph) -> RegResult<Vec<NodeIndex>> {
    let mut in_degree: Vec<usize> = graph.node_indices().map(|n| graph.in_degree(n)).collect();

    let mut ready: BinaryHeap<Reverse<NodeIndex>> = graph
        .node_indices()
        .filter(|n| in_degree[n.index()] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(graph.vertex_count());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for succ in graph.successors(node) {
            in_degree[succ.index()] -= 1;
            if in_degree[succ.index()] == 0 {
                ready.push(Reverse(succ));
            }
        }
    }

    if order.len() != graph.vertex_count() {
        // Unreachable after validation; reported as a cycle all the same.
        let stuck = graph
            .node_indices()
            .find(|n| in_degree[n.index()] > 0)
            .map(|n| graph.vertex(n).index)
            .unwrap_or_default();
        return Err(RegError::GraphIntegrity(GraphIntegrityReport {
            violations: vec![GraphViolation::Cycle(stuck)],
        }));
    }
    Ok(order)
}

#[cfg(test)]
#[path = "../../tests/unit/graph/topo.rs"]
mod tests;
