use crate::foundation::error::{GraphIntegrityReport, GraphViolation, RegError, RegResult};
use crate::graph::builder::TransformGraph;
use crate::rules::model::RuleBehavior;

/// Gate a freshly built graph before any pixel is processed.
///
/// Checks every structural invariant and aggregates all violations into one
/// [`GraphIntegrityReport`], in lexicographic vertex order, so a user sees
/// every offending slice of a misconfigured rule set at once:
///
/// 1. in-degree of every vertex is at most 1 (a second incoming edge is a
///    conflicting transformation source, never a silent merge),
/// 2. every `UseTransformation` vertex has its single input edge attached,
/// 3. the graph is acyclic.
pub fn validate_graph(graph: &TransformGraph) -> RegResult<()> {
    let mut violations = Vec::new();

    for node in graph.node_indices() {
        let vertex = graph.vertex(node);
        let in_degree = graph.in_degree(node);
        if in_degree > 1 {
            violations.push(GraphViolation::ConflictingSource(vertex.index));
        }
        if vertex.rule.behavior == RuleBehavior::UseTransformation && in_degree == 0 {
            violations.push(GraphViolation::UnresolvedInput(vertex.index));
        }
    }

    if let Err(cycle) = petgraph::algo::toposort(graph.petgraph(), None) {
        violations.push(GraphViolation::Cycle(graph.vertex(cycle.node_id()).index));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(RegError::GraphIntegrity(GraphIntegrityReport { violations }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/validate.rs"]
mod tests;
