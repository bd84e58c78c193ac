use std::collections::BTreeMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::align::aligner::TransformResult;
use crate::expr::context::VariableContext;
use crate::expr::evaluator::Evaluator;
use crate::foundation::core::{CancellationToken, SliceIndex, StackDims};
use crate::foundation::error::{RegError, RegResult};
use crate::rules::matcher::match_rule;
use crate::rules::model::{Rule, RuleBehavior};

/// Per-slice unit of work in the dependency graph.
///
/// `transform` starts empty and is written exactly once, by whichever
/// executor branch processes the vertex.
#[derive(Clone, Debug)]
pub struct TransformVertex {
    /// The slice this vertex stands for.
    pub index: SliceIndex,
    /// The rule matched for the slice.
    pub rule: Rule,
    /// Transform computed for (or propagated to) this vertex.
    pub transform: Option<TransformResult>,
}

/// Dependency graph over the full slice universe of one registration run.
///
/// One vertex exists per `(channel, depth, time)` position of the input
/// stack; edges run from a transformation source to the vertex reusing it.
/// Vertices are inserted in lexicographic index order, so iteration over
/// node indices is deterministic.
#[derive(Debug, Default)]
pub struct TransformGraph {
    graph: DiGraph<TransformVertex, ()>,
    lookup: BTreeMap<SliceIndex, NodeIndex>,
}

impl TransformGraph {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node handle of the vertex for `index`, if it exists.
    pub fn node_at(&self, index: SliceIndex) -> Option<NodeIndex> {
        self.lookup.get(&index).copied()
    }

    /// The vertex behind a node handle.
    pub fn vertex(&self, node: NodeIndex) -> &TransformVertex {
        &self.graph[node]
    }

    pub(crate) fn vertex_mut(&mut self, node: NodeIndex) -> &mut TransformVertex {
        &mut self.graph[node]
    }

    /// All node handles in lexicographic slice-index order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Number of incoming dependency edges of a vertex.
    pub fn in_degree(&self, node: NodeIndex) -> usize {
        self.graph
            .neighbors_directed(node, Direction::Incoming)
            .count()
    }

    /// The single predecessor of a vertex, if any.
    pub fn predecessor(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(node, Direction::Incoming)
            .next()
    }

    /// Successors of a vertex.
    pub fn successors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(node, Direction::Outgoing)
    }

    pub(crate) fn petgraph(&self) -> &DiGraph<TransformVertex, ()> {
        &self.graph
    }

    pub(crate) fn add_vertex(&mut self, index: SliceIndex, rule: Rule) -> NodeIndex {
        let node = self.graph.add_node(TransformVertex {
            index,
            rule,
            transform: None,
        });
        self.lookup.insert(index, node);
        node
    }

    pub(crate) fn add_edge(&mut self, source: NodeIndex, dependent: NodeIndex) {
        self.graph.add_edge(source, dependent, ());
    }
}

/// Build the dependency graph for one registration run.
///
/// First pass: create one vertex per slice of `dims`, matching its rule
/// against a context seeded with that slice's coordinates. Second pass: for
/// every `UseTransformation` vertex, resolve the rule's reference formulas
/// (again against the vertex's own context, so formulas may be relative) and
/// attach the edge `referenced -> vertex`. A reference that resolves to a
/// missing slice or to the vertex itself fails with
/// [`RegError::UnresolvedReference`].
pub fn build_transform_graph(
    dims: StackDims,
    rules: &[Rule],
    ctx: &VariableContext,
    evaluator: &dyn Evaluator,
    cancel: &CancellationToken,
) -> RegResult<TransformGraph> {
    let mut out = TransformGraph::default();

    for index in dims.iter() {
        let slice_ctx = ctx.for_slice(index);
        let rule = match_rule(rules, &slice_ctx, evaluator)?;
        out.add_vertex(index, rule);
    }

    cancel.check()?;

    for node in out.graph.node_indices().collect::<Vec<_>>() {
        let vertex = &out.graph[node];
        if vertex.rule.behavior != RuleBehavior::UseTransformation {
            continue;
        }
        let index = vertex.index;
        let slice_ctx = ctx.for_slice(index);
        let raw = vertex.rule.raw_reference(&slice_ctx, evaluator)?;
        let referenced = resolve_exact(&out, raw)
            .filter(|&n| n != node)
            .ok_or(RegError::UnresolvedReference {
                at: index,
                referenced: raw,
            })?;
        out.add_edge(referenced, node);
    }

    cancel.check()?;

    tracing::debug!(
        vertices = out.vertex_count(),
        edges = out.edge_count(),
        "built transformation graph"
    );
    Ok(out)
}

/// Map raw reference coordinates onto an existing vertex, without clamping.
fn resolve_exact(graph: &TransformGraph, raw: (i64, i64, i64)) -> Option<NodeIndex> {
    let (c, z, t) = raw;
    let c = u32::try_from(c).ok()?;
    let z = u32::try_from(z).ok()?;
    let t = u32::try_from(t).ok()?;
    graph.node_at(SliceIndex::new(c, z, t))
}

#[cfg(test)]
#[path = "../../tests/unit/graph/builder.rs"]
mod tests;
