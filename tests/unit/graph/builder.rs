use super::*;
use crate::expr::evaluator::ExprEvaluator;

fn use_rule(condition: &str, c: &str, z: &str, t: &str) -> Rule {
    Rule {
        condition: condition.to_string(),
        reference_channel: c.to_string(),
        reference_depth: z.to_string(),
        reference_time: t.to_string(),
        behavior: RuleBehavior::UseTransformation,
    }
}

fn build(dims: StackDims, rules: &[Rule]) -> RegResult<TransformGraph> {
    build_transform_graph(
        dims,
        rules,
        &VariableContext::new(),
        &ExprEvaluator,
        &CancellationToken::new(),
    )
}

#[test]
fn vertex_universe_is_the_cartesian_product() {
    let dims = StackDims::new(2, 2, 2).unwrap();
    let graph = build(dims, &[]).unwrap();
    assert_eq!(graph.vertex_count() as u64, dims.slice_count());
    assert_eq!(graph.edge_count(), 0);
    for index in dims.iter() {
        let node = graph.node_at(index).unwrap();
        assert_eq!(graph.vertex(node).index, index);
        assert!(graph.vertex(node).transform.is_none());
    }
}

#[test]
fn unmatched_vertices_carry_the_ignore_fallback() {
    let dims = StackDims::new(1, 1, 1).unwrap();
    let graph = build(dims, &[]).unwrap();
    let node = graph.node_at(SliceIndex::new(0, 0, 0)).unwrap();
    assert_eq!(graph.vertex(node).rule.behavior, RuleBehavior::Ignore);
}

#[test]
fn relative_reference_formulas_attach_edges() {
    let dims = StackDims::new(2, 1, 2).unwrap();
    // Channel 1 follows the transform of channel 0 at the same depth/time.
    let rules = vec![use_rule("c == 1", "0", "z", "t")];
    let graph = build(dims, &rules).unwrap();
    assert_eq!(graph.edge_count(), 2);

    for t in 0..2 {
        let dependent = graph.node_at(SliceIndex::new(1, 0, t)).unwrap();
        let source = graph.predecessor(dependent).unwrap();
        assert_eq!(graph.vertex(source).index, SliceIndex::new(0, 0, t));
    }
}

#[test]
fn fan_out_from_one_source_is_legal() {
    let dims = StackDims::new(3, 1, 1).unwrap();
    let rules = vec![use_rule("c > 0", "0", "0", "0")];
    let graph = build(dims, &rules).unwrap();
    assert_eq!(graph.edge_count(), 2);

    let source = graph.node_at(SliceIndex::new(0, 0, 0)).unwrap();
    assert_eq!(graph.successors(source).count(), 2);
}

#[test]
fn self_reference_is_unresolved() {
    let dims = StackDims::new(1, 1, 1).unwrap();
    let rules = vec![use_rule("true", "c", "z", "t")];
    let err = build(dims, &rules).unwrap_err();
    assert!(matches!(
        err,
        RegError::UnresolvedReference {
            at,
            referenced: (0, 0, 0),
        } if at == SliceIndex::new(0, 0, 0)
    ));
}

#[test]
fn missing_and_negative_references_are_unresolved() {
    let dims = StackDims::new(2, 1, 1).unwrap();

    let missing = vec![use_rule("c == 1", "5", "0", "0")];
    assert!(matches!(
        build(dims, &missing),
        Err(RegError::UnresolvedReference {
            referenced: (5, 0, 0),
            ..
        })
    ));

    let negative = vec![use_rule("c == 0", "c - 1", "0", "0")];
    assert!(matches!(
        build(dims, &negative),
        Err(RegError::UnresolvedReference {
            referenced: (-1, 0, 0),
            ..
        })
    ));
}

#[test]
fn malformed_reference_expression_propagates() {
    let dims = StackDims::new(2, 1, 1).unwrap();
    let rules = vec![use_rule("c == 1", "0 +", "0", "0")];
    assert!(matches!(
        build(dims, &rules),
        Err(RegError::Evaluation(_))
    ));
}

#[test]
fn cancellation_aborts_the_build() {
    let dims = StackDims::new(2, 2, 2).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = build_transform_graph(
        dims,
        &[],
        &VariableContext::new(),
        &ExprEvaluator,
        &cancel,
    )
    .unwrap_err();
    assert!(matches!(err, RegError::Cancelled));
}
