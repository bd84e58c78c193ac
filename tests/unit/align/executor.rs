use std::cell::Cell;

use super::*;
use crate::align::aligner::AlignOutcome;
use crate::expr::evaluator::ExprEvaluator;
use crate::graph::builder::build_transform_graph;
use crate::graph::topo::topological_order;
use crate::rules::model::Rule;
use crate::stack::model::Plane;

/// Test aligner that "registers" by shifting the source a fixed integer
/// offset, reporting the shift as a single landmark pair.
struct ShiftAligner {
    dx: i64,
    dy: i64,
    align_calls: Cell<usize>,
    apply_calls: Cell<usize>,
}

impl ShiftAligner {
    fn new(dx: i64, dy: i64) -> Self {
        Self {
            dx,
            dy,
            align_calls: Cell::new(0),
            apply_calls: Cell::new(0),
        }
    }
}

fn shifted(source: &Plane, dx: i64, dy: i64) -> Plane {
    let mut out = Plane::filled(source.width, source.height, 0.0);
    for y in 0..i64::from(source.height) {
        for x in 0..i64::from(source.width) {
            let (sx, sy) = (x - dx, y - dy);
            if sx >= 0 && sx < i64::from(source.width) && sy >= 0 && sy < i64::from(source.height)
            {
                let dst = (y * i64::from(source.width) + x) as usize;
                let src = (sy * i64::from(source.width) + sx) as usize;
                out.data[dst] = source.data[src];
            }
        }
    }
    out
}

impl Aligner for ShiftAligner {
    fn align(
        &self,
        source: &Plane,
        _reference: &Plane,
        _kind: TransformKind,
        _params: &AlignParams,
    ) -> RegResult<AlignOutcome> {
        self.align_calls.set(self.align_calls.get() + 1);
        Ok(AlignOutcome {
            source_points: vec![Point::new(0.0, 0.0)],
            target_points: vec![Point::new(self.dx as f64, self.dy as f64)],
            transformed: shifted(source, self.dx, self.dy),
        })
    }

    fn apply_transform(
        &self,
        source: &Plane,
        _out_width: u32,
        _out_height: u32,
        _kind: TransformKind,
        source_points: &[Point],
        target_points: &[Point],
    ) -> RegResult<Plane> {
        self.apply_calls.set(self.apply_calls.get() + 1);
        let dx = (target_points[0].x - source_points[0].x) as i64;
        let dy = (target_points[0].y - source_points[0].y) as i64;
        Ok(shifted(source, dx, dy))
    }
}

fn grey_stack(dims: StackDims) -> ImageStack {
    let mut stack = ImageStack::filled(3, 3, dims, 0.0);
    for (i, index) in dims.iter().enumerate() {
        // A distinct corner pixel per slice so shifts are observable.
        let mut plane = Plane::filled(3, 3, 0.0);
        plane.data[0] = (i + 1) as f32;
        stack
            .set_slice(index, SlicePixels::Grey(plane))
            .unwrap();
    }
    stack
}

struct Run {
    graph: TransformGraph,
    schedule: ExecutedSchedule,
}

fn run(
    dims: StackDims,
    rules: &[Rule],
    input: &ImageStack,
    reference: &ImageStack,
    aligner: &dyn Aligner,
) -> RegResult<Run> {
    let ctx = VariableContext::new();
    let ev = ExprEvaluator;
    let cancel = CancellationToken::new();
    let mut graph = build_transform_graph(dims, rules, &ctx, &ev, &cancel)?;
    let order = topological_order(&graph)?;
    let schedule = run_schedule(
        &mut graph,
        &order,
        input,
        reference,
        TransformKind::RigidBody,
        &AlignParams::default(),
        &ctx,
        &ev,
        aligner,
        &cancel,
    )?;
    Ok(Run { graph, schedule })
}

fn use_rule(condition: &str, c: &str, z: &str, t: &str) -> Rule {
    Rule {
        condition: condition.to_string(),
        reference_channel: c.to_string(),
        reference_depth: z.to_string(),
        reference_time: t.to_string(),
        behavior: RuleBehavior::UseTransformation,
    }
}

#[test]
fn ignored_slices_pass_through_unchanged() {
    let dims = StackDims::new(1, 1, 1).unwrap();
    let input = grey_stack(dims);
    let aligner = ShiftAligner::new(1, 0);

    let out = run(dims, &[], &input, &input, &aligner).unwrap();
    let index = SliceIndex::new(0, 0, 0);
    assert_eq!(out.schedule.processed[&index], *input.slice(index).unwrap());
    assert!(out.schedule.log.entries.is_empty());
    let node = out.graph.node_at(index).unwrap();
    assert!(out.graph.vertex(node).transform.is_none());
    assert_eq!(aligner.align_calls.get(), 0);
    assert_eq!(aligner.apply_calls.get(), 0);
}

#[test]
fn calculate_aligns_logs_and_stores_the_transform() {
    let dims = StackDims::new(1, 1, 1).unwrap();
    let input = grey_stack(dims);
    let rules = vec![Rule::default()];
    let aligner = ShiftAligner::new(1, 0);

    let out = run(dims, &rules, &input, &input, &aligner).unwrap();
    let index = SliceIndex::new(0, 0, 0);

    let expected = shifted(&input.slice(index).unwrap().to_luma(), 1, 0);
    assert_eq!(
        out.schedule.processed[&index],
        SlicePixels::Grey(expected)
    );

    assert_eq!(out.schedule.log.entries.len(), 1);
    let entry = &out.schedule.log.entries[0];
    assert_eq!(entry.source_index, index);
    assert_eq!(entry.target_index, index);
    assert_eq!(entry.kind, TransformKind::RigidBody);
    assert_eq!(entry.target_points, vec![Point::new(1.0, 0.0)]);

    let node = out.graph.node_at(index).unwrap();
    assert_eq!(out.graph.vertex(node).transform.as_ref(), Some(entry));
}

#[test]
fn reused_transforms_shift_dependents_and_log_their_own_index() {
    let dims = StackDims::new(2, 1, 1).unwrap();
    let input = grey_stack(dims);
    let rules = vec![
        Rule {
            condition: "c == 0".to_string(),
            ..Rule::default()
        },
        use_rule("c == 1", "0", "0", "0"),
    ];
    let aligner = ShiftAligner::new(0, 2);

    let out = run(dims, &rules, &input, &input, &aligner).unwrap();
    let source = SliceIndex::new(0, 0, 0);
    let dependent = SliceIndex::new(1, 0, 0);

    // Dependent pixels were warped with the source's landmarks.
    let expected = shifted(&input.slice(dependent).unwrap().to_luma(), 0, 2);
    assert_eq!(
        out.schedule.processed[&dependent],
        SlicePixels::Grey(expected)
    );

    // The log entry carries the dependent's own index...
    assert_eq!(out.schedule.log.entries.len(), 2);
    let entry = &out.schedule.log.entries[1];
    assert_eq!(entry.source_index, dependent);
    assert_eq!(entry.target_index, source);

    // ...while the vertex stores the source's transform unmodified.
    let node = out.graph.node_at(dependent).unwrap();
    let stored = out.graph.vertex(node).transform.as_ref().unwrap();
    assert_eq!(stored.source_index, source);
    assert_eq!(stored, &out.schedule.log.entries[0]);
}

#[test]
fn reuse_from_an_ignored_source_passes_through() {
    let dims = StackDims::new(2, 1, 1).unwrap();
    let input = grey_stack(dims);
    // Channel 0 falls through to the ignore fallback; channel 1 reuses it.
    let rules = vec![use_rule("c == 1", "0", "0", "0")];
    let aligner = ShiftAligner::new(1, 1);

    let out = run(dims, &rules, &input, &input, &aligner).unwrap();
    let dependent = SliceIndex::new(1, 0, 0);
    assert_eq!(
        out.schedule.processed[&dependent],
        *input.slice(dependent).unwrap()
    );
    assert!(out.schedule.log.entries.is_empty());
    let node = out.graph.node_at(dependent).unwrap();
    assert!(out.graph.vertex(node).transform.is_none());
    assert_eq!(aligner.apply_calls.get(), 0);
}

#[test]
fn color_slices_align_on_luma_and_warp_per_channel() {
    let dims = StackDims::new(1, 1, 1).unwrap();
    let mut input = ImageStack::filled(3, 3, dims, 0.0);
    let mut red = Plane::filled(3, 3, 0.0);
    red.data[0] = 1.0;
    input
        .set_slice(
            SliceIndex::new(0, 0, 0),
            SlicePixels::rgb(red, Plane::filled(3, 3, 0.2), Plane::filled(3, 3, 0.4)).unwrap(),
        )
        .unwrap();

    let rules = vec![Rule::default()];
    let aligner = ShiftAligner::new(1, 0);
    let out = run(dims, &rules, &input, &input, &aligner).unwrap();

    assert_eq!(aligner.align_calls.get(), 1);
    assert_eq!(aligner.apply_calls.get(), 3);

    let processed = &out.schedule.processed[&SliceIndex::new(0, 0, 0)];
    assert!(processed.is_color());
    match processed {
        SlicePixels::Rgb([r, _, _]) => {
            // The corner pixel moved one to the right in the red channel.
            assert_eq!(r.data[0], 0.0);
            assert_eq!(r.data[1], 1.0);
        }
        SlicePixels::Grey(_) => unreachable!(),
    }
}

#[test]
fn calculate_references_clamp_onto_the_reference_stack() {
    let dims = StackDims::new(2, 1, 1).unwrap();
    let input = grey_stack(dims);
    let ref_dims = StackDims::new(1, 1, 1).unwrap();
    let reference = grey_stack(ref_dims);

    // Default references are (c, z, t); c == 1 is out of range for the
    // single-channel reference and must snap to channel 0.
    let rules = vec![Rule::default()];
    let aligner = ShiftAligner::new(0, 1);
    let out = run(dims, &rules, &input, &reference, &aligner).unwrap();

    assert_eq!(out.schedule.log.entries.len(), 2);
    assert_eq!(
        out.schedule.log.entries[1].source_index,
        SliceIndex::new(1, 0, 0)
    );
    assert_eq!(
        out.schedule.log.entries[1].target_index,
        SliceIndex::new(0, 0, 0)
    );
}

#[test]
fn negative_calculate_references_clamp_to_zero() {
    let dims = StackDims::new(1, 1, 1).unwrap();
    let ref_dims = StackDims::new(1, 1, 3).unwrap();
    assert_eq!(
        clamp_reference(ref_dims, (-4, 0, 5)),
        SliceIndex::new(0, 0, 2)
    );
    assert_eq!(clamp_reference(dims, (0, 0, 0)), SliceIndex::new(0, 0, 0));
}

#[test]
fn cancellation_stops_the_schedule() {
    let dims = StackDims::new(2, 1, 1).unwrap();
    let input = grey_stack(dims);
    let ctx = VariableContext::new();
    let ev = ExprEvaluator;
    let cancel = CancellationToken::new();
    let mut graph = build_transform_graph(dims, &[], &ctx, &ev, &cancel).unwrap();
    let order = topological_order(&graph).unwrap();

    cancel.cancel();
    let aligner = ShiftAligner::new(0, 0);
    let err = run_schedule(
        &mut graph,
        &order,
        &input,
        &input,
        TransformKind::RigidBody,
        &AlignParams::default(),
        &ctx,
        &ev,
        &aligner,
        &cancel,
    )
    .unwrap_err();
    assert!(matches!(err, RegError::Cancelled));
}
