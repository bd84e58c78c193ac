use std::collections::BTreeMap;

use kurbo::Point;
use petgraph::graph::NodeIndex;

use crate::align::aligner::{AlignParams, Aligner, TransformLog, TransformResult};
use crate::expr::context::VariableContext;
use crate::expr::evaluator::Evaluator;
use crate::foundation::core::{CancellationToken, SliceIndex, StackDims, TransformKind};
use crate::foundation::error::{GraphIntegrityReport, GraphViolation, RegError, RegResult};
use crate::graph::builder::TransformGraph;
use crate::rules::model::RuleBehavior;
use crate::stack::model::{ImageStack, SlicePixels};

/// Result of walking the whole schedule: processed pixels per slice plus the
/// ordered transform log.
#[derive(Debug)]
pub(crate) struct ExecutedSchedule {
    pub processed: BTreeMap<SliceIndex, SlicePixels>,
    pub log: TransformLog,
}

/// Execute the validated schedule one vertex at a time.
///
/// Per vertex the behavior of its matched rule decides: pass the slice
/// through (`Ignore`), align it against a reference slice (`Calculate`), or
/// reapply the transform stored on its single predecessor
/// (`UseTransformation`). Each vertex's `transform` field is written exactly
/// once here; topological order guarantees predecessors were written first.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_schedule(
    graph: &mut TransformGraph,
    order: &[NodeIndex],
    input: &ImageStack,
    reference: &ImageStack,
    kind: TransformKind,
    params: &AlignParams,
    ctx: &VariableContext,
    evaluator: &dyn Evaluator,
    aligner: &dyn Aligner,
    cancel: &CancellationToken,
) -> RegResult<ExecutedSchedule> {
    let mut processed: BTreeMap<SliceIndex, SlicePixels> = BTreeMap::new();
    let mut log = TransformLog::default();

    for &node in order {
        cancel.check()?;

        let vertex = graph.vertex(node);
        let index = vertex.index;
        let rule = vertex.rule.clone();
        let source_pixels = input.slice(index)?;

        match rule.behavior {
            RuleBehavior::Ignore => {
                processed.insert(index, source_pixels.clone());
            }
            RuleBehavior::Calculate => {
                let slice_ctx = ctx.for_slice(index);
                let raw = rule.raw_reference(&slice_ctx, evaluator)?;
                let target_index = clamp_reference(reference.dims(), raw);
                tracing::debug!(%index, %target_index, "aligning input slice to reference");

                let reference_pixels = reference.slice(target_index)?;
                let outcome = aligner.align(
                    &source_pixels.to_luma(),
                    &reference_pixels.to_luma(),
                    kind,
                    params,
                )?;

                let pixels = if source_pixels.is_color() {
                    // The aligner saw the greyscale reduction; redo the warp
                    // per color channel with the computed landmarks.
                    apply_points(
                        aligner,
                        source_pixels,
                        input.width(),
                        input.height(),
                        kind,
                        &outcome.source_points,
                        &outcome.target_points,
                    )?
                } else {
                    SlicePixels::Grey(outcome.transformed)
                };
                processed.insert(index, pixels);

                let result = TransformResult {
                    source_index: index,
                    target_index,
                    kind,
                    source_points: outcome.source_points,
                    target_points: outcome.target_points,
                };
                log.entries.push(result.clone());
                graph.vertex_mut(node).transform = Some(result);
            }
            RuleBehavior::UseTransformation => {
                // In-degree 1 is guaranteed by validation.
                let pred = graph.predecessor(node).ok_or_else(|| {
                    RegError::GraphIntegrity(GraphIntegrityReport {
                        violations: vec![GraphViolation::UnresolvedInput(index)],
                    })
                })?;
                let pred_transform = graph.vertex(pred).transform.clone();

                match pred_transform {
                    None => {
                        // Predecessor was ignored; pass through, not an error.
                        let pred_index = graph.vertex(pred).index;
                        tracing::info!(
                            %index,
                            source = %pred_index,
                            "skipping transform reuse: source slice has no transform"
                        );
                        processed.insert(index, source_pixels.clone());
                    }
                    Some(transform) => {
                        tracing::debug!(
                            %index,
                            source = %transform.source_index,
                            "reapplying transform from source slice"
                        );
                        let pixels = apply_points(
                            aligner,
                            source_pixels,
                            input.width(),
                            input.height(),
                            kind,
                            &transform.source_points,
                            &transform.target_points,
                        )?;
                        processed.insert(index, pixels);

                        // Log under this vertex's own index; the stored
                        // transform stays the predecessor's unmodified value.
                        log.entries.push(TransformResult {
                            source_index: index,
                            ..transform.clone()
                        });
                        graph.vertex_mut(node).transform = Some(transform);
                    }
                }
            }
        }
    }

    Ok(ExecutedSchedule { processed, log })
}

/// Clamp raw `Calculate` reference coordinates onto the reference stack.
///
/// The reference stack may have fewer slices along any axis than the input;
/// out-of-range (including negative) coordinates snap to the nearest valid
/// slice. `UseTransformation` references are never clamped.
fn clamp_reference(dims: StackDims, raw: (i64, i64, i64)) -> SliceIndex {
    fn axis(v: i64, len: u32) -> u32 {
        v.clamp(0, i64::from(len) - 1) as u32
    }
    SliceIndex::new(
        axis(raw.0, dims.channels),
        axis(raw.1, dims.depths),
        axis(raw.2, dims.times),
    )
}

/// Warp a slice with precomputed landmarks, per channel when it is color.
fn apply_points(
    aligner: &dyn Aligner,
    source: &SlicePixels,
    out_width: u32,
    out_height: u32,
    kind: TransformKind,
    source_points: &[Point],
    target_points: &[Point],
) -> RegResult<SlicePixels> {
    match source {
        SlicePixels::Grey(plane) => Ok(SlicePixels::Grey(aligner.apply_transform(
            plane,
            out_width,
            out_height,
            kind,
            source_points,
            target_points,
        )?)),
        SlicePixels::Rgb([r, g, b]) => {
            let r = aligner.apply_transform(
                r,
                out_width,
                out_height,
                kind,
                source_points,
                target_points,
            )?;
            let g = aligner.apply_transform(
                g,
                out_width,
                out_height,
                kind,
                source_points,
                target_points,
            )?;
            let b = aligner.apply_transform(
                b,
                out_width,
                out_height,
                kind,
                source_points,
                target_points,
            )?;
            SlicePixels::rgb(r, g, b)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/align/executor.rs"]
mod tests;
