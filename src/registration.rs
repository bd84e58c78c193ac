use std::collections::BTreeMap;

use crate::align::aligner::{AlignParams, Aligner, TransformLog};
use crate::align::executor::run_schedule;
use crate::expr::context::{VarValue, VariableContext};
use crate::expr::evaluator::Evaluator;
use crate::foundation::core::{CancellationToken, TransformKind};
use crate::foundation::error::{RegError, RegResult};
use crate::graph::builder::build_transform_graph;
use crate::graph::topo::topological_order;
use crate::graph::validate::validate_graph;
use crate::rules::model::Rule;
use crate::stack::model::ImageStack;

/// Configuration of one registration run.
#[derive(Clone, Debug)]
pub struct RegistrationOpts {
    /// Transform family; [`TransformKind::None`] bypasses the scheduler.
    pub kind: TransformKind,
    /// Parameters forwarded to the aligner.
    pub params: AlignParams,
    /// Matching rules, evaluated in order; first match wins.
    pub rules: Vec<Rule>,
    /// Extra variables exposed to rule expressions (e.g. annotations).
    pub annotations: BTreeMap<String, VarValue>,
}

impl Default for RegistrationOpts {
    fn default() -> Self {
        Self {
            kind: TransformKind::RigidBody,
            params: AlignParams::default(),
            rules: Vec::new(),
            annotations: BTreeMap::new(),
        }
    }
}

/// Everything a registration run produces.
#[derive(Clone, Debug)]
pub struct RegistrationOutput {
    /// The registered stack; same dimensions as the input stack.
    pub registered: ImageStack,
    /// Pass-through copy of the reference stack.
    pub reference: ImageStack,
    /// Ordered log of every transform computed or propagated.
    pub log: TransformLog,
}

/// Register `input` against `reference` according to `opts`.
///
/// Pipeline: rule matching over the full slice universe, dependency-graph
/// construction, validation, deterministic topological scheduling, then
/// sequential execution driving the `aligner`. Runs entirely on the calling
/// thread; later vertices may depend on transforms computed for earlier
/// ones, and the sequential order keeps the output byte-identical across
/// runs.
///
/// Fails fast (before touching pixels) on dimension mismatches, malformed
/// rule expressions, unresolved references, and graph-integrity violations.
/// Cancellation via `cancel` aborts cleanly with [`RegError::Cancelled`]
/// and discards all partial work.
#[tracing::instrument(skip_all)]
pub fn register_stack(
    input: &ImageStack,
    reference: &ImageStack,
    opts: &RegistrationOpts,
    evaluator: &dyn Evaluator,
    aligner: &dyn Aligner,
    cancel: &CancellationToken,
) -> RegResult<RegistrationOutput> {
    if opts.kind.is_none() {
        tracing::info!("transformation set to 'none', skipping registration");
        return Ok(RegistrationOutput {
            registered: input.clone(),
            reference: reference.clone(),
            log: TransformLog::default(),
        });
    }

    if input.width() != reference.width() || input.height() != reference.height() {
        return Err(RegError::validation(format!(
            "input and reference stacks do not share width and height: {}x{} vs {}x{}",
            input.width(),
            input.height(),
            reference.width(),
            reference.height()
        )));
    }

    let mut ctx = VariableContext::new();
    for (name, value) in &opts.annotations {
        ctx.set(name.clone(), value.clone());
    }
    ctx.set_stack_vars(
        input.width(),
        input.height(),
        input.dims(),
        reference.dims(),
    );

    cancel.check()?;

    tracing::debug!("building transformation graph");
    let mut graph = build_transform_graph(input.dims(), &opts.rules, &ctx, evaluator, cancel)?;
    validate_graph(&graph)?;
    cancel.check()?;

    let order = topological_order(&graph)?;
    let executed = run_schedule(
        &mut graph,
        &order,
        input,
        reference,
        opts.kind,
        &opts.params,
        &ctx,
        evaluator,
        aligner,
        cancel,
    )?;

    let registered = ImageStack::from_slices(
        input.width(),
        input.height(),
        input.dims(),
        executed.processed,
    )?;

    Ok(RegistrationOutput {
        registered,
        reference: reference.clone(),
        log: executed.log,
    })
}

#[cfg(test)]
#[path = "../tests/unit/registration.rs"]
mod tests;
