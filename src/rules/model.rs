use crate::expr::context::VariableContext;
use crate::expr::evaluator::Evaluator;
use crate::foundation::error::RegResult;

/// What happens to a slice once its rule matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleBehavior {
    /// Pass the slice through unchanged.
    Ignore,
    /// Align the slice against a reference slice and record the transform.
    Calculate,
    /// Reapply the transform computed for another slice.
    UseTransformation,
}

/// Declarative matching rule: condition, reference formulas, behavior.
///
/// Rules are evaluated in list order against each slice; the first rule whose
/// `condition` holds wins. Slices matched by no rule fall back to
/// [`Rule::ignore_fallback`]. The three reference expressions are evaluated
/// against the matched slice's own context, so formulas may be relative
/// (e.g. reference channel `"0"` with depth `"z"` and time `"t"`).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rule {
    /// Boolean expression deciding whether this rule applies to a slice.
    pub condition: String,
    /// Integer expression for the referenced channel.
    pub reference_channel: String,
    /// Integer expression for the referenced depth.
    pub reference_depth: String,
    /// Integer expression for the referenced time frame.
    pub reference_time: String,
    /// Behavior applied to matched slices.
    pub behavior: RuleBehavior,
}

impl Default for Rule {
    /// The template rule: match everything, align each slice against the
    /// reference slice at its own coordinates.
    fn default() -> Self {
        Self {
            condition: "true".to_string(),
            reference_channel: "c".to_string(),
            reference_depth: "z".to_string(),
            reference_time: "t".to_string(),
            behavior: RuleBehavior::Calculate,
        }
    }
}

impl Rule {
    /// The implicit terminal rule applied when no listed rule matches.
    pub fn ignore_fallback() -> Self {
        Self {
            behavior: RuleBehavior::Ignore,
            ..Self::default()
        }
    }

    /// Evaluate the three reference expressions against `ctx`.
    ///
    /// Returns raw coordinates; they may be negative or out of range, and it
    /// is the caller's decision whether to clamp (Calculate) or to reject
    /// (UseTransformation).
    pub fn raw_reference(
        &self,
        ctx: &VariableContext,
        evaluator: &dyn Evaluator,
    ) -> RegResult<(i64, i64, i64)> {
        Ok((
            evaluator.eval_int(&self.reference_channel, ctx)?,
            evaluator.eval_int(&self.reference_depth, ctx)?,
            evaluator.eval_int(&self.reference_time, ctx)?,
        ))
    }
}
