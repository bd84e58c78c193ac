use crate::expr::context::VariableContext;
use crate::expr::evaluator::Evaluator;
use crate::foundation::error::RegResult;
use crate::rules::model::Rule;

/// Find the rule governing the slice whose context is `ctx`.
///
/// Rules are tested in list order; the first whose condition evaluates true
/// wins. If none matches, the implicit [`Rule::ignore_fallback`] applies. A
/// malformed condition is a propagated evaluation failure, never a silent
/// "no match".
pub fn match_rule(
    rules: &[Rule],
    ctx: &VariableContext,
    evaluator: &dyn Evaluator,
) -> RegResult<Rule> {
    for rule in rules {
        if evaluator.eval_bool(&rule.condition, ctx)? {
            return Ok(rule.clone());
        }
    }
    Ok(Rule::ignore_fallback())
}

#[cfg(test)]
#[path = "../../tests/unit/rules/matcher.rs"]
mod tests;
