use crate::expr::context::{VarValue, VariableContext};
use crate::expr::parser::{BinaryOp, Expr, UnaryOp, parse};
use crate::foundation::error::{RegError, RegResult};

/// Capability contract for evaluating rule expressions.
///
/// Rule conditions and reference-index formulas are plain strings evaluated
/// against a [`VariableContext`]. Any implementation satisfying this contract
/// can drive the scheduler; [`ExprEvaluator`] is the built-in one.
pub trait Evaluator {
    /// Evaluate `expr` to a boolean (rule conditions).
    fn eval_bool(&self, expr: &str, ctx: &VariableContext) -> RegResult<bool>;

    /// Evaluate `expr` to an integer (reference-index formulas).
    ///
    /// Float results are truncated toward zero.
    fn eval_int(&self, expr: &str, ctx: &VariableContext) -> RegResult<i64>;
}

/// Built-in expression evaluator: recursive-descent parse plus tree walk.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExprEvaluator;

impl Evaluator for ExprEvaluator {
    fn eval_bool(&self, expr: &str, ctx: &VariableContext) -> RegResult<bool> {
        match eval(&parse(expr)?, ctx)? {
            VarValue::Bool(b) => Ok(b),
            other => Err(RegError::evaluation(format!(
                "expected '{expr}' to evaluate to a boolean, got {}",
                other.type_name()
            ))),
        }
    }

    fn eval_int(&self, expr: &str, ctx: &VariableContext) -> RegResult<i64> {
        match eval(&parse(expr)?, ctx)? {
            VarValue::Int(v) => Ok(v),
            VarValue::Float(v) => Ok(v.trunc() as i64),
            other => Err(RegError::evaluation(format!(
                "expected '{expr}' to evaluate to a number, got {}",
                other.type_name()
            ))),
        }
    }
}

fn eval(expr: &Expr, ctx: &VariableContext) -> RegResult<VarValue> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Var(name) => ctx
            .get(name)
            .cloned()
            .ok_or_else(|| RegError::evaluation(format!("unknown variable '{name}'"))),
        Expr::Unary { op, operand } => {
            let value = eval(operand, ctx)?;
            match (op, value) {
                (UnaryOp::Not, VarValue::Bool(b)) => Ok(VarValue::Bool(!b)),
                (UnaryOp::Neg, VarValue::Int(v)) => Ok(VarValue::Int(-v)),
                (UnaryOp::Neg, VarValue::Float(v)) => Ok(VarValue::Float(-v)),
                (op, value) => Err(RegError::evaluation(format!(
                    "cannot apply {op:?} to a {}",
                    value.type_name()
                ))),
            }
        }
        Expr::Binary { op, lhs, rhs } => match op {
            // Short-circuiting logic ops evaluate the right side lazily.
            BinaryOp::And => {
                if !eval_as_bool(lhs, ctx)? {
                    return Ok(VarValue::Bool(false));
                }
                Ok(VarValue::Bool(eval_as_bool(rhs, ctx)?))
            }
            BinaryOp::Or => {
                if eval_as_bool(lhs, ctx)? {
                    return Ok(VarValue::Bool(true));
                }
                Ok(VarValue::Bool(eval_as_bool(rhs, ctx)?))
            }
            _ => {
                let left = eval(lhs, ctx)?;
                let right = eval(rhs, ctx)?;
                apply_binary(*op, left, right)
            }
        },
    }
}

fn eval_as_bool(expr: &Expr, ctx: &VariableContext) -> RegResult<bool> {
    match eval(expr, ctx)? {
        VarValue::Bool(b) => Ok(b),
        other => Err(RegError::evaluation(format!(
            "logical operand must be a boolean, got {}",
            other.type_name()
        ))),
    }
}

fn apply_binary(op: BinaryOp, left: VarValue, right: VarValue) -> RegResult<VarValue> {
    use BinaryOp::*;
    match op {
        Add | Sub | Mul | Div | Rem => numeric_arith(op, left, right),
        Eq | NotEq | Lt | LtEq | Gt | GtEq => compare(op, left, right),
        And | Or => unreachable!("logic ops are handled with short-circuiting"),
    }
}

fn numeric_arith(op: BinaryOp, left: VarValue, right: VarValue) -> RegResult<VarValue> {
    match (left, right) {
        (VarValue::Int(a), VarValue::Int(b)) => {
            let v = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => a.checked_div(b),
                BinaryOp::Rem => a.checked_rem(b),
                _ => unreachable!(),
            };
            v.map(VarValue::Int).ok_or_else(|| {
                RegError::evaluation(format!("integer arithmetic failed: {a} {op:?} {b}"))
            })
        }
        (left, right) => {
            let a = as_f64(&left, op)?;
            let b = as_f64(&right, op)?;
            let v = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                _ => unreachable!(),
            };
            Ok(VarValue::Float(v))
        }
    }
}

fn compare(op: BinaryOp, left: VarValue, right: VarValue) -> RegResult<VarValue> {
    let result = match (&left, &right) {
        (VarValue::Bool(a), VarValue::Bool(b)) => match op {
            BinaryOp::Eq => a == b,
            BinaryOp::NotEq => a != b,
            _ => {
                return Err(RegError::evaluation(
                    "booleans only support '==' and '!='".to_string(),
                ));
            }
        },
        (VarValue::Str(a), VarValue::Str(b)) => match op {
            BinaryOp::Eq => a == b,
            BinaryOp::NotEq => a != b,
            BinaryOp::Lt => a < b,
            BinaryOp::LtEq => a <= b,
            BinaryOp::Gt => a > b,
            BinaryOp::GtEq => a >= b,
            _ => unreachable!(),
        },
        _ => {
            let a = as_f64(&left, op)?;
            let b = as_f64(&right, op)?;
            match op {
                BinaryOp::Eq => a == b,
                BinaryOp::NotEq => a != b,
                BinaryOp::Lt => a < b,
                BinaryOp::LtEq => a <= b,
                BinaryOp::Gt => a > b,
                BinaryOp::GtEq => a >= b,
                _ => unreachable!(),
            }
        }
    };
    Ok(VarValue::Bool(result))
}

fn as_f64(value: &VarValue, op: BinaryOp) -> RegResult<f64> {
    match value {
        VarValue::Int(v) => Ok(*v as f64),
        VarValue::Float(v) => Ok(*v),
        other => Err(RegError::evaluation(format!(
            "operand of {op:?} must be numeric, got {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expr/evaluator.rs"]
mod tests;
