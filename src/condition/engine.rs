use crate::ast::{Expression, Value};
use crate::error::ConditionError;

// This macro generates a match arm for an ordered comparison.
macro_rules! eval_op {
    ($self:ident, $l:ident, $r:ident, $op_str:expr, $op_fn:expr) => {
        $self.eval_ordering($l, $r, $op_str, $op_fn)
    };
}

/// Evaluates a single parsed condition.
pub(super) struct AstEngine<'a> {
    expression: &'a Expression,
}

impl<'a> AstEngine<'a> {
    pub(super) fn new(expression: &'a Expression) -> Self {
        Self { expression }
    }

    pub(super) fn evaluate(&self) -> Result<Value, ConditionError> {
        self.evaluate_recursive(self.expression)
    }

    fn evaluate_recursive(&self, expr: &Expression) -> Result<Value, ConditionError> {
        match expr {
            // --- Equality ---
            Expression::Equal(l, r) => {
                let (left, right) = (self.evaluate_recursive(l)?, self.evaluate_recursive(r)?);
                Ok(Value::Bool(left.strict_eq(&right)))
            }
            Expression::NotEqual(l, r) => {
                let (left, right) = (self.evaluate_recursive(l)?, self.evaluate_recursive(r)?);
                Ok(Value::Bool(!left.strict_eq(&right)))
            }

            // --- Ordering ---
            Expression::GreaterThan(l, r) => eval_op!(self, l, r, ">", |a, b| a > b),
            Expression::SmallerThan(l, r) => eval_op!(self, l, r, "<", |a, b| a < b),
            Expression::GreaterThanOrEqual(l, r) => eval_op!(self, l, r, ">=", |a, b| a >= b),
            Expression::SmallerThanOrEqual(l, r) => eval_op!(self, l, r, "<=", |a, b| a <= b),

            // --- Leaves ---
            Expression::Literal(val) => Ok(val.clone()),
            Expression::Identifier(name) => {
                Err(ConditionError::UnresolvedIdentifier(name.clone()))
            }
        }
    }

    fn eval_ordering<F>(
        &self,
        l: &Expression,
        r: &Expression,
        op: &'static str,
        f: F,
    ) -> Result<Value, ConditionError>
    where
        F: Fn(f64, f64) -> bool,
    {
        let left = self.number_operand(l, op)?;
        let right = self.number_operand(r, op)?;
        Ok(Value::Bool(f(left, right)))
    }

    fn number_operand(&self, expr: &Expression, op: &str) -> Result<f64, ConditionError> {
        let value = match expr {
            Expression::Identifier(name) => Value::Str(name.clone()),
            other => self.evaluate_recursive(other)?,
        };
        value.as_number().ok_or_else(|| ConditionError::NotANumber {
            operator: op.to_string(),
            found: value.to_string(),
        })
    }
}
