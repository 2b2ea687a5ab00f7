//! Visibility conditions.
//!
//! A condition is a template that is either plain text (resolved, then judged
//! by [`is_truthy_text`]) or a single comparison. The comparison operator is
//! found in the authored text; each operand is then substituted on its own, so
//! values from the scope are always data and never syntax. Evaluation never
//! fails across this module's boundary: any error yields `false` and is logged.
//!
//! Truthiness of resolved text:
//!
//! | resolved text (trimmed)                              | result |
//! |------------------------------------------------------|--------|
//! | empty                                                | false  |
//! | a number equal to zero (`0`, `0.0`, `-0`)            | false  |
//! | `false`, `null`, `undefined`, `NaN`                  | false  |
//! | an empty quoted string (`""`, `''`)                  | false  |
//! | anything else                                        | true   |

use crate::ast::{Value, parse_number};
use crate::error::ConditionError;
use crate::scope::{PathLookup, Scope};
use crate::template::resolve_template;

mod engine;
pub mod parser;

use engine::AstEngine;
pub use parser::{
    find_loose_equality, find_operator, has_unterminated_quote, parse_condition,
    parse_template_condition,
};

/// Evaluates a visibility condition against a scope.
pub fn evaluate_condition(expression: &str, scope: &Scope) -> bool {
    if let Some(path) = existence_shortcut(expression) {
        return match scope.lookup(path) {
            PathLookup::Found(value) => is_truthy_value(value),
            _ => false,
        };
    }

    match evaluate_template(expression, scope) {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::warn!(
                expression,
                resolved = %resolve_template(expression, scope),
                %error,
                "condition evaluation failed; treating as false"
            );
            false
        }
    }
}

/// Splits on the authored operator, then substitutes each operand on its own.
fn evaluate_template(expression: &str, scope: &Scope) -> Result<bool, ConditionError> {
    if find_operator(expression).is_none() {
        reject_loose_equality(expression)?;
        return Ok(is_truthy_text(&resolve_template(expression, scope)));
    }
    let parsed = parse_template_condition(expression, scope)?;
    let outcome = AstEngine::new(&parsed).evaluate()?;
    Ok(is_truthy_literal(&outcome))
}

/// Evaluates text whose placeholders have already been substituted.
///
/// Every quote in `text` is read as syntax, so an unbalanced one is an error.
pub fn evaluate_resolved(text: &str) -> Result<bool, ConditionError> {
    if find_operator(text).is_none() {
        reject_loose_equality(text)?;
        if has_unterminated_quote(text) {
            return Err(ConditionError::UnterminatedString(text.to_string()));
        }
        return Ok(is_truthy_text(text));
    }
    let expression = parse_condition(text)?;
    let outcome = AstEngine::new(&expression).evaluate()?;
    Ok(is_truthy_literal(&outcome))
}

fn reject_loose_equality(text: &str) -> Result<(), ConditionError> {
    match find_loose_equality(text) {
        Some(offset) => Err(ConditionError::UnexpectedToken {
            text: text.to_string(),
            found: text[offset..offset + 2].to_string(),
            expected: "'===' or '!=='".to_string(),
        }),
        None => Ok(()),
    }
}

/// Matches the `!!{{path}}` existence check and returns the path.
///
/// The shortcut never interpolates, so multi-line values such as scripts
/// cannot break the comparison parser.
fn existence_shortcut(expression: &str) -> Option<&str> {
    let inner = expression
        .trim()
        .strip_prefix("!!")?
        .trim_start()
        .strip_prefix("{{")?
        .strip_suffix("}}")?
        .trim();
    let valid = !inner.is_empty()
        && inner
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '$'));
    valid.then_some(inner)
}

/// Truthiness of resolved condition text. See the module docs for the table.
pub fn is_truthy_text(text: &str) -> bool {
    match text.trim() {
        "" | "false" | "null" | "undefined" | "NaN" | "\"\"" | "''" => false,
        other => parse_number(other).is_none_or(|n| n != 0.0),
    }
}

/// Truthiness of a scope value: non-empty strings must also be non-blank.
pub fn is_truthy_value(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.trim().is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

fn is_truthy_literal(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::Null | Value::Undefined => false,
    }
}
