//! Parameter-driven I/O generation.
//!
//! A node type may carry `ioRules` that derive its effective inputs and
//! outputs from the node's parameters (for example an "input count" field).
//! The engine that interprets those rules is pluggable; [`ConditionalIoRules`]
//! is the built-in interpreter.

use crate::error::IoRulesError;
use crate::scope::Scope;
use crate::template::resolve_template;
use crate::visual::{Condition, IoDef, IoType};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Effective I/O definitions produced by a rules engine.
///
/// A side left as `None` falls back to the node type's static definitions;
/// `Some(vec![])` is a valid answer meaning "no handles on this side".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveIo {
    pub inputs: Option<Vec<IoDef>>,
    pub outputs: Option<Vec<IoDef>>,
}

/// Interprets a node type's I/O rules against a node's data.
pub trait IoRulesEngine: Send + Sync {
    /// Returns `Ok(None)` when the rules do not apply to this data.
    fn evaluate(
        &self,
        rules: &[Value],
        data: &Map<String, Value>,
    ) -> Result<Option<EffectiveIo>, IoRulesError>;
}

/// A rules engine that never applies, leaving static definitions in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIoRules;

impl IoRulesEngine for NoIoRules {
    fn evaluate(
        &self,
        _rules: &[Value],
        _data: &Map<String, Value>,
    ) -> Result<Option<EffectiveIo>, IoRulesError> {
        Ok(None)
    }
}

/// Evaluates rules in order; the first rule whose `when` condition holds wins.
///
/// ```json
/// {
///   "when": "{{mode}} === \"multi\"",
///   "inputs": [{ "type": "trigger", "displayName": "Reset" }],
///   "repeatInputs": { "count": "{{inputCount}}", "type": "number", "displayName": "In {{n}}" },
///   "outputs": [{ "type": "number" }]
/// }
/// ```
///
/// Repeated entries follow the explicit ones. Within a repeated display name,
/// `{{n}}` is the 1-based position and `{{i}}` the 0-based one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalIoRules;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IoRule {
    when: Option<Condition>,
    inputs: Option<Vec<IoDef>>,
    outputs: Option<Vec<IoDef>>,
    repeat_inputs: Option<RepeatSpec>,
    repeat_outputs: Option<RepeatSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepeatSpec {
    count: Value,
    #[serde(rename = "type")]
    io_type: Option<IoType>,
    display_name: Option<String>,
}

impl IoRulesEngine for ConditionalIoRules {
    fn evaluate(
        &self,
        rules: &[Value],
        data: &Map<String, Value>,
    ) -> Result<Option<EffectiveIo>, IoRulesError> {
        let scope = Scope::new(data.clone());
        for (index, raw) in rules.iter().enumerate() {
            let rule: IoRule =
                serde_json::from_value(raw.clone()).map_err(|e| IoRulesError::MalformedRule {
                    index,
                    message: e.to_string(),
                })?;

            if !rule.when.as_ref().is_none_or(|c| c.evaluate(&scope)) {
                continue;
            }

            tracing::debug!(rule = index, "I/O rule matched");
            return Ok(Some(EffectiveIo {
                inputs: expand(rule.inputs, rule.repeat_inputs.as_ref(), &scope, index)?,
                outputs: expand(rule.outputs, rule.repeat_outputs.as_ref(), &scope, index)?,
            }));
        }
        Ok(None)
    }
}

fn expand(
    explicit: Option<Vec<IoDef>>,
    repeat: Option<&RepeatSpec>,
    scope: &Scope,
    index: usize,
) -> Result<Option<Vec<IoDef>>, IoRulesError> {
    let Some(repeat) = repeat else {
        return Ok(explicit);
    };

    let mut defs = explicit.unwrap_or_default();
    let count = repeat_count(&repeat.count, scope, index)?;
    for i in 0..count {
        let display_name = repeat.display_name.as_deref().map(|template| {
            let mut locals = scope.as_map().clone();
            locals.insert("n".to_string(), Value::from(i + 1));
            locals.insert("i".to_string(), Value::from(i));
            resolve_template(template, &Scope::new(locals))
        });
        defs.push(IoDef {
            io_type: repeat.io_type.clone(),
            display_name,
        });
    }
    Ok(Some(defs))
}

fn repeat_count(count: &Value, scope: &Scope, index: usize) -> Result<usize, IoRulesError> {
    let invalid = |shown: String| IoRulesError::InvalidCount {
        index,
        count: shown,
    };
    match count {
        Value::Number(n) => n
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| invalid(n.to_string())),
        Value::String(template) => {
            let resolved = resolve_template(template, scope);
            resolved
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid(resolved.clone()))
        }
        other => Err(invalid(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_repeat_inputs_from_parameter() {
        let rules = vec![json!({
            "repeatInputs": { "count": "{{inputCount}}", "type": "number", "displayName": "In {{n}}" },
            "outputs": [{ "type": "number", "displayName": "Sum" }]
        })];
        let io = ConditionalIoRules
            .evaluate(&rules, &data(json!({ "inputCount": 3 })))
            .unwrap()
            .unwrap();
        let inputs = io.inputs.unwrap();
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[2].display_name.as_deref(), Some("In 3"));
        assert_eq!(inputs[0].io_type, Some(IoType::Number));
        assert_eq!(io.outputs.unwrap().len(), 1);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            json!({ "when": "{{mode}} === \"none\"", "inputs": [] }),
            json!({ "inputs": [{ "type": "string" }] }),
        ];
        let none = ConditionalIoRules
            .evaluate(&rules, &data(json!({ "mode": "none" })))
            .unwrap()
            .unwrap();
        assert_eq!(none.inputs, Some(vec![]));
        assert_eq!(none.outputs, None);

        let other = ConditionalIoRules
            .evaluate(&rules, &data(json!({ "mode": "text" })))
            .unwrap()
            .unwrap();
        assert_eq!(other.inputs.unwrap()[0].io_type, Some(IoType::String));
    }

    #[test]
    fn test_no_match_and_errors() {
        let rules = vec![json!({ "when": false, "inputs": [] })];
        assert_eq!(ConditionalIoRules.evaluate(&rules, &Map::new()).unwrap(), None);

        let bad_count = vec![json!({ "repeatInputs": { "count": "{{n}}" } })];
        assert!(matches!(
            ConditionalIoRules.evaluate(&bad_count, &data(json!({ "n": "many" }))),
            Err(IoRulesError::InvalidCount { .. })
        ));

        let malformed = vec![json!({ "inputs": "not-a-list" })];
        assert!(matches!(
            ConditionalIoRules.evaluate(&malformed, &Map::new()),
            Err(IoRulesError::MalformedRule { index: 0, .. })
        ));
    }
}
