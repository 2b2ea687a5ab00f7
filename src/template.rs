//! `{{path}}` placeholder resolution.
//!
//! Placeholders are resolved against a [`Scope`]. A placeholder whose path
//! cannot be walked (an intermediate segment is not an object) is kept
//! verbatim, so authoring mistakes stay visible on the node. A path that walks
//! cleanly but ends on a missing key or `null` becomes the empty string.

use crate::scope::{PathLookup, Scope};
use itertools::Itertools;
use serde_json::{Number, Value};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Resolves every placeholder in `template`.
pub fn resolve_template(template: &str, scope: &Scope) -> String {
    if !template.contains(OPEN) {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            out.push_str(&rest[start..]);
            return out;
        };

        let path = &after_open[..end];
        if path.trim().is_empty() || path.contains('}') {
            // Not a placeholder; emit the braces and keep scanning after them.
            out.push_str(OPEN);
            rest = after_open;
            continue;
        }

        match scope.lookup(path.trim()) {
            PathLookup::Found(value) => out.push_str(&coerce_to_string(value)),
            PathLookup::Undefined => {}
            PathLookup::Miss => {
                out.push_str(OPEN);
                out.push_str(path);
                out.push_str(CLOSE);
            }
        }
        rest = &after_open[end + CLOSE.len()..];
    }
    out.push_str(rest);
    out
}

/// Resolves a JSON value: strings are template-resolved, everything else is returned untouched.
pub fn resolve_value(value: &Value, scope: &Scope) -> Value {
    match value {
        Value::String(s) => Value::String(resolve_template(s, scope)),
        other => other.clone(),
    }
}

/// Like [`resolve_value`], but a string that is exactly one placeholder keeps
/// the type of the value it points at. An undefined path yields `null`.
pub fn resolve_typed(value: &Value, scope: &Scope) -> Value {
    let Value::String(text) = value else {
        return value.clone();
    };
    let path = text
        .trim()
        .strip_prefix(OPEN)
        .and_then(|rest| rest.strip_suffix(CLOSE))
        .filter(|path| !path.contains(OPEN) && !path.contains(CLOSE) && !path.trim().is_empty());

    match path.map(|path| scope.lookup(path.trim())) {
        Some(PathLookup::Found(found)) => found.clone(),
        Some(PathLookup::Undefined) => Value::Null,
        Some(PathLookup::Miss) | None => Value::String(resolve_template(text, scope)),
    }
}

/// Returns `true` if the text holds at least one `{{...}}` pair.
pub fn has_placeholder(text: &str) -> bool {
    text.find(OPEN)
        .is_some_and(|start| text[start + OPEN.len()..].contains(CLOSE))
}

/// Converts a JSON value to display text the way the editor front end does.
///
/// Arrays join their elements with `,` (nulls become empty), objects render as
/// compact JSON, and whole floats drop their fractional part.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_to_string(other),
            })
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

pub(crate) fn format_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
