//! Live-value labels shown next to handles while `_showLiveValues` is set.
//!
//! Runtime records come in several legacy shapes. Lookups try them in a
//! fixed order that stored flows rely on:
//!
//! | side   | keys tried                                                                  |
//! |--------|-----------------------------------------------------------------------------|
//! | input  | `inputs["input-i"]`, `input_i`, `input{i}`                                  |
//! | output | `outputs["output-i"]`, `output_i`, `output{i}`, `result`, `value`           |

use super::RuntimeData;
use crate::handles::{Direction, HandleLayout, ResolvedHandle, handle_id};
use crate::template::coerce_to_string;
use serde_json::Value;

fn nested<'a>(runtime: &'a RuntimeData, group: &str, key: &str) -> Option<&'a Value> {
    runtime.get(group).and_then(Value::as_object).and_then(|g| g.get(key))
}

fn first_present<'a>(candidates: impl IntoIterator<Item = Option<&'a Value>>) -> Option<&'a Value> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_null())
}

pub fn input_live_value(runtime: &RuntimeData, index: usize) -> Option<&Value> {
    first_present([
        nested(runtime, "inputs", &handle_id(Direction::Input, index)),
        runtime.get(&format!("input_{index}")),
        runtime.get(&format!("input{index}")),
    ])
}

pub fn output_live_value(runtime: &RuntimeData, index: usize) -> Option<&Value> {
    first_present([
        nested(runtime, "outputs", &handle_id(Direction::Output, index)),
        runtime.get(&format!("output_{index}")),
        runtime.get(&format!("output{index}")),
        runtime.get("result"),
        runtime.get("value"),
    ])
}

/// Display text for a live value. `{ value, quality }` wrappers show their
/// `value`; a null value has no label.
pub fn live_label(value: &Value) -> Option<String> {
    let shown = match value {
        Value::Object(wrapper) if wrapper.contains_key("value") => wrapper.get("value")?,
        other => other,
    };
    if shown.is_null() {
        return None;
    }
    Some(coerce_to_string(shown))
}

/// Fills `live_value` on every visible handle.
pub fn attach_live_values(layout: &mut HandleLayout, runtime: &RuntimeData) {
    let label = |handle: &ResolvedHandle| {
        let value = match handle.direction {
            Direction::Input => input_live_value(runtime, handle.index),
            Direction::Output => output_live_value(runtime, handle.index),
        };
        value.and_then(live_label)
    };

    for handle in layout.inputs.iter_mut().chain(layout.outputs.iter_mut()) {
        handle.live_value = if handle.visible { label(&*handle) } else { None };
    }
}
