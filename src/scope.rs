use serde::Serialize;
use serde_json::{Map, Value};

/// The outcome of walking a dotted path through a [`Scope`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathLookup<'a> {
    /// The path resolved to a defined, non-null value.
    Found(&'a Value),
    /// The walk succeeded but ended on a missing key or an explicit `null`.
    Undefined,
    /// The walk hit a non-object before the last segment.
    Miss,
}

/// The read-only record that templates and conditions are resolved against.
///
/// A scope is built fresh for every render pass and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Scope {
    fields: Map<String, Value>,
}

impl Scope {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builds a scope from a JSON value. Anything but an object yields an empty scope.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Walks a dot-separated path such as `runtime.inputs.input-0`.
    ///
    /// Arrays are indexed by numeric segments. Every segment but the last must
    /// land on an object or array, otherwise the lookup is a [`PathLookup::Miss`].
    pub fn lookup(&self, path: &str) -> PathLookup<'_> {
        let segments: Vec<&str> = path.split('.').map(str::trim).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return PathLookup::Miss;
        }

        let last = segments.len() - 1;
        let mut current = match self.fields.get(segments[0]) {
            Some(value) => value,
            None => return terminal(last == 0),
        };

        for (i, segment) in segments.iter().enumerate().skip(1) {
            let next = match current {
                Value::Object(map) => map.get(*segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => return PathLookup::Miss,
            };
            current = match next {
                Some(value) => value,
                None => return terminal(i == last),
            };
        }

        if current.is_null() {
            PathLookup::Undefined
        } else {
            PathLookup::Found(current)
        }
    }
}

// A missing key is only "undefined" if nothing follows it.
fn terminal(is_last: bool) -> PathLookup<'static> {
    if is_last {
        PathLookup::Undefined
    } else {
        PathLookup::Miss
    }
}

impl From<Map<String, Value>> for Scope {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}
