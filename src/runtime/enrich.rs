//! Computed fields attached to a node's data before scope assembly.
//!
//! Authored visual definitions reference a few derived keys
//! (`_constantValue`, `_displayOperation`, a derived `connectionName`). Each
//! is produced by a [`DataEnricher`] registered for the node type.

use crate::template::coerce_to_string;
use ahash::AHashMap;
use serde_json::{Map, Value};

/// Adds computed fields to a copy of a node's data record.
pub trait DataEnricher: Send + Sync {
    fn node_type(&self) -> &str;
    fn enrich(&self, data: &mut Map<String, Value>);
}

/// Enrichers keyed by node type. A type may have several; they run in registration order.
pub struct EnricherRegistry {
    enrichers: AHashMap<String, Vec<Box<dyn DataEnricher>>>,
}

impl Default for EnricherRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl EnricherRegistry {
    pub fn empty() -> Self {
        Self {
            enrichers: AHashMap::new(),
        }
    }

    /// A registry with the built-in enrichers for `constant`, `tag-input`,
    /// `tag-output` and `comparison` nodes.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(ConstantValue));
        registry.register(Box::new(TagConnectionName("tag-input")));
        registry.register(Box::new(TagConnectionName("tag-output")));
        registry.register(Box::new(ComparisonOperation));
        registry
    }

    pub fn register(&mut self, enricher: Box<dyn DataEnricher>) {
        self.enrichers
            .entry(enricher.node_type().to_string())
            .or_default()
            .push(enricher);
    }

    /// Returns an enriched copy of `data`; the input is never modified.
    pub fn enhance(&self, node_type: &str, data: &Map<String, Value>) -> Map<String, Value> {
        let mut enhanced = data.clone();
        if let Some(enrichers) = self.enrichers.get(node_type) {
            for enricher in enrichers {
                enricher.enrich(&mut enhanced);
            }
        }
        enhanced
    }
}

/// `constant` nodes: `_constantValue` is the configured value as display text.
struct ConstantValue;

impl DataEnricher for ConstantValue {
    fn node_type(&self) -> &str {
        "constant"
    }

    fn enrich(&self, data: &mut Map<String, Value>) {
        let key = match data.get("valueType").and_then(Value::as_str) {
            Some("number") => "numberValue",
            Some("string") => "stringValue",
            Some("boolean") => "booleanValue",
            Some("json") => "jsonValue",
            _ => return,
        };
        let text = match data.get(key) {
            None | Some(Value::Null) => return,
            Some(value) => coerce_to_string(value),
        };
        data.insert("_constantValue".to_string(), Value::String(text));
    }
}

/// Tag nodes without a `connectionName`: derive one from a built-in `source`.
struct TagConnectionName(&'static str);

impl DataEnricher for TagConnectionName {
    fn node_type(&self) -> &str {
        self.0
    }

    fn enrich(&self, data: &mut Map<String, Value>) {
        let has_name = data
            .get("connectionName")
            .and_then(Value::as_str)
            .is_some_and(|name| !name.is_empty());
        if has_name {
            return;
        }
        let name = match data.get("source").and_then(Value::as_str) {
            Some("internal") => "Internal",
            Some("system") => "System",
            Some("connectivity") => "Connectivity",
            _ => return,
        };
        data.insert("connectionName".to_string(), Value::from(name));
    }
}

/// `comparison` nodes: `_displayOperation` reads like `In1 >= In2`.
struct ComparisonOperation;

impl DataEnricher for ComparisonOperation {
    fn node_type(&self) -> &str {
        "comparison"
    }

    fn enrich(&self, data: &mut Map<String, Value>) {
        let Some(operation) = data.get("operation").and_then(Value::as_str) else {
            return;
        };
        let display = format!("In1 {} In2", operation_symbol(operation));
        data.insert("_displayOperation".to_string(), Value::String(display));
    }
}

/// Maps operation names to their symbol; symbols and unknown names pass through.
pub fn operation_symbol(operation: &str) -> &str {
    match operation {
        "eq" | "equal" | "equals" => "==",
        "neq" | "ne" | "notEqual" | "not_equal" => "!=",
        "gt" | "greaterThan" | "greater_than" => ">",
        "gte" | "ge" | "greaterThanOrEqual" | "greater_than_or_equal" => ">=",
        "lt" | "lessThan" | "less_than" => "<",
        "lte" | "le" | "lessThanOrEqual" | "less_than_or_equal" => "<=",
        other => other,
    }
}
