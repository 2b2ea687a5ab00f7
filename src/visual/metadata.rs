use super::VisualDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Catalog entry describing a node type.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    pub color: Option<String>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<IoDef>,
    #[serde(default)]
    pub outputs: Vec<IoDef>,
    /// Parameter-driven I/O rules, interpreted by an [`IoRulesEngine`](crate::rules::IoRulesEngine).
    #[serde(default)]
    pub io_rules: Vec<Value>,
    pub visual: Option<VisualDefinition>,
}

/// One input or output of a node.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IoDef {
    #[serde(rename = "type")]
    pub io_type: Option<IoType>,
    pub display_name: Option<String>,
}

impl IoDef {
    pub fn new(io_type: IoType, display_name: Option<&str>) -> Self {
        Self {
            io_type: Some(io_type),
            display_name: display_name.map(str::to_string),
        }
    }
}

/// The data type carried by a handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum IoType {
    Boolean,
    Number,
    String,
    Json,
    Trigger,
    Main,
    Any,
    Other(String),
}

impl IoType {
    /// Handle colour for this type. Unlisted types share the neutral grey.
    pub fn color(&self) -> &'static str {
        match self {
            IoType::Boolean => "#2196F3",
            IoType::Number => "#4CAF50",
            IoType::String => "#FF9800",
            IoType::Json => "#9C27B0",
            IoType::Trigger => "#F44336",
            IoType::Main | IoType::Any | IoType::Other(_) => "#757575",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            IoType::Boolean => "boolean",
            IoType::Number => "number",
            IoType::String => "string",
            IoType::Json => "json",
            IoType::Trigger => "trigger",
            IoType::Main => "main",
            IoType::Any => "any",
            IoType::Other(name) => name,
        }
    }
}

impl From<&str> for IoType {
    fn from(value: &str) -> Self {
        match value {
            "boolean" => IoType::Boolean,
            "number" => IoType::Number,
            "string" => IoType::String,
            "json" => IoType::Json,
            "trigger" => IoType::Trigger,
            "main" => IoType::Main,
            "any" => IoType::Any,
            other => IoType::Other(other.to_string()),
        }
    }
}

impl From<String> for IoType {
    fn from(value: String) -> Self {
        IoType::from(value.as_str())
    }
}

impl From<IoType> for String {
    fn from(value: IoType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
