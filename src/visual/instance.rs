use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A node placed in a flow, with its user-edited record.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInstance {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl NodeInstance {
    pub fn new(id: &str, node_type: &str, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.to_string(),
            node_type: node_type.to_string(),
            data,
        }
    }

    pub fn view(&self) -> NodeData<'_> {
        NodeData(&self.data)
    }
}

/// Execution state reported for a node by the flow runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Success,
    Error,
    #[default]
    Idle,
}

impl ExecutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Success => "success",
            ExecutionStatus::Error => "error",
            ExecutionStatus::Idle => "idle",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed accessors for the reserved keys of a node's data record.
#[derive(Debug, Clone, Copy)]
pub struct NodeData<'a>(pub &'a Map<String, Value>);

impl<'a> NodeData<'a> {
    /// Unknown or missing statuses read as idle.
    pub fn execution_status(&self) -> ExecutionStatus {
        match self.0.get("executionStatus").and_then(Value::as_str) {
            Some("running") => ExecutionStatus::Running,
            Some("success") => ExecutionStatus::Success,
            Some("error") => ExecutionStatus::Error,
            _ => ExecutionStatus::Idle,
        }
    }

    pub fn execution_order(&self) -> Option<i64> {
        self.0.get("executionOrder").and_then(Value::as_i64)
    }

    /// The pinned runtime override, if present and non-empty.
    pub fn pinned_runtime(&self) -> Option<&'a Map<String, Value>> {
        self.0
            .get("runtime")
            .and_then(Value::as_object)
            .filter(|runtime| !runtime.is_empty())
    }

    pub fn has_pinned_data(&self) -> bool {
        match self.0.get("pinnedData") {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }

    pub fn show_live_values(&self) -> bool {
        self.0
            .get("_showLiveValues")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.0.get(key).and_then(Value::as_str)
    }
}
