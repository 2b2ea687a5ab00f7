//! Common test utilities for building catalogs, nodes and runtime sources.
use async_trait::async_trait;
use katachi::prelude::*;
use serde_json::{Map, Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Turns a JSON object literal into a data map. Non-objects give an empty map.
#[allow(dead_code)]
pub fn data(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[allow(dead_code)]
pub fn scope(value: Value) -> Scope {
    Scope::from_value(value)
}

#[allow(dead_code)]
pub fn visual(value: Value) -> VisualDefinition {
    serde_json::from_value(value).expect("valid visual definition")
}

/// A catalog with the node types used across the integration tests.
///
/// - `sensor`: three typed inputs, one output, polling enabled every 500 ms.
/// - `adder`: an input count parameter drives its inputs via I/O rules.
/// - `broken-rules`: I/O rules that cannot be evaluated.
#[allow(dead_code)]
pub fn sample_catalog() -> MemoryCatalog {
    MemoryCatalog::from_json(SAMPLE_CATALOG_JSON).expect("valid sample catalog")
}

#[allow(dead_code)]
pub const SAMPLE_CATALOG_JSON: &str = r##"{
    "sensor": {
        "displayName": "Sensor",
        "color": "#00897B",
        "inputs": [{ "type": "number" }, { "type": "string" }, { "type": "boolean" }],
        "outputs": [{ "type": "number", "displayName": "Reading" }],
        "visual": {
            "canvas": { "minWidth": 200 },
            "runtime": {
                "enabled": true,
                "updateInterval_ms": 500,
                "endpoint": "/api/nodes/{{nodeId}}/runtime",
                "fields": ["value"]
            },
            "layout": [
                { "type": "header", "title": "Sensor {{name}}", "icon": "S", "color": "{{accent}}", "badges": ["executionOrder"] },
                { "type": "values", "items": [{ "label": "Value", "value": "{{runtime.value}}" }] },
                { "type": "status-text", "text": "failed", "visible": "{{executionStatus}} === \"error\"" }
            ]
        }
    },
    "adder": {
        "displayName": "Adder",
        "inputs": [{ "type": "number" }, { "type": "number" }],
        "outputs": [{ "type": "number", "displayName": "Sum" }],
        "ioRules": [
            { "when": "{{inputCount}} > 0", "repeatInputs": { "count": "{{inputCount}}", "type": "number", "displayName": "Term {{n}}" } }
        ],
        "visual": {
            "layout": [{ "type": "header", "title": "Adder" }]
        }
    },
    "broken-rules": {
        "inputs": [{ "type": "json" }],
        "ioRules": [{ "inputs": "not a list" }],
        "visual": { "layout": [] }
    }
}"##;

#[allow(dead_code)]
pub fn node(id: &str, node_type: &str, data: Value) -> NodeInstance {
    NodeInstance::new(id, node_type, data)
}

/// One scripted response of a [`ScriptedSource`].
#[allow(dead_code)]
pub enum Reply {
    Data { delay: Duration, data: Value },
    Fail,
}

/// A runtime source that plays back scripted replies, then repeats the last one.
#[allow(dead_code)]
pub struct ScriptedSource {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Value>>,
    pub calls: AtomicUsize,
    pub endpoints: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            endpoints: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuntimeDataSource for ScriptedSource {
    async fn fetch(
        &self,
        _node_id: &str,
        endpoint: &str,
        _fields: &[String],
    ) -> std::result::Result<RuntimeData, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.endpoints.lock().unwrap().push(endpoint.to_string());
        let reply = self.replies.lock().unwrap().pop_front();
        let (delay, data) = match reply {
            Some(Reply::Data { delay, data }) => {
                *self.last.lock().unwrap() = Some(data.clone());
                (delay, data)
            }
            Some(Reply::Fail) => {
                return Err(FetchError::Status {
                    endpoint: endpoint.to_string(),
                    status: 503,
                });
            }
            None => match self.last.lock().unwrap().clone() {
                Some(data) => (Duration::ZERO, data),
                None => (Duration::ZERO, json!({})),
            },
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(data.as_object().cloned().unwrap_or_default())
    }
}

/// A runtime source that always fails.
#[allow(dead_code)]
pub struct FailingSource {
    pub calls: AtomicUsize,
}

#[async_trait]
impl RuntimeDataSource for FailingSource {
    async fn fetch(
        &self,
        _node_id: &str,
        endpoint: &str,
        _fields: &[String],
    ) -> std::result::Result<RuntimeData, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FetchError::Transport {
            endpoint: endpoint.to_string(),
            message: "connection refused".to_string(),
        })
    }
}
