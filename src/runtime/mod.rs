//! Runtime data binding.
//!
//! A node's template scope carries a `runtime` record. It comes from one of
//! two places: data pinned on the node record (`data.runtime`), which always
//! wins, or the latest result of the node's poll loop. The poll loop only runs
//! while the node is executing and its visual definition enables runtime data.

use crate::config::PollingConfig;
use crate::error::FetchError;
use crate::scope::Scope;
use crate::template::resolve_template;
use crate::visual::{ExecutionStatus, NodeData, RuntimeDef};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;

pub mod enrich;
pub mod live;
mod poller;

pub use enrich::{DataEnricher, EnricherRegistry};
pub use live::{attach_live_values, input_live_value, live_label, output_live_value};
pub use poller::next_delay;

use poller::{PollHandle, PollTask};

/// Live values for a node: `{ inputs?, outputs?, ...namedFields }`.
pub type RuntimeData = Map<String, Value>;

/// Fetches live runtime values for a node.
#[async_trait]
pub trait RuntimeDataSource: Send + Sync {
    /// `endpoint` already has `{{nodeId}}` substituted.
    async fn fetch(
        &self,
        node_id: &str,
        endpoint: &str,
        fields: &[String],
    ) -> Result<RuntimeData, FetchError>;
}

/// Picks the runtime record for a render: pinned data wins over polled data.
pub fn select_runtime(data: &Map<String, Value>, polled: Option<&RuntimeData>) -> RuntimeData {
    NodeData(data)
        .pinned_runtime()
        .or(polled)
        .cloned()
        .unwrap_or_default()
}

/// Builds the scope for one render pass: `{ ...data, runtime, executionOrder }`.
pub fn assemble_scope(
    enhanced_data: Map<String, Value>,
    runtime: RuntimeData,
    execution_order: Option<i64>,
) -> Scope {
    let mut fields = enhanced_data;
    fields.insert("runtime".to_string(), Value::Object(runtime));
    fields.insert(
        "executionOrder".to_string(),
        execution_order.map(Value::from).unwrap_or(Value::Null),
    );
    Scope::new(fields)
}

/// Whether a node in this state should be polling.
pub fn should_poll(status: ExecutionStatus, runtime: Option<&RuntimeDef>) -> bool {
    status == ExecutionStatus::Running && runtime.is_some_and(|def| def.enabled)
}

/// The latest accepted poll result, tagged with the poll generation and request id.
#[derive(Debug, Clone, Default)]
pub struct PolledSlot {
    pub generation: u64,
    pub seq: u64,
    pub data: Option<RuntimeData>,
}

/// Poll state of a node's binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderState {
    Idle,
    Polling,
}

/// Per-node owner of the poll loop and the latest polled runtime data.
///
/// Call [`RuntimeBinder::observe`] on every render pass; it starts or stops the
/// poll loop as the node's execution state changes. Dropping the binder tears
/// the loop down.
pub struct RuntimeBinder {
    node_id: String,
    source: Arc<dyn RuntimeDataSource>,
    config: PollingConfig,
    slot: Arc<watch::Sender<PolledSlot>>,
    active: Option<(RuntimeDef, PollHandle)>,
}

impl RuntimeBinder {
    pub fn new(node_id: &str, source: Arc<dyn RuntimeDataSource>, config: PollingConfig) -> Self {
        let (slot, _) = watch::channel(PolledSlot::default());
        Self {
            node_id: node_id.to_string(),
            source,
            config,
            slot: Arc::new(slot),
            active: None,
        }
    }

    pub fn state(&self) -> BinderState {
        if self.active.is_some() {
            BinderState::Polling
        } else {
            BinderState::Idle
        }
    }

    /// Applies the state transition for the node's current data.
    ///
    /// Starting a poll loop requires a Tokio runtime; without one the binder
    /// stays idle and logs a warning.
    pub fn observe(&mut self, data: &Map<String, Value>, runtime: Option<&RuntimeDef>) {
        let status = NodeData(data).execution_status();
        let wanted = runtime.filter(|_| should_poll(status, runtime));

        let unchanged = match (wanted, &self.active) {
            (Some(def), Some((active_def, _))) => def == active_def,
            _ => false,
        };
        if unchanged {
            return;
        }

        match wanted {
            Some(def) => {
                self.stop();
                self.start(def.clone());
            }
            None if self.active.is_some() => {
                tracing::debug!(node_id = %self.node_id, %status, "leaving polling state");
                self.stop();
            }
            None => {}
        }
    }

    /// The latest polled data, if any poll has succeeded.
    pub fn polled(&self) -> Option<RuntimeData> {
        self.slot.borrow().data.clone()
    }

    /// The runtime record for a render: pinned data or the latest poll, else `{}`.
    pub fn runtime_for(&self, data: &Map<String, Value>) -> RuntimeData {
        select_runtime(data, self.slot.borrow().data.as_ref())
    }

    /// Notifies when a new poll result is accepted.
    pub fn subscribe(&self) -> watch::Receiver<PolledSlot> {
        self.slot.subscribe()
    }

    /// Stops polling and forgets polled data.
    pub fn teardown(&mut self) {
        self.stop();
        self.slot.send_if_modified(|slot| {
            slot.data = None;
            false
        });
    }

    fn start(&mut self, def: RuntimeDef) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(node_id = %self.node_id, "no async runtime available; runtime polling disabled");
            return;
        };

        let generation = self.slot.borrow().generation;
        let endpoint = resolve_template(
            &def.endpoint,
            &Scope::new(Map::from_iter([(
                "nodeId".to_string(),
                Value::String(self.node_id.clone()),
            )])),
        );
        let task = PollTask {
            node_id: self.node_id.clone(),
            endpoint,
            fields: def.fields.clone(),
            interval: self.config.interval(def.update_interval),
            policy: self.config.clone(),
            source: Arc::clone(&self.source),
            slot: Arc::clone(&self.slot),
            generation,
        };
        tracing::debug!(
            node_id = %self.node_id,
            endpoint = %task.endpoint,
            interval_ms = task.interval.as_millis() as u64,
            "entering polling state"
        );
        self.active = Some((def, PollHandle::spawn(&handle, task)));
    }

    fn stop(&mut self) {
        if self.active.take().is_some() {
            // Responses still in flight belong to the old generation and are discarded.
            self.slot.send_if_modified(|slot| {
                slot.generation += 1;
                slot.seq = 0;
                false
            });
        }
    }
}

impl Drop for RuntimeBinder {
    fn drop(&mut self) {
        self.stop();
    }
}
