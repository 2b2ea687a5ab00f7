use super::{PolledSlot, RuntimeDataSource};
use crate::config::PollingConfig;
use crate::error::FetchError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// One node's poll loop.
pub(super) struct PollTask {
    pub(super) node_id: String,
    pub(super) endpoint: String,
    pub(super) fields: Vec<String>,
    pub(super) interval: Duration,
    pub(super) policy: PollingConfig,
    pub(super) source: Arc<dyn RuntimeDataSource>,
    pub(super) slot: Arc<watch::Sender<PolledSlot>>,
    pub(super) generation: u64,
}

impl PollTask {
    /// Fetches, commits, waits; forever. Only one request is in flight at a time.
    async fn run(self) {
        let timeout = self.interval * self.policy.timeout_factor;
        let mut seq: u64 = 0;
        let mut failures: u32 = 0;

        loop {
            let started = Instant::now();
            seq += 1;

            let fetch = self.source.fetch(&self.node_id, &self.endpoint, &self.fields);
            match tokio::time::timeout(timeout, fetch).await {
                Ok(Ok(data)) => {
                    failures = 0;
                    if !self.commit(seq, data) {
                        tracing::debug!(node_id = %self.node_id, seq, "discarding stale runtime response");
                    }
                }
                Ok(Err(error)) => {
                    failures += 1;
                    tracing::warn!(node_id = %self.node_id, seq, failures, %error, "runtime fetch failed");
                }
                Err(_) => {
                    failures += 1;
                    let error = FetchError::Timeout {
                        endpoint: self.endpoint.clone(),
                        millis: timeout.as_millis() as u64,
                    };
                    tracing::warn!(node_id = %self.node_id, seq, failures, %error, "runtime fetch failed");
                }
            }

            let delay = next_delay(self.interval, failures, &self.policy);
            tokio::time::sleep_until(started + delay).await;
        }
    }

    /// Stores a response unless a newer request or a newer poll generation already won.
    fn commit(&self, seq: u64, data: super::RuntimeData) -> bool {
        self.slot.send_if_modified(|slot| {
            if slot.generation != self.generation || seq <= slot.seq && slot.data.is_some() {
                return false;
            }
            slot.seq = seq;
            slot.data = Some(data);
            true
        })
    }
}

/// The wait before the next poll tick after `failures` consecutive failures.
///
/// Below the failure threshold this is the configured interval. From the
/// threshold on the loop runs at half rate, doubling with every further
/// failure, capped at the configured maximum (but never faster than the
/// normal interval).
pub fn next_delay(interval: Duration, failures: u32, policy: &PollingConfig) -> Duration {
    if failures < policy.failure_threshold {
        return interval;
    }
    let exponent = (failures - policy.failure_threshold).min(16);
    let backoff = interval.saturating_mul(2u32 << exponent);
    backoff.min(policy.max_backoff()).max(interval)
}

/// Owns a spawned poll loop; dropping it aborts the loop.
pub(super) struct PollHandle {
    join: JoinHandle<()>,
}

impl PollHandle {
    pub(super) fn spawn(runtime: &tokio::runtime::Handle, task: PollTask) -> Self {
        Self {
            join: runtime.spawn(task.run()),
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.join.abort();
    }
}
