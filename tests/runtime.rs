//! Runtime binding: pinned data, the poll loop, live labels and computed fields.
mod common;
use common::*;
use katachi::runtime::{BinderState, EnricherRegistry};
use katachi::visual::RuntimeDef;
use katachi::config::PollingConfig;
use katachi::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;
use tokio::time::sleep;

/// The value shown by the sensor's `values` block, if the block rendered.
fn shown_value(rendered: &RenderedNode) -> Option<Value> {
    rendered.blocks.iter().find_map(|block| match &block.props {
        BlockProps::Values(values) => values.items.first().map(|item| item.value.clone()),
        _ => None,
    })
}

fn running(extra: Value) -> Value {
    let mut data = json!({ "executionStatus": "running" });
    if let (Some(target), Some(extra)) = (data.as_object_mut(), extra.as_object()) {
        target.extend(extra.clone());
    }
    data
}

fn reply(value: Value) -> Reply {
    Reply::Data {
        delay: Duration::ZERO,
        data: value,
    }
}

#[cfg(test)]
mod binder_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_s6_pinned_overrides_poll() {
        let renderer = NodeRenderer::new(sample_catalog());
        let source = Arc::new(ScriptedSource::new(vec![reply(json!({ "value": 1 }))]));
        let polled = node("s1", "sensor", running(json!({})));
        let mut binder = renderer.binder(&polled, source.clone());

        renderer.render_bound(&polled, &mut binder);
        assert_eq!(binder.state(), BinderState::Polling);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(shown_value(&renderer.render_bound(&polled, &mut binder)), Some(json!(1)));

        let pinned = node("s1", "sensor", running(json!({ "runtime": { "value": 2 } })));
        let rendered = renderer.render_bound(&pinned, &mut binder);
        assert_eq!(shown_value(&rendered), Some(json!(2)));
        assert!(rendered.status_badges.pinned.is_some());

        let rendered = renderer.render_bound(&polled, &mut binder);
        assert_eq!(shown_value(&rendered), Some(json!(1)));
        assert!(rendered.status_badges.pinned.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_endpoint_has_node_id_substituted() {
        let renderer = NodeRenderer::new(sample_catalog());
        let source = Arc::new(ScriptedSource::new(vec![reply(json!({ "value": 3 }))]));
        let instance = node("node-42", "sensor", running(json!({})));
        let mut binder = renderer.binder(&instance, source.clone());
        let mut updates = binder.subscribe();

        renderer.render_bound(&instance, &mut binder);
        tokio::time::timeout(Duration::from_secs(1), updates.changed())
            .await
            .expect("a poll result before the timeout")
            .expect("binder still alive");

        assert_eq!(updates.borrow().data, Some(data(json!({ "value": 3 }))));
        assert_eq!(source.endpoints.lock().unwrap()[0], "/api/nodes/node-42/runtime");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetches_never_overlap() {
        let slow = |value: i64| Reply::Data {
            delay: Duration::from_millis(2000),
            data: json!({ "value": value }),
        };
        let renderer = NodeRenderer::new(sample_catalog());
        let source = Arc::new(ScriptedSource::new(vec![slow(1), slow(2), slow(3)]));
        let instance = node("s1", "sensor", running(json!({})));
        let mut binder = renderer.binder(&instance, source.clone());

        renderer.render_bound(&instance, &mut binder);
        sleep(Duration::from_millis(3000)).await;
        // A 500 ms interval would have started six requests; each waits for the previous one.
        assert_eq!(source.calls(), 2);
        assert_eq!(binder.polled(), Some(data(json!({ "value": 1 }))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_after_leaving_polling_is_discarded() {
        let renderer = NodeRenderer::new(sample_catalog());
        let source = Arc::new(ScriptedSource::new(vec![Reply::Data {
            delay: Duration::from_millis(1000),
            data: json!({ "value": "late" }),
        }]));
        let instance = node("s1", "sensor", running(json!({})));
        let mut binder = renderer.binder(&instance, source.clone());

        renderer.render_bound(&instance, &mut binder);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(source.calls(), 1);

        let finished = node("s1", "sensor", json!({ "executionStatus": "success" }));
        renderer.render_bound(&finished, &mut binder);
        assert_eq!(binder.state(), BinderState::Idle);

        sleep(Duration::from_millis(2000)).await;
        assert_eq!(binder.polled(), None);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_back_off() {
        let renderer = NodeRenderer::new(sample_catalog());
        let source = Arc::new(FailingSource {
            calls: AtomicUsize::new(0),
        });
        let instance = node("s1", "sensor", running(json!({})));
        let mut binder = renderer.binder(&instance, source.clone());

        renderer.render_bound(&instance, &mut binder);
        // Requests at 0, 500 and 1000 ms, then 2000 and 4000 ms once backing off.
        sleep(Duration::from_millis(4500)).await;
        assert_eq!(source.calls.load(std::sync::atomic::Ordering::SeqCst), 5);
        assert_eq!(binder.polled(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_fetch_times_out_after_five_intervals() {
        let renderer = NodeRenderer::new(sample_catalog());
        let source = Arc::new(ScriptedSource::new(vec![
            reply(json!({ "value": 1 })),
            Reply::Data {
                delay: Duration::from_secs(10),
                data: json!({ "value": "hung" }),
            },
            reply(json!({ "value": 2 })),
        ]));
        let instance = node("s1", "sensor", running(json!({})));
        let mut binder = renderer.binder(&instance, source.clone());

        // Requests at 0 and 500 ms; the second one is abandoned at 500 + 5 * 500 ms.
        renderer.render_bound(&instance, &mut binder);
        sleep(Duration::from_millis(2900)).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(binder.polled(), Some(data(json!({ "value": 1 }))));

        sleep(Duration::from_millis(200)).await;
        assert_eq!(source.calls(), 3);
        assert_eq!(binder.polled(), Some(data(json!({ "value": 2 }))));

        // One failure is below the backoff threshold, so the normal rate resumes.
        sleep(Duration::from_millis(300)).await;
        assert_eq!(source.calls(), 3);
        sleep(Duration::from_millis(200)).await;
        assert_eq!(source.calls(), 4);
        assert_eq!(binder.polled(), Some(data(json!({ "value": 2 }))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_toward_backoff() {
        let renderer = NodeRenderer::new(sample_catalog());
        let source = Arc::new(ScriptedSource::new(vec![
            Reply::Data {
                delay: Duration::from_secs(10),
                data: json!({ "value": 5 }),
            },
            Reply::Fail,
            Reply::Fail,
        ]));
        let instance = node("s1", "sensor", running(json!({})));
        let mut binder = renderer.binder(&instance, source.clone());

        // Timeout at 2500 ms, failures at 2500 and 3000 ms: three in a row, so the
        // next request waits a doubled interval and starts at 4000 ms.
        renderer.render_bound(&instance, &mut binder);
        sleep(Duration::from_millis(3700)).await;
        assert_eq!(source.calls(), 3);
        assert_eq!(binder.polled(), None);

        sleep(Duration::from_millis(400)).await;
        assert_eq!(source.calls(), 4);
        assert_eq!(binder.polled(), Some(data(json!({ "value": 5 }))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_keeps_previous_value() {
        let renderer = NodeRenderer::new(sample_catalog());
        let source = Arc::new(ScriptedSource::new(vec![
            reply(json!({ "value": 1 })),
            Reply::Fail,
            Reply::Fail,
        ]));
        let instance = node("s1", "sensor", running(json!({})));
        let mut binder = renderer.binder(&instance, source.clone());

        renderer.render_bound(&instance, &mut binder);
        sleep(Duration::from_millis(1200)).await;
        assert_eq!(source.calls(), 3);
        assert_eq!(shown_value(&renderer.render_bound(&instance, &mut binder)), Some(json!(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_keeps_last_value_until_teardown() {
        let renderer = NodeRenderer::new(sample_catalog());
        let source = Arc::new(ScriptedSource::new(vec![reply(json!({ "value": 5 }))]));
        let instance = node("s1", "sensor", running(json!({})));
        let mut binder = renderer.binder(&instance, source.clone());

        renderer.render_bound(&instance, &mut binder);
        sleep(Duration::from_millis(100)).await;

        let done = node("s1", "sensor", json!({ "executionStatus": "success" }));
        let rendered = renderer.render_bound(&done, &mut binder);
        assert_eq!(binder.state(), BinderState::Idle);
        assert_eq!(shown_value(&rendered), Some(json!(5)));

        let calls = source.calls();
        sleep(Duration::from_millis(2000)).await;
        assert_eq!(source.calls(), calls);

        binder.teardown();
        assert_eq!(binder.polled(), None);
        assert_eq!(shown_value(&renderer.render_bound(&done, &mut binder)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_accepts_new_results() {
        let renderer = NodeRenderer::new(sample_catalog());
        let source = Arc::new(ScriptedSource::new(vec![
            reply(json!({ "value": 1 })),
            reply(json!({ "value": 2 })),
            reply(json!({ "value": 3 })),
        ]));
        let instance = node("s1", "sensor", running(json!({})));
        let done = node("s1", "sensor", json!({ "executionStatus": "success" }));
        let mut binder = renderer.binder(&instance, source.clone());

        renderer.render_bound(&instance, &mut binder);
        sleep(Duration::from_millis(700)).await;
        assert_eq!(binder.polled(), Some(data(json!({ "value": 2 }))));

        renderer.render_bound(&done, &mut binder);
        renderer.render_bound(&instance, &mut binder);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(binder.polled(), Some(data(json!({ "value": 3 }))));
    }

    #[test]
    fn test_no_async_runtime_stays_idle() {
        let source = Arc::new(FailingSource {
            calls: AtomicUsize::new(0),
        });
        let mut binder = RuntimeBinder::new("s1", source, PollingConfig::default());
        let def = RuntimeDef {
            enabled: true,
            ..RuntimeDef::default()
        };
        binder.observe(&data(json!({ "executionStatus": "running" })), Some(&def));
        assert_eq!(binder.state(), BinderState::Idle);
    }

    #[test]
    fn test_scripted_source_replies() {
        let source = ScriptedSource::new(vec![Reply::Fail, reply(json!({ "value": 1 }))]);
        let first = tokio_test::block_on(source.fetch("n", "/e", &[]));
        tokio_test::assert_err!(first);
        let second = tokio_test::block_on(source.fetch("n", "/e", &[]));
        assert_eq!(tokio_test::assert_ok!(second), data(json!({ "value": 1 })));
    }
}

#[cfg(test)]
mod live_value_tests {
    use super::*;

    #[test]
    fn test_live_labels_follow_fallback_order() {
        let renderer = NodeRenderer::new(sample_catalog());
        let instance = node(
            "s1",
            "sensor",
            json!({
                "_showLiveValues": true,
                "runtime": {
                    "inputs": { "input-0": 5 },
                    "input_0": "shadowed",
                    "input_1": { "value": "x", "quality": "good" },
                    "output0": null,
                    "result": 9.5
                }
            }),
        );
        let rendered = renderer.render(&instance, None);
        let inputs: Vec<Option<&str>> = rendered
            .handles
            .inputs
            .iter()
            .map(|h| h.live_value.as_deref())
            .collect();
        assert_eq!(inputs, vec![Some("5"), Some("x"), None]);
        assert_eq!(rendered.handles.outputs[0].live_value.as_deref(), Some("9.5"));
    }

    #[test]
    fn test_live_labels_are_opt_in() {
        let renderer = NodeRenderer::new(sample_catalog());
        let instance = node("s1", "sensor", json!({ "runtime": { "value": 1 } }));
        let rendered = renderer.render(&instance, None);
        assert!(rendered.handles.outputs[0].live_value.is_none());
    }
}

#[cfg(test)]
mod enrichment_tests {
    use super::*;

    const CATALOG: &str = r#"{
        "constant": { "visual": { "layout": [{ "type": "text", "content": "{{_constantValue}}" }] } },
        "comparison": { "visual": { "layout": [{ "type": "subtitle", "text": "{{_displayOperation}}" }] } },
        "tag-input": { "visual": { "layout": [{ "type": "text", "content": "{{connectionName}}" }] } }
    }"#;

    fn first_text(rendered: &RenderedNode) -> Option<String> {
        rendered.blocks.first().and_then(|block| match &block.props {
            BlockProps::Text(text) => Some(text.content.clone()),
            BlockProps::Subtitle(subtitle) => Some(subtitle.text.clone()),
            _ => None,
        })
    }

    #[test]
    fn test_builtin_computed_fields() {
        let renderer = NodeRenderer::new(MemoryCatalog::from_json(CATALOG).unwrap());

        let constant = node("c1", "constant", json!({ "valueType": "boolean", "booleanValue": false }));
        assert_eq!(first_text(&renderer.render(&constant, None)).as_deref(), Some("false"));

        let comparison = node("c2", "comparison", json!({ "operation": "gte" }));
        assert_eq!(
            first_text(&renderer.render(&comparison, None)).as_deref(),
            Some("In1 >= In2")
        );

        let tag = node("t1", "tag-input", json!({ "source": "system" }));
        assert_eq!(first_text(&renderer.render(&tag, None)).as_deref(), Some("System"));
        // The node record itself is left untouched.
        assert!(!tag.data.contains_key("connectionName"));
    }

    #[test]
    fn test_enrichers_can_be_replaced() {
        struct Shout;
        impl DataEnricher for Shout {
            fn node_type(&self) -> &str {
                "constant"
            }
            fn enrich(&self, data: &mut serde_json::Map<String, Value>) {
                data.insert("_constantValue".to_string(), json!("LOUD"));
            }
        }

        let renderer = NodeRenderer::builder(MemoryCatalog::from_json(CATALOG).unwrap())
            .with_enrichers(EnricherRegistry::empty())
            .with_enricher(Box::new(Shout))
            .build();
        let constant = node("c1", "constant", json!({ "valueType": "number", "numberValue": 4 }));
        assert_eq!(first_text(&renderer.render(&constant, None)).as_deref(), Some("LOUD"));
    }
}
