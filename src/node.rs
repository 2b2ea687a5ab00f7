//! The public rendering boundary.
//!
//! [`NodeRenderer::render`] turns a node instance into a [`RenderedNode`]. It
//! never fails: every fault is recovered at the smallest unit it affects (one
//! block, one handle side, one poll tick) and logged.

use crate::blocks::{BlockRegistry, BlockRenderer, RenderedBlock};
use crate::canvas::{CanvasGeometry, canvas_config};
use crate::catalog::NodeMetadataCatalog;
use crate::config::EngineConfig;
use crate::diagnostics::WarnOnce;
use crate::handles::{HandleGenerator, HandleLayout};
use crate::layout::LayoutEngine;
use crate::rules::{ConditionalIoRules, IoRulesEngine};
use crate::runtime::{
    DataEnricher, EnricherRegistry, RuntimeBinder, RuntimeData, RuntimeDataSource,
    attach_live_values, select_runtime,
};
use crate::visual::{
    BadgeOffset, CanvasDef, ExecutionStatus, NodeInstance, NodeMetadata, StatusBadgeDef, StatusDef,
};
use serde::Serialize;
use std::sync::Arc;

/// Everything the graph canvas needs to draw one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub geometry: CanvasGeometry,
    pub handles: HandleLayout,
    pub status_badges: StatusBadges,
    pub blocks: Vec<RenderedBlock>,
}

/// Where a status badge sits on the node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgePlacement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<BadgeOffset>,
}

impl BadgePlacement {
    fn from_def(def: Option<&StatusBadgeDef>) -> Option<Self> {
        match def {
            Some(def) if !def.is_enabled() => None,
            Some(def) => Some(Self {
                position: def.position.clone(),
                offset: def.offset,
            }),
            None => Some(Self::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionBadge {
    pub status: ExecutionStatus,
    #[serde(flatten)]
    pub placement: BadgePlacement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOrderBadge {
    pub order: i64,
    #[serde(flatten)]
    pub placement: BadgePlacement,
}

/// Status overlays drawn on top of the node body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBadges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionBadge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<BadgePlacement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_order: Option<ExecutionOrderBadge>,
    /// Set when the node's I/O rules failed and static handles are shown instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_rules: Option<String>,
}

impl StatusBadges {
    fn collect(status: &StatusDef, node: &NodeInstance, io_rules: Option<String>) -> Self {
        let data = node.view();
        let execution_status = data.execution_status();

        let execution = (execution_status != ExecutionStatus::Idle)
            .then(|| BadgePlacement::from_def(status.execution.as_ref()))
            .flatten()
            .map(|placement| ExecutionBadge {
                status: execution_status,
                placement,
            });
        let pinned = (data.has_pinned_data() || data.pinned_runtime().is_some())
            .then(|| BadgePlacement::from_def(status.pinned.as_ref()))
            .flatten();
        let execution_order = data.execution_order().and_then(|order| {
            BadgePlacement::from_def(status.execution_order.as_ref())
                .map(|placement| ExecutionOrderBadge { order, placement })
        });

        Self {
            execution,
            pinned,
            execution_order,
            io_rules,
        }
    }
}

/// Renders node instances using a metadata catalog.
pub struct NodeRenderer {
    catalog: Box<dyn NodeMetadataCatalog>,
    layout: LayoutEngine,
    enrichers: EnricherRegistry,
    io_rules: Box<dyn IoRulesEngine>,
    config: EngineConfig,
    diagnostics: WarnOnce,
}

pub struct NodeRendererBuilder {
    catalog: Box<dyn NodeMetadataCatalog>,
    registry: BlockRegistry,
    enrichers: EnricherRegistry,
    io_rules: Box<dyn IoRulesEngine>,
    config: EngineConfig,
}

impl NodeRendererBuilder {
    pub fn new(catalog: impl NodeMetadataCatalog + 'static) -> Self {
        Self {
            catalog: Box::new(catalog),
            registry: BlockRegistry::with_defaults(),
            enrichers: EnricherRegistry::with_defaults(),
            io_rules: Box::new(ConditionalIoRules),
            config: EngineConfig::default(),
        }
    }

    pub fn with_block_renderer(mut self, renderer: Box<dyn BlockRenderer>) -> Self {
        self.registry.register(renderer);
        self
    }

    /// Renders `alias` blocks with the built-in renderer named `builtin`.
    pub fn with_block_alias(mut self, alias: &str, builtin: &str) -> Self {
        if !self.registry.alias(alias, builtin) {
            tracing::warn!(alias, builtin, "no built-in block renderer to alias");
        }
        self
    }

    pub fn with_enricher(mut self, enricher: Box<dyn DataEnricher>) -> Self {
        self.enrichers.register(enricher);
        self
    }

    pub fn with_enrichers(mut self, enrichers: EnricherRegistry) -> Self {
        self.enrichers = enrichers;
        self
    }

    pub fn with_io_rules(mut self, engine: impl IoRulesEngine + 'static) -> Self {
        self.io_rules = Box::new(engine);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> NodeRenderer {
        NodeRenderer {
            catalog: self.catalog,
            layout: LayoutEngine::new(self.registry),
            enrichers: self.enrichers,
            io_rules: self.io_rules,
            config: self.config,
            diagnostics: WarnOnce::new(),
        }
    }
}

impl NodeRenderer {
    pub fn builder(catalog: impl NodeMetadataCatalog + 'static) -> NodeRendererBuilder {
        NodeRendererBuilder::new(catalog)
    }

    pub fn new(catalog: impl NodeMetadataCatalog + 'static) -> Self {
        Self::builder(catalog).build()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metadata(&self, node_type: &str) -> Option<&NodeMetadata> {
        self.catalog.get(node_type)
    }

    /// Renders one pass of a node. `polled` is the latest poll result, if any;
    /// pinned runtime data on the node wins over it.
    pub fn render(&self, node: &NodeInstance, polled: Option<&RuntimeData>) -> RenderedNode {
        let fallback = NodeMetadata::default();
        let metadata = match self.catalog.get(&node.node_type) {
            Some(metadata) => metadata,
            None => {
                if self.diagnostics.first(&format!("unknown-type:{}", node.node_type)) {
                    tracing::warn!(node_type = %node.node_type, "node type not in catalog");
                }
                &fallback
            }
        };
        let visual = metadata.visual.as_ref();
        if visual.is_none_or(|v| v.layout.is_none())
            && self.diagnostics.first(&format!("no-layout:{}", node.node_type))
        {
            tracing::info!(node_type = %node.node_type, "node type has no visual layout");
        }

        let enhanced = self.enrichers.enhance(&node.node_type, &node.data);
        let generated = HandleGenerator::new(&*self.io_rules, &self.config.handles).generate(
            visual.and_then(|v| v.handles.as_ref()),
            metadata,
            &enhanced,
        );
        let mut handles = generated.layout;

        let runtime = select_runtime(&node.data, polled);
        if node.view().show_live_values() {
            attach_live_values(&mut handles, &runtime);
        }

        let default_canvas = CanvasDef::default();
        let geometry = canvas_config(
            visual.map_or(&default_canvas, |v| &v.canvas),
            handles.inputs.len(),
            handles.outputs.len(),
            &self.config.canvas,
        );

        let default_status = StatusDef::default();
        let status_badges = StatusBadges::collect(
            visual.map_or(&default_status, |v| &v.status),
            node,
            generated.rules_error.map(|e| e.to_string()),
        );

        let execution_order = node.view().execution_order();
        let blocks = self.layout.layout(visual, &enhanced, runtime, execution_order);
        tracing::debug!(node_id = %node.id, blocks = blocks.len(), "rendered node");

        RenderedNode {
            id: node.id.clone(),
            node_type: node.node_type.clone(),
            display_name: metadata.display_name.clone(),
            color: metadata.color.clone(),
            geometry,
            handles,
            status_badges,
            blocks,
        }
    }

    /// A poll binder for `node`, configured with this renderer's polling settings.
    pub fn binder(&self, node: &NodeInstance, source: Arc<dyn RuntimeDataSource>) -> RuntimeBinder {
        RuntimeBinder::new(&node.id, source, self.config.polling.clone())
    }

    /// Applies the binder's state transition for this pass, then renders with its latest poll.
    pub fn render_bound(&self, node: &NodeInstance, binder: &mut RuntimeBinder) -> RenderedNode {
        let runtime_def = self
            .catalog
            .get(&node.node_type)
            .and_then(|m| m.visual.as_ref())
            .and_then(|v| v.runtime.as_ref());
        binder.observe(&node.data, runtime_def);
        let polled = binder.polled();
        self.render(node, polled.as_ref())
    }
}
