//! Input/output handle generation.
//!
//! Handles are derived in three steps: pick the effective I/O definitions
//! (rules engine or static fallback), pair them with the visual handle
//! configuration (or auto-generate one), then resolve type, colour, label,
//! position and visibility for each pair.

use crate::config::HandleConfig;
use crate::error::IoRulesError;
use crate::rules::IoRulesEngine;
use crate::visual::{HandleColor, HandleDef, HandlePosition, HandlesDef, IoDef, IoType, NodeMetadata};
use ahash::AHashSet;
use serde::Serialize;
use serde_json::{Map, Value};

/// Which side of the node a handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// Prefix of the persisted handle id. Stored edges depend on it.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }

    fn default_label(self, index: usize) -> String {
        match self {
            Direction::Input => format!("Input {}", index + 1),
            Direction::Output => format!("Output {}", index + 1),
        }
    }
}

/// The stable edge-attachment id of a handle, e.g. `input-0`.
pub fn handle_id(direction: Direction, index: usize) -> String {
    format!("{}-{}", direction.id_prefix(), index)
}

/// A fully resolved handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedHandle {
    pub id: String,
    pub index: usize,
    pub direction: Direction,
    #[serde(rename = "type")]
    pub io_type: IoType,
    pub display_name: String,
    pub color: String,
    pub position: HandlePosition,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_value: Option<String>,
}

/// All handles of a node plus their shared styling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleLayout {
    pub inputs: Vec<ResolvedHandle>,
    pub outputs: Vec<ResolvedHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

/// Handle layout together with a rules failure that forced the static fallback.
#[derive(Debug, Clone)]
pub struct GeneratedHandles {
    pub layout: HandleLayout,
    pub rules_error: Option<IoRulesError>,
}

/// Derives handle layouts for nodes.
pub struct HandleGenerator<'a> {
    rules: &'a dyn IoRulesEngine,
    config: &'a HandleConfig,
}

impl<'a> HandleGenerator<'a> {
    pub fn new(rules: &'a dyn IoRulesEngine, config: &'a HandleConfig) -> Self {
        Self { rules, config }
    }

    pub fn generate(
        &self,
        visual_handles: Option<&HandlesDef>,
        metadata: &NodeMetadata,
        data: &Map<String, Value>,
    ) -> GeneratedHandles {
        let (inputs, outputs, rules_error) = self.effective_io(metadata, data);

        let layout = HandleLayout {
            inputs: self.resolve_side(
                Direction::Input,
                visual_handles.and_then(|h| h.inputs.as_deref()),
                &inputs,
                self.config.max_supported_inputs,
            ),
            outputs: self.resolve_side(
                Direction::Output,
                visual_handles.and_then(|h| h.outputs.as_deref()),
                &outputs,
                self.config.max_supported_outputs,
            ),
            size: visual_handles.and_then(|h| h.size),
            border_width: visual_handles.and_then(|h| h.border_width),
            border_color: visual_handles.and_then(|h| h.border_color.clone()),
        };
        GeneratedHandles {
            layout,
            rules_error,
        }
    }

    /// Step 1: rules output where available, static definitions otherwise.
    fn effective_io(
        &self,
        metadata: &NodeMetadata,
        data: &Map<String, Value>,
    ) -> (Vec<IoDef>, Vec<IoDef>, Option<IoRulesError>) {
        if metadata.io_rules.is_empty() {
            return (metadata.inputs.clone(), metadata.outputs.clone(), None);
        }

        match self.rules.evaluate(&metadata.io_rules, data) {
            Ok(Some(io)) => (
                io.inputs.unwrap_or_else(|| metadata.inputs.clone()),
                io.outputs.unwrap_or_else(|| metadata.outputs.clone()),
                None,
            ),
            Ok(None) => (metadata.inputs.clone(), metadata.outputs.clone(), None),
            Err(error) => {
                tracing::warn!(%error, "I/O rules failed; using static inputs and outputs");
                (metadata.inputs.clone(), metadata.outputs.clone(), Some(error))
            }
        }
    }

    /// Steps 2 and 3 for one side of the node.
    fn resolve_side(
        &self,
        direction: Direction,
        handle_defs: Option<&[HandleDef]>,
        effective: &[IoDef],
        max_supported: usize,
    ) -> Vec<ResolvedHandle> {
        let mut defs = match handle_defs {
            Some(defs) if !defs.is_empty() => Self::usable_defs(direction, defs, effective.len()),
            _ => (0..effective.len()).map(HandleDef::auto).collect(),
        };

        if defs.len() > max_supported {
            tracing::warn!(
                direction = direction.id_prefix(),
                count = defs.len(),
                max_supported,
                "too many handles; extra handles are dropped"
            );
            defs.truncate(max_supported);
        }

        let count = defs.len();
        defs.iter()
            .enumerate()
            .map(|(slot, def)| resolve_handle(direction, def, effective.get(def.index), slot, count))
            .collect()
    }

    /// Keeps authored handles that point at an existing definition, first occurrence wins.
    fn usable_defs(direction: Direction, defs: &[HandleDef], available: usize) -> Vec<HandleDef> {
        let mut seen = AHashSet::new();
        defs.iter()
            .filter(|def| {
                let usable = def.index < available && seen.insert(def.index);
                if !usable {
                    tracing::debug!(
                        handle = %handle_id(direction, def.index),
                        available,
                        "skipping handle without a matching I/O definition"
                    );
                }
                usable
            })
            .cloned()
            .collect()
    }
}

fn resolve_handle(
    direction: Direction,
    def: &HandleDef,
    io: Option<&IoDef>,
    slot: usize,
    count: usize,
) -> ResolvedHandle {
    let io_type = io
        .and_then(|io| io.io_type.clone())
        .unwrap_or(IoType::Main);
    let display_name = def
        .label
        .clone()
        .or_else(|| io.and_then(|io| io.display_name.clone()))
        .unwrap_or_else(|| direction.default_label(def.index));
    let color = match &def.color {
        HandleColor::Explicit(color) => color.clone(),
        HandleColor::Auto => io_type.color().to_string(),
    };

    ResolvedHandle {
        id: handle_id(direction, def.index),
        index: def.index,
        direction,
        io_type,
        display_name,
        color,
        position: auto_position(def.position, slot, count),
        visible: def.visible.unwrap_or(true),
        live_value: None,
    }
}

/// Explicit positions are kept; `auto` spreads handles evenly along the edge.
pub fn auto_position(position: HandlePosition, slot: usize, count: usize) -> HandlePosition {
    match position {
        HandlePosition::Percent(_) => position,
        HandlePosition::Auto if count <= 1 => HandlePosition::Percent(50.0),
        HandlePosition::Auto => {
            HandlePosition::Percent(100.0 / (count as f64 + 1.0) * (slot as f64 + 1.0))
        }
    }
}
