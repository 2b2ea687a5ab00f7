use super::Block;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A server-authored description of how a node looks.
///
/// Every section is optional in the JSON document; missing sections fall back
/// to engine defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualDefinition {
    #[serde(default)]
    pub canvas: CanvasDef,
    #[serde(default)]
    pub handles: Option<HandlesDef>,
    #[serde(default)]
    pub status: StatusDef,
    #[serde(default)]
    pub runtime: Option<RuntimeDef>,
    #[serde(default)]
    pub layout: Option<Vec<Block>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasDef {
    pub min_width: Option<f64>,
    pub min_height: Option<f64>,
    pub shape: Option<CanvasShape>,
    pub border_radius: Option<f64>,
    pub resizable: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CanvasShape {
    #[default]
    RoundedRect,
    Rect,
}

/// Unknown shapes fall back to the default instead of failing the definition.
impl<'de> Deserialize<'de> for CanvasShape {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            Some("rounded-rect") => CanvasShape::RoundedRect,
            Some("rect") => CanvasShape::Rect,
            _ => {
                tracing::warn!(shape = %raw, "unknown canvas shape; using rounded-rect");
                CanvasShape::default()
            }
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlesDef {
    pub inputs: Option<Vec<HandleDef>>,
    pub outputs: Option<Vec<HandleDef>>,
    pub size: Option<f64>,
    pub border_width: Option<f64>,
    pub border_color: Option<String>,
}

/// Visual configuration of one handle.
///
/// `index` addresses the effective I/O definition the handle represents and is
/// the persisted identity of the handle (`input-{index}` / `output-{index}`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleDef {
    pub index: usize,
    #[serde(default)]
    pub position: HandlePosition,
    #[serde(default)]
    pub color: HandleColor,
    pub label: Option<String>,
    pub visible: Option<bool>,
}

impl HandleDef {
    /// A handle with automatic position and colour.
    pub fn auto(index: usize) -> Self {
        Self {
            index,
            position: HandlePosition::Auto,
            color: HandleColor::Auto,
            label: None,
            visible: Some(true),
        }
    }
}

/// Vertical placement of a handle along the node edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum HandlePosition {
    #[default]
    Auto,
    /// Percentage of the node height, measured from the top.
    Percent(f64),
}

impl TryFrom<String> for HandlePosition {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed == "auto" {
            return Ok(HandlePosition::Auto);
        }
        trimmed
            .strip_suffix('%')
            .and_then(|n| n.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite())
            .map(HandlePosition::Percent)
            .ok_or_else(|| format!("invalid handle position '{}'", value))
    }
}

impl fmt::Display for HandlePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlePosition::Auto => write!(f, "auto"),
            HandlePosition::Percent(p) => write!(f, "{}%", p),
        }
    }
}

/// An unparsable position degrades to [`HandlePosition::Auto`] for that handle alone.
impl<'de> Deserialize<'de> for HandlePosition {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let parsed = match &raw {
            serde_json::Value::String(text) => HandlePosition::try_from(text.clone()),
            other => Err(format!("invalid handle position '{}'", other)),
        };
        Ok(parsed.unwrap_or_else(|error| {
            tracing::warn!(%error, "using auto handle position");
            HandlePosition::Auto
        }))
    }
}

impl Serialize for HandlePosition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Handle colour: either derived from the I/O type or an explicit CSS colour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum HandleColor {
    #[default]
    Auto,
    Explicit(String),
}

impl From<String> for HandleColor {
    fn from(value: String) -> Self {
        if value.trim() == "auto" {
            HandleColor::Auto
        } else {
            HandleColor::Explicit(value)
        }
    }
}

impl From<HandleColor> for String {
    fn from(value: HandleColor) -> Self {
        match value {
            HandleColor::Auto => "auto".to_string(),
            HandleColor::Explicit(color) => color,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDef {
    pub execution: Option<StatusBadgeDef>,
    pub pinned: Option<StatusBadgeDef>,
    pub execution_order: Option<StatusBadgeDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBadgeDef {
    pub enabled: Option<bool>,
    pub position: Option<String>,
    pub offset: Option<BadgeOffset>,
}

impl StatusBadgeDef {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct BadgeOffset {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Live-data polling configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeDef {
    #[serde(default)]
    pub enabled: bool,
    #[serde(alias = "updateInterval_ms", alias = "updateIntervalMs")]
    pub update_interval: Option<u64>,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub fields: Vec<String>,
}
