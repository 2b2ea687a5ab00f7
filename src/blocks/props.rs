//! Resolved prop records handed to block renderers.
//!
//! Every string here is final display text: templates are resolved and
//! formats applied. Renderers never see the scope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A size control passed through untouched: a pixel number or a CSS string.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Size {
    Px(f64),
    Css(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub badges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_size: Option<Size>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleProps {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Size>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuesLayout {
    Horizontal,
    #[default]
    Vertical,
}

/// One label/value row. `value` keeps its JSON type; `0`, `false` and `""` are real values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueItem {
    pub label: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesProps {
    pub items: Vec<ValueItem>,
    pub layout: ValuesLayout,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_width: Option<Size>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeItem {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgePosition {
    #[default]
    Inline,
    Stacked,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgesProps {
    pub items: Vec<BadgeItem>,
    pub position: BadgePosition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DividerProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thickness: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Size>,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_line_numbers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressProps {
    pub value: f64,
    pub max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_percentage: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTextProps {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
}

/// The typed prop record of a rendered block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockProps {
    Header(HeaderProps),
    Subtitle(SubtitleProps),
    Text(TextProps),
    Values(ValuesProps),
    Badges(BadgesProps),
    Divider(DividerProps),
    Code(CodeProps),
    Progress(ProgressProps),
    StatusText(StatusTextProps),
    /// Props of a block type registered by the embedding application.
    Custom(Map<String, Value>),
}

/// A block ready for the widget toolkit: its renderer key and resolved props.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub props: BlockProps,
}
