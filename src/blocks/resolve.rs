//! Turns a raw block definition plus a scope into renderer props.
//!
//! Template-capable props are resolved, colours follow the `#`-passthrough
//! rule, and size or style controls are carried over untouched. A resolver
//! returns `Ok(None)` when the block has nothing to show.

use super::props::*;
use crate::ast::parse_number;
use crate::error::BlockError;
use crate::format::format_value;
use crate::scope::Scope;
use crate::template::{coerce_to_string, resolve_template, resolve_typed};
use crate::visual::{Block, Condition};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(super) type Resolved = Result<Option<BlockProps>, BlockError>;

fn parse<T: DeserializeOwned>(block: &Block) -> Result<T, BlockError> {
    serde_json::from_value(Value::Object(block.props.clone())).map_err(|e| {
        BlockError::InvalidProps {
            block_type: block.block_type.clone(),
            message: e.to_string(),
        }
    })
}

/// Resolves a template-capable prop to display text. Absent and `null` stay absent.
fn text(value: Option<&Value>, scope: &Scope) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(template) => Some(resolve_template(template, scope)),
        other => Some(coerce_to_string(other)),
    }
}

/// Literal `#rgb` colours pass through; anything else may be a template.
fn color(value: Option<&String>, scope: &Scope) -> Option<String> {
    let value = value?;
    if value.starts_with('#') {
        Some(value.clone())
    } else {
        Some(resolve_template(value, scope))
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

fn is_shown(visible: Option<&Condition>, scope: &Scope) -> bool {
    visible.is_none_or(|condition| condition.evaluate(scope))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeaderDef {
    icon: Option<Value>,
    title: Option<Value>,
    color: Option<String>,
    #[serde(default)]
    badges: Vec<String>,
    font_size: Option<Size>,
    icon_size: Option<Size>,
}

pub(super) fn header(block: &Block, scope: &Scope) -> Resolved {
    let def: HeaderDef = parse(block)?;
    let Some(title) = non_empty(text(def.title.as_ref(), scope)) else {
        return Ok(None);
    };
    let execution_order = if def.badges.iter().any(|b| b == "executionOrder") {
        scope.get("executionOrder").and_then(Value::as_i64)
    } else {
        None
    };

    Ok(Some(BlockProps::Header(HeaderProps {
        icon: text(def.icon.as_ref(), scope),
        title,
        color: color(def.color.as_ref(), scope),
        badges: def.badges,
        execution_order,
        font_size: def.font_size,
        icon_size: def.icon_size,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubtitleDef {
    text: Option<Value>,
    color: Option<String>,
    font_size: Option<Size>,
    font_weight: Option<Value>,
}

pub(super) fn subtitle(block: &Block, scope: &Scope) -> Resolved {
    let def: SubtitleDef = parse(block)?;
    let Some(text) = non_empty(text(def.text.as_ref(), scope)) else {
        return Ok(None);
    };
    Ok(Some(BlockProps::Subtitle(SubtitleProps {
        text,
        color: color(def.color.as_ref(), scope),
        font_size: def.font_size,
        font_weight: def.font_weight,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextDef {
    content: Option<Value>,
    font_size: Option<Size>,
    font_weight: Option<Value>,
    color: Option<String>,
    align: Option<TextAlign>,
    padding: Option<Size>,
}

pub(super) fn text_block(block: &Block, scope: &Scope) -> Resolved {
    let def: TextDef = parse(block)?;
    let Some(content) = non_empty(text(def.content.as_ref(), scope)) else {
        return Ok(None);
    };
    Ok(Some(BlockProps::Text(TextProps {
        content,
        font_size: def.font_size,
        font_weight: def.font_weight,
        color: color(def.color.as_ref(), scope),
        align: def.align,
        padding: def.padding,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValuesDef {
    #[serde(default)]
    items: Vec<ValueItemDef>,
    #[serde(default)]
    layout: ValuesLayout,
    spacing: Option<Size>,
    label_width: Option<Size>,
}

#[derive(Deserialize)]
struct ValueItemDef {
    label: Option<Value>,
    #[serde(default)]
    value: Value,
    format: Option<String>,
    color: Option<String>,
    visible: Option<Condition>,
}

pub(super) fn values(block: &Block, scope: &Scope) -> Resolved {
    let def: ValuesDef = parse(block)?;
    let items: Vec<ValueItem> = def
        .items
        .iter()
        .filter(|item| is_shown(item.visible.as_ref(), scope))
        .filter_map(|item| {
            let resolved = resolve_typed(&item.value, scope);
            let value = match &item.format {
                Some(format) => format_value(&resolved, format),
                None => resolved,
            };
            if value.is_null() {
                return None;
            }
            Some(ValueItem {
                label: text(item.label.as_ref(), scope).unwrap_or_default(),
                value,
                color: color(item.color.as_ref(), scope),
            })
        })
        .collect();

    if items.is_empty() {
        return Ok(None);
    }
    Ok(Some(BlockProps::Values(ValuesProps {
        items,
        layout: def.layout,
        spacing: def.spacing,
        label_width: def.label_width,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BadgesDef {
    #[serde(default)]
    items: Vec<BadgeItemDef>,
    #[serde(default)]
    position: BadgePosition,
    spacing: Option<Size>,
    align: Option<TextAlign>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BadgeItemDef {
    text: Option<Value>,
    color: Option<String>,
    text_color: Option<String>,
    icon: Option<Value>,
    tooltip: Option<Value>,
    visible: Option<Condition>,
}

pub(super) fn badges(block: &Block, scope: &Scope) -> Resolved {
    let def: BadgesDef = parse(block)?;
    let items: Vec<BadgeItem> = def
        .items
        .iter()
        .filter(|item| is_shown(item.visible.as_ref(), scope))
        .map(|item| BadgeItem {
            text: text(item.text.as_ref(), scope).unwrap_or_default(),
            color: color(item.color.as_ref(), scope),
            text_color: color(item.text_color.as_ref(), scope),
            icon: text(item.icon.as_ref(), scope),
            tooltip: text(item.tooltip.as_ref(), scope),
        })
        .collect();

    if items.is_empty() {
        return Ok(None);
    }
    Ok(Some(BlockProps::Badges(BadgesProps {
        items,
        position: def.position,
        spacing: def.spacing,
        align: def.align,
    })))
}

#[derive(Deserialize)]
struct DividerDef {
    color: Option<String>,
    thickness: Option<Size>,
    margin: Option<Size>,
    #[serde(default)]
    style: LineStyle,
}

pub(super) fn divider(block: &Block, scope: &Scope) -> Resolved {
    let def: DividerDef = parse(block)?;
    Ok(Some(BlockProps::Divider(DividerProps {
        color: color(def.color.as_ref(), scope),
        thickness: def.thickness,
        margin: def.margin,
        style: def.style,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeDef {
    language: Option<Value>,
    content: Option<Value>,
    max_lines: Option<u32>,
    show_line_numbers: Option<bool>,
    font_size: Option<Size>,
    font_family: Option<String>,
    wrap: Option<bool>,
}

pub(super) fn code(block: &Block, scope: &Scope) -> Resolved {
    let def: CodeDef = parse(block)?;
    let Some(content) = non_empty(text(def.content.as_ref(), scope)) else {
        return Ok(None);
    };
    Ok(Some(BlockProps::Code(CodeProps {
        language: text(def.language.as_ref(), scope),
        content,
        max_lines: def.max_lines,
        show_line_numbers: def.show_line_numbers,
        font_size: def.font_size,
        font_family: def.font_family,
        wrap: def.wrap,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressDef {
    #[serde(default)]
    value: Value,
    max: Option<Value>,
    label: Option<Value>,
    color: Option<String>,
    background_color: Option<String>,
    height: Option<Size>,
    show_percentage: Option<bool>,
}

const DEFAULT_PROGRESS_MAX: f64 = 100.0;

/// Numeric reading of a resolved progress prop.
fn amount(value: &Value, scope: &Scope) -> Option<f64> {
    match resolve_typed(value, scope) {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(&s),
        _ => None,
    }
}

pub(super) fn progress(block: &Block, scope: &Scope) -> Resolved {
    let def: ProgressDef = parse(block)?;
    let max = def
        .max
        .as_ref()
        .and_then(|max| amount(max, scope))
        .filter(|max| *max > 0.0)
        .unwrap_or(DEFAULT_PROGRESS_MAX);

    Ok(Some(BlockProps::Progress(ProgressProps {
        value: amount(&def.value, scope).unwrap_or(0.0),
        max,
        label: text(def.label.as_ref(), scope),
        color: color(def.color.as_ref(), scope),
        background_color: color(def.background_color.as_ref(), scope),
        height: def.height,
        show_percentage: def.show_percentage,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusTextDef {
    text: Option<Value>,
    color: Option<String>,
    icon: Option<Value>,
    font_size: Option<Size>,
    font_weight: Option<Value>,
    align: Option<TextAlign>,
}

pub(super) fn status_text(block: &Block, scope: &Scope) -> Resolved {
    let def: StatusTextDef = parse(block)?;
    let Some(text_value) = non_empty(text(def.text.as_ref(), scope)) else {
        return Ok(None);
    };
    Ok(Some(BlockProps::StatusText(StatusTextProps {
        text: text_value,
        color: color(def.color.as_ref(), scope),
        icon: text(def.icon.as_ref(), scope),
        font_size: def.font_size,
        font_weight: def.font_weight,
        align: def.align,
    })))
}
