use crate::config::CanvasConfig;
use crate::visual::{CanvasDef, CanvasShape};
use serde::Serialize;

/// Node geometry handed to the graph canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasGeometry {
    pub min_width: f64,
    pub min_height: f64,
    pub shape: CanvasShape,
    pub border_radius: f64,
    pub resizable: bool,
}

/// Computes node geometry so that handles on either side never overlap.
///
/// `min_height` is the authored (or default) base height, raised when
/// `max(input_count, output_count)` handles at `handle_spacing` plus top and
/// bottom padding would not fit.
pub fn canvas_config(
    canvas: &CanvasDef,
    input_count: usize,
    output_count: usize,
    config: &CanvasConfig,
) -> CanvasGeometry {
    let base_min_height = canvas.min_height.unwrap_or(config.base_min_height);
    let max_count = input_count.max(output_count);
    let min_height = if max_count <= 1 {
        base_min_height
    } else {
        let required = (max_count - 1) as f64 * config.handle_spacing + 2.0 * config.padding;
        base_min_height.max(required)
    };

    CanvasGeometry {
        min_width: canvas.min_width.unwrap_or(config.min_width),
        min_height,
        shape: canvas.shape.unwrap_or_default(),
        border_radius: canvas.border_radius.unwrap_or(config.border_radius),
        resizable: canvas.resizable.unwrap_or(false),
    }
}
