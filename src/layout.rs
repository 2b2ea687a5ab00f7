//! Materialises a visual definition's `layout` into rendered blocks.

use crate::blocks::{BlockRegistry, RenderedBlock};
use crate::diagnostics::WarnOnce;
use crate::runtime::{RuntimeData, assemble_scope};
use crate::scope::Scope;
use crate::visual::{Block, VisualDefinition};
use serde_json::{Map, Value};

/// Walks layouts block by block against a scope.
///
/// Each block is handled on its own: a hidden, unknown or broken block is
/// left out and its siblings still render, in declaration order.
pub struct LayoutEngine {
    registry: BlockRegistry,
    unknown_types: WarnOnce,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(BlockRegistry::with_defaults())
    }
}

impl LayoutEngine {
    pub fn new(registry: BlockRegistry) -> Self {
        Self {
            registry,
            unknown_types: WarnOnce::new(),
        }
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Builds the scope from `(data, runtime, executionOrder)` and renders the layout.
    pub fn layout(
        &self,
        visual: Option<&VisualDefinition>,
        data: &Map<String, Value>,
        runtime: RuntimeData,
        execution_order: Option<i64>,
    ) -> Vec<RenderedBlock> {
        let Some(blocks) = visual.and_then(|v| v.layout.as_deref()) else {
            return Vec::new();
        };
        let scope = assemble_scope(data.clone(), runtime, execution_order);
        self.render(blocks, &scope)
    }

    /// Renders blocks against an already assembled scope.
    pub fn render(&self, blocks: &[Block], scope: &Scope) -> Vec<RenderedBlock> {
        blocks
            .iter()
            .enumerate()
            .filter_map(|(position, block)| self.render_block(position, block, scope))
            .collect()
    }

    fn render_block(&self, position: usize, block: &Block, scope: &Scope) -> Option<RenderedBlock> {
        if !block.is_visible(scope) {
            return None;
        }

        let Some(renderer) = self.registry.get(&block.block_type) else {
            if self.unknown_types.first(&block.block_type) {
                tracing::warn!(block_type = %block.block_type, "unknown block type; skipping");
            }
            return None;
        };

        match renderer.render(block, scope) {
            Ok(props) => props.map(|props| RenderedBlock {
                block_type: block.block_type.clone(),
                props,
            }),
            Err(error) => {
                tracing::warn!(block_type = %block.block_type, position, %error, "block failed to render");
                None
            }
        }
    }
}
