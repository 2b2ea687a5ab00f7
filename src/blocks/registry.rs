use super::props::BlockProps;
use super::resolve;
use crate::error::BlockError;
use crate::scope::Scope;
use crate::visual::Block;
use ahash::AHashMap;

/// Defines the contract for turning one `block.type` into renderer props.
///
/// `render` returns `Ok(None)` when the block has no content to show.
pub trait BlockRenderer: Send + Sync {
    fn block_type(&self) -> &str;
    fn render(&self, block: &Block, scope: &Scope) -> Result<Option<BlockProps>, BlockError>;
}

/// Defines the built-in renderers, their registration, and their lookup by name.
macro_rules! define_block_renderers {
    ( $( ($struct_name:ident, $block_type:literal, $resolver:path) ),* $(,)? ) => {
        $(
            struct $struct_name;
            impl BlockRenderer for $struct_name {
                fn block_type(&self) -> &str { $block_type }
                fn render(&self, block: &Block, scope: &Scope) -> Result<Option<BlockProps>, BlockError> {
                    $resolver(block, scope)
                }
            }
        )*

        fn register_default_renderers(registry: &mut AHashMap<String, Box<dyn BlockRenderer>>) {
            $( registry.insert($block_type.to_string(), Box::new($struct_name)); )*
        }

        fn create_renderer_by_name(name: &str) -> Option<Box<dyn BlockRenderer>> {
            match name {
                $( $block_type => Some(Box::new($struct_name)), )*
                _ => None,
            }
        }

        /// Block types with a built-in renderer.
        pub const BUILTIN_BLOCK_TYPES: &[&str] = &[ $( $block_type ),* ];
    };
}

define_block_renderers! {
    (HeaderRenderer, "header", resolve::header),
    (SubtitleRenderer, "subtitle", resolve::subtitle),
    (TextRenderer, "text", resolve::text_block),
    (ValuesRenderer, "values", resolve::values),
    (BadgesRenderer, "badges", resolve::badges),
    (DividerRenderer, "divider", resolve::divider),
    (CodeRenderer, "code", resolve::code),
    (ProgressRenderer, "progress", resolve::progress),
    (StatusTextRenderer, "status-text", resolve::status_text),
}

/// Maps block types to renderers.
pub struct BlockRegistry {
    renderers: AHashMap<String, Box<dyn BlockRenderer>>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl BlockRegistry {
    pub fn with_defaults() -> Self {
        let mut renderers: AHashMap<String, Box<dyn BlockRenderer>> = AHashMap::new();
        register_default_renderers(&mut renderers);
        Self { renderers }
    }

    /// Adds or replaces the renderer for its block type.
    pub fn register(&mut self, renderer: Box<dyn BlockRenderer>) {
        self.renderers
            .insert(renderer.block_type().to_string(), renderer);
    }

    /// Renders blocks of type `alias` with a built-in renderer. Unknown built-ins are ignored.
    pub fn alias(&mut self, alias: &str, builtin: &str) -> bool {
        match create_renderer_by_name(builtin) {
            Some(renderer) => {
                self.renderers.insert(alias.to_string(), renderer);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, block_type: &str) -> Option<&dyn BlockRenderer> {
        self.renderers.get(block_type).map(|renderer| &**renderer)
    }

    pub fn contains(&self, block_type: &str) -> bool {
        self.renderers.contains_key(block_type)
    }
}
