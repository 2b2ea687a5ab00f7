//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the katachi crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use katachi::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let catalog = MemoryCatalog::from_file("path/to/catalog.json")?;
//! let config = EngineConfig::from_file("path/to/katachi.json")?;
//! let renderer = NodeRenderer::builder(catalog).with_config(config).build();
//!
//! let node: NodeInstance = serde_json::from_str(&std::fs::read_to_string("path/to/node.json")?)?;
//! let rendered = renderer.render(&node, None);
//! println!("{} blocks", rendered.blocks.len());
//! # Ok(())
//! # }
//! ```

// Rendering
pub use crate::node::{NodeRenderer, NodeRendererBuilder, RenderedNode, StatusBadges};
pub use crate::layout::LayoutEngine;
pub use crate::blocks::{BlockProps, BlockRegistry, BlockRenderer, RenderedBlock};
pub use crate::handles::{HandleLayout, ResolvedHandle};
pub use crate::canvas::CanvasGeometry;

// Definitions
pub use crate::catalog::{MemoryCatalog, NodeMetadataCatalog};
pub use crate::visual::{Block, NodeInstance, NodeMetadata, VisualDefinition};
pub use crate::config::EngineConfig;

// Templates and conditions
pub use crate::scope::Scope;
pub use crate::template::resolve_template;
pub use crate::condition::evaluate_condition;
pub use crate::format::format_value;

// Runtime data
pub use crate::runtime::{DataEnricher, RuntimeBinder, RuntimeData, RuntimeDataSource};
pub use crate::rules::IoRulesEngine;

// Error types
pub use crate::error::{BlockError, CatalogError, ConfigError, FetchError, IoRulesError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
