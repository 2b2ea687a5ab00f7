//! # Katachi - Declarative Node Rendering Engine
//!
//! **Katachi** turns server-authored *visual definitions* into fully resolved
//! descriptions of dataflow-graph nodes: geometry, input/output handles,
//! status badges and an ordered list of content blocks whose props are ready
//! for a widget toolkit.
//!
//! ## Core Workflow
//!
//! 1.  **Load the catalog**: node types and their visual definitions, usually a
//!     JSON document from the backend ([`catalog::MemoryCatalog`]).
//! 2.  **Build a renderer**: [`node::NodeRenderer::builder`] registers custom
//!     block renderers, data enrichers, an I/O rules engine and configuration.
//! 3.  **Render**: call [`node::NodeRenderer::render`] on every change of a
//!     node's data. Templates such as `{{name}}` and visibility conditions such
//!     as `{{executionStatus}} === "error"` are evaluated against the node data
//!     plus its live `runtime` record.
//! 4.  **Poll** (optional): a [`runtime::RuntimeBinder`] per node fetches live
//!     values from a [`runtime::RuntimeDataSource`] while the node is running.
//!
//! ## Quick Start
//!
//! ```rust
//! use katachi::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let catalog = MemoryCatalog::from_json(
//!         r#"{
//!             "constant": {
//!                 "displayName": "Constant",
//!                 "outputs": [{ "type": "number" }],
//!                 "visual": {
//!                     "layout": [
//!                         { "type": "header", "title": "Constant {{name}}", "icon": "C" },
//!                         { "type": "text", "content": "{{_constantValue}}" }
//!                     ]
//!                 }
//!             }
//!         }"#,
//!     )?;
//!
//!     let renderer = NodeRenderer::builder(catalog).build();
//!     let node = NodeInstance::new(
//!         "node-1",
//!         "constant",
//!         json!({ "name": "A", "valueType": "number", "numberValue": 42 }),
//!     );
//!
//!     let rendered = renderer.render(&node, None);
//!     assert_eq!(rendered.blocks.len(), 2);
//!     assert_eq!(rendered.handles.outputs[0].id, "output-0");
//!     println!("{}", serde_json::to_string_pretty(&rendered)?);
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod blocks;
pub mod canvas;
pub mod catalog;
pub mod condition;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod handles;
pub mod layout;
pub mod node;
pub mod prelude;
pub mod rules;
pub mod runtime;
pub mod scope;
pub mod template;
pub mod visual;
