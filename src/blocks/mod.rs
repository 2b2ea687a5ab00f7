//! Block renderers and the prop resolution behind them.

pub mod props;
mod registry;
mod resolve;

pub use props::*;
pub use registry::{BUILTIN_BLOCK_TYPES, BlockRegistry, BlockRenderer};
