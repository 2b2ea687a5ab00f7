pub mod block;
pub mod definition;
pub mod instance;
pub mod metadata;

pub use block::*;
pub use definition::*;
pub use instance::*;
pub use metadata::*;
