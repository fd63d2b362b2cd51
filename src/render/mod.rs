//! Rendering targets: the adapter capability trait and the in-memory
//! reference target.

pub mod adapter;
pub mod memory;

pub use adapter::{NodeHandle, RenderAdapter};
pub use memory::{AdapterOp, MemoryRenderer};
