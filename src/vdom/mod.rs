//! Virtual tree description and the diff/patch engine.

mod modules;
mod patch;
mod vnode;

pub use modules::{ComponentLifecycle, PatchModule, RemoveCallback};
pub use patch::{Patcher, same_vnode};
pub use vnode::{AsyncFactory, Key, VNode, VNodeData, VNodeFlags, VNodeKind};
