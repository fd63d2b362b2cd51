//! # ripple-ui
//!
//! Fine-grained reactive runtime with a virtual-tree diff/patch engine.
//!
//! ## Architecture
//!
//! Two engines share one pipeline. The reactive runtime turns plain state
//! containers into observed ones: every property carries a dependency slot,
//! every computation records the slots it reads, and mutations notify exactly
//! the computations that depend on them. The patch engine turns two
//! immutable-per-pass virtual trees into a minimal mutation sequence against
//! a pluggable rendering adapter.
//!
//! ```text
//! mutation → setter → Dep::notify → Watcher::update → scheduler queue
//!     → flush() → render closure → new VNode tree
//!     → Patcher::patch(old, new) → RenderAdapter calls
//! ```
//!
//! The scheduler batches: any number of synchronous mutations coalesce into
//! one re-render per watcher at the next [`reactive::scheduler::flush`],
//! which the host drives as its tick boundary.
//!
//! ## Modules
//!
//! - [`reactive`] - values, observers, deps, watchers, scheduler
//! - [`vdom`] - virtual nodes and the diff/patch engine
//! - [`render`] - the adapter capability trait and the in-memory target
//! - [`pipeline`] - mount/unmount glue binding a render closure to a patcher
//! - [`error`] - error type and the reported-error channel

pub mod error;
pub mod pipeline;
pub mod reactive;
pub mod render;
pub mod vdom;

pub use error::{Error, clear_error_handler, set_error_handler};

pub use reactive::{
    Arr, Dep, Obj, Observer, Value, Watcher, WatcherOptions, del, observe, observe_root,
    parse_path, set, untracked,
};

pub use render::{AdapterOp, MemoryRenderer, NodeHandle, RenderAdapter};

pub use vdom::{
    AsyncFactory, ComponentLifecycle, Key, PatchModule, Patcher, RemoveCallback, VNode, VNodeData,
    VNodeFlags, VNodeKind, same_vnode,
};

pub use pipeline::{MountHandle, mount};
