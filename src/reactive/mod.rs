//! Fine-grained reactivity: observed values, dependency tracking, watchers
//! and the batching scheduler.
//!
//! Data flow: [`observe`] turns containers into tracked state, reads during a
//! [`Watcher`] evaluation register [`Dep`]s, writes notify them, and notified
//! watchers are batched by the [`scheduler`] until the host flushes the tick.

mod array;
mod dep;
mod observer;
mod path;
pub mod scheduler;
mod traverse;
mod value;
mod watcher;

pub use dep::{Dep, is_collecting, untracked};
pub use observer::{
    Observer, define_reactive, define_reactive_shallow, del, observe, observe_root, set,
    toggle_observing,
};
pub use path::parse_path;
pub use traverse::traverse;
pub use value::{Arr, Obj, Value, identical, same_value};
pub use watcher::{Callback, Getter, Watcher, WatcherOptions};
