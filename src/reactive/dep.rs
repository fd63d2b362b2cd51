//! Dependency slots and the active-collector stack.
//!
//! A [`Dep`] is an observable slot: it records which watchers read it and
//! re-invokes them on [`Dep::notify`]. Dep and Watcher reference each other -
//! the registry is explicitly bidirectional (deps hold subscriber handles,
//! watchers hold dep handles) and teardown is always a two-sided removal.
//!
//! Dependency tracking is dynamically scoped: whichever watcher is currently
//! evaluating collects every slot read during its call. That "currently
//! evaluating" pointer is a thread-local stack of collectors, pushed before
//! an evaluation and popped after it on every exit path ([`TargetGuard`]).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::reactive::watcher::Watcher;

thread_local! {
    static DEP_ID: Cell<u64> = const { Cell::new(0) };
    static TARGET_STACK: RefCell<Vec<Option<Watcher>>> = const { RefCell::new(Vec::new()) };
}

struct DepInner {
    id: u64,
    subs: RefCell<Vec<Watcher>>,
}

/// An observable slot tracking its subscriber watchers.
///
/// Subscriber deduplication is the watcher's job (via its dep-id sets), not
/// the dep's.
#[derive(Clone)]
pub struct Dep {
    inner: Rc<DepInner>,
}

impl Dep {
    /// Create a slot with a fresh id. Ids increase monotonically and order
    /// deps for the deep-traversal seen-set.
    pub fn new() -> Self {
        let id = DEP_ID.with(|c| {
            let id = c.get();
            c.set(id + 1);
            id
        });
        Dep {
            inner: Rc::new(DepInner {
                id,
                subs: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Unique id of this slot.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Number of current subscribers.
    pub fn sub_count(&self) -> usize {
        self.inner.subs.borrow().len()
    }

    /// Append a subscriber.
    pub fn add_sub(&self, watcher: &Watcher) {
        self.inner.subs.borrow_mut().push(watcher.clone());
    }

    /// Remove a subscriber (two-sided teardown entry point).
    pub fn remove_sub(&self, watcher: &Watcher) {
        self.inner
            .subs
            .borrow_mut()
            .retain(|w| w.id() != watcher.id());
    }

    /// Register this slot on the active collector, if any.
    pub fn depend(&self) {
        if let Some(watcher) = target() {
            watcher.add_dep(self);
        }
    }

    /// Re-invoke every subscriber. The list is stabilized first so
    /// subscriptions added or removed mid-notify affect the next pass only.
    pub fn notify(&self) {
        let subs = self.inner.subs.borrow().clone();
        for watcher in subs {
            watcher.update();
        }
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Active collector stack
// =============================================================================

/// The watcher currently collecting dependencies, if any.
pub(crate) fn target() -> Option<Watcher> {
    TARGET_STACK.with(|s| s.borrow().last().cloned().flatten())
}

/// Whether any watcher is currently collecting.
pub fn is_collecting() -> bool {
    TARGET_STACK.with(|s| matches!(s.borrow().last(), Some(Some(_))))
}

/// Push a collector frame. `None` disables tracking for the frame's extent.
pub(crate) fn push_target(watcher: Option<Watcher>) {
    TARGET_STACK.with(|s| s.borrow_mut().push(watcher));
}

/// Pop the top collector frame.
pub(crate) fn pop_target() {
    TARGET_STACK.with(|s| {
        s.borrow_mut().pop();
    });
}

/// Collector frame with guaranteed restoration: pops on drop, so the stack
/// is rebalanced even when the tracked computation unwinds.
pub(crate) struct TargetGuard;

impl TargetGuard {
    pub fn collect(watcher: Watcher) -> Self {
        push_target(Some(watcher));
        TargetGuard
    }

    /// Push a `None` frame, masking any outer collector for the frame's
    /// extent.
    pub fn suspend() -> Self {
        push_target(None);
        TargetGuard
    }
}

impl Drop for TargetGuard {
    fn drop(&mut self) {
        pop_target();
    }
}

/// Run `f` with dependency tracking disabled.
///
/// Reads inside `f` do not subscribe the enclosing watcher. The masking
/// frame is popped even when `f` unwinds.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _frame = TargetGuard::suspend();
    f()
}

/// Reset the collector stack and the id counter (for tests).
pub fn reset_dep_state() {
    TARGET_STACK.with(|s| s.borrow_mut().clear());
    DEP_ID.with(|c| c.set(0));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dep_ids_are_monotonic() {
        reset_dep_state();
        let a = Dep::new();
        let b = Dep::new();
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_untracked_masks_the_collector() {
        reset_dep_state();
        assert!(!is_collecting());
        // A None frame must mask an outer Some frame.
        push_target(None);
        assert!(!is_collecting());
        assert!(target().is_none());
        pop_target();
    }

    #[test]
    fn test_untracked_rebalances_after_panic() {
        reset_dep_state();
        let watcher = Watcher::computed(Box::new(|| Ok(crate::reactive::value::Value::Null)));
        push_target(Some(watcher));

        let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            untracked(|| panic!("boom"));
        }));
        assert!(unwound.is_err());
        // the masking frame was popped on unwind; the outer frame is live again
        assert!(is_collecting());
        pop_target();
        assert!(!is_collecting());
    }
}
