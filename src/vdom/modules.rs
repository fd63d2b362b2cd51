//! Patch-engine extension points.
//!
//! Modules are the pluggable side-effect layer (attributes, class, style,
//! events, directives): the engine calls their hooks at fixed points while it
//! diffs, in registration order. The component lifecycle is a separate seam
//! for the instance system that owns component placeholder nodes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::render::adapter::{NodeHandle, RenderAdapter};
use crate::vdom::vnode::VNode;

/// Completion callback for deferred removal.
///
/// Detachment of the backing node runs exactly once, after every listener has
/// signalled. A module that wants to defer (exit animations) clones the
/// callback and signals later; one that does not simply signals from its
/// `remove` hook.
#[derive(Clone)]
pub struct RemoveCallback {
    inner: Rc<RemoveInner>,
}

struct RemoveInner {
    remaining: Cell<usize>,
    detach: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl RemoveCallback {
    pub(crate) fn new(listeners: usize, detach: impl FnOnce() + 'static) -> Self {
        RemoveCallback {
            inner: Rc::new(RemoveInner {
                remaining: Cell::new(listeners),
                detach: RefCell::new(Some(Box::new(detach))),
            }),
        }
    }

    /// Listeners still outstanding.
    pub fn pending(&self) -> usize {
        self.inner.remaining.get()
    }

    pub(crate) fn add_listeners(&self, n: usize) {
        self.inner.remaining.set(self.inner.remaining.get() + n);
    }

    /// Signal one listener done; the last signal runs the detach.
    pub fn signal(&self) {
        let remaining = self.inner.remaining.get();
        if remaining == 0 {
            return;
        }
        self.inner.remaining.set(remaining - 1);
        if remaining == 1 {
            if let Some(detach) = self.inner.detach.borrow_mut().take() {
                detach();
            }
        }
    }
}

/// Hook set invoked by the patch engine at fixed points.
///
/// Every hook has a no-op default, so a module implements only the points it
/// cares about. `remove` defaults to signalling immediately (no deferral);
/// it receives no adapter handle because detachment is the engine's job.
pub trait PatchModule<A: RenderAdapter> {
    /// A backing node was just created for `new` (children already built).
    fn create(&self, _adapter: &mut A, _old: &VNode, _new: &VNode) {}

    /// A kept-alive subtree is being re-inserted.
    fn activate(&self, _adapter: &mut A, _old: &VNode, _new: &VNode) {}

    /// `new` is reusing `old`'s backing node; reconcile side effects.
    fn update(&self, _adapter: &mut A, _old: &VNode, _new: &VNode) {}

    /// `vnode`'s backing node is about to be detached. Clone `done` and
    /// signal later to defer the detachment.
    fn remove(&self, _vnode: &VNode, done: &RemoveCallback) {
        done.signal();
    }

    /// `vnode`'s subtree is gone from the new tree.
    fn destroy(&self, _adapter: &mut A, _vnode: &VNode) {}
}

/// Component instance seam.
///
/// Bodies belong to the out-of-scope instance system; the engine only fixes
/// the call points. `init` mounts an instance for a placeholder node and
/// returns the root backing handle it produced (`None` means the placeholder
/// is not mountable and is created as a plain comment).
pub trait ComponentLifecycle<A: RenderAdapter> {
    fn init(&self, adapter: &mut A, vnode: &VNode) -> Option<NodeHandle>;

    /// The placeholder survived a diff; forward new bindings to the instance.
    fn prepatch(&self, _old: &VNode, _new: &VNode) {}

    /// The instance's subtree is now attached to the real tree.
    fn inserted(&self, _vnode: &VNode) {}

    fn destroy(&self, _vnode: &VNode) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_callback_detaches_after_all_signals() {
        let fired = Rc::new(Cell::new(0));
        let fired2 = fired.clone();
        let done = RemoveCallback::new(3, move || fired2.set(fired2.get() + 1));

        done.signal();
        done.signal();
        assert_eq!(fired.get(), 0);
        done.signal();
        assert_eq!(fired.get(), 1);

        // extra signals are inert
        done.signal();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_remove_callback_add_listeners_extends_the_count() {
        let fired = Rc::new(Cell::new(false));
        let fired2 = fired.clone();
        let done = RemoveCallback::new(1, move || fired2.set(true));
        done.add_listeners(1);

        done.signal();
        assert!(!fired.get());
        done.signal();
        assert!(fired.get());
    }
}
