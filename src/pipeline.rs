//! Mount glue: binds a render closure to a patcher through a render watcher.
//!
//! The render closure is the out-of-scope seam - anything that returns a
//! fresh [`VNode`] tree and may read reactive state while doing so. Mounting
//! evaluates it once under dependency collection, patches the result over the
//! container node, and re-patches on every scheduler flush that re-runs the
//! watcher.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Error;
use crate::reactive::{Value, Watcher, WatcherOptions};
use crate::render::adapter::{NodeHandle, RenderAdapter};
use crate::vdom::{Patcher, VNode};

/// Live binding between a render closure and a rendering target.
pub struct MountHandle<A: RenderAdapter> {
    watcher: Watcher,
    tree: Rc<RefCell<Option<VNode>>>,
    patcher: Rc<Patcher<A>>,
}

impl<A: RenderAdapter + 'static> MountHandle<A> {
    /// The render watcher driving this mount.
    pub fn watcher(&self) -> &Watcher {
        &self.watcher
    }

    /// Root backing node of the current tree.
    pub fn root_elm(&self) -> Option<NodeHandle> {
        self.tree.borrow().as_ref().and_then(VNode::elm)
    }

    /// Stop reacting and tear the tree down (destroy hooks over the whole
    /// subtree). The backing nodes are left to the rendering target.
    pub fn unmount(self) {
        self.watcher.teardown();
        if let Some(tree) = self.tree.borrow_mut().take() {
            self.patcher.patch(Some(&tree), None);
        }
    }
}

/// Mount `render` over `container`, replacing it with the rendered tree.
///
/// The initial render happens before this returns. With `hydrating`, the
/// first pass adopts `container`'s pre-rendered subtree instead (falling back
/// to a full render on mismatch). Subsequent re-renders are driven by the
/// scheduler: mutate reactive state, then call `scheduler::flush()`.
///
/// A render error on the initial pass fails the mount; later render errors
/// propagate out of `flush()`.
pub fn mount<A, F>(
    patcher: Rc<Patcher<A>>,
    container: NodeHandle,
    hydrating: bool,
    mut render: F,
) -> Result<MountHandle<A>, Error>
where
    A: RenderAdapter + 'static,
    F: FnMut() -> Result<VNode, Error> + 'static,
{
    let tree: Rc<RefCell<Option<VNode>>> = Rc::new(RefCell::new(None));

    let getter = {
        let tree = tree.clone();
        let patcher = patcher.clone();
        Box::new(move || {
            let new = render()?;
            let mut slot = tree.borrow_mut();
            match slot.take() {
                None => patcher.patch_mount(container, &new, hydrating),
                Some(old) => patcher.patch(Some(&old), Some(&new)),
            };
            *slot = Some(new);
            Ok(Value::Null)
        })
    };

    let watcher = Watcher::new(getter, None, WatcherOptions::default())?;
    Ok(MountHandle {
        watcher,
        tree,
        patcher,
    })
}
