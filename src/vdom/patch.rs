//! Tree reconciliation.
//!
//! [`Patcher`] diffs an old virtual tree against a new one and emits a
//! minimal sequence of adapter mutations. The children diff is the two-ended
//! four-pointer algorithm: O(n) for the dominant append/prepend/reverse
//! shapes, with a lazy key map fallback for interior reorders. Keys are
//! required for correct identity under reordering; unkeyed reorders degrade
//! to positional reuse, which can carry a stateful backing node across
//! semantically different list items. That caveat is load-bearing for some
//! callers and is kept as is.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::{AHashMap, AHashSet};

use crate::render::adapter::{NodeHandle, RenderAdapter};
use crate::vdom::modules::{ComponentLifecycle, PatchModule, RemoveCallback};
use crate::vdom::vnode::{Key, VNode, VNodeData, VNodeFlags, VNodeKind};

/// Input type categories that may share a backing `<input>` node.
const TEXT_INPUT_TYPES: [&str; 7] = [
    "text", "number", "password", "search", "email", "tel", "url",
];

/// Whether two nodes describe the same slot and may reuse one backing node.
///
/// Same key AND same shape (kind, comment-ness, data-definedness, input type
/// category), OR `a` is an async placeholder for the identical factory and
/// that factory has not failed.
pub fn same_vnode(a: &VNode, b: &VNode) -> bool {
    a.key() == b.key()
        && ((a.kind() == b.kind() && a.has_data() == b.has_data() && same_input_type(a, b))
            || (a.is_async_placeholder() && same_live_factory(a, b)))
}

fn same_live_factory(a: &VNode, b: &VNode) -> bool {
    match (a.async_factory(), b.async_factory()) {
        (Some(fa), Some(fb)) => fa.ptr_eq(&fb) && !fb.is_failed(),
        _ => false,
    }
}

fn same_input_type(a: &VNode, b: &VNode) -> bool {
    if a.tag().as_deref() != Some("input") {
        return true;
    }
    let type_a = a.attr("type");
    let type_b = b.attr("type");
    type_a == type_b || (is_text_input(&type_a) && is_text_input(&type_b))
}

fn is_text_input(attr: &Option<String>) -> bool {
    attr.as_deref().is_some_and(|t| TEXT_INPUT_TYPES.contains(&t))
}

fn check_duplicate_keys(children: &[VNode]) {
    let mut seen: AHashSet<Key> = AHashSet::new();
    for child in children {
        if let Some(key) = child.key() {
            if !seen.insert(key.clone()) {
                tracing::warn!(?key, "duplicate key in children list, updates may misbehave");
            }
        }
    }
}

/// First old slot in `[start, end)` that matches `node` (unkeyed fallback).
fn find_idx_in_old(node: &VNode, old: &[Option<VNode>], start: usize, end: usize) -> Option<usize> {
    (start..end).find(|&i| {
        old[i]
            .as_ref()
            .is_some_and(|candidate| same_vnode(node, candidate))
    })
}

// =============================================================================
// Patcher
// =============================================================================

/// The diff/patch engine for one rendering target.
///
/// The adapter sits behind `Rc<RefCell<_>>` so deferred removal callbacks can
/// detach their node after the patch pass that scheduled them has returned.
pub struct Patcher<A: RenderAdapter> {
    adapter: Rc<RefCell<A>>,
    modules: Vec<Rc<dyn PatchModule<A>>>,
    lifecycle: Option<Rc<dyn ComponentLifecycle<A>>>,
    hydration_bailed: Cell<bool>,
}

impl<A: RenderAdapter + 'static> Patcher<A> {
    pub fn new(adapter: A) -> Self {
        Patcher {
            adapter: Rc::new(RefCell::new(adapter)),
            modules: Vec::new(),
            lifecycle: None,
            hydration_bailed: Cell::new(false),
        }
    }

    /// Register a module; hooks run in registration order.
    pub fn add_module(&mut self, module: Rc<dyn PatchModule<A>>) {
        self.modules.push(module);
    }

    pub fn set_lifecycle(&mut self, lifecycle: Rc<dyn ComponentLifecycle<A>>) {
        self.lifecycle = Some(lifecycle);
    }

    /// Shared handle to the rendering target.
    pub fn adapter(&self) -> Rc<RefCell<A>> {
        self.adapter.clone()
    }

    // -------------------------------------------------------------------------
    // Entry points
    // -------------------------------------------------------------------------

    /// Reconcile `old` against `new`.
    ///
    /// `new` absent is a pure teardown (destroy hooks over `old`, top-down).
    /// `old` absent creates the new subtree detached. Same slot patches in
    /// place; different slots create the replacement next to the old subtree,
    /// rewire any ancestor placeholder chain, then remove the old subtree.
    pub fn patch(&self, old: Option<&VNode>, new: Option<&VNode>) -> Option<NodeHandle> {
        let Some(new) = new else {
            if let Some(old) = old {
                self.invoke_destroy_hook(old);
            }
            return None;
        };
        let mut inserted = Vec::new();
        match old {
            None => self.create_elm(new, &mut inserted, None, None, false),
            Some(old) if same_vnode(old, new) => self.patch_vnode(old, new, &mut inserted),
            Some(old) => self.replace(old, new, &mut inserted),
        }
        self.invoke_insert_hooks(&inserted);
        new.elm()
    }

    /// Mount `vnode` over a pre-existing backing node.
    ///
    /// With `hydrating`, attempts node-by-node adoption of the existing
    /// subtree; any mismatch warns once and falls back to a full client-side
    /// render. Without it (or after a failed hydration), the existing node is
    /// wrapped as an empty element vnode and replaced.
    pub fn patch_mount(&self, root: NodeHandle, vnode: &VNode, hydrating: bool) -> Option<NodeHandle> {
        let mut inserted = Vec::new();
        if hydrating {
            if self.hydrate(root, vnode, &mut inserted) {
                self.invoke_insert_hooks(&inserted);
                return vnode.elm();
            }
            tracing::warn!(
                "rendered tree does not match the pre-rendered content, \
                 bailing hydration and performing a full render"
            );
            inserted.clear();
        }
        let old = self.empty_node_at(root);
        self.replace(&old, vnode, &mut inserted);
        self.invoke_insert_hooks(&inserted);
        vnode.elm()
    }

    /// Wrap a real backing node as a bare element vnode (replacement anchor).
    fn empty_node_at(&self, elm: NodeHandle) -> VNode {
        let tag = self.adapter.borrow().tag_name_of(elm).unwrap_or_default();
        let node = VNode::element(&tag, VNodeData::default(), Vec::new());
        node.set_elm(Some(elm));
        node
    }

    fn replace(&self, old: &VNode, new: &VNode, inserted: &mut Vec<VNode>) {
        let old_elm = old.elm();
        let parent_elm = old_elm.and_then(|e| self.adapter.borrow().parent_of(e));
        let ref_elm = old_elm.and_then(|e| self.adapter.borrow().next_sibling_of(e));
        self.create_elm(new, inserted, parent_elm, ref_elm, false);

        // A replaced component root drags its placeholder chain along: each
        // ancestor placeholder is retargeted at the new backing node and its
        // side-effect hooks re-run.
        let patchable = matches!(new.kind(), VNodeKind::Element { .. });
        let mut ancestor = new.parent();
        while let Some(node) = ancestor {
            for module in &self.modules {
                let mut adapter = self.adapter.borrow_mut();
                module.destroy(&mut adapter, &node);
            }
            node.set_elm(new.elm());
            if patchable {
                let empty = VNode::empty();
                for module in &self.modules {
                    let mut adapter = self.adapter.borrow_mut();
                    module.create(&mut adapter, &empty, &node);
                }
            }
            ancestor = node.parent();
        }

        if parent_elm.is_some() {
            self.remove_vnodes(&[Some(old.clone())], 0, 0);
        } else if old.tag().is_some() {
            self.invoke_destroy_hook(old);
        }
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Create the backing subtree for `vnode` and insert it at `ref_elm`
    /// under `parent_elm` (append when no reference is given).
    ///
    /// Children are fully built before the subtree root is inserted, so the
    /// whole subtree lands in the live tree with a single write.
    fn create_elm(
        &self,
        vnode: &VNode,
        inserted: &mut Vec<VNode>,
        parent_elm: Option<NodeHandle>,
        ref_elm: Option<NodeHandle>,
        nested: bool,
    ) {
        vnode.set_root_insert(!nested);
        if self.create_component(vnode, inserted, parent_elm, ref_elm) {
            return;
        }
        match vnode.kind() {
            VNodeKind::Element { tag } => {
                let elm = self.adapter.borrow_mut().create_element(&tag);
                vnode.set_elm(Some(elm));
                self.create_children(vnode, inserted);
                if vnode.has_data() {
                    self.invoke_create_hooks(vnode, inserted);
                }
                self.insert(parent_elm, Some(elm), ref_elm);
            }
            VNodeKind::Text => {
                let text = vnode.text_payload().unwrap_or_default();
                let elm = self.adapter.borrow_mut().create_text(&text);
                vnode.set_elm(Some(elm));
                self.insert(parent_elm, Some(elm), ref_elm);
            }
            // A component placeholder without a mounted instance degrades to
            // a comment anchor.
            VNodeKind::Comment | VNodeKind::Component { .. } => {
                let text = vnode.text_payload().unwrap_or_default();
                let elm = self.adapter.borrow_mut().create_comment(&text);
                vnode.set_elm(Some(elm));
                self.insert(parent_elm, Some(elm), ref_elm);
            }
        }
    }

    /// Delegate a component placeholder to the lifecycle seam; adopts the
    /// instance's root handle on success.
    fn create_component(
        &self,
        vnode: &VNode,
        inserted: &mut Vec<VNode>,
        parent_elm: Option<NodeHandle>,
        ref_elm: Option<NodeHandle>,
    ) -> bool {
        if !matches!(vnode.kind(), VNodeKind::Component { .. }) {
            return false;
        }
        let Some(lifecycle) = self.lifecycle.clone() else {
            return false;
        };
        let reactivated = vnode.component_instance().is_some();
        let root = {
            let mut adapter = self.adapter.borrow_mut();
            lifecycle.init(&mut adapter, vnode)
        };
        let Some(root) = root else {
            return false;
        };
        vnode.set_elm(Some(root));
        self.invoke_create_hooks(vnode, inserted);
        self.insert(parent_elm, Some(root), ref_elm);
        if reactivated {
            self.reactivate_component(vnode, inserted);
        }
        true
    }

    /// Activate hooks for a kept-alive instance being re-inserted.
    fn reactivate_component(&self, vnode: &VNode, inserted: &mut Vec<VNode>) {
        let empty = VNode::empty();
        for module in &self.modules {
            let mut adapter = self.adapter.borrow_mut();
            module.activate(&mut adapter, &empty, vnode);
        }
        inserted.push(vnode.clone());
    }

    fn create_children(&self, vnode: &VNode, inserted: &mut Vec<VNode>) {
        let children = vnode.children();
        if children.is_empty() {
            return;
        }
        check_duplicate_keys(&children);
        for (i, child) in children.into_iter().enumerate() {
            let child = self.prepare_child(vnode, i, child);
            self.create_elm(&child, inserted, vnode.elm(), None, true);
        }
    }

    /// Clone-on-reuse: a node produced by an earlier render that reappears in
    /// a children list is cloned before a fresh backing node is created for
    /// it, so the earlier tree keeps a valid insertion reference.
    fn prepare_child(&self, owner: &VNode, index: usize, child: VNode) -> VNode {
        if child.elm().is_some() {
            let cloned = child.clone_node();
            owner.replace_child(index, cloned.clone());
            cloned
        } else {
            child
        }
    }

    fn insert(&self, parent: Option<NodeHandle>, elm: Option<NodeHandle>, reference: Option<NodeHandle>) {
        let (Some(parent), Some(elm)) = (parent, elm) else {
            return;
        };
        match reference {
            Some(reference) => {
                // the reference may already be gone; only insert between siblings
                let ref_parent = self.adapter.borrow().parent_of(reference);
                if ref_parent == Some(parent) {
                    self.adapter.borrow_mut().insert_before(parent, elm, reference);
                }
            }
            None => self.adapter.borrow_mut().append_child(parent, elm),
        }
    }

    fn invoke_create_hooks(&self, vnode: &VNode, inserted: &mut Vec<VNode>) {
        let empty = VNode::empty();
        for module in &self.modules {
            let mut adapter = self.adapter.borrow_mut();
            module.create(&mut adapter, &empty, vnode);
        }
        if self.lifecycle.is_some() && matches!(vnode.kind(), VNodeKind::Component { .. }) {
            inserted.push(vnode.clone());
        }
    }

    fn invoke_insert_hooks(&self, queue: &[VNode]) {
        if let Some(lifecycle) = &self.lifecycle {
            for vnode in queue {
                lifecycle.inserted(vnode);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Destroy hooks over a subtree, parent before child.
    fn invoke_destroy_hook(&self, vnode: &VNode) {
        if vnode.has_data() {
            if let Some(lifecycle) = &self.lifecycle {
                if matches!(vnode.kind(), VNodeKind::Component { .. }) {
                    lifecycle.destroy(vnode);
                }
            }
            for module in &self.modules {
                let mut adapter = self.adapter.borrow_mut();
                module.destroy(&mut adapter, vnode);
            }
        }
        for child in vnode.children() {
            self.invoke_destroy_hook(&child);
        }
    }

    fn remove_vnodes(&self, vnodes: &[Option<VNode>], start: usize, end: isize) {
        let mut i = start;
        while i as isize <= end {
            if let Some(vnode) = &vnodes[i] {
                if vnode.tag().is_some() || matches!(vnode.kind(), VNodeKind::Component { .. }) {
                    self.remove_and_invoke_remove_hook(vnode);
                    self.invoke_destroy_hook(vnode);
                } else {
                    self.remove_node(vnode.elm());
                }
            }
            i += 1;
        }
    }

    /// Run remove hooks with a shared completion callback; detachment happens
    /// exactly once, after every module (plus the engine itself) signals.
    fn remove_and_invoke_remove_hook(&self, vnode: &VNode) {
        if !vnode.has_data() {
            self.remove_node(vnode.elm());
            return;
        }
        let listeners = self.modules.len() + 1;
        let adapter = self.adapter.clone();
        let elm = vnode.elm();
        let done = RemoveCallback::new(listeners, move || {
            if let Some(elm) = elm {
                let parent = adapter.borrow().parent_of(elm);
                if let Some(parent) = parent {
                    adapter.borrow_mut().remove_child(parent, elm);
                }
            }
        });
        for module in &self.modules {
            module.remove(vnode, &done);
        }
        done.signal();
    }

    fn remove_node(&self, elm: Option<NodeHandle>) {
        let Some(elm) = elm else { return };
        // the node may already be gone from the live tree
        let parent = self.adapter.borrow().parent_of(elm);
        if let Some(parent) = parent {
            self.adapter.borrow_mut().remove_child(parent, elm);
        }
    }

    // -------------------------------------------------------------------------
    // In-place patching
    // -------------------------------------------------------------------------

    fn patch_vnode(&self, old: &VNode, new: &VNode, inserted: &mut Vec<VNode>) {
        if old.ptr_eq(new) {
            return;
        }
        let elm = old.elm();
        new.set_elm(elm);

        if old.is_async_placeholder() {
            if new.async_factory().is_some_and(|f| f.is_resolved()) {
                if let Some(elm) = elm {
                    self.hydrate(elm, new, inserted);
                }
            } else {
                new.insert_flags(VNodeFlags::ASYNC_PLACEHOLDER);
            }
            return;
        }

        // Static subtree reuse: only when the new node is a clone (or once),
        // otherwise the render output genuinely changed and a full patch is
        // required.
        if new.is_static()
            && old.is_static()
            && new.key() == old.key()
            && new
                .flags()
                .intersects(VNodeFlags::CLONED | VNodeFlags::ONCE)
        {
            new.set_component_instance(old.component_instance());
            return;
        }

        if let Some(lifecycle) = &self.lifecycle {
            if matches!(new.kind(), VNodeKind::Component { .. }) {
                lifecycle.prepatch(old, new);
            }
        }

        if new.has_data() && matches!(new.kind(), VNodeKind::Element { .. }) {
            for module in &self.modules {
                let mut adapter = self.adapter.borrow_mut();
                module.update(&mut adapter, old, new);
            }
        }

        match new.text_payload() {
            None => {
                let old_has = old.has_children();
                let new_has = new.has_children();
                if old_has && new_has {
                    if let Some(elm) = elm {
                        self.update_children(elm, old, new, inserted);
                    }
                } else if new_has {
                    if old.text_payload().is_some() {
                        if let Some(elm) = elm {
                            self.adapter.borrow_mut().set_text(elm, "");
                        }
                    }
                    let mut new_ch = new.children();
                    let end = new_ch.len() as isize - 1;
                    if let Some(elm) = elm {
                        self.add_vnodes(elm, None, new, &mut new_ch, 0, end, inserted);
                    }
                } else if old_has {
                    let old_ch: Vec<Option<VNode>> =
                        old.children().into_iter().map(Some).collect();
                    let end = old_ch.len() as isize - 1;
                    self.remove_vnodes(&old_ch, 0, end);
                } else if old.text_payload().is_some() {
                    if let Some(elm) = elm {
                        self.adapter.borrow_mut().set_text(elm, "");
                    }
                }
            }
            Some(text) => {
                if old.text_payload().as_deref() != Some(&text) {
                    if let Some(elm) = elm {
                        self.adapter.borrow_mut().set_text(elm, &text);
                    }
                }
            }
        }
    }

    fn add_vnodes(
        &self,
        parent_elm: NodeHandle,
        ref_elm: Option<NodeHandle>,
        owner: &VNode,
        vnodes: &mut Vec<VNode>,
        start: usize,
        end: isize,
        inserted: &mut Vec<VNode>,
    ) {
        let mut i = start;
        while i as isize <= end {
            let child = self.prepare_child(owner, i, vnodes[i].clone());
            vnodes[i] = child.clone();
            self.create_elm(&child, inserted, Some(parent_elm), ref_elm, false);
            i += 1;
        }
    }

    // -------------------------------------------------------------------------
    // Children diff
    // -------------------------------------------------------------------------

    /// Two-ended four-pointer list diff.
    ///
    /// Consumed old slots are nulled so a keyed move is not visited twice.
    /// The key map over the remaining old range is built lazily, only when
    /// none of the four end shortcuts applies.
    fn update_children(
        &self,
        parent_elm: NodeHandle,
        old_vnode: &VNode,
        new_vnode: &VNode,
        inserted: &mut Vec<VNode>,
    ) {
        let mut old_ch: Vec<Option<VNode>> = old_vnode.children().into_iter().map(Some).collect();
        let mut new_ch: Vec<VNode> = new_vnode.children();

        let mut old_start: isize = 0;
        let mut old_end: isize = old_ch.len() as isize - 1;
        let mut new_start: isize = 0;
        let mut new_end: isize = new_ch.len() as isize - 1;
        let mut key_map: Option<AHashMap<Key, usize>> = None;

        check_duplicate_keys(&new_ch);

        while old_start <= old_end && new_start <= new_end {
            let Some(old_s) = old_ch[old_start as usize].clone() else {
                old_start += 1; // slot consumed by an earlier keyed move
                continue;
            };
            let Some(old_e) = old_ch[old_end as usize].clone() else {
                old_end -= 1;
                continue;
            };
            let new_s = new_ch[new_start as usize].clone();
            let new_e = new_ch[new_end as usize].clone();

            if same_vnode(&old_s, &new_s) {
                self.patch_vnode(&old_s, &new_s, inserted);
                old_start += 1;
                new_start += 1;
            } else if same_vnode(&old_e, &new_e) {
                self.patch_vnode(&old_e, &new_e, inserted);
                old_end -= 1;
                new_end -= 1;
            } else if same_vnode(&old_s, &new_e) {
                // front-to-back move
                self.patch_vnode(&old_s, &new_e, inserted);
                let after_old_end = old_e.elm().and_then(|e| self.adapter.borrow().next_sibling_of(e));
                self.insert(Some(parent_elm), old_s.elm(), after_old_end);
                old_start += 1;
                new_end -= 1;
            } else if same_vnode(&old_e, &new_s) {
                // back-to-front move
                self.patch_vnode(&old_e, &new_s, inserted);
                self.insert(Some(parent_elm), old_e.elm(), old_s.elm());
                old_end -= 1;
                new_start += 1;
            } else {
                let map = key_map.get_or_insert_with(|| {
                    let mut map = AHashMap::new();
                    for i in old_start as usize..=old_end as usize {
                        if let Some(key) = old_ch[i].as_ref().and_then(VNode::key) {
                            map.entry(key).or_insert(i);
                        }
                    }
                    map
                });
                let idx = match new_s.key() {
                    Some(key) => map.get(&key).copied(),
                    None => find_idx_in_old(&new_s, &old_ch, old_start as usize, old_end as usize),
                };
                let moved = idx.and_then(|i| old_ch[i].clone().map(|v| (i, v)));
                match moved {
                    Some((i, to_move)) if same_vnode(&to_move, &new_s) => {
                        self.patch_vnode(&to_move, &new_s, inserted);
                        old_ch[i] = None;
                        self.insert(Some(parent_elm), to_move.elm(), old_s.elm());
                    }
                    _ => {
                        // new element, or a key collision with a different
                        // element shape
                        let child =
                            self.prepare_child(new_vnode, new_start as usize, new_s.clone());
                        new_ch[new_start as usize] = child.clone();
                        self.create_elm(&child, inserted, Some(parent_elm), old_s.elm(), false);
                    }
                }
                new_start += 1;
            }
        }

        if old_start > old_end {
            let ref_elm = usize::try_from(new_end + 1)
                .ok()
                .and_then(|i| new_ch.get(i))
                .and_then(VNode::elm);
            self.add_vnodes(
                parent_elm,
                ref_elm,
                new_vnode,
                &mut new_ch,
                new_start as usize,
                new_end,
                inserted,
            );
        } else if new_start > new_end {
            self.remove_vnodes(&old_ch, old_start as usize, old_end);
        }
    }

    // -------------------------------------------------------------------------
    // Hydration
    // -------------------------------------------------------------------------

    /// Adopt a pre-rendered subtree for `vnode`. Returns false on any
    /// structural mismatch; the caller then falls back to a full render.
    fn hydrate(&self, elm: NodeHandle, vnode: &VNode, inserted: &mut Vec<VNode>) -> bool {
        if vnode.is_comment() && vnode.async_factory().is_some() {
            vnode.set_elm(Some(elm));
            vnode.insert_flags(VNodeFlags::ASYNC_PLACEHOLDER);
            return true;
        }
        if !self.assert_node_match(elm, vnode) {
            return false;
        }
        vnode.set_elm(Some(elm));

        match vnode.kind() {
            VNodeKind::Component { .. } => {
                let Some(lifecycle) = self.lifecycle.clone() else {
                    return false;
                };
                let root = {
                    let mut adapter = self.adapter.borrow_mut();
                    lifecycle.init(&mut adapter, vnode)
                };
                if root.is_none() {
                    return false;
                }
                self.invoke_create_hooks(vnode, inserted);
                true
            }
            VNodeKind::Element { .. } => {
                if vnode.has_children() {
                    let first = self.adapter.borrow().first_child_of(elm);
                    match first {
                        // empty pre-rendered element: populate it
                        None => self.create_children(vnode, inserted),
                        Some(first) => {
                            let mut child = Some(first);
                            let mut matched = true;
                            for vchild in vnode.children() {
                                match child {
                                    Some(c) if self.hydrate(c, &vchild, inserted) => {
                                        child = self.adapter.borrow().next_sibling_of(c);
                                    }
                                    _ => {
                                        matched = false;
                                        break;
                                    }
                                }
                            }
                            // a leftover real child means the actual list is
                            // longer than the virtual one
                            if !matched || child.is_some() {
                                if !self.hydration_bailed.replace(true) {
                                    tracing::warn!(
                                        "mismatching pre-rendered children, bailing hydration"
                                    );
                                }
                                return false;
                            }
                        }
                    }
                }
                if vnode.has_data() {
                    self.invoke_create_hooks(vnode, inserted);
                }
                true
            }
            VNodeKind::Text | VNodeKind::Comment => {
                let actual = self.adapter.borrow().text_of(elm);
                let expected = vnode.text_payload();
                if actual != expected {
                    if let Some(text) = &expected {
                        self.adapter.borrow_mut().set_text(elm, text);
                    }
                }
                true
            }
        }
    }

    fn assert_node_match(&self, elm: NodeHandle, vnode: &VNode) -> bool {
        match vnode.kind() {
            VNodeKind::Element { tag } => self
                .adapter
                .borrow()
                .tag_name_of(elm)
                .is_some_and(|actual| actual.eq_ignore_ascii_case(&tag)),
            VNodeKind::Component { .. } => true,
            VNodeKind::Text | VNodeKind::Comment => {
                self.adapter.borrow().tag_name_of(elm).is_none()
            }
        }
    }
}
