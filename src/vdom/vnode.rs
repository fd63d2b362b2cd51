//! Virtual node type.
//!
//! A [`VNode`] describes one UI node for a single render pass. Nodes are
//! shared handles: the patch engine stores the backing [`NodeHandle`] on the
//! node while diffing, and component placeholders stay aliased to their live
//! instance across passes. The tree itself is rebuilt fresh on every render;
//! the previous tree survives only as the diff baseline.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use bitflags::bitflags;

use crate::render::adapter::NodeHandle;

/// Identity key for keyed children reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Str(Rc<str>),
    Num(i64),
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(Rc::from(s))
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Num(n)
    }
}

bitflags! {
    /// Per-node markers consumed by the patch engine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct VNodeFlags: u8 {
        /// Hoisted static subtree.
        const STATIC            = 1 << 0;
        /// Shallow clone of a node reused across renders.
        const CLONED            = 1 << 1;
        /// Render-once subtree.
        const ONCE              = 1 << 2;
        /// Placeholder comment for an unresolved async factory.
        const ASYNC_PLACEHOLDER = 1 << 3;
        /// Inserted as a subtree root rather than nested under a fresh parent.
        const ROOT_INSERT       = 1 << 4;
    }
}

/// What kind of node this is. Tag payloads are cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VNodeKind {
    Element { tag: Rc<str> },
    Text,
    Comment,
    Component { name: Rc<str> },
}

/// Data bag attached to a node: attributes, class, style, event listeners.
///
/// Opaque to the diff algorithm itself. Modules consume it in their
/// create/update hooks; the engine only cares whether it is present
/// (`same_vnode` compares data-definedness) and about `attrs["type"]` on
/// inputs.
#[derive(Clone, Default)]
pub struct VNodeData {
    pub key: Option<Key>,
    pub attrs: BTreeMap<String, String>,
    pub class: Option<String>,
    pub style: BTreeMap<String, String>,
    pub on: Vec<(String, Rc<dyn Fn()>)>,
}

impl std::fmt::Debug for VNodeData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VNodeData")
            .field("key", &self.key)
            .field("attrs", &self.attrs)
            .field("class", &self.class)
            .field("style", &self.style)
            .field("on", &self.on.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

/// Shared handle to an unresolved-component factory. Placeholder identity is
/// handle identity; `failed` poisons `same_vnode` so a failed placeholder is
/// replaced instead of patched.
#[derive(Clone)]
pub struct AsyncFactory {
    inner: Rc<AsyncFactoryInner>,
}

struct AsyncFactoryInner {
    resolved: std::cell::Cell<bool>,
    failed: std::cell::Cell<bool>,
}

impl AsyncFactory {
    pub fn new() -> Self {
        AsyncFactory {
            inner: Rc::new(AsyncFactoryInner {
                resolved: std::cell::Cell::new(false),
                failed: std::cell::Cell::new(false),
            }),
        }
    }

    pub fn ptr_eq(&self, other: &AsyncFactory) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.resolved.get()
    }

    pub fn resolve(&self) {
        self.inner.resolved.set(true);
    }

    pub fn is_failed(&self) -> bool {
        self.inner.failed.get()
    }

    pub fn fail(&self) {
        self.inner.failed.set(true);
    }
}

impl Default for AsyncFactory {
    fn default() -> Self {
        Self::new()
    }
}

struct VNodeInner {
    kind: VNodeKind,
    key: Option<Key>,
    data: Option<VNodeData>,
    children: Vec<VNode>,
    text: Option<String>,
    elm: Option<NodeHandle>,
    // component placeholder linkage only, never ownership
    parent: Weak<RefCell<VNodeInner>>,
    component_instance: Option<u64>,
    async_factory: Option<AsyncFactory>,
    flags: VNodeFlags,
}

/// One node of a virtual tree. Cheap to clone (shared handle); use
/// [`VNode::clone_node`] for the shallow-copy used by static subtree reuse.
#[derive(Clone)]
pub struct VNode {
    inner: Rc<RefCell<VNodeInner>>,
}

impl VNode {
    fn build(kind: VNodeKind, data: Option<VNodeData>, children: Vec<VNode>, text: Option<String>) -> VNode {
        let key = data.as_ref().and_then(|d| d.key.clone());
        VNode {
            inner: Rc::new(RefCell::new(VNodeInner {
                kind,
                key,
                data,
                children,
                text,
                elm: None,
                parent: Weak::new(),
                component_instance: None,
                async_factory: None,
                flags: VNodeFlags::empty(),
            })),
        }
    }

    /// Element node. The key, if any, comes from `data.key`.
    pub fn element(tag: &str, data: VNodeData, children: Vec<VNode>) -> VNode {
        VNode::build(
            VNodeKind::Element { tag: Rc::from(tag) },
            Some(data),
            children,
            None,
        )
    }

    /// Element node with no data bag (bare tag).
    pub fn bare_element(tag: &str, children: Vec<VNode>) -> VNode {
        VNode::build(VNodeKind::Element { tag: Rc::from(tag) }, None, children, None)
    }

    /// Text node.
    pub fn text(text: impl Into<String>) -> VNode {
        VNode::build(VNodeKind::Text, None, Vec::new(), Some(text.into()))
    }

    /// Comment node.
    pub fn comment(text: impl Into<String>) -> VNode {
        VNode::build(VNodeKind::Comment, None, Vec::new(), Some(text.into()))
    }

    /// Empty placeholder (a comment with empty text).
    pub fn empty() -> VNode {
        VNode::comment("")
    }

    /// Component placeholder node.
    pub fn component(name: &str, data: VNodeData) -> VNode {
        VNode::build(
            VNodeKind::Component { name: Rc::from(name) },
            Some(data),
            Vec::new(),
            None,
        )
    }

    /// Placeholder comment standing in for an unresolved async factory.
    pub fn async_placeholder(factory: AsyncFactory) -> VNode {
        let node = VNode::comment("");
        {
            let mut inner = node.inner.borrow_mut();
            inner.async_factory = Some(factory);
            inner.flags |= VNodeFlags::ASYNC_PLACEHOLDER;
        }
        node
    }

    /// Shallow clone marked `CLONED`.
    ///
    /// Used when a node produced by an earlier render shows up again in a new
    /// children list: overwriting its backing handle in place would corrupt
    /// the earlier tree's insertion references, so the reused node is cloned
    /// before a new backing node is created for it.
    pub fn clone_node(&self) -> VNode {
        let inner = self.inner.borrow();
        VNode {
            inner: Rc::new(RefCell::new(VNodeInner {
                kind: inner.kind.clone(),
                key: inner.key.clone(),
                data: inner.data.clone(),
                children: inner.children.clone(),
                text: inner.text.clone(),
                elm: inner.elm,
                parent: inner.parent.clone(),
                component_instance: inner.component_instance,
                async_factory: inner.async_factory.clone(),
                flags: inner.flags | VNodeFlags::CLONED,
            })),
        }
    }

    /// Handle identity.
    pub fn ptr_eq(&self, other: &VNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn kind(&self) -> VNodeKind {
        self.inner.borrow().kind.clone()
    }

    /// Element tag, if this is an element.
    pub fn tag(&self) -> Option<Rc<str>> {
        match &self.inner.borrow().kind {
            VNodeKind::Element { tag } => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<Key> {
        self.inner.borrow().key.clone()
    }

    pub fn has_data(&self) -> bool {
        self.inner.borrow().data.is_some()
    }

    /// Clone of the data bag.
    pub fn data(&self) -> Option<VNodeData> {
        self.inner.borrow().data.clone()
    }

    /// Attribute lookup in the data bag.
    pub fn attr(&self, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .data
            .as_ref()
            .and_then(|d| d.attrs.get(name).cloned())
    }

    /// Clone of the children handle list.
    pub fn children(&self) -> Vec<VNode> {
        self.inner.borrow().children.clone()
    }

    pub fn has_children(&self) -> bool {
        !self.inner.borrow().children.is_empty()
    }

    /// Swap the child at `index` (clone-on-reuse bookkeeping).
    pub(crate) fn replace_child(&self, index: usize, child: VNode) {
        self.inner.borrow_mut().children[index] = child;
    }

    pub fn text_payload(&self) -> Option<String> {
        self.inner.borrow().text.clone()
    }

    pub fn elm(&self) -> Option<NodeHandle> {
        self.inner.borrow().elm
    }

    pub fn set_elm(&self, elm: Option<NodeHandle>) {
        self.inner.borrow_mut().elm = elm;
    }

    /// Ancestor placeholder, if this node is a component root.
    pub fn parent(&self) -> Option<VNode> {
        self.inner.borrow().parent.upgrade().map(|inner| VNode { inner })
    }

    /// Link this node to its placeholder ancestor (weak, linkage only).
    pub fn set_parent(&self, parent: &VNode) {
        self.inner.borrow_mut().parent = Rc::downgrade(&parent.inner);
    }

    pub fn component_instance(&self) -> Option<u64> {
        self.inner.borrow().component_instance
    }

    pub fn set_component_instance(&self, instance: Option<u64>) {
        self.inner.borrow_mut().component_instance = instance;
    }

    pub fn async_factory(&self) -> Option<AsyncFactory> {
        self.inner.borrow().async_factory.clone()
    }

    pub fn flags(&self) -> VNodeFlags {
        self.inner.borrow().flags
    }

    pub fn insert_flags(&self, flags: VNodeFlags) {
        self.inner.borrow_mut().flags |= flags;
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.inner.borrow().kind, VNodeKind::Comment)
    }

    pub fn is_static(&self) -> bool {
        self.flags().contains(VNodeFlags::STATIC)
    }

    pub fn is_async_placeholder(&self) -> bool {
        self.flags().contains(VNodeFlags::ASYNC_PLACEHOLDER)
    }

    pub(crate) fn set_root_insert(&self, root: bool) {
        let mut inner = self.inner.borrow_mut();
        if root {
            inner.flags |= VNodeFlags::ROOT_INSERT;
        } else {
            inner.flags -= VNodeFlags::ROOT_INSERT;
        }
    }
}

impl std::fmt::Debug for VNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("VNode")
            .field("kind", &inner.kind)
            .field("key", &inner.key)
            .field("text", &inner.text)
            .field("children", &inner.children.len())
            .field("elm", &inner.elm)
            .field("flags", &inner.flags)
            .finish()
    }
}
