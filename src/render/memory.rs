//! In-memory rendering target.
//!
//! A small DOM-shaped arena used by the test suites and by string-building
//! render targets: every mutation the patch engine performs is appended to an
//! operation log, so a test can assert not just the final tree shape but the
//! exact writes that produced it. [`MemoryRenderer::to_html`] serializes a
//! subtree for snapshot-style assertions.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::render::adapter::{NodeHandle, RenderAdapter};

/// One recorded adapter write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterOp {
    CreateElement { node: NodeHandle, tag: String },
    CreateText { node: NodeHandle, text: String },
    CreateComment { node: NodeHandle, text: String },
    SetText { node: NodeHandle, text: String },
    InsertBefore { parent: NodeHandle, node: NodeHandle, reference: NodeHandle },
    AppendChild { parent: NodeHandle, node: NodeHandle },
    RemoveChild { parent: NodeHandle, node: NodeHandle },
}

impl AdapterOp {
    /// Whether this op allocated a new backing node.
    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            AdapterOp::CreateElement { .. }
                | AdapterOp::CreateText { .. }
                | AdapterOp::CreateComment { .. }
        )
    }

    /// Whether this op detached a node.
    pub fn is_removal(&self) -> bool {
        matches!(self, AdapterOp::RemoveChild { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MemKind {
    Element { tag: String },
    Text,
    Comment,
}

#[derive(Debug)]
struct MemNode {
    kind: MemKind,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    attrs: BTreeMap<String, String>,
    text: String,
}

/// Arena-backed tree adapter with an operation log.
#[derive(Default)]
pub struct MemoryRenderer {
    nodes: AHashMap<u64, MemNode>,
    next_id: u64,
    ops: Vec<AdapterOp>,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: MemKind, text: String) -> NodeHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            MemNode {
                kind,
                parent: None,
                children: Vec::new(),
                attrs: BTreeMap::new(),
                text,
            },
        );
        NodeHandle(id)
    }

    fn node(&self, handle: NodeHandle) -> &MemNode {
        self.nodes
            .get(&handle.0)
            .unwrap_or_else(|| panic!("invalid node handle {handle:?}"))
    }

    fn node_mut(&mut self, handle: NodeHandle) -> &mut MemNode {
        self.nodes
            .get_mut(&handle.0)
            .unwrap_or_else(|| panic!("invalid node handle {handle:?}"))
    }

    fn detach(&mut self, handle: NodeHandle) {
        if let Some(parent) = self.node(handle).parent {
            self.node_mut(parent).children.retain(|c| *c != handle);
            self.node_mut(handle).parent = None;
        }
    }

    /// Whether the arena still holds this handle.
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(&handle.0)
    }

    /// Child handles in order.
    pub fn children_of(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        self.node(handle).children.clone()
    }

    /// Attribute storage for platform-style modules (not part of the adapter
    /// capability set the diff itself uses).
    pub fn set_attribute(&mut self, handle: NodeHandle, name: &str, value: &str) {
        self.node_mut(handle)
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_attribute(&mut self, handle: NodeHandle, name: &str) {
        self.node_mut(handle).attrs.remove(name);
    }

    pub fn attribute(&self, handle: NodeHandle, name: &str) -> Option<String> {
        self.node(handle).attrs.get(name).cloned()
    }

    /// The write log since the last [`MemoryRenderer::take_ops`].
    pub fn ops(&self) -> &[AdapterOp] {
        &self.ops
    }

    /// Drain the write log.
    pub fn take_ops(&mut self) -> Vec<AdapterOp> {
        std::mem::take(&mut self.ops)
    }

    /// Serialize a subtree to an HTML-ish string.
    pub fn to_html(&self, handle: NodeHandle) -> String {
        let node = self.node(handle);
        match &node.kind {
            MemKind::Text => node.text.clone(),
            MemKind::Comment => format!("<!--{}-->", node.text),
            MemKind::Element { tag } => {
                let mut out = String::new();
                out.push('<');
                out.push_str(tag);
                for (name, value) in &node.attrs {
                    out.push_str(&format!(" {name}=\"{value}\""));
                }
                out.push('>');
                if node.children.is_empty() {
                    out.push_str(&node.text);
                } else {
                    for child in &node.children {
                        out.push_str(&self.to_html(*child));
                    }
                }
                out.push_str(&format!("</{tag}>"));
                out
            }
        }
    }
}

impl RenderAdapter for MemoryRenderer {
    fn create_element(&mut self, tag: &str) -> NodeHandle {
        let node = self.alloc(MemKind::Element { tag: tag.to_string() }, String::new());
        self.ops.push(AdapterOp::CreateElement {
            node,
            tag: tag.to_string(),
        });
        node
    }

    fn create_text(&mut self, text: &str) -> NodeHandle {
        let node = self.alloc(MemKind::Text, text.to_string());
        self.ops.push(AdapterOp::CreateText {
            node,
            text: text.to_string(),
        });
        node
    }

    fn create_comment(&mut self, text: &str) -> NodeHandle {
        let node = self.alloc(MemKind::Comment, text.to_string());
        self.ops.push(AdapterOp::CreateComment {
            node,
            text: text.to_string(),
        });
        node
    }

    fn set_text(&mut self, node: NodeHandle, text: &str) {
        let children = std::mem::take(&mut self.node_mut(node).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
        self.node_mut(node).text = text.to_string();
        self.ops.push(AdapterOp::SetText {
            node,
            text: text.to_string(),
        });
    }

    fn insert_before(&mut self, parent: NodeHandle, node: NodeHandle, reference: NodeHandle) {
        self.detach(node);
        let index = self
            .node(parent)
            .children
            .iter()
            .position(|c| *c == reference)
            .unwrap_or_else(|| panic!("reference {reference:?} is not a child of {parent:?}"));
        self.node_mut(parent).children.insert(index, node);
        self.node_mut(node).parent = Some(parent);
        self.ops.push(AdapterOp::InsertBefore {
            parent,
            node,
            reference,
        });
    }

    fn append_child(&mut self, parent: NodeHandle, node: NodeHandle) {
        self.detach(node);
        self.node_mut(parent).children.push(node);
        self.node_mut(node).parent = Some(parent);
        self.ops.push(AdapterOp::AppendChild { parent, node });
    }

    fn remove_child(&mut self, parent: NodeHandle, node: NodeHandle) {
        debug_assert_eq!(self.node(node).parent, Some(parent));
        self.detach(node);
        self.ops.push(AdapterOp::RemoveChild { parent, node });
    }

    fn parent_of(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.node(node).parent
    }

    fn next_sibling_of(&self, node: NodeHandle) -> Option<NodeHandle> {
        let parent = self.node(node).parent?;
        let siblings = &self.node(parent).children;
        let index = siblings.iter().position(|c| *c == node)?;
        siblings.get(index + 1).copied()
    }

    fn first_child_of(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.node(node).children.first().copied()
    }

    fn tag_name_of(&self, node: NodeHandle) -> Option<String> {
        match &self.node(node).kind {
            MemKind::Element { tag } => Some(tag.clone()),
            _ => None,
        }
    }

    fn text_of(&self, node: NodeHandle) -> Option<String> {
        match self.node(node).kind {
            MemKind::Text | MemKind::Comment => Some(self.node(node).text.clone()),
            MemKind::Element { .. } => None,
        }
    }
}
