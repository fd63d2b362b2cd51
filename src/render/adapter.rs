//! Rendering target abstraction.
//!
//! The patch engine never touches a concrete node type; it speaks to a
//! [`RenderAdapter`] through opaque [`NodeHandle`]s, so the same diff serves
//! a real DOM-like tree, a string builder, or the in-memory test target.

/// Opaque identifier for one backing node owned by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub u64);

/// Capability set the patch engine requires of a rendering target.
///
/// Mutators may panic on a handle the adapter never issued (an invalid handle
/// is a caller bug, not a recoverable state). Read accessors return `None`
/// for absent relations: a detached node has no parent, a text node has no
/// tag name.
pub trait RenderAdapter {
    fn create_element(&mut self, tag: &str) -> NodeHandle;
    fn create_text(&mut self, text: &str) -> NodeHandle;
    fn create_comment(&mut self, text: &str) -> NodeHandle;

    /// Set the text payload. On an element this replaces its children with a
    /// single text payload.
    fn set_text(&mut self, node: NodeHandle, text: &str);

    fn insert_before(&mut self, parent: NodeHandle, node: NodeHandle, reference: NodeHandle);
    fn append_child(&mut self, parent: NodeHandle, node: NodeHandle);
    fn remove_child(&mut self, parent: NodeHandle, node: NodeHandle);

    fn parent_of(&self, node: NodeHandle) -> Option<NodeHandle>;
    fn next_sibling_of(&self, node: NodeHandle) -> Option<NodeHandle>;
    fn first_child_of(&self, node: NodeHandle) -> Option<NodeHandle>;
    fn tag_name_of(&self, node: NodeHandle) -> Option<String>;
    fn text_of(&self, node: NodeHandle) -> Option<String>;
}
