//! Keyed-children reconciliation against the in-memory target.

use proptest::prelude::*;
use ripple_ui::{AdapterOp, Key, MemoryRenderer, NodeHandle, Patcher, VNode, VNodeData};

fn item(key: i64) -> VNode {
    let data = VNodeData {
        key: Some(Key::Num(key)),
        ..Default::default()
    };
    VNode::element("li", data, vec![VNode::text(key.to_string())])
}

fn list(children: Vec<VNode>) -> VNode {
    VNode::element("ul", VNodeData::default(), children)
}

fn mount(patcher: &Patcher<MemoryRenderer>, vnode: &VNode) -> NodeHandle {
    let elm = patcher.patch(None, Some(vnode)).unwrap();
    patcher.adapter().borrow_mut().take_ops();
    elm
}

#[test]
fn test_reverse_is_all_moves() {
    let patcher = Patcher::new(MemoryRenderer::new());
    let old = list((0..5).map(item).collect());
    let root = mount(&patcher, &old);
    let handles: Vec<_> = old.children().iter().map(|c| c.elm().unwrap()).collect();

    let new = list((0..5).rev().map(item).collect());
    patcher.patch(Some(&old), Some(&new));

    let adapter = patcher.adapter();
    let mut adapter = adapter.borrow_mut();
    let ops = adapter.take_ops();
    assert!(ops.iter().all(|op| !op.is_creation() && !op.is_removal()));
    let expected: Vec<_> = handles.iter().rev().copied().collect();
    assert_eq!(adapter.children_of(root), expected);
}

#[test]
fn test_prepend_creates_only_the_new_head() {
    let patcher = Patcher::new(MemoryRenderer::new());
    let old = list(vec![item(1), item(2)]);
    let root = mount(&patcher, &old);

    let new = list(vec![item(0), item(1), item(2)]);
    patcher.patch(Some(&old), Some(&new));

    let adapter = patcher.adapter();
    let mut adapter = adapter.borrow_mut();
    let ops = adapter.take_ops();
    // one li plus its text child
    assert_eq!(ops.iter().filter(|op| op.is_creation()).count(), 2);
    assert!(ops.iter().all(|op| !op.is_removal()));
    assert_eq!(adapter.to_html(root), "<ul><li>0</li><li>1</li><li>2</li></ul>");
}

#[test]
fn test_clear_removes_everything() {
    let patcher = Patcher::new(MemoryRenderer::new());
    let old = list(vec![item(1), item(2), item(3)]);
    let root = mount(&patcher, &old);

    let new = list(vec![]);
    patcher.patch(Some(&old), Some(&new));

    let adapter = patcher.adapter();
    let adapter = adapter.borrow();
    assert_eq!(adapter.children_of(root), vec![]);
    assert_eq!(adapter.ops().iter().filter(|op| op.is_removal()).count(), 3);
}

#[test]
fn test_mixed_shuffle_with_additions_and_removals() {
    let patcher = Patcher::new(MemoryRenderer::new());
    let old = list(vec![item(1), item(2), item(3), item(4)]);
    let root = mount(&patcher, &old);
    let kept: Vec<_> = old.children().iter().map(|c| c.elm().unwrap()).collect();

    // drop 2, add 5, reorder the rest
    let new = list(vec![item(4), item(5), item(1), item(3)]);
    patcher.patch(Some(&old), Some(&new));

    let adapter = patcher.adapter();
    let mut adapter = adapter.borrow_mut();
    assert_eq!(
        adapter.to_html(root),
        "<ul><li>4</li><li>5</li><li>1</li><li>3</li></ul>"
    );
    // surviving keys kept their backing nodes
    let children = adapter.children_of(root);
    assert_eq!(children[0], kept[3]);
    assert_eq!(children[2], kept[0]);
    assert_eq!(children[3], kept[2]);
    let ops = adapter.take_ops();
    assert_eq!(ops.iter().filter(|op| op.is_removal()).count(), 1);
    assert!(!ops.iter().any(|op| matches!(op, AdapterOp::RemoveChild { node, .. } if *node == kept[0])));
}

proptest! {
    // Every permutation of a keyed list must be resolved purely by moving
    // the existing backing nodes.
    #[test]
    fn test_keyed_permutations_reuse_every_backing_node(
        perm in (2usize..8).prop_flat_map(|n| {
            Just((0..n as i64).collect::<Vec<_>>()).prop_shuffle()
        })
    ) {
        let patcher = Patcher::new(MemoryRenderer::new());
        let old = list((0..perm.len() as i64).map(item).collect());
        let root = mount(&patcher, &old);
        let handles: Vec<_> = old.children().iter().map(|c| c.elm().unwrap()).collect();

        let new = list(perm.iter().copied().map(item).collect());
        patcher.patch(Some(&old), Some(&new));

        let adapter = patcher.adapter();
        let mut adapter = adapter.borrow_mut();
        let ops = adapter.take_ops();
        prop_assert!(ops.iter().all(|op| !op.is_creation() && !op.is_removal()));

        let expected: Vec<_> = perm.iter().map(|k| handles[*k as usize]).collect();
        prop_assert_eq!(adapter.children_of(root), expected);
    }
}
