//! End-to-end pipeline: reactive state driving the patch engine through the
//! scheduler tick.

use std::rc::Rc;

use ripple_ui::reactive::scheduler;
use ripple_ui::{
    AdapterOp, Arr, Key, MemoryRenderer, Obj, Patcher, RenderAdapter, Value, VNode, VNodeData,
    mount, observe_root,
};

fn keyed_span(key: &str, text: &str) -> VNode {
    let data = VNodeData {
        key: Some(Key::from(key)),
        ..Default::default()
    };
    VNode::element("span", data, vec![VNode::text(text)])
}

fn setup(state: &Obj) -> (Rc<Patcher<MemoryRenderer>>, ripple_ui::NodeHandle) {
    scheduler::reset_scheduler_state();
    observe_root(&Value::Obj(state.clone()));
    let patcher = Rc::new(Patcher::new(MemoryRenderer::new()));
    let container = patcher.adapter().borrow_mut().create_element("main");
    (patcher, container)
}

#[test]
fn test_keyed_update_patches_minimally() {
    let state: Obj = [("extra", Value::Bool(false)), ("label", Value::str("1"))]
        .into_iter()
        .collect();
    let (patcher, container) = setup(&state);

    let source = state.clone();
    let handle = mount(patcher.clone(), container, false, move || {
        let label = source
            .get("label")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let mut children = vec![keyed_span("a", &label)];
        if matches!(source.get("extra"), Some(Value::Bool(true))) {
            children.push(keyed_span("b", "3"));
        }
        Ok(VNode::element("div", VNodeData::default(), children))
    })
    .unwrap();

    let root = handle.root_elm().unwrap();
    let a_elm = {
        let adapter = patcher.adapter();
        let mut adapter = adapter.borrow_mut();
        assert_eq!(adapter.to_html(root), "<div><span>1</span></div>");
        adapter.take_ops();
        adapter.first_child_of(root).unwrap()
    };

    state.set("label", "2");
    state.set("extra", true);
    scheduler::flush().unwrap();

    let adapter = patcher.adapter();
    let mut adapter = adapter.borrow_mut();
    assert_eq!(adapter.to_html(root), "<div><span>2</span><span>3</span></div>");
    // span a kept its backing node
    assert_eq!(adapter.first_child_of(root), Some(a_elm));

    let ops = adapter.take_ops();
    let text_updates: Vec<_> = ops
        .iter()
        .filter(|op| matches!(op, AdapterOp::SetText { .. }))
        .collect();
    assert_eq!(text_updates.len(), 1);
    // one new span and its text child, nothing recreated or removed
    assert_eq!(ops.iter().filter(|op| op.is_creation()).count(), 2);
    assert!(ops.iter().all(|op| !op.is_removal()));
}

#[test]
fn test_two_mutations_one_re_render() {
    let state: Obj = [("a", Value::int(0)), ("b", Value::int(0))]
        .into_iter()
        .collect();
    let (patcher, container) = setup(&state);

    let renders = Rc::new(std::cell::Cell::new(0));
    let renders2 = renders.clone();
    let source = state.clone();
    let _handle = mount(patcher.clone(), container, false, move || {
        renders2.set(renders2.get() + 1);
        let a = source.get("a").and_then(|v| v.as_num()).unwrap_or(0.0);
        let b = source.get("b").and_then(|v| v.as_num()).unwrap_or(0.0);
        Ok(VNode::element(
            "p",
            VNodeData::default(),
            vec![VNode::text(format!("{}", a + b))],
        ))
    })
    .unwrap();
    assert_eq!(renders.get(), 1);

    state.set("a", 1i64);
    state.set("b", 2i64);
    scheduler::flush().unwrap();
    // both mutations applied in a single pass
    assert_eq!(renders.get(), 2);
}

#[test]
fn test_observed_array_drives_the_list() {
    let items: Arr = ["one", "two"].into_iter().map(Value::str).collect();
    let state: Obj = [("items", Value::Arr(items.clone()))].into_iter().collect();
    let (patcher, container) = setup(&state);

    let source = state.clone();
    let handle = mount(patcher.clone(), container, false, move || {
        let items = source.get("items").and_then(|v| v.as_arr().cloned());
        let children = items
            .map(|arr| {
                arr.snapshot()
                    .iter()
                    .filter_map(|v| v.as_str().map(|s| keyed_span(s, s)))
                    .collect()
            })
            .unwrap_or_default();
        Ok(VNode::element("div", VNodeData::default(), children))
    })
    .unwrap();
    let root = handle.root_elm().unwrap();
    patcher.adapter().borrow_mut().take_ops();

    items.push(Value::str("three"));
    scheduler::flush().unwrap();

    let adapter = patcher.adapter();
    let mut adapter = adapter.borrow_mut();
    assert_eq!(
        adapter.to_html(root),
        "<div><span>one</span><span>two</span><span>three</span></div>"
    );
    // one new span and its text, the existing two reused
    assert_eq!(
        adapter
            .take_ops()
            .iter()
            .filter(|op| op.is_creation())
            .count(),
        2
    );
}

#[test]
fn test_next_tick_observes_the_patched_tree() {
    let state: Obj = [("label", Value::str("before"))].into_iter().collect();
    let (patcher, container) = setup(&state);

    let source = state.clone();
    let handle = mount(patcher.clone(), container, false, move || {
        let label = source
            .get("label")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Ok(VNode::element(
            "p",
            VNodeData::default(),
            vec![VNode::text(&label)],
        ))
    })
    .unwrap();
    let root = handle.root_elm().unwrap();

    state.set("label", "after");
    let seen = Rc::new(std::cell::RefCell::new(String::new()));
    let seen2 = seen.clone();
    let patcher2 = patcher.clone();
    scheduler::next_tick(move || {
        *seen2.borrow_mut() = patcher2.adapter().borrow().to_html(root);
    });
    scheduler::flush().unwrap();
    assert_eq!(&*seen.borrow(), "<p>after</p>");
}
