//! Deep-dependency traversal.
//!
//! Reads every nested property through the reactive getters so the active
//! collector subscribes to the entire subtree. Used by `deep` watchers right
//! after their getter returns, while the collector frame is still on the
//! stack. Revisits of a container are cut off by a seen-set keyed on the
//! container dep id, which also terminates on cyclic state.

use ahash::AHashSet;

use crate::reactive::value::Value;

/// Touch every nested slot of `value` for deep dependency collection.
pub fn traverse(value: &Value) {
    let mut seen = AHashSet::new();
    walk(value, &mut seen);
}

fn walk(value: &Value, seen: &mut AHashSet<u64>) {
    match value {
        Value::Obj(obj) => {
            if let Some(ob) = obj.observer() {
                if !seen.insert(ob.dep().id()) {
                    return;
                }
            }
            // Obj::get is the tracked getter: each read registers the
            // property dep on the active collector.
            for key in obj.keys() {
                if let Some(child) = obj.get(&key) {
                    walk(&child, seen);
                }
            }
        }
        Value::Arr(arr) => {
            if let Some(ob) = arr.observer() {
                if !seen.insert(ob.dep().id()) {
                    return;
                }
            }
            for i in 0..arr.len() {
                if let Some(child) = arr.get(i) {
                    walk(&child, seen);
                }
            }
        }
        _ => {}
    }
}
