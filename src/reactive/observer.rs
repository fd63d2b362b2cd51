//! Reactive property transform.
//!
//! [`observe`] converts a container [`Value`] into an observed one: the
//! container gets an [`Observer`] (a container-level [`Dep`] plus a root-data
//! usage count) and every object property becomes an accessor slot with its
//! own `Dep` ([`define_reactive`]), recursively. Array elements are observed
//! as containers; element *access* is not interceptable, so reading an array
//! property also registers the whole element cascade ([`depend_array`]).
//!
//! [`set`] and [`del`] are the imperative escape hatches for key additions
//! and removals that plain assignment cannot make reactive after the fact.

use std::cell::Cell;
use std::rc::Rc;

use crate::reactive::dep::{Dep, is_collecting};
use crate::reactive::value::{Arr, Obj, Slot, Value, same_value};

thread_local! {
    static SHOULD_OBSERVE: Cell<bool> = const { Cell::new(true) };
}

/// Enable or disable observation. While disabled, [`observe`] is a no-op for
/// not-yet-observed containers (used e.g. when injecting values that must
/// stay inert).
pub fn toggle_observing(value: bool) {
    SHOULD_OBSERVE.with(|c| c.set(value));
}

fn should_observe() -> bool {
    SHOULD_OBSERVE.with(|c| c.get())
}

// =============================================================================
// Observer
// =============================================================================

/// Per-container observation state: one container-level [`Dep`] (array-level
/// and "whole object replaced" notifications) and a count of how many state
/// roots use this container as their root data.
#[derive(Clone)]
pub struct Observer {
    dep: Dep,
    root_count: Rc<Cell<usize>>,
}

impl Observer {
    fn new() -> Self {
        Observer {
            dep: Dep::new(),
            root_count: Rc::new(Cell::new(0)),
        }
    }

    /// The container-level dep.
    pub fn dep(&self) -> &Dep {
        &self.dep
    }

    /// How many state roots use this container as root data.
    pub fn root_uses(&self) -> usize {
        self.root_count.get()
    }

    fn inc_root(&self) {
        self.root_count.set(self.root_count.get() + 1);
    }
}

// =============================================================================
// observe
// =============================================================================

/// Make a container value observable.
///
/// Idempotent: an already-observed container returns its existing observer.
/// Non-container values, and any container while observation is disabled,
/// return `None`. Observation is eager and recursive.
pub fn observe(value: &Value) -> Option<Observer> {
    match value {
        Value::Obj(obj) => {
            if let Some(ob) = obj.observer() {
                return Some(ob);
            }
            if !should_observe() {
                return None;
            }
            let ob = Observer::new();
            obj.inner.borrow_mut().ob = Some(ob.clone());
            walk(obj);
            Some(ob)
        }
        Value::Arr(arr) => {
            if let Some(ob) = arr.observer() {
                return Some(ob);
            }
            if !should_observe() {
                return None;
            }
            let ob = Observer::new();
            arr.inner.borrow_mut().ob = Some(ob.clone());
            observe_array_items(arr);
            Some(ob)
        }
        _ => None,
    }
}

/// [`observe`] plus marking the container as root data, which guards it
/// against runtime key addition/removal through [`set`]/[`del`].
pub fn observe_root(value: &Value) -> Option<Observer> {
    let ob = observe(value);
    if let Some(ob) = &ob {
        ob.inc_root();
    }
    ob
}

/// Convert every current property into a reactive accessor slot.
fn walk(obj: &Obj) {
    for key in obj.keys() {
        let val = obj.peek(&key).unwrap_or(Value::Null);
        install(obj, &key, val, false);
    }
}

/// Observe every element of an array.
pub(crate) fn observe_array_items(arr: &Arr) {
    for item in arr.snapshot() {
        observe(&item);
    }
}

// =============================================================================
// define_reactive
// =============================================================================

/// Install the accessor pair for `key`: a per-property [`Dep`] and, for
/// container values, a recursively observed child.
pub fn define_reactive(obj: &Obj, key: &str, val: impl Into<Value>) {
    install(obj, key, val.into(), false);
}

/// Like [`define_reactive`] but without recursing into the value.
pub fn define_reactive_shallow(obj: &Obj, key: &str, val: impl Into<Value>) {
    install(obj, key, val.into(), true);
}

fn install(obj: &Obj, key: &str, val: Value, shallow: bool) {
    let child_ob = if shallow { None } else { observe(&val) };
    obj.inner.borrow_mut().slots.insert(
        key.to_string(),
        Slot {
            value: val,
            dep: Some(Dep::new()),
            child_ob,
            shallow,
        },
    );
}

// =============================================================================
// Accessor pair
// =============================================================================

impl Obj {
    /// Reactive getter.
    ///
    /// When a watcher is collecting, registers the property dep; if the value
    /// is an observed container, also the container dep; and for arrays the
    /// whole element cascade, so "read the array property" reacts to "mutate
    /// an element that is itself reactive".
    pub fn get(&self, key: &str) -> Option<Value> {
        let (value, dep, child_ob) = {
            let inner = self.inner.borrow();
            let slot = inner.slots.get(key)?;
            (slot.value.clone(), slot.dep.clone(), slot.child_ob.clone())
        };
        if is_collecting() {
            if let Some(dep) = dep {
                dep.depend();
                if let Some(child) = child_ob {
                    child.dep().depend();
                    if let Value::Arr(arr) = &value {
                        depend_array(arr);
                    }
                }
            }
        }
        Some(value)
    }

    /// Reactive setter.
    ///
    /// No-op when the new value is unchanged under the setter rule (NaN is
    /// self-equal). Otherwise stores, re-observes container values, and
    /// notifies the property dep. Writing a key that has no reactive slot
    /// falls back to a raw insert - plain assignment cannot make a new key
    /// reactive; that is what [`set`] is for.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let (dep, shallow) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.slots.contains_key(key) {
                inner.slots.insert(
                    key.to_string(),
                    Slot {
                        value,
                        dep: None,
                        child_ob: None,
                        shallow: false,
                    },
                );
                return;
            }
            let slot = inner.slots.get_mut(key).unwrap();
            match slot.dep.clone() {
                None => {
                    slot.value = value;
                    return;
                }
                Some(dep) => {
                    if same_value(&slot.value, &value) {
                        return;
                    }
                    slot.value = value.clone();
                    (dep, slot.shallow)
                }
            }
        };
        // Re-observe and notify outside the container borrow: observation
        // walks into the new value and subscribers may read this object.
        let child_ob = if shallow { None } else { observe(&value) };
        if let Some(slot) = self.inner.borrow_mut().slots.get_mut(key) {
            slot.child_ob = child_ob;
        }
        dep.notify();
    }
}

/// Register the container dep of every (recursively) observed array element.
pub(crate) fn depend_array(arr: &Arr) {
    for item in arr.snapshot() {
        match &item {
            Value::Obj(o) => {
                if let Some(ob) = o.observer() {
                    ob.dep().depend();
                }
            }
            Value::Arr(a) => {
                if let Some(ob) = a.observer() {
                    ob.dep().depend();
                }
                depend_array(a);
            }
            _ => {}
        }
    }
}

// =============================================================================
// set / del escape hatches
// =============================================================================

/// Add or replace a property/element reactively.
///
/// For arrays, `key` must parse as an index and the write goes through the
/// intercepted `splice`; an index past the end first grows the array with
/// nulls (silently, so the splice still notifies exactly once). For objects,
/// an existing reactive slot is a plain reactive write; a new key becomes a
/// reactive slot and the container dep is notified. Root data refuses new
/// keys (declare them up front).
pub fn set(target: &Value, key: &str, val: impl Into<Value>) {
    let val = val.into();
    match target {
        Value::Arr(arr) => {
            let Ok(index) = key.parse::<usize>() else {
                tracing::warn!(key, "cannot set a non-index key on an array");
                return;
            };
            if index > arr.len() {
                let mut inner = arr.inner.borrow_mut();
                while inner.items.len() < index {
                    inner.items.push(Value::Null);
                }
            }
            arr.splice(index, 1, vec![val]);
        }
        Value::Obj(obj) => {
            let has_reactive_slot = {
                let inner = obj.inner.borrow();
                inner.slots.get(key).is_some_and(|s| s.dep.is_some())
            };
            if has_reactive_slot {
                obj.set(key, val);
                return;
            }
            let ob = obj.observer();
            match ob {
                Some(ob) if ob.root_uses() > 0 => {
                    tracing::warn!(
                        key,
                        "avoid adding reactive properties to root data at runtime - \
                         declare it upfront"
                    );
                }
                Some(ob) => {
                    define_reactive(obj, key, val);
                    ob.dep().notify();
                }
                None => {
                    obj.insert(key, val);
                }
            }
        }
        _ => {
            tracing::warn!(key, "cannot set a reactive property on a primitive value");
        }
    }
}

/// Delete a property/element and notify if the container is observed.
pub fn del(target: &Value, key: &str) {
    match target {
        Value::Arr(arr) => {
            if let Ok(index) = key.parse::<usize>() {
                if index < arr.len() {
                    arr.splice(index, 1, Vec::new());
                }
            }
        }
        Value::Obj(obj) => {
            let ob = obj.observer();
            if let Some(ob) = &ob {
                if ob.root_uses() > 0 {
                    tracing::warn!(key, "avoid deleting properties on root data - set it to null");
                    return;
                }
            }
            let removed = obj.inner.borrow_mut().slots.remove(key).is_some();
            if !removed {
                return;
            }
            if let Some(ob) = ob {
                ob.dep().notify();
            }
        }
        _ => {
            tracing::warn!(key, "cannot delete a reactive property on a primitive value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed_obj(pairs: &[(&str, Value)]) -> Obj {
        let obj: Obj = pairs.iter().map(|(k, v)| (*k, v.clone())).collect();
        observe(&Value::Obj(obj.clone()));
        obj
    }

    #[test]
    fn test_observe_is_idempotent() {
        let obj = Obj::new();
        let v = Value::Obj(obj.clone());
        let a = observe(&v).unwrap();
        let b = observe(&v).unwrap();
        assert_eq!(a.dep().id(), b.dep().id());
    }

    #[test]
    fn test_observe_respects_toggle() {
        toggle_observing(false);
        let obj = Obj::new();
        assert!(observe(&Value::Obj(obj.clone())).is_none());
        toggle_observing(true);
        assert!(observe(&Value::Obj(obj)).is_some());
    }

    #[test]
    fn test_observation_is_recursive() {
        let nested = Obj::new();
        nested.insert("x", 1i64);
        let obj = observed_obj(&[("inner", Value::Obj(nested.clone()))]);
        assert!(obj.observer().is_some());
        assert!(nested.observer().is_some());
    }

    #[test]
    fn test_setter_reobserves_new_containers() {
        let obj = observed_obj(&[("a", Value::int(1))]);
        let fresh = Obj::new();
        fresh.insert("x", 2i64);
        obj.set("a", Value::Obj(fresh.clone()));
        assert!(fresh.observer().is_some());
    }

    #[test]
    fn test_set_adds_reactive_key_on_observed_obj() {
        let obj = observed_obj(&[("a", Value::int(1))]);
        set(&Value::Obj(obj.clone()), "b", 2i64);
        let inner = obj.inner.borrow();
        assert!(inner.slots.get("b").unwrap().dep.is_some());
    }

    #[test]
    fn test_set_refuses_new_keys_on_root_data() {
        let obj = Obj::new();
        let v = Value::Obj(obj.clone());
        observe_root(&v);
        set(&v, "late", 1i64);
        assert!(!obj.contains_key("late"));
    }

    #[test]
    fn test_set_extends_array_past_its_end() {
        let arr: Arr = [1i64].into_iter().collect();
        let v = Value::Arr(arr.clone());
        observe(&v);
        set(&v, "3", 9i64);
        assert_eq!(
            arr.snapshot(),
            vec![Value::int(1), Value::Null, Value::Null, Value::int(9)]
        );
    }

    #[test]
    fn test_del_removes_and_is_silent_on_missing() {
        let obj = observed_obj(&[("a", Value::int(1))]);
        let v = Value::Obj(obj.clone());
        del(&v, "a");
        assert!(!obj.contains_key("a"));
        del(&v, "a"); // no-op
    }
}
