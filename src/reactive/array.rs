//! Intercepted array mutators.
//!
//! The seven mutating operations are methods on [`Arr`] with one shared
//! contract: perform the mutation, observe any inserted elements, then notify
//! the array's container dep exactly once. The original relied on prototype
//! swapping to intercept these; here the collection itself is the wrapper
//! (see the redesign note in DESIGN.md).
//!
//! Plain index assignment stays outside the contract - `Arr::set_index` is
//! raw and non-reactive, with `reactive::set` as the escape hatch.

use crate::reactive::observer::observe;
use crate::reactive::value::{Arr, Value};

impl Arr {
    /// Append an element.
    pub fn push(&self, value: impl Into<Value>) {
        let value = value.into();
        self.inner.borrow_mut().items.push(value.clone());
        self.after_mutation(&[value]);
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<Value> {
        let popped = self.inner.borrow_mut().items.pop();
        if popped.is_some() {
            self.after_mutation(&[]);
        }
        popped
    }

    /// Remove and return the first element.
    pub fn shift(&self) -> Option<Value> {
        let shifted = {
            let mut inner = self.inner.borrow_mut();
            if inner.items.is_empty() {
                None
            } else {
                Some(inner.items.remove(0))
            }
        };
        if shifted.is_some() {
            self.after_mutation(&[]);
        }
        shifted
    }

    /// Prepend an element.
    pub fn unshift(&self, value: impl Into<Value>) {
        let value = value.into();
        self.inner.borrow_mut().items.insert(0, value.clone());
        self.after_mutation(&[value]);
    }

    /// Remove `delete_count` elements at `start`, inserting `items` in their
    /// place. Returns the removed elements.
    pub fn splice(&self, start: usize, delete_count: usize, items: Vec<Value>) -> Vec<Value> {
        let inserted = items.clone();
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let len = inner.items.len();
            let start = start.min(len);
            let end = (start + delete_count).min(len);
            inner.items.splice(start..end, items).collect::<Vec<_>>()
        };
        self.after_mutation(&inserted);
        removed
    }

    /// Sort in place with a comparator.
    pub fn sort_by(&self, mut compare: impl FnMut(&Value, &Value) -> std::cmp::Ordering) {
        self.inner.borrow_mut().items.sort_by(&mut compare);
        self.after_mutation(&[]);
    }

    /// Reverse in place.
    pub fn reverse(&self) {
        self.inner.borrow_mut().items.reverse();
        self.after_mutation(&[]);
    }

    /// Shared tail of every mutator: observe inserted elements, then notify
    /// the container dep once. No-op on unobserved arrays.
    fn after_mutation(&self, inserted: &[Value]) {
        let Some(ob) = self.observer() else {
            return;
        };
        for item in inserted {
            observe(item);
        }
        ob.dep().notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::observer::observe;
    use crate::reactive::scheduler;
    use crate::reactive::value::Obj;
    use crate::reactive::watcher::{Watcher, WatcherOptions};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_splice_returns_removed_and_inserts() {
        let arr: Arr = [1i64, 2, 3, 4].into_iter().collect();
        let removed = arr.splice(1, 2, vec![Value::int(9)]);
        assert_eq!(removed, vec![Value::int(2), Value::int(3)]);
        assert_eq!(arr.snapshot(), vec![Value::int(1), Value::int(9), Value::int(4)]);
    }

    #[test]
    fn test_splice_clamps_out_of_range() {
        let arr: Arr = [1i64].into_iter().collect();
        let removed = arr.splice(5, 5, vec![Value::int(2)]);
        assert!(removed.is_empty());
        assert_eq!(arr.snapshot(), vec![Value::int(1), Value::int(2)]);
    }

    #[test]
    fn test_push_observes_inserted_containers() {
        let arr = Arr::new();
        observe(&Value::Arr(arr.clone()));

        let item = Obj::new();
        item.insert("x", 1i64);
        arr.push(Value::Obj(item.clone()));
        assert!(item.observer().is_some());
    }

    #[test]
    fn test_shift_on_empty_is_silent() {
        let arr = Arr::new();
        observe(&Value::Arr(arr.clone()));
        assert!(arr.shift().is_none());
        assert!(arr.pop().is_none());
    }

    // Counts getter runs, not callbacks: a watcher returning the container
    // always counts as changed, so the run count is the notify count.
    fn sync_runs_counter(state: &Obj) -> (Watcher, Rc<Cell<usize>>) {
        let runs = Rc::new(Cell::new(0));
        let source = state.clone();
        let runs2 = runs.clone();
        let watcher = Watcher::new(
            Box::new(move || {
                runs2.set(runs2.get() + 1);
                Ok(source.get("items").unwrap_or(Value::Null))
            }),
            None,
            WatcherOptions { sync: true, ..Default::default() },
        )
        .unwrap();
        (watcher, runs)
    }

    #[test]
    fn test_each_mutator_notifies_exactly_once() {
        scheduler::reset_scheduler_state();
        let items: Arr = [2i64, 1, 3].into_iter().collect();
        let state: Obj = [("items", Value::Arr(items.clone()))].into_iter().collect();
        observe(&Value::Obj(state.clone()));
        let (_watcher, runs) = sync_runs_counter(&state);
        assert_eq!(runs.get(), 1);

        items.push(4i64);
        assert_eq!(runs.get(), 2);
        items.pop();
        assert_eq!(runs.get(), 3);
        items.unshift(0i64);
        assert_eq!(runs.get(), 4);
        items.shift();
        assert_eq!(runs.get(), 5);
        items.splice(1, 1, vec![Value::int(9)]);
        assert_eq!(runs.get(), 6);
        items.sort_by(|a, b| a.as_num().partial_cmp(&b.as_num()).unwrap());
        assert_eq!(runs.get(), 7);
        items.reverse();
        assert_eq!(runs.get(), 8);
    }

    #[test]
    fn test_pushed_object_nested_field_renotifies() {
        scheduler::reset_scheduler_state();
        let items = Arr::new();
        let state: Obj = [("items", Value::Arr(items.clone()))].into_iter().collect();
        observe(&Value::Obj(state.clone()));

        let runs = Rc::new(Cell::new(0));
        let source = state.clone();
        let runs2 = runs.clone();
        let _watcher = Watcher::new(
            Box::new(move || {
                runs2.set(runs2.get() + 1);
                let first = source
                    .get("items")
                    .and_then(|v| v.as_arr().cloned())
                    .and_then(|a| a.get(0));
                Ok(match first {
                    Some(Value::Obj(o)) => o.get("x").unwrap_or(Value::Null),
                    _ => Value::Null,
                })
            }),
            None,
            WatcherOptions { sync: true, ..Default::default() },
        )
        .unwrap();
        assert_eq!(runs.get(), 1);

        let pushed = Obj::new();
        pushed.insert("x", 1i64);
        items.push(Value::Obj(pushed.clone()));
        // the push observed the new element, and the re-run read its field
        assert_eq!(runs.get(), 2);

        pushed.set("x", 2i64);
        assert_eq!(runs.get(), 3);
    }
}
