//! Watchers - reactive computation units.
//!
//! A watcher evaluates a getter, records every dep read during the
//! evaluation, and is re-invoked when any of them notifies. Three shapes
//! share the type, as in the original runtime:
//! - render watchers: getter does the work (render + patch), no callback;
//! - user watchers: getter selects a value, callback fires on change;
//! - computed watchers: lazy, cache a value, and own a dep of their own so
//!   other watchers can subscribe to the computed result.
//!
//! Dependency bookkeeping is the paired-set reconciliation: `deps`/`dep_ids`
//! hold the subscriptions as of the last completed evaluation, `new_*` the
//! ones collected by the evaluation in progress. After every evaluation the
//! old set is diffed against the new one and stale subscriptions are dropped
//! on the dep side too - this is what makes conditional reads shrink the
//! dependency set.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::AHashSet;

use crate::error::{Error, handle_error};
use crate::reactive::dep::{Dep, TargetGuard};
use crate::reactive::scheduler::queue_watcher;
use crate::reactive::traverse::traverse;
use crate::reactive::value::{Value, identical};

thread_local! {
    static WATCHER_ID: Cell<u64> = const { Cell::new(0) };
}

/// Fallible tracked computation.
pub type Getter = Box<dyn FnMut() -> Result<Value, Error>>;

/// Change callback, invoked with `(new, old)`.
pub type Callback = Box<dyn FnMut(&Value, &Value)>;

/// Behavior flags for [`Watcher::new`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WatcherOptions {
    /// Traverse the result after every evaluation so the watcher reacts to
    /// nested mutations.
    pub deep: bool,
    /// User-defined watcher: getter errors are reported, not propagated.
    pub user: bool,
    /// Re-evaluate synchronously on notify instead of going through the
    /// scheduler.
    pub sync: bool,
}

#[derive(Default)]
struct DepSets {
    deps: Vec<Dep>,
    ids: AHashSet<u64>,
    new_deps: Vec<Dep>,
    new_ids: AHashSet<u64>,
}

struct WatcherInner {
    id: u64,
    deep: bool,
    user: bool,
    computed: bool,
    sync: bool,
    active: Cell<bool>,
    dirty: Cell<bool>,
    getter: RefCell<Getter>,
    cb: RefCell<Option<Callback>>,
    before: RefCell<Option<Box<dyn FnMut()>>>,
    value: RefCell<Value>,
    sets: RefCell<DepSets>,
    // computed watchers own a dep so other watchers can depend on them
    own_dep: Option<Dep>,
}

/// A reactive computation unit. Cheap to clone (shared handle).
#[derive(Clone)]
pub struct Watcher {
    inner: Rc<WatcherInner>,
}

fn next_id() -> u64 {
    WATCHER_ID.with(|c| {
        let id = c.get() + 1;
        c.set(id);
        id
    })
}

impl Watcher {
    /// Create a watcher and evaluate it once.
    ///
    /// Ids are handed out in creation order and drive scheduler ordering:
    /// create parents before children and user watchers before the render
    /// watcher that owns them.
    pub fn new(getter: Getter, cb: Option<Callback>, options: WatcherOptions) -> Result<Watcher, Error> {
        let watcher = Watcher {
            inner: Rc::new(WatcherInner {
                id: next_id(),
                deep: options.deep,
                user: options.user,
                computed: false,
                sync: options.sync,
                active: Cell::new(true),
                dirty: Cell::new(false),
                getter: RefCell::new(getter),
                cb: RefCell::new(cb),
                before: RefCell::new(None),
                value: RefCell::new(Value::Null),
                sets: RefCell::new(DepSets::default()),
                own_dep: None,
            }),
        };
        match watcher.get() {
            Ok(value) => *watcher.inner.value.borrow_mut() = value,
            Err(err) if options.user => handle_error(&err, "getter for user watcher"),
            Err(err) => return Err(err),
        }
        Ok(watcher)
    }

    /// Create a lazy computed watcher. Nothing is evaluated until the first
    /// [`Watcher::evaluate`].
    pub fn computed(getter: Getter) -> Watcher {
        Watcher {
            inner: Rc::new(WatcherInner {
                id: next_id(),
                deep: false,
                user: false,
                computed: true,
                sync: false,
                active: Cell::new(true),
                dirty: Cell::new(true),
                getter: RefCell::new(getter),
                cb: RefCell::new(None),
                before: RefCell::new(None),
                value: RefCell::new(Value::Null),
                sets: RefCell::new(DepSets::default()),
                own_dep: Some(Dep::new()),
            }),
        }
    }

    /// Creation-order id.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Whether the watcher has not been torn down.
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Whether this is a user watcher.
    pub fn is_user(&self) -> bool {
        self.inner.user
    }

    /// Stale marker of a computed watcher.
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// Number of deps as of the last completed evaluation.
    pub fn dep_count(&self) -> usize {
        self.inner.sets.borrow().deps.len()
    }

    /// Install a hook invoked by the scheduler just before `run`.
    pub fn set_before(&self, before: impl FnMut() + 'static) {
        *self.inner.before.borrow_mut() = Some(Box::new(before));
    }

    pub(crate) fn run_before(&self) {
        if let Some(before) = self.inner.before.borrow_mut().as_mut() {
            before();
        }
    }

    /// Cached value of the last completed evaluation.
    pub fn value(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    /// Evaluate the getter and re-collect dependencies.
    ///
    /// The collector frame is popped and the dep sets reconciled on every
    /// exit path, including errors - otherwise a failed evaluation would leak
    /// subscriptions and corrupt the collector stack.
    pub fn get(&self) -> Result<Value, Error> {
        let result = {
            let _frame = TargetGuard::collect(self.clone());
            let result = (self.inner.getter.borrow_mut())();
            if self.inner.deep {
                // touch the whole subtree while this watcher still collects
                if let Ok(value) = &result {
                    traverse(value);
                }
            }
            result
        };
        self.cleanup_deps();
        result
    }

    /// Record a dep read during the evaluation in progress.
    ///
    /// Dedups within the cycle via the new-id set; subscribes on the dep side
    /// only if the previous cycle was not already subscribed, so a dep never
    /// lists the same watcher twice across cycles.
    pub(crate) fn add_dep(&self, dep: &Dep) {
        let subscribe = {
            let mut sets = self.inner.sets.borrow_mut();
            if !sets.new_ids.insert(dep.id()) {
                false
            } else {
                sets.new_deps.push(dep.clone());
                !sets.ids.contains(&dep.id())
            }
        };
        if subscribe {
            dep.add_sub(self);
        }
    }

    /// Reconcile dep sets after an evaluation: unsubscribe from anything the
    /// evaluation no longer read, then promote the new sets.
    fn cleanup_deps(&self) {
        let stale: Vec<Dep> = {
            let sets = self.inner.sets.borrow();
            sets.deps
                .iter()
                .filter(|d| !sets.new_ids.contains(&d.id()))
                .cloned()
                .collect()
        };
        for dep in stale {
            dep.remove_sub(self);
        }
        let mut sets = self.inner.sets.borrow_mut();
        let DepSets { deps, ids, new_deps, new_ids } = &mut *sets;
        std::mem::swap(deps, new_deps);
        std::mem::swap(ids, new_ids);
        new_deps.clear();
        new_ids.clear();
    }

    /// Subscriber interface, called when a tracked dep notifies.
    pub fn update(&self) {
        if self.inner.computed {
            // Lazy while nobody depends on the computed value; eager (with a
            // change-gated notify of the own dep) once somebody does.
            let own = self.inner.own_dep.as_ref().cloned();
            if let Some(own) = own {
                if own.sub_count() == 0 {
                    self.inner.dirty.set(true);
                } else {
                    let notify_dep = own.clone();
                    if let Err(err) = self.get_and_invoke(move |_, _| notify_dep.notify()) {
                        handle_error(&err, "getter for computed watcher");
                    }
                }
            }
        } else if self.inner.sync {
            if let Err(err) = self.run() {
                handle_error(&err, "sync watcher run");
            }
        } else {
            queue_watcher(self);
        }
    }

    /// Scheduler job interface.
    pub fn run(&self) -> Result<(), Error> {
        if !self.inner.active.get() {
            return Ok(());
        }
        self.get_and_invoke(|_, _| {})
    }

    /// Re-evaluate; when the result counts as changed, store it and fire the
    /// change callback plus `extra`.
    ///
    /// Container results and deep watchers always count as changed: in-place
    /// mutation is invisible to handle comparison, so over-notifying is the
    /// deliberate trade (see DESIGN.md).
    fn get_and_invoke(&self, mut extra: impl FnMut(&Value, &Value)) -> Result<(), Error> {
        let value = match self.get() {
            Ok(value) => value,
            Err(err) if self.inner.user => {
                handle_error(&err, "getter for user watcher");
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        let old = self.inner.value.borrow().clone();
        if identical(&value, &old) && !value.is_container() && !self.inner.deep {
            return Ok(());
        }
        *self.inner.value.borrow_mut() = value.clone();
        self.inner.dirty.set(false);
        extra(&value, &old);
        if let Some(cb) = self.inner.cb.borrow_mut().as_mut() {
            cb(&value, &old);
        }
        Ok(())
    }

    /// Evaluate a computed watcher, recomputing only when dirty.
    pub fn evaluate(&self) -> Result<Value, Error> {
        if self.inner.dirty.get() {
            let value = self.get()?;
            *self.inner.value.borrow_mut() = value;
            self.inner.dirty.set(false);
        }
        Ok(self.inner.value.borrow().clone())
    }

    /// Register the computed watcher's own dep on the active collector, so
    /// the reader of a computed value subscribes to it.
    pub fn depend(&self) {
        if let Some(own) = &self.inner.own_dep {
            own.depend();
        }
    }

    /// Unsubscribe from every dep. Idempotent.
    pub fn teardown(&self) {
        if !self.inner.active.get() {
            return;
        }
        let deps: Vec<Dep> = self.inner.sets.borrow().deps.clone();
        for dep in deps {
            dep.remove_sub(self);
        }
        self.inner.active.set(false);
    }

    /// Reset the id counter (for tests).
    pub fn reset_watcher_ids() {
        WATCHER_ID.with(|c| c.set(0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::observer::observe;
    use crate::reactive::scheduler;
    use crate::reactive::value::Obj;
    use std::cell::Cell as StdCell;

    fn reactive_obj(pairs: &[(&str, Value)]) -> Obj {
        let obj: Obj = pairs.iter().map(|(k, v)| (*k, v.clone())).collect();
        observe(&Value::Obj(obj.clone()));
        obj
    }

    fn sync_watch(obj: &Obj, key: &'static str, hits: Rc<StdCell<usize>>) -> Watcher {
        let source = obj.clone();
        Watcher::new(
            Box::new(move || Ok(source.get(key).unwrap_or(Value::Null))),
            Some(Box::new(move |_, _| hits.set(hits.get() + 1))),
            WatcherOptions { sync: true, ..Default::default() },
        )
        .unwrap()
    }

    #[test]
    fn test_repeated_reads_subscribe_once() {
        scheduler::reset_scheduler_state();
        let obj = reactive_obj(&[("a", Value::int(1))]);
        let source = obj.clone();
        let watcher = Watcher::new(
            Box::new(move || {
                source.get("a");
                source.get("a");
                Ok(source.get("a").unwrap_or(Value::Null))
            }),
            None,
            WatcherOptions::default(),
        )
        .unwrap();
        assert_eq!(watcher.dep_count(), 1);
    }

    #[test]
    fn test_conditional_reads_shrink_the_dep_set() {
        scheduler::reset_scheduler_state();
        let obj = reactive_obj(&[
            ("cond", Value::Bool(true)),
            ("a", Value::int(1)),
            ("b", Value::int(2)),
        ]);
        let hits = Rc::new(StdCell::new(0));
        let source = obj.clone();
        let watcher = Watcher::new(
            Box::new(move || {
                let cond = matches!(source.get("cond"), Some(Value::Bool(true)));
                Ok(if cond {
                    source.get("a").unwrap_or(Value::Null)
                } else {
                    source.get("b").unwrap_or(Value::Null)
                })
            }),
            Some({
                let hits = hits.clone();
                Box::new(move |_, _| hits.set(hits.get() + 1))
            }),
            WatcherOptions { sync: true, ..Default::default() },
        )
        .unwrap();
        assert_eq!(watcher.dep_count(), 2); // cond + a

        obj.set("cond", false);
        assert_eq!(hits.get(), 1);

        // now subscribed to cond + b; mutating a must not re-run
        obj.set("a", 99i64);
        assert_eq!(hits.get(), 1);

        obj.set("b", 42i64);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_self_assignment_and_nan_do_not_notify() {
        scheduler::reset_scheduler_state();
        let obj = reactive_obj(&[("a", Value::int(1))]);
        let hits = Rc::new(StdCell::new(0));
        let _watcher = sync_watch(&obj, "a", hits.clone());

        obj.set("a", Value::int(1));
        assert_eq!(hits.get(), 0);

        obj.set("a", Value::Num(f64::NAN));
        assert_eq!(hits.get(), 1);
        obj.set("a", Value::Num(f64::NAN));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_teardown_is_two_sided_and_idempotent() {
        scheduler::reset_scheduler_state();
        let obj = reactive_obj(&[("a", Value::int(1))]);
        let hits = Rc::new(StdCell::new(0));
        let watcher = sync_watch(&obj, "a", hits.clone());

        watcher.teardown();
        watcher.teardown();
        obj.set("a", 2i64);
        assert_eq!(hits.get(), 0);
        assert!(!watcher.is_active());
    }

    #[test]
    fn test_computed_is_lazy_until_read() {
        scheduler::reset_scheduler_state();
        let obj = reactive_obj(&[("n", Value::int(2))]);
        let runs = Rc::new(StdCell::new(0));
        let source = obj.clone();
        let runs2 = runs.clone();
        let computed = Watcher::computed(Box::new(move || {
            runs2.set(runs2.get() + 1);
            let n = source.get("n").and_then(|v| v.as_num()).unwrap_or(0.0);
            Ok(Value::Num(n * 2.0))
        }));
        assert_eq!(runs.get(), 0);
        assert_eq!(computed.evaluate().unwrap(), Value::Num(4.0));
        assert_eq!(runs.get(), 1);
        // cached while clean
        assert_eq!(computed.evaluate().unwrap(), Value::Num(4.0));
        assert_eq!(runs.get(), 1);

        // no subscriber on the computed's own dep: notify only marks dirty
        obj.set("n", 3i64);
        assert_eq!(runs.get(), 1);
        assert!(computed.is_dirty());
        assert_eq!(computed.evaluate().unwrap(), Value::Num(6.0));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_computed_chains_through_other_watchers() {
        scheduler::reset_scheduler_state();
        let obj = reactive_obj(&[("n", Value::int(1))]);
        let source = obj.clone();
        let computed = Watcher::computed(Box::new(move || {
            let n = source.get("n").and_then(|v| v.as_num()).unwrap_or(0.0);
            Ok(Value::Num(n + 10.0))
        }));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let computed2 = computed.clone();
        let seen2 = seen.clone();
        let _outer = Watcher::new(
            Box::new(move || {
                let v = computed2.evaluate()?;
                computed2.depend();
                Ok(v)
            }),
            Some(Box::new(move |new, _| seen2.borrow_mut().push(new.clone()))),
            WatcherOptions { sync: true, ..Default::default() },
        )
        .unwrap();

        obj.set("n", 5i64);
        assert_eq!(seen.borrow().as_slice(), &[Value::Num(15.0)]);
    }

    #[test]
    fn test_user_getter_errors_are_reported_not_fatal() {
        scheduler::reset_scheduler_state();
        let obj = reactive_obj(&[("a", Value::int(1))]);
        let reports = Rc::new(StdCell::new(0));
        let reports2 = reports.clone();
        crate::error::set_error_handler(move |_, _| reports2.set(reports2.get() + 1));

        let source = obj.clone();
        let watcher = Watcher::new(
            Box::new(move || {
                source.get("a");
                Err(Error::eval("user getter failed"))
            }),
            None,
            WatcherOptions { user: true, sync: true, ..Default::default() },
        )
        .unwrap();
        assert_eq!(reports.get(), 1);
        // the failed evaluation still reconciled its dep set
        assert_eq!(watcher.dep_count(), 1);

        obj.set("a", 2i64);
        assert_eq!(reports.get(), 2);
        crate::error::clear_error_handler();
    }

    #[test]
    fn test_deep_watcher_sees_nested_mutations() {
        scheduler::reset_scheduler_state();
        let nested = Obj::new();
        nested.insert("x", 1i64);
        let obj = reactive_obj(&[("inner", Value::Obj(nested.clone()))]);

        let hits = Rc::new(StdCell::new(0));
        let source = obj.clone();
        let hits2 = hits.clone();
        let _watcher = Watcher::new(
            Box::new(move || Ok(source.get("inner").unwrap_or(Value::Null))),
            Some(Box::new(move |_, _| hits2.set(hits2.get() + 1))),
            WatcherOptions { deep: true, sync: true, ..Default::default() },
        )
        .unwrap();

        nested.set("x", 2i64);
        assert_eq!(hits.get(), 1);
    }
}
