//! Dynamic value model for the reactive graph.
//!
//! Reactive state is a tree of [`Value`]s. Containers ([`Obj`], [`Arr`]) are
//! shared handles - cloning a `Value` clones the handle, not the payload - so
//! an observed container keeps a single identity for its whole lifetime and
//! its `Dep` can live exactly as long as it does.
//!
//! Two equality notions coexist on purpose:
//! - [`same_value`] is the *setter* rule: a write is a no-op when the new
//!   value is the same primitive (NaN counting as equal to NaN) or the same
//!   container handle.
//! - [`identical`] is the *watcher* rule: strict comparison, so a NaN result
//!   always counts as changed. Container results are handled separately by
//!   the watcher (they always propagate, since in-place mutation is invisible
//!   to handle comparison).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::reactive::observer::Observer;

// =============================================================================
// Value
// =============================================================================

/// A dynamic value in the reactive state tree.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent / null.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Number (always `f64`).
    Num(f64),
    /// Immutable string.
    Str(Rc<str>),
    /// Object container (shared handle).
    Obj(Obj),
    /// Array container (shared handle).
    Arr(Arr),
}

impl Value {
    /// Build a string value.
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    /// Build a number value from an integer.
    pub fn int(n: i64) -> Self {
        Value::Num(n as f64)
    }

    /// True for `Obj` and `Arr` values.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Obj(_) | Value::Arr(_))
    }

    /// The number payload, if any.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// The string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The object handle, if any.
    pub fn as_obj(&self) -> Option<&Obj> {
        match self {
            Value::Obj(o) => Some(o),
            _ => None,
        }
    }

    /// The array handle, if any.
    pub fn as_arr(&self) -> Option<&Arr> {
        match self {
            Value::Arr(a) => Some(a),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        identical(self, other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<Obj> for Value {
    fn from(o: Obj) -> Self {
        Value::Obj(o)
    }
}

impl From<Arr> for Value {
    fn from(a: Arr) -> Self {
        Value::Arr(a)
    }
}

/// Setter change-detection rule: unchanged iff same primitive value (NaN is
/// self-equal) or same container handle.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Num(x), Value::Num(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Obj(x), Value::Obj(y)) => x.ptr_eq(y),
        (Value::Arr(x), Value::Arr(y)) => x.ptr_eq(y),
        _ => false,
    }
}

/// Strict comparison used by watchers: like [`same_value`] but NaN never
/// equals NaN.
pub fn identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Num(x), Value::Num(y)) => x == y,
        _ => same_value(a, b),
    }
}

// =============================================================================
// Obj
// =============================================================================

/// One property slot of an [`Obj`].
///
/// `dep` is installed by the reactive transform (`define_reactive`); a slot
/// without one is a plain, non-tracked property.
pub(crate) struct Slot {
    pub value: Value,
    pub dep: Option<crate::reactive::dep::Dep>,
    pub child_ob: Option<Observer>,
    pub shallow: bool,
}

pub(crate) struct ObjInner {
    pub slots: BTreeMap<String, Slot>,
    pub ob: Option<Observer>,
}

/// Object container: string keys to [`Value`]s.
///
/// Reads and writes go through [`Obj::get`] / [`Obj::set`], which are the
/// accessor pair of the reactive property transform once the object is
/// observed (see `reactive::observer`). Before observation they are plain
/// map operations.
#[derive(Clone)]
pub struct Obj {
    pub(crate) inner: Rc<RefCell<ObjInner>>,
}

impl Obj {
    /// Create an empty, unobserved object.
    pub fn new() -> Self {
        Obj {
            inner: Rc::new(RefCell::new(ObjInner {
                slots: BTreeMap::new(),
                ob: None,
            })),
        }
    }

    /// Handle identity.
    pub fn ptr_eq(&self, other: &Obj) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Raw insert, bypassing the reactive transform.
    ///
    /// Used while building state before `observe`. After observation this
    /// adds a *non-reactive* slot - use `reactive::set` to add a key that
    /// notifies.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.inner.borrow_mut().slots.insert(
            key.into(),
            Slot {
                value: value.into(),
                dep: None,
                child_ob: None,
                shallow: false,
            },
        );
        self
    }

    /// Whether a slot for `key` exists (reactive or not). Not tracked.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.borrow().slots.contains_key(key)
    }

    /// Snapshot of the current key set. Not tracked.
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().slots.keys().cloned().collect()
    }

    /// Number of slots. Not tracked.
    pub fn len(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    /// True when the object has no slots.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The attached observer, if the object has been observed.
    pub fn observer(&self) -> Option<Observer> {
        self.inner.borrow().ob.clone()
    }

    /// Read a value without dependency tracking.
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.inner.borrow().slots.get(key).map(|s| s.value.clone())
    }
}

impl Default for Obj {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Obj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        let mut map = f.debug_map();
        for (k, slot) in &inner.slots {
            map.entry(k, &slot.value);
        }
        map.finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Obj {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let obj = Obj::new();
        for (k, v) in iter {
            obj.insert(k, v);
        }
        obj
    }
}

// =============================================================================
// Arr
// =============================================================================

pub(crate) struct ArrInner {
    pub items: Vec<Value>,
    pub ob: Option<Observer>,
}

/// Array container.
///
/// Mutating methods (`push`, `splice`, ... - see `reactive::array`) carry the
/// notify-after-mutate contract once the array is observed. Plain index
/// writes via [`Arr::set_index`] are *not* interceptable and stay
/// non-reactive; that limitation is inherited from the accessor-based
/// observation model and is deliberate. `reactive::set` is the escape hatch.
#[derive(Clone)]
pub struct Arr {
    pub(crate) inner: Rc<RefCell<ArrInner>>,
}

impl Arr {
    /// Create an empty, unobserved array.
    pub fn new() -> Self {
        Arr {
            inner: Rc::new(RefCell::new(ArrInner {
                items: Vec::new(),
                ob: None,
            })),
        }
    }

    /// Handle identity.
    pub fn ptr_eq(&self, other: &Arr) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of elements. Not tracked.
    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    /// True when the array is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`. Element access is not a tracked getter; array
    /// dependencies flow through the container dep and the element cascade
    /// collected when the array itself is read from an object property.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.borrow().items.get(index).cloned()
    }

    /// Raw index write. Non-reactive by design; see the type-level note.
    pub fn set_index(&self, index: usize, value: impl Into<Value>) {
        let mut inner = self.inner.borrow_mut();
        if index < inner.items.len() {
            inner.items[index] = value.into();
        }
    }

    /// Clone of the current elements.
    pub fn snapshot(&self) -> Vec<Value> {
        self.inner.borrow().items.clone()
    }

    /// The attached observer, if the array has been observed.
    pub fn observer(&self) -> Option<Observer> {
        self.inner.borrow().ob.clone()
    }
}

impl Default for Arr {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Arr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.inner.borrow().items.iter()).finish()
    }
}

impl<V: Into<Value>> FromIterator<V> for Arr {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        let arr = Arr::new();
        arr.inner
            .borrow_mut()
            .items
            .extend(iter.into_iter().map(Into::into));
        arr
    }
}
