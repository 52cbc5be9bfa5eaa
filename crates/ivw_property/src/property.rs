//! Observable value cells
//!
//! A [`Property`] is a cheap, clonable handle onto shared state, so change
//! observers can capture other properties and set them from inside a callback.
//! Everything happens synchronously on the calling thread:
//!
//! ```text
//!  set(v) ─► clamp ─► commit ─► modified = true ─► owner.invalidate(level)
//!                                                        │
//!                            observers A, B, C ◄─────────┘ (unless blocked)
//! ```
//!
//! The value is committed and the owner invalidated before any observer runs,
//! so an observer always sees the new value and a failing observer cannot
//! leave the owner thinking nothing changed.

use crate::blocker::OnChangeBlocker;
use crate::error::{BoxError, PropertyError, Result};
use crate::object::{InvalidationTarget, OwnerLink, PropertyObject};
use ivw_core::InvalidationLevel;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Values a [`Property`] can hold
pub trait PropertyValue:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + 'static
{
}

impl<T> PropertyValue for T where
    T: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + 'static
{
}

/// Handle returned by [`Property::on_change`], used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

type ObserverFn<T> = Box<dyn FnMut(&T) -> std::result::Result<(), BoxError>>;
type ClampFn<T> = Box<dyn Fn(T) -> T>;

struct Observer<T> {
    id: CallbackId,
    callback: Rc<RefCell<ObserverFn<T>>>,
}

struct PropertyState<T> {
    identifier: String,
    display_name: RefCell<String>,
    value: RefCell<T>,
    default: RefCell<T>,
    level: Cell<InvalidationLevel>,
    modified: Cell<bool>,
    read_only: Cell<bool>,
    visible: Cell<bool>,
    clamp: RefCell<Option<ClampFn<T>>>,
    observers: RefCell<Vec<Observer<T>>>,
    next_callback: Cell<u64>,
    // Bumped by every notification round; an outer round stops once it moves
    round: Cell<u64>,
    owner: RefCell<Option<OwnerLink>>,
    blocked: Cell<u32>,
    changed_while_blocked: Cell<bool>,
}

/// A named, observable, invalidation-tracked value
pub struct Property<T: PropertyValue> {
    state: Rc<PropertyState<T>>,
}

impl<T: PropertyValue> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: PropertyValue> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("identifier", &self.state.identifier)
            .field("value", &*self.state.value.borrow())
            .field("level", &self.state.level.get())
            .field("modified", &self.state.modified.get())
            .finish()
    }
}

impl<T: PropertyValue> Property<T> {
    /// Create a property; `value` also becomes the default.
    /// The declared invalidation level is `InvalidOutput`.
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>, value: T) -> Self {
        Self {
            state: Rc::new(PropertyState {
                identifier: identifier.into(),
                display_name: RefCell::new(display_name.into()),
                default: RefCell::new(value.clone()),
                value: RefCell::new(value),
                level: Cell::new(InvalidationLevel::InvalidOutput),
                modified: Cell::new(false),
                read_only: Cell::new(false),
                visible: Cell::new(true),
                clamp: RefCell::new(None),
                observers: RefCell::new(Vec::new()),
                next_callback: Cell::new(0),
                round: Cell::new(0),
                owner: RefCell::new(None),
                blocked: Cell::new(0),
                changed_while_blocked: Cell::new(false),
            }),
        }
    }

    pub fn with_invalidation_level(self, level: InvalidationLevel) -> Self {
        self.state.level.set(level);
        self
    }

    pub fn with_read_only(self, read_only: bool) -> Self {
        self.state.read_only.set(read_only);
        self
    }

    pub fn with_visible(self, visible: bool) -> Self {
        self.state.visible.set(visible);
        self
    }

    /// Replace both value and default without notifying anyone.
    /// The range, if any, still applies.
    pub fn with_initial_value(self, value: T) -> Self {
        let value = match &*self.state.clamp.borrow() {
            Some(clamp) => clamp(value),
            None => value,
        };
        *self.state.default.borrow_mut() = value.clone();
        *self.state.value.borrow_mut() = value;
        self
    }

    pub fn identifier(&self) -> &str {
        &self.state.identifier
    }

    pub fn display_name(&self) -> String {
        self.state.display_name.borrow().clone()
    }

    pub fn set_display_name(&self, name: impl Into<String>) {
        *self.state.display_name.borrow_mut() = name.into();
    }

    pub fn invalidation_level(&self) -> InvalidationLevel {
        self.state.level.get()
    }

    pub fn set_invalidation_level(&self, level: InvalidationLevel) {
        self.state.level.set(level);
    }

    pub fn is_read_only(&self) -> bool {
        self.state.read_only.get()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.state.read_only.set(read_only);
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible.get()
    }

    pub fn set_visible(&self, visible: bool) {
        self.state.visible.set(visible);
    }

    /// Current value
    pub fn get(&self) -> T {
        self.state.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    ///
    /// Calling `set` on this property from inside `f` panics.
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.value.borrow())
    }

    pub fn default_value(&self) -> T {
        self.state.default.borrow().clone()
    }

    pub fn is_default(&self) -> bool {
        *self.state.value.borrow() == *self.state.default.borrow()
    }

    /// Commit `value` and propagate the change if it differs from the current one
    pub fn set(&self, value: T) -> Result<()> {
        self.commit(value, false)
    }

    /// Commit `value` and propagate the change even if it is equal
    pub fn set_forced(&self, value: T) -> Result<()> {
        self.commit(value, true)
    }

    /// Propagate a change without touching the value
    pub fn propagate_change(&self) -> Result<()> {
        self.state.modified.set(true);
        let level = self.state.level.get();
        if !level.is_valid() {
            if let Some(owner) = self.owner() {
                owner.invalidate(level, Some(&self.state.identifier));
            }
        }
        log::trace!("Property '{}' changed ({})", self.state.identifier, level);

        if self.state.blocked.get() > 0 {
            self.state.changed_while_blocked.set(true);
            return Ok(());
        }
        self.notify_observers()
    }

    fn commit(&self, value: T, force: bool) -> Result<()> {
        let value = match &*self.state.clamp.borrow() {
            Some(clamp) => clamp(value),
            None => value,
        };
        {
            let mut current = self.state.value.borrow_mut();
            if !force && *current == value {
                return Ok(());
            }
            *current = value;
        }
        self.propagate_change()
    }

    /// Run every observer, in registration order, with the current value.
    ///
    /// An observer that sets this property again starts a newer round which
    /// reaches the remaining observers with the newer value; this round then
    /// stops instead of handing them the stale one.
    pub(crate) fn notify_observers(&self) -> Result<()> {
        let snapshot: Vec<_> = self
            .state
            .observers
            .borrow()
            .iter()
            .map(|o| Rc::clone(&o.callback))
            .collect();
        if snapshot.is_empty() {
            return Ok(());
        }

        let round = self.state.round.get().wrapping_add(1);
        self.state.round.set(round);
        let value = self.get();
        for callback in snapshot {
            if self.state.round.get() != round {
                log::trace!(
                    "Change of '{}' superseded by a nested set",
                    self.state.identifier
                );
                break;
            }
            // Already running further up the stack: a nested set of this property.
            let Ok(mut callback) = callback.try_borrow_mut() else {
                log::trace!(
                    "Skipping re-entrant observer of '{}'",
                    self.state.identifier
                );
                continue;
            };
            (&mut **callback)(&value).map_err(|source| PropertyError::Observer {
                property: self.state.identifier.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Register an observer called with the new value after every change
    pub fn on_change(&self, mut f: impl FnMut(&T) + 'static) -> CallbackId {
        self.push_observer(Box::new(move |value| {
            f(value);
            Ok(())
        }))
    }

    /// Register an observer that may fail; its error propagates out of `set`
    pub fn try_on_change<E>(
        &self,
        mut f: impl FnMut(&T) -> std::result::Result<(), E> + 'static,
    ) -> CallbackId
    where
        E: Into<BoxError>,
    {
        self.push_observer(Box::new(move |value| f(value).map_err(Into::into)))
    }

    fn push_observer(&self, callback: ObserverFn<T>) -> CallbackId {
        let id = CallbackId(self.state.next_callback.get());
        self.state.next_callback.set(id.0 + 1);
        self.state.observers.borrow_mut().push(Observer {
            id,
            callback: Rc::new(RefCell::new(callback)),
        });
        id
    }

    /// Unregister an observer; returns whether it was registered
    pub fn remove_on_change(&self, id: CallbackId) -> bool {
        let mut observers = self.state.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|o| o.id != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.state.observers.borrow().len()
    }

    /// Suppress observers until the returned guard is released
    pub fn block_on_change(&self) -> OnChangeBlocker<T> {
        OnChangeBlocker::new(self)
    }

    pub(crate) fn block(&self) {
        self.state.blocked.set(self.state.blocked.get() + 1);
    }

    /// Drop one block level. Returns true when the last one went and
    /// something changed in the meantime, i.e. observers are owed a round.
    pub(crate) fn unblock(&self) -> bool {
        let depth = self.state.blocked.get().saturating_sub(1);
        self.state.blocked.set(depth);
        depth == 0 && self.state.changed_while_blocked.replace(false)
    }

    pub fn is_blocked(&self) -> bool {
        self.state.blocked.get() > 0
    }

    /// Restrict values to `[min, max]`; the current value and default are clamped too
    pub fn with_range(self, min: T, max: T) -> Self
    where
        T: PartialOrd,
    {
        let clamp = move |value: T| {
            if value < min {
                min.clone()
            } else if value > max {
                max.clone()
            } else {
                value
            }
        };
        {
            let mut value = self.state.value.borrow_mut();
            *value = clamp(value.clone());
            let mut default = self.state.default.borrow_mut();
            *default = clamp(default.clone());
        }
        *self.state.clamp.borrow_mut() = Some(Box::new(clamp));
        self
    }

    pub fn is_modified(&self) -> bool {
        self.state.modified.get()
    }

    pub fn set_valid(&self) {
        self.state.modified.set(false);
    }

    pub fn reset_to_default(&self) -> Result<()> {
        self.set(self.default_value())
    }

    pub fn set_current_state_as_default(&self) {
        *self.state.default.borrow_mut() = self.get();
    }

    fn owner(&self) -> Option<Rc<dyn InvalidationTarget>> {
        self.state.owner.borrow().as_ref().and_then(|w| w.upgrade())
    }

    pub fn has_owner(&self) -> bool {
        self.owner().is_some()
    }

    /// Both handles refer to the same property
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl<T: PropertyValue> PropertyObject for Property<T> {
    fn identifier(&self) -> &str {
        &self.state.identifier
    }

    fn display_name(&self) -> String {
        Property::display_name(self)
    }

    fn class_identifier(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn invalidation_level(&self) -> InvalidationLevel {
        self.state.level.get()
    }

    fn is_modified(&self) -> bool {
        self.state.modified.get()
    }

    fn set_valid(&self) {
        Property::set_valid(self)
    }

    fn set_owner(&self, owner: Option<OwnerLink>) {
        *self.state.owner.borrow_mut() = owner;
    }

    fn reset_to_default(&self) -> Result<()> {
        Property::reset_to_default(self)
    }

    fn set_current_state_as_default(&self) {
        Property::set_current_state_as_default(self)
    }

    fn serialize(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "displayName": self.display_name(),
            "value": serde_json::to_value(&*self.state.value.borrow())?,
        }))
    }

    fn deserialize(&self, document: &serde_json::Value) -> Result<()> {
        if let Some(name) = document.get("displayName").and_then(|n| n.as_str()) {
            self.set_display_name(name);
        }
        match document.get("value") {
            Some(value) => self.set(T::deserialize(value)?),
            None => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Rejected;

    impl fmt::Display for Rejected {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("value rejected")
        }
    }

    impl std::error::Error for Rejected {}

    #[test]
    fn test_set_and_get() {
        let p = Property::new("threshold", "Threshold", 0.5f32);
        assert_eq!(p.get(), 0.5);
        p.set(0.75).unwrap();
        assert_eq!(p.get(), 0.75);
        assert!(p.is_modified());
        assert_eq!(p.default_value(), 0.5);
    }

    #[test]
    fn test_equal_value_does_not_propagate() {
        let p = Property::new("count", "Count", 3i32);
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        p.on_change(move |_| c.set(c.get() + 1));

        p.set(3).unwrap();
        assert_eq!(calls.get(), 0);
        assert!(!p.is_modified());

        p.set_forced(3).unwrap();
        assert_eq!(calls.get(), 1);
        assert!(p.is_modified());
    }

    #[test]
    fn test_observers_run_in_registration_order() {
        let p = Property::new("name", "Name", String::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["A", "B", "C"] {
            let log = Rc::clone(&log);
            p.on_change(move |_| log.borrow_mut().push(tag));
        }
        p.set("x".to_string()).unwrap();
        assert_eq!(*log.borrow(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_observer_sees_new_value() {
        let p = Property::new("v", "V", 1i32);
        let seen = Rc::new(Cell::new(0));
        let (s, handle) = (Rc::clone(&seen), p.clone());
        p.on_change(move |v| {
            assert_eq!(*v, handle.get());
            s.set(*v);
        });
        p.set(7).unwrap();
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn test_failing_observer_keeps_value_committed() {
        let p = Property::new("v", "V", 1i32);
        let later = Rc::new(Cell::new(false));
        p.try_on_change(|v| if *v > 10 { Err(Rejected) } else { Ok(()) });
        let l = Rc::clone(&later);
        p.on_change(move |_| l.set(true));

        let err = p.set(42).unwrap_err();
        assert!(matches!(err, PropertyError::Observer { ref property, .. } if property == "v"));
        assert!(err.to_string().contains("value rejected"));
        assert_eq!(p.get(), 42);
        assert!(p.is_modified());
        assert!(!later.get());
    }

    #[test]
    fn test_remove_on_change() {
        let p = Property::new("v", "V", 0u8);
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let id = p.on_change(move |_| c.set(c.get() + 1));
        p.set(1).unwrap();
        assert!(p.remove_on_change(id));
        assert!(!p.remove_on_change(id));
        p.set(2).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_nested_set_is_depth_first() {
        let a = Property::new("a", "A", 0i32);
        let b = Property::new("b", "B", 0i32);
        let log = Rc::new(RefCell::new(Vec::new()));

        let (b2, l) = (b.clone(), Rc::clone(&log));
        a.on_change(move |v| {
            l.borrow_mut().push(format!("a1={}", v));
            b2.set(v * 2).unwrap();
        });
        let l = Rc::clone(&log);
        a.on_change(move |v| l.borrow_mut().push(format!("a2={}", v)));
        let l = Rc::clone(&log);
        b.on_change(move |v| l.borrow_mut().push(format!("b={}", v)));

        a.set(5).unwrap();
        assert_eq!(*log.borrow(), vec!["a1=5", "b=10", "a2=5"]);
    }

    #[test]
    fn test_self_feedback_is_cut() {
        let p = Property::new("v", "V", 0i32);
        let handle = p.clone();
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        p.on_change(move |v| {
            c.set(c.get() + 1);
            if *v < 100 {
                handle.set(v + 1).unwrap();
            }
        });
        p.set(1).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(p.get(), 2);
    }

    #[test]
    fn test_nested_set_supersedes_stale_round() {
        let p = Property::new("v", "V", 0i32);
        let handle = p.clone();
        p.on_change(move |v| {
            if v % 2 == 1 {
                handle.set(v + 1).unwrap();
            }
        });
        let mirror = Rc::new(RefCell::new(Vec::new()));
        let m = Rc::clone(&mirror);
        p.on_change(move |v| m.borrow_mut().push(*v));

        p.set(1).unwrap();
        assert_eq!(p.get(), 2);
        assert_eq!(*mirror.borrow(), vec![2]);

        p.set(4).unwrap();
        assert_eq!(*mirror.borrow(), vec![2, 4]);
    }

    #[test]
    fn test_with_initial_value_is_silent() {
        let p = Property::new("n", "N", 0i32).with_range(0, 10);
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        p.on_change(move |_| c.set(c.get() + 1));

        let p = p.with_initial_value(42);
        assert_eq!(p.get(), 10);
        assert_eq!(p.default_value(), 10);
        assert!(!p.is_modified());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_range_clamps() {
        let p = Property::new("aspect", "Aspect", 1.0f32).with_range(0.01, 100.0);
        p.set(1000.0).unwrap();
        assert_eq!(p.get(), 100.0);
        p.set(-1.0).unwrap();
        assert_eq!(p.get(), 0.01);

        let clamped = Property::new("n", "N", 50i32).with_range(0, 10);
        assert_eq!(clamped.get(), 10);
        assert_eq!(clamped.default_value(), 10);
    }

    #[test]
    fn test_reset_to_default() {
        let p = Property::new("v", "V", 1i32);
        p.set(5).unwrap();
        p.set_current_state_as_default();
        p.set(9).unwrap();
        p.reset_to_default().unwrap();
        assert_eq!(p.get(), 5);
        assert!(p.is_default());
    }

    #[test]
    fn test_serialize_round_trip() {
        let p = Property::new("dir", "Direction", [1.0f32, 0.0, 0.0]);
        p.set([0.0, 1.0, 0.0]).unwrap();
        let doc = PropertyObject::serialize(&p).unwrap();
        assert_eq!(doc["value"], serde_json::json!([0.0, 1.0, 0.0]));

        let q = Property::new("dir", "Direction", [0.0f32; 3]);
        q.deserialize(&doc).unwrap();
        assert_eq!(q.get(), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_deserialize_rejects_wrong_type() {
        let p = Property::new("v", "V", 1i32);
        let err = p.deserialize(&serde_json::json!({ "value": "text" })).unwrap_err();
        assert!(matches!(err, PropertyError::Serialization(_)));
        assert_eq!(p.get(), 1);
    }
}
