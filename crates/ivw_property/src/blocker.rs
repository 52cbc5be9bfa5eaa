//! Scoped suppression of change observers

use crate::error::Result;
use crate::property::{Property, PropertyValue};

/// Suppresses a property's observers while alive.
///
/// Values set while blocked are still committed and still invalidate the
/// owner. When the last blocker goes away and at least one change happened,
/// the observers run once with the latest value. Blockers nest.
///
/// Prefer [`release`](Self::release) on the happy path to receive observer
/// errors; a plain drop (early `?` return) logs them instead. When dropped
/// during a panic the block is lifted without running observers.
#[must_use = "observers are unblocked as soon as the blocker is dropped"]
pub struct OnChangeBlocker<T: PropertyValue> {
    property: Option<Property<T>>,
}

impl<T: PropertyValue> OnChangeBlocker<T> {
    pub fn new(property: &Property<T>) -> Self {
        property.block();
        Self {
            property: Some(property.clone()),
        }
    }

    /// Lift the block and run pending observers, returning their result
    pub fn release(mut self) -> Result<()> {
        match self.property.take() {
            Some(property) if property.unblock() => property.notify_observers(),
            _ => Ok(()),
        }
    }
}

impl<T: PropertyValue> Drop for OnChangeBlocker<T> {
    fn drop(&mut self) {
        let Some(property) = self.property.take() else {
            return;
        };
        // Re-armed silently while unwinding
        if !property.unblock() || std::thread::panicking() {
            return;
        }
        if let Err(e) = property.notify_observers() {
            log::error!(
                "Observer of '{}' failed when its blocker was dropped: {}",
                property.identifier(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn counted(p: &Property<i32>) -> (Rc<Cell<u32>>, Rc<RefCell<Vec<i32>>>) {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (c, s) = (Rc::clone(&calls), Rc::clone(&seen));
        p.on_change(move |v| {
            c.set(c.get() + 1);
            s.borrow_mut().push(*v);
        });
        (calls, seen)
    }

    #[test]
    fn test_block_coalesces_to_last_value() {
        let p = Property::new("v", "V", 0i32);
        let (calls, seen) = counted(&p);

        let blocker = p.block_on_change();
        p.set(1).unwrap();
        p.set(2).unwrap();
        p.set(3).unwrap();
        assert_eq!(calls.get(), 0);
        assert_eq!(p.get(), 3);
        assert!(p.is_modified());

        blocker.release().unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(*seen.borrow(), vec![3]);
        assert!(!p.is_blocked());
    }

    #[test]
    fn test_block_without_change_is_silent() {
        let p = Property::new("v", "V", 0i32);
        let (calls, _) = counted(&p);
        drop(p.block_on_change());
        assert_eq!(calls.get(), 0);
        p.set(1).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_nested_blockers() {
        let p = Property::new("v", "V", 0i32);
        let (calls, _) = counted(&p);
        let outer = OnChangeBlocker::new(&p);
        {
            let _inner = OnChangeBlocker::new(&p);
            p.set(5).unwrap();
        }
        assert_eq!(calls.get(), 0);
        drop(outer);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unblocked_on_error_path() {
        fn failing(p: &Property<i32>) -> std::result::Result<(), String> {
            let _blocker = p.block_on_change();
            p.set(10).map_err(|e| e.to_string())?;
            Err("aborted".to_string())
        }

        let p = Property::new("v", "V", 0i32);
        let (calls, _) = counted(&p);
        assert!(failing(&p).is_err());
        assert!(!p.is_blocked());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unblocked_on_panic() {
        let p = Property::new("v", "V", 0i32);
        let (calls, _) = counted(&p);

        let handle = p.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _blocker = handle.block_on_change();
            handle.set(1).unwrap();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!p.is_blocked());
        assert_eq!(calls.get(), 0);

        p.set(2).unwrap();
        assert_eq!(calls.get(), 1);
    }
}
