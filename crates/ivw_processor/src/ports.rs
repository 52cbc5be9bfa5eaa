//! Typed data ports
//!
//! An [`Outport<T>`] publishes shared data; an [`Inport<T>`] reads it from
//! every outport it is connected to. Connections hold weak references in both
//! directions; the processors own their ports.
//!
//! ```text
//!   Processor A                          Processor B
//!   ┌──────────┐   connect(out, in)      ┌──────────┐
//!   │  Outport ├────────────────────────►│  Inport  │
//!   └──────────┘                          └────┬─────┘
//!     invalidate(level) ─► inport.invalidate ─► B.invalidate(level)
//!     set_valid()       ─► inport.changed = true
//! ```

use crate::error::{ProcessorError, Result};
use ivw_core::{source_context, InvalidationLevel};
use ivw_property::{InvalidationTarget, OwnerLink};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Type-erased view of an inport, as seen by its processor
pub trait InportObject {
    fn identifier(&self) -> &str;

    fn data_type(&self) -> &'static str;

    fn is_optional(&self) -> bool;

    fn is_connected(&self) -> bool;

    /// Connected, and every connected outport is ready
    fn is_ready(&self) -> bool;

    /// New data arrived or a connection changed since the last evaluation
    fn is_changed(&self) -> bool;

    fn set_changed(&self, changed: bool);

    /// Forward an upstream invalidation to the owning processor
    fn invalidate(&self, level: InvalidationLevel);

    fn set_processor(&self, processor: Option<OwnerLink>);
}

/// Type-erased view of an outport, as seen by its processor
pub trait OutportObject {
    fn identifier(&self) -> &str;

    fn data_type(&self) -> &'static str;

    fn has_data(&self) -> bool;

    fn is_valid(&self) -> bool;

    /// Valid and holding data
    fn is_ready(&self) -> bool {
        self.is_valid() && self.has_data()
    }

    fn is_connected(&self) -> bool;

    /// Mark invalid and forward to every connected inport
    fn invalidate(&self, level: InvalidationLevel);

    /// Mark valid and flag every connected inport as changed
    fn set_valid(&self);
}

struct OutportState<T> {
    identifier: String,
    data: RefCell<Option<Rc<T>>>,
    valid: Cell<bool>,
    inports: RefCell<Vec<Weak<InportState<T>>>>,
}

struct InportState<T> {
    identifier: String,
    optional: Cell<bool>,
    max_connections: Cell<usize>,
    changed: Cell<bool>,
    outports: RefCell<Vec<Weak<OutportState<T>>>>,
    processor: RefCell<Option<OwnerLink>>,
}

impl<T> InportState<T> {
    fn connected(&self) -> Vec<Rc<OutportState<T>>> {
        self.outports.borrow().iter().filter_map(Weak::upgrade).collect()
    }

    fn invalidate(&self, level: InvalidationLevel) {
        let processor = self.processor.borrow().as_ref().and_then(Weak::upgrade);
        if let Some(processor) = processor {
            processor.invalidate(level, Some(&self.identifier));
        }
    }
}

impl<T> OutportState<T> {
    fn connected(&self) -> Vec<Rc<InportState<T>>> {
        self.inports.borrow().iter().filter_map(Weak::upgrade).collect()
    }

    fn is_ready(&self) -> bool {
        self.valid.get() && self.data.borrow().is_some()
    }
}

/// Port that publishes data of type `T`
pub struct Outport<T: 'static> {
    state: Rc<OutportState<T>>,
}

impl<T: 'static> Clone for Outport<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: 'static> fmt::Debug for Outport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outport")
            .field("identifier", &self.state.identifier)
            .field("valid", &self.state.valid.get())
            .field("has_data", &self.has_data())
            .finish()
    }
}

impl<T: 'static> Outport<T> {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            state: Rc::new(OutportState {
                identifier: identifier.into(),
                data: RefCell::new(None),
                valid: Cell::new(false),
                inports: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.state.identifier
    }

    pub fn set_data(&self, data: T) {
        self.set_shared_data(Rc::new(data));
    }

    pub fn set_shared_data(&self, data: Rc<T>) {
        *self.state.data.borrow_mut() = Some(data);
    }

    pub fn data(&self) -> Option<Rc<T>> {
        self.state.data.borrow().clone()
    }

    pub fn has_data(&self) -> bool {
        self.state.data.borrow().is_some()
    }

    pub fn clear_data(&self) {
        self.state.data.borrow_mut().take();
    }

    pub fn is_valid(&self) -> bool {
        self.state.valid.get()
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn connected_inport_count(&self) -> usize {
        self.state.connected().len()
    }

    pub fn is_connected_to(&self, inport: &Inport<T>) -> bool {
        let target = Rc::downgrade(&inport.state);
        self.state.inports.borrow().iter().any(|w| w.ptr_eq(&target))
    }
}

impl<T: 'static> OutportObject for Outport<T> {
    fn identifier(&self) -> &str {
        &self.state.identifier
    }

    fn data_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn has_data(&self) -> bool {
        Outport::has_data(self)
    }

    fn is_valid(&self) -> bool {
        self.state.valid.get()
    }

    fn is_connected(&self) -> bool {
        !self.state.connected().is_empty()
    }

    fn invalidate(&self, level: InvalidationLevel) {
        self.state.valid.set(false);
        for inport in self.state.connected() {
            inport.invalidate(level);
        }
    }

    fn set_valid(&self) {
        self.state.valid.set(true);
        for inport in self.state.connected() {
            inport.changed.set(true);
        }
    }
}

/// Port that receives data of type `T`
pub struct Inport<T: 'static> {
    state: Rc<InportState<T>>,
}

impl<T: 'static> Clone for Inport<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: 'static> fmt::Debug for Inport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inport")
            .field("identifier", &self.state.identifier)
            .field("connections", &self.connected_outport_count())
            .field("changed", &self.state.changed.get())
            .finish()
    }
}

impl<T: 'static> Inport<T> {
    /// Required, single-connection inport
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            state: Rc::new(InportState {
                identifier: identifier.into(),
                optional: Cell::new(false),
                max_connections: Cell::new(1),
                changed: Cell::new(false),
                outports: RefCell::new(Vec::new()),
                processor: RefCell::new(None),
            }),
        }
    }

    /// An optional inport does not hold its processor back while unconnected
    pub fn with_optional(self, optional: bool) -> Self {
        self.state.optional.set(optional);
        self
    }

    /// Maximum number of connections; 0 means unlimited
    pub fn with_max_connections(self, max: usize) -> Self {
        self.state.max_connections.set(max);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.state.identifier
    }

    pub fn max_connections(&self) -> usize {
        self.state.max_connections.get()
    }

    pub fn connected_outport_count(&self) -> usize {
        self.state.connected().len()
    }

    pub fn is_connected(&self) -> bool {
        self.connected_outport_count() > 0
    }

    pub fn is_ready(&self) -> bool {
        let outports = self.state.connected();
        !outports.is_empty() && outports.iter().all(|o| o.is_ready())
    }

    pub fn is_changed(&self) -> bool {
        self.state.changed.get()
    }

    /// Data of the first connected outport
    pub fn data(&self) -> Option<Rc<T>> {
        self.state
            .connected()
            .iter()
            .find_map(|o| o.data.borrow().clone())
    }

    /// Data of every connected outport that has some, in connection order
    pub fn vector_data(&self) -> Vec<Rc<T>> {
        self.state
            .connected()
            .iter()
            .filter_map(|o| o.data.borrow().clone())
            .collect()
    }
}

impl<T: 'static> InportObject for Inport<T> {
    fn identifier(&self) -> &str {
        &self.state.identifier
    }

    fn data_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn is_optional(&self) -> bool {
        self.state.optional.get()
    }

    fn is_connected(&self) -> bool {
        Inport::is_connected(self)
    }

    fn is_ready(&self) -> bool {
        Inport::is_ready(self)
    }

    fn is_changed(&self) -> bool {
        self.state.changed.get()
    }

    fn set_changed(&self, changed: bool) {
        self.state.changed.set(changed);
    }

    fn invalidate(&self, level: InvalidationLevel) {
        self.state.invalidate(level);
    }

    fn set_processor(&self, processor: Option<OwnerLink>) {
        *self.state.processor.borrow_mut() = processor;
    }
}

/// Connect `outport` to `inport`.
///
/// The inport is flagged as changed and its processor invalidated with
/// `InvalidOutput`.
pub fn connect<T: 'static>(outport: &Outport<T>, inport: &Inport<T>) -> Result<()> {
    if outport.is_connected_to(inport) {
        return Err(ProcessorError::AlreadyConnected {
            outport: outport.identifier().to_string(),
            inport: inport.identifier().to_string(),
            context: source_context!(),
        });
    }
    let max = inport.max_connections();
    if max != 0 && inport.connected_outport_count() >= max {
        return Err(ProcessorError::ConnectionLimit {
            inport: inport.identifier().to_string(),
            max,
            context: source_context!(),
        });
    }

    outport
        .state
        .inports
        .borrow_mut()
        .push(Rc::downgrade(&inport.state));
    inport
        .state
        .outports
        .borrow_mut()
        .push(Rc::downgrade(&outport.state));
    log::debug!(
        "Connected '{}' -> '{}'",
        outport.identifier(),
        inport.identifier()
    );

    inport.state.changed.set(true);
    inport.state.invalidate(InvalidationLevel::InvalidOutput);
    Ok(())
}

/// Remove the connection between `outport` and `inport`
pub fn disconnect<T: 'static>(outport: &Outport<T>, inport: &Inport<T>) -> Result<()> {
    if !outport.is_connected_to(inport) {
        return Err(ProcessorError::NotConnected {
            outport: outport.identifier().to_string(),
            inport: inport.identifier().to_string(),
            context: source_context!(),
        });
    }

    let inport_weak = Rc::downgrade(&inport.state);
    let outport_weak = Rc::downgrade(&outport.state);
    outport
        .state
        .inports
        .borrow_mut()
        .retain(|w| !w.ptr_eq(&inport_weak));
    inport
        .state
        .outports
        .borrow_mut()
        .retain(|w| !w.ptr_eq(&outport_weak));
    log::debug!(
        "Disconnected '{}' -> '{}'",
        outport.identifier(),
        inport.identifier()
    );

    inport.state.changed.set(true);
    inport.state.invalidate(InvalidationLevel::InvalidOutput);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outport_ready_needs_valid_and_data() {
        let out = Outport::<u32>::new("out");
        assert!(!out.is_ready());
        out.set_data(3);
        assert!(!out.is_ready());
        OutportObject::set_valid(&out);
        assert!(out.is_ready());
        out.clear_data();
        assert!(!out.is_ready());
    }

    #[test]
    fn test_inport_ready_follows_outports() {
        let out = Outport::<u32>::new("out");
        let inport = Inport::<u32>::new("in");
        assert!(!inport.is_ready());

        connect(&out, &inport).unwrap();
        assert!(inport.is_changed());
        assert!(!inport.is_ready());

        out.set_data(1);
        OutportObject::set_valid(&out);
        assert!(inport.is_ready());
        assert_eq!(inport.data().as_deref(), Some(&1));

        OutportObject::invalidate(&out, InvalidationLevel::InvalidOutput);
        assert!(!inport.is_ready());
    }

    #[test]
    fn test_duplicate_and_limit() {
        let a = Outport::<f32>::new("a");
        let b = Outport::<f32>::new("b");
        let single = Inport::<f32>::new("single");
        connect(&a, &single).unwrap();
        assert!(matches!(
            connect(&a, &single),
            Err(ProcessorError::AlreadyConnected { .. })
        ));
        assert!(matches!(
            connect(&b, &single),
            Err(ProcessorError::ConnectionLimit { max: 1, .. })
        ));

        let multi = Inport::<f32>::new("multi").with_max_connections(0);
        connect(&a, &multi).unwrap();
        connect(&b, &multi).unwrap();
        assert_eq!(multi.connected_outport_count(), 2);
        assert_eq!(a.connected_inport_count(), 2);
    }

    #[test]
    fn test_disconnect() {
        let out = Outport::<i8>::new("out");
        let inport = Inport::<i8>::new("in");
        assert!(matches!(
            disconnect(&out, &inport),
            Err(ProcessorError::NotConnected { .. })
        ));
        connect(&out, &inport).unwrap();
        InportObject::set_changed(&inport, false);

        disconnect(&out, &inport).unwrap();
        assert!(!inport.is_connected());
        assert!(inport.is_changed());
        assert_eq!(out.connected_inport_count(), 0);
    }

    #[test]
    fn test_vector_data_in_connection_order() {
        let a = Outport::<&'static str>::new("a");
        let b = Outport::<&'static str>::new("b");
        let inport = Inport::<&'static str>::new("in").with_max_connections(0);
        connect(&b, &inport).unwrap();
        connect(&a, &inport).unwrap();
        a.set_data("a");
        b.set_data("b");
        let data: Vec<_> = inport.vector_data().iter().map(|d| **d).collect();
        assert_eq!(data, vec!["b", "a"]);
    }

    #[test]
    fn test_dropped_outport_disconnects() {
        let inport = Inport::<u8>::new("in");
        {
            let out = Outport::<u8>::new("out");
            connect(&out, &inport).unwrap();
            assert!(inport.is_connected());
        }
        assert!(!inport.is_connected());
    }
}
