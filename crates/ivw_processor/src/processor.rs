//! Processors
//!
//! [`ProcessorBase`] carries the state every processor shares: its
//! properties, its ports and the pending invalidation level. Concrete
//! processors embed one and implement [`Processor`].
//!
//! Invalidation enters a processor either from one of its properties or from
//! an upstream outport through an inport:
//!
//! ```text
//!   property.set() ─► PropertyOwner ──┐
//!                                     ├─► ProcessorNode::invalidate(level)
//!   upstream outport ─► Inport ───────┘        │ raise level to max
//!                                              │ outports ─► InvalidOutput
//!                                              └ sink? ─► evaluation request
//! ```

use crate::error::{ProcessorError, Result};
use crate::info::ProcessorInfo;
use crate::ports::{Inport, InportObject, Outport, OutportObject};
use ivw_core::{source_context, InvalidationLevel};
use ivw_property::{InvalidationTarget, PropertyObject, PropertyOwner};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Port group used when none is given
pub const DEFAULT_PORT_GROUP: &str = "default";

type ReadyFn = Rc<dyn Fn() -> bool>;

struct ProcessorNode {
    identifier: RefCell<String>,
    owner: PropertyOwner,
    inports: RefCell<Vec<Rc<dyn InportObject>>>,
    outports: RefCell<Vec<Rc<dyn OutportObject>>>,
    /// (port identifier, group) in registration order
    port_groups: RefCell<Vec<(String, String)>>,
    ready_override: RefCell<Option<ReadyFn>>,
    evaluation_requested: Cell<bool>,
}

impl InvalidationTarget for ProcessorNode {
    fn invalidate(&self, level: InvalidationLevel, source: Option<&str>) {
        self.owner.raise_level(level);
        if self.owner.is_valid() {
            return;
        }
        log::trace!(
            "Processor '{}' invalidated ({}) by {}",
            self.identifier.borrow(),
            self.owner.invalidation_level(),
            source.unwrap_or("-")
        );

        let outports = self.outports.borrow().clone();
        for outport in &outports {
            outport.invalidate(InvalidationLevel::InvalidOutput);
        }
        if outports.is_empty() {
            self.evaluation_requested.set(true);
        }
    }
}

/// Shared processor state: identifier, properties, ports and invalidation level
#[derive(Clone)]
pub struct ProcessorBase {
    node: Rc<ProcessorNode>,
}

impl std::fmt::Debug for ProcessorBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorBase")
            .field("identifier", &*self.node.identifier.borrow())
            .field("level", &self.invalidation_level())
            .field("inports", &self.node.inports.borrow().len())
            .field("outports", &self.node.outports.borrow().len())
            .finish()
    }
}

impl ProcessorBase {
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let node = Rc::new(ProcessorNode {
            owner: PropertyOwner::new(identifier.clone()),
            identifier: RefCell::new(identifier),
            inports: RefCell::new(Vec::new()),
            outports: RefCell::new(Vec::new()),
            port_groups: RefCell::new(Vec::new()),
            ready_override: RefCell::new(None),
            evaluation_requested: Cell::new(false),
        });
        let link: Weak<ProcessorNode> = Rc::downgrade(&node);
        node.owner.set_parent(Some(link));
        Self { node }
    }

    pub fn identifier(&self) -> String {
        self.node.identifier.borrow().clone()
    }

    /// Rename the processor together with its property owner
    pub fn set_identifier(&self, identifier: impl Into<String>) {
        let identifier = identifier.into();
        self.node.owner.set_identifier(identifier.as_str());
        *self.node.identifier.borrow_mut() = identifier;
    }

    /// Properties of this processor
    pub fn owner(&self) -> &PropertyOwner {
        &self.node.owner
    }

    pub fn add_property<P>(&self, property: &P) -> Result<()>
    where
        P: PropertyObject + Clone + 'static,
    {
        self.node.owner.add_property(property)?;
        Ok(())
    }

    fn has_port(&self, identifier: &str) -> bool {
        self.node.inports.borrow().iter().any(|p| p.identifier() == identifier)
            || self.node.outports.borrow().iter().any(|p| p.identifier() == identifier)
    }

    fn check_port(&self, identifier: &str) -> Result<()> {
        if self.has_port(identifier) {
            return Err(ProcessorError::DuplicatePort {
                port: identifier.to_string(),
                processor: self.identifier(),
                context: source_context!(),
            });
        }
        Ok(())
    }

    pub fn add_inport<T: 'static>(&self, inport: &Inport<T>) -> Result<()> {
        self.add_inport_to_group(inport, DEFAULT_PORT_GROUP)
    }

    pub fn add_inport_to_group<T: 'static>(&self, inport: &Inport<T>, group: &str) -> Result<()> {
        self.check_port(inport.identifier())?;
        let link: Weak<ProcessorNode> = Rc::downgrade(&self.node);
        InportObject::set_processor(inport, Some(link));
        self.node.inports.borrow_mut().push(Rc::new(inport.clone()));
        self.add_to_group(inport.identifier(), group);
        Ok(())
    }

    pub fn add_outport<T: 'static>(&self, outport: &Outport<T>) -> Result<()> {
        self.add_outport_to_group(outport, DEFAULT_PORT_GROUP)
    }

    pub fn add_outport_to_group<T: 'static>(
        &self,
        outport: &Outport<T>,
        group: &str,
    ) -> Result<()> {
        self.check_port(outport.identifier())?;
        self.node.outports.borrow_mut().push(Rc::new(outport.clone()));
        self.add_to_group(outport.identifier(), group);
        Ok(())
    }

    fn add_to_group(&self, port: &str, group: &str) {
        self.node
            .port_groups
            .borrow_mut()
            .push((port.to_string(), group.to_string()));
    }

    pub fn inports(&self) -> Vec<Rc<dyn InportObject>> {
        self.node.inports.borrow().clone()
    }

    pub fn outports(&self) -> Vec<Rc<dyn OutportObject>> {
        self.node.outports.borrow().clone()
    }

    pub fn inport(&self, identifier: &str) -> Option<Rc<dyn InportObject>> {
        self.node
            .inports
            .borrow()
            .iter()
            .find(|p| p.identifier() == identifier)
            .cloned()
    }

    pub fn outport(&self, identifier: &str) -> Option<Rc<dyn OutportObject>> {
        self.node
            .outports
            .borrow()
            .iter()
            .find(|p| p.identifier() == identifier)
            .cloned()
    }

    pub fn port_group(&self, port: &str) -> Option<String> {
        self.node
            .port_groups
            .borrow()
            .iter()
            .find(|(p, _)| p == port)
            .map(|(_, g)| g.clone())
    }

    /// Distinct groups, in first-use order
    pub fn port_groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for (_, group) in self.node.port_groups.borrow().iter() {
            if !groups.contains(group) {
                groups.push(group.clone());
            }
        }
        groups
    }

    pub fn ports_in_group(&self, group: &str) -> Vec<String> {
        self.node
            .port_groups
            .borrow()
            .iter()
            .filter(|(_, g)| g == group)
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// No inports
    pub fn is_source(&self) -> bool {
        self.node.inports.borrow().is_empty()
    }

    /// No outports
    pub fn is_sink(&self) -> bool {
        self.node.outports.borrow().is_empty()
    }

    /// Raise the level; outports are invalidated when the processor becomes
    /// invalid and sinks record an evaluation request.
    pub fn invalidate(&self, level: InvalidationLevel, source: Option<&str>) {
        self.node.invalidate(level, source);
    }

    pub fn invalidation_level(&self) -> InvalidationLevel {
        self.node.owner.invalidation_level()
    }

    pub fn is_valid(&self) -> bool {
        self.node.owner.is_valid()
    }

    /// Replace the default readiness rule
    pub fn set_update(&self, ready: impl Fn() -> bool + 'static) {
        *self.node.ready_override.borrow_mut() = Some(Rc::new(ready));
    }

    pub fn clear_update(&self) {
        self.node.ready_override.borrow_mut().take();
    }

    /// Every inport is either optional and unconnected, or ready
    pub fn all_inports_ready(&self) -> bool {
        self.node
            .inports
            .borrow()
            .iter()
            .all(|p| (p.is_optional() && !p.is_connected()) || p.is_ready())
    }

    pub fn is_ready(&self) -> bool {
        let ready = self.node.ready_override.borrow().clone();
        match ready {
            Some(ready) => ready(),
            None => self.all_inports_ready(),
        }
    }

    /// Pending invalidation, or an inport received new data
    pub fn is_modified(&self) -> bool {
        !self.is_valid() || self.node.inports.borrow().iter().any(|p| p.is_changed())
    }

    /// Called after a successful `process()`
    pub fn set_valid(&self) {
        self.node.owner.set_valid();
        for inport in self.inports() {
            inport.set_changed(false);
        }
        for outport in self.outports() {
            outport.set_valid();
        }
    }

    /// Return and clear the evaluation request recorded by a sink
    pub fn take_evaluation_request(&self) -> bool {
        self.node.evaluation_requested.replace(false)
    }
}

/// A node in the processor network
pub trait Processor {
    fn base(&self) -> &ProcessorBase;

    fn info(&self) -> ProcessorInfo;

    /// Produce outport data from inport data and properties
    fn process(&mut self) -> Result<()>;

    /// Rebuild expensive state; run before `process` at `InvalidResources`
    fn initialize_resources(&mut self) -> Result<()> {
        Ok(())
    }

    fn identifier(&self) -> String {
        self.base().identifier()
    }

    fn is_ready(&self) -> bool {
        self.base().is_ready()
    }

    fn is_modified(&self) -> bool {
        self.base().is_modified()
    }

    fn invalidation_level(&self) -> InvalidationLevel {
        self.base().invalidation_level()
    }

    fn set_valid(&self) {
        self.base().set_valid()
    }
}

/// `base` if free, otherwise `base 2`, `base 3`, ... An existing numeric
/// suffix is replaced.
pub fn unique_identifier(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }
    let stem = match base.rsplit_once(' ') {
        Some((stem, number)) if !stem.is_empty() && number.parse::<u32>().is_ok() => stem,
        _ => base,
    };
    (2u32..)
        .map(|i| format!("{} {}", stem, i))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::connect;
    use ivw_property::Property;

    #[test]
    fn test_property_change_invalidates_processor() {
        let base = ProcessorBase::new("source");
        let count = Property::new("count", "Count", 4u32);
        base.add_property(&count).unwrap();
        assert!(base.is_valid());

        count.set(8).unwrap();
        assert_eq!(base.invalidation_level(), InvalidationLevel::InvalidOutput);
        assert!(base.is_modified());

        base.set_valid();
        assert!(!base.is_modified());
    }

    #[test]
    fn test_rename_reaches_property_owner() {
        let base = ProcessorBase::new("Statistics");
        base.add_property(&Property::new("normalized", "Normalized", false)).unwrap();
        base.set_identifier("Statistics 2");
        assert_eq!(base.identifier(), "Statistics 2");
        assert_eq!(base.owner().identifier(), "Statistics 2");

        let err = base
            .add_property(&Property::new("normalized", "Normalized", true))
            .unwrap_err();
        assert!(err.to_string().contains("'Statistics 2'"));
    }

    #[test]
    fn test_duplicate_ports_rejected() {
        let base = ProcessorBase::new("p");
        base.add_inport(&Inport::<u8>::new("data")).unwrap();
        assert!(matches!(
            base.add_outport(&Outport::<u8>::new("data")),
            Err(ProcessorError::DuplicatePort { .. })
        ));
    }

    #[test]
    fn test_port_groups() {
        let base = ProcessorBase::new("p");
        base.add_inport(&Inport::<u8>::new("a")).unwrap();
        base.add_inport_to_group(&Inport::<u8>::new("b"), "extra").unwrap();
        base.add_outport_to_group(&Outport::<u8>::new("c"), "extra").unwrap();
        assert_eq!(base.port_group("a").as_deref(), Some(DEFAULT_PORT_GROUP));
        assert_eq!(base.port_groups(), vec!["default", "extra"]);
        assert_eq!(base.ports_in_group("extra"), vec!["b", "c"]);
        assert!(base.port_group("zzz").is_none());
    }

    #[test]
    fn test_source_without_inports_is_ready() {
        let base = ProcessorBase::new("p");
        assert!(base.is_ready());
        assert!(base.is_source());
        assert!(base.is_sink());
    }

    #[test]
    fn test_optional_unconnected_inport_is_ready() {
        let base = ProcessorBase::new("p");
        base.add_inport(&Inport::<u8>::new("opt").with_optional(true)).unwrap();
        assert!(base.is_ready());
        base.add_inport(&Inport::<u8>::new("req")).unwrap();
        assert!(!base.is_ready());
    }

    #[test]
    fn test_set_update_overrides_readiness() {
        let base = ProcessorBase::new("p");
        base.add_inport(&Inport::<u8>::new("req")).unwrap();
        let flag = Rc::new(Cell::new(true));
        let f = Rc::clone(&flag);
        base.set_update(move || f.get());
        assert!(base.is_ready());
        flag.set(false);
        assert!(!base.is_ready());
        base.clear_update();
        assert!(!base.is_ready());
    }

    #[test]
    fn test_sink_records_evaluation_request() {
        let sink = ProcessorBase::new("sink");
        sink.invalidate(InvalidationLevel::InvalidOutput, None);
        assert!(sink.take_evaluation_request());
        assert!(!sink.take_evaluation_request());

        let source = ProcessorBase::new("source");
        source.add_outport(&Outport::<u8>::new("out")).unwrap();
        source.invalidate(InvalidationLevel::InvalidOutput, None);
        assert!(!source.take_evaluation_request());
    }

    #[test]
    fn test_connect_invalidates_downstream() {
        let source = ProcessorBase::new("source");
        let out = Outport::<u8>::new("out");
        source.add_outport(&out).unwrap();

        let sink = ProcessorBase::new("sink");
        let inport = Inport::<u8>::new("in");
        sink.add_inport(&inport).unwrap();

        connect(&out, &inport).unwrap();
        assert_eq!(sink.invalidation_level(), InvalidationLevel::InvalidOutput);
        assert!(sink.take_evaluation_request());
        assert!(source.is_valid());
    }

    #[test]
    fn test_unique_identifier() {
        let taken = ["Source", "Source 2", "Raycaster"];
        let is_taken = |id: &str| taken.contains(&id);
        assert_eq!(unique_identifier("Sink", is_taken), "Sink");
        assert_eq!(unique_identifier("Source", is_taken), "Source 3");
        assert_eq!(unique_identifier("Source 2", is_taken), "Source 3");
        assert_eq!(unique_identifier("Raycaster", is_taken), "Raycaster 2");
    }
}
