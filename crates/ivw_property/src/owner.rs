//! Property owners
//!
//! A [`PropertyOwner`] keeps an ordered list of properties and the aggregate
//! invalidation level: the maximum requested by any child since the last call
//! to [`set_valid`](PropertyOwner::set_valid). Requests are forwarded to an
//! optional parent target (a processor, or the owner of a composite).

use crate::error::{PropertyError, Result};
use crate::object::{InvalidationTarget, OwnerLink, PropertyObject};
use crate::property::{Property, PropertyValue};
use ivw_core::{source_context, InvalidationLevel};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Separator used in property paths (`"camera.lookFrom"`)
pub const PATH_SEPARATOR: char = '.';

pub(crate) struct OwnerState {
    identifier: RefCell<String>,
    level: Cell<InvalidationLevel>,
    properties: RefCell<Vec<Rc<dyn PropertyObject>>>,
    parent: RefCell<Option<OwnerLink>>,
}

impl OwnerState {
    fn raise(&self, level: InvalidationLevel) {
        if level > self.level.get() {
            self.level.set(level);
        }
    }
}

impl InvalidationTarget for OwnerState {
    fn invalidate(&self, level: InvalidationLevel, source: Option<&str>) {
        self.raise(level);
        log::trace!(
            "'{}' invalidated to {} by {}",
            self.identifier.borrow(),
            self.level.get(),
            source.unwrap_or("-")
        );
        let parent = self.parent.borrow().as_ref().and_then(Weak::upgrade);
        if let Some(parent) = parent {
            parent.invalidate(level, source);
        }
    }
}

/// Ordered collection of properties with an aggregate invalidation level
#[derive(Clone)]
pub struct PropertyOwner {
    state: Rc<OwnerState>,
}

impl std::fmt::Debug for PropertyOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self
            .state
            .properties
            .borrow()
            .iter()
            .map(|p| p.identifier().to_string())
            .collect();
        f.debug_struct("PropertyOwner")
            .field("identifier", &*self.state.identifier.borrow())
            .field("level", &self.state.level.get())
            .field("properties", &ids)
            .finish()
    }
}

pub(crate) fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty() || identifier.contains(PATH_SEPARATOR) {
        return Err(PropertyError::InvalidIdentifier {
            identifier: identifier.to_string(),
            context: source_context!(),
        });
    }
    Ok(())
}

impl PropertyOwner {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            state: Rc::new(OwnerState {
                identifier: RefCell::new(identifier.into()),
                level: Cell::new(InvalidationLevel::Valid),
                properties: RefCell::new(Vec::new()),
                parent: RefCell::new(None),
            }),
        }
    }

    pub fn identifier(&self) -> String {
        self.state.identifier.borrow().clone()
    }

    /// Rename the owner; used when its processor is renamed
    pub fn set_identifier(&self, identifier: impl Into<String>) {
        *self.state.identifier.borrow_mut() = identifier.into();
    }

    /// Take shared ownership of `property` and point its invalidations here.
    ///
    /// Fails if the identifier is malformed or already used in this owner.
    pub fn add_property<P>(&self, property: &P) -> Result<()>
    where
        P: PropertyObject + Clone + 'static,
    {
        let identifier = property.identifier();
        validate_identifier(identifier)?;
        if self.property(identifier).is_some() {
            return Err(PropertyError::DuplicateIdentifier {
                identifier: identifier.to_string(),
                owner: self.identifier(),
                context: source_context!(),
            });
        }
        property.set_owner(Some(self.as_target()));
        self.state
            .properties
            .borrow_mut()
            .push(Rc::new(property.clone()));
        Ok(())
    }

    /// Detach a property; it no longer invalidates this owner
    pub fn remove_property(&self, identifier: &str) -> Option<Rc<dyn PropertyObject>> {
        let mut properties = self.state.properties.borrow_mut();
        let index = properties.iter().position(|p| p.identifier() == identifier)?;
        let removed = properties.remove(index);
        removed.set_owner(None);
        Some(removed)
    }

    /// Direct children, in insertion order
    pub fn properties(&self) -> Vec<Rc<dyn PropertyObject>> {
        self.state.properties.borrow().clone()
    }

    /// All descendants, depth first
    pub fn properties_recursive(&self) -> Vec<Rc<dyn PropertyObject>> {
        let mut out = Vec::new();
        for property in self.properties() {
            let nested = property.as_owner().map(PropertyOwner::properties_recursive);
            out.push(property);
            if let Some(nested) = nested {
                out.extend(nested);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.state.properties.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Direct child with the given identifier
    pub fn property(&self, identifier: &str) -> Option<Rc<dyn PropertyObject>> {
        self.state
            .properties
            .borrow()
            .iter()
            .find(|p| p.identifier() == identifier)
            .cloned()
    }

    /// First descendant with the given identifier, depth first
    pub fn property_recursive(&self, identifier: &str) -> Option<Rc<dyn PropertyObject>> {
        for property in self.properties() {
            if property.identifier() == identifier {
                return Some(property);
            }
            if let Some(found) = property
                .as_owner()
                .and_then(|owner| owner.property_recursive(identifier))
            {
                return Some(found);
            }
        }
        None
    }

    /// Resolve a dotted path through nested composites
    pub fn property_by_path(&self, path: &str) -> Result<Rc<dyn PropertyObject>> {
        let not_found = || PropertyError::NotFound {
            path: path.to_string(),
            context: source_context!(),
        };
        let mut segments = path.split(PATH_SEPARATOR);
        let first = segments.next().ok_or_else(not_found)?;
        let mut current = self.property(first).ok_or_else(not_found)?;
        for segment in segments {
            let next = current
                .as_owner()
                .and_then(|owner| owner.property(segment))
                .ok_or_else(not_found)?;
            current = next;
        }
        Ok(current)
    }

    /// Typed handle onto a direct child
    pub fn typed_property<T: PropertyValue>(&self, identifier: &str) -> Result<Property<T>> {
        let property = self.property(identifier).ok_or_else(|| PropertyError::NotFound {
            path: identifier.to_string(),
            context: source_context!(),
        })?;
        property
            .as_any()
            .downcast_ref::<Property<T>>()
            .cloned()
            .ok_or_else(|| PropertyError::TypeMismatch {
                identifier: identifier.to_string(),
                expected: std::any::type_name::<T>(),
                context: source_context!(),
            })
    }

    /// Maximum level requested since the last [`set_valid`](Self::set_valid)
    pub fn invalidation_level(&self) -> InvalidationLevel {
        self.state.level.get()
    }

    pub fn is_valid(&self) -> bool {
        self.state.level.get().is_valid()
    }

    /// Pending invalidation, or any property changed since the last evaluation
    pub fn is_modified(&self) -> bool {
        !self.is_valid() || self.state.properties.borrow().iter().any(|p| p.is_modified())
    }

    /// Raise the level and forward to the parent
    pub fn invalidate(&self, level: InvalidationLevel, source: Option<&str>) {
        self.state.invalidate(level, source);
    }

    /// Raise the level without forwarding
    pub fn raise_level(&self, level: InvalidationLevel) {
        self.state.raise(level);
    }

    /// Mark every property unmodified and clear the pending level
    pub fn set_valid(&self) {
        for property in self.properties() {
            property.set_valid();
        }
        self.state.level.set(InvalidationLevel::Valid);
    }

    pub fn set_parent(&self, parent: Option<OwnerLink>) {
        *self.state.parent.borrow_mut() = parent;
    }

    /// Weak link suitable for [`PropertyObject::set_owner`]
    pub fn as_target(&self) -> OwnerLink {
        let weak: Weak<OwnerState> = Rc::downgrade(&self.state);
        weak
    }

    pub fn set_all_properties_current_state_as_default(&self) {
        for property in self.properties() {
            property.set_current_state_as_default();
        }
    }

    /// Reset every property; stops at the first observer error
    pub fn reset_all_properties(&self) -> Result<()> {
        for property in self.properties() {
            property.reset_to_default()?;
        }
        Ok(())
    }

    /// `{ identifier: property document, .. }`
    pub fn serialize(&self) -> Result<serde_json::Value> {
        let mut map = serde_json::Map::new();
        for property in self.properties() {
            map.insert(property.identifier().to_string(), property.serialize()?);
        }
        Ok(serde_json::Value::Object(map))
    }

    /// Apply a document produced by [`serialize`](Self::serialize).
    /// Unknown keys are skipped with a warning.
    pub fn deserialize(&self, document: &serde_json::Value) -> Result<()> {
        let Some(map) = document.as_object() else {
            log::warn!(
                "Ignoring non-object document for '{}'",
                self.state.identifier.borrow()
            );
            return Ok(());
        };
        for (key, value) in map {
            match self.property(key) {
                Some(property) => property.deserialize(value)?,
                None => log::warn!(
                    "'{}' has no property '{}', skipping",
                    self.state.identifier.borrow(),
                    key
                ),
            }
        }
        Ok(())
    }
}
