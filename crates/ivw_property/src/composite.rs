//! Properties that own other properties

use crate::error::Result;
use crate::object::{InvalidationTarget, OwnerLink, PropertyObject};
use crate::owner::PropertyOwner;
use ivw_core::InvalidationLevel;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

struct CompositeState {
    identifier: String,
    owner: PropertyOwner,
    display_name: RefCell<String>,
    level: InvalidationLevel,
}

/// A property that is itself a [`PropertyOwner`].
///
/// Child changes raise the composite's level and travel on to whatever owns
/// the composite, so a processor sees one invalidation per child change.
#[derive(Clone)]
pub struct CompositeProperty {
    state: Rc<CompositeState>,
}

impl std::fmt::Debug for CompositeProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeProperty")
            .field("owner", &self.state.owner)
            .finish()
    }
}

impl CompositeProperty {
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            state: Rc::new(CompositeState {
                owner: PropertyOwner::new(identifier.clone()),
                identifier,
                display_name: RefCell::new(display_name.into()),
                level: InvalidationLevel::InvalidOutput,
            }),
        }
    }

    pub fn owner(&self) -> &PropertyOwner {
        &self.state.owner
    }

    pub fn add_property<P>(&self, property: &P) -> Result<()>
    where
        P: PropertyObject + Clone + 'static,
    {
        self.state.owner.add_property(property)
    }

    pub fn identifier(&self) -> &str {
        &self.state.identifier
    }

    pub fn set_display_name(&self, name: impl Into<String>) {
        *self.state.display_name.borrow_mut() = name.into();
    }

    /// Raise the composite's level and forward to its owner
    pub fn invalidate(&self, level: InvalidationLevel, source: Option<&str>) {
        self.state.owner.invalidate(level, source);
    }
}

impl PropertyObject for CompositeProperty {
    fn identifier(&self) -> &str {
        &self.state.identifier
    }

    fn display_name(&self) -> String {
        self.state.display_name.borrow().clone()
    }

    fn class_identifier(&self) -> &'static str {
        "ivw.CompositeProperty"
    }

    fn invalidation_level(&self) -> InvalidationLevel {
        self.state.level
    }

    fn is_modified(&self) -> bool {
        self.state.owner.is_modified()
    }

    fn set_valid(&self) {
        self.state.owner.set_valid();
    }

    fn set_owner(&self, owner: Option<OwnerLink>) {
        self.state.owner.set_parent(owner);
    }

    fn reset_to_default(&self) -> Result<()> {
        self.state.owner.reset_all_properties()
    }

    fn set_current_state_as_default(&self) {
        self.state.owner.set_all_properties_current_state_as_default();
    }

    fn serialize(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "displayName": self.display_name(),
            "properties": self.state.owner.serialize()?,
        }))
    }

    fn deserialize(&self, document: &serde_json::Value) -> Result<()> {
        if let Some(name) = document.get("displayName").and_then(|n| n.as_str()) {
            self.set_display_name(name);
        }
        match document.get("properties") {
            Some(properties) => self.state.owner.deserialize(properties),
            None => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_owner(&self) -> Option<&PropertyOwner> {
        Some(&self.state.owner)
    }
}

impl InvalidationTarget for CompositeProperty {
    fn invalidate(&self, level: InvalidationLevel, source: Option<&str>) {
        CompositeProperty::invalidate(self, level, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Property;

    #[test]
    fn test_child_change_reaches_outer_owner() {
        let outer = PropertyOwner::new("proc");
        let composite = CompositeProperty::new("camera", "Camera");
        let fov = Property::new("fov", "FOV", 60.0f32);
        composite.add_property(&fov).unwrap();
        outer.add_property(&composite).unwrap();

        fov.set(45.0).unwrap();
        assert_eq!(composite.owner().invalidation_level(), InvalidationLevel::InvalidOutput);
        assert_eq!(outer.invalidation_level(), InvalidationLevel::InvalidOutput);
        assert!(composite.is_modified());

        outer.set_valid();
        assert!(!composite.is_modified());
        assert!(!fov.is_modified());
        assert!(composite.owner().is_valid());
    }

    #[test]
    fn test_path_lookup_through_composite() {
        let outer = PropertyOwner::new("proc");
        let composite = CompositeProperty::new("camera", "Camera");
        composite.add_property(&Property::new("near", "Near", 0.1f32)).unwrap();
        outer.add_property(&composite).unwrap();

        let near = outer.property_by_path("camera.near").unwrap();
        assert_eq!(near.identifier(), "near");
        assert!(outer.property_by_path("camera.far").is_err());
        assert!(outer.property_recursive("near").is_some());
        assert_eq!(outer.properties_recursive().len(), 2);
    }

    #[test]
    fn test_serialize_nested() {
        let composite = CompositeProperty::new("camera", "Camera");
        let near = Property::new("near", "Near", 0.1f64);
        composite.add_property(&near).unwrap();
        near.set(0.5).unwrap();
        let doc = composite.serialize().unwrap();
        assert_eq!(doc["properties"]["near"]["value"], serde_json::json!(0.5));

        near.set(2.0).unwrap();
        composite.deserialize(&doc).unwrap();
        assert_eq!(near.get(), 0.5);
    }
}
