//! Selection among a fixed list of named options

use crate::error::{PropertyError, Result};
use crate::object::{OwnerLink, PropertyObject};
use crate::property::{CallbackId, Property};
use ivw_core::{source_context, InvalidationLevel};
use std::any::Any;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct OptionEntry<T> {
    pub identifier: String,
    pub display_name: String,
    pub value: T,
}

impl<T> OptionEntry<T> {
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>, value: T) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            value,
        }
    }
}

/// A property whose value is one of a fixed set of options.
///
/// The selected index lives in an ordinary [`Property<usize>`], so observers,
/// blocking and invalidation behave exactly like any other property.
#[derive(Clone)]
pub struct OptionProperty<T: Clone + 'static> {
    selected: Property<usize>,
    options: Rc<Vec<OptionEntry<T>>>,
}

impl<T: Clone + std::fmt::Debug + 'static> std::fmt::Debug for OptionProperty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionProperty")
            .field("identifier", &self.selected.identifier())
            .field("selected", &self.selected_identifier())
            .finish()
    }
}

impl<T: Clone + 'static> OptionProperty<T> {
    /// Create with the first option selected
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        options: Vec<OptionEntry<T>>,
    ) -> Self {
        let last = options.len().saturating_sub(1);
        Self {
            selected: Property::new(identifier, display_name, 0usize).with_range(0, last),
            options: Rc::new(options),
        }
    }

    /// Select `index` and make it the default, without notifying observers
    pub fn with_selected_index(self, index: usize) -> Self {
        Self {
            selected: self.selected.with_initial_value(index),
            options: self.options,
        }
    }

    pub fn with_invalidation_level(self, level: InvalidationLevel) -> Self {
        self.selected.set_invalidation_level(level);
        self
    }

    pub fn identifier(&self) -> &str {
        self.selected.identifier()
    }

    pub fn options(&self) -> &[OptionEntry<T>] {
        &self.options
    }

    pub fn selected_index(&self) -> usize {
        self.selected.get()
    }

    pub fn selected_entry(&self) -> Option<&OptionEntry<T>> {
        self.options.get(self.selected.get())
    }

    pub fn selected_value(&self) -> Option<T> {
        self.selected_entry().map(|e| e.value.clone())
    }

    pub fn selected_identifier(&self) -> Option<&str> {
        self.selected_entry().map(|e| e.identifier.as_str())
    }

    /// Out-of-range indices are clamped to the last option
    pub fn set_selected_index(&self, index: usize) -> Result<()> {
        self.selected.set(index)
    }

    pub fn set_selected_identifier(&self, identifier: &str) -> Result<()> {
        let index = self
            .options
            .iter()
            .position(|e| e.identifier == identifier)
            .ok_or_else(|| PropertyError::UnknownOption {
                identifier: self.identifier().to_string(),
                option: identifier.to_string(),
                context: source_context!(),
            })?;
        self.selected.set(index)
    }

    /// Observers receive the newly selected index
    pub fn on_change(&self, f: impl FnMut(&usize) + 'static) -> CallbackId {
        self.selected.on_change(f)
    }

    pub fn index_property(&self) -> &Property<usize> {
        &self.selected
    }
}

impl<T: Clone + PartialEq + 'static> OptionProperty<T> {
    pub fn set_selected_value(&self, value: &T) -> Result<()> {
        let index = self.options.iter().position(|e| e.value == *value).ok_or_else(|| {
            PropertyError::UnknownOption {
                identifier: self.identifier().to_string(),
                option: String::from("<value>"),
                context: source_context!(),
            }
        })?;
        self.selected.set(index)
    }
}

impl<T: Clone + 'static> PropertyObject for OptionProperty<T> {
    fn identifier(&self) -> &str {
        self.selected.identifier()
    }

    fn display_name(&self) -> String {
        self.selected.display_name()
    }

    fn class_identifier(&self) -> &'static str {
        "ivw.OptionProperty"
    }

    fn invalidation_level(&self) -> InvalidationLevel {
        self.selected.invalidation_level()
    }

    fn is_modified(&self) -> bool {
        self.selected.is_modified()
    }

    fn set_valid(&self) {
        self.selected.set_valid();
    }

    fn set_owner(&self, owner: Option<OwnerLink>) {
        PropertyObject::set_owner(&self.selected, owner);
    }

    fn reset_to_default(&self) -> Result<()> {
        self.selected.reset_to_default()
    }

    fn set_current_state_as_default(&self) {
        self.selected.set_current_state_as_default();
    }

    fn serialize(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "displayName": self.display_name(),
            "selectedIdentifier": self.selected_identifier(),
        }))
    }

    fn deserialize(&self, document: &serde_json::Value) -> Result<()> {
        if let Some(name) = document.get("displayName").and_then(|n| n.as_str()) {
            self.selected.set_display_name(name);
        }
        match document.get("selectedIdentifier").and_then(|s| s.as_str()) {
            Some(identifier) => self.set_selected_identifier(identifier),
            None => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
