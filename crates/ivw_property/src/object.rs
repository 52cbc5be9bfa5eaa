//! Type-erased property interface
//!
//! Owners keep their properties as `Rc<dyn PropertyObject>` so properties of
//! different value types can live in one ordered list. Invalidation flows the
//! other way, through a weak [`InvalidationTarget`] back-reference.

use crate::error::Result;
use crate::owner::PropertyOwner;
use ivw_core::InvalidationLevel;
use std::any::Any;
use std::rc::Weak;

/// Receiver of invalidation requests (an owner, a composite, a processor)
pub trait InvalidationTarget {
    /// Raise the pending level to at least `level`. `source` names the
    /// property that caused it, when there is one.
    fn invalidate(&self, level: InvalidationLevel, source: Option<&str>);
}

/// Weak link from a property to whatever owns it
pub type OwnerLink = Weak<dyn InvalidationTarget>;

pub trait PropertyObject {
    fn identifier(&self) -> &str;

    fn display_name(&self) -> String;

    fn class_identifier(&self) -> &'static str;

    /// Level requested from the owner whenever this property changes
    fn invalidation_level(&self) -> InvalidationLevel;

    /// Changed since the owner was last evaluated
    fn is_modified(&self) -> bool;

    /// Clear the modified state after an evaluation pass
    fn set_valid(&self);

    fn set_owner(&self, owner: Option<OwnerLink>);

    fn reset_to_default(&self) -> Result<()>;

    fn set_current_state_as_default(&self);

    fn serialize(&self) -> Result<serde_json::Value>;

    fn deserialize(&self, document: &serde_json::Value) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    /// Nested owner, for composite properties
    fn as_owner(&self) -> Option<&PropertyOwner> {
        None
    }
}
