//! # ivw_property - Observable Properties
//!
//! Named values that record whether they changed since the last evaluation,
//! notify observers synchronously, and raise an invalidation level on the
//! owner they belong to.
//!
//! ```text
//!   Property<T> ──┐
//!   OptionProperty├──► PropertyOwner ──► parent (processor or composite)
//!   Composite ────┘        max(level)
//! ```
//!
//! Handles are reference counted and single threaded: clone a property to
//! capture it in another property's observer.

pub mod blocker;
pub mod composite;
pub mod error;
pub mod object;
pub mod option;
pub mod owner;
pub mod property;

pub use blocker::OnChangeBlocker;
pub use composite::CompositeProperty;
pub use error::{BoxError, PropertyError, Result};
pub use object::{InvalidationTarget, OwnerLink, PropertyObject};
pub use option::{OptionEntry, OptionProperty};
pub use owner::{PropertyOwner, PATH_SEPARATOR};
pub use property::{CallbackId, Property, PropertyValue};

pub mod prelude {
    pub use crate::blocker::OnChangeBlocker;
    pub use crate::composite::CompositeProperty;
    pub use crate::error::{PropertyError, Result};
    pub use crate::object::{InvalidationTarget, OwnerLink, PropertyObject};
    pub use crate::option::{OptionEntry, OptionProperty};
    pub use crate::owner::PropertyOwner;
    pub use crate::property::{CallbackId, Property, PropertyValue};
    pub use ivw_core::InvalidationLevel;
}
