//! # ivw_core - Dataflow Core Primitives
//!
//! Small, dependency-light building blocks shared by every other crate in the
//! workspace:
//!
//! - [`InvalidationLevel`]: the ordered severity lattice used to classify the
//!   consequence of a mutation (`Valid < InvalidOutput < InvalidResources`)
//! - [`SourceContext`]: caller/file/line information attached to errors
//!
//! ```text
//!   Property ──set()──► PropertyOwner ──invalidate(level)──► Processor
//!                            │                                  │
//!                        max(level)                     Outport ──► Inport
//! ```

pub mod error;
pub mod invalidation;
pub mod source;

pub use error::{CoreError, Result};
pub use invalidation::InvalidationLevel;
pub use source::SourceContext;

pub mod prelude {
    pub use crate::error::{CoreError, Result};
    pub use crate::invalidation::InvalidationLevel;
    pub use crate::source::SourceContext;
    pub use crate::source_context;
}
