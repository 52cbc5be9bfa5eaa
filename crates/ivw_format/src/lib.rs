//! # ivw_format - Data Format Registry
//!
//! Immutable runtime descriptors for every supported scalar and vector element
//! type, plus the bridge between the runtime world (a [`DataFormatId`] read
//! from a file or a property) and the compile-time world (a concrete `T`).
//!
//! ```text
//!   DataFormatId ──────► DataFormatBase (&'static, one per id)
//!        ▲                      │
//!        │ const ID             │ dispatch(visitor)
//!        │                      ▼
//!   DataFormat<T> ◄──── FormatVisitor::visit::<T>()
//! ```
//!
//! Lookups by id, canonical name or (numeric type, components, precision) all
//! resolve to the same singleton, so descriptors can be compared by address.

pub mod convert;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod id;
pub mod numeric;
pub mod types;

pub use descriptor::{common_format_precision, common_numeric_type, DataFormatBase};
pub use dispatch::{filter, FormatFilter, FormatVisitor};
pub use error::{DataFormatError, Result};
pub use id::{DataFormatId, NUMBER_OF_FORMATS};
pub use numeric::NumericType;
pub use types::{DataFormat, DataFormatType, Scalar};

pub use half::f16;

pub mod prelude {
    pub use crate::descriptor::{common_format_precision, common_numeric_type, DataFormatBase};
    pub use crate::dispatch::{filter, FormatFilter, FormatVisitor};
    pub use crate::error::{DataFormatError, Result};
    pub use crate::id::DataFormatId;
    pub use crate::numeric::NumericType;
    pub use crate::types::{DataFormat, DataFormatType, Scalar};
    pub use half::f16;
}
