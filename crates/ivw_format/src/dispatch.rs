//! Runtime id to compile-time type dispatch
//!
//! A [`FormatVisitor`] is a generic function object. [`DataFormatId::dispatch`]
//! matches the runtime id and calls `visit::<T>()` with the native type that
//! id stands for, so format-dependent algorithms are written once against a
//! statically known `T`.
//!
//! ```
//! use ivw_format::{DataFormatBase, DataFormatId, DataFormatType, FormatVisitor};
//!
//! struct ComponentCount;
//!
//! impl FormatVisitor for ComponentCount {
//!     type Output = usize;
//!     fn visit<T: DataFormatType>(self) -> usize {
//!         T::COMPONENTS
//!     }
//! }
//!
//! let format = DataFormatBase::get_by_id(DataFormatId::Vec3Int16);
//! assert_eq!(format.dispatch(ComponentCount).unwrap(), 3);
//! ```

use crate::descriptor::DataFormatBase;
use crate::error::{DataFormatError, Result};
use crate::id::{format_table, DataFormatId};
use crate::numeric::NumericType;
use crate::types::DataFormatType;
use ivw_core::source_context;

/// Generic callback invoked with the native type behind a format id
pub trait FormatVisitor {
    type Output;

    fn visit<T: DataFormatType>(self) -> Self::Output;
}

/// Predicate restricting which formats a dispatch accepts
pub trait FormatFilter {
    const NAME: &'static str;

    fn accepts(format: &DataFormatBase) -> bool;
}

macro_rules! dispatch_match {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        impl DataFormatId {
            /// Call `visitor.visit::<T>()` with the native type of this id.
            ///
            /// Fails only for [`DataFormatId::NotSpecialized`].
            pub fn dispatch<V: FormatVisitor>(self, visitor: V) -> Result<V::Output> {
                match self {
                    DataFormatId::NotSpecialized => Err(DataFormatError::NotSpecialized {
                        context: source_context!(),
                    }),
                    $(DataFormatId::$variant => Ok(visitor.visit::<$ty>()),)*
                }
            }
        }
    };
}

format_table!(dispatch_match);

impl DataFormatBase {
    /// Dispatch on this descriptor's id
    #[inline]
    pub fn dispatch<V: FormatVisitor>(&self, visitor: V) -> Result<V::Output> {
        self.id().dispatch(visitor)
    }

    /// Dispatch only if `F` accepts this format
    pub fn dispatch_filtered<F: FormatFilter, V: FormatVisitor>(
        &self,
        visitor: V,
    ) -> Result<V::Output> {
        if !F::accepts(self) {
            return Err(DataFormatError::Unsupported {
                what: format!("{} is not accepted by the {} filter", self.name(), F::NAME),
                context: source_context!(),
            });
        }
        self.dispatch(visitor)
    }
}

/// Stock filters
pub mod filter {
    use super::*;

    macro_rules! define_filter {
        ($(#[$meta:meta])* $name:ident, $label:literal, |$f:ident| $body:expr) => {
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl FormatFilter for $name {
                const NAME: &'static str = $label;

                fn accepts($f: &DataFormatBase) -> bool {
                    $body
                }
            }
        };
    }

    define_filter!(
        /// Every specialized format
        All, "All", |f| f.id() != DataFormatId::NotSpecialized
    );
    define_filter!(Scalars, "Scalars", |f| f.components() == 1);
    define_filter!(
        /// Formats with 2 to 4 components
        Vecs, "Vecs", |f| f.components() > 1
    );
    define_filter!(Vec2s, "Vec2s", |f| f.components() == 2);
    define_filter!(Vec3s, "Vec3s", |f| f.components() == 3);
    define_filter!(Vec4s, "Vec4s", |f| f.components() == 4);
    define_filter!(Floats, "Floats", |f| f.numeric_type() == NumericType::Float);
    define_filter!(
        /// Signed and unsigned integers
        Integers, "Integers", |f| matches!(
            f.numeric_type(),
            NumericType::SignedInteger | NumericType::UnsignedInteger
        )
    );
    define_filter!(
        FloatScalars, "FloatScalars",
        |f| f.components() == 1 && f.numeric_type() == NumericType::Float
    );
}
