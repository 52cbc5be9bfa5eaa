//! Compile-time type to format mapping
//!
//! Every supported native element type implements [`DataFormatType`], which
//! carries its [`DataFormatId`] as an associated constant. Asking for the
//! format of an unsupported type is a compile error rather than a silent
//! `NotSpecialized`.

use crate::descriptor::DataFormatBase;
use crate::id::DataFormatId;
use crate::numeric::NumericType;
use bytemuck::Pod;
use half::f16;
use std::fmt::Debug;
use std::marker::PhantomData;

/// A single component type (`f16`, `f32`, `f64`, `i8`..`i64`, `u8`..`u64`)
pub trait Scalar: Pod + PartialOrd + Debug + Send + Sync + 'static {
    const NUMERIC_TYPE: NumericType;
    const MAX: f64;
    /// Smallest positive normal value for floats, the minimum for integers
    const MIN: f64;
    const LOWEST: f64;

    fn to_f64(self) -> f64;

    /// Saturating conversion from `f64`
    fn from_f64(value: f64) -> Self;

    /// Integers map onto `[0, 1]`, floats pass through unchanged
    fn to_normalized_f64(self) -> f64 {
        match Self::NUMERIC_TYPE {
            NumericType::Float | NumericType::NotSpecialized => self.to_f64(),
            _ => (self.to_f64() - Self::LOWEST) / (Self::MAX - Self::LOWEST),
        }
    }
}

/// A native type with a registered data format
pub trait DataFormatType: Pod + Debug + Send + Sync + 'static {
    type Component: Scalar;
    const ID: DataFormatId;
    const COMPONENTS: usize;

    fn components(&self) -> &[Self::Component];

    fn from_components(f: impl FnMut(usize) -> Self::Component) -> Self;
}

macro_rules! impl_scalar {
    ($ty:ty, $numeric:ident, $max:expr, $min:expr, $lowest:expr) => {
        impl Scalar for $ty {
            const NUMERIC_TYPE: NumericType = NumericType::$numeric;
            const MAX: f64 = $max;
            const MIN: f64 = $min;
            const LOWEST: f64 = $lowest;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                value as $ty
            }
        }
    };
}

impl_scalar!(f32, Float, f32::MAX as f64, f32::MIN_POSITIVE as f64, f32::MIN as f64);
impl_scalar!(f64, Float, f64::MAX, f64::MIN_POSITIVE, f64::MIN);
impl_scalar!(i8, SignedInteger, i8::MAX as f64, i8::MIN as f64, i8::MIN as f64);
impl_scalar!(i16, SignedInteger, i16::MAX as f64, i16::MIN as f64, i16::MIN as f64);
impl_scalar!(i32, SignedInteger, i32::MAX as f64, i32::MIN as f64, i32::MIN as f64);
impl_scalar!(i64, SignedInteger, i64::MAX as f64, i64::MIN as f64, i64::MIN as f64);
impl_scalar!(u8, UnsignedInteger, u8::MAX as f64, 0.0, 0.0);
impl_scalar!(u16, UnsignedInteger, u16::MAX as f64, 0.0, 0.0);
impl_scalar!(u32, UnsignedInteger, u32::MAX as f64, 0.0, 0.0);
impl_scalar!(u64, UnsignedInteger, u64::MAX as f64, 0.0, 0.0);

impl Scalar for f16 {
    const NUMERIC_TYPE: NumericType = NumericType::Float;
    const MAX: f64 = 65504.0;
    const MIN: f64 = 6.103515625e-5;
    const LOWEST: f64 = -65504.0;

    #[inline]
    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        f16::from_f64(value)
    }
}

macro_rules! impl_format_types {
    ($ty:ty => $scalar:ident, $vec2:ident, $vec3:ident, $vec4:ident) => {
        impl DataFormatType for $ty {
            type Component = $ty;
            const ID: DataFormatId = DataFormatId::$scalar;
            const COMPONENTS: usize = 1;

            #[inline]
            fn components(&self) -> &[$ty] {
                std::slice::from_ref(self)
            }

            #[inline]
            fn from_components(mut f: impl FnMut(usize) -> $ty) -> Self {
                f(0)
            }
        }
        impl_format_types!(@vec $ty, 2, $vec2);
        impl_format_types!(@vec $ty, 3, $vec3);
        impl_format_types!(@vec $ty, 4, $vec4);
    };
    (@vec $ty:ty, $n:literal, $id:ident) => {
        impl DataFormatType for [$ty; $n] {
            type Component = $ty;
            const ID: DataFormatId = DataFormatId::$id;
            const COMPONENTS: usize = $n;

            #[inline]
            fn components(&self) -> &[$ty] {
                self.as_slice()
            }

            #[inline]
            fn from_components(f: impl FnMut(usize) -> $ty) -> Self {
                std::array::from_fn(f)
            }
        }
    };
}

impl_format_types!(f16 => Float16, Vec2Float16, Vec3Float16, Vec4Float16);
impl_format_types!(f32 => Float32, Vec2Float32, Vec3Float32, Vec4Float32);
impl_format_types!(f64 => Float64, Vec2Float64, Vec3Float64, Vec4Float64);
impl_format_types!(i8 => Int8, Vec2Int8, Vec3Int8, Vec4Int8);
impl_format_types!(i16 => Int16, Vec2Int16, Vec3Int16, Vec4Int16);
impl_format_types!(i32 => Int32, Vec2Int32, Vec3Int32, Vec4Int32);
impl_format_types!(i64 => Int64, Vec2Int64, Vec3Int64, Vec4Int64);
impl_format_types!(u8 => UInt8, Vec2UInt8, Vec3UInt8, Vec4UInt8);
impl_format_types!(u16 => UInt16, Vec2UInt16, Vec3UInt16, Vec4UInt16);
impl_format_types!(u32 => UInt32, Vec2UInt32, Vec3UInt32, Vec4UInt32);
impl_format_types!(u64 => UInt64, Vec2UInt64, Vec3UInt64, Vec4UInt64);

/// Statically typed access to the format of `T`.
///
/// ```
/// use ivw_format::{DataFormat, DataFormatId};
///
/// assert_eq!(DataFormat::<[u16; 3]>::ID, DataFormatId::Vec3UInt16);
/// assert_eq!(DataFormat::<[u16; 3]>::get().name(), "Vec3UINT16");
/// ```
pub struct DataFormat<T>(PhantomData<T>);

impl<T: DataFormatType> DataFormat<T> {
    pub const ID: DataFormatId = T::ID;
    pub const COMPONENTS: usize = T::COMPONENTS;
    pub const SIZE: usize = std::mem::size_of::<T>();
    pub const PRECISION: usize = std::mem::size_of::<T::Component>() * 8;
    pub const NUMERIC_TYPE: NumericType = <T::Component as Scalar>::NUMERIC_TYPE;

    /// The shared runtime descriptor for `T`
    #[inline]
    pub fn get() -> &'static DataFormatBase {
        DataFormatBase::get_by_id(T::ID)
    }

    /// Largest value, splatted over all components
    pub fn max() -> T {
        T::from_components(|_| T::Component::from_f64(T::Component::MAX))
    }

    pub fn min() -> T {
        T::from_components(|_| T::Component::from_f64(T::Component::MIN))
    }

    pub fn lowest() -> T {
        T::from_components(|_| T::Component::from_f64(T::Component::LOWEST))
    }
}
