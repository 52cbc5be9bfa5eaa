//! Format identifiers
//!
//! The order of [`DataFormatId`] is the order of the descriptor table:
//! `NotSpecialized`, the eleven scalar formats, then the same eleven for
//! `Vec2`, `Vec3` and `Vec4`.

use crate::descriptor::DataFormatBase;
use crate::error::{DataFormatError, Result};
use ivw_core::source_context;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Invokes `$callback!` with the full `Variant => native type` table.
///
/// This is the single place that ties runtime ids to compile-time types; the
/// dispatch match and the type-to-id impls are both generated from it.
macro_rules! format_table {
    ($callback:ident) => {
        $callback! {
            Float16 => half::f16,
            Float32 => f32,
            Float64 => f64,
            Int8 => i8,
            Int16 => i16,
            Int32 => i32,
            Int64 => i64,
            UInt8 => u8,
            UInt16 => u16,
            UInt32 => u32,
            UInt64 => u64,
            Vec2Float16 => [half::f16; 2],
            Vec2Float32 => [f32; 2],
            Vec2Float64 => [f64; 2],
            Vec2Int8 => [i8; 2],
            Vec2Int16 => [i16; 2],
            Vec2Int32 => [i32; 2],
            Vec2Int64 => [i64; 2],
            Vec2UInt8 => [u8; 2],
            Vec2UInt16 => [u16; 2],
            Vec2UInt32 => [u32; 2],
            Vec2UInt64 => [u64; 2],
            Vec3Float16 => [half::f16; 3],
            Vec3Float32 => [f32; 3],
            Vec3Float64 => [f64; 3],
            Vec3Int8 => [i8; 3],
            Vec3Int16 => [i16; 3],
            Vec3Int32 => [i32; 3],
            Vec3Int64 => [i64; 3],
            Vec3UInt8 => [u8; 3],
            Vec3UInt16 => [u16; 3],
            Vec3UInt32 => [u32; 3],
            Vec3UInt64 => [u64; 3],
            Vec4Float16 => [half::f16; 4],
            Vec4Float32 => [f32; 4],
            Vec4Float64 => [f64; 4],
            Vec4Int8 => [i8; 4],
            Vec4Int16 => [i16; 4],
            Vec4Int32 => [i32; 4],
            Vec4Int64 => [i64; 4],
            Vec4UInt8 => [u8; 4],
            Vec4UInt16 => [u16; 4],
            Vec4UInt32 => [u32; 4],
            Vec4UInt64 => [u64; 4],
        }
    };
}
pub(crate) use format_table;

macro_rules! declare_ids {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        /// Identifier of a data format
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum DataFormatId {
            #[default]
            NotSpecialized,
            $($variant,)*
        }

        impl DataFormatId {
            /// Every id in table order, `NotSpecialized` first
            pub const ALL: [DataFormatId; NUMBER_OF_FORMATS] = [
                DataFormatId::NotSpecialized,
                $(DataFormatId::$variant,)*
            ];
        }
    };
}

/// Number of entries in the format table, `NotSpecialized` included
pub const NUMBER_OF_FORMATS: usize = 45;

format_table!(declare_ids);

impl DataFormatId {
    /// Position in the format table
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Convert a raw table index back into an id
    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(DataFormatError::InvalidIndex {
                index,
                context: source_context!(),
            })
    }

    /// Canonical name, e.g. `"Vec3UINT16"`
    pub fn name(self) -> &'static str {
        DataFormatBase::get_by_id(self).name()
    }
}

impl fmt::Display for DataFormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataFormatId {
    type Err = DataFormatError;

    fn from_str(s: &str) -> Result<Self> {
        DataFormatBase::get_by_name(s).map(DataFormatBase::id)
    }
}

// Saved documents refer to formats by name so the table can change order.
impl Serialize for DataFormatId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for DataFormatId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_size() {
        assert_eq!(DataFormatId::ALL.len(), NUMBER_OF_FORMATS);
        assert_eq!(DataFormatId::Vec4UInt64.index(), NUMBER_OF_FORMATS - 1);
    }

    #[test]
    fn test_index_round_trip() {
        for id in DataFormatId::ALL {
            assert_eq!(DataFormatId::from_index(id.index()).unwrap(), id);
        }
    }

    #[test]
    fn test_from_index_out_of_table() {
        let err = DataFormatId::from_index(NUMBER_OF_FORMATS).unwrap_err();
        assert!(matches!(err, DataFormatError::InvalidIndex { index: 45, .. }));
    }

    #[test]
    fn test_serializes_as_name() {
        let json = serde_json::to_string(&DataFormatId::Vec3UInt8).unwrap();
        assert_eq!(json, "\"Vec3UINT8\"");
        let back: DataFormatId = serde_json::from_str("\"FLOAT32\"").unwrap();
        assert_eq!(back, DataFormatId::Float32);
        assert!(serde_json::from_str::<DataFormatId>("\"Vec5FLOAT32\"").is_err());
    }

    #[test]
    fn test_every_id_survives_serde_and_parse() {
        for id in DataFormatId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(serde_json::from_str::<DataFormatId>(&json).unwrap(), id);
            assert_eq!(id.to_string().parse::<DataFormatId>().unwrap(), id);
        }
    }
}
