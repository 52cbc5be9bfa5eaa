//! Runtime format descriptors and the process-wide descriptor table

use crate::dispatch::FormatVisitor;
use crate::error::{DataFormatError, Result};
use crate::id::DataFormatId;
use crate::numeric::NumericType;
use crate::types::{DataFormatType, Scalar};
use ivw_core::source_context;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Alternative spellings accepted by [`DataFormatBase::get_by_name`]
const ALIASES: &[(&str, DataFormatId)] = &[
    ("uchar", DataFormatId::UInt8),
    ("char", DataFormatId::Int8),
    ("ushort", DataFormatId::UInt16),
    ("short", DataFormatId::Int16),
    ("uint", DataFormatId::UInt32),
    ("int", DataFormatId::Int32),
    ("float", DataFormatId::Float32),
    ("double", DataFormatId::Float64),
];

/// Immutable description of an element type.
///
/// There is exactly one instance per [`DataFormatId`]; every lookup hands out
/// a `&'static` reference into the same table.
#[derive(Debug)]
pub struct DataFormatBase {
    id: DataFormatId,
    components: usize,
    size: usize,
    numeric_type: NumericType,
    max: f64,
    min: f64,
    lowest: f64,
    name: String,
}

impl DataFormatBase {
    fn not_specialized() -> Self {
        Self {
            id: DataFormatId::NotSpecialized,
            components: 0,
            size: 0,
            numeric_type: NumericType::NotSpecialized,
            max: 0.0,
            min: 0.0,
            lowest: 0.0,
            name: "NotSpecialized".to_string(),
        }
    }

    /// Descriptor of the unspecialized format
    pub fn get() -> &'static DataFormatBase {
        Self::get_by_id(DataFormatId::NotSpecialized)
    }

    pub fn get_by_id(id: DataFormatId) -> &'static DataFormatBase {
        &table().formats[id.index()]
    }

    /// Look up by canonical name (`"FLOAT32"`, `"Vec3UINT8"`), falling back to a
    /// case-insensitive match and the C-style aliases (`"uchar"`, `"float"`, ..)
    pub fn get_by_name(name: &str) -> Result<&'static DataFormatBase> {
        let table = table();
        if let Some(id) = table.by_name.get(name) {
            return Ok(Self::get_by_id(*id));
        }
        table
            .by_folded_name
            .get(&name.to_lowercase())
            .map(|id| Self::get_by_id(*id))
            .ok_or_else(|| DataFormatError::UnknownName {
                name: name.to_string(),
                context: source_context!(),
            })
    }

    /// Look up by numeric type, component count and precision in bits
    pub fn get_by_structure(
        numeric_type: NumericType,
        components: usize,
        precision: usize,
    ) -> Result<&'static DataFormatBase> {
        table()
            .by_structure
            .get(&(numeric_type, components, precision))
            .map(|id| Self::get_by_id(*id))
            .ok_or_else(|| DataFormatError::Unsupported {
                what: format!(
                    "{} with {} components and {} bit precision",
                    numeric_type, components, precision
                ),
                context: source_context!(),
            })
    }

    #[inline]
    pub fn id(&self) -> DataFormatId {
        self.id
    }

    /// Number of components (1 to 4, 0 when unspecialized)
    #[inline]
    pub fn components(&self) -> usize {
        self.components
    }

    /// Size of one value in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Bits per component
    #[inline]
    pub fn precision(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.size / self.components * 8
        }
    }

    #[inline]
    pub fn numeric_type(&self) -> NumericType {
        self.numeric_type
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn lowest(&self) -> f64 {
        self.lowest
    }

    /// Canonical name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for DataFormatBase {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DataFormatBase {}

impl fmt::Display for DataFormatBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Lattice join over numeric types: any float makes the result float, else any
/// signed integer makes it signed. Unspecialized inputs are ignored; with no
/// specialized input the result is `NotSpecialized`.
pub fn common_numeric_type(formats: &[&DataFormatBase]) -> NumericType {
    let has = |nt: NumericType| formats.iter().any(|f| f.numeric_type() == nt);
    if has(NumericType::Float) {
        NumericType::Float
    } else if has(NumericType::SignedInteger) {
        NumericType::SignedInteger
    } else if has(NumericType::UnsignedInteger) {
        NumericType::UnsignedInteger
    } else {
        NumericType::NotSpecialized
    }
}

/// Largest component precision among `formats`, 0 when empty
pub fn common_format_precision(formats: &[&DataFormatBase]) -> usize {
    formats.iter().map(|f| f.precision()).max().unwrap_or(0)
}

struct FormatTable {
    formats: Vec<DataFormatBase>,
    by_name: HashMap<String, DataFormatId>,
    by_folded_name: HashMap<String, DataFormatId>,
    by_structure: HashMap<(NumericType, usize, usize), DataFormatId>,
}

static TABLE: OnceLock<FormatTable> = OnceLock::new();

fn table() -> &'static FormatTable {
    TABLE.get_or_init(FormatTable::build)
}

/// Builds a descriptor from the compile-time description of `T`
struct Describe;

impl FormatVisitor for Describe {
    type Output = DataFormatBase;

    fn visit<T: DataFormatType>(self) -> DataFormatBase {
        let components = T::COMPONENTS;
        let size = std::mem::size_of::<T>();
        let numeric_type = <T::Component as Scalar>::NUMERIC_TYPE;
        let prefix = match components {
            1 => String::new(),
            n => format!("Vec{}", n),
        };
        DataFormatBase {
            id: T::ID,
            components,
            size,
            numeric_type,
            max: <T::Component as Scalar>::MAX,
            min: <T::Component as Scalar>::MIN,
            lowest: <T::Component as Scalar>::LOWEST,
            name: format!(
                "{}{}{}",
                prefix,
                numeric_type.name_part(),
                size / components * 8
            ),
        }
    }
}

impl FormatTable {
    fn build() -> Self {
        let formats: Vec<DataFormatBase> = DataFormatId::ALL
            .iter()
            .map(|id| {
                id.dispatch(Describe)
                    .unwrap_or_else(|_| DataFormatBase::not_specialized())
            })
            .collect();

        let mut by_name = HashMap::with_capacity(formats.len());
        let mut by_folded_name = HashMap::with_capacity(formats.len() + ALIASES.len());
        let mut by_structure = HashMap::with_capacity(formats.len());

        for format in &formats {
            by_name.insert(format.name.clone(), format.id);
            by_folded_name.insert(format.name.to_lowercase(), format.id);
            if format.id == DataFormatId::NotSpecialized {
                continue;
            }
            by_structure.insert(
                (format.numeric_type, format.components, format.precision()),
                format.id,
            );
        }
        for (alias, id) in ALIASES {
            by_folded_name.insert((*alias).to_string(), *id);
        }

        log::debug!("Data format table initialized with {} formats", formats.len());

        Self {
            formats,
            by_name,
            by_folded_name,
            by_structure,
        }
    }
}
