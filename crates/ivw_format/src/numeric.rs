//! Numeric kind of a format's components

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericType {
    #[default]
    NotSpecialized,
    Float,
    UnsignedInteger,
    SignedInteger,
}

impl NumericType {
    /// Type part of a canonical format name ("FLOAT", "INT", "UINT")
    pub fn name_part(self) -> &'static str {
        match self {
            NumericType::NotSpecialized => "",
            NumericType::Float => "FLOAT",
            NumericType::UnsignedInteger => "UINT",
            NumericType::SignedInteger => "INT",
        }
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NumericType::NotSpecialized => "NotSpecialized",
            NumericType::Float => "Float",
            NumericType::UnsignedInteger => "UnsignedInteger",
            NumericType::SignedInteger => "SignedInteger",
        };
        f.write_str(s)
    }
}
