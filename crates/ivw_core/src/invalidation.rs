//! Invalidation levels
//!
//! A totally ordered severity enum. Containers (processors, composite
//! properties) aggregate the level of their children with `max`, so a pending
//! level is only ever raised until an evaluation pass clears it.

use crate::error::CoreError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Consequence of a mutation, ordered by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum InvalidationLevel {
    /// Nothing to do
    #[default]
    Valid = 0,
    /// The output has to be recomputed
    InvalidOutput = 1,
    /// Resources (shaders, buffers) have to be rebuilt before recomputing
    InvalidResources = 2,
}

impl InvalidationLevel {
    pub const ALL: [InvalidationLevel; 3] = [
        InvalidationLevel::Valid,
        InvalidationLevel::InvalidOutput,
        InvalidationLevel::InvalidResources,
    ];

    #[inline]
    pub fn is_valid(self) -> bool {
        self == InvalidationLevel::Valid
    }

    /// Human readable label
    pub fn as_str(self) -> &'static str {
        match self {
            InvalidationLevel::Valid => "Valid",
            InvalidationLevel::InvalidOutput => "Invalid output",
            InvalidationLevel::InvalidResources => "Invalid resources",
        }
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for InvalidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for InvalidationLevel {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(InvalidationLevel::Valid),
            1 => Ok(InvalidationLevel::InvalidOutput),
            2 => Ok(InvalidationLevel::InvalidResources),
            other => Err(CoreError::UnknownInvalidationLevel(other)),
        }
    }
}

// Stored documents keep the underlying integer.
impl Serialize for InvalidationLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for InvalidationLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        InvalidationLevel::try_from(raw).map_err(serde::de::Error::custom)
    }
}
