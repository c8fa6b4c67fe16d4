// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout bsoncodec.
//!
//! This module provides the foundational types for the library:
//! - [`CodecError`] - Error taxonomy for the decode dispatch layer
//! - [`Bson`] / [`Document`] - Generic, ordered document representation
//! - [`Format`] - Wire format identifier

pub mod error;
pub mod value;

pub use error::{CodecError, Result};
pub use value::{Binary, Bson, Document, ElementType, ObjectId};

/// Wire format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Binary document format (BSON)
    Binary,
    /// Extended textual JSON variant
    ExtendedJson,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Format {
    /// Check if this is the binary document format.
    pub fn is_binary(&self) -> bool {
        matches!(self, Format::Binary)
    }

    /// Check if this is the extended JSON format.
    pub fn is_extended_json(&self) -> bool {
        matches!(self, Format::ExtendedJson)
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Binary => "bson",
            Format::ExtendedJson => "extjson",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_is_methods() {
        assert!(Format::Binary.is_binary());
        assert!(!Format::Binary.is_extended_json());
        assert!(Format::ExtendedJson.is_extended_json());
        assert_eq!(Format::ExtendedJson.to_string(), "extjson");
    }
}
