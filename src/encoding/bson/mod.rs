// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Binary document (BSON) module.
//!
//! Provides the binary-document value reader and its paired writer.

pub mod reader;
pub mod writer;

pub use reader::BsonReader;
pub use writer::{to_vec, BsonWriter};
