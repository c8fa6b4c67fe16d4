// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Wire formats and decoding rules.
//!
//! This module provides the pieces the decoder is built on:
//! - [`reader`] - Format-agnostic value reader contract
//! - [`bson`] - Binary document reader and writer
//! - [`extjson`] - Extended JSON reader
//! - [`registry`] - Codec registry for per-type decoding rules
//! - [`builtin`] - Built-in decoding rules for common types

pub mod bson;
pub mod builtin;
pub mod extjson;
pub mod reader;
pub mod registry;

pub use bson::{to_vec, BsonReader, BsonWriter};
pub use extjson::ExtJsonReader;
pub use reader::{Token, ValueReader};
pub use registry::{default_registry, CodecRegistry, DecodeFn, TypeKey};
