// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Extended JSON module.
//!
//! Provides the extended-JSON value reader.

pub mod reader;

pub use reader::ExtJsonReader;
