// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # bsoncodec
//!
//! Document decoding dispatcher for the BSON binary format and its extended
//! JSON variant.
//!
//! The library turns serialized bytes into a value of a caller-chosen type:
//! - **Value readers** present both wire formats as one token stream
//!   ([`encoding::ValueReader`])
//! - **Codec registry** resolves a decoding rule per destination type
//!   ([`CodecRegistry`])
//! - **Pooled decoders** are reused across calls without leaking state
//!   ([`DecoderPool`])
//! - **Dual output** fills a typed destination and a generic [`Document`]
//!   from one traversal ([`decode_extended_with_capture`])
//!
//! ## Architecture
//!
//! - `core/` - Generic value model, errors, format identifiers
//! - `encoding/` - Value readers, the paired BSON writer, registry, built-in rules
//! - `decoder/` - Stateful decoder, decode context, capture sink, pool, config
//! - `dispatch` - Public decode entry points
//!
//! ## Example: Decoding into a struct
//!
//! ```
//! use bsoncodec::{decode_extended, DecodeValue, Decoder, Result};
//!
//! #[derive(Default)]
//! struct Reading {
//!     sensor: String,
//!     value: f64,
//! }
//!
//! impl DecodeValue for Reading {
//!     fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
//!         dec.read_document(|dec, key| match key {
//!             "sensor" => dec.decode_into(&mut self.sensor),
//!             "value" => dec.decode_into(&mut self.value),
//!             _ => dec.skip_value(),
//!         })
//!     }
//! }
//!
//! let mut reading = Reading::default();
//! decode_extended(br#"{"sensor": "t1", "value": 21}"#, false, &mut reading)?;
//! assert_eq!(reading.sensor, "t1");
//! assert_eq!(reading.value, 21.0);
//! # Ok::<(), bsoncodec::CodecError>(())
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use crate::core::{Binary, Bson, CodecError, Document, ElementType, Format, ObjectId, Result};

// Wire formats, registry, built-in rules
pub mod encoding;

pub use encoding::{default_registry, CodecRegistry, TypeKey};

// Decoder, context, pool
pub mod decoder;

pub use decoder::{
    global_pool, CaptureSlot, DecodeContext, DecodeValue, Decoder, DecoderConfig, DecoderPool,
    PooledDecoder, Target,
};

// Entry points
pub mod dispatch;

pub use dispatch::{
    decode, decode_extended, decode_extended_with_capture, decode_extended_with_context,
    decode_extended_with_registry, decode_from_reader, decode_with_context, decode_with_registry,
};
