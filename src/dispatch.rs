// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decode entry points.
//!
//! Every function follows the same pipeline: reject an absent destination,
//! build a reader over the input, check a decoder out of the global pool,
//! bind reader and context, decode once, and return the decoder to the pool
//! on every path.
//!
//! # Example
//!
//! ```
//! use bsoncodec::{decode_extended_with_capture, Document};
//!
//! let json = br#"{"a": "123", "b": {"b": 123}}"#;
//! let mut typed = Document::new();
//! let mut generic = Document::new();
//! decode_extended_with_capture(json, true, &mut typed, &mut generic).unwrap();
//! assert_eq!(typed, generic);
//! ```

use std::sync::Arc;

use crate::core::{CodecError, Result};
use crate::decoder::{global_pool, CaptureSlot, DecodeContext, Target};
use crate::encoding::{default_registry, BsonReader, CodecRegistry, ExtJsonReader, ValueReader};

/// Decode a binary document with the default registry.
pub fn decode<'t>(data: &[u8], dest: impl Into<Target<'t>>) -> Result<()> {
    decode_with_context(DecodeContext::default(), data, dest)
}

/// Decode a binary document with the given registry.
pub fn decode_with_registry<'t>(
    registry: &Arc<CodecRegistry>,
    data: &[u8],
    dest: impl Into<Target<'t>>,
) -> Result<()> {
    decode_with_context(DecodeContext::new(Arc::clone(registry)), data, dest)
}

/// Decode a binary document with a caller-built context.
///
/// # Errors
///
/// Returns `CodecError::InvalidDestination` for an absent destination before
/// the input is looked at, `CodecError::InvalidContext` for an inconsistent
/// context, and any error the decode itself raises.
pub fn decode_with_context<'t>(
    ctx: DecodeContext<'_>,
    data: &[u8],
    dest: impl Into<Target<'t>>,
) -> Result<()> {
    let target = checked(dest)?;
    run(ctx, Box::new(BsonReader::new(data)), target)
}

/// Decode an extended-JSON document with the default registry.
pub fn decode_extended<'t>(
    data: &[u8],
    canonical: bool,
    dest: impl Into<Target<'t>>,
) -> Result<()> {
    decode_extended_with_context(DecodeContext::default(), data, canonical, dest)
}

/// Decode an extended-JSON document with the given registry.
pub fn decode_extended_with_registry<'t>(
    registry: &Arc<CodecRegistry>,
    data: &[u8],
    canonical: bool,
    dest: impl Into<Target<'t>>,
) -> Result<()> {
    decode_extended_with_context(
        DecodeContext::new(Arc::clone(registry)),
        data,
        canonical,
        dest,
    )
}

/// Decode an extended-JSON document with a caller-built context.
///
/// # Errors
///
/// Returns `CodecError::MalformedInput` if the input is not valid extended
/// JSON in the requested mode; the pool is not touched in that case.
pub fn decode_extended_with_context<'t>(
    ctx: DecodeContext<'_>,
    data: &[u8],
    canonical: bool,
    dest: impl Into<Target<'t>>,
) -> Result<()> {
    let target = checked(dest)?;
    let reader = ExtJsonReader::new(data, canonical)?;
    run(ctx, Box::new(reader), target)
}

/// Decode an extended-JSON document into `dest` and a generic copy into
/// `capture`, from one traversal.
///
/// `capture` is written only if the whole decode succeeds.
pub fn decode_extended_with_capture<'t, 'c>(
    data: &[u8],
    canonical: bool,
    dest: impl Into<Target<'t>>,
    capture: impl Into<CaptureSlot<'c>>,
) -> Result<()> {
    let ctx = DecodeContext::with_capture(default_registry(), capture);
    decode_extended_with_context(ctx, data, canonical, dest)
}

/// Decode from any value reader through the pooled pipeline.
///
/// This is the entry point for wire formats beyond the two built in.
///
/// # Errors
///
/// Returns `CodecError::ReaderState` if `reader` has already been advanced.
pub fn decode_from_reader<'r, 't>(
    ctx: DecodeContext<'r>,
    reader: impl ValueReader + Send + 'r,
    dest: impl Into<Target<'t>>,
) -> Result<()> {
    let target = checked(dest)?;
    run(ctx, Box::new(reader), target)
}

fn checked<'t>(dest: impl Into<Target<'t>>) -> Result<Target<'t>> {
    let target = dest.into();
    if target.is_absent() {
        return Err(CodecError::invalid_destination("destination is absent"));
    }
    Ok(target)
}

fn run<'r>(
    ctx: DecodeContext<'r>,
    reader: Box<dyn ValueReader + Send + 'r>,
    target: Target<'_>,
) -> Result<()> {
    let mut decoder = global_pool().acquire();
    decoder.reset(reader)?;
    decoder.set_context(ctx)?;
    decoder.decode(target)
}
