// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Stateful decoder and its pool.
//!
//! A [`Decoder`] runs one decode at a time: it is bound to a value reader with
//! [`reset`](Decoder::reset), to a [`DecodeContext`] with
//! [`set_context`](Decoder::set_context), and then fills one destination with
//! [`decode`](Decoder::decode).
//!
//! Destinations are described by [`Target`]. A type that implements
//! [`DecodeValue`] decodes itself; any other type is resolved through the
//! context's [`CodecRegistry`].
//!
//! Decoding rules walk the input through the decoder's navigation API
//! ([`read_document`](Decoder::read_document),
//! [`read_array`](Decoder::read_array), [`read_value`](Decoder::read_value),
//! [`skip_value`](Decoder::skip_value), ...). The decoder mirrors each token
//! those calls consume into the capture sink when dual output is on, and
//! enforces the configured nesting limit.
//!
//! # Example
//!
//! ```
//! use bsoncodec::{DecodeContext, DecodeValue, Decoder, Result};
//! use bsoncodec::encoding::ExtJsonReader;
//!
//! #[derive(Default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl DecodeValue for Point {
//!     fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
//!         dec.read_document(|dec, key| match key {
//!             "x" => dec.decode_into(&mut self.x),
//!             "y" => dec.decode_into(&mut self.y),
//!             _ => dec.skip_value(),
//!         })
//!     }
//! }
//!
//! let reader = ExtJsonReader::new(&br#"{"x": 1, "y": 2, "z": 3}"#[..], false).unwrap();
//! let mut decoder = Decoder::default();
//! decoder.reset(Box::new(reader)).unwrap();
//! decoder.set_context(DecodeContext::default()).unwrap();
//!
//! let mut point = Point::default();
//! decoder.decode(&mut point).unwrap();
//! assert_eq!((point.x, point.y), (1, 2));
//! ```

pub mod capture;
pub mod config;
pub mod context;
pub mod pool;

pub use capture::CaptureBuilder;
pub use config::DecoderConfig;
pub use context::{CaptureSlot, DecodeContext};
pub use pool::{global_pool, DecoderPool, PooledDecoder};

use std::any::Any;
use std::fmt;
use std::mem;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::{Bson, CodecError, Document, ElementType, Format, Result};
use crate::encoding::{CodecRegistry, Token, TypeKey, ValueReader};

/// A type that knows how to decode itself.
///
/// Implementations consume exactly one value from the decoder: a scalar, or
/// a whole document or array including its closing token.
pub trait DecodeValue {
    /// Decode the next value of `dec` into `self`.
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()>;
}

/// Where a decode writes its result.
pub enum Target<'t> {
    /// Destination decodes itself
    SelfDecoding(&'t mut dyn DecodeValue),
    /// Destination is decoded by the registry rule for `key`
    Registered {
        /// Registry key of the destination type
        key: TypeKey,
        /// The destination; its concrete type is the one `key` names
        value: &'t mut dyn Any,
    },
    /// No destination was supplied
    Absent,
}

impl<'t> Target<'t> {
    /// Destination resolved through the registry rather than [`DecodeValue`].
    pub fn registered<T: Any>(value: &'t mut T) -> Self {
        Target::Registered {
            key: TypeKey::of::<T>(),
            value,
        }
    }

    /// Check if no destination was supplied.
    pub fn is_absent(&self) -> bool {
        matches!(self, Target::Absent)
    }
}

impl<'t, T: DecodeValue> From<&'t mut T> for Target<'t> {
    fn from(value: &'t mut T) -> Self {
        Target::SelfDecoding(value)
    }
}

impl<'t, T: DecodeValue> From<Option<&'t mut T>> for Target<'t> {
    fn from(value: Option<&'t mut T>) -> Self {
        value.map_or(Target::Absent, Target::from)
    }
}

impl fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::SelfDecoding(_) => f.write_str("Target::SelfDecoding"),
            Target::Registered { key, .. } => write!(f, "Target::Registered({key})"),
            Target::Absent => f.write_str("Target::Absent"),
        }
    }
}

/// How tokens flow during a decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Traversal {
    /// Typed destination only
    #[default]
    Typed,
    /// Typed destination plus a generic capture of the same input
    DualOutput,
}

/// Everything one decode leaves behind.
#[derive(Debug, Default)]
struct DecodeState {
    /// Token peeked but not yet consumed
    lookahead: Option<Token>,
    /// Open containers consumed so far
    depth: usize,
    traversal: Traversal,
    /// Generic sink; only fed in dual-output mode
    capture: CaptureBuilder,
}

impl DecodeState {
    /// Fresh state that reuses the capture sink's allocations.
    fn recycled(self) -> Self {
        let DecodeState {
            lookahead: _,
            depth: _,
            traversal: _,
            mut capture,
        } = self;
        capture.clear();
        DecodeState {
            lookahead: None,
            depth: 0,
            traversal: Traversal::Typed,
            capture,
        }
    }
}

/// Stateful single-document decoder.
///
/// `'r` bounds the reader and the capture slot borrowed for the current
/// decode. Pools keep idle decoders as `Decoder<'static>` with both unbound.
pub struct Decoder<'r> {
    reader: Option<Box<dyn ValueReader + Send + 'r>>,
    context: Option<DecodeContext<'r>>,
    state: DecodeState,
    config: DecoderConfig,
    uses: u64,
}

impl Default for Decoder<'_> {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl fmt::Debug for Decoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("format", &self.format())
            .field("position", &self.position())
            .field("state", &self.state)
            .field("config", &self.config)
            .field("uses", &self.uses)
            .finish()
    }
}

impl<'r> Decoder<'r> {
    /// Create an unbound decoder.
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            reader: None,
            context: None,
            state: DecodeState::default(),
            config,
            uses: 0,
        }
    }

    /// Bind a fresh reader and discard all state from any previous decode.
    ///
    /// The bound context is dropped too; bind one with
    /// [`set_context`](Self::set_context) before decoding.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::ReaderState` if the reader has already been
    /// advanced. The decoder is left unbound in that case.
    pub fn reset(&mut self, reader: Box<dyn ValueReader + Send + 'r>) -> Result<()> {
        self.state = mem::take(&mut self.state).recycled();
        self.context = None;
        self.reader = None;

        let position = reader.position();
        if position != 0 {
            return Err(CodecError::reader_state(format!(
                "{} reader already advanced to position {position}",
                reader.format()
            )));
        }
        self.reader = Some(reader);
        Ok(())
    }

    /// Bind the context for the next decode.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::InvalidContext` if dual output is requested
    /// without a capture slot.
    pub fn set_context(&mut self, mut ctx: DecodeContext<'r>) -> Result<()> {
        ctx.validate()?;
        if !ctx.dual_output && ctx.capture.take().is_some() {
            warn!(
                context = "set_context",
                "Capture slot supplied without dual output; it will not be filled"
            );
        }
        self.state.traversal = if ctx.dual_output {
            Traversal::DualOutput
        } else {
            Traversal::Typed
        };
        self.state.capture.clear();
        self.context = Some(ctx);
        Ok(())
    }

    /// Decode the bound reader's document into `target`.
    ///
    /// In dual-output mode the generic copy is written to the capture slot
    /// only if the typed decode succeeds. On failure the destination may be
    /// partially populated.
    pub fn decode<'t>(&mut self, target: impl Into<Target<'t>>) -> Result<()> {
        let target = target.into();
        if target.is_absent() {
            return Err(CodecError::invalid_destination("destination is absent"));
        }
        if self.reader.is_none() {
            return Err(CodecError::reader_state("no reader bound to the decoder"));
        }
        if self.context.is_none() {
            return Err(CodecError::invalid_context(
                "no decode context bound to the decoder",
            ));
        }

        self.uses += 1;
        let result = self.decode_target(target).and_then(|()| self.finish());
        if let Err(err) = &result {
            debug!(
                context = "decode",
                wire_format = ?self.format(),
                position = self.position(),
                error = %err,
                fields = ?err.log_fields(),
                "Decode failed"
            );
        }
        result
    }

    /// Check the traversal ended cleanly and commit the capture.
    fn finish(&mut self) -> Result<()> {
        if self.state.depth != 0 || self.state.lookahead.is_some() {
            return Err(CodecError::invariant_violation(format!(
                "decode rule returned with {} container(s) still open",
                self.state.depth
            )));
        }
        if self.state.traversal != Traversal::DualOutput {
            return Ok(());
        }
        let root = self.state.capture.take_root()?;
        match self.context.as_mut().and_then(|ctx| ctx.capture.as_mut()) {
            Some(slot) => slot.commit(root),
            None => Err(CodecError::invariant_violation(
                "dual output active without a capture slot",
            )),
        }
    }

    /// Unbind the reader and context, keeping the rest for reuse.
    pub fn detach(self) -> Decoder<'static> {
        Decoder {
            reader: None,
            context: None,
            state: self.state,
            config: self.config,
            uses: self.uses,
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Configuration this decoder enforces.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Format of the bound reader.
    pub fn format(&self) -> Option<Format> {
        self.reader.as_ref().map(|r| r.format())
    }

    /// Position of the bound reader, or zero when unbound.
    pub fn position(&self) -> usize {
        self.reader.as_ref().map_or(0, |r| r.position())
    }

    /// Current container nesting depth.
    pub fn depth(&self) -> usize {
        self.state.depth
    }

    /// Traversal mode of the current decode.
    pub fn traversal(&self) -> Traversal {
        self.state.traversal
    }

    /// Number of decodes this decoder has started.
    pub fn uses(&self) -> u64 {
        self.uses
    }

    /// Check whether a reader is bound.
    pub fn is_bound(&self) -> bool {
        self.reader.is_some()
    }

    /// Registry of the bound context.
    pub fn registry(&self) -> Result<Arc<CodecRegistry>> {
        self.context
            .as_ref()
            .map(|ctx| Arc::clone(&ctx.registry))
            .ok_or_else(|| CodecError::invalid_context("no decode context bound"))
    }

    /// Build a type mismatch error at the current position.
    pub fn mismatch(&self, expected: impl Into<String>, found: impl Into<String>) -> CodecError {
        CodecError::type_mismatch(expected, found, self.position())
    }

    // =========================================================================
    // Token access
    // =========================================================================

    fn reader_mut(&mut self) -> Result<&mut (dyn ValueReader + Send + 'r)> {
        self.reader
            .as_deref_mut()
            .ok_or_else(|| CodecError::reader_state("no reader bound to the decoder"))
    }

    fn next_token(&mut self) -> Result<Token> {
        let token = match self.state.lookahead.take() {
            Some(token) => token,
            None => self.reader_mut()?.read_token()?,
        };
        match token {
            Token::StartDocument | Token::StartArray => {
                self.state.depth += 1;
                if self.state.depth > self.config.max_depth {
                    return Err(CodecError::DepthExceeded {
                        max_depth: self.config.max_depth,
                    });
                }
            }
            Token::EndDocument | Token::EndArray => {
                self.state.depth = self.state.depth.saturating_sub(1);
            }
            Token::Key(_) | Token::Value(_) => {}
        }
        if self.state.traversal == Traversal::DualOutput {
            self.state.capture.record(&token)?;
        }
        Ok(token)
    }

    fn peek_token(&mut self) -> Result<&Token> {
        let token = match self.state.lookahead.take() {
            Some(token) => token,
            None => self.reader_mut()?.read_token()?,
        };
        Ok(self.state.lookahead.insert(token))
    }

    fn unexpected(&self, token: &Token) -> CodecError {
        CodecError::invariant_violation(format!(
            "unexpected {token} at position {}",
            self.position()
        ))
    }

    // =========================================================================
    // Navigation API for decoding rules
    // =========================================================================

    /// Check whether the next value is null, without consuming it.
    pub fn peek_is_null(&mut self) -> Result<bool> {
        Ok(matches!(self.peek_token()?, Token::Value(Bson::Null)))
    }

    /// Element type of the next value, without consuming it.
    ///
    /// `None` when the next token does not start a value.
    pub fn peek_element_type(&mut self) -> Result<Option<ElementType>> {
        Ok(match self.peek_token()? {
            Token::StartDocument => Some(ElementType::Document),
            Token::StartArray => Some(ElementType::Array),
            Token::Value(value) => Some(value.element_type()),
            Token::Key(_) | Token::EndDocument | Token::EndArray => None,
        })
    }

    /// Read a document, calling `on_field` once per field.
    ///
    /// `on_field` must consume exactly one value, typically through
    /// [`decode_into`](Self::decode_into) or [`skip_value`](Self::skip_value).
    /// Rule failures are annotated with the field name.
    pub fn read_document<F>(&mut self, mut on_field: F) -> Result<()>
    where
        F: FnMut(&mut Self, &str) -> Result<()>,
    {
        match self.next_token()? {
            Token::StartDocument => {}
            other => return Err(self.mismatch("document", other.describe())),
        }
        loop {
            match self.next_token()? {
                Token::Key(key) => on_field(self, &key).map_err(|e| e.in_field(key))?,
                Token::EndDocument => return Ok(()),
                other => return Err(self.unexpected(&other)),
            }
        }
    }

    /// Read an array, calling `on_element` once per element with its index.
    pub fn read_array<F>(&mut self, mut on_element: F) -> Result<()>
    where
        F: FnMut(&mut Self, usize) -> Result<()>,
    {
        match self.next_token()? {
            Token::StartArray => {}
            other => return Err(self.mismatch("array", other.describe())),
        }
        let mut index = 0;
        loop {
            if matches!(self.peek_token()?, Token::EndArray) {
                self.next_token()?;
                return Ok(());
            }
            on_element(self, index).map_err(|e| e.in_field(index.to_string()))?;
            index += 1;
        }
    }

    /// Read the next scalar.
    ///
    /// A document or array is a type mismatch against `expected`.
    pub fn read_scalar(&mut self, expected: &str) -> Result<Bson> {
        match self.peek_token()? {
            Token::Value(_) => {}
            other => {
                let found = other.describe();
                return Err(self.mismatch(expected, found));
            }
        }
        match self.next_token()? {
            Token::Value(value) => Ok(value),
            other => Err(self.unexpected(&other)),
        }
    }

    /// Read the next value of any shape as a generic value.
    pub fn read_value(&mut self) -> Result<Bson> {
        let token = self.next_token()?;
        self.value_from(token)
    }

    fn value_from(&mut self, token: Token) -> Result<Bson> {
        match token {
            Token::Value(value) => Ok(value),
            Token::StartDocument => {
                let mut doc = Document::new();
                loop {
                    match self.next_token()? {
                        Token::Key(key) => {
                            let next = self.next_token()?;
                            let value = self.value_from(next)?;
                            doc.insert(key, value);
                        }
                        Token::EndDocument => return Ok(Bson::Document(doc)),
                        other => return Err(self.unexpected(&other)),
                    }
                }
            }
            Token::StartArray => {
                let mut items = Vec::new();
                loop {
                    match self.next_token()? {
                        Token::EndArray => return Ok(Bson::Array(items)),
                        next => items.push(self.value_from(next)?),
                    }
                }
            }
            other => Err(self.unexpected(&other)),
        }
    }

    /// Consume the next value without building it.
    pub fn skip_value(&mut self) -> Result<()> {
        let mut open = 0usize;
        loop {
            let token = self.next_token()?;
            match token {
                Token::StartDocument | Token::StartArray => open += 1,
                Token::EndDocument | Token::EndArray if open > 0 => open -= 1,
                Token::Key(_) if open > 0 => {}
                Token::Value(_) => {}
                other => return Err(self.unexpected(&other)),
            }
            if open == 0 {
                return Ok(());
            }
        }
    }

    /// Decode the next value into a [`DecodeValue`] destination.
    pub fn decode_into<T: DecodeValue + ?Sized>(&mut self, value: &mut T) -> Result<()> {
        value.decode_value(self)
    }

    /// Decode the next value into a fresh `T`.
    pub fn decode_field<T: DecodeValue + Default>(&mut self) -> Result<T> {
        let mut value = T::default();
        value.decode_value(self)?;
        Ok(value)
    }

    /// Decode the next value with the registry rule for `T`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::NoDecoder` if the registry has no rule for `T`.
    pub fn decode_registered<T: Any>(&mut self, value: &mut T) -> Result<()> {
        self.decode_target(Target::registered(value))
    }

    /// Decode the next value into any target.
    pub fn decode_target(&mut self, target: Target<'_>) -> Result<()> {
        match target {
            Target::SelfDecoding(value) => value.decode_value(self),
            Target::Registered { key, value } => {
                let rule = self.registry()?.lookup(key)?;
                rule(self, value)
            }
            Target::Absent => Err(CodecError::invalid_destination("destination is absent")),
        }
    }
}
