// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Binary document reader.
//!
//! Walks a BSON buffer lazily. Construction never fails; a malformed buffer
//! surfaces as an error from the first [`ValueReader::read_token`] call that
//! touches the bad bytes.
//!
//! # Example
//!
//! ```
//! use bsoncodec::encoding::{BsonReader, Token, ValueReader};
//!
//! // {"hello": "world"}
//! let data = b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00";
//! let mut reader = BsonReader::new(data);
//! assert_eq!(reader.read_token().unwrap(), Token::StartDocument);
//! assert_eq!(reader.read_token().unwrap(), Token::Key("hello".into()));
//! ```

use byteorder::{ByteOrder, LittleEndian};

use crate::core::{Binary, Bson, CodecError, ElementType, Format, ObjectId, Result};
use crate::encoding::reader::{Token, ValueReader};

/// Smallest valid document: 4-byte length plus terminator.
pub const MIN_DOCUMENT_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Document,
    Array,
}

/// An open container: where it ends and what kind it is.
#[derive(Debug, Clone, Copy)]
struct Frame {
    end: usize,
    kind: FrameKind,
}

/// Forward-only reader over a binary document.
pub struct BsonReader<'a> {
    /// The document bytes
    data: &'a [u8],
    /// Current read position
    offset: usize,
    /// Open containers, innermost last
    frames: Vec<Frame>,
    /// Type of the value announced by the last key token
    pending: Option<ElementType>,
    /// Whether the top-level document has been opened
    started: bool,
}

impl<'a> BsonReader<'a> {
    /// Create a reader over a binary document.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            frames: Vec::new(),
            pending: None,
            started: false,
        }
    }

    /// Get the remaining bytes available to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Check whether the top-level document has been fully read.
    pub fn is_finished(&self) -> bool {
        self.started && self.frames.is_empty() && self.pending.is_none()
    }

    fn malformed(&self, message: impl Into<String>) -> CodecError {
        CodecError::malformed(Format::Binary, self.offset, message)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(CodecError::buffer_too_short(
                count,
                self.remaining(),
                self.offset as u64,
            ));
        }
        let start = self.offset;
        self.offset += count;
        Ok(&self.data[start..self.offset])
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    fn read_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    /// Read a length prefix that must be at least `min`.
    fn read_length(&mut self, min: usize) -> Result<usize> {
        let raw = self.read_i32()?;
        match usize::try_from(raw) {
            Ok(len) if len >= min => Ok(len),
            _ => Err(self.malformed(format!("invalid length prefix {raw}"))),
        }
    }

    fn read_cstring(&mut self) -> Result<String> {
        let rest = &self.data[self.offset..];
        let Some(nul) = rest.iter().position(|&b| b == 0) else {
            return Err(self.malformed("unterminated element name"));
        };
        let bytes = self.take(nul + 1)?;
        std::str::from_utf8(&bytes[..nul])
            .map(str::to_string)
            .map_err(|e| self.malformed(format!("element name is not UTF-8: {e}")))
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_length(1)?;
        let bytes = self.take(len)?;
        if bytes[len - 1] != 0 {
            return Err(self.malformed("string is not NUL-terminated"));
        }
        std::str::from_utf8(&bytes[..len - 1])
            .map(str::to_string)
            .map_err(|e| self.malformed(format!("string is not UTF-8: {e}")))
    }

    /// Open a document or array at the current offset.
    fn open(&mut self, kind: FrameKind) -> Result<Token> {
        let start = self.offset;
        let len = self.read_length(MIN_DOCUMENT_SIZE)?;
        let limit = self
            .frames
            .last()
            .map_or(self.data.len(), |frame| frame.end.saturating_sub(1));
        let end = start + len;
        if end > limit {
            return Err(CodecError::buffer_too_short(
                len,
                limit.saturating_sub(start),
                start as u64,
            ));
        }
        self.frames.push(Frame { end, kind });
        Ok(match kind {
            FrameKind::Document => Token::StartDocument,
            FrameKind::Array => Token::StartArray,
        })
    }

    fn read_value(&mut self, ty: ElementType) -> Result<Token> {
        let value = match ty {
            ElementType::Document => return self.open(FrameKind::Document),
            ElementType::Array => return self.open(FrameKind::Array),
            ElementType::Double => Bson::Double(self.read_f64()?),
            ElementType::String => Bson::String(self.read_string()?),
            ElementType::Binary => {
                let len = self.read_length(0)?;
                let subtype = self.read_u8()?;
                let bytes = self.take(len)?.to_vec();
                Bson::Binary(Binary { subtype, bytes })
            }
            ElementType::ObjectId => {
                let mut bytes = [0u8; 12];
                bytes.copy_from_slice(self.take(12)?);
                Bson::ObjectId(ObjectId::from_bytes(bytes))
            }
            ElementType::Boolean => match self.read_u8()? {
                0 => Bson::Boolean(false),
                1 => Bson::Boolean(true),
                other => return Err(self.malformed(format!("invalid boolean byte {other:#04x}"))),
            },
            ElementType::DateTime => Bson::DateTime(self.read_i64()?),
            ElementType::Null => Bson::Null,
            ElementType::Int32 => Bson::Int32(self.read_i32()?),
            ElementType::Int64 => Bson::Int64(self.read_i64()?),
        };
        Ok(Token::Value(value))
    }
}

impl ValueReader for BsonReader<'_> {
    fn format(&self) -> Format {
        Format::Binary
    }

    fn read_token(&mut self) -> Result<Token> {
        if let Some(ty) = self.pending.take() {
            return self.read_value(ty);
        }

        let Some(frame) = self.frames.last().copied() else {
            if self.started {
                return Err(self.malformed("read past the end of the document"));
            }
            self.started = true;
            return self.open(FrameKind::Document);
        };

        if self.offset + 1 == frame.end {
            if self.read_u8()? != 0 {
                return Err(self.malformed("container is missing its terminator"));
            }
            self.frames.pop();
            return Ok(match frame.kind {
                FrameKind::Document => Token::EndDocument,
                FrameKind::Array => Token::EndArray,
            });
        }
        if self.offset >= frame.end {
            return Err(self.malformed("element overruns its enclosing container"));
        }

        let type_byte = self.read_u8()?;
        let ty = ElementType::from_u8(type_byte).ok_or_else(|| {
            CodecError::unsupported(format!("BSON element type {type_byte:#04x}"))
        })?;
        let key = self.read_cstring()?;

        match frame.kind {
            FrameKind::Document => {
                self.pending = Some(ty);
                Ok(Token::Key(key))
            }
            FrameKind::Array => self.read_value(ty),
        }
    }

    fn position(&self) -> usize {
        self.offset
    }
}
