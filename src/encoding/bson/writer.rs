// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Binary document writer.
//!
//! Encodes a generic [`Document`] into BSON bytes. This is the paired encoder
//! for [`BsonReader`](super::BsonReader): anything it writes reads back as
//! the same document.

use byteorder::{ByteOrder, LittleEndian};

use crate::core::{Bson, CodecError, Document, Result};

/// Encoder that builds a BSON buffer.
#[derive(Debug, Default)]
pub struct BsonWriter {
    buffer: Vec<u8>,
}

impl BsonWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Append a top-level document.
    pub fn write_document(&mut self, doc: &Document) -> Result<()> {
        let start = self.begin_container();
        for (key, value) in doc.iter() {
            self.write_element(key, value)?;
        }
        self.end_container(start)
    }

    /// Finish and return the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }

    fn write_array(&mut self, items: &[Bson]) -> Result<()> {
        let start = self.begin_container();
        for (index, item) in items.iter().enumerate() {
            self.write_element(&index.to_string(), item)?;
        }
        self.end_container(start)
    }

    /// Reserve the length prefix; returns where the container starts.
    fn begin_container(&mut self) -> usize {
        let start = self.buffer.len();
        self.buffer.extend_from_slice(&[0; 4]);
        start
    }

    /// Write the terminator and backpatch the length prefix.
    fn end_container(&mut self, start: usize) -> Result<()> {
        self.buffer.push(0);
        let len = i32::try_from(self.buffer.len() - start)
            .map_err(|_| CodecError::unsupported("document larger than 2 GiB"))?;
        LittleEndian::write_i32(&mut self.buffer[start..start + 4], len);
        Ok(())
    }

    fn write_cstring(&mut self, s: &str) -> Result<()> {
        if s.as_bytes().contains(&0) {
            return Err(CodecError::unsupported(format!(
                "element name containing NUL: {s:?}"
            )));
        }
        self.buffer.extend_from_slice(s.as_bytes());
        self.buffer.push(0);
        Ok(())
    }

    fn write_element(&mut self, key: &str, value: &Bson) -> Result<()> {
        self.buffer.push(value.element_type().as_u8());
        self.write_cstring(key)?;
        match value {
            Bson::Double(v) => self.buffer.extend_from_slice(&v.to_le_bytes()),
            Bson::String(s) => {
                let len = i32::try_from(s.len() + 1)
                    .map_err(|_| CodecError::unsupported("string larger than 2 GiB"))?;
                self.buffer.extend_from_slice(&len.to_le_bytes());
                self.buffer.extend_from_slice(s.as_bytes());
                self.buffer.push(0);
            }
            Bson::Document(doc) => self.write_document(doc)?,
            Bson::Array(items) => self.write_array(items)?,
            Bson::Binary(bin) => {
                let len = i32::try_from(bin.bytes.len())
                    .map_err(|_| CodecError::unsupported("binary larger than 2 GiB"))?;
                self.buffer.extend_from_slice(&len.to_le_bytes());
                self.buffer.push(bin.subtype);
                self.buffer.extend_from_slice(&bin.bytes);
            }
            Bson::ObjectId(oid) => self.buffer.extend_from_slice(&oid.bytes()),
            Bson::Boolean(b) => self.buffer.push(u8::from(*b)),
            Bson::DateTime(ms) => self.buffer.extend_from_slice(&ms.to_le_bytes()),
            Bson::Null => {}
            Bson::Int32(v) => self.buffer.extend_from_slice(&v.to_le_bytes()),
            Bson::Int64(v) => self.buffer.extend_from_slice(&v.to_le_bytes()),
        }
        Ok(())
    }
}

/// Encode a document into a new buffer.
pub fn to_vec(doc: &Document) -> Result<Vec<u8>> {
    let mut writer = BsonWriter::new();
    writer.write_document(doc)?;
    Ok(writer.finish())
}
