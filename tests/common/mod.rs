// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common destinations and fixtures for integration tests.

#![allow(dead_code)]

use bsoncodec::encoding::to_vec;
use bsoncodec::{Bson, DecodeValue, Decoder, Document, ObjectId, Result};

// ============================================================================
// Destinations
// ============================================================================

/// `{b: int}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inner {
    pub b: i32,
}

impl DecodeValue for Inner {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        dec.read_document(|dec, key| match key {
            "b" => dec.decode_into(&mut self.b),
            _ => dec.skip_value(),
        })
    }
}

/// `{a: string, b: {b: int}}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outer {
    pub a: String,
    pub b: Inner,
}

impl DecodeValue for Outer {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        dec.read_document(|dec, key| match key {
            "a" => dec.decode_into(&mut self.a),
            "b" => dec.decode_into(&mut self.b),
            _ => dec.skip_value(),
        })
    }
}

/// A record touching every supported element type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub id: ObjectId,
    pub name: String,
    pub count: i64,
    pub ratio: f64,
    pub active: bool,
    pub tags: Vec<String>,
    pub parent: Option<Inner>,
    pub extra: Document,
}

impl DecodeValue for Record {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        dec.read_document(|dec, key| match key {
            "_id" => dec.decode_into(&mut self.id),
            "name" => dec.decode_into(&mut self.name),
            "count" => dec.decode_into(&mut self.count),
            "ratio" => dec.decode_into(&mut self.ratio),
            "active" => dec.decode_into(&mut self.active),
            "tags" => dec.decode_into(&mut self.tags),
            "parent" => dec.decode_into(&mut self.parent),
            "extra" => dec.decode_into(&mut self.extra),
            _ => dec.skip_value(),
        })
    }
}

/// A differently shaped destination, for pooled-slot reuse checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    pub values: Vec<i32>,
    pub label: Option<String>,
}

impl DecodeValue for Sample {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        dec.read_document(|dec, key| match key {
            "values" => dec.decode_into(&mut self.values),
            "label" => dec.decode_into(&mut self.label),
            _ => dec.skip_value(),
        })
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Extended-JSON text for `{a: "123", b: {b: 123}}`.
pub const OUTER_JSON: &str = r#"{"a": "123", "b": {"b": 123}}"#;

/// Generic form of [`OUTER_JSON`].
pub fn outer_document() -> Document {
    let inner: Document = [("b", 123)].into_iter().collect();
    let mut doc = Document::new();
    doc.insert("a", "123");
    doc.insert("b", inner);
    doc
}

/// A fully populated [`Record`] and its generic form.
pub fn record_fixture() -> (Record, Document) {
    let id = ObjectId::from_bytes([0x5f, 0x1d, 0x7a, 0x2b, 0x9c, 0x8e, 0x4f, 0x0a, 0x1b, 0x2c, 0x3d, 0x4e]);
    let extra: Document = [("nested", Bson::Array(vec![Bson::Null, Bson::Boolean(false)]))]
        .into_iter()
        .collect();

    let record = Record {
        id,
        name: "probe".to_string(),
        count: 9_000_000_000,
        ratio: 0.25,
        active: true,
        tags: vec!["x".to_string(), "y".to_string()],
        parent: Some(Inner { b: -4 }),
        extra: extra.clone(),
    };

    let parent: Document = [("b", -4)].into_iter().collect();
    let mut doc = Document::new();
    doc.insert("_id", id);
    doc.insert("name", "probe");
    doc.insert("count", 9_000_000_000i64);
    doc.insert("ratio", 0.25);
    doc.insert("active", true);
    doc.insert("tags", vec![Bson::from("x"), Bson::from("y")]);
    doc.insert("parent", parent);
    doc.insert("extra", extra);
    (record, doc)
}

/// Encode a document, panicking on failure.
pub fn bson_bytes(doc: &Document) -> Vec<u8> {
    to_vec(doc).expect("fixture document encodes")
}
