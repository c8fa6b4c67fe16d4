// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Extended JSON reader
//!
//! Reads the textual extended-JSON variant of the document format. The input
//! stream is parsed eagerly with `serde_json` and lowered to [`Token`]s, so
//! every framing problem (truncated input, an unterminated literal, invalid
//! UTF-8, a malformed `$`-wrapper) is reported by [`ExtJsonReader::new`]
//! before any decoding starts.
//!
//! ## Canonical and relaxed mode
//!
//! Both modes accept plain JSON literals and the wrappers `$oid`,
//! `$numberInt`, `$numberLong`, `$numberDouble`, `$date` with a
//! `$numberLong` payload, and `$binary` with a `base64`/`subType` payload.
//! Relaxed mode additionally accepts `$date` as an RFC 3339 string or as an
//! integer millisecond count, and the legacy `{"$binary": .., "$type": ..}`
//! form. A document valid in both modes yields identical tokens.
//!
//! Wrappers for element types this crate does not model (`$numberDecimal`,
//! `$timestamp`, `$regularExpression`, and so on) are rejected with
//! `CodecError::Unsupported`, as the binary reader rejects their type bytes.
//!
//! ## Example
//!
//! ```
//! use bsoncodec::encoding::{ExtJsonReader, Token, ValueReader};
//!
//! let mut reader = ExtJsonReader::new(&br#"{"n": {"$numberLong": "7"}}"#[..], true).unwrap();
//! assert_eq!(reader.read_token().unwrap(), Token::StartDocument);
//! ```

use std::collections::VecDeque;
use std::io::Read;

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::core::{Binary, Bson, CodecError, Format, ObjectId, Result};
use crate::encoding::reader::{Token, ValueReader};

/// Forward-only reader over an extended-JSON document.
#[derive(Debug)]
pub struct ExtJsonReader {
    /// Lowered token stream
    tokens: VecDeque<Token>,
    /// Number of tokens consumed so far
    consumed: usize,
    /// Whether canonical mode was requested
    canonical: bool,
}

impl ExtJsonReader {
    /// Parse an extended-JSON stream.
    ///
    /// # Arguments
    ///
    /// * `input` - The byte stream to read
    /// * `canonical` - Restrict literal formatting to canonical extended JSON
    ///
    /// # Errors
    ///
    /// Returns `CodecError::MalformedInput` if the stream is not valid
    /// extended JSON in the requested mode.
    pub fn new<R: Read>(input: R, canonical: bool) -> Result<Self> {
        let value: Value = serde_json::from_reader(input)?;
        let lowering = Lowering { canonical };
        let mut tokens = VecDeque::new();
        lowering.lower(value, &mut tokens)?;
        Ok(Self {
            tokens,
            consumed: 0,
            canonical,
        })
    }

    /// Whether this reader was built in canonical mode.
    pub fn is_canonical(&self) -> bool {
        self.canonical
    }

    /// Number of tokens not yet read.
    pub fn remaining(&self) -> usize {
        self.tokens.len()
    }
}

impl ValueReader for ExtJsonReader {
    fn format(&self) -> Format {
        Format::ExtendedJson
    }

    fn read_token(&mut self) -> Result<Token> {
        let token = self.tokens.pop_front().ok_or_else(|| {
            CodecError::malformed(
                Format::ExtendedJson,
                self.consumed,
                "read past the end of the document",
            )
        })?;
        self.consumed += 1;
        Ok(token)
    }

    fn position(&self) -> usize {
        self.consumed
    }
}

/// Single-key wrappers for element types without a [`Bson`] variant.
const UNSUPPORTED_WRAPPERS: &[&str] = &[
    "$numberDecimal",
    "$timestamp",
    "$regularExpression",
    "$minKey",
    "$maxKey",
    "$symbol",
    "$code",
    "$undefined",
    "$dbPointer",
];

/// Two-key wrappers for the same, as `(first, second)` key pairs.
const UNSUPPORTED_PAIRS: &[(&str, &str)] = &[("$code", "$scope"), ("$regex", "$options")];

fn unsupported_wrapper(map: &Map<String, Value>) -> Option<&str> {
    match map.len() {
        1 => map
            .keys()
            .map(String::as_str)
            .find(|key| UNSUPPORTED_WRAPPERS.iter().any(|reserved| reserved == key)),
        2 => UNSUPPORTED_PAIRS
            .iter()
            .find(|(first, second)| map.contains_key(*first) && map.contains_key(*second))
            .map(|(first, _)| *first),
        _ => None,
    }
}

/// Converts a parsed JSON tree into tokens.
struct Lowering {
    canonical: bool,
}

impl Lowering {
    fn lower(&self, value: Value, out: &mut VecDeque<Token>) -> Result<()> {
        match value {
            Value::Null => out.push_back(Token::Value(Bson::Null)),
            Value::Bool(b) => out.push_back(Token::Value(Bson::Boolean(b))),
            Value::Number(n) => out.push_back(Token::Value(number_to_bson(&n))),
            Value::String(s) => out.push_back(Token::Value(Bson::String(s))),
            Value::Array(items) => {
                out.push_back(Token::StartArray);
                for item in items {
                    self.lower(item, out)?;
                }
                out.push_back(Token::EndArray);
            }
            Value::Object(map) => match self.wrapper(&map)? {
                Some(scalar) => out.push_back(Token::Value(scalar)),
                None => {
                    out.push_back(Token::StartDocument);
                    for (key, item) in map {
                        out.push_back(Token::Key(key));
                        self.lower(item, out)?;
                    }
                    out.push_back(Token::EndDocument);
                }
            },
        }
        Ok(())
    }

    /// Recognise a `$`-wrapper object. Objects whose keys merely start with
    /// `$` (query operators, for example) stay ordinary documents.
    fn wrapper(&self, map: &Map<String, Value>) -> Result<Option<Bson>> {
        if let Some(key) = unsupported_wrapper(map) {
            return Err(CodecError::unsupported(format!("extended JSON type {key}")));
        }
        if map.len() == 2 && !self.canonical {
            if let (Some(payload), Some(subtype)) = (map.get("$binary"), map.get("$type")) {
                return legacy_binary(payload, subtype).map(Some);
            }
        }
        if map.len() != 1 {
            return Ok(None);
        }
        let Some((key, payload)) = map.iter().next() else {
            return Ok(None);
        };
        let scalar = match key.as_str() {
            "$oid" => {
                let hex = expect_str(key, payload)?;
                let oid = ObjectId::parse_str(hex)
                    .ok_or_else(|| malformed(format!("invalid $oid {hex:?}")))?;
                Bson::ObjectId(oid)
            }
            "$numberInt" => {
                let s = expect_str(key, payload)?;
                Bson::Int32(
                    s.parse()
                        .map_err(|_| malformed(format!("invalid $numberInt {s:?}")))?,
                )
            }
            "$numberLong" => Bson::Int64(parse_number_long(payload)?),
            "$numberDouble" => {
                let s = expect_str(key, payload)?;
                Bson::Double(parse_number_double(s)?)
            }
            "$date" => Bson::DateTime(self.date(payload)?),
            "$binary" => modern_binary(payload)?,
            _ => return Ok(None),
        };
        Ok(Some(scalar))
    }

    fn date(&self, payload: &Value) -> Result<i64> {
        match payload {
            Value::Object(inner) if inner.len() == 1 => match inner.get("$numberLong") {
                Some(ms) => parse_number_long(ms),
                None => Err(malformed("$date object must hold $numberLong")),
            },
            Value::String(s) if !self.canonical => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.timestamp_millis())
                .map_err(|e| malformed(format!("invalid $date {s:?}: {e}"))),
            Value::Number(n) if !self.canonical => n
                .as_i64()
                .ok_or_else(|| malformed(format!("invalid $date millisecond count {n}"))),
            _ if self.canonical => Err(malformed(
                "canonical $date must be {\"$numberLong\": \"<millis>\"}",
            )),
            _ => Err(malformed("unrecognised $date payload")),
        }
    }
}

fn malformed(message: impl Into<String>) -> CodecError {
    CodecError::malformed(Format::ExtendedJson, 0, message)
}

fn expect_str<'v>(key: &str, payload: &'v Value) -> Result<&'v str> {
    payload
        .as_str()
        .ok_or_else(|| malformed(format!("{key} payload must be a string")))
}

fn number_to_bson(n: &serde_json::Number) -> Bson {
    if let Some(i) = n.as_i64() {
        match i32::try_from(i) {
            Ok(small) => Bson::Int32(small),
            Err(_) => Bson::Int64(i),
        }
    } else {
        Bson::Double(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn parse_number_long(payload: &Value) -> Result<i64> {
    let s = expect_str("$numberLong", payload)?;
    s.parse()
        .map_err(|_| malformed(format!("invalid $numberLong {s:?}")))
}

fn parse_number_double(s: &str) -> Result<f64> {
    match s {
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        _ => s
            .parse()
            .map_err(|_| malformed(format!("invalid $numberDouble {s:?}"))),
    }
}

fn parse_subtype(s: &str) -> Result<u8> {
    if s.is_empty() || s.len() > 2 {
        return Err(malformed(format!("invalid binary subtype {s:?}")));
    }
    u8::from_str_radix(s, 16).map_err(|_| malformed(format!("invalid binary subtype {s:?}")))
}

fn modern_binary(payload: &Value) -> Result<Bson> {
    let Value::Object(inner) = payload else {
        return Err(malformed("$binary payload must be an object"));
    };
    let (Some(data), Some(subtype), 2) = (inner.get("base64"), inner.get("subType"), inner.len())
    else {
        return Err(malformed("$binary must hold exactly base64 and subType"));
    };
    let bytes = decode_base64(expect_str("base64", data)?)?;
    let subtype = parse_subtype(expect_str("subType", subtype)?)?;
    Ok(Bson::Binary(Binary { subtype, bytes }))
}

fn legacy_binary(payload: &Value, subtype: &Value) -> Result<Bson> {
    let bytes = decode_base64(expect_str("$binary", payload)?)?;
    let subtype = parse_subtype(expect_str("$type", subtype)?)?;
    Ok(Bson::Binary(Binary { subtype, bytes }))
}

/// Standard-alphabet base64 decoding with optional padding.
fn decode_base64(s: &str) -> Result<Vec<u8>> {
    fn sextet(c: u8) -> Option<u8> {
        match c {
            b'A'..=b'Z' => Some(c - b'A'),
            b'a'..=b'z' => Some(c - b'a' + 26),
            b'0'..=b'9' => Some(c - b'0' + 52),
            b'+' => Some(62),
            b'/' => Some(63),
            _ => None,
        }
    }

    let trimmed = s.trim_end_matches('=');
    if s.len() - trimmed.len() > 2 || trimmed.len() % 4 == 1 {
        return Err(malformed(format!("invalid base64 length in {s:?}")));
    }

    let mut out = Vec::with_capacity(trimmed.len() * 3 / 4);
    let mut acc: u32 = 0;
    let mut bits = 0;
    for &c in trimmed.as_bytes() {
        let v = sextet(c).ok_or_else(|| malformed(format!("invalid base64 character {:?}", c as char)))?;
        acc = (acc << 6) | u32::from(v);
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
        }
    }
    Ok(out)
}
