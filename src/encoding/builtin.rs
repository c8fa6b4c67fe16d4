// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Built-in decoding rules.
//!
//! [`DecodeValue`] implementations for the scalar types, the generic value
//! types, and the standard containers. Integer destinations accept any
//! integral input that fits; `f64` accepts any numeric input.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::core::{Binary, Bson, Document, ObjectId, Result};
use crate::decoder::{DecodeValue, Decoder};

/// Integral value of a numeric input, if it has one.
fn integral(value: &Bson) -> Option<i64> {
    match *value {
        Bson::Int32(v) => Some(i64::from(v)),
        Bson::Int64(v) => Some(v),
        Bson::Double(d) if d.fract() == 0.0 && d >= i64::MIN as f64 && d < i64::MAX as f64 => {
            Some(d as i64)
        }
        _ => None,
    }
}

fn out_of_range(value: &Bson) -> String {
    format!("{} {value}", value.type_name())
}

impl DecodeValue for bool {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        match dec.read_scalar("boolean")? {
            Bson::Boolean(b) => {
                *self = b;
                Ok(())
            }
            other => Err(dec.mismatch("boolean", other.type_name())),
        }
    }
}

impl DecodeValue for i32 {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        let value = dec.read_scalar("int32")?;
        let Some(n) = integral(&value) else {
            return Err(dec.mismatch("int32", value.type_name()));
        };
        *self = i32::try_from(n).map_err(|_| dec.mismatch("int32", out_of_range(&value)))?;
        Ok(())
    }
}

impl DecodeValue for i64 {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        let value = dec.read_scalar("int64")?;
        *self = integral(&value).ok_or_else(|| dec.mismatch("int64", out_of_range(&value)))?;
        Ok(())
    }
}

impl DecodeValue for f64 {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        *self = match dec.read_scalar("double")? {
            Bson::Double(d) => d,
            Bson::Int32(v) => f64::from(v),
            Bson::Int64(v) => v as f64,
            other => return Err(dec.mismatch("double", other.type_name())),
        };
        Ok(())
    }
}

impl DecodeValue for String {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        match dec.read_scalar("string")? {
            Bson::String(s) => {
                *self = s;
                Ok(())
            }
            other => Err(dec.mismatch("string", other.type_name())),
        }
    }
}

impl DecodeValue for Bson {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        *self = dec.read_value()?;
        Ok(())
    }
}

impl DecodeValue for Document {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        match dec.read_value()? {
            Bson::Document(doc) => {
                *self = doc;
                Ok(())
            }
            other => Err(dec.mismatch("document", other.type_name())),
        }
    }
}

impl DecodeValue for ObjectId {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        match dec.read_scalar("objectId")? {
            Bson::ObjectId(oid) => {
                *self = oid;
                Ok(())
            }
            other => Err(dec.mismatch("objectId", other.type_name())),
        }
    }
}

impl DecodeValue for Binary {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        match dec.read_scalar("binData")? {
            Bson::Binary(bin) => {
                *self = bin;
                Ok(())
            }
            other => Err(dec.mismatch("binData", other.type_name())),
        }
    }
}

impl DecodeValue for DateTime<Utc> {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        let value = dec.read_scalar("date")?;
        let Bson::DateTime(ms) = value else {
            return Err(dec.mismatch("date", value.type_name()));
        };
        *self = DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| dec.mismatch("date", out_of_range(&value)))?;
        Ok(())
    }
}

/// Null clears the option; anything else decodes into the inner value,
/// reusing an existing one.
impl<T: DecodeValue + Default> DecodeValue for Option<T> {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        if dec.peek_is_null()? {
            dec.skip_value()?;
            *self = None;
            return Ok(());
        }
        self.get_or_insert_with(T::default).decode_value(dec)
    }
}

/// Null clears the vector. Existing elements are replaced, not merged.
impl<T: DecodeValue + Default> DecodeValue for Vec<T> {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        self.clear();
        if dec.peek_is_null()? {
            return dec.skip_value();
        }
        dec.read_array(|dec, _| {
            let mut item = T::default();
            item.decode_value(dec)?;
            self.push(item);
            Ok(())
        })
    }
}

impl<T: DecodeValue + Default> DecodeValue for HashMap<String, T> {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        self.clear();
        if dec.peek_is_null()? {
            return dec.skip_value();
        }
        dec.read_document(|dec, key| {
            let mut value = T::default();
            value.decode_value(dec)?;
            self.insert(key.to_string(), value);
            Ok(())
        })
    }
}

impl<T: DecodeValue + Default> DecodeValue for BTreeMap<String, T> {
    fn decode_value(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        self.clear();
        if dec.peek_is_null()? {
            return dec.skip_value();
        }
        dec.read_document(|dec, key| {
            let mut value = T::default();
            value.decode_value(dec)?;
            self.insert(key.to_string(), value);
            Ok(())
        })
    }
}
