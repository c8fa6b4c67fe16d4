// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Format-agnostic value reader contract.
//!
//! A [`ValueReader`] is a forward-only cursor over one serialized document.
//! Both wire formats surface the same [`Token`] sequence, so the decoder and
//! every decoding rule are written once.
//!
//! A document `{"a": 1, "b": [true]}` reads as:
//!
//! ```text
//! StartDocument, Key("a"), Value(Int32(1)), Key("b"),
//! StartArray, Value(Boolean(true)), EndArray, EndDocument
//! ```

use std::fmt;

use crate::core::{Bson, Format, Result};

/// One structural step of a serialized document.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Start of an embedded or top-level document
    StartDocument,
    /// Field name; always followed by exactly one value
    Key(String),
    /// End of the innermost open document
    EndDocument,
    /// Start of an array; elements carry no keys
    StartArray,
    /// End of the innermost open array
    EndArray,
    /// Scalar value; never a document or array
    Value(Bson),
}

impl Token {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::StartDocument => "document".to_string(),
            Token::Key(key) => format!("field name '{key}'"),
            Token::EndDocument => "end of document".to_string(),
            Token::StartArray => "array".to_string(),
            Token::EndArray => "end of array".to_string(),
            Token::Value(value) => value.type_name().to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Sequential cursor over one serialized document.
///
/// Implementations must emit a well-nested token sequence and report any
/// structural problem of the input as an error from [`read_token`].
///
/// [`read_token`]: ValueReader::read_token
pub trait ValueReader {
    /// Wire format this reader consumes.
    fn format(&self) -> Format;

    /// Read the next token.
    fn read_token(&mut self) -> Result<Token>;

    /// Current position (byte offset or token index). Zero for a fresh reader.
    fn position(&self) -> usize;
}

impl<R: ValueReader + ?Sized> ValueReader for Box<R> {
    fn format(&self) -> Format {
        (**self).format()
    }

    fn read_token(&mut self) -> Result<Token> {
        (**self).read_token()
    }

    fn position(&self) -> usize {
        (**self).position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_describe() {
        assert_eq!(Token::StartDocument.describe(), "document");
        assert_eq!(Token::Key("a".into()).describe(), "field name 'a'");
        assert_eq!(Token::Value(Bson::Int64(1)).describe(), "int64");
        assert_eq!(Token::EndArray.to_string(), "end of array");
    }
}
