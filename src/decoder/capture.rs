// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Generic sink for dual-output decoding.
//!
//! The decoder mirrors every token it consumes into a [`CaptureBuilder`],
//! which rebuilds the same document as a generic [`Bson`] tree. Tokens
//! skipped by the typed decode are mirrored too, so the capture always holds
//! the whole input.

use crate::core::{Bson, CodecError, Document, Result};
use crate::encoding::Token;

#[derive(Debug)]
enum Frame {
    Document { doc: Document, key: Option<String> },
    Array(Vec<Bson>),
}

/// Rebuilds a generic value from a token stream.
#[derive(Debug, Default)]
pub struct CaptureBuilder {
    stack: Vec<Frame>,
    root: Option<Bson>,
}

impl CaptureBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one token.
    pub fn record(&mut self, token: &Token) -> Result<()> {
        match token {
            Token::StartDocument => {
                self.stack.push(Frame::Document {
                    doc: Document::new(),
                    key: None,
                });
                Ok(())
            }
            Token::StartArray => {
                self.stack.push(Frame::Array(Vec::new()));
                Ok(())
            }
            Token::Key(name) => match self.stack.last_mut() {
                Some(Frame::Document { key: key @ None, .. }) => {
                    *key = Some(name.clone());
                    Ok(())
                }
                _ => Err(unbalanced(token)),
            },
            Token::Value(value) => self.attach(value.clone()),
            Token::EndDocument => match self.stack.pop() {
                Some(Frame::Document { doc, key: None }) => self.attach(Bson::Document(doc)),
                _ => Err(unbalanced(token)),
            },
            Token::EndArray => match self.stack.pop() {
                Some(Frame::Array(items)) => self.attach(Bson::Array(items)),
                _ => Err(unbalanced(token)),
            },
        }
    }

    fn attach(&mut self, value: Bson) -> Result<()> {
        match self.stack.last_mut() {
            None if self.root.is_none() => {
                self.root = Some(value);
                Ok(())
            }
            None => Err(CodecError::invariant_violation(
                "captured a second top-level value",
            )),
            Some(Frame::Document { doc, key }) => {
                let name = key.take().ok_or_else(|| {
                    CodecError::invariant_violation("captured a field value without a name")
                })?;
                doc.insert(name, value);
                Ok(())
            }
            Some(Frame::Array(items)) => {
                items.push(value);
                Ok(())
            }
        }
    }

    /// Check whether a complete top-level value has been built.
    pub fn is_complete(&self) -> bool {
        self.stack.is_empty() && self.root.is_some()
    }

    /// Take the completed top-level value.
    pub fn take_root(&mut self) -> Result<Bson> {
        if !self.stack.is_empty() {
            return Err(CodecError::invariant_violation(format!(
                "capture taken with {} container(s) still open",
                self.stack.len()
            )));
        }
        self.root
            .take()
            .ok_or_else(|| CodecError::invariant_violation("nothing was captured"))
    }

    /// Discard everything recorded so far.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.root = None;
    }
}

fn unbalanced(token: &Token) -> CodecError {
    CodecError::invariant_violation(format!("unbalanced {token} in captured stream"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(tokens: &[Token]) -> Result<Bson> {
        let mut builder = CaptureBuilder::new();
        for token in tokens {
            builder.record(token)?;
        }
        builder.take_root()
    }

    #[test]
    fn test_nested_document() {
        let root = feed(&[
            Token::StartDocument,
            Token::Key("a".into()),
            Token::Value(Bson::String("123".into())),
            Token::Key("b".into()),
            Token::StartDocument,
            Token::Key("c".into()),
            Token::StartArray,
            Token::Value(Bson::Int32(1)),
            Token::StartDocument,
            Token::EndDocument,
            Token::EndArray,
            Token::EndDocument,
            Token::EndDocument,
        ])
        .unwrap();

        let inner: Document = [(
            "c",
            Bson::Array(vec![Bson::Int32(1), Bson::Document(Document::new())]),
        )]
        .into_iter()
        .collect();
        let mut expected = Document::new();
        expected.insert("a", "123");
        expected.insert("b", inner);
        assert_eq!(root, Bson::Document(expected));
    }

    #[test]
    fn test_incomplete_capture() {
        let mut builder = CaptureBuilder::new();
        builder.record(&Token::StartDocument).unwrap();
        assert!(!builder.is_complete());
        assert!(builder.take_root().is_err());
    }

    #[test]
    fn test_unbalanced_tokens() {
        assert!(feed(&[Token::EndArray]).is_err());
        assert!(feed(&[Token::StartArray, Token::EndDocument]).is_err());
        assert!(feed(&[Token::StartDocument, Token::Value(Bson::Null)]).is_err());
        assert!(feed(&[Token::Value(Bson::Null), Token::Value(Bson::Null)]).is_err());
    }

    #[test]
    fn test_clear() {
        let mut builder = CaptureBuilder::new();
        builder.record(&Token::Value(Bson::Int64(1))).unwrap();
        assert!(builder.is_complete());
        builder.clear();
        assert!(!builder.is_complete());
        assert!(builder.take_root().is_err());
    }
}
