// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decode context: which registry to use and whether to capture.

use std::sync::Arc;

use crate::core::{Bson, CodecError, Document, Result};
use crate::encoding::{default_registry, CodecRegistry};

/// Caller-owned destination for the generic copy of a decoded document.
#[derive(Debug)]
pub enum CaptureSlot<'c> {
    /// Receives an object-shaped document
    Document(&'c mut Document),
    /// Receives an array whose elements are all documents
    Documents(&'c mut Vec<Document>),
}

impl CaptureSlot<'_> {
    /// Shape this slot accepts, for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            CaptureSlot::Document(_) => "document",
            CaptureSlot::Documents(_) => "array of documents",
        }
    }

    /// Store a captured root. The slot is untouched unless the shape fits.
    pub(crate) fn commit(&mut self, root: Bson) -> Result<()> {
        match (self, root) {
            (CaptureSlot::Document(slot), Bson::Document(doc)) => {
                **slot = doc;
                Ok(())
            }
            (CaptureSlot::Documents(slot), Bson::Array(items)) => {
                let docs = items
                    .into_iter()
                    .map(|item| match item {
                        Bson::Document(doc) => Ok(doc),
                        other => Err(CodecError::capture_mismatch(
                            "array of documents",
                            format!("array containing {}", other.type_name()),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                **slot = docs;
                Ok(())
            }
            (slot, other) => Err(CodecError::capture_mismatch(
                slot.shape(),
                other.type_name(),
            )),
        }
    }
}

impl<'c> From<&'c mut Document> for CaptureSlot<'c> {
    fn from(doc: &'c mut Document) -> Self {
        CaptureSlot::Document(doc)
    }
}

impl<'c> From<&'c mut Vec<Document>> for CaptureSlot<'c> {
    fn from(docs: &'c mut Vec<Document>) -> Self {
        CaptureSlot::Documents(docs)
    }
}

/// Per-call decode configuration.
///
/// `dual_output` requires a capture slot; the decoder rejects a context that
/// asks for dual output without one. A slot without `dual_output` is ignored.
#[derive(Debug)]
pub struct DecodeContext<'c> {
    /// Rules used to resolve registered destinations
    pub registry: Arc<CodecRegistry>,
    /// Where the generic copy goes in dual-output mode
    pub capture: Option<CaptureSlot<'c>>,
    /// Produce a typed and a generic result from one traversal
    pub dual_output: bool,
}

impl Default for DecodeContext<'_> {
    fn default() -> Self {
        Self::new(default_registry())
    }
}

impl<'c> DecodeContext<'c> {
    /// Context using `registry`, dual output off.
    pub fn new(registry: Arc<CodecRegistry>) -> Self {
        Self {
            registry,
            capture: None,
            dual_output: false,
        }
    }

    /// Context using `registry` that also captures into `capture`.
    pub fn with_capture(registry: Arc<CodecRegistry>, capture: impl Into<CaptureSlot<'c>>) -> Self {
        Self {
            registry,
            capture: Some(capture.into()),
            dual_output: true,
        }
    }

    /// Check the dual-output invariant.
    pub fn validate(&self) -> Result<()> {
        if self.dual_output && self.capture.is_none() {
            return Err(CodecError::invalid_context(
                "dual output requested without a capture slot",
            ));
        }
        Ok(())
    }
}
