// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for bsoncodec.
//!
//! Errors fall into four groups:
//! - Invalid destinations, rejected before any byte is read
//! - Malformed input, raised by the value readers
//! - Context binding failures (programming errors)
//! - Decode failures raised by a decoding rule for some node

use std::fmt;

use super::Format;

/// Errors that can occur while dispatching a decode.
#[derive(Debug, Clone)]
pub enum CodecError {
    /// The destination is absent or cannot be written through
    InvalidDestination {
        /// Why the destination was rejected
        reason: String,
    },

    /// The serialized input is structurally invalid
    MalformedInput {
        /// Wire format being read
        format: Format,
        /// Byte offset (binary) or token index / column (extended JSON)
        position: usize,
        /// Error message
        message: String,
    },

    /// Buffer too short for requested read
    BufferTooShort {
        /// Requested bytes
        requested: usize,
        /// Available bytes
        available: usize,
        /// Cursor position when error occurred
        cursor_pos: u64,
    },

    /// Decode context is internally inconsistent
    InvalidContext {
        /// What is wrong with the context
        reason: String,
    },

    /// Reader cannot be bound to the decoder, or no reader is bound
    ReaderState {
        /// What is wrong with the reader binding
        reason: String,
    },

    /// A decoding rule found a value of the wrong type
    TypeMismatch {
        /// What the rule expected
        expected: String,
        /// What the input contained
        found: String,
        /// Reader position when the mismatch was detected
        position: usize,
    },

    /// No decoding rule registered for a destination type
    NoDecoder {
        /// Rust type name of the destination
        type_name: String,
    },

    /// Field decode error with context
    FieldDecodeError {
        /// Field name (or array index)
        field_name: String,
        /// Underlying error
        cause: Box<CodecError>,
    },

    /// Nesting exceeded the configured maximum depth
    DepthExceeded {
        /// Configured maximum
        max_depth: usize,
    },

    /// Captured generic document does not match the capture slot shape
    CaptureMismatch {
        /// Shape the slot accepts
        expected: String,
        /// Shape of the captured document
        found: String,
    },

    /// Invalid decoder configuration
    InvalidConfig {
        /// Validation error message
        reason: String,
    },

    /// Unsupported type or feature
    Unsupported {
        /// What is not supported
        feature: String,
    },

    /// Invariant violation inside the decoder
    InvariantViolation {
        /// Description of the invariant that was violated
        invariant: String,
    },
}

impl CodecError {
    /// Create an invalid destination error.
    pub fn invalid_destination(reason: impl Into<String>) -> Self {
        CodecError::InvalidDestination {
            reason: reason.into(),
        }
    }

    /// Create a malformed input error.
    pub fn malformed(format: Format, position: usize, message: impl Into<String>) -> Self {
        CodecError::MalformedInput {
            format,
            position,
            message: message.into(),
        }
    }

    /// Create a buffer too short error.
    pub fn buffer_too_short(requested: usize, available: usize, cursor_pos: u64) -> Self {
        CodecError::BufferTooShort {
            requested,
            available,
            cursor_pos,
        }
    }

    /// Create an invalid context error.
    pub fn invalid_context(reason: impl Into<String>) -> Self {
        CodecError::InvalidContext {
            reason: reason.into(),
        }
    }

    /// Create a reader state error.
    pub fn reader_state(reason: impl Into<String>) -> Self {
        CodecError::ReaderState {
            reason: reason.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(
        expected: impl Into<String>,
        found: impl Into<String>,
        position: usize,
    ) -> Self {
        CodecError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
            position,
        }
    }

    /// Create a "no decoder" error.
    pub fn no_decoder(type_name: impl Into<String>) -> Self {
        CodecError::NoDecoder {
            type_name: type_name.into(),
        }
    }

    /// Create a capture shape mismatch error.
    pub fn capture_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        CodecError::CaptureMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        CodecError::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an unsupported feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        CodecError::Unsupported {
            feature: feature.into(),
        }
    }

    /// Create an invariant violation error.
    pub fn invariant_violation(invariant: impl Into<String>) -> Self {
        CodecError::InvariantViolation {
            invariant: invariant.into(),
        }
    }

    /// Attach a field name to a rule failure.
    ///
    /// Structural errors (malformed input, depth, context) pass through
    /// unchanged so callers can still match on them directly.
    pub fn in_field(self, field_name: impl Into<String>) -> Self {
        if self.is_rule_failure() {
            CodecError::FieldDecodeError {
                field_name: field_name.into(),
                cause: Box::new(self),
            }
        } else {
            self
        }
    }

    /// True for failures raised by a decoding rule rather than by the reader.
    pub fn is_rule_failure(&self) -> bool {
        matches!(
            self,
            CodecError::TypeMismatch { .. }
                | CodecError::NoDecoder { .. }
                | CodecError::FieldDecodeError { .. }
                | CodecError::Unsupported { .. }
        )
    }

    /// The innermost error, skipping field context.
    pub fn root_cause(&self) -> &CodecError {
        match self {
            CodecError::FieldDecodeError { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Field path leading to the root cause, outermost first.
    pub fn field_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let CodecError::FieldDecodeError { field_name, cause } = current {
            path.push(field_name.as_str());
            current = cause;
        }
        path
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            CodecError::InvalidDestination { reason } => vec![("reason", reason.clone())],
            CodecError::MalformedInput {
                format,
                position,
                message,
            } => vec![
                ("format", format.to_string()),
                ("position", position.to_string()),
                ("message", message.clone()),
            ],
            CodecError::BufferTooShort {
                requested,
                available,
                cursor_pos,
            } => vec![
                ("requested", requested.to_string()),
                ("available", available.to_string()),
                ("cursor", cursor_pos.to_string()),
            ],
            CodecError::InvalidContext { reason } => vec![("reason", reason.clone())],
            CodecError::ReaderState { reason } => vec![("reason", reason.clone())],
            CodecError::TypeMismatch {
                expected,
                found,
                position,
            } => vec![
                ("expected", expected.clone()),
                ("found", found.clone()),
                ("position", position.to_string()),
            ],
            CodecError::NoDecoder { type_name } => vec![("type", type_name.clone())],
            CodecError::FieldDecodeError { .. } => {
                let mut fields = vec![("field", self.field_path().join("."))];
                fields.extend(self.root_cause().log_fields());
                fields
            }
            CodecError::DepthExceeded { max_depth } => {
                vec![("max_depth", max_depth.to_string())]
            }
            CodecError::CaptureMismatch { expected, found } => {
                vec![("expected", expected.clone()), ("found", found.clone())]
            }
            CodecError::InvalidConfig { reason } => vec![("reason", reason.clone())],
            CodecError::Unsupported { feature } => vec![("feature", feature.clone())],
            CodecError::InvariantViolation { invariant } => {
                vec![("invariant", invariant.clone())]
            }
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::InvalidDestination { reason } => {
                write!(f, "Invalid destination: {reason}")
            }
            CodecError::MalformedInput {
                format,
                position,
                message,
            } => write!(f, "Malformed {format} input at position {position}: {message}"),
            CodecError::BufferTooShort {
                requested,
                available,
                cursor_pos,
            } => write!(
                f,
                "Buffer too short: requested {requested} bytes at position {cursor_pos}, but only {available} bytes available"
            ),
            CodecError::InvalidContext { reason } => {
                write!(f, "Invalid decode context: {reason}")
            }
            CodecError::ReaderState { reason } => write!(f, "Reader state error: {reason}"),
            CodecError::TypeMismatch {
                expected,
                found,
                position,
            } => write!(
                f,
                "Type mismatch at position {position}: expected {expected}, found {found}"
            ),
            CodecError::NoDecoder { type_name } => {
                write!(f, "No decoder registered for type '{type_name}'")
            }
            CodecError::FieldDecodeError { field_name, cause } => {
                write!(f, "Failed to decode field '{field_name}': {cause}")
            }
            CodecError::DepthExceeded { max_depth } => {
                write!(f, "Document nesting exceeds maximum depth of {max_depth}")
            }
            CodecError::CaptureMismatch { expected, found } => write!(
                f,
                "Capture slot mismatch: slot expects {expected}, document is {found}"
            ),
            CodecError::InvalidConfig { reason } => write!(f, "Invalid configuration: {reason}"),
            CodecError::Unsupported { feature } => {
                write!(f, "Unsupported feature: '{feature}'")
            }
            CodecError::InvariantViolation { invariant } => {
                write!(f, "Invariant violation: {invariant}")
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::FieldDecodeError { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::MalformedInput {
            format: Format::ExtendedJson,
            position: err.column(),
            message: err.to_string(),
        }
    }
}

/// Result type for bsoncodec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
