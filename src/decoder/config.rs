// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decoder configuration.

use serde::Deserialize;

use crate::core::{CodecError, Result};

/// Default maximum document nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Default number of idle decoders a pool retains.
pub const DEFAULT_POOL_CAPACITY: usize = 32;

/// Configuration shared by a pool and the decoders it hands out.
///
/// Missing keys take their default when loaded from TOML:
///
/// ```
/// use bsoncodec::DecoderConfig;
///
/// let config = DecoderConfig::from_toml_str("max_depth = 16").unwrap();
/// assert_eq!(config.max_depth, 16);
/// assert_eq!(config.pool_capacity, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderConfig {
    /// Maximum container nesting depth before decoding fails
    pub max_depth: usize,
    /// Idle decoders kept for reuse; surplus decoders are dropped
    pub pool_capacity: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl DecoderConfig {
    /// Parse and validate a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::InvalidConfig` if the text is not valid TOML, has
    /// unknown keys, or fails [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| CodecError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the pool capacity.
    pub fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = pool_capacity;
        self
    }

    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(CodecError::invalid_config("max_depth must be at least 1"));
        }
        if self.pool_capacity == 0 {
            return Err(CodecError::invalid_config(
                "pool_capacity must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.pool_capacity, DEFAULT_POOL_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = DecoderConfig::from_toml_str("max_depth = 8\npool_capacity = 2\n").unwrap();
        assert_eq!(config, DecoderConfig::default().with_max_depth(8).with_pool_capacity(2));
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(
            DecoderConfig::from_toml_str("").unwrap(),
            DecoderConfig::default()
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = DecoderConfig::from_toml_str("max_depth = 0").unwrap_err();
        assert!(matches!(err, CodecError::InvalidConfig { .. }));
        assert!(DecoderConfig::from_toml_str("pool_capacity = 0").is_err());
        assert!(DecoderConfig::from_toml_str("max_depth = \"deep\"").is_err());
        assert!(DecoderConfig::from_toml_str("unknown = 1").is_err());
    }
}
