// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Codec registry for per-type decoding rules.
//!
//! The registry maps a destination type to the rule that decodes a value of
//! that type. It is populated at setup time and only read during decoding,
//! so one registry can be shared (`Arc`) by any number of concurrent decodes.
//!
//! # Example
//!
//! ```
//! use bsoncodec::encoding::{CodecRegistry, TypeKey};
//! use bsoncodec::Decoder;
//!
//! struct Celsius(f64);
//!
//! let registry = CodecRegistry::new();
//! registry.register_rule(|dec: &mut Decoder<'_>, out: &mut Celsius| {
//!     out.0 = dec.decode_field::<f64>()?;
//!     Ok(())
//! });
//! assert!(registry.contains(TypeKey::of::<Celsius>()));
//! ```

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::core::{Binary, Bson, CodecError, Document, ObjectId, Result};
use crate::decoder::{DecodeValue, Decoder};

/// Type-erased decoding rule.
///
/// The second argument is the destination; it is always of the type the rule
/// was registered for.
pub type DecodeFn = Arc<dyn Fn(&mut Decoder<'_>, &mut dyn Any) -> Result<()> + Send + Sync>;

/// Identity of a destination type in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for type `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Rust type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

struct Registration {
    name: &'static str,
    decode: DecodeFn,
}

/// Erase a typed rule into a [`DecodeFn`].
fn erase<T, F>(rule: F) -> DecodeFn
where
    T: Any,
    F: Fn(&mut Decoder<'_>, &mut T) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(move |dec: &mut Decoder<'_>, value: &mut dyn Any| {
        let value = value.downcast_mut::<T>().ok_or_else(|| {
            CodecError::invariant_violation(format!(
                "rule for {} invoked with a different destination type",
                type_name::<T>()
            ))
        })?;
        rule(dec, value)
    })
}

/// Registry of decoding rules keyed by destination type.
///
/// Registering a rule for a type that already has one replaces it.
#[derive(Default)]
pub struct CodecRegistry {
    rules: RwLock<HashMap<TypeId, Registration>>,
}

impl CodecRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the built-in rules.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_value::<bool>();
        registry.register_value::<i32>();
        registry.register_value::<i64>();
        registry.register_value::<f64>();
        registry.register_value::<String>();
        registry.register_value::<Bson>();
        registry.register_value::<Document>();
        registry.register_value::<ObjectId>();
        registry.register_value::<Binary>();
        registry.register_value::<DateTime<Utc>>();
        registry.register_value::<Vec<Document>>();
        registry.register_value::<Vec<Bson>>();
        registry
    }

    /// Register a typed decoding rule for `T`.
    pub fn register_rule<T, F>(&self, rule: F)
    where
        T: Any,
        F: Fn(&mut Decoder<'_>, &mut T) -> Result<()> + Send + Sync + 'static,
    {
        self.insert(TypeKey::of::<T>(), erase(rule));
    }

    /// Register an already type-erased rule under `key`.
    pub fn register_fn(&self, key: TypeKey, decode: DecodeFn) {
        self.insert(key, decode);
    }

    /// Register `T`'s own [`DecodeValue`] implementation as its rule.
    pub fn register_value<T>(&self)
    where
        T: DecodeValue + Any,
    {
        self.register_rule(|dec: &mut Decoder<'_>, value: &mut T| value.decode_value(dec));
    }

    fn insert(&self, key: TypeKey, decode: DecodeFn) {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = rules
            .insert(
                key.id,
                Registration {
                    name: key.name,
                    decode,
                },
            )
            .is_some();
        trace!(
            context = "register_rule",
            type_name = key.name,
            replaced,
            "Registered decoding rule"
        );
    }

    /// Remove the rule for `key`.
    ///
    /// # Returns
    ///
    /// `true` if a rule was removed, `false` if none was registered
    pub fn unregister(&self, key: TypeKey) -> bool {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        rules.remove(&key.id).is_some()
    }

    /// Check whether a rule is registered for `key`.
    pub fn contains(&self, key: TypeKey) -> bool {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        rules.contains_key(&key.id)
    }

    /// Resolve the rule for `key`.
    ///
    /// The rule is cloned out so the lock is not held while it runs; rules
    /// may resolve further rules for nested values.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::NoDecoder` if no rule is registered
    pub fn lookup(&self, key: TypeKey) -> Result<DecodeFn> {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        rules
            .get(&key.id)
            .map(|registration| Arc::clone(&registration.decode))
            .ok_or_else(|| CodecError::no_decoder(key.name))
    }

    /// Names of all types with a registered rule, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = rules.values().map(|r| r.name).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

static DEFAULT_REGISTRY: OnceLock<Arc<CodecRegistry>> = OnceLock::new();

/// Get the process-wide default registry.
///
/// Built lazily on first use with the built-in rules. Rules registered on it
/// later are visible to every decode that uses the default registry.
pub fn default_registry() -> Arc<CodecRegistry> {
    Arc::clone(DEFAULT_REGISTRY.get_or_init(|| Arc::new(CodecRegistry::with_builtins())))
}
