//! TypeRegistry - native type to runtime descriptor table.
//!
//! This module provides [`TypeRegistry`], the table consulted whenever a
//! native type needs its runtime descriptor. It holds two maps:
//!
//! - **Types**: one entry per concrete native type, keyed by `TypeHash`.
//!   Explicitly registered parametric instantiations live here too, keyed
//!   by their structural mapping hash.
//! - **Parametric constructors**: one entry per [`TypeConstructor`] marker,
//!   shared by every instantiation of that family.
//!
//! Both maps enforce the same rule: an entry is written exactly once and
//! never removed. A second registration is a programming error (typically
//! module initialisation running twice) and is reported, not ignored.
//! Distinct native types may share one descriptor.
//!
//! # Thread Safety
//!
//! `TypeRegistry` is **not synchronised**. Registration is expected to run
//! to completion before conversions begin. The process-wide instance in
//! [`crate::global`] is wrapped in an `RwLock` for that reason.
//!
//! # Example
//!
//! ```
//! use embedbridge_core::{TypeDescriptor, native_type};
//! use embedbridge_registry::TypeRegistry;
//!
//! struct Vec3;
//! native_type!(Vec3);
//!
//! let descriptor = TypeDescriptor::from_raw(0x100).unwrap();
//! let mut registry = TypeRegistry::new();
//!
//! assert!(!registry.is_type_registered::<Vec3>());
//! registry.register_type::<Vec3>(descriptor).unwrap();
//! assert_eq!(registry.lookup_type::<Vec3>(), Ok(descriptor));
//! assert!(registry.register_type::<Vec3>(descriptor).is_err());
//! ```

use std::fmt;

use rustc_hash::FxHashMap;

use embedbridge_core::{
    NativeKey, NativeType, RegistrationError, TypeConstructor, TypeDescriptor, TypeHash,
};

/// Who releases a wrapped native object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ownership {
    /// Native code owns the object; the runtime holds a non-owning
    /// back-reference that the owner nulls before release.
    Native,
    /// The runtime's collector owns the object; native holders must
    /// tolerate the pointer going stale.
    Collector,
    /// No policy was declared at registration.
    #[default]
    Unspecified,
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ownership::Native => "native",
            Ownership::Collector => "collector",
            Ownership::Unspecified => "unspecified",
        })
    }
}

/// One registered native type (or constructor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRegistryEntry {
    pub key: NativeKey,
    pub descriptor: TypeDescriptor,
    pub ownership: Ownership,
}

/// Table of native type keys to runtime descriptors.
#[derive(Default)]
pub struct TypeRegistry {
    types: FxHashMap<TypeHash, TypeRegistryEntry>,
    parametric: FxHashMap<TypeHash, TypeRegistryEntry>,
}

fn insert_once(
    table: &mut FxHashMap<TypeHash, TypeRegistryEntry>,
    entry: TypeRegistryEntry,
) -> Result<(), RegistrationError> {
    if let Some(existing) = table.get(&entry.key.hash) {
        return Err(RegistrationError::AlreadyRegistered {
            type_name: entry.key.name.to_string(),
            existing: existing.descriptor.to_string(),
        });
    }
    table.insert(entry.key.hash, entry);
    Ok(())
}

fn lookup_in(
    table: &FxHashMap<TypeHash, TypeRegistryEntry>,
    key: NativeKey,
) -> Result<TypeDescriptor, RegistrationError> {
    table
        .get(&key.hash)
        .map(|entry| entry.descriptor)
        .ok_or_else(|| RegistrationError::NotRegistered {
            type_name: key.name.to_string(),
        })
}

impl TypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Concrete types
    // ==========================================================================

    /// Bind `key` to `descriptor` with no declared ownership.
    pub fn register(
        &mut self,
        key: NativeKey,
        descriptor: TypeDescriptor,
    ) -> Result<(), RegistrationError> {
        self.register_with_ownership(key, descriptor, Ownership::Unspecified)
    }

    /// Bind `key` to `descriptor`, recording who owns wrapped objects.
    ///
    /// Fails with `AlreadyRegistered` if `key` already has a descriptor.
    pub fn register_with_ownership(
        &mut self,
        key: NativeKey,
        descriptor: TypeDescriptor,
        ownership: Ownership,
    ) -> Result<(), RegistrationError> {
        insert_once(
            &mut self.types,
            TypeRegistryEntry {
                key,
                descriptor,
                ownership,
            },
        )?;
        log::debug!(
            "registered {} as {} (ownership: {})",
            key,
            descriptor,
            ownership
        );
        Ok(())
    }

    pub fn register_type<T: NativeType>(
        &mut self,
        descriptor: TypeDescriptor,
    ) -> Result<(), RegistrationError> {
        self.register(T::native_key(), descriptor)
    }

    /// Bind one instantiation of a parametric native type on its own.
    ///
    /// Resolution prefers this entry over applying the family constructor,
    /// for runtimes where each instantiation is a separately declared type.
    pub fn register_instance<T: NativeType>(
        &mut self,
        descriptor: TypeDescriptor,
    ) -> Result<(), RegistrationError> {
        self.register(T::instance_key(), descriptor)
    }

    /// The descriptor bound to `key`, or `NotRegistered`.
    pub fn lookup(&self, key: NativeKey) -> Result<TypeDescriptor, RegistrationError> {
        lookup_in(&self.types, key)
    }

    pub fn lookup_type<T: NativeType>(&self) -> Result<TypeDescriptor, RegistrationError> {
        self.lookup(T::native_key())
    }

    pub fn is_registered(&self, hash: TypeHash) -> bool {
        self.types.contains_key(&hash)
    }

    pub fn is_type_registered<T: NativeType>(&self) -> bool {
        self.is_registered(T::type_hash())
    }

    pub fn entry(&self, hash: TypeHash) -> Option<&TypeRegistryEntry> {
        self.types.get(&hash)
    }

    /// Ownership policy declared for a registered type.
    pub fn ownership(&self, hash: TypeHash) -> Option<Ownership> {
        self.types.get(&hash).map(|entry| entry.ownership)
    }

    // ==========================================================================
    // Parametric constructors
    // ==========================================================================

    /// Bind a constructor family to its runtime parametric type.
    pub fn register_parametric(
        &mut self,
        key: NativeKey,
        descriptor: TypeDescriptor,
    ) -> Result<(), RegistrationError> {
        insert_once(
            &mut self.parametric,
            TypeRegistryEntry {
                key,
                descriptor,
                ownership: Ownership::Unspecified,
            },
        )?;
        log::debug!("registered parametric {} as {}", key, descriptor);
        Ok(())
    }

    pub fn register_constructor<C: TypeConstructor>(
        &mut self,
        descriptor: TypeDescriptor,
    ) -> Result<(), RegistrationError> {
        self.register_parametric(C::constructor_key(), descriptor)
    }

    pub fn lookup_parametric(&self, key: NativeKey) -> Result<TypeDescriptor, RegistrationError> {
        lookup_in(&self.parametric, key)
    }

    pub fn lookup_constructor<C: TypeConstructor>(
        &self,
    ) -> Result<TypeDescriptor, RegistrationError> {
        self.lookup_parametric(C::constructor_key())
    }

    pub fn is_parametric_registered(&self, hash: TypeHash) -> bool {
        self.parametric.contains_key(&hash)
    }

    // ==========================================================================
    // Introspection
    // ==========================================================================

    /// All concrete type entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &TypeRegistryEntry> {
        self.types.values()
    }

    pub fn parametric_entries(&self) -> impl Iterator<Item = &TypeRegistryEntry> {
        self.parametric.values()
    }

    /// Number of concrete type entries.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.parametric.is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("type_count", &self.types.len())
            .field("parametric_count", &self.parametric.len())
            .finish()
    }
}
