//! The process-wide registry instance.
//!
//! Registration code (usually generated) writes here once per type during
//! module initialisation; conversion code takes a read guard and hands the
//! registry to a `Bridge`.

use std::sync::{OnceLock, RwLock};

use embedbridge_core::{NativeType, RegistrationError, TypeConstructor, TypeDescriptor};

use crate::{Ownership, TypeRegistry};

static TYPE_REGISTRY: OnceLock<RwLock<TypeRegistry>> = OnceLock::new();

/// The process-wide registry, created empty on first use.
pub fn global() -> &'static RwLock<TypeRegistry> {
    TYPE_REGISTRY.get_or_init(|| RwLock::new(TypeRegistry::new()))
}

/// Register `T` in the process-wide registry.
pub fn register_global<T: NativeType>(descriptor: TypeDescriptor) -> Result<(), RegistrationError> {
    global().write()?.register_type::<T>(descriptor)
}

pub fn register_global_with_ownership<T: NativeType>(
    descriptor: TypeDescriptor,
    ownership: Ownership,
) -> Result<(), RegistrationError> {
    global()
        .write()?
        .register_with_ownership(T::native_key(), descriptor, ownership)
}

/// Register a parametric constructor in the process-wide registry.
pub fn register_global_constructor<C: TypeConstructor>(
    descriptor: TypeDescriptor,
) -> Result<(), RegistrationError> {
    global().write()?.register_constructor::<C>(descriptor)
}

/// Never fails; a poisoned lock reads as "not registered".
pub fn is_globally_registered<T: NativeType>() -> bool {
    global()
        .read()
        .map(|registry| registry.is_type_registered::<T>())
        .unwrap_or(false)
}
