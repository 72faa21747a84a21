//! Marker types with no native payload.

use std::fmt;
use std::marker::PhantomData;

use embedbridge_core::runtime::BASE_MODULE;
use embedbridge_core::{NativeType, TypeMapping};

/// The singleton type whose only instance is the type `T` itself.
///
/// Resolves to the runtime's `Type{T}` without registering anything
/// beyond `T`.
pub struct Singleton<T>(PhantomData<fn() -> T>);

impl<T> Singleton<T> {
    pub const fn new() -> Self {
        Singleton(PhantomData)
    }
}

impl<T> Default for Singleton<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Singleton<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Singleton<T> {}

impl<T> fmt::Debug for Singleton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Singleton<{}>", std::any::type_name::<T>())
    }
}

impl<T: NativeType> NativeType for Singleton<T> {
    fn mapping() -> TypeMapping {
        TypeMapping::singleton(T::mapping())
    }
}

/// The runtime's identity-keyed dictionary, `Base.IdDict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdentityDict;

impl NativeType for IdentityDict {
    fn mapping() -> TypeMapping {
        TypeMapping::WellKnown {
            module: BASE_MODULE,
            name: "IdDict",
        }
    }
}
