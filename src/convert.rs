//! Conversion traits for boxing native values and unboxing runtime values.
//!
//! This module provides the two directions of the static type map:
//! - [`IntoEmbedded`]: Convert a native value into an [`EmbeddedValue`]
//! - [`FromEmbedded`]: Extract a native value from an [`EmbeddedValue`]
//!
//! ## Supported Types
//!
//! - Primitives: `f64`, `i32`, `u32`, `u64` (boxed by value)
//! - Text: `String` and `&str` (boxed as runtime strings)
//! - `*mut c_void` (boxed as a runtime pointer)
//! - [`EmbeddedValue`] and [`TypeDescriptor`] (passed through unchanged)
//! - [`Singleton`] and [`IdentityDict`]
//!
//! Every [`IntoEmbedded`] impl also names the [`Representation`] its boxed
//! value has. `Bridge::box_value` traces it and, in debug builds, checks the
//! runtime agrees.
//!
//! Composite user types are deliberately absent: they cross as wrapped
//! pointers through `Bridge::wrap_native` and the `unbox_*` functions.
//! Boxing or unboxing a type with no conversion is a compile error.

use std::ffi::c_void;

use embedbridge_core::{
    ConversionError, EmbeddedValue, NativeType, Representation, Result, TypeDescriptor,
};

use crate::bridge::Bridge;
use crate::singleton::{IdentityDict, Singleton};

/// Convert a native value into a runtime value.
pub trait IntoEmbedded {
    /// How the boxed value is stored on the runtime side.
    fn representation() -> Representation;

    fn into_embedded(self, bridge: &Bridge<'_>) -> Result<EmbeddedValue>;
}

/// Extract a native value from a runtime value.
pub trait FromEmbedded: Sized {
    /// Returns `TypeMismatch` (or `NotAString` for text) when the value's
    /// runtime type does not carry this native type.
    fn from_embedded(bridge: &Bridge<'_>, value: EmbeddedValue) -> Result<Self>;
}

// ============================================================================
// Primitive implementations
// ============================================================================

macro_rules! impl_primitive {
    ($($ty:ty => $boxer:ident, $unboxer:ident);* $(;)?) => {
        $(
            impl IntoEmbedded for $ty {
                fn representation() -> Representation {
                    <$ty>::mapping().representation()
                }

                fn into_embedded(self, bridge: &Bridge<'_>) -> Result<EmbeddedValue> {
                    Ok(bridge.runtime().$boxer(self))
                }
            }

            impl FromEmbedded for $ty {
                fn from_embedded(bridge: &Bridge<'_>, value: EmbeddedValue) -> Result<Self> {
                    bridge
                        .runtime()
                        .$unboxer(value)
                        .ok_or_else(|| bridge.mismatch(&<$ty>::mapping(), value))
                }
            }
        )*
    };
}

impl_primitive! {
    f64 => box_f64, unbox_f64;
    i32 => box_i32, unbox_i32;
    u32 => box_u32, unbox_u32;
    u64 => box_u64, unbox_u64;
    *mut c_void => box_pointer, unbox_pointer;
}

// ============================================================================
// Strings
// ============================================================================

impl IntoEmbedded for &str {
    fn representation() -> Representation {
        String::mapping().representation()
    }

    fn into_embedded(self, bridge: &Bridge<'_>) -> Result<EmbeddedValue> {
        Ok(bridge.runtime().box_string(self))
    }
}

impl IntoEmbedded for String {
    fn representation() -> Representation {
        String::mapping().representation()
    }

    fn into_embedded(self, bridge: &Bridge<'_>) -> Result<EmbeddedValue> {
        self.as_str().into_embedded(bridge)
    }
}

impl IntoEmbedded for &String {
    fn representation() -> Representation {
        String::mapping().representation()
    }

    fn into_embedded(self, bridge: &Bridge<'_>) -> Result<EmbeddedValue> {
        self.as_str().into_embedded(bridge)
    }
}

impl FromEmbedded for String {
    fn from_embedded(bridge: &Bridge<'_>, value: EmbeddedValue) -> Result<Self> {
        if let Some(text) = bridge.runtime().unbox_string(value) {
            return Ok(text);
        }
        let actual = bridge.type_name_of(value)?;
        Err(ConversionError::NotAString { actual }.into())
    }
}

// ============================================================================
// Pass-through handles
// ============================================================================

impl IntoEmbedded for EmbeddedValue {
    fn representation() -> Representation {
        EmbeddedValue::mapping().representation()
    }

    fn into_embedded(self, _bridge: &Bridge<'_>) -> Result<EmbeddedValue> {
        Ok(self)
    }
}

impl FromEmbedded for EmbeddedValue {
    fn from_embedded(_bridge: &Bridge<'_>, value: EmbeddedValue) -> Result<Self> {
        Ok(value)
    }
}

impl IntoEmbedded for TypeDescriptor {
    fn representation() -> Representation {
        TypeDescriptor::mapping().representation()
    }

    fn into_embedded(self, _bridge: &Bridge<'_>) -> Result<EmbeddedValue> {
        Ok(self.as_value())
    }
}

// Descriptors are reinterpreted without a runtime check.
impl FromEmbedded for TypeDescriptor {
    fn from_embedded(_bridge: &Bridge<'_>, value: EmbeddedValue) -> Result<Self> {
        Ok(TypeDescriptor::from_value_unchecked(value))
    }
}

// ============================================================================
// Singletons and well-known types
// ============================================================================

/// The only value of `Type{T}` is `T` itself.
impl<T: NativeType> IntoEmbedded for Singleton<T> {
    fn representation() -> Representation {
        Self::mapping().representation()
    }

    fn into_embedded(self, bridge: &Bridge<'_>) -> Result<EmbeddedValue> {
        Ok(bridge.descriptor_of::<T>()?.as_value())
    }
}

/// A singleton carries no data, so the value is not inspected.
impl<T: NativeType> FromEmbedded for Singleton<T> {
    fn from_embedded(_bridge: &Bridge<'_>, _value: EmbeddedValue) -> Result<Self> {
        Ok(Singleton::new())
    }
}

impl FromEmbedded for IdentityDict {
    fn from_embedded(bridge: &Bridge<'_>, value: EmbeddedValue) -> Result<Self> {
        let expected = bridge.descriptor_of::<IdentityDict>()?;
        bridge.check_type(value, expected)?;
        Ok(IdentityDict)
    }
}
