//! The `NativeType` trait for types that cross the bridge.
//!
//! Every Rust type passed to or from the embedded runtime implements
//! [`NativeType`]. It supplies the identity key and the [`TypeMapping`]
//! the static type map uses. The defaults describe a user composite: keyed
//! by `TypeId`, named by `std::any::type_name`, resolved through the
//! registry. Built-in types override `mapping`.
//!
//! # Example
//!
//! ```
//! use embedbridge_core::{NativeType, TypeMapping, native_type};
//!
//! struct Vec3 {
//!     x: f64,
//!     y: f64,
//!     z: f64,
//! }
//!
//! native_type!(Vec3);
//!
//! assert!(matches!(Vec3::mapping(), TypeMapping::Composite(_)));
//! ```
//!
//! Parametric native types name a [`TypeConstructor`] marker and list
//! their arguments:
//!
//! ```
//! use std::marker::PhantomData;
//! use embedbridge_core::{NativeType, TypeConstructor, TypeMapping, parametric};
//!
//! struct Pair<A, B>(PhantomData<(A, B)>);
//! struct PairFamily;
//! impl TypeConstructor for PairFamily {}
//!
//! impl<A: NativeType, B: NativeType> NativeType for Pair<A, B> {
//!     fn mapping() -> TypeMapping {
//!         parametric::<PairFamily>(vec![A::mapping(), B::mapping()])
//!     }
//! }
//!
//! assert_eq!(
//!     <Pair<i32, f64>>::mapping().to_string(),
//!     format!("{}{{Int32, Float64}}", std::any::type_name::<PairFamily>()),
//! );
//! ```

use std::ffi::c_void;

use crate::{EmbeddedValue, NativeKey, PrimitiveKind, TypeDescriptor, TypeHash, TypeMapping};

/// A native type with a runtime-side counterpart.
pub trait NativeType: 'static {
    /// Stable identity key for this type.
    fn type_hash() -> TypeHash {
        TypeHash::of::<Self>()
    }

    /// Name used in diagnostics.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    fn native_key() -> NativeKey {
        NativeKey::new(Self::type_hash(), Self::type_name())
    }

    /// How this type maps onto the runtime.
    fn mapping() -> TypeMapping {
        TypeMapping::Composite(Self::native_key())
    }

    /// Key of this type's mapping, named after the type.
    ///
    /// Equal to [`native_key`](NativeType::native_key) for composites. For
    /// a parametric instance it identifies the instantiation, so
    /// `Pair<i32, f64>` can be registered apart from its family.
    fn instance_key() -> NativeKey {
        NativeKey::new(Self::mapping().type_hash(), Self::type_name())
    }
}

/// Zero-sized stand-in for a parametric native type constructor.
///
/// The registry's parametric table is keyed by the marker, so every
/// instantiation of the family shares one runtime parametric type.
pub trait TypeConstructor: 'static {
    fn constructor_key() -> NativeKey {
        NativeKey::of::<Self>()
    }
}

/// Mapping for one instantiation of the constructor `C`.
pub fn parametric<C: TypeConstructor>(args: Vec<TypeMapping>) -> TypeMapping {
    TypeMapping::Parametric {
        constructor: C::constructor_key(),
        args,
    }
}

/// Implement [`NativeType`] for user composites with the default mapping.
#[macro_export]
macro_rules! native_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::NativeType for $ty {}
        )+
    };
}

macro_rules! impl_builtin {
    ($($ty:ty => $mapping:expr),* $(,)?) => {
        $(
            impl NativeType for $ty {
                fn mapping() -> TypeMapping {
                    $mapping
                }
            }
        )*
    };
}

impl_builtin! {
    () => TypeMapping::Primitive(PrimitiveKind::Void),
    f64 => TypeMapping::Primitive(PrimitiveKind::Float64),
    i32 => TypeMapping::Primitive(PrimitiveKind::Int32),
    u32 => TypeMapping::Primitive(PrimitiveKind::UInt32),
    u64 => TypeMapping::Primitive(PrimitiveKind::UInt64),
    String => TypeMapping::String,
    *mut c_void => TypeMapping::Pointer,
    TypeDescriptor => TypeMapping::Descriptor,
    EmbeddedValue => TypeMapping::BoxedAny,
}
