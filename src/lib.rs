//! Type mapping and value marshalling between native Rust types and an
//! embedded dynamic runtime.
//!
//! ```
//! use embedbridge::{Bridge, LocalRuntime, TypeRegistry, native_type};
//!
//! struct Vec3 {
//!     x: f64,
//! }
//! native_type!(Vec3);
//!
//! let runtime = LocalRuntime::new();
//! let mut registry = TypeRegistry::new();
//! registry.register_type::<Vec3>(runtime.define_type("Vec3", None))?;
//!
//! let bridge = Bridge::new(&runtime, &registry);
//! let boxed = bridge.box_value(1.5f64)?;
//! assert_eq!(bridge.unbox::<f64>(boxed)?, 1.5);
//!
//! let mut v = Vec3 { x: 0.0 };
//! let handle = bridge.wrap_native(&mut v as *mut Vec3)?;
//! unsafe { bridge.unbox_mut::<Vec3>(handle)? }.x = 2.0;
//! assert_eq!(v.x, 2.0);
//! # Ok::<(), embedbridge::BridgeError>(())
//! ```

mod bridge;
mod convert;
mod singleton;
mod unbox;
mod wrap;

pub use bridge::{Bridge, Registrar};
pub use convert::{FromEmbedded, IntoEmbedded};
pub use singleton::{IdentityDict, Singleton};
pub use wrap::NativeOwned;

pub use embedbridge_core::runtime::{self, BASE_MODULE};
pub use embedbridge_core::{
    BridgeError, BuiltinType, ConversionError, EmbeddedRuntime, EmbeddedValue, LocalRuntime,
    NativeKey, NativeType, PrimitiveKind, RegistrationError, Representation, Result,
    TypeConstructor, TypeDescriptor, TypeHash, TypeMapping, native_type, parametric,
};
pub use embedbridge_registry::{
    Ownership, TypeRegistry, TypeRegistryEntry, global, is_globally_registered, register_global,
    register_global_constructor, register_global_with_ownership,
};
