//! Core types for embedbridge.
//!
//! This crate holds everything the registry and the conversion layer share:
//!
//! - [`TypeHash`] / [`NativeKey`]: identity keys for native types
//! - [`EmbeddedValue`] / [`TypeDescriptor`]: opaque runtime handles
//! - [`NativeType`]: the trait every marshalled type implements
//! - [`TypeMapping`]: the closed set of native-to-runtime mappings
//! - [`EmbeddedRuntime`]: the contract the host runtime fulfils
//! - [`BridgeError`]: registration and conversion errors

mod error;
mod handles;
mod mapping;
mod native_type;
pub mod runtime;
mod type_hash;

pub use error::{BridgeError, ConversionError, RegistrationError, Result};
pub use handles::{EmbeddedValue, TypeDescriptor};
pub use mapping::{BuiltinType, PrimitiveKind, Representation, TypeMapping};
pub use native_type::{NativeType, TypeConstructor, parametric};
pub use runtime::{EmbeddedRuntime, LocalRuntime};
pub use type_hash::{NativeKey, TypeHash, hash_constants};
