//! The embedded runtime as seen by the bridge.
//!
//! The bridge treats the runtime as a service: a type table keyed by name,
//! primitive boxing, a subtype predicate and field access on composites.
//! [`EmbeddedRuntime`] is that contract. It is object safe, so the bridge
//! holds a `&dyn EmbeddedRuntime` and never becomes generic over the host.
//!
//! ## Key Types
//!
//! - [`EmbeddedRuntime`]: capabilities the host environment provides
//! - [`LocalRuntime`]: single-threaded in-process implementation
//! - [`ValueHeap`]: generational value storage behind `LocalRuntime`

mod heap;
mod local;

use std::ffi::c_void;

pub use heap::{HeapValue, TypeInfo, ValueHeap};
pub use local::{BASE_MODULE, LocalRuntime};

use crate::{ConversionError, EmbeddedValue, TypeDescriptor};

/// Capabilities the embedded runtime exposes to the bridge.
///
/// Implementations decide their own threading rules; the bridge performs
/// no synchronisation of its own around these calls.
pub trait EmbeddedRuntime {
    // === Type system ===

    /// Look up a type by its runtime name.
    fn type_descriptor_for(&self, name: &str) -> Option<TypeDescriptor>;

    /// The runtime name of a type, for diagnostics.
    fn name_of(&self, ty: TypeDescriptor) -> String;

    /// The runtime type of a value.
    fn runtime_type_of(&self, value: EmbeddedValue) -> Result<TypeDescriptor, ConversionError>;

    /// True when `sub` is `sup` or more specific than it.
    fn is_subtype_or_equal(&self, sub: TypeDescriptor, sup: TypeDescriptor) -> bool;

    /// Instantiate a parametric type with concrete parameters.
    ///
    /// Repeated calls with the same constructor and parameters return the
    /// same descriptor. Parameters are compared by descriptor, not by name.
    fn apply_type(
        &self,
        constructor: TypeDescriptor,
        params: &[TypeDescriptor],
    ) -> Option<TypeDescriptor>;

    /// Resolve a global binding in a runtime module.
    fn global(&self, module: &str, name: &str) -> Option<EmbeddedValue>;

    // === Primitive boxing ===

    fn box_f64(&self, value: f64) -> EmbeddedValue;
    fn box_i32(&self, value: i32) -> EmbeddedValue;
    fn box_u32(&self, value: u32) -> EmbeddedValue;
    fn box_u64(&self, value: u64) -> EmbeddedValue;
    fn box_pointer(&self, ptr: *mut c_void) -> EmbeddedValue;
    /// Copy `text` into a freshly allocated runtime byte string.
    fn box_string(&self, text: &str) -> EmbeddedValue;

    // === Primitive unboxing (None when the value has another kind) ===

    fn unbox_f64(&self, value: EmbeddedValue) -> Option<f64>;
    fn unbox_i32(&self, value: EmbeddedValue) -> Option<i32>;
    fn unbox_u32(&self, value: EmbeddedValue) -> Option<u32>;
    fn unbox_u64(&self, value: EmbeddedValue) -> Option<u64>;
    fn unbox_pointer(&self, value: EmbeddedValue) -> Option<*mut c_void>;
    fn unbox_string(&self, value: EmbeddedValue) -> Option<String>;

    // === Composites ===

    /// Field `index` of a boxed composite.
    fn field_at(&self, value: EmbeddedValue, index: usize) -> Option<EmbeddedValue>;

    /// Allocate a composite of type `ty` holding `fields`.
    fn new_composite(&self, ty: TypeDescriptor, fields: &[EmbeddedValue]) -> EmbeddedValue;

    /// Overwrite field `index` of a boxed composite.
    fn set_field(
        &self,
        value: EmbeddedValue,
        index: usize,
        field: EmbeddedValue,
    ) -> Result<(), ConversionError>;
}
