//! embedbridge type registry.
//!
//! Maps native types, and parametric native type constructors, to the
//! runtime descriptors the conversion layer validates against.

mod global;
mod registry;

pub use global::{
    global, is_globally_registered, register_global, register_global_constructor,
    register_global_with_ownership,
};
pub use registry::{Ownership, TypeRegistry, TypeRegistryEntry};
