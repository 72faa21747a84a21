//! The per-call conversion context and static type map resolution.
//!
//! A [`Bridge`] borrows the runtime and a registry and is otherwise
//! stateless, so it is `Copy` and cheap to create for every call. All
//! conversions go through it:
//!
//! - [`Bridge::resolve`] turns a [`TypeMapping`] into a runtime descriptor
//! - [`Bridge::box_value`] / [`Bridge::unbox`] convert built-in values
//! - `unbox_ptr`, `unbox_ref`, `unbox_mut`, `unbox_value` extract wrapped
//!   native objects (see the `unbox` module)
//!
//! [`Registrar`] is the registration-side counterpart: it writes the
//! registry and renders conflicting descriptors by their runtime names.

use std::fmt;

use embedbridge_core::{
    BridgeError, BuiltinType, ConversionError, EmbeddedRuntime, EmbeddedValue, NativeKey,
    NativeType, RegistrationError, Representation, Result, TypeConstructor, TypeDescriptor,
    TypeMapping,
};
use embedbridge_registry::{Ownership, TypeRegistry};

use crate::convert::{FromEmbedded, IntoEmbedded};

/// Conversion context: a runtime plus the registry to validate against.
#[derive(Clone, Copy)]
pub struct Bridge<'a> {
    runtime: &'a dyn EmbeddedRuntime,
    registry: &'a TypeRegistry,
}

impl<'a> Bridge<'a> {
    pub fn new(runtime: &'a dyn EmbeddedRuntime, registry: &'a TypeRegistry) -> Self {
        Self { runtime, registry }
    }

    pub fn runtime(&self) -> &'a dyn EmbeddedRuntime {
        self.runtime
    }

    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    // ==========================================================================
    // Static type map
    // ==========================================================================

    /// Descriptor of a runtime built-in, looked up by name.
    pub fn builtin(&self, builtin: BuiltinType) -> Result<TypeDescriptor> {
        let name = builtin.name();
        self.runtime.type_descriptor_for(name).ok_or_else(|| {
            ConversionError::MissingBuiltin {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Runtime descriptor for the native type `T`.
    pub fn descriptor_of<T: NativeType>(&self) -> Result<TypeDescriptor> {
        self.resolve(&T::mapping())
    }

    /// Resolve a mapping to its runtime descriptor.
    ///
    /// Identity mappings resolve from runtime built-ins alone. Composites
    /// and parametric instances read the registry; a missing entry is
    /// reported as `UnmappedType` naming the native type. An instantiation
    /// registered on its own wins over applying its family constructor.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve(&self, mapping: &TypeMapping) -> Result<TypeDescriptor> {
        log::trace!("resolving {}", mapping);

        if let Some(builtin) = mapping.builtin() {
            return self.builtin(builtin);
        }

        match mapping {
            TypeMapping::WellKnown { module, name } => self
                .runtime
                .global(module, name)
                .map(TypeDescriptor::from_value_unchecked)
                .ok_or_else(|| unmapped(mapping)),
            TypeMapping::Composite(key) => self
                .registry
                .lookup(*key)
                .map_err(|_| unmapped(mapping)),
            TypeMapping::Parametric { constructor, args } => {
                if let Some(entry) = self.registry.entry(mapping.type_hash()) {
                    return Ok(entry.descriptor);
                }
                let family = self
                    .registry
                    .lookup_parametric(*constructor)
                    .map_err(|_| unmapped(mapping))?;
                let params = args
                    .iter()
                    .map(|arg| self.resolve(arg))
                    .collect::<Result<Vec<_>>>()?;
                self.runtime
                    .apply_type(family, &params)
                    .ok_or_else(|| unmapped(mapping))
            }
            TypeMapping::Singleton(inner) => {
                let type_of_type = self.builtin(BuiltinType::Type)?;
                let inner = self.resolve(inner)?;
                self.runtime
                    .apply_type(type_of_type, &[inner])
                    .ok_or_else(|| unmapped(mapping))
            }
            // every remaining tag carries a built-in
            _ => Err(unmapped(mapping)),
        }
    }

    // ==========================================================================
    // Validation
    // ==========================================================================

    /// Check that `value` is an instance of `expected` or of a subtype.
    ///
    /// Returns the value's actual runtime type.
    pub fn check_type(
        &self,
        value: EmbeddedValue,
        expected: TypeDescriptor,
    ) -> Result<TypeDescriptor> {
        let actual = self.runtime.runtime_type_of(value)?;
        if self.runtime.is_subtype_or_equal(actual, expected) {
            Ok(actual)
        } else {
            Err(ConversionError::TypeMismatch {
                expected: self.runtime.name_of(expected),
                actual: self.runtime.name_of(actual),
            }
            .into())
        }
    }

    /// Runtime type name of a value, for diagnostics.
    pub fn type_name_of(&self, value: EmbeddedValue) -> Result<String> {
        let ty = self.runtime.runtime_type_of(value)?;
        Ok(self.runtime.name_of(ty))
    }

    /// True when `value` is stored the way `representation` says.
    ///
    /// `BoxedAny` accepts every value. The other representations need the
    /// value's runtime type to be their built-in exactly.
    pub fn has_representation(
        &self,
        value: EmbeddedValue,
        representation: Representation,
    ) -> Result<bool> {
        let Some(builtin) = representation.builtin() else {
            return Ok(true);
        };
        let actual = self.runtime.runtime_type_of(value)?;
        Ok(actual == self.builtin(builtin)?)
    }

    /// Mismatch error for a primitive unbox of the wrong kind.
    pub(crate) fn mismatch(&self, expected: &TypeMapping, value: EmbeddedValue) -> BridgeError {
        match self.type_name_of(value) {
            Ok(actual) => ConversionError::TypeMismatch {
                expected: expected.to_string(),
                actual,
            }
            .into(),
            Err(err) => err,
        }
    }

    // ==========================================================================
    // Conversion entry points
    // ==========================================================================

    /// Convert a native value into a runtime value.
    ///
    /// Only types with an [`IntoEmbedded`] impl can be boxed. Composites
    /// cross through [`Bridge::wrap_native`] instead:
    ///
    /// ```compile_fail,E0277
    /// use embedbridge::{Bridge, LocalRuntime, TypeRegistry, native_type};
    ///
    /// struct Vec3 {
    ///     x: f64,
    /// }
    /// native_type!(Vec3);
    ///
    /// let runtime = LocalRuntime::new();
    /// let registry = TypeRegistry::new();
    /// let bridge = Bridge::new(&runtime, &registry);
    /// let _ = bridge.box_value(Vec3 { x: 1.0 });
    /// ```
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn box_value<T: IntoEmbedded>(&self, value: T) -> Result<EmbeddedValue> {
        let representation = T::representation();
        let type_name = std::any::type_name::<T>();
        log::trace!("boxing {} as {:?}", type_name, representation);
        let boxed = value.into_embedded(self)?;
        debug_assert!(
            self.has_representation(boxed, representation)
                .unwrap_or(true),
            "{} boxed to a value not stored as {:?}",
            type_name,
            representation
        );
        Ok(boxed)
    }

    /// Convert a runtime value into the native type `T`.
    ///
    /// Composites are read with the `unbox_*` extraction functions, never
    /// through this entry point:
    ///
    /// ```compile_fail,E0277
    /// use embedbridge::{Bridge, LocalRuntime, TypeRegistry, native_type};
    ///
    /// #[derive(Clone)]
    /// struct Vec3;
    /// native_type!(Vec3);
    ///
    /// let runtime = LocalRuntime::new();
    /// let registry = TypeRegistry::new();
    /// let bridge = Bridge::new(&runtime, &registry);
    /// let value = bridge.box_value(1.0f64).unwrap();
    /// let _ = bridge.unbox::<Vec3>(value);
    /// ```
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn unbox<T: FromEmbedded>(&self, value: EmbeddedValue) -> Result<T> {
        log::trace!("unboxing {:?} as {}", value, std::any::type_name::<T>());
        T::from_embedded(self, value)
    }
}

impl fmt::Debug for Bridge<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("registry", self.registry)
            .finish_non_exhaustive()
    }
}

fn unmapped(mapping: &TypeMapping) -> BridgeError {
    ConversionError::UnmappedType {
        type_name: mapping.to_string(),
    }
    .into()
}

/// Registration front end that reports conflicts by runtime type name.
pub struct Registrar<'a> {
    runtime: &'a dyn EmbeddedRuntime,
    registry: &'a mut TypeRegistry,
}

impl<'a> Registrar<'a> {
    pub fn new(runtime: &'a dyn EmbeddedRuntime, registry: &'a mut TypeRegistry) -> Self {
        Self { runtime, registry }
    }

    pub fn register<T: NativeType>(&mut self, descriptor: TypeDescriptor) -> Result<()> {
        self.register_with_ownership::<T>(descriptor, Ownership::Unspecified)
    }

    pub fn register_with_ownership<T: NativeType>(
        &mut self,
        descriptor: TypeDescriptor,
        ownership: Ownership,
    ) -> Result<()> {
        let key = T::native_key();
        let result = self
            .registry
            .register_with_ownership(key, descriptor, ownership);
        let existing = self.registry.lookup(key).ok();
        self.named(result, existing)
    }

    /// Register `T` against the runtime type called `runtime_name`.
    pub fn register_named<T: NativeType>(
        &mut self,
        runtime_name: &str,
    ) -> Result<TypeDescriptor> {
        let descriptor = self
            .runtime
            .type_descriptor_for(runtime_name)
            .ok_or_else(|| RegistrationError::UnknownRuntimeType {
                name: runtime_name.to_string(),
            })?;
        self.register::<T>(descriptor)?;
        Ok(descriptor)
    }

    /// Register one instantiation of a parametric `T` on its own.
    pub fn register_instance<T: NativeType>(&mut self, descriptor: TypeDescriptor) -> Result<()> {
        let key = T::instance_key();
        let result = self.registry.register(key, descriptor);
        let existing = self.registry.lookup(key).ok();
        self.named(result, existing)
    }

    pub fn register_constructor<C: TypeConstructor>(
        &mut self,
        descriptor: TypeDescriptor,
    ) -> Result<()> {
        let key: NativeKey = C::constructor_key();
        let result = self.registry.register_parametric(key, descriptor);
        let existing = self.registry.lookup_parametric(key).ok();
        self.named(result, existing)
    }

    fn named(
        &self,
        result: std::result::Result<(), RegistrationError>,
        existing: Option<TypeDescriptor>,
    ) -> Result<()> {
        match (result, existing) {
            (Err(RegistrationError::AlreadyRegistered { type_name, .. }), Some(existing)) => {
                Err(RegistrationError::AlreadyRegistered {
                    type_name,
                    existing: self.runtime.name_of(existing),
                }
                .into())
            }
            (result, _) => result.map_err(Into::into),
        }
    }
}
