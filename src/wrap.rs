//! Wrapping native objects for the runtime.
//!
//! The runtime side of a wrapped object is a composite of the type
//! registered for `T` whose field 0 boxes a pointer to the native object.
//! The pointer is non-owning: whoever owns the object nulls it through
//! [`Bridge::invalidate`] before releasing the object, and later
//! extractions report `ObjectDeleted`.
//!
//! [`NativeOwned`] packages that protocol for objects the native side
//! owns.

use std::ffi::c_void;
use std::fmt;
use std::ptr::{self, NonNull};

use embedbridge_core::{EmbeddedValue, NativeType, Result};

use crate::bridge::Bridge;

impl<'a> Bridge<'a> {
    /// Create the runtime wrapper for `object`.
    ///
    /// Fails with `UnmappedType` when `T` was never registered.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn wrap_native<T: NativeType>(&self, object: *mut T) -> Result<EmbeddedValue> {
        let ty = self.descriptor_of::<T>()?;
        let runtime = self.runtime();
        let back_reference = runtime.box_pointer(object.cast::<c_void>());
        log::trace!("wrapping {} at {:p}", T::type_name(), object);
        Ok(runtime.new_composite(ty, &[back_reference]))
    }

    /// Null the back-reference of a wrapped object.
    pub fn invalidate(&self, value: EmbeddedValue) -> Result<()> {
        let runtime = self.runtime();
        let null = runtime.box_pointer(ptr::null_mut());
        runtime.set_field(value, 0, null)?;
        log::debug!("invalidated native back-reference of {:?}", value);
        Ok(())
    }
}

/// A native object owned on the native side and visible to the runtime.
///
/// Dropping it invalidates the runtime wrapper before the object is freed.
pub struct NativeOwned<'a, T: NativeType> {
    bridge: Bridge<'a>,
    object: NonNull<T>,
    value: EmbeddedValue,
}

impl<'a, T: NativeType> NativeOwned<'a, T> {
    pub fn new(bridge: Bridge<'a>, object: T) -> Result<Self> {
        let object = NonNull::from(Box::leak(Box::new(object)));
        match bridge.wrap_native(object.as_ptr()) {
            Ok(value) => Ok(Self { bridge, object, value }),
            Err(err) => {
                // SAFETY: leaked just above and never shared
                drop(unsafe { Box::from_raw(object.as_ptr()) });
                Err(err)
            }
        }
    }

    /// The runtime wrapper.
    pub fn value(&self) -> EmbeddedValue {
        self.value
    }

    pub fn as_ptr(&self) -> *mut T {
        self.object.as_ptr()
    }

    pub fn get(&self) -> &T {
        // SAFETY: the allocation lives until drop
        unsafe { self.object.as_ref() }
    }

    pub fn get_mut(&mut self) -> &mut T {
        // SAFETY: the allocation lives until drop
        unsafe { self.object.as_mut() }
    }
}

impl<T: NativeType> Drop for NativeOwned<'_, T> {
    fn drop(&mut self) {
        if let Err(err) = self.bridge.invalidate(self.value) {
            log::warn!("could not invalidate {:?}: {}", self.value, err);
        }
        // SAFETY: allocated in `new`; the runtime no longer points at it
        drop(unsafe { Box::from_raw(self.object.as_ptr()) });
    }
}

impl<T: NativeType + fmt::Debug> fmt::Debug for NativeOwned<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeOwned")
            .field("object", self.get())
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use embedbridge_core::{
        BridgeError, ConversionError, EmbeddedRuntime, LocalRuntime, native_type,
    };
    use embedbridge_registry::TypeRegistry;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Sample(u64);
    struct Unknown;
    native_type!(Sample, Unknown);

    #[test]
    fn wrapped_value_has_registered_type() {
        let runtime = LocalRuntime::new();
        let mut registry = TypeRegistry::new();
        let ty = runtime.define_type("Sample", None);
        registry.register_type::<Sample>(ty).unwrap();
        let bridge = Bridge::new(&runtime, &registry);

        let mut sample = Sample(1);
        let value = bridge.wrap_native(&mut sample as *mut Sample).unwrap();
        assert_eq!(runtime.runtime_type_of(value).unwrap(), ty);
        assert_eq!(
            bridge.unbox_ptr::<Sample>(value).unwrap(),
            &mut sample as *mut Sample
        );
    }

    #[test]
    fn wrapping_unregistered_type_fails() {
        let runtime = LocalRuntime::new();
        let registry = TypeRegistry::new();
        let bridge = Bridge::new(&runtime, &registry);

        let mut unknown = Unknown;
        let err = bridge
            .wrap_native(&mut unknown as *mut Unknown)
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Conversion(ConversionError::UnmappedType { .. })
        ));
        assert!(NativeOwned::new(bridge, Unknown).is_err());
    }

    #[test]
    fn dropping_the_owner_invalidates() {
        let runtime = LocalRuntime::new();
        let mut registry = TypeRegistry::new();
        registry
            .register_type::<Sample>(runtime.define_type("Sample", None))
            .unwrap();
        let bridge = Bridge::new(&runtime, &registry);

        let mut owned = NativeOwned::new(bridge, Sample(3)).unwrap();
        let value = owned.value();
        owned.get_mut().0 = 4;
        assert_eq!(
            unsafe { bridge.unbox_value::<Sample>(value) }.unwrap(),
            Sample(4)
        );

        drop(owned);
        assert!(bridge.unbox_ptr::<Sample>(value).unwrap().is_null());
        assert!(unsafe { bridge.unbox_ref::<Sample>(value) }
            .unwrap_err()
            .is_object_deleted());
    }
}
