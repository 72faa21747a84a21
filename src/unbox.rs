//! Extraction of wrapped native objects.
//!
//! A wrapped object is a runtime composite whose first field is a boxed
//! pointer back to the native object. Every extraction mode runs the same
//! steps: resolve the descriptor registered for `T`, check the value's
//! runtime type against it, then read the back-reference. The modes only
//! differ in how a null back-reference is treated.
//!
//! | Mode           | Returns      | Null back-reference |
//! |----------------|--------------|---------------------|
//! | `unbox_ptr`    | `*mut T`     | returned as null    |
//! | `unbox_ref`    | `&T`         | `ObjectDeleted`     |
//! | `unbox_mut`    | `&mut T`     | `ObjectDeleted`     |
//! | `unbox_value`  | `T` (cloned) | `ObjectDeleted`     |

use std::ptr::NonNull;

use embedbridge_core::{ConversionError, EmbeddedValue, NativeType, Result};

use crate::bridge::Bridge;

impl<'a> Bridge<'a> {
    fn back_reference<T: NativeType>(&self, value: EmbeddedValue) -> Result<*mut T> {
        let expected = self.descriptor_of::<T>()?;
        let actual = self.check_type(value, expected)?;

        let runtime = self.runtime();
        runtime
            .field_at(value, 0)
            .and_then(|field| runtime.unbox_pointer(field))
            .map(|ptr| ptr.cast::<T>())
            .ok_or_else(|| {
                ConversionError::MissingBackReference {
                    actual: runtime.name_of(actual),
                }
                .into()
            })
    }

    fn live_object<T: NativeType>(&self, value: EmbeddedValue) -> Result<NonNull<T>> {
        let ptr = self.back_reference::<T>(value)?;
        NonNull::new(ptr).ok_or_else(|| {
            log::warn!("{:?} refers to a deleted {}", value, T::type_name());
            ConversionError::ObjectDeleted {
                type_name: T::type_name().to_string(),
            }
            .into()
        })
    }

    /// The native pointer behind a wrapped object.
    ///
    /// A null pointer is a valid result here: pointer extraction is how
    /// callers observe that the native side released the object.
    ///
    /// `T` must implement [`NativeType`] so its registered descriptor can
    /// be found:
    ///
    /// ```compile_fail,E0277
    /// use embedbridge::{Bridge, LocalRuntime, TypeRegistry};
    ///
    /// struct Plain;
    ///
    /// let runtime = LocalRuntime::new();
    /// let registry = TypeRegistry::new();
    /// let bridge = Bridge::new(&runtime, &registry);
    /// let value = bridge.box_value(1.0f64).unwrap();
    /// let _ = bridge.unbox_ptr::<Plain>(value);
    /// ```
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn unbox_ptr<T: NativeType>(&self, value: EmbeddedValue) -> Result<*mut T> {
        self.back_reference::<T>(value)
    }

    /// Borrow the native object behind a wrapped value.
    ///
    /// # Safety
    ///
    /// The back-reference must point to a live `T` for all of `'r`, and no
    /// mutable reference to it may exist for that time. The bridge can only
    /// detect objects whose owner nulled the back-reference on release.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub unsafe fn unbox_ref<'r, T: NativeType>(&self, value: EmbeddedValue) -> Result<&'r T> {
        let ptr = self.live_object::<T>(value)?;
        // SAFETY: non-null, and liveness plus aliasing are the caller's contract
        Ok(unsafe { ptr.as_ref() })
    }

    /// Mutably borrow the native object behind a wrapped value.
    ///
    /// Writes through the returned reference are visible to the native
    /// owner.
    ///
    /// # Safety
    ///
    /// As [`Bridge::unbox_ref`], and no other reference to the object may
    /// exist for `'r`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub unsafe fn unbox_mut<'r, T: NativeType>(&self, value: EmbeddedValue) -> Result<&'r mut T> {
        let mut ptr = self.live_object::<T>(value)?;
        // SAFETY: non-null, and liveness plus exclusivity are the caller's contract
        Ok(unsafe { ptr.as_mut() })
    }

    /// Copy the native object behind a wrapped value.
    ///
    /// # Safety
    ///
    /// The back-reference must point to a live `T` while it is cloned.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub unsafe fn unbox_value<T: NativeType + Clone>(&self, value: EmbeddedValue) -> Result<T> {
        let ptr = self.live_object::<T>(value)?;
        // SAFETY: non-null, and liveness is the caller's contract
        Ok(unsafe { ptr.as_ref() }.clone())
    }
}

#[cfg(test)]
mod tests {
    use embedbridge_core::{BridgeError, EmbeddedRuntime, LocalRuntime, native_type};
    use embedbridge_registry::TypeRegistry;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        hits: u32,
    }

    struct Other;
    native_type!(Counter, Other);

    fn setup() -> (LocalRuntime, TypeRegistry) {
        let runtime = LocalRuntime::new();
        let mut registry = TypeRegistry::new();
        let counter = runtime.define_type("Counter", None);
        let other = runtime.define_type("Other", None);
        registry.register_type::<Counter>(counter).unwrap();
        registry.register_type::<Other>(other).unwrap();
        (runtime, registry)
    }

    fn wrap(runtime: &LocalRuntime, registry: &TypeRegistry, ptr: *mut Counter) -> EmbeddedValue {
        let ty = registry.lookup_type::<Counter>().unwrap();
        let field = runtime.box_pointer(ptr.cast());
        runtime.new_composite(ty, &[field])
    }

    #[test]
    fn all_modes_reach_the_same_object() {
        let (runtime, registry) = setup();
        let bridge = Bridge::new(&runtime, &registry);
        let mut counter = Counter { hits: 1 };
        let ptr: *mut Counter = &mut counter;
        let value = wrap(&runtime, &registry, ptr);

        assert_eq!(bridge.unbox_ptr::<Counter>(value).unwrap(), ptr);
        unsafe {
            bridge.unbox_mut::<Counter>(value).unwrap().hits = 5;
            assert_eq!(bridge.unbox_ref::<Counter>(value).unwrap().hits, 5);
            assert_eq!(
                bridge.unbox_value::<Counter>(value).unwrap(),
                Counter { hits: 5 }
            );
        }
        assert_eq!(counter.hits, 5);
    }

    #[test]
    fn null_back_reference() {
        let (runtime, registry) = setup();
        let bridge = Bridge::new(&runtime, &registry);
        let value = wrap(&runtime, &registry, std::ptr::null_mut());

        assert!(bridge.unbox_ptr::<Counter>(value).unwrap().is_null());
        let err = unsafe { bridge.unbox_ref::<Counter>(value) }.unwrap_err();
        assert!(err.is_object_deleted());
        let err = unsafe { bridge.unbox_value::<Counter>(value) }.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("native object of type {} was deleted", Counter::type_name())
        );
    }

    #[test]
    fn wrong_type_is_rejected_before_the_pointer_is_read() {
        let (runtime, registry) = setup();
        let bridge = Bridge::new(&runtime, &registry);
        let value = wrap(&runtime, &registry, std::ptr::null_mut());

        let err = bridge.unbox_ptr::<Other>(value).unwrap_err();
        assert_eq!(
            err,
            BridgeError::Conversion(ConversionError::TypeMismatch {
                expected: "Other".into(),
                actual: "Counter".into(),
            })
        );
    }

    #[test]
    fn composite_without_back_reference() {
        let (runtime, registry) = setup();
        let bridge = Bridge::new(&runtime, &registry);
        let ty = registry.lookup_type::<Counter>().unwrap();
        let empty = runtime.new_composite(ty, &[]);

        assert_eq!(
            bridge.unbox_ptr::<Counter>(empty),
            Err(ConversionError::MissingBackReference {
                actual: "Counter".into()
            }
            .into())
        );
    }
}
