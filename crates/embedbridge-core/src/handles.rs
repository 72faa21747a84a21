//! Opaque handles into the embedded runtime.
//!
//! The bridge never owns or frees runtime memory. Both handles are plain
//! copyable words whose meaning belongs to the [`EmbeddedRuntime`]
//! implementation (a pointer for a C runtime, a packed slot index for
//! [`LocalRuntime`]).
//!
//! A type descriptor is itself a runtime value, so a [`TypeDescriptor`]
//! converts losslessly to an [`EmbeddedValue`] with the same raw word.
//!
//! [`EmbeddedRuntime`]: crate::EmbeddedRuntime
//! [`LocalRuntime`]: crate::LocalRuntime

use std::fmt;
use std::num::NonZeroU64;

/// Handle to a value on the embedded runtime's managed heap.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EmbeddedValue(NonZeroU64);

impl EmbeddedValue {
    /// Wrap a raw runtime word. Returns `None` for the null word.
    #[inline]
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for EmbeddedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EmbeddedValue({:#x})", self.0.get())
    }
}

/// Handle to a type living in the embedded runtime.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TypeDescriptor(NonZeroU64);

impl TypeDescriptor {
    #[inline]
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0.get()
    }

    /// View this descriptor as the runtime value it is.
    #[inline]
    pub const fn as_value(self) -> EmbeddedValue {
        EmbeddedValue(self.0)
    }

    /// Reinterpret a runtime value as a type descriptor.
    ///
    /// No check is made that the value really is a type; callers that need
    /// one ask the runtime for the value's type first.
    #[inline]
    pub const fn from_value_unchecked(value: EmbeddedValue) -> Self {
        Self(value.0)
    }
}

impl From<TypeDescriptor> for EmbeddedValue {
    fn from(descriptor: TypeDescriptor) -> Self {
        descriptor.as_value()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({:#x})", self.0.get())
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}
