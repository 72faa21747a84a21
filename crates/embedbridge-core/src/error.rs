//! Error types for registration and conversion.
//!
//! ## Error Hierarchy
//!
//! ```text
//! BridgeError (top-level wrapper)
//! ├── RegistrationError - registry lookups and exactly-once registration
//! └── ConversionError   - type map resolution, box and unbox failures
//! ```
//!
//! Every error is raised at the point of detection and returned to the
//! immediate caller. Nothing here is transient, so nothing is retried.

use thiserror::Error;

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised by the type registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// No descriptor has been registered for the native type.
    #[error("type {type_name} has no registered runtime type")]
    NotRegistered {
        /// Diagnostic name of the native type.
        type_name: String,
    },

    /// The native type already has a descriptor.
    #[error("type {type_name} was already registered as {existing}")]
    AlreadyRegistered {
        /// Diagnostic name of the native type.
        type_name: String,
        /// Name (or raw handle when no name is known) of the descriptor
        /// already bound to the type.
        existing: String,
    },

    /// Registration named a runtime type the runtime does not define.
    #[error("runtime has no type named {name}")]
    UnknownRuntimeType {
        /// The runtime-side name that was looked up.
        name: String,
    },

    /// The process-wide registry lock was poisoned by a panic.
    #[error("type registry lock poisoned")]
    Poisoned,
}

// ============================================================================
// Conversion Errors
// ============================================================================

/// Errors raised while mapping, boxing or unboxing a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Neither a built-in nor a registered mapping exists for the type.
    #[error("type {type_name} has no runtime type mapping")]
    UnmappedType { type_name: String },

    /// The wrapped native object was released by its owner.
    #[error("native object of type {type_name} was deleted")]
    ObjectDeleted { type_name: String },

    /// A string was requested from a value that is not a byte string.
    #[error("value of type {actual} to convert to string is not a string")]
    NotAString { actual: String },

    /// The value's runtime type is neither the expected type nor a subtype.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Field 0 of a wrapped composite is missing or not a pointer.
    #[error("value of type {actual} does not carry a native back-reference")]
    MissingBackReference { actual: String },

    /// The handle refers to a value the runtime has already collected.
    #[error("stale value handle {raw:#x}")]
    StaleValue { raw: u64 },

    /// The runtime does not provide a type the bridge relies on.
    #[error("runtime does not provide built-in type {name}")]
    MissingBuiltin { name: String },
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// The unified error type for all bridge operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl BridgeError {
    pub fn is_registration(&self) -> bool {
        matches!(self, BridgeError::Registration(_))
    }

    pub fn is_conversion(&self) -> bool {
        matches!(self, BridgeError::Conversion(_))
    }

    /// True when the error reports a released native object.
    pub fn is_object_deleted(&self) -> bool {
        matches!(
            self,
            BridgeError::Conversion(ConversionError::ObjectDeleted { .. })
        )
    }
}

impl<T> From<std::sync::PoisonError<T>> for RegistrationError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        RegistrationError::Poisoned
    }
}

impl<T> From<std::sync::PoisonError<T>> for BridgeError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        BridgeError::Registration(RegistrationError::Poisoned)
    }
}

/// Result alias used throughout the bridge.
pub type Result<T> = std::result::Result<T, BridgeError>;
