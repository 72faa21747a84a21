//! The closed set of native-to-runtime type mappings.
//!
//! Each native type resolves to exactly one [`TypeMapping`]. The tag decides
//! both how a value is stored on the runtime side ([`Representation`]) and
//! where its descriptor comes from:
//!
//! | Mapping | Descriptor source | Representation |
//! |---------|-------------------|----------------|
//! | `Primitive` | runtime built-in by name | the primitive itself |
//! | `String` | built-in `Any` | boxed value |
//! | `Pointer` | built-in `Ptr{Cvoid}` | boxed value |
//! | `Descriptor` | built-in `DataType` | descriptor |
//! | `BoxedAny` | built-in `Any` | boxed value |
//! | `WellKnown` | runtime global lookup | boxed value |
//! | `Composite` | type registry | boxed value |
//! | `Parametric` | parametric registry, applied to the arguments | boxed value |
//! | `Singleton` | `Type` applied to the inner descriptor | descriptor |
//!
//! [`TypeMapping::type_hash`] gives every mapping a structural key. The
//! registry stores explicitly registered parametric instantiations under it.

use std::fmt;

use crate::{NativeKey, TypeHash};

/// Primitive kinds the runtime boxes natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Void,
    Float64,
    Int32,
    UInt32,
    UInt64,
}

impl PrimitiveKind {
    /// The runtime built-in this primitive maps to.
    pub const fn builtin(self) -> BuiltinType {
        match self {
            PrimitiveKind::Void => BuiltinType::Nothing,
            PrimitiveKind::Float64 => BuiltinType::Float64,
            PrimitiveKind::Int32 => BuiltinType::Int32,
            PrimitiveKind::UInt32 => BuiltinType::UInt32,
            PrimitiveKind::UInt64 => BuiltinType::UInt64,
        }
    }

    pub const fn representation(self) -> Representation {
        match self {
            PrimitiveKind::Void => Representation::Void,
            PrimitiveKind::Float64 => Representation::Float64,
            PrimitiveKind::Int32 => Representation::Int32,
            PrimitiveKind::UInt32 => Representation::UInt32,
            PrimitiveKind::UInt64 => Representation::UInt64,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.builtin().name())
    }
}

/// Runtime types the bridge looks up by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Any,
    Nothing,
    Float64,
    Int32,
    UInt32,
    UInt64,
    VoidPointer,
    String,
    DataType,
    /// The type-of-a-type constructor, `Type{T}`.
    Type,
}

impl BuiltinType {
    pub const ALL: [BuiltinType; 10] = [
        BuiltinType::Any,
        BuiltinType::Nothing,
        BuiltinType::Float64,
        BuiltinType::Int32,
        BuiltinType::UInt32,
        BuiltinType::UInt64,
        BuiltinType::VoidPointer,
        BuiltinType::String,
        BuiltinType::DataType,
        BuiltinType::Type,
    ];

    /// Name passed to `EmbeddedRuntime::type_descriptor_for`.
    pub const fn name(self) -> &'static str {
        match self {
            BuiltinType::Any => "Any",
            BuiltinType::Nothing => "Nothing",
            BuiltinType::Float64 => "Float64",
            BuiltinType::Int32 => "Int32",
            BuiltinType::UInt32 => "UInt32",
            BuiltinType::UInt64 => "UInt64",
            BuiltinType::VoidPointer => "Ptr{Cvoid}",
            BuiltinType::String => "String",
            BuiltinType::DataType => "DataType",
            BuiltinType::Type => "Type",
        }
    }
}

/// How a mapped value is stored on the runtime side.
///
/// Boxing picks the runtime call from this: a primitive boxes to its own
/// kind, a descriptor is passed through as a value, and everything else
/// travels as a generic boxed handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    Void,
    Float64,
    Int32,
    UInt32,
    UInt64,
    /// A generic handle to any boxed runtime value.
    BoxedAny,
    /// A type descriptor handle.
    Descriptor,
}

impl Representation {
    /// The runtime type every value stored this way has, if there is one.
    pub const fn builtin(self) -> Option<BuiltinType> {
        match self {
            Representation::Void => Some(BuiltinType::Nothing),
            Representation::Float64 => Some(BuiltinType::Float64),
            Representation::Int32 => Some(BuiltinType::Int32),
            Representation::UInt32 => Some(BuiltinType::UInt32),
            Representation::UInt64 => Some(BuiltinType::UInt64),
            Representation::Descriptor => Some(BuiltinType::DataType),
            Representation::BoxedAny => None,
        }
    }
}

/// Mapping from one native type to its runtime counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeMapping {
    Primitive(PrimitiveKind),
    String,
    Pointer,
    Descriptor,
    BoxedAny,
    /// A runtime-provided type found through a global symbol lookup.
    WellKnown {
        module: &'static str,
        name: &'static str,
    },
    /// A user type registered in the type registry.
    Composite(NativeKey),
    /// One instantiation of a registered parametric constructor.
    Parametric {
        constructor: NativeKey,
        args: Vec<TypeMapping>,
    },
    /// The runtime's "type of a type" applied to the inner mapping.
    Singleton(Box<TypeMapping>),
}

impl TypeMapping {
    pub fn singleton(inner: TypeMapping) -> Self {
        TypeMapping::Singleton(Box::new(inner))
    }

    pub fn representation(&self) -> Representation {
        match self {
            TypeMapping::Primitive(kind) => kind.representation(),
            TypeMapping::Descriptor | TypeMapping::Singleton(_) => Representation::Descriptor,
            TypeMapping::String
            | TypeMapping::Pointer
            | TypeMapping::BoxedAny
            | TypeMapping::WellKnown { .. }
            | TypeMapping::Composite(_)
            | TypeMapping::Parametric { .. } => Representation::BoxedAny,
        }
    }

    /// Structural key for this mapping.
    ///
    /// Composites keep their native key. Parametric instances and
    /// singletons fold their arguments' keys in order, so
    /// `Pair{Int32, Float64}` and `Pair{Float64, Int32}` differ. Every
    /// other tag is keyed by its runtime name.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            TypeMapping::Composite(key) => key.hash,
            TypeMapping::Parametric { constructor, args } => {
                let args: Vec<TypeHash> = args.iter().map(TypeMapping::type_hash).collect();
                TypeHash::from_parametric_instance(constructor.hash, &args)
            }
            TypeMapping::Singleton(inner) => TypeHash::from_parametric_instance(
                TypeHash::from_name(BuiltinType::Type.name()),
                &[inner.type_hash()],
            ),
            _ => TypeHash::from_name(&self.to_string()),
        }
    }

    /// The built-in descriptor for this mapping, if it has one.
    pub fn builtin(&self) -> Option<BuiltinType> {
        match self {
            TypeMapping::Primitive(kind) => Some(kind.builtin()),
            TypeMapping::String | TypeMapping::BoxedAny => Some(BuiltinType::Any),
            TypeMapping::Pointer => Some(BuiltinType::VoidPointer),
            TypeMapping::Descriptor => Some(BuiltinType::DataType),
            _ => None,
        }
    }

    /// True when resolution never consults the type registry.
    pub fn is_identity(&self) -> bool {
        matches!(
            self,
            TypeMapping::Primitive(_)
                | TypeMapping::Pointer
                | TypeMapping::Descriptor
                | TypeMapping::BoxedAny
        )
    }

    /// True when resolution reads the type registry somewhere.
    pub fn needs_registry(&self) -> bool {
        match self {
            TypeMapping::Composite(_) | TypeMapping::Parametric { .. } => true,
            TypeMapping::Singleton(inner) => inner.needs_registry(),
            _ => false,
        }
    }
}

impl fmt::Display for TypeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeMapping::Primitive(kind) => write!(f, "{}", kind),
            TypeMapping::String => f.write_str("String"),
            TypeMapping::Pointer => f.write_str("Ptr{Cvoid}"),
            TypeMapping::Descriptor => f.write_str("DataType"),
            TypeMapping::BoxedAny => f.write_str("Any"),
            TypeMapping::WellKnown { module, name } => write!(f, "{}.{}", module, name),
            TypeMapping::Composite(key) => write!(f, "{}", key),
            TypeMapping::Parametric { constructor, args } => {
                write!(f, "{}{{", constructor)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str("}")
            }
            TypeMapping::Singleton(inner) => write!(f, "Type{{{}}}", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composite() -> TypeMapping {
        TypeMapping::Composite(NativeKey::new(TypeHash(1), "Vec3"))
    }

    #[test]
    fn primitive_representations() {
        let float = TypeMapping::Primitive(PrimitiveKind::Float64);
        let wide = TypeMapping::Primitive(PrimitiveKind::UInt64);
        assert_eq!(float.representation(), Representation::Float64);
        assert_eq!(wide.representation(), Representation::UInt64);
        assert_eq!(
            TypeMapping::String.representation(),
            Representation::BoxedAny
        );
        assert_eq!(
            TypeMapping::Descriptor.representation(),
            Representation::Descriptor
        );
    }

    #[test]
    fn only_boxed_any_is_untyped() {
        assert_eq!(Representation::BoxedAny.builtin(), None);
        assert_eq!(
            Representation::Descriptor.builtin(),
            Some(BuiltinType::DataType)
        );
        assert_eq!(Representation::UInt32.builtin(), Some(BuiltinType::UInt32));
    }

    #[test]
    fn singleton_is_a_descriptor() {
        let mapping = TypeMapping::singleton(composite());
        assert_eq!(mapping.representation(), Representation::Descriptor);
        assert!(mapping.needs_registry());
        assert!(!mapping.is_identity());
        assert_eq!(mapping.to_string(), "Type{Vec3}");
    }

    #[test]
    fn identity_mappings_skip_registry() {
        for mapping in [
            TypeMapping::Primitive(PrimitiveKind::Int32),
            TypeMapping::Pointer,
            TypeMapping::Descriptor,
            TypeMapping::BoxedAny,
        ] {
            assert!(mapping.is_identity());
            assert!(!mapping.needs_registry());
            assert!(mapping.builtin().is_some());
        }
    }

    #[test]
    fn string_validates_through_any() {
        assert!(!TypeMapping::String.is_identity());
        assert!(!TypeMapping::String.needs_registry());
        assert_eq!(TypeMapping::String.builtin(), Some(BuiltinType::Any));
    }

    #[test]
    fn parametric_display() {
        let mapping = TypeMapping::Parametric {
            constructor: NativeKey::new(TypeHash(2), "Pair"),
            args: vec![TypeMapping::Primitive(PrimitiveKind::Int32), composite()],
        };
        assert_eq!(mapping.to_string(), "Pair{Int32, Vec3}");
        assert!(mapping.needs_registry());
    }

    #[test]
    fn structural_keys() {
        let int = TypeMapping::Primitive(PrimitiveKind::Int32);
        let float = TypeMapping::Primitive(PrimitiveKind::Float64);
        let pair = NativeKey::new(TypeHash(2), "Pair");
        let instance = |args: Vec<TypeMapping>| TypeMapping::Parametric {
            constructor: pair,
            args,
        };

        assert_eq!(composite().type_hash(), TypeHash(1));
        assert_eq!(int.type_hash(), TypeHash::from_name("Int32"));
        let string = TypeMapping::String.type_hash();
        assert_ne!(string, TypeMapping::BoxedAny.type_hash());

        let int_float = instance(vec![int.clone(), float.clone()]);
        let float_int = instance(vec![float, int]);
        assert_eq!(int_float.type_hash(), int_float.clone().type_hash());
        assert_ne!(int_float.type_hash(), float_int.type_hash());
        assert_ne!(int_float.type_hash(), pair.hash);

        let singleton = TypeMapping::singleton(composite());
        let nested = TypeMapping::singleton(singleton.clone());
        assert_ne!(singleton.type_hash(), composite().type_hash());
        assert_ne!(singleton.type_hash(), nested.type_hash());
    }

    #[test]
    fn builtin_names_are_unique() {
        use std::collections::HashSet;
        let names: HashSet<_> = BuiltinType::ALL.iter().map(|b| b.name()).collect();
        assert_eq!(names.len(), BuiltinType::ALL.len());
    }
}
