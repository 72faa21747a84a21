//! Stable identity keys for native types.
//!
//! Every native type taking part in marshalling is identified by a
//! [`TypeHash`]. Concrete Rust types derive theirs from [`std::any::TypeId`],
//! so two distinct types never share a key even when they share a name.
//! Names (runtime type names, parametric constructor names) hash through
//! XXHash64 with a domain constant so a name key never collides with a
//! `TypeId` key by construction of the mixing.
//!
//! [`NativeKey`] pairs a hash with a diagnostic name so registry and
//! conversion errors can say *which* native type failed.
//!
//! # Examples
//!
//! ```
//! use embedbridge_core::TypeHash;
//!
//! assert_eq!(TypeHash::of::<f64>(), TypeHash::of::<f64>());
//! assert_ne!(TypeHash::of::<f64>(), TypeHash::of::<u64>());
//!
//! let pair = TypeHash::from_name("Pair");
//! let a = TypeHash::from_parametric_instance(pair, &[TypeHash::of::<i32>(), TypeHash::of::<f64>()]);
//! let b = TypeHash::from_parametric_instance(pair, &[TypeHash::of::<f64>(), TypeHash::of::<i32>()]);
//! assert_ne!(a, b);
//! ```

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant used when folding argument hashes.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for name-derived hashes.
    pub const NAME: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for `TypeId`-derived hashes.
    pub const NATIVE: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for parametric instances.
    pub const PARAMETRIC: u64 = 0x9a7f3d5e2b8c4601;

    /// Argument position mixing constants. Each position gets its own
    /// constant so argument order changes the result.
    pub const ARG_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

/// A deterministic 64-bit key identifying a native type or type constructor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Key for a concrete Rust type.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::of_type_id(TypeId::of::<T>())
    }

    /// Key for an existing `TypeId`.
    #[inline]
    pub fn of_type_id(type_id: TypeId) -> Self {
        let mut hasher = rustc_hash::FxHasher::default();
        type_id.hash(&mut hasher);
        TypeHash(hash_constants::NATIVE ^ hasher.finish())
    }

    /// Key derived from a name.
    ///
    /// The same name always produces the same hash, across processes.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::NAME ^ xxh64(name.as_bytes(), 0))
    }

    /// Key for one instantiation of a parametric constructor.
    ///
    /// Argument order matters: `Pair{Int32, Float64}` and
    /// `Pair{Float64, Int32}` are different instances.
    #[inline]
    pub fn from_parametric_instance(constructor: TypeHash, args: &[TypeHash]) -> Self {
        let mut hash = hash_constants::PARAMETRIC ^ constructor.0;
        for (i, arg) in args.iter().enumerate() {
            let marker = hash_constants::ARG_MARKERS
                .get(i)
                .copied()
                .unwrap_or_else(|| hash_constants::ARG_MARKERS[0].wrapping_add(i as u64));
            // wrapping_mul keeps the fold non-commutative
            hash = hash
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(marker ^ arg.0);
        }
        TypeHash(hash)
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// A native type key together with its diagnostic name.
///
/// Equality and hashing only consider the hash; the name is for messages.
#[derive(Clone, Copy, Debug)]
pub struct NativeKey {
    pub hash: TypeHash,
    pub name: &'static str,
}

impl NativeKey {
    pub const fn new(hash: TypeHash, name: &'static str) -> Self {
        Self { hash, name }
    }

    /// Key for a concrete Rust type, named by `std::any::type_name`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeHash::of::<T>(), std::any::type_name::<T>())
    }
}

impl PartialEq for NativeKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for NativeKey {}

impl Hash for NativeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Display for NativeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
