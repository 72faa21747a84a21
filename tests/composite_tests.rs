//! Integration tests for wrapped native objects.
//!
//! Covers the full path for a registered composite: wrapping, the three
//! extraction modes, runtime type validation and deleted-object detection.
//! Parametric composites go through the same path with an applied type.

use embedbridge::{
    Bridge, BridgeError, ConversionError, EmbeddedRuntime, IdentityDict, LocalRuntime, NativeOwned,
    NativeType, Singleton, TypeConstructor, TypeDescriptor, TypeMapping, TypeRegistry, native_type,
    parametric,
};

#[derive(Debug, Clone, PartialEq)]
struct Vec3 {
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Shape {
    sides: u32,
}

#[derive(Debug)]
struct Circle;

native_type!(Vec3, Shape, Circle);

#[derive(Debug, Clone, PartialEq)]
struct Pair<A, B> {
    first: A,
    second: B,
}

struct PairFamily;
impl TypeConstructor for PairFamily {}

impl<A: NativeType, B: NativeType> NativeType for Pair<A, B> {
    fn mapping() -> TypeMapping {
        parametric::<PairFamily>(vec![A::mapping(), B::mapping()])
    }
}

struct Fixture {
    runtime: LocalRuntime,
    registry: TypeRegistry,
    vec3: TypeDescriptor,
}

impl Fixture {
    fn new() -> Self {
        let runtime = LocalRuntime::new();
        let mut registry = TypeRegistry::new();
        let vec3 = runtime.define_type("Vec3", None);
        let shape = runtime.define_type("Shape", None);
        let circle = runtime.define_type("Circle", Some(shape));
        let pair = runtime.define_type("Pair", None);
        registry.register_type::<Vec3>(vec3).unwrap();
        registry.register_type::<Shape>(shape).unwrap();
        registry.register_type::<Circle>(circle).unwrap();
        registry.register_constructor::<PairFamily>(pair).unwrap();
        Self {
            runtime,
            registry,
            vec3,
        }
    }

    fn bridge(&self) -> Bridge<'_> {
        Bridge::new(&self.runtime, &self.registry)
    }
}

// =============================================================================
// Wrapping scenario
// =============================================================================

#[test]
fn test_vec3_reference_aliases_native_instance() {
    let fixture = Fixture::new();
    let bridge = fixture.bridge();
    let mut v = Vec3 {
        x: 1.0,
        y: 2.0,
        z: 3.0,
    };
    let ptr: *mut Vec3 = &mut v;

    let handle = bridge.wrap_native(ptr).unwrap();
    let ty = fixture.runtime.runtime_type_of(handle).unwrap();
    assert_eq!(ty, fixture.vec3);

    // field 0 holds the native pointer
    let field = fixture.runtime.field_at(handle, 0).unwrap();
    let back = fixture.runtime.unbox_pointer(field).unwrap();
    assert_eq!(back, ptr.cast::<std::ffi::c_void>());

    let alias = unsafe { bridge.unbox_mut::<Vec3>(handle) }.unwrap();
    assert!(std::ptr::eq(alias, ptr));
    alias.y = 20.0;

    assert_eq!(
        v,
        Vec3 {
            x: 1.0,
            y: 20.0,
            z: 3.0
        }
    );
}

#[test]
fn test_value_extraction_copies() {
    let fixture = Fixture::new();
    let bridge = fixture.bridge();
    let mut owned = NativeOwned::new(
        bridge,
        Vec3 {
            x: 1.0,
            y: 2.0,
            z: 3.0,
        },
    )
    .unwrap();

    let handle = owned.value();
    let mut copy = unsafe { bridge.unbox_value::<Vec3>(handle) }.unwrap();
    copy.x = 100.0;
    assert_eq!(owned.get().x, 1.0);

    owned.get_mut().z = 30.0;
    let seen = unsafe { bridge.unbox_ref::<Vec3>(handle) }.unwrap();
    assert_eq!(seen.z, 30.0);
}

// =============================================================================
// Deleted objects
// =============================================================================

#[test]
fn test_invalidated_object_is_detected() {
    let fixture = Fixture::new();
    let bridge = fixture.bridge();
    let mut v = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    let handle = bridge.wrap_native(&mut v as *mut Vec3).unwrap();

    bridge.invalidate(handle).unwrap();

    assert!(bridge.unbox_ptr::<Vec3>(handle).unwrap().is_null());
    let by_ref = unsafe { bridge.unbox_ref::<Vec3>(handle) }.unwrap_err();
    let by_value = unsafe { bridge.unbox_value::<Vec3>(handle) }.unwrap_err();
    for err in [by_ref, by_value] {
        assert_eq!(
            err,
            BridgeError::Conversion(ConversionError::ObjectDeleted {
                type_name: Vec3::type_name().to_string()
            })
        );
    }
}

#[test]
fn test_owner_drop_invalidates() {
    let fixture = Fixture::new();
    let bridge = fixture.bridge();
    let owned = NativeOwned::new(bridge, Shape { sides: 4 }).unwrap();
    let handle = owned.value();
    let shape = unsafe { bridge.unbox_ref::<Shape>(handle) }.unwrap();
    assert_eq!(shape.sides, 4);

    drop(owned);
    let err = unsafe { bridge.unbox_mut::<Shape>(handle) }.unwrap_err();
    assert!(err.is_object_deleted());
    assert!(bridge.unbox_ptr::<Shape>(handle).unwrap().is_null());
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_unrelated_type_is_rejected() {
    let fixture = Fixture::new();
    let bridge = fixture.bridge();
    let mut v = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    let handle = bridge.wrap_native(&mut v as *mut Vec3).unwrap();

    let err = bridge.unbox_ptr::<Shape>(handle).unwrap_err();
    assert_eq!(
        err,
        BridgeError::Conversion(ConversionError::TypeMismatch {
            expected: "Shape".into(),
            actual: "Vec3".into(),
        })
    );

    // a boxed primitive is no composite either
    let number = bridge.box_value(3.0f64).unwrap();
    let err = unsafe { bridge.unbox_ref::<Vec3>(number) }.unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Conversion(ConversionError::TypeMismatch { .. })
    ));
}

#[test]
fn test_subtype_passes_validation() {
    let fixture = Fixture::new();
    let bridge = fixture.bridge();
    let mut circle = Circle;
    let handle = bridge.wrap_native(&mut circle as *mut Circle).unwrap();

    // a Circle wrapper is acceptable wherever a Shape is expected
    let shape = bridge.descriptor_of::<Shape>().unwrap();
    let actual = bridge.check_type(handle, shape).unwrap();
    assert_eq!(fixture.runtime.name_of(actual), "Circle");
}

#[test]
fn test_stale_handle_is_reported() {
    let fixture = Fixture::new();
    let bridge = fixture.bridge();
    let mut v = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    let handle = bridge.wrap_native(&mut v as *mut Vec3).unwrap();
    fixture.runtime.collect(handle);

    assert!(matches!(
        bridge.unbox_ptr::<Vec3>(handle),
        Err(BridgeError::Conversion(ConversionError::StaleValue { .. }))
    ));
    assert!(bridge.invalidate(handle).is_err());
}

// =============================================================================
// Parametric composites
// =============================================================================

#[test]
fn test_parametric_object_round_trip() {
    let fixture = Fixture::new();
    let bridge = fixture.bridge();
    let mut pair = Pair {
        first: 7i32,
        second: 0.5f64,
    };
    let ptr: *mut Pair<i32, f64> = &mut pair;

    let handle = bridge.wrap_native(ptr).unwrap();
    let ty = fixture.runtime.runtime_type_of(handle).unwrap();
    assert_eq!(fixture.runtime.name_of(ty), "Pair{Int32, Float64}");
    assert_eq!(bridge.unbox_ptr::<Pair<i32, f64>>(handle).unwrap(), ptr);

    let alias = unsafe { bridge.unbox_mut::<Pair<i32, f64>>(handle) }.unwrap();
    alias.second = 1.5;
    let copy = unsafe { bridge.unbox_value::<Pair<i32, f64>>(handle) }.unwrap();
    assert_eq!(
        copy,
        Pair {
            first: 7,
            second: 1.5
        }
    );
    assert_eq!(pair.second, 1.5);
}

#[test]
fn test_other_instantiation_is_rejected() {
    let fixture = Fixture::new();
    let bridge = fixture.bridge();
    let mut pair = Pair {
        first: 7i32,
        second: 0.5f64,
    };
    let ptr: *mut Pair<i32, f64> = &mut pair;
    let handle = bridge.wrap_native(ptr).unwrap();

    let err = bridge.unbox_ptr::<Pair<f64, i32>>(handle).unwrap_err();
    assert_eq!(
        err,
        BridgeError::Conversion(ConversionError::TypeMismatch {
            expected: "Pair{Float64, Int32}".into(),
            actual: "Pair{Int32, Float64}".into(),
        })
    );

    // an instantiation is not any one of its arguments either
    let err = unsafe { bridge.unbox_ref::<Vec3>(handle) }.unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Conversion(ConversionError::TypeMismatch { .. })
    ));
}

#[test]
fn test_parametric_of_composites() {
    let fixture = Fixture::new();
    let bridge = fixture.bridge();
    let mut pair = Pair {
        first: Shape { sides: 3 },
        second: Vec3 {
            x: 1.0,
            y: 0.0,
            z: 0.0,
        },
    };
    let ptr: *mut Pair<Shape, Vec3> = &mut pair;
    let handle = bridge.wrap_native(ptr).unwrap();

    let ty = fixture.runtime.runtime_type_of(handle).unwrap();
    assert_eq!(fixture.runtime.name_of(ty), "Pair{Shape, Vec3}");
    let seen = unsafe { bridge.unbox_ref::<Pair<Shape, Vec3>>(handle) }.unwrap();
    assert_eq!(seen.first.sides, 3);

    // Circle is a Shape, but Pair{Circle, Vec3} is a different instantiation
    let err = bridge.unbox_ptr::<Pair<Circle, Vec3>>(handle).unwrap_err();
    assert!(err.is_conversion());
}

// =============================================================================
// Same-named runtime types
// =============================================================================

struct PlanePoint;
struct SpacePoint;
native_type!(PlanePoint, SpacePoint);

#[test]
fn test_same_named_runtime_types_stay_apart() {
    let runtime = LocalRuntime::new();
    let mut registry = TypeRegistry::new();
    let plane_ty = runtime.define_type("Point", None);
    let space_ty = runtime.define_type("Point", None);
    registry.register_type::<PlanePoint>(plane_ty).unwrap();
    registry.register_type::<SpacePoint>(space_ty).unwrap();
    let bridge = Bridge::new(&runtime, &registry);

    let plane = bridge.descriptor_of::<Singleton<PlanePoint>>().unwrap();
    let space = bridge.descriptor_of::<Singleton<SpacePoint>>().unwrap();
    assert_ne!(plane, space);
    assert_eq!(runtime.name_of(plane), "Type{Point}");
    assert_eq!(runtime.name_of(space), "Type{Point}");
    assert!(!runtime.is_subtype_or_equal(plane, space));

    let mut point = PlanePoint;
    let handle = bridge.wrap_native(&mut point as *mut PlanePoint).unwrap();
    assert!(bridge.unbox_ptr::<PlanePoint>(handle).is_ok());
    let err = bridge.unbox_ptr::<SpacePoint>(handle).unwrap_err();
    assert_eq!(
        err,
        BridgeError::Conversion(ConversionError::TypeMismatch {
            expected: "Point".into(),
            actual: "Point".into(),
        })
    );
}

// =============================================================================
// Singletons and well-known types
// =============================================================================

#[test]
fn test_singleton_of_composite() {
    let fixture = Fixture::new();
    let bridge = fixture.bridge();

    let ty = bridge.descriptor_of::<Singleton<Vec3>>().unwrap();
    assert_eq!(fixture.runtime.name_of(ty), "Type{Vec3}");

    let boxed = bridge.box_value(Singleton::<Vec3>::new()).unwrap();
    assert_eq!(boxed, fixture.vec3.as_value());

    let nested = bridge.descriptor_of::<Singleton<Singleton<Vec3>>>().unwrap();
    assert_eq!(fixture.runtime.name_of(nested), "Type{Type{Vec3}}");
}

#[test]
fn test_identity_dict_resolves_from_globals() {
    let fixture = Fixture::new();
    let bridge = fixture.bridge();

    let ty = bridge.descriptor_of::<IdentityDict>().unwrap();
    assert_eq!(fixture.runtime.name_of(ty), "IdDict");
    assert!(
        fixture
            .registry
            .lookup(IdentityDict::native_key())
            .is_err()
    );
}
