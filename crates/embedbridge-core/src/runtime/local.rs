//! In-process implementation of [`EmbeddedRuntime`].
//!
//! `LocalRuntime` models just enough of a dynamic-language runtime for the
//! bridge to run against: named types with single inheritance, parametric
//! instantiation, boxed primitives and strings, composites with fields, and
//! module globals. It is single threaded (interior `RefCell`s) and values
//! are only released through [`LocalRuntime::collect`].
//!
//! Type names are for lookup and diagnostics only. Two definitions may share
//! a name; the first one keeps the name binding, and instantiations are keyed
//! by descriptor so same-named types never collapse into one instance.

use std::cell::RefCell;
use std::ffi::c_void;

use rustc_hash::FxHashMap;

use super::EmbeddedRuntime;
use super::heap::{HeapValue, TypeInfo, ValueHeap};
use crate::{BuiltinType, ConversionError, EmbeddedValue, TypeDescriptor};

/// Module holding the runtime's standard bindings.
pub const BASE_MODULE: &str = "Base";

/// Single-threaded reference runtime.
pub struct LocalRuntime {
    heap: RefCell<ValueHeap>,
    types_by_name: RefCell<FxHashMap<String, TypeDescriptor>>,
    instances: RefCell<FxHashMap<(TypeDescriptor, Vec<TypeDescriptor>), TypeDescriptor>>,
    globals: RefCell<FxHashMap<(String, String), EmbeddedValue>>,
}

impl LocalRuntime {
    /// Create a runtime with every [`BuiltinType`] and `Base.IdDict` defined.
    pub fn new() -> Self {
        let runtime = Self {
            heap: RefCell::new(ValueHeap::new()),
            types_by_name: RefCell::new(FxHashMap::default()),
            instances: RefCell::new(FxHashMap::default()),
            globals: RefCell::new(FxHashMap::default()),
        };

        let any = runtime.insert_type(TypeInfo::new(BuiltinType::Any.name(), None));
        for builtin in BuiltinType::ALL {
            if builtin != BuiltinType::Any {
                runtime.define_type(builtin.name(), Some(any));
            }
        }

        let id_dict = runtime.define_type("IdDict", Some(any));
        runtime.set_global(BASE_MODULE, "IdDict", id_dict.as_value());
        runtime
    }

    fn allocate_type(&self, info: TypeInfo) -> TypeDescriptor {
        let handle = self.heap.borrow_mut().allocate(HeapValue::Type(info));
        TypeDescriptor::from_value_unchecked(handle)
    }

    fn insert_type(&self, info: TypeInfo) -> TypeDescriptor {
        let name = info.name.clone();
        let ty = self.allocate_type(info);
        let mut by_name = self.types_by_name.borrow_mut();
        if let Some(existing) = by_name.get(&name) {
            log::warn!("type name {name} stays bound to {existing}, not {ty}");
        } else {
            by_name.insert(name, ty);
        }
        ty
    }

    /// Define a named type. `supertype` defaults to `Any`.
    ///
    /// Always creates a new type. If `name` is taken, lookups by name keep
    /// returning the earlier definition.
    pub fn define_type(&self, name: &str, supertype: Option<TypeDescriptor>) -> TypeDescriptor {
        let supertype = supertype.or_else(|| self.type_descriptor_for(BuiltinType::Any.name()));
        self.insert_type(TypeInfo::new(name, supertype))
    }

    /// Descriptor of a built-in type.
    pub fn builtin(&self, builtin: BuiltinType) -> Option<TypeDescriptor> {
        self.type_descriptor_for(builtin.name())
    }

    /// Bind `module.name` to `value`.
    pub fn set_global(&self, module: &str, name: &str, value: EmbeddedValue) {
        self.globals
            .borrow_mut()
            .insert((module.to_string(), name.to_string()), value);
    }

    /// Release a value, as the collector would. Later uses of the handle
    /// observe a stale value.
    pub fn collect(&self, value: EmbeddedValue) -> bool {
        log::trace!("collecting {:?}", value);
        self.heap.borrow_mut().free(value)
    }

    /// Number of live values on the heap.
    pub fn live_count(&self) -> usize {
        self.heap.borrow().live_count()
    }

    fn type_info(&self, ty: TypeDescriptor) -> Option<TypeInfo> {
        match self.heap.borrow().get(ty.as_value()) {
            Some(HeapValue::Type(info)) => Some(info.clone()),
            _ => None,
        }
    }

    fn read<T>(&self, value: EmbeddedValue, f: impl FnOnce(&HeapValue) -> Option<T>) -> Option<T> {
        self.heap.borrow().get(value).and_then(f)
    }

    fn alloc(&self, value: HeapValue) -> EmbeddedValue {
        self.heap.borrow_mut().allocate(value)
    }

    fn required(&self, builtin: BuiltinType) -> Result<TypeDescriptor, ConversionError> {
        self.builtin(builtin).ok_or_else(|| ConversionError::MissingBuiltin {
            name: builtin.name().to_string(),
        })
    }
}

impl Default for LocalRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalRuntime")
            .field("heap", &*self.heap.borrow())
            .field("type_count", &self.types_by_name.borrow().len())
            .field("instance_count", &self.instances.borrow().len())
            .finish()
    }
}

impl EmbeddedRuntime for LocalRuntime {
    fn type_descriptor_for(&self, name: &str) -> Option<TypeDescriptor> {
        self.types_by_name.borrow().get(name).copied()
    }

    fn name_of(&self, ty: TypeDescriptor) -> String {
        match self.type_info(ty) {
            Some(info) => info.name,
            None => ty.to_string(),
        }
    }

    fn runtime_type_of(&self, value: EmbeddedValue) -> Result<TypeDescriptor, ConversionError> {
        let builtin = {
            let heap = self.heap.borrow();
            let Some(stored) = heap.get(value) else {
                return Err(ConversionError::StaleValue {
                    raw: value.as_raw(),
                });
            };
            match stored {
                HeapValue::Composite { ty, .. } => return Ok(*ty),
                HeapValue::Nothing => BuiltinType::Nothing,
                HeapValue::Float64(_) => BuiltinType::Float64,
                HeapValue::Int32(_) => BuiltinType::Int32,
                HeapValue::UInt32(_) => BuiltinType::UInt32,
                HeapValue::UInt64(_) => BuiltinType::UInt64,
                HeapValue::Pointer(_) => BuiltinType::VoidPointer,
                HeapValue::String(_) => BuiltinType::String,
                HeapValue::Type(_) => BuiltinType::DataType,
            }
        };
        self.required(builtin)
    }

    fn is_subtype_or_equal(&self, sub: TypeDescriptor, sup: TypeDescriptor) -> bool {
        let mut current = Some(sub);
        while let Some(ty) = current {
            if ty == sup {
                return true;
            }
            let Some(info) = self.type_info(ty) else {
                return false;
            };
            // an instantiation is more specific than its bare constructor
            if info.constructor == Some(sup) {
                return true;
            }
            current = info.supertype;
        }
        false
    }

    fn apply_type(
        &self,
        constructor: TypeDescriptor,
        params: &[TypeDescriptor],
    ) -> Option<TypeDescriptor> {
        let key = (constructor, params.to_vec());
        if let Some(existing) = self.instances.borrow().get(&key) {
            return Some(*existing);
        }

        let base = self.type_info(constructor)?;
        let names: Vec<String> = params.iter().map(|p| self.name_of(*p)).collect();
        let ty = self.allocate_type(TypeInfo {
            name: format!("{}{{{}}}", base.name, names.join(", ")),
            supertype: base.supertype,
            constructor: Some(constructor),
            params: params.to_vec(),
        });
        self.instances.borrow_mut().insert(key, ty);
        Some(ty)
    }

    fn global(&self, module: &str, name: &str) -> Option<EmbeddedValue> {
        self.globals
            .borrow()
            .get(&(module.to_string(), name.to_string()))
            .copied()
    }

    fn box_f64(&self, value: f64) -> EmbeddedValue {
        self.alloc(HeapValue::Float64(value))
    }

    fn box_i32(&self, value: i32) -> EmbeddedValue {
        self.alloc(HeapValue::Int32(value))
    }

    fn box_u32(&self, value: u32) -> EmbeddedValue {
        self.alloc(HeapValue::UInt32(value))
    }

    fn box_u64(&self, value: u64) -> EmbeddedValue {
        self.alloc(HeapValue::UInt64(value))
    }

    fn box_pointer(&self, ptr: *mut c_void) -> EmbeddedValue {
        self.alloc(HeapValue::Pointer(ptr))
    }

    fn box_string(&self, text: &str) -> EmbeddedValue {
        self.alloc(HeapValue::String(text.to_string()))
    }

    fn unbox_f64(&self, value: EmbeddedValue) -> Option<f64> {
        self.read(value, |v| match v {
            HeapValue::Float64(x) => Some(*x),
            _ => None,
        })
    }

    fn unbox_i32(&self, value: EmbeddedValue) -> Option<i32> {
        self.read(value, |v| match v {
            HeapValue::Int32(x) => Some(*x),
            _ => None,
        })
    }

    fn unbox_u32(&self, value: EmbeddedValue) -> Option<u32> {
        self.read(value, |v| match v {
            HeapValue::UInt32(x) => Some(*x),
            _ => None,
        })
    }

    fn unbox_u64(&self, value: EmbeddedValue) -> Option<u64> {
        self.read(value, |v| match v {
            HeapValue::UInt64(x) => Some(*x),
            _ => None,
        })
    }

    fn unbox_pointer(&self, value: EmbeddedValue) -> Option<*mut c_void> {
        self.read(value, |v| match v {
            HeapValue::Pointer(p) => Some(*p),
            _ => None,
        })
    }

    fn unbox_string(&self, value: EmbeddedValue) -> Option<String> {
        self.read(value, |v| match v {
            HeapValue::String(s) => Some(s.clone()),
            _ => None,
        })
    }

    fn field_at(&self, value: EmbeddedValue, index: usize) -> Option<EmbeddedValue> {
        self.read(value, |v| match v {
            HeapValue::Composite { fields, .. } => fields.get(index).copied(),
            _ => None,
        })
    }

    fn new_composite(&self, ty: TypeDescriptor, fields: &[EmbeddedValue]) -> EmbeddedValue {
        self.alloc(HeapValue::Composite {
            ty,
            fields: fields.to_vec(),
        })
    }

    fn set_field(
        &self,
        value: EmbeddedValue,
        index: usize,
        field: EmbeddedValue,
    ) -> Result<(), ConversionError> {
        let ty = self.runtime_type_of(value)?;
        let written = match self.heap.borrow_mut().get_mut(value) {
            Some(HeapValue::Composite { fields, .. }) if index < fields.len() => {
                fields[index] = field;
                true
            }
            _ => false,
        };
        if written {
            Ok(())
        } else {
            Err(ConversionError::MissingBackReference {
                actual: self.name_of(ty),
            })
        }
    }
}
