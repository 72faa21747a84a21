//! Generational value storage for [`LocalRuntime`](super::LocalRuntime).

use std::ffi::c_void;
use std::fmt;

use crate::{EmbeddedValue, TypeDescriptor};

/// A value stored on the local heap.
#[derive(Debug, Clone, PartialEq)]
pub enum HeapValue {
    Nothing,
    Float64(f64),
    Int32(i32),
    UInt32(u32),
    UInt64(u64),
    Pointer(*mut c_void),
    String(String),
    Type(TypeInfo),
    Composite {
        ty: TypeDescriptor,
        fields: Vec<EmbeddedValue>,
    },
}

/// A runtime type stored on the heap.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub name: String,
    pub supertype: Option<TypeDescriptor>,
    /// Parametric constructor this type instantiates, if any.
    pub constructor: Option<TypeDescriptor>,
    pub params: Vec<TypeDescriptor>,
}

impl TypeInfo {
    pub fn new(name: impl Into<String>, supertype: Option<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            supertype,
            constructor: None,
            params: Vec::new(),
        }
    }
}

/// Heap storage with generational handles.
///
/// Handles pack `(generation << 32) | (index + 1)` so the raw word is never
/// zero. When a value is collected its slot is reused with the next
/// generation, so old handles stop resolving instead of aliasing.
pub struct ValueHeap {
    slots: Vec<HeapSlot>,
    free_list: Vec<u32>,
}

struct HeapSlot {
    generation: u32,
    value: Option<HeapValue>,
}

fn pack(index: u32, generation: u32) -> EmbeddedValue {
    let raw = ((generation as u64) << 32) | (index as u64 + 1);
    match EmbeddedValue::from_raw(raw) {
        Some(handle) => handle,
        None => unreachable!("packed handle always has a nonzero index part"),
    }
}

fn unpack(handle: EmbeddedValue) -> (usize, u32) {
    let raw = handle.as_raw();
    let index = (raw & 0xffff_ffff) as usize;
    (index.wrapping_sub(1), (raw >> 32) as u32)
}

impl ValueHeap {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Store a value and return its handle.
    pub fn allocate(&mut self, value: HeapValue) -> EmbeddedValue {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            pack(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(HeapSlot {
                generation: 0,
                value: Some(value),
            });
            pack(index, 0)
        }
    }

    /// Returns None if the handle is stale.
    pub fn get(&self, handle: EmbeddedValue) -> Option<&HeapValue> {
        let (index, generation) = unpack(handle);
        let slot = self.slots.get(index)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Returns None if the handle is stale.
    pub fn get_mut(&mut self, handle: EmbeddedValue) -> Option<&mut HeapValue> {
        let (index, generation) = unpack(handle);
        let slot = self.slots.get_mut(index)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Release a value. Returns true if the handle was live.
    pub fn free(&mut self, handle: EmbeddedValue) -> bool {
        let (index, generation) = unpack(handle);
        if let Some(slot) = self.slots.get_mut(index)
            && slot.generation == generation
            && slot.value.is_some()
        {
            slot.value = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free_list.push(index as u32);
            return true;
        }
        false
    }

    /// Number of live values.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }
}

impl Default for ValueHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValueHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueHeap")
            .field("slot_count", &self.slots.len())
            .field("free_count", &self.free_list.len())
            .finish()
    }
}
