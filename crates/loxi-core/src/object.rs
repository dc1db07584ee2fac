//! Heap-object payloads.
//!
//! Spec.md models the heap as an intrusive linked list of objects for sweep.
//! This is the memory-safe realization called for in spec.md §9: a `Heap`
//! arena (see `heap.rs`) owns a `Vec<HeapObject>`, and every `Value::Obj`
//! holds an `ObjRef` index into it rather than a pointer. The "next" link
//! disappears because the arena's `Vec` is itself the sweep root.

use crate::chunk::Chunk;
use crate::value::Value;

/// A handle into the `Heap` arena. Two `ObjRef`s are equal iff they name the
/// same slot, which is exactly the handle-identity equality spec.md requires
/// for strings and other heap objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef(pub u32);

impl ObjRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Host function signature for natives registered with the VM (spec.md §6:
/// "host registers globals as closures over a host function").
pub type NativeFn = fn(args: &[Value]) -> Value;

#[derive(Debug)]
pub struct NativeObj {
    pub name: String,
    pub arity: u8,
    pub func: NativeFn,
}

/// A compiled function: fixed arity, its own chunk, an optional name (for
/// `<fn NAME>` / `<script>` printing and stack traces), and the number of
/// upvalues its closures must capture.
#[derive(Debug)]
pub struct FunctionObj {
    pub name: Option<String>,
    pub arity: u8,
    pub upvalue_count: usize,
    pub chunk: Chunk,
}

impl FunctionObj {
    pub fn new(name: Option<String>) -> Self {
        FunctionObj {
            name,
            arity: 0,
            upvalue_count: 0,
            chunk: Chunk::new(),
        }
    }

    /// Display name used in stack traces and `print` output.
    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(n) => n,
            None => "script",
        }
    }
}

#[derive(Debug)]
pub struct ClosureObj {
    pub function: ObjRef,
    pub upvalues: Vec<ObjRef>,
}

/// An upvalue is either an open reference to a still-live stack slot, or a
/// closed value captured once that slot goes out of scope (spec.md §3, §4.6,
/// §9 "Open upvalue as pointer into the value stack").
#[derive(Debug, Clone, Copy)]
pub enum Upvalue {
    Open(usize),
    Closed(Value),
}

/// A heap-allocated object. All variants live in the same `Heap` arena; the
/// tag here replaces the C union's `ObjType` tag.
#[derive(Debug)]
pub enum HeapObject {
    String {
        chars: Box<str>,
        hash: u32,
    },
    Function(FunctionObj),
    Native(NativeObj),
    Closure(ClosureObj),
    Upvalue(Upvalue),
}

impl HeapObject {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            HeapObject::String { chars, .. } => Some(chars),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionObj> {
        match self {
            HeapObject::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut FunctionObj> {
        match self {
            HeapObject::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_closure(&self) -> Option<&ClosureObj> {
        match self {
            HeapObject::Closure(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_native(&self) -> Option<&NativeObj> {
        match self {
            HeapObject::Native(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_upvalue(&self) -> Option<&Upvalue> {
        match self {
            HeapObject::Upvalue(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_upvalue_mut(&mut self) -> Option<&mut Upvalue> {
        match self {
            HeapObject::Upvalue(u) => Some(u),
            _ => None,
        }
    }
}
