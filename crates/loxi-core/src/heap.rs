//! The object arena and string interner (spec.md §4.4).
//!
//! Every heap object, interned or not, lives in one `Vec<HeapObject>`; an
//! `ObjRef` is just an index into it. Strings additionally get registered in
//! `strings`, a `Table` used purely as a membership set (its values are all
//! `Value::Nil`), so that two textually-identical strings always resolve to
//! the same `ObjRef` and can be compared by handle.
//!
//! No objects are ever freed before the `Heap` itself is dropped (spec.md's
//! stated baseline: process-end cleanup plus string interning to bound
//! duplicate allocation). A future mark-sweep pass would walk this arena as
//! its sweep root and would need the intern table to hold weak references
//! so swept strings drop out of it — see spec.md §5/§9.

use crate::object::{ClosureObj, FunctionObj, HeapObject, NativeFn, NativeObj, ObjRef, Upvalue};
use crate::table::Table;
use crate::value::Value;

#[derive(Default)]
pub struct Heap {
    objects: Vec<HeapObject>,
    strings: Table,
}

impl Heap {
    pub fn new() -> Self {
        Heap {
            objects: Vec::new(),
            strings: Table::new(),
        }
    }

    fn alloc(&mut self, obj: HeapObject) -> ObjRef {
        self.objects.push(obj);
        ObjRef((self.objects.len() - 1) as u32)
    }

    pub fn get(&self, r: ObjRef) -> &HeapObject {
        &self.objects[r.index()]
    }

    pub fn get_mut(&mut self, r: ObjRef) -> &mut HeapObject {
        &mut self.objects[r.index()]
    }

    /// Intern a borrowed string, copying only if no equal string already
    /// exists (spec.md §4.4's first entry point).
    pub fn intern_copy(&mut self, s: &str) -> ObjRef {
        let hash = crate::fnv1a_hash(s.as_bytes());
        if let Some(existing) = self.find_interned(s, hash) {
            return existing;
        }
        self.insert_interned(s.to_string(), hash)
    }

    /// Intern an owned string, consuming it if an equal string is already
    /// interned and adopting it into the heap otherwise (spec.md §4.4's
    /// second entry point — lets the compiler build a string via concat and
    /// hand over ownership without a redundant copy).
    pub fn intern_take(&mut self, s: String) -> ObjRef {
        let hash = crate::fnv1a_hash(s.as_bytes());
        if let Some(existing) = self.find_interned(&s, hash) {
            return existing;
        }
        self.insert_interned(s, hash)
    }

    fn find_interned(&self, s: &str, hash: u32) -> Option<ObjRef> {
        self.strings.find_match(hash, |candidate| {
            self.objects[candidate.index()].as_string() == Some(s)
        })
    }

    fn insert_interned(&mut self, s: String, hash: u32) -> ObjRef {
        let r = self.alloc(HeapObject::String {
            chars: s.into_boxed_str(),
            hash,
        });
        self.strings.set(r, hash, Value::Nil);
        r
    }

    /// The cached hash of an interned string, for callers (globals table
    /// operations) that already hold the `ObjRef` and need its hash again.
    pub fn string_hash(&self, r: ObjRef) -> u32 {
        match self.get(r) {
            HeapObject::String { hash, .. } => *hash,
            _ => panic!("string_hash called on a non-string object"),
        }
    }

    pub fn alloc_function(&mut self, f: FunctionObj) -> ObjRef {
        self.alloc(HeapObject::Function(f))
    }

    pub fn alloc_native(&mut self, name: String, arity: u8, func: NativeFn) -> ObjRef {
        self.alloc(HeapObject::Native(NativeObj { name, arity, func }))
    }

    pub fn alloc_closure(&mut self, c: ClosureObj) -> ObjRef {
        self.alloc(HeapObject::Closure(c))
    }

    pub fn alloc_upvalue(&mut self, u: Upvalue) -> ObjRef {
        self.alloc(HeapObject::Upvalue(u))
    }
}
