//! Open-addressed hash table with linear probing and tombstones (spec.md
//! §4.3). Used both for the VM's globals table and, via [`Table::find_match`],
//! as the engine behind string interning in `heap.rs`.
//!
//! Keys are interned-string handles ([`ObjRef`]); callers always supply the
//! key's cached hash alongside it (the hash lives on the `HeapObject::String`
//! payload, computed once at intern time), so this module never needs to
//! reach into the heap itself.

use crate::object::ObjRef;
use crate::value::Value;

#[derive(Clone, Copy)]
enum Slot {
    Empty,
    Tombstone,
    Occupied { key: ObjRef, hash: u32, value: Value },
}

/// Initial table capacity; doubles on each grow (spec.md §4.3).
const INITIAL_CAPACITY: usize = 8;

#[derive(Default)]
pub struct Table {
    entries: Vec<Slot>,
    /// Live entries plus tombstones — this is what is compared against
    /// capacity to decide when to grow, matching spec.md's stated threshold
    /// "count + 1 > capacity".
    occupied_or_tombstone: usize,
    /// Live entries only (what `len()` reports).
    live: usize,
}

impl Table {
    pub fn new() -> Self {
        Table {
            entries: Vec::new(),
            occupied_or_tombstone: 0,
            live: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    fn grow_capacity(cap: usize) -> usize {
        if cap < INITIAL_CAPACITY {
            INITIAL_CAPACITY
        } else {
            cap * 2
        }
    }

    /// Find the slot a `(key, hash)` pair should occupy: an exact key match
    /// if present, otherwise the earliest tombstone seen, otherwise the
    /// terminating empty slot. Mirrors `dict_find_entry`/`tableFindEntry`:
    /// probing only terminates at an empty slot, never a tombstone, so
    /// deleted entries never break a probe sequence (spec.md §4.3).
    fn find_slot(entries: &[Slot], key: ObjRef, hash: u32) -> usize {
        let cap = entries.len();
        debug_assert!(cap > 0);
        let mut index = hash as usize % cap;
        let mut tombstone: Option<usize> = None;
        loop {
            match entries[index] {
                Slot::Empty => return tombstone.unwrap_or(index),
                Slot::Tombstone => {
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                Slot::Occupied { key: k, .. } if k == key => return index,
                Slot::Occupied { .. } => {}
            }
            index = (index + 1) % cap;
        }
    }

    fn grow(&mut self) {
        let new_cap = Self::grow_capacity(self.entries.len());
        let mut new_entries = Vec::with_capacity(new_cap);
        new_entries.resize_with(new_cap, || Slot::Empty);

        self.occupied_or_tombstone = 0;
        for slot in &self.entries {
            if let Slot::Occupied { key, hash, value } = *slot {
                let idx = Self::find_slot(&new_entries, key, hash);
                new_entries[idx] = Slot::Occupied { key, hash, value };
                self.occupied_or_tombstone += 1;
            }
        }
        self.entries = new_entries;
    }

    /// Insert or overwrite `key => value`. Returns `true` if this created a
    /// brand new entry (as opposed to overwriting an existing one),
    /// matching clox's `table_set` return value.
    pub fn set(&mut self, key: ObjRef, hash: u32, value: Value) -> bool {
        if self.occupied_or_tombstone + 1 > self.capacity() {
            self.grow();
        }
        let idx = Self::find_slot(&self.entries, key, hash);
        let is_new = !matches!(self.entries[idx], Slot::Occupied { .. });
        let was_empty = matches!(self.entries[idx], Slot::Empty);
        self.entries[idx] = Slot::Occupied { key, hash, value };
        if was_empty {
            self.occupied_or_tombstone += 1;
        }
        if is_new {
            self.live += 1;
        }
        is_new
    }

    /// Update an existing key in place without ever creating a new entry.
    /// Used for `SET_GLOBAL`: per spec.md §9, setting an undefined global
    /// must raise a runtime error without mutating the table at all, so the
    /// VM calls this instead of `set` and never touches `delete` on that
    /// path (the bug spec.md calls out is structurally impossible here).
    pub fn set_existing(&mut self, key: ObjRef, hash: u32, value: Value) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let idx = Self::find_slot(&self.entries, key, hash);
        match &mut self.entries[idx] {
            Slot::Occupied { key: k, value: v, .. } if *k == key => {
                *v = value;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, key: ObjRef, hash: u32) -> Option<Value> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = Self::find_slot(&self.entries, key, hash);
        match self.entries[idx] {
            Slot::Occupied { key: k, value, .. } if k == key => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, key: ObjRef, hash: u32) -> bool {
        self.get(key, hash).is_some()
    }

    /// Delete an entry, leaving a tombstone behind (spec.md §4.3).
    pub fn delete(&mut self, key: ObjRef, hash: u32) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let idx = Self::find_slot(&self.entries, key, hash);
        match self.entries[idx] {
            Slot::Occupied { key: k, .. } if k == key => {
                self.entries[idx] = Slot::Tombstone;
                self.live -= 1;
                true
            }
            _ => false,
        }
    }

    /// Look up an entry by hash plus an arbitrary equality predicate over
    /// candidate keys, stopping at the first true empty slot. This is the
    /// primitive `Heap::intern` builds `find_string` on top of: the table
    /// doesn't know how to compare string bytes, so the caller supplies
    /// that as `matches`.
    pub fn find_match<F>(&self, hash: u32, mut matches: F) -> Option<ObjRef>
    where
        F: FnMut(ObjRef) -> bool,
    {
        if self.entries.is_empty() {
            return None;
        }
        let cap = self.entries.len();
        let mut index = hash as usize % cap;
        for _ in 0..cap {
            match self.entries[index] {
                Slot::Empty => return None,
                Slot::Occupied { key, hash: khash, .. } if khash == hash && matches(key) => {
                    return Some(key);
                }
                _ => {}
            }
            index = (index + 1) % cap;
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjRef, Value)> + '_ {
        self.entries.iter().filter_map(|slot| match slot {
            Slot::Occupied { key, value, .. } => Some((*key, *value)),
            _ => None,
        })
    }
}
