//! Composite store: arena backing for array and map values.
//!
//! A [`Value`] of kind [`Kind::Array`] or [`Kind::Map`] does not hold its
//! elements.  Its text is an opaque [`Handle`] naming an entry in the store
//! of the generator family that produced it.  Entries are never released
//! individually; they live until the last generator sharing the store is
//! dropped.
//!
//! Resolution fails closed: a handle that does not decode, belongs to a
//! different store, or points past the arena yields `None`.  Callers report
//! that as [`Status::InvalidValue`](super::value::Status::InvalidValue).
//! Passing a handle to a generator outside its family is a precondition
//! violation; the store-id check rejects it rather than aliasing another
//! generator's data.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use super::value::{Kind, Value};

/// Insertion-ordered string map used for `dict` values.
pub type Map = IndexMap<String, String>;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Text of the null handle returned by an empty `list` or `dict`.
pub const NULL_HANDLE: &str = "0";

/// Reference to a composite-store entry, encoded as `"<store>:<index>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    store: u64,
    index: usize,
}

impl Handle {
    pub fn encode(self) -> String {
        format!("{}:{}", self.store, self.index)
    }

    /// Parse handle text.  The null handle and malformed text give `None`.
    pub fn decode(text: &str) -> Option<Handle> {
        let (store, index) = text.split_once(':')?;
        Some(Handle {
            store: store.parse().ok()?,
            index: index.parse().ok()?,
        })
    }

    pub fn index(self) -> usize {
        self.index
    }
}

/// Arena of arrays and maps owned by one generator family.
#[derive(Debug)]
pub struct CompositeStore {
    id: u64,
    arrays: Vec<Vec<String>>,
    maps: Vec<Map>,
}

impl Default for CompositeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeStore {
    pub fn new() -> Self {
        CompositeStore {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            arrays: Vec::new(),
            maps: Vec::new(),
        }
    }

    pub fn allocate_array(&mut self) -> (Handle, &mut Vec<String>) {
        self.arrays.push(Vec::new());
        let index = self.arrays.len() - 1;
        (Handle { store: self.id, index }, &mut self.arrays[index])
    }

    pub fn allocate_map(&mut self) -> (Handle, &mut Map) {
        self.maps.push(Map::new());
        let index = self.maps.len() - 1;
        (Handle { store: self.id, index }, &mut self.maps[index])
    }

    /// The array `value` refers to, if it is an array handle from this store.
    pub fn resolve_array(&self, value: &Value) -> Option<&Vec<String>> {
        let index = self.local_index(value, Kind::Array)?;
        self.arrays.get(index)
    }

    /// The map `value` refers to, if it is a map handle from this store.
    pub fn resolve_map(&self, value: &Value) -> Option<&Map> {
        let index = self.local_index(value, Kind::Map)?;
        self.maps.get(index)
    }

    pub fn array_count(&self) -> usize {
        self.arrays.len()
    }

    pub fn map_count(&self) -> usize {
        self.maps.len()
    }

    fn local_index(&self, value: &Value, kind: Kind) -> Option<usize> {
        if value.kind != kind {
            return None;
        }
        let handle = Handle::decode(&value.text)?;
        (handle.store == self.id).then_some(handle.index)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
