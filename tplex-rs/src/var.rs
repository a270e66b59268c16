//! Named variable definitions.
//!
//! Variables come from the config file and the `-D` command-line flag
//! before any generator exists.  A [`VarStore`] collects them in definition
//! order and [`VarStore::install`] turns each one into a constant function
//! on a generator, allocating arrays and maps in its composite store.

use indexmap::IndexMap;

use crate::engine::{Generator, Value};

/// The value side of a variable definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarDef {
    Text(String),
    List(Vec<String>),
    /// Key/value pairs; a repeated key keeps its first value.
    Dict(Vec<(String, String)>),
}

/// Ordered variable table.  Redefining a name replaces the earlier
/// definition but keeps its position.
#[derive(Debug, Default)]
pub struct VarStore {
    vars: IndexMap<String, VarDef>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a text variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.define(name, VarDef::Text(value.into()));
    }

    pub fn define(&mut self, name: impl Into<String>, def: VarDef) {
        self.vars.insert(name.into(), def);
    }

    /// The text of a text variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.vars.get(name)? {
            VarDef::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn definition(&self, name: &str) -> Option<&VarDef> {
        self.vars.get(name)
    }

    /// Remove a variable.  Returns `true` if it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.vars.shift_remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VarDef)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Merge `other` into `self`; its definitions win.
    pub fn extend(&mut self, other: VarStore) {
        self.vars.extend(other.vars);
    }

    /// Push every variable onto `generator`, in definition order.
    pub fn install(&self, generator: &mut Generator) {
        for (name, def) in &self.vars {
            let value = match def {
                VarDef::Text(s) => Value::new(s.as_str()),
                VarDef::List(items) => generator.make_array(items.iter().cloned()),
                VarDef::Dict(pairs) => generator.make_map(pairs.iter().cloned()),
            };
            generator.push_variable(name.as_str(), value);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
