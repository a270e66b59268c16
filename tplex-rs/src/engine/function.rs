//! Named callables and the ordered table that holds them.
//!
//! A variable is just a [`Function`] whose callback is
//! [`Callback::Constant`]; there is no separate variable type.
//!
//! ## Resolution rule
//!
//! Lookup is a linear, first-match scan in insertion order.  Duplicate names
//! are legal, and the *earliest* entry wins, so a later push with an existing
//! name is shadowed by the earlier one until that one is renamed.

use std::fmt;
use std::rc::Rc;

use super::generator::Generator;
use super::value::Value;

/// Signature of the standard built-ins.  `args[0]` is the call name.
pub type BuiltinFn = fn(&[Value], &mut Generator) -> Value;

/// Signature of embedder-supplied closures.
pub type NativeFn = dyn Fn(&[Value], &mut Generator) -> Value;

/// What happens when a [`Function`] is invoked.
#[derive(Clone)]
pub enum Callback {
    /// Ignore the arguments and return a captured value.
    Constant(Value),
    /// One of the standard library functions.
    Builtin(BuiltinFn),
    /// A closure over arbitrary captured state.
    Native(Rc<NativeFn>),
}

impl Callback {
    pub fn native(f: impl Fn(&[Value], &mut Generator) -> Value + 'static) -> Self {
        Callback::Native(Rc::new(f))
    }

    pub fn invoke(&self, args: &[Value], generator: &mut Generator) -> Value {
        match self {
            Callback::Constant(v) => v.clone(),
            Callback::Builtin(f) => f(args, generator),
            Callback::Native(f) => f(args, generator),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Callback::Builtin(_) => f.write_str("Builtin(..)"),
            Callback::Native(_) => f.write_str("Native(..)"),
        }
    }
}

/// A named entry in the [`FunctionTable`].
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub callback: Callback,
}

impl Function {
    pub fn new(name: impl Into<String>, callback: Callback) -> Self {
        Function {
            name: name.into(),
            callback,
        }
    }

    /// A variable: a function returning `value` regardless of arguments.
    pub fn variable(name: impl Into<String>, value: Value) -> Self {
        Self::new(name, Callback::Constant(value))
    }

    pub fn builtin(name: impl Into<String>, f: BuiltinFn) -> Self {
        Self::new(name, Callback::Builtin(f))
    }

    pub fn native(
        name: impl Into<String>,
        f: impl Fn(&[Value], &mut Generator) -> Value + 'static,
    ) -> Self {
        Self::new(name, Callback::native(f))
    }
}

/// Stable handle to a [`FunctionTable`] entry.
///
/// The table is append-only, so a handle stays valid for the table's
/// lifetime and survives being copied into a child generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(usize);

impl FunctionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered collection of named callables.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    entries: Vec<Function>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, function: Function) -> FunctionId {
        self.entries.push(function);
        FunctionId(self.entries.len() - 1)
    }

    /// First entry named `name`, in insertion order.
    pub fn find(&self, name: &str) -> Option<FunctionId> {
        self.entries
            .iter()
            .position(|f| f.name == name)
            .map(FunctionId)
    }

    pub fn get(&self, id: FunctionId) -> Option<&Function> {
        self.entries.get(id.0)
    }

    pub fn name(&self, id: FunctionId) -> Option<&str> {
        self.get(id).map(|f| f.name.as_str())
    }

    /// Rebind the first entry named `name` to a constant.  Returns whether a
    /// match was found.
    pub fn set_constant(&mut self, name: &str, value: Value) -> bool {
        self.set_callback(name, Callback::Constant(value))
    }

    /// Replace the callback of the first entry named `name`.
    pub fn set_callback(&mut self, name: &str, callback: Callback) -> bool {
        match self.find(name) {
            Some(id) => {
                self.entries[id.0].callback = callback;
                true
            }
            None => false,
        }
    }

    pub fn replace_callback(&mut self, id: FunctionId, callback: Callback) {
        if let Some(f) = self.entries.get_mut(id.0) {
            f.callback = callback;
        }
    }

    /// Rename an entry.  An empty `name` keeps the current one.
    pub fn rename(&mut self, id: FunctionId, name: &str) {
        if name.is_empty() {
            return;
        }
        if let Some(f) = self.entries.get_mut(id.0) {
            f.name = name.to_owned();
        }
    }

    /// Overwrite an entry in place: rename (empty keeps) and rebind.
    pub fn modify(&mut self, id: FunctionId, function: Function) {
        self.rename(id, &function.name);
        self.replace_callback(id, function.callback);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Function> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
